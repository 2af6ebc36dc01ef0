use crate::generic::GenericStrategy;
use crate::github::{GitHubStrategy, RepositoryApi};
use crate::microsoft::{BulletinSource, MicrosoftStrategy};
use crate::simple::{AdvisoryStrategy, AdvisoryVendor};
use crate::strategy::VendorStrategy;
use remedy_core::AdvisoryUrl;
use std::sync::Arc;

/// Ordered, immutable set of strategies.
///
/// The first strategy whose `can_handle` accepts a URL wins. The generic
/// strategy is always consulted last, so every URL gets a strategy.
#[derive(Debug, Clone)]
pub struct VendorDispatcher {
    strategies: Vec<VendorStrategy>,
    fallback: VendorStrategy,
}

impl VendorDispatcher {
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::default()
    }

    /// Every built-in strategy in its standard order.
    pub fn with_defaults(
        repositories: Option<Arc<dyn RepositoryApi>>,
        bulletins: Option<Arc<dyn BulletinSource>>,
    ) -> Self {
        let mut builder = Self::builder()
            .strategy(VendorStrategy::GitHub(GitHubStrategy::new(repositories)))
            .strategy(VendorStrategy::Microsoft(MicrosoftStrategy::new(bulletins)));
        for vendor in AdvisoryVendor::ALL {
            builder = builder.strategy(VendorStrategy::Advisory(AdvisoryStrategy::new(vendor)));
        }
        builder.build()
    }

    pub fn select(&self, url: &AdvisoryUrl) -> &VendorStrategy {
        let selected = self
            .strategies
            .iter()
            .find(|s| s.can_handle(url))
            .unwrap_or(&self.fallback);
        tracing::debug!(url = %url, strategy = selected.name(), "selected strategy");
        selected
    }

    /// Strategies in the order they are consulted, generic last.
    pub fn strategies(&self) -> impl Iterator<Item = &VendorStrategy> {
        self.strategies.iter().chain(std::iter::once(&self.fallback))
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.strategies().map(VendorStrategy::name).collect()
    }
}

impl Default for VendorDispatcher {
    fn default() -> Self {
        Self::with_defaults(None, None)
    }
}

#[derive(Debug, Default)]
pub struct DispatcherBuilder {
    strategies: Vec<VendorStrategy>,
}

impl DispatcherBuilder {
    /// Append a strategy. Generic strategies are ignored; one is always last.
    #[must_use]
    pub fn strategy(mut self, strategy: VendorStrategy) -> Self {
        if !strategy.is_generic() {
            self.strategies.push(strategy);
        }
        self
    }

    pub fn build(self) -> VendorDispatcher {
        VendorDispatcher {
            strategies: self.strategies,
            fallback: VendorStrategy::Generic(GenericStrategy),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(raw: &str) -> AdvisoryUrl {
        AdvisoryUrl::parse(raw).expect("url")
    }

    #[test]
    fn test_default_order() {
        let dispatcher = VendorDispatcher::default();
        assert_eq!(
            dispatcher.names(),
            vec!["github", "microsoft", "cisco", "redhat", "ubuntu", "debian", "generic"]
        );
    }

    #[test]
    fn test_select_by_host() {
        let dispatcher = VendorDispatcher::default();
        let cases = [
            ("https://github.com/acme/widget", "github"),
            ("https://msrc.microsoft.com/update-guide/vulnerability/CVE-2024-1", "microsoft"),
            ("https://sec.cloudapps.cisco.com/security/center/x/cisco-sa-abc", "cisco"),
            ("https://access.redhat.com/errata/RHSA-2024:0627", "redhat"),
            ("https://ubuntu.com/security/notices/USN-6591-1", "ubuntu"),
            ("https://security-tracker.debian.org/tracker/DSA-5610-1", "debian"),
            ("https://vendor.example/advisory/1", "generic"),
        ];
        for (raw, expected) in cases {
            assert_eq!(dispatcher.select(&url(raw)).name(), expected, "{raw}");
        }
    }

    #[test]
    fn test_selection_is_deterministic() {
        let dispatcher = VendorDispatcher::default();
        let u = url("https://support.microsoft.com/kb/5034441");
        let first = dispatcher.select(&u).name();
        for _ in 0..10 {
            assert_eq!(dispatcher.select(&u).name(), first);
        }
        // A second dispatcher built the same way agrees
        assert_eq!(VendorDispatcher::default().select(&u).name(), first);
    }

    #[test]
    fn test_first_match_wins() {
        let dispatcher = VendorDispatcher::builder()
            .strategy(VendorStrategy::Advisory(AdvisoryStrategy::new(AdvisoryVendor::Ubuntu)))
            .strategy(VendorStrategy::Advisory(AdvisoryStrategy::new(AdvisoryVendor::Ubuntu)))
            .build();
        let strategies: Vec<_> = dispatcher.strategies().collect();
        assert_eq!(strategies.len(), 3);
        assert!(std::ptr::eq(
            dispatcher.select(&url("https://ubuntu.com/security/notices/USN-1-1")),
            strategies[0]
        ));
    }

    #[test]
    fn test_generic_always_last() {
        let dispatcher = VendorDispatcher::builder()
            .strategy(VendorStrategy::Generic(GenericStrategy))
            .strategy(VendorStrategy::GitHub(GitHubStrategy::default()))
            .build();
        assert_eq!(dispatcher.names(), vec!["github", "generic"]);
        assert!(dispatcher.select(&url("https://example.org/")).is_generic());
    }
}
