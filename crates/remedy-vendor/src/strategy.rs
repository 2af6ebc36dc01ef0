use crate::error::{Result, VendorError};
use crate::generic::GenericStrategy;
use crate::github::GitHubStrategy;
use crate::microsoft::{MicrosoftStrategy, JS_SHELL_THRESHOLD};
use crate::simple::AdvisoryStrategy;
use remedy_core::AdvisoryUrl;
use remedy_extract::PartialRecord;

/// Fields obtained from a source API instead of a page.
#[derive(Debug, Clone, Default)]
pub struct ApiData {
    pub record: PartialRecord,
    /// Free text returned by the API, scanned for identifiers
    pub text: String,
}

/// The closed set of extraction strategies.
#[derive(Debug, Clone)]
pub enum VendorStrategy {
    GitHub(GitHubStrategy),
    Microsoft(MicrosoftStrategy),
    Advisory(AdvisoryStrategy),
    Generic(GenericStrategy),
}

impl VendorStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            Self::GitHub(_) => GitHubStrategy::NAME,
            Self::Microsoft(_) => MicrosoftStrategy::NAME,
            Self::Advisory(s) => s.name(),
            Self::Generic(_) => GenericStrategy::NAME,
        }
    }

    pub fn can_handle(&self, url: &AdvisoryUrl) -> bool {
        match self {
            Self::GitHub(s) => s.can_handle(url),
            Self::Microsoft(s) => s.can_handle(url),
            Self::Advisory(s) => s.can_handle(url),
            Self::Generic(_) => true,
        }
    }

    /// Whether [`get_api_data`](Self::get_api_data) is worth trying.
    pub fn supports_api(&self) -> bool {
        match self {
            Self::GitHub(s) => s.supports_api(),
            Self::Microsoft(s) => s.supports_api(),
            Self::Advisory(_) | Self::Generic(_) => false,
        }
    }

    pub async fn get_api_data(&self, url: &AdvisoryUrl) -> Result<ApiData> {
        match self {
            Self::GitHub(s) => s.get_api_data(url).await,
            Self::Microsoft(s) => s.get_api_data(url).await,
            Self::Advisory(_) | Self::Generic(_) => Err(VendorError::ApiUnsupported {
                vendor: self.name(),
            }),
        }
    }

    /// Source-specific fields from fetched content.
    pub fn extract_data(&self, content: &str, url: &AdvisoryUrl) -> PartialRecord {
        match self {
            Self::GitHub(s) => s.extract_data(content, url),
            Self::Microsoft(s) => s.extract_data(content, url),
            Self::Advisory(s) => s.extract_data(content, url),
            Self::Generic(s) => s.extract(content, url),
        }
    }

    /// Content size below which a page is an unrendered JavaScript shell.
    ///
    /// `None` for sources whose pages are served complete.
    pub fn render_threshold(&self) -> Option<usize> {
        match self {
            Self::Microsoft(_) => Some(JS_SHELL_THRESHOLD),
            _ => None,
        }
    }

    pub fn is_render_sensitive(&self) -> bool {
        self.render_threshold().is_some()
    }

    pub fn is_generic(&self) -> bool {
        matches!(self, Self::Generic(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simple::AdvisoryVendor;

    #[tokio::test]
    async fn test_api_unsupported_for_page_strategies() {
        let url = AdvisoryUrl::parse("https://ubuntu.com/security/notices/USN-6591-1").expect("url");
        let strategy = VendorStrategy::Advisory(AdvisoryStrategy::new(AdvisoryVendor::Ubuntu));

        assert!(!strategy.supports_api());
        let err = strategy.get_api_data(&url).await.expect_err("unsupported");
        assert!(matches!(err, VendorError::ApiUnsupported { vendor: "ubuntu" }));
    }

    #[test]
    fn test_only_microsoft_is_render_sensitive() {
        assert_eq!(
            VendorStrategy::Microsoft(MicrosoftStrategy::default()).render_threshold(),
            Some(5_000)
        );
        assert!(!VendorStrategy::GitHub(GitHubStrategy::default()).is_render_sensitive());
        assert!(!VendorStrategy::Generic(GenericStrategy).is_render_sensitive());
    }
}
