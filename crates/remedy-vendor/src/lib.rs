//! Vendor strategies for the Remedy advisory pipeline.
//!
//! Each [`VendorStrategy`] knows which advisory URLs it handles and how to
//! pull source-specific fields out of them, optionally through a source API
//! ([`RepositoryApi`] for GitHub, [`BulletinSource`] for Microsoft). The
//! [`VendorDispatcher`] holds the strategies in a fixed order and picks the
//! first match, falling back to [`GenericStrategy`].

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

pub mod dispatcher;
pub mod error;
pub mod generic;
pub mod github;
pub mod microsoft;
pub mod simple;
pub mod strategy;

pub use dispatcher::{DispatcherBuilder, VendorDispatcher};
pub use error::{Result, VendorError};
pub use generic::GenericStrategy;
pub use github::{
    GitHubClient, GitHubStrategy, ReleaseAsset, ReleaseInfo, RepoRef, RepositoryApi,
    RepositoryInfo,
};
pub use microsoft::{
    catalog_link, BulletinDocument, BulletinProduct, BulletinRemediation, BulletinSource,
    BulletinUpdate, BulletinVulnerability, MicrosoftStrategy, MsrcClient,
};
pub use simple::{AdvisoryStrategy, AdvisoryVendor};
pub use strategy::{ApiData, VendorStrategy};

/// True when `domain` is one of `hosts` or a subdomain of one.
pub(crate) fn host_matches(domain: &str, hosts: &[&str]) -> bool {
    hosts.iter().any(|host| {
        domain == *host
            || domain
                .strip_suffix(host)
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}
