//! Vendors whose advisories carry their identifier in the URL.

use crate::generic::GenericStrategy;
use once_cell::sync::Lazy;
use regex::Regex;
use remedy_core::AdvisoryUrl;
use remedy_extract::{KeyField, PartialRecord};

static CISCO_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bcisco-sa-[a-z0-9]+(?:-[a-z0-9]+)*").expect("Cisco id regex is hardcoded and valid")
});

static RHSA_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bRH[SBE]A-\d{4}:\d{4,5}\b").expect("RHSA regex is hardcoded and valid"));

static USN_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bUSN-\d{3,5}-\d{1,2}\b").expect("USN regex is hardcoded and valid"));

static DEBIAN_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bD[SL]A-\d{3,5}(?:-\d{1,2})?\b").expect("Debian id regex is hardcoded and valid")
});

/// Vendors with identifier-in-URL advisories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdvisoryVendor {
    Cisco,
    RedHat,
    Ubuntu,
    Debian,
}

impl AdvisoryVendor {
    pub const ALL: [AdvisoryVendor; 4] = [
        AdvisoryVendor::Cisco,
        AdvisoryVendor::RedHat,
        AdvisoryVendor::Ubuntu,
        AdvisoryVendor::Debian,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Cisco => "cisco",
            Self::RedHat => "redhat",
            Self::Ubuntu => "ubuntu",
            Self::Debian => "debian",
        }
    }

    fn hosts(&self) -> &'static [&'static str] {
        match self {
            Self::Cisco => &["sec.cloudapps.cisco.com", "tools.cisco.com", "cisco.com"],
            Self::RedHat => &["access.redhat.com", "rhn.redhat.com", "redhat.com"],
            Self::Ubuntu => &["ubuntu.com"],
            Self::Debian => &["debian.org"],
        }
    }

    fn pattern(&self) -> &'static Regex {
        match self {
            Self::Cisco => &CISCO_ID,
            Self::RedHat => &RHSA_ID,
            Self::Ubuntu => &USN_ID,
            Self::Debian => &DEBIAN_ID,
        }
    }

    fn normalize(&self, raw: &str) -> String {
        match self {
            Self::Cisco => raw.to_ascii_lowercase(),
            _ => raw.to_ascii_uppercase(),
        }
    }

    /// Advisory identifier in `text`, canonicalized.
    pub fn find_id(&self, text: &str) -> Option<String> {
        self.pattern().find(text).map(|m| self.normalize(m.as_str()))
    }
}

/// Strategy for an [`AdvisoryVendor`]: identifier from the URL, everything
/// else from the generic extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvisoryStrategy {
    vendor: AdvisoryVendor,
}

impl AdvisoryStrategy {
    pub fn new(vendor: AdvisoryVendor) -> Self {
        Self { vendor }
    }

    pub fn name(&self) -> &'static str {
        self.vendor.name()
    }

    pub fn can_handle(&self, url: &AdvisoryUrl) -> bool {
        crate::host_matches(url.domain(), self.vendor.hosts())
    }

    pub fn extract_data(&self, content: &str, url: &AdvisoryUrl) -> PartialRecord {
        // The content pattern only applies when the URL carries no identifier
        let id = self
            .vendor
            .find_id(url.as_str())
            .or_else(|| self.vendor.find_id(content));

        let mut record = PartialRecord::new();
        record.set_text(KeyField::PatchId, id.as_deref());
        record.merge_from(GenericStrategy.extract(content, url));
        record
    }
}
