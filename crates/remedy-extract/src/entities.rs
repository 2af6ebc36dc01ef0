//! Identifier extraction over free text.
//!
//! Every extractor returns matches deduplicated in first-seen order.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

static CVE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bCVE-(\d{4})-(\d{4,7})\b").expect("CVE regex is hardcoded and valid"));

static KB_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bKB\s?(\d{6,7})\b").expect("KB regex is hardcoded and valid"));

static VERSION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|[^\w.])v?(\d{1,5}\.\d{1,5}(?:\.\d{1,5}){0,2}(?:-(?:rc|beta|alpha|p|r)\.?\d*)?)(?:[^\w.]|\.(?:\s|$)|$)")
        .expect("version regex is hardcoded and valid")
});

static FULL_SHA_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([0-9a-f]{40})\b").expect("sha regex is hardcoded and valid"));

static COMMIT_URL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)/commits?/([0-9a-f]{7,40})\b").expect("commit url regex is hardcoded and valid")
});

static GHSA_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bGHSA-([23456789cfghjmpqrvwx]{4})-([23456789cfghjmpqrvwx]{4})-([23456789cfghjmpqrvwx]{4})\b")
        .expect("GHSA regex is hardcoded and valid")
});

pub(crate) fn ordered_unique<I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

/// CVE identifiers, normalized to `CVE-YYYY-NNNN`.
pub fn extract_cves(text: &str) -> Vec<String> {
    ordered_unique(
        CVE_PATTERN
            .captures_iter(text)
            .map(|c| format!("CVE-{}-{}", &c[1], &c[2])),
    )
}

/// Knowledge-base article numbers, normalized to `KBNNNNNNN`.
pub fn extract_kbs(text: &str) -> Vec<String> {
    ordered_unique(KB_PATTERN.captures_iter(text).map(|c| format!("KB{}", &c[1])))
}

/// Dotted version numbers such as `2.4.1` or `v10.0.19041.1234`.
///
/// A leading `v` is dropped; pre-release suffixes like `-rc1` are kept.
pub fn extract_versions(text: &str) -> Vec<String> {
    let mut found = Vec::new();
    let mut start = 0;
    // Matches consume their trailing delimiter, so rescan from the version end
    while let Some(caps) = VERSION_PATTERN.captures_at(text, start) {
        let Some(version) = caps.get(1) else { break };
        found.push(version.as_str().to_string());
        start = version.end();
    }
    ordered_unique(found)
}

/// Git commit hashes: bare 40-char SHAs and abbreviated SHAs in commit URLs.
pub fn extract_commit_hashes(text: &str) -> Vec<String> {
    let from_urls = COMMIT_URL_PATTERN
        .captures_iter(text)
        .map(|c| c[1].to_lowercase());
    let bare = FULL_SHA_PATTERN
        .captures_iter(text)
        .map(|c| c[1].to_string());
    ordered_unique(from_urls.chain(bare))
}

/// GitHub security advisory identifiers, normalized to `GHSA-xxxx-xxxx-xxxx`.
pub fn extract_ghsa_ids(text: &str) -> Vec<String> {
    ordered_unique(GHSA_PATTERN.captures_iter(text).map(|c| {
        format!(
            "GHSA-{}-{}-{}",
            c[1].to_lowercase(),
            c[2].to_lowercase(),
            c[3].to_lowercase()
        )
    }))
}

/// Every identifier family found in one piece of text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifiers {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cves: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub kbs: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ghsa_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commit_hashes: Vec<String>,
}

impl Identifiers {
    pub fn from_text(text: &str) -> Self {
        Self {
            cves: extract_cves(text),
            kbs: extract_kbs(text),
            ghsa_ids: extract_ghsa_ids(text),
            commit_hashes: extract_commit_hashes(text),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cves.is_empty()
            && self.kbs.is_empty()
            && self.ghsa_ids.is_empty()
            && self.commit_hashes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_cves() {
        let text = "Fixes cve-2023-12345 and CVE-2024-1234; see also CVE-2023-12345.";
        assert_eq!(extract_cves(text), vec!["CVE-2023-12345", "CVE-2024-1234"]);
    }

    #[test]
    fn test_cve_requires_four_digit_sequence() {
        assert!(extract_cves("CVE-2023-123").is_empty());
    }

    #[test]
    fn test_extract_kbs() {
        let text = "Install KB5034441 or kb 5034439. KB5034441 supersedes KB12345.";
        assert_eq!(extract_kbs(text), vec!["KB5034441", "KB5034439"]);
    }

    #[test]
    fn test_extract_versions() {
        let text = "Affected: 2.4.0 through v2.4.9. Fixed in 2.4.10-rc1 and 3.0.";
        assert_eq!(
            extract_versions(text),
            vec!["2.4.0", "2.4.9", "2.4.10-rc1", "3.0"]
        );
    }

    #[test]
    fn test_versions_skip_longer_dotted_runs() {
        // IP addresses have too many components to be a version
        assert!(extract_versions("host 192.168.100.200.5").is_empty());
    }

    #[test]
    fn test_extract_commit_hashes() {
        let text = "Patched in https://github.com/acme/lib/commit/AbC1234 \
                    (full: 0123456789abcdef0123456789abcdef01234567).";
        assert_eq!(
            extract_commit_hashes(text),
            vec!["abc1234", "0123456789abcdef0123456789abcdef01234567"]
        );
    }

    #[test]
    fn test_extract_ghsa_ids() {
        let text = "See GHSA-4W2V-Q235-vp99 and ghsa-4w2v-q235-vp99.";
        assert_eq!(extract_ghsa_ids(text), vec!["GHSA-4w2v-q235-vp99"]);
    }

    #[test]
    fn test_identifiers_from_text() {
        let ids = Identifiers::from_text("CVE-2024-21338 is fixed by KB5034441.");
        assert_eq!(ids.cves, vec!["CVE-2024-21338"]);
        assert_eq!(ids.kbs, vec!["KB5034441"]);
        assert!(ids.ghsa_ids.is_empty());
        assert!(!ids.is_empty());

        let json = serde_json::to_value(&ids).expect("serialize");
        assert!(json.get("ghsa_ids").is_none());
    }

    #[test]
    fn test_empty_input() {
        assert!(extract_cves("").is_empty());
        assert!(extract_kbs("").is_empty());
        assert!(extract_versions("").is_empty());
        assert!(extract_commit_hashes("").is_empty());
        assert!(extract_ghsa_ids("").is_empty());
    }
}
