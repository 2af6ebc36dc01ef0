use crate::state::ScrapeStatus;
use remedy_core::Timestamp;
use remedy_extract::{Classification, Identifiers, PartialRecord, QualityReport};
use remedy_fetch::FetchMethod;
use serde::{Deserialize, Serialize};

/// Final output for one advisory URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    pub url: String,
    pub status: ScrapeStatus,
    pub vendor_used: String,
    /// How the extracted content was obtained; `None` when nothing was extracted
    pub method: Option<FetchMethod>,
    pub patch_id: Option<String>,
    pub fix_version: Option<String>,
    pub affected_versions: Option<String>,
    pub remediation: Option<String>,
    pub download_links: Vec<String>,
    pub identifiers: Identifiers,
    pub quality_score: u8,
    pub classification: Classification,
    pub issues: Vec<String>,
    /// Mirrors the stored state: set only for Success and Empty
    pub scraped_at: Option<Timestamp>,
}

impl ExtractedRecord {
    /// Record for a scrape that reached extraction.
    ///
    /// Issues are the record's own, followed by the quality findings.
    pub fn extracted(
        url: impl Into<String>,
        status: ScrapeStatus,
        vendor_used: &str,
        method: FetchMethod,
        record: PartialRecord,
        quality: QualityReport,
        identifiers: Identifiers,
    ) -> Self {
        let mut issues = record.issues;
        issues.extend(quality.issues);

        Self {
            url: url.into(),
            status,
            vendor_used: vendor_used.to_string(),
            method: Some(method),
            patch_id: record.patch_id,
            fix_version: record.fix_version,
            affected_versions: record.affected_versions,
            remediation: record.remediation,
            download_links: record.download_links,
            identifiers,
            quality_score: quality.score,
            classification: quality.classification,
            issues,
            scraped_at: None,
        }
    }

    /// Record for a scrape that stopped before extraction (blocked, failed).
    pub fn unextracted(
        url: impl Into<String>,
        status: ScrapeStatus,
        vendor_used: &str,
        issues: Vec<String>,
    ) -> Self {
        Self {
            url: url.into(),
            status,
            vendor_used: vendor_used.to_string(),
            method: None,
            patch_id: None,
            fix_version: None,
            affected_versions: None,
            remediation: None,
            download_links: Vec::new(),
            identifiers: Identifiers::default(),
            quality_score: 0,
            classification: Classification::Failed,
            issues,
            scraped_at: None,
        }
    }

    pub fn has_key_fields(&self) -> bool {
        [
            &self.patch_id,
            &self.fix_version,
            &self.affected_versions,
            &self.remediation,
        ]
        .iter()
        .any(|f| f.as_deref().is_some_and(|v| !v.trim().is_empty()))
    }
}
