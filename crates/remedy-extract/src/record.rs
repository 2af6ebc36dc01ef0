//! Extraction records shared by vendor strategies and the orchestrator.

use crate::error::ExtractionFieldError;
use crate::links::is_excluded_link;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Longest value kept for a single key field; longer text is truncated.
pub const MAX_FIELD_CHARS: usize = 4000;

/// The four fields that make a record useful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyField {
    PatchId,
    FixVersion,
    AffectedVersions,
    Remediation,
}

impl KeyField {
    pub const ALL: [KeyField; 4] = [
        KeyField::PatchId,
        KeyField::FixVersion,
        KeyField::AffectedVersions,
        KeyField::Remediation,
    ];

    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::PatchId => "patch ID",
            Self::FixVersion => "fix version",
            Self::AffectedVersions => "affected versions",
            Self::Remediation => "remediation",
        }
    }
}

impl fmt::Display for KeyField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Quality band derived from the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Classification {
    Failed,
    Poor,
    Good,
    Excellent,
}

impl Classification {
    /// Bands: >=75 Excellent, >=50 Good, >=25 Poor, else Failed.
    #[must_use]
    pub fn from_score(score: u8) -> Self {
        match score {
            75.. => Self::Excellent,
            50..=74 => Self::Good,
            25..=49 => Self::Poor,
            _ => Self::Failed,
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Poor => "Poor",
            Self::Failed => "Failed",
        };
        write!(f, "{label}")
    }
}

/// Fields extracted from one source, before scoring.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialRecord {
    pub patch_id: Option<String>,
    pub fix_version: Option<String>,
    pub affected_versions: Option<String>,
    pub remediation: Option<String>,
    /// Deduplicated, first-seen order, never containing excluded links
    pub download_links: Vec<String>,
    pub issues: Vec<String>,
}

impl PartialRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: KeyField) -> Option<&str> {
        let value = match field {
            KeyField::PatchId => &self.patch_id,
            KeyField::FixVersion => &self.fix_version,
            KeyField::AffectedVersions => &self.affected_versions,
            KeyField::Remediation => &self.remediation,
        };
        value.as_deref().filter(|v| !v.trim().is_empty())
    }

    fn slot(&mut self, field: KeyField) -> &mut Option<String> {
        match field {
            KeyField::PatchId => &mut self.patch_id,
            KeyField::FixVersion => &mut self.fix_version,
            KeyField::AffectedVersions => &mut self.affected_versions,
            KeyField::Remediation => &mut self.remediation,
        }
    }

    /// Store the outcome of extracting one field.
    ///
    /// A field error leaves the field empty and is noted in `issues`; it
    /// never aborts the rest of the record.
    pub fn set_field(
        &mut self,
        field: KeyField,
        value: Result<Option<String>, ExtractionFieldError>,
    ) {
        match value {
            Ok(Some(v)) if !v.trim().is_empty() => *self.slot(field) = Some(v),
            Ok(_) => {}
            Err(e) => {
                *self.slot(field) = None;
                self.note(e.to_string());
            }
        }
    }

    /// Validate and store raw text for a field.
    pub fn set_text(&mut self, field: KeyField, raw: Option<&str>) {
        let value = match raw {
            Some(raw) => sanitize_field(field, raw),
            None => Ok(None),
        };
        self.set_field(field, value);
    }

    #[must_use]
    pub fn has_key_fields(&self) -> bool {
        self.key_field_count() > 0
    }

    #[must_use]
    pub fn key_field_count(&self) -> usize {
        KeyField::ALL.iter().filter(|f| self.get(**f).is_some()).count()
    }

    /// Add a download link unless excluded or already present.
    pub fn add_link(&mut self, link: impl Into<String>) -> bool {
        let link = link.into();
        if link.is_empty() || is_excluded_link(&link) || self.download_links.contains(&link) {
            return false;
        }
        self.download_links.push(link);
        true
    }

    pub fn add_links<I, S>(&mut self, links: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for link in links {
            self.add_link(link);
        }
    }

    pub fn note(&mut self, issue: impl Into<String>) {
        let issue = issue.into();
        if !self.issues.contains(&issue) {
            self.issues.push(issue);
        }
    }

    /// Fill gaps from a lower-priority record.
    ///
    /// Fields already set on `self` win; links and issues are unioned.
    pub fn merge_from(&mut self, other: PartialRecord) {
        for field in KeyField::ALL {
            if self.get(field).is_none() {
                if let Some(value) = other.get(field) {
                    *self.slot(field) = Some(value.to_string());
                }
            }
        }
        self.add_links(other.download_links);
        for issue in other.issues {
            self.note(issue);
        }
    }

    /// The four key fields joined with spaces, for scoring.
    #[must_use]
    pub fn combined_text(&self) -> String {
        KeyField::ALL
            .iter()
            .filter_map(|f| self.get(*f))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Normalize a raw field value.
///
/// Whitespace is collapsed and over-long values are truncated at
/// [`MAX_FIELD_CHARS`]. Values that are nothing but script code are
/// rejected.
pub fn sanitize_field(field: KeyField, raw: &str) -> Result<Option<String>, ExtractionFieldError> {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return Ok(None);
    }

    if crate::quality::is_script_only(&collapsed) {
        return Err(ExtractionFieldError::new(field, "value is script code"));
    }

    if collapsed.chars().count() > MAX_FIELD_CHARS {
        let truncated: String = collapsed.chars().take(MAX_FIELD_CHARS).collect();
        return Ok(Some(truncated));
    }

    Ok(Some(collapsed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_bands() {
        assert_eq!(Classification::from_score(100), Classification::Excellent);
        assert_eq!(Classification::from_score(75), Classification::Excellent);
        assert_eq!(Classification::from_score(74), Classification::Good);
        assert_eq!(Classification::from_score(50), Classification::Good);
        assert_eq!(Classification::from_score(49), Classification::Poor);
        assert_eq!(Classification::from_score(25), Classification::Poor);
        assert_eq!(Classification::from_score(24), Classification::Failed);
        assert_eq!(Classification::from_score(0), Classification::Failed);
    }

    #[test]
    fn test_blank_fields_do_not_count() {
        let record = PartialRecord {
            patch_id: Some("   ".to_string()),
            ..PartialRecord::default()
        };
        assert!(!record.has_key_fields());
        assert!(record.get(KeyField::PatchId).is_none());
    }

    #[test]
    fn test_add_link_dedupes_and_excludes() {
        let mut record = PartialRecord::new();
        assert!(record.add_link("https://example.com/fix.zip"));
        assert!(!record.add_link("https://example.com/fix.zip"));
        assert!(!record.add_link("https://example.com/site.css"));
        assert!(!record.add_link("https://example.com/logo.png"));
        assert_eq!(record.download_links, vec!["https://example.com/fix.zip"]);
    }

    #[test]
    fn test_merge_prefers_existing_fields() {
        let mut strategy = PartialRecord {
            patch_id: Some("KB5001234".to_string()),
            download_links: vec!["https://example.com/a.msu".to_string()],
            ..PartialRecord::default()
        };
        let generic = PartialRecord {
            patch_id: Some("KB0000001".to_string()),
            remediation: Some("Install the update".to_string()),
            download_links: vec![
                "https://example.com/a.msu".to_string(),
                "https://example.com/b.msu".to_string(),
            ],
            issues: vec!["generic note".to_string()],
            ..PartialRecord::default()
        };

        strategy.merge_from(generic);

        assert_eq!(strategy.patch_id.as_deref(), Some("KB5001234"));
        assert_eq!(strategy.remediation.as_deref(), Some("Install the update"));
        assert_eq!(
            strategy.download_links,
            vec!["https://example.com/a.msu", "https://example.com/b.msu"]
        );
        assert_eq!(strategy.issues, vec!["generic note"]);
    }

    #[test]
    fn test_field_error_is_absorbed() {
        let mut record = PartialRecord::new();
        record.set_text(KeyField::Remediation, Some("Upgrade to 2.4.1 or later"));
        record.set_text(KeyField::FixVersion, Some("function() { return x; }"));

        assert_eq!(record.remediation.as_deref(), Some("Upgrade to 2.4.1 or later"));
        assert!(record.fix_version.is_none());
        assert_eq!(record.issues.len(), 1);
        assert!(record.issues[0].contains("fix version"));
    }

    #[test]
    fn test_sanitize_truncates() {
        let long = "a ".repeat(MAX_FIELD_CHARS);
        let value = sanitize_field(KeyField::Remediation, &long)
            .expect("sanitize")
            .expect("non-empty");
        assert_eq!(value.chars().count(), MAX_FIELD_CHARS);
    }
}
