//! Record quality scoring.

use crate::record::{Classification, KeyField, PartialRecord};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const FIELD_POINTS: i32 = 25;
pub const SCRIPT_PENALTY: i32 = 30;
pub const PLACEHOLDER_PENALTY: i32 = 20;
pub const SHORT_TEXT_PENALTY: i32 = 20;
pub const JSON_FRAGMENT_PENALTY: i32 = 10;

/// Minimum number of letters and digits left once script and placeholder
/// tokens are removed.
pub const MIN_MEANINGFUL_CHARS: usize = 10;

static SCRIPT_CODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)\bfunction\s*\w*\s*\(|\b(?:var|let|const)\s+[A-Za-z_$][\w$]*\s*=|=>\s*\{|\bdocument\.\w+|\bwindow\.\w+|\$\(\s*['"]|\breturn\s+[^;]{0,40};"#,
    )
    .expect("script regex is hardcoded and valid")
});

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bundefined\b|\[object \w+\]|\bNaN\b|\{\{[^}]*\}\}|\$\{[^}]*\}")
        .expect("placeholder regex is hardcoded and valid")
});

static JSON_FRAGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{[^{}]{0,50}\}|\[\s*\]").expect("json fragment regex is hardcoded and valid")
});

/// Score and classification for one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityReport {
    /// 0 to 100
    pub score: u8,
    pub classification: Classification,
    pub issues: Vec<String>,
}

/// Score a record.
///
/// Each present key field earns 25 points. Penalties apply to the combined
/// text of the key fields: script code -30, placeholder values -20, fewer
/// than ten meaningful characters -20, JSON fragments -10. The total is
/// clamped to 0..=100.
pub fn assess_quality(record: &PartialRecord) -> QualityReport {
    let mut score: i32 = 0;
    let mut issues = Vec::new();

    for field in KeyField::ALL {
        if record.get(field).is_some() {
            score += FIELD_POINTS;
        } else {
            issues.push(format!("Missing {field}"));
        }
    }

    let text = record.combined_text();

    if SCRIPT_CODE.is_match(&text) {
        score -= SCRIPT_PENALTY;
        issues.push("Contains script code".to_string());
    }

    if PLACEHOLDER.is_match(&text) {
        score -= PLACEHOLDER_PENALTY;
        issues.push("Contains placeholder values".to_string());
    }

    if meaningful_chars(&text) < MIN_MEANINGFUL_CHARS {
        score -= SHORT_TEXT_PENALTY;
        issues.push("Insufficient text content".to_string());
    }

    if JSON_FRAGMENT.is_match(&text) {
        score -= JSON_FRAGMENT_PENALTY;
        issues.push("Contains JSON fragments".to_string());
    }

    let score = score.clamp(0, 100) as u8;
    QualityReport {
        score,
        classification: Classification::from_score(score),
        issues,
    }
}

/// Letters and digits remaining once script and placeholder tokens are removed.
pub fn meaningful_chars(text: &str) -> usize {
    let without_script = SCRIPT_CODE.replace_all(text, " ");
    let without_placeholders = PLACEHOLDER.replace_all(&without_script, " ");
    without_placeholders
        .chars()
        .filter(|c| c.is_alphanumeric())
        .count()
}

/// True when the text is script code with no meaningful prose around it.
pub(crate) fn is_script_only(text: &str) -> bool {
    SCRIPT_CODE.is_match(text) && meaningful_chars(text) < MIN_MEANINGFUL_CHARS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fields: &[(KeyField, &str)]) -> PartialRecord {
        let mut record = PartialRecord::default();
        for (field, value) in fields {
            let value = Some(value.to_string());
            match field {
                KeyField::PatchId => record.patch_id = value,
                KeyField::FixVersion => record.fix_version = value,
                KeyField::AffectedVersions => record.affected_versions = value,
                KeyField::Remediation => record.remediation = value,
            }
        }
        record
    }

    #[test]
    fn test_complete_clean_record_scores_100() {
        let report = assess_quality(&record(&[
            (KeyField::PatchId, "KB5034441"),
            (KeyField::FixVersion, "10.0.19045.3930"),
            (KeyField::AffectedVersions, "Windows 10 Version 22H2"),
            (KeyField::Remediation, "Install the January 2024 cumulative update"),
        ]));

        assert_eq!(report.score, 100);
        assert_eq!(report.classification, Classification::Excellent);
        assert!(report.issues.is_empty());
    }

    #[test]
    fn test_empty_record_scores_zero() {
        let report = assess_quality(&PartialRecord::default());
        assert_eq!(report.score, 0);
        assert_eq!(report.classification, Classification::Failed);
        assert!(report.issues.contains(&"Missing patch ID".to_string()));
        assert!(report.issues.contains(&"Insufficient text content".to_string()));
    }

    #[test]
    fn test_each_field_adds_exactly_25() {
        let prose = "Upgrade every affected deployment promptly";
        for field in KeyField::ALL {
            let report = assess_quality(&record(&[(field, prose)]));
            assert_eq!(report.score, 25, "field {field}");
            assert_eq!(report.classification, Classification::Poor);
        }
    }

    #[test]
    fn test_script_code_caps_complete_record() {
        let report = assess_quality(&record(&[
            (KeyField::PatchId, "KB5034441"),
            (KeyField::FixVersion, "10.0.19045.3930"),
            (KeyField::AffectedVersions, "Windows 10 Version 22H2"),
            (
                KeyField::Remediation,
                "Install the update. var handler = window.onload",
            ),
        ]));

        assert!(report.score <= 70);
        assert!(report.issues.contains(&"Contains script code".to_string()));
    }

    #[test]
    fn test_placeholder_garbage_scores_failed() {
        let report = assess_quality(&record(&[(
            KeyField::Remediation,
            "undefined undefined function() { undefined }",
        )]));

        assert!(report.score <= 10);
        assert_eq!(report.classification, Classification::Failed);
        assert!(report.issues.contains(&"Contains script code".to_string()));
        assert!(report.issues.contains(&"Contains placeholder values".to_string()));
        assert!(report.issues.contains(&"Insufficient text content".to_string()));
    }

    #[test]
    fn test_json_fragment_penalty() {
        let report = assess_quality(&record(&[
            (KeyField::PatchId, "KB5034441"),
            (KeyField::Remediation, "Apply the fix {\"id\": 12}"),
        ]));
        assert_eq!(report.score, 40);
        assert!(report.issues.contains(&"Contains JSON fragments".to_string()));
    }

    #[test]
    fn test_short_text_penalty() {
        let report = assess_quality(&record(&[(KeyField::FixVersion, "1.2.3")]));
        assert_eq!(report.score, 5);
    }

    #[test]
    fn test_meaningful_chars_ignores_tokens() {
        assert_eq!(meaningful_chars("undefined NaN function() {}"), 0);
        assert_eq!(meaningful_chars("Patch 42"), 7);
    }
}
