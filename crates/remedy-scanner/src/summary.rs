use crate::record::ExtractedRecord;
use crate::state::ScrapeStatus;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// An input that never entered the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedUrl {
    pub input: String,
    pub reason: String,
}

/// Outcome of a run: one record per accepted URL, in input order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScrapeSummary {
    pub records: Vec<ExtractedRecord>,
    pub rejected: Vec<RejectedUrl>,
}

impl ScrapeSummary {
    pub fn new(records: Vec<ExtractedRecord>, rejected: Vec<RejectedUrl>) -> Self {
        Self { records, rejected }
    }

    pub fn with_status(&self, status: ScrapeStatus) -> impl Iterator<Item = &ExtractedRecord> {
        self.records.iter().filter(move |r| r.status == status)
    }

    pub fn count(&self, status: ScrapeStatus) -> usize {
        self.with_status(status).count()
    }

    pub fn urls_with_status(&self, status: ScrapeStatus) -> Vec<&str> {
        self.with_status(status).map(|r| r.url.as_str()).collect()
    }

    /// Human-readable report listing blocked, failed and rejected inputs.
    pub fn report(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Scraped {} URLs: {} success, {} blocked, {} empty, {} failed, {} rejected",
            self.records.len(),
            self.count(ScrapeStatus::Success),
            self.count(ScrapeStatus::Blocked),
            self.count(ScrapeStatus::Empty),
            self.count(ScrapeStatus::Failed),
            self.rejected.len(),
        );

        for (heading, status) in [
            ("Blocked (review manually)", ScrapeStatus::Blocked),
            ("Failed", ScrapeStatus::Failed),
        ] {
            if self.count(status) == 0 {
                continue;
            }
            let _ = writeln!(out, "{heading}:");
            for record in self.with_status(status) {
                let reason = record.issues.last().map(String::as_str).unwrap_or("unknown");
                let _ = writeln!(out, "  {} ({reason})", record.url);
            }
        }

        if !self.rejected.is_empty() {
            let _ = writeln!(out, "Rejected:");
            for rejected in &self.rejected {
                let _ = writeln!(out, "  {} ({})", rejected.input, rejected.reason);
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(url: &str, status: ScrapeStatus, issue: &str) -> ExtractedRecord {
        ExtractedRecord::unextracted(url, status, "generic", vec![issue.to_string()])
    }

    #[test]
    fn test_partition_and_report() {
        let summary = ScrapeSummary::new(
            vec![
                record("https://a.example/1", ScrapeStatus::Success, "ok"),
                record("https://b.example/2", ScrapeStatus::Blocked, "HTTP 403 Forbidden for https://b.example/2"),
                record("https://c.example/3", ScrapeStatus::Failed, "cancelled"),
                record("https://d.example/4", ScrapeStatus::Empty, "Missing patch ID"),
            ],
            vec![RejectedUrl {
                input: "not a url".to_string(),
                reason: "relative URL without a base".to_string(),
            }],
        );

        assert_eq!(summary.count(ScrapeStatus::Success), 1);
        assert_eq!(summary.urls_with_status(ScrapeStatus::Blocked), vec!["https://b.example/2"]);

        let report = summary.report();
        assert!(report.starts_with(
            "Scraped 4 URLs: 1 success, 1 blocked, 1 empty, 1 failed, 1 rejected\n"
        ));
        assert!(report.contains("Blocked (review manually):\n  https://b.example/2 (HTTP 403"));
        assert!(report.contains("Failed:\n  https://c.example/3 (cancelled)"));
        assert!(report.contains("Rejected:\n  not a url (relative URL without a base)"));
    }

    #[test]
    fn test_empty_report() {
        let report = ScrapeSummary::default().report();
        assert_eq!(
            report,
            "Scraped 0 URLs: 0 success, 0 blocked, 0 empty, 0 failed, 0 rejected\n"
        );
    }
}
