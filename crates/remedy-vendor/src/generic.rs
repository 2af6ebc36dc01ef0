//! Vendor-agnostic extraction, used for unknown sources and as the generic
//! pass merged under every strategy's own fields.

use once_cell::sync::Lazy;
use regex::Regex;
use remedy_core::AdvisoryUrl;
use remedy_extract::{
    clean_html, extract_commit_hashes, extract_download_links, extract_kbs, KeyField,
    PartialRecord,
};
use scraper::{ElementRef, Html, Node, Selector};

/// Longest remediation span taken from a page.
pub const REMEDIATION_SPAN_CHARS: usize = 1500;

/// One way of locating the remediation text on a page.
enum SpanPattern {
    /// Element whose id or class names the section
    Section(Selector),
    /// Heading-like element whose own text matches; the span is what follows it
    Heading(Regex),
    /// Plain-text pattern over the cleaned page; capture group 1 is the span
    Text(Regex),
}

fn regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("generic pattern is hardcoded and valid")
}

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("generic selector is hardcoded and valid")
}

// Order is priority: the first pattern that yields text wins.
static REMEDIATION_PATTERNS: Lazy<Vec<SpanPattern>> = Lazy::new(|| {
    vec![
        SpanPattern::Section(selector(
            r#"[id*="remediation"], [class*="remediation"], [id*="solution"], [id*="fixed-software"]"#,
        )),
        SpanPattern::Heading(regex(
            r"(?i)^\s*(?:recommended\s+)?(?:remediation|solutions?|fix(?:es)?|fixed\s+software|resolution|recommendations?|how\s+to\s+fix|patch(?:es)?|updates?)(?:\s+\w+){0,2}\s*:?\s*$",
        )),
        SpanPattern::Heading(regex(r"(?i)^\s*mitigations?(?:\s+\w+){0,2}\s*:?\s*$")),
        SpanPattern::Heading(regex(r"(?i)^\s*workarounds?(?:\s+\w+){0,2}\s*:?\s*$")),
        SpanPattern::Text(regex(
            r"(?im)^(?:remediation|solution|resolution|recommended\s+actions?)\s*[:\-]\s*(\S[^\n]{4,})$",
        )),
        SpanPattern::Text(regex(
            r"(?i)\b((?:upgrade|update|apply|install)\s+(?:to|the)\s[^\n]{3,300})",
        )),
        SpanPattern::Text(regex(r"(?im)^(?:mitigations?|workarounds?)\s*[:\-]\s*(\S[^\n]{4,})$")),
    ]
});

static HEADING_CANDIDATES: Lazy<Selector> =
    Lazy::new(|| selector("h1, h2, h3, h4, h5, h6, dt, th, strong, b"));

static FIX_VERSION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        regex(r"(?i)\b(?:fixed|patched|resolved|addressed|corrected)\s+in\s+(?:version\s+|release\s+)?v?(\d+(?:\.\d+)+(?:[-+][0-9A-Za-z.]+)?)"),
        regex(r"(?i)\b(?:upgrade|update)\s+to\s+(?:version\s+|release\s+)?v?(\d+(?:\.\d+)+(?:[-+][0-9A-Za-z.]+)?)"),
        regex(r"(?i)\bfixed\s+versions?\s*[:\-]\s*v?(\d+(?:\.\d+)+(?:[-+][0-9A-Za-z.]+)?)"),
    ]
});

static AFFECTED_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        regex(r"(?im)\baffected\s+(?:versions?|products?|releases?)\s*[:\-]?\s*([^\n]{3,200})"),
        regex(r"(?i)\b((?:all\s+)?versions?\s+(?:prior\s+to|before|earlier\s+than|older\s+than|below|up\s+to(?:\s+and\s+including)?)\s+v?\d+(?:\.\d+)+)"),
        regex(r"(?i)\b(v?\d+(?:\.\d+)+\s+(?:through|to)\s+v?\d+(?:\.\d+)+)"),
        regex(r"(?i)\b((?:prior\s+to|before)\s+v?\d+(?:\.\d+)+)"),
    ]
});

fn is_section_heading(name: &str) -> bool {
    matches!(name, "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "dt")
}

fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Text following a heading, up to the next section heading.
fn text_after(heading: ElementRef<'_>) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut len = 0;

    for sibling in heading.next_siblings() {
        let piece = match sibling.value() {
            Node::Element(el) if is_section_heading(el.name()) => break,
            Node::Element(el) if matches!(el.name(), "script" | "style" | "noscript") => continue,
            Node::Element(_) => ElementRef::wrap(sibling)
                .map(|el| clean_html(&el.html()))
                .unwrap_or_default(),
            Node::Text(text) => {
                let text: &str = text;
                text.to_string()
            }
            _ => continue,
        };

        let piece = collapse(&piece);
        if piece.is_empty() {
            continue;
        }
        len += piece.len();
        parts.push(piece);
        if len >= REMEDIATION_SPAN_CHARS {
            break;
        }
    }

    let joined = parts.join(" ");
    collapse(joined.trim_start_matches([':', '-', ' ']))
}

/// Locate the remediation, mitigation or workaround span of a page.
pub fn remediation_span(document: &Html, text: &str) -> Option<String> {
    let span = REMEDIATION_PATTERNS.iter().find_map(|pattern| match pattern {
        SpanPattern::Section(sel) => document
            .select(sel)
            .map(|el| collapse(&clean_html(&el.html())))
            .find(|t| t.len() >= 10),
        SpanPattern::Heading(re) => document
            .select(&HEADING_CANDIDATES)
            .filter(|el| re.is_match(&collapse(&el.text().collect::<String>())))
            .map(text_after)
            .find(|t| t.len() >= 10),
        SpanPattern::Text(re) => re
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string()),
    })?;

    Some(truncate_chars(&span, REMEDIATION_SPAN_CHARS))
}

/// First version named by a "fixed in" or "upgrade to" phrase.
pub fn fix_version(text: &str) -> Option<String> {
    FIX_VERSION_PATTERNS.iter().find_map(|re| {
        re.captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim_end_matches('.').to_string())
    })
}

/// First affected-version range or list mentioned in the text.
pub fn affected_versions(text: &str) -> Option<String> {
    AFFECTED_PATTERNS.iter().find_map(|re| {
        re.captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().trim_end_matches(['.', ',', ';']).to_string())
    })
}

/// Catch-all strategy; handles every URL.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericStrategy;

impl GenericStrategy {
    pub const NAME: &'static str = "generic";

    pub fn extract(&self, content: &str, url: &AdvisoryUrl) -> PartialRecord {
        let document = Html::parse_document(content);
        let text = clean_html(content);
        let mut record = PartialRecord::new();

        record.set_text(
            KeyField::Remediation,
            remediation_span(&document, &text).as_deref(),
        );
        record.set_text(KeyField::FixVersion, fix_version(&text).as_deref());
        record.set_text(KeyField::AffectedVersions, affected_versions(&text).as_deref());

        let patch_id = extract_kbs(&text)
            .into_iter()
            .next()
            .or_else(|| extract_commit_hashes(content).into_iter().next());
        record.set_text(KeyField::PatchId, patch_id.as_deref());

        record.add_links(extract_download_links(content, url.as_str()));

        tracing::debug!(
            url = %url,
            fields = record.key_field_count(),
            links = record.download_links.len(),
            "generic extraction"
        );
        record
    }
}
