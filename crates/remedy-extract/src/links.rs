//! Download-link harvesting.
//!
//! A link is kept when it points at a patch artifact: either its path ends in
//! a known package extension or it matches a vendor download host or path.
//! Page assets (stylesheets, scripts, images, fonts, documents) are never
//! kept, whichever way they were found.

use crate::entities::ordered_unique;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

const ARTIFACT_EXTENSIONS: &[&str] = &[
    ".zip", ".tar.gz", ".tgz", ".tar.bz2", ".tbz2", ".tar.xz", ".txz", ".gz", ".bz2", ".xz",
    ".7z", ".rar", ".msi", ".msu", ".msp", ".exe", ".cab", ".rpm", ".deb", ".apk", ".dmg",
    ".pkg", ".jar", ".war", ".whl", ".gem", ".nupkg", ".crate", ".patch", ".diff", ".bin",
    ".iso", ".img", ".run",
];

const ARTIFACT_LOCATIONS: &[&str] = &[
    "catalog.update.microsoft.com",
    "download.microsoft.com",
    "download.windowsupdate.com",
    "/releases/download/",
    "/archive/refs/",
    "/tarball/",
    "/zipball/",
    "software.cisco.com/download",
    "access.redhat.com/downloads",
];

const EXCLUDED_EXTENSIONS: &[&str] = &[
    ".css", ".js", ".png", ".jpg", ".jpeg", ".gif", ".svg", ".ico", ".webp", ".woff", ".woff2",
    ".ttf", ".eot", ".map", ".pdf", ".doc", ".docx",
];

const EXCLUDED_FRAGMENTS: &[&str] = &[
    "jquery",
    "/themes/",
    "/fonts/",
    "/images/",
    "bootstrap",
    "analytics",
    "googletagmanager",
];

static LINK_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("a[href], area[href], link[href], [src]").expect("link selector is hardcoded and valid")
});

static BARE_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"https?://[^\s"'<>()\[\]{}\\`]+"#).expect("url regex is hardcoded and valid")
});

/// True when the link points at a page asset rather than a patch.
///
/// Matching is case-insensitive on the path for extensions and on the whole
/// URL for fragments.
pub fn is_excluded_link(link: &str) -> bool {
    let lowered = link.to_ascii_lowercase();
    if EXCLUDED_FRAGMENTS.iter().any(|f| lowered.contains(f)) {
        return true;
    }
    let path = path_of(&lowered);
    EXCLUDED_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// True when the link looks like a downloadable patch artifact.
pub fn is_artifact_link(link: &str) -> bool {
    let lowered = link.to_ascii_lowercase();
    let path = path_of(&lowered);
    ARTIFACT_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
        || ARTIFACT_LOCATIONS.iter().any(|loc| lowered.contains(loc))
}

fn path_of(link: &str) -> String {
    match Url::parse(link) {
        Ok(url) => url.path().to_string(),
        Err(_) => link
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    }
}

/// Resolve `candidate` against `base`, keeping only http(s) URLs.
pub fn resolve_link(base: Option<&Url>, candidate: &str) -> Option<String> {
    let candidate = candidate.trim().replace("&amp;", "&");
    if candidate.is_empty()
        || candidate.starts_with('#')
        || candidate.starts_with("javascript:")
        || candidate.starts_with("mailto:")
    {
        return None;
    }

    let resolved = match base {
        Some(base) => base.join(&candidate).ok()?,
        None => Url::parse(&candidate).ok()?,
    };

    match resolved.scheme() {
        "http" | "https" => Some(resolved.to_string()),
        _ => None,
    }
}

/// Collect patch download links from an HTML document.
///
/// `href` and `src` targets are resolved against `base_url`; absolute URLs appearing
/// anywhere in the raw markup are collected too. The result is deduplicated
/// in first-seen order and never contains an excluded link.
pub fn extract_download_links(html: &str, base_url: &str) -> Vec<String> {
    let base = Url::parse(base_url).ok();

    let document = Html::parse_document(html);
    let mut candidates: Vec<String> = document
        .select(&LINK_SELECTOR)
        .filter_map(|el| el.value().attr("href").or_else(|| el.value().attr("src")))
        .filter_map(|href| resolve_link(base.as_ref(), href))
        .collect();

    candidates.extend(
        BARE_URL
            .find_iter(html)
            .map(|m| m.as_str().trim_end_matches(['.', ',', ';', ':', '!', '?']))
            .filter_map(|raw| resolve_link(None, raw)),
    );

    ordered_unique(
        candidates
            .into_iter()
            .filter(|link| is_artifact_link(link) && !is_excluded_link(link)),
    )
}
