use std::collections::BTreeMap;

const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Fixed desktop-browser header profile sent with every page fetch.
///
/// Mirrors what a current Chrome build sends on a top-level navigation.
#[derive(Debug, Clone)]
pub struct HeaderProfile {
    headers: BTreeMap<String, String>,
}

impl HeaderProfile {
    /// The built-in browser profile.
    pub fn browser() -> Self {
        let headers = [
            ("user-agent", DESKTOP_USER_AGENT),
            (
                "accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
            ),
            ("accept-language", "en-US,en;q=0.9"),
            ("cache-control", "no-cache"),
            ("pragma", "no-cache"),
            ("sec-fetch-dest", "document"),
            ("sec-fetch-mode", "navigate"),
            ("sec-fetch-site", "none"),
            ("sec-fetch-user", "?1"),
            ("upgrade-insecure-requests", "1"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self { headers }
    }

    /// Layer extra headers over the profile. Keys are matched case-insensitively.
    #[must_use]
    pub fn with_overrides(mut self, overrides: &BTreeMap<String, String>) -> Self {
        for (name, value) in overrides {
            self.headers.insert(name.to_ascii_lowercase(), value.clone());
        }
        self
    }

    /// Headers for one request: the profile plus request-level overrides.
    pub fn merged(&self, overrides: &BTreeMap<String, String>) -> BTreeMap<String, String> {
        self.clone().with_overrides(overrides).headers
    }

    pub fn user_agent(&self) -> &str {
        self.headers
            .get("user-agent")
            .map_or(DESKTOP_USER_AGENT, String::as_str)
    }
}

impl Default for HeaderProfile {
    fn default() -> Self {
        Self::browser()
    }
}
