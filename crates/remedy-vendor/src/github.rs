//! GitHub repositories, releases and security advisories.

use crate::error::{Result, VendorError};
use crate::ApiData;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use remedy_core::{AdvisoryUrl, SourcesConfig};
use remedy_extract::{clean_html, extract_download_links, KeyField, PartialRecord};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

const VENDOR: &str = "github";

/// Characters of README text carried into the remediation summary.
pub const README_EXCERPT_CHARS: usize = 500;

static GHSA_IN_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)/security/advisories/(GHSA(?:-[23456789cfghjmpqrvwx]{4}){3})")
        .expect("GHSA path regex is hardcoded and valid")
});

/// Owner and repository named by a GitHub URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
    /// Security advisory id when the URL points at one
    pub advisory: Option<String>,
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

impl RepoRef {
    /// Parse `github.com/{owner}/{repo}/...` or `api.github.com/repos/{owner}/{repo}/...`.
    pub fn from_url(url: &AdvisoryUrl) -> Option<Self> {
        let parsed = url::Url::parse(url.as_str()).ok()?;
        let mut segments = parsed
            .path_segments()?
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        if url.domain() == "api.github.com" {
            if segments.first() != Some(&"repos") {
                return None;
            }
            segments.remove(0);
        }

        let owner = segments.first()?.to_string();
        let repo = segments.get(1)?.trim_end_matches(".git").to_string();
        if owner.is_empty() || repo.is_empty() {
            return None;
        }

        let advisory = GHSA_IN_PATH
            .captures(parsed.path())
            .map(|c| normalize_ghsa(&c[1]));

        Some(Self {
            owner,
            repo,
            advisory,
        })
    }
}

fn normalize_ghsa(raw: &str) -> String {
    format!("GHSA{}", raw[4..].to_lowercase())
}

/// Repository metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepositoryInfo {
    pub full_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub html_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub browser_download_url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReleaseInfo {
    pub tag_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub tarball_url: Option<String>,
    #[serde(default)]
    pub zipball_url: Option<String>,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

/// Read-only view of the repository API.
#[async_trait]
pub trait RepositoryApi: Send + Sync {
    async fn repository(&self, owner: &str, repo: &str) -> Result<RepositoryInfo>;

    /// README as raw text, `None` when the repository has none.
    async fn readme(&self, owner: &str, repo: &str) -> Result<Option<String>>;

    /// Releases newest first.
    async fn releases(&self, owner: &str, repo: &str) -> Result<Vec<ReleaseInfo>>;
}

/// Anonymous REST client for the GitHub API.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: reqwest::Client,
    api_base: String,
}

impl GitHubClient {
    pub fn new(sources: &SourcesConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&sources.api_user_agent)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|source| VendorError::Http {
                vendor: VENDOR,
                source,
            })?;

        Ok(Self {
            client,
            api_base: sources.github_api_base.trim_end_matches('/').to_string(),
        })
    }

    async fn get(&self, path: &str, accept: &str) -> Result<Option<reqwest::Response>> {
        let url = format!("{}{path}", self.api_base);
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, accept)
            .send()
            .await
            .map_err(|source| VendorError::Http {
                vendor: VENDOR,
                source,
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(VendorError::Status {
                vendor: VENDOR,
                url,
                status: status.as_u16(),
            });
        }
        Ok(Some(response))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let Some(response) = self.get(path, "application/vnd.github+json").await? else {
            return Ok(None);
        };
        response
            .json::<T>()
            .await
            .map(Some)
            .map_err(|e| VendorError::Malformed {
                vendor: VENDOR,
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl RepositoryApi for GitHubClient {
    async fn repository(&self, owner: &str, repo: &str) -> Result<RepositoryInfo> {
        self.get_json(&format!("/repos/{owner}/{repo}"))
            .await?
            .ok_or_else(|| VendorError::NoMatch {
                vendor: VENDOR,
                subject: format!("{owner}/{repo}"),
            })
    }

    async fn readme(&self, owner: &str, repo: &str) -> Result<Option<String>> {
        let Some(response) = self
            .get(
                &format!("/repos/{owner}/{repo}/readme"),
                "application/vnd.github.raw+json",
            )
            .await?
        else {
            return Ok(None);
        };
        response
            .text()
            .await
            .map(Some)
            .map_err(|source| VendorError::Http {
                vendor: VENDOR,
                source,
            })
    }

    async fn releases(&self, owner: &str, repo: &str) -> Result<Vec<ReleaseInfo>> {
        Ok(self
            .get_json(&format!("/repos/{owner}/{repo}/releases?per_page=10"))
            .await?
            .unwrap_or_default())
    }
}

/// API-first strategy for GitHub.
#[derive(Clone, Default)]
pub struct GitHubStrategy {
    api: Option<Arc<dyn RepositoryApi>>,
}

impl fmt::Debug for GitHubStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubStrategy")
            .field("api", &self.api.is_some())
            .finish()
    }
}

impl GitHubStrategy {
    pub const NAME: &'static str = VENDOR;
    const HOSTS: &'static [&'static str] = &["github.com", "api.github.com"];

    pub fn new(api: Option<Arc<dyn RepositoryApi>>) -> Self {
        Self { api }
    }

    pub fn can_handle(&self, url: &AdvisoryUrl) -> bool {
        crate::host_matches(url.domain(), Self::HOSTS)
    }

    pub fn supports_api(&self) -> bool {
        self.api.is_some()
    }

    pub async fn get_api_data(&self, url: &AdvisoryUrl) -> Result<ApiData> {
        let api = self
            .api
            .as_ref()
            .ok_or(VendorError::ApiUnsupported { vendor: VENDOR })?;
        let repo_ref = RepoRef::from_url(url).ok_or_else(|| VendorError::UnresolvableUrl {
            vendor: VENDOR,
            url: url.to_string(),
            reason: "no owner/repository in path".to_string(),
        })?;

        let info = api.repository(&repo_ref.owner, &repo_ref.repo).await?;

        // README and releases are optional enrichments
        let readme = match api.readme(&repo_ref.owner, &repo_ref.repo).await {
            Ok(readme) => readme,
            Err(e) => {
                tracing::debug!(repo = %repo_ref, error = %e, "README unavailable");
                None
            }
        };
        let releases = match api.releases(&repo_ref.owner, &repo_ref.repo).await {
            Ok(releases) => releases,
            Err(e) => {
                tracing::debug!(repo = %repo_ref, error = %e, "releases unavailable");
                Vec::new()
            }
        };

        let latest = releases.iter().find(|r| !r.draft);
        let mut record = PartialRecord::new();

        record.set_text(KeyField::PatchId, repo_ref.advisory.as_deref());
        record.set_text(KeyField::FixVersion, latest.map(|r| r.tag_name.as_str()));
        record.set_text(
            KeyField::Remediation,
            Some(&remediation_summary(&info, readme.as_deref(), latest)),
        );

        for release in releases.iter().filter(|r| !r.draft) {
            record.add_links(release.assets.iter().map(|a| a.browser_download_url.clone()));
            record.add_links(release.tarball_url.iter().cloned());
            record.add_links(release.zipball_url.iter().cloned());
        }

        tracing::info!(
            repo = %repo_ref,
            releases = releases.len(),
            links = record.download_links.len(),
            "collected repository data from API"
        );

        let text = [
            info.description.clone().unwrap_or_default(),
            readme.unwrap_or_default(),
        ]
        .join("\n");

        Ok(ApiData { record, text })
    }

    /// Page path: generic download links, plus the advisory id when present.
    pub fn extract_data(&self, content: &str, url: &AdvisoryUrl) -> PartialRecord {
        let mut record = PartialRecord::new();
        if let Some(repo_ref) = RepoRef::from_url(url) {
            record.set_text(KeyField::PatchId, repo_ref.advisory.as_deref());
        }
        record.add_links(extract_download_links(content, url.as_str()));
        record
    }
}

fn remediation_summary(
    info: &RepositoryInfo,
    readme: Option<&str>,
    latest: Option<&ReleaseInfo>,
) -> String {
    let mut parts = Vec::new();
    if let Some(description) = info.description.as_deref().filter(|d| !d.trim().is_empty()) {
        parts.push(description.trim().to_string());
    }
    if let Some(readme) = readme {
        let cleaned = clean_html(readme)
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        let excerpt: String = cleaned.chars().take(README_EXCERPT_CHARS).collect();
        if !excerpt.is_empty() {
            parts.push(excerpt);
        }
    }
    if let Some(release) = latest {
        parts.push(format!("Latest release: {}", release.tag_name));
    }
    parts.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(raw: &str) -> AdvisoryUrl {
        AdvisoryUrl::parse(raw).expect("url")
    }

    #[test]
    fn test_repo_ref_from_web_url() {
        let r = RepoRef::from_url(&url("https://github.com/acme/widget/releases/tag/v1.2.0"))
            .expect("repo");
        assert_eq!(r.owner, "acme");
        assert_eq!(r.repo, "widget");
        assert_eq!(r.advisory, None);
    }

    #[test]
    fn test_repo_ref_from_api_url() {
        let r = RepoRef::from_url(&url("https://api.github.com/repos/acme/widget")).expect("repo");
        assert_eq!(r.to_string(), "acme/widget");
        assert!(RepoRef::from_url(&url("https://api.github.com/users/acme")).is_none());
    }

    #[test]
    fn test_repo_ref_advisory() {
        let r = RepoRef::from_url(&url(
            "https://github.com/acme/widget/security/advisories/GHSA-4W2V-q235-vp99",
        ))
        .expect("repo");
        assert_eq!(r.advisory.as_deref(), Some("GHSA-4w2v-q235-vp99"));
    }

    #[test]
    fn test_repo_ref_requires_repo() {
        assert!(RepoRef::from_url(&url("https://github.com/acme")).is_none());
        assert!(RepoRef::from_url(&url("https://github.com/")).is_none());
    }

    #[test]
    fn test_can_handle() {
        let strategy = GitHubStrategy::default();
        assert!(strategy.can_handle(&url("https://github.com/a/b")));
        assert!(strategy.can_handle(&url("https://api.github.com/repos/a/b")));
        assert!(!strategy.can_handle(&url("https://gitlab.com/a/b")));
        assert!(!strategy.supports_api());
    }

    #[test]
    fn test_remediation_summary_truncates_readme() {
        let info = RepositoryInfo {
            full_name: "acme/widget".into(),
            description: Some("Widget toolkit".into()),
            html_url: String::new(),
        };
        let readme = "word ".repeat(400);
        let release = ReleaseInfo {
            tag_name: "v1.2.0".into(),
            ..ReleaseInfo::default()
        };

        let summary = remediation_summary(&info, Some(&readme), Some(&release));
        let parts: Vec<&str> = summary.split("\n\n").collect();
        assert_eq!(parts[0], "Widget toolkit");
        assert_eq!(parts[1].chars().count(), README_EXCERPT_CHARS);
        assert_eq!(parts[2], "Latest release: v1.2.0");
    }
}
