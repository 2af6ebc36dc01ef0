//! Microsoft security bulletins (MSRC CVRF API) and support pages.

use crate::error::{Result, VendorError};
use crate::ApiData;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use remedy_core::{AdvisoryUrl, SourcesConfig};
use remedy_extract::{clean_html, extract_cves, extract_kbs, KeyField, PartialRecord};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

const VENDOR: &str = "microsoft";

/// Pages smaller than this are treated as an unrendered JavaScript shell.
pub const JS_SHELL_THRESHOLD: usize = 5_000;

/// Update catalog search page for a KB article.
pub fn catalog_link(kb: &str) -> String {
    format!("https://www.catalog.update.microsoft.com/Search.aspx?q={kb}")
}

static BARE_KB_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d{6,7})\s*$").expect("KB number regex is hardcoded and valid"));

static CVE_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^CVE-(\d{4})-").expect("CVE year regex is hardcoded and valid"));

/// One monthly bulletin release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulletinUpdate {
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulletinRemediation {
    pub url: Option<String>,
    pub description: Option<String>,
    pub product_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulletinVulnerability {
    pub cve: String,
    pub remediations: Vec<BulletinRemediation>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulletinProduct {
    pub id: String,
    pub name: String,
}

/// A bulletin document: vulnerabilities with their remediations, and the
/// products they refer to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulletinDocument {
    pub id: String,
    pub vulnerabilities: Vec<BulletinVulnerability>,
    pub products: Vec<BulletinProduct>,
}

impl BulletinDocument {
    pub fn find(&self, cve: &str) -> Option<&BulletinVulnerability> {
        self.vulnerabilities
            .iter()
            .find(|v| v.cve.eq_ignore_ascii_case(cve))
    }

    pub fn product_name(&self, id: &str) -> Option<&str> {
        self.products
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.name.as_str())
    }
}

/// Source of bulletin documents.
#[async_trait]
pub trait BulletinSource: Send + Sync {
    async fn list_updates(&self, year: i32) -> Result<Vec<BulletinUpdate>>;
    async fn get_document(&self, id: &str) -> Result<BulletinDocument>;
}

// Wire shapes of the CVRF JSON API

#[derive(Deserialize)]
struct UpdatesResponse {
    #[serde(default)]
    value: Vec<UpdateEntry>,
}

#[derive(Deserialize)]
struct UpdateEntry {
    #[serde(rename = "ID")]
    id: String,
}

#[derive(Deserialize)]
struct CvrfDocument {
    #[serde(rename = "Vulnerability", default)]
    vulnerabilities: Vec<CvrfVulnerability>,
    #[serde(rename = "ProductTree", default)]
    product_tree: CvrfProductTree,
}

#[derive(Deserialize)]
struct CvrfVulnerability {
    #[serde(rename = "CVE", default)]
    cve: String,
    #[serde(rename = "Remediations", default)]
    remediations: Vec<CvrfRemediation>,
}

#[derive(Deserialize)]
struct CvrfRemediation {
    #[serde(rename = "URL", default)]
    url: Option<String>,
    #[serde(rename = "Description", default)]
    description: Option<CvrfValue>,
    #[serde(rename = "ProductID", default)]
    product_ids: Vec<String>,
}

#[derive(Deserialize)]
struct CvrfValue {
    #[serde(rename = "Value", default)]
    value: Option<String>,
}

#[derive(Deserialize, Default)]
struct CvrfProductTree {
    #[serde(rename = "FullProductName", default)]
    products: Vec<CvrfProduct>,
}

#[derive(Deserialize)]
struct CvrfProduct {
    #[serde(rename = "ProductID")]
    id: String,
    #[serde(rename = "Value", default)]
    name: String,
}

impl CvrfDocument {
    fn into_document(self, id: &str) -> BulletinDocument {
        BulletinDocument {
            id: id.to_string(),
            vulnerabilities: self
                .vulnerabilities
                .into_iter()
                .map(|v| BulletinVulnerability {
                    cve: v.cve,
                    remediations: v
                        .remediations
                        .into_iter()
                        .map(|r| BulletinRemediation {
                            url: r.url,
                            description: r.description.and_then(|d| d.value),
                            product_ids: r.product_ids,
                        })
                        .collect(),
                })
                .collect(),
            products: self
                .product_tree
                .products
                .into_iter()
                .map(|p| BulletinProduct {
                    id: p.id,
                    name: p.name,
                })
                .collect(),
        }
    }
}

/// Client for the MSRC CVRF API.
#[derive(Debug, Clone)]
pub struct MsrcClient {
    client: reqwest::Client,
    api_base: String,
}

impl MsrcClient {
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
            api_base: sources.msrc_api_base.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: String) -> Result<T> {
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|source| VendorError::Http {
                vendor: VENDOR,
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(VendorError::Status {
                vendor: VENDOR,
                url,
                status: status.as_u16(),
            });
        }

        response.json::<T>().await.map_err(|e| VendorError::Malformed {
            vendor: VENDOR,
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl BulletinSource for MsrcClient {
    async fn list_updates(&self, year: i32) -> Result<Vec<BulletinUpdate>> {
        let response: UpdatesResponse = self
            .get_json(format!("{}/updates('{year}')", self.api_base))
            .await?;
        Ok(response
            .value
            .into_iter()
            .map(|u| BulletinUpdate { id: u.id })
            .collect())
    }

    async fn get_document(&self, id: &str) -> Result<BulletinDocument> {
        let document: CvrfDocument = self.get_json(format!("{}/cvrf/{id}", self.api_base)).await?;
        Ok(document.into_document(id))
    }
}

/// Years to search for a CVE: its own year, then the year before and after.
pub fn candidate_years(cve: &str) -> Vec<i32> {
    CVE_YEAR
        .captures(cve)
        .and_then(|c| c[1].parse::<i32>().ok())
        .map(|year| vec![year, year - 1, year + 1])
        .unwrap_or_default()
}

/// KB numbers named by a remediation's URL or description.
fn remediation_kbs(remediation: &BulletinRemediation) -> Vec<String> {
    let mut kbs = Vec::new();
    if let Some(description) = remediation.description.as_deref() {
        match BARE_KB_NUMBER.captures(description) {
            Some(c) => kbs.push(format!("KB{}", &c[1])),
            None => kbs.extend(extract_kbs(description)),
        }
    }
    if let Some(url) = remediation.url.as_deref() {
        kbs.extend(extract_kbs(url));
        if let Some(c) = url
            .rsplit(['=', '/'])
            .next()
            .and_then(|tail| BARE_KB_NUMBER.captures(tail))
        {
            kbs.push(format!("KB{}", &c[1]));
        }
    }
    kbs
}

/// Build a record from a matching bulletin entry.
pub fn record_from_bulletin(
    document: &BulletinDocument,
    vulnerability: &BulletinVulnerability,
) -> PartialRecord {
    let mut kbs: Vec<String> = Vec::new();
    let mut products: Vec<String> = Vec::new();

    for remediation in &vulnerability.remediations {
        for kb in remediation_kbs(remediation) {
            if !kbs.contains(&kb) {
                kbs.push(kb);
            }
        }
        for name in remediation
            .product_ids
            .iter()
            .filter_map(|id| document.product_name(id))
        {
            if !products.iter().any(|p| p == name) {
                products.push(name.to_string());
            }
        }
    }

    let mut record = PartialRecord::new();
    record.set_text(KeyField::PatchId, kbs.first().map(String::as_str));
    if !products.is_empty() {
        record.set_text(KeyField::AffectedVersions, Some(&products.join("; ")));
    }
    if !kbs.is_empty() {
        record.set_text(
            KeyField::Remediation,
            Some(&format!(
                "Install the security updates {} from the {} release.",
                kbs.join(", "),
                document.id
            )),
        );
    }
    record.add_links(kbs.iter().map(|kb| catalog_link(kb)));
    record
}

/// Bulletin-backed strategy for Microsoft advisories.
#[derive(Clone, Default)]
pub struct MicrosoftStrategy {
    bulletins: Option<Arc<dyn BulletinSource>>,
}

impl fmt::Debug for MicrosoftStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MicrosoftStrategy")
            .field("bulletins", &self.bulletins.is_some())
            .finish()
    }
}

impl MicrosoftStrategy {
    pub const NAME: &'static str = VENDOR;
    const HOSTS: &'static [&'static str] = &[
        "msrc.microsoft.com",
        "portal.msrc.microsoft.com",
        "support.microsoft.com",
    ];

    pub fn new(bulletins: Option<Arc<dyn BulletinSource>>) -> Self {
        Self { bulletins }
    }

    pub fn can_handle(&self, url: &AdvisoryUrl) -> bool {
        crate::host_matches(url.domain(), Self::HOSTS)
    }

    pub fn supports_api(&self) -> bool {
        self.bulletins.is_some()
    }

    /// Search bulletins for the CVE named in the URL.
    pub async fn get_api_data(&self, url: &AdvisoryUrl) -> Result<ApiData> {
        let bulletins = self
            .bulletins
            .as_ref()
            .ok_or(VendorError::ApiUnsupported { vendor: VENDOR })?;

        let cve = extract_cves(url.as_str())
            .into_iter()
            .next()
            .ok_or_else(|| VendorError::UnresolvableUrl {
                vendor: VENDOR,
                url: url.to_string(),
                reason: "no CVE identifier in URL".to_string(),
            })?;

        for year in candidate_years(&cve) {
            let updates = match bulletins.list_updates(year).await {
                Ok(updates) => updates,
                Err(e) => {
                    tracing::debug!(%cve, year, error = %e, "bulletin listing failed");
                    continue;
                }
            };

            for update in updates {
                let document = match bulletins.get_document(&update.id).await {
                    Ok(document) => document,
                    Err(e) => {
                        tracing::debug!(%cve, bulletin = %update.id, error = %e, "bulletin fetch failed");
                        continue;
                    }
                };

                if let Some(vulnerability) = document.find(&cve) {
                    tracing::info!(%cve, bulletin = %document.id, "found CVE in bulletin");
                    let record = record_from_bulletin(&document, vulnerability);
                    let text = vulnerability
                        .remediations
                        .iter()
                        .filter_map(|r| r.description.clone())
                        .chain(std::iter::once(cve.clone()))
                        .collect::<Vec<_>>()
                        .join("\n");
                    return Ok(ApiData { record, text });
                }
            }
        }

        Err(VendorError::NoMatch {
            vendor: VENDOR,
            subject: cve,
        })
    }

    /// Page path: KB references and their catalog links.
    pub fn extract_data(&self, content: &str, _url: &AdvisoryUrl) -> PartialRecord {
        let kbs = extract_kbs(&clean_html(content));
        let mut record = PartialRecord::new();
        record.set_text(KeyField::PatchId, kbs.first().map(String::as_str));
        record.add_links(kbs.iter().map(|kb| catalog_link(kb)));
        record
    }
}
