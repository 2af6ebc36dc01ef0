//! Configuration management for Remedy.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration.
///
/// This is loaded from `~/.config/remedy/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP fetching, throttling and retry settings
    pub fetch: FetchConfig,
    /// JavaScript render fallback settings
    pub render: RenderConfig,
    /// Pipeline scheduling settings
    pub scraping: ScrapingConfig,
    /// Upstream API endpoints used by vendor strategies
    pub sources: SourcesConfig,
}

impl AppConfig {
    /// Load configuration from the default path, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from an explicit path, falling back to defaults if missing.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            tracing::debug!("Loading config from {}", path.display());
            let contents = fs::read_to_string(path)?;
            let config: Self = toml::from_str(&contents)?;
            config.validate()?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `REMEDY_REQUESTS_PER_MINUTE`: Override per-domain request rate
    /// - `REMEDY_MAX_RETRIES`: Override maximum attempts per fetch
    /// - `REMEDY_TIMEOUT_SECS`: Override per-attempt timeout
    /// - `REMEDY_CONCURRENT_WORKERS`: Override worker pool size
    /// - `REMEDY_RENDER_ENABLED`: Override render fallback (true/false)
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup function.
    ///
    /// Unparseable values are ignored with a warning.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parsed<T: std::str::FromStr>(key: &str, value: Option<String>) -> Option<T> {
            let value = value?;
            match value.parse() {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!("Ignoring unparseable {}={}", key, value);
                    None
                }
            }
        }

        if let Some(rpm) = parsed("REMEDY_REQUESTS_PER_MINUTE", lookup("REMEDY_REQUESTS_PER_MINUTE")) {
            self.fetch.requests_per_minute = rpm;
            tracing::debug!("Override fetch.requests_per_minute from env: {}", rpm);
        }

        if let Some(retries) = parsed("REMEDY_MAX_RETRIES", lookup("REMEDY_MAX_RETRIES")) {
            self.fetch.max_retries = retries;
            tracing::debug!("Override fetch.max_retries from env: {}", retries);
        }

        if let Some(secs) = parsed("REMEDY_TIMEOUT_SECS", lookup("REMEDY_TIMEOUT_SECS")) {
            self.fetch.timeout_secs = secs;
            tracing::debug!("Override fetch.timeout_secs from env: {}", secs);
        }

        if let Some(workers) = parsed("REMEDY_CONCURRENT_WORKERS", lookup("REMEDY_CONCURRENT_WORKERS")) {
            self.scraping.concurrent_workers = workers;
            tracing::debug!("Override scraping.concurrent_workers from env: {}", workers);
        }

        if let Some(enabled) = parsed("REMEDY_RENDER_ENABLED", lookup("REMEDY_RENDER_ENABLED")) {
            self.render.enabled = enabled;
            tracing::debug!("Override render.enabled from env: {}", enabled);
        }
    }

    /// Check values that would make the pipeline misbehave.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.fetch.requests_per_minute == 0 {
            return Err(ConfigError::InvalidValue {
                field: "fetch.requests_per_minute".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        if self.fetch.max_retries == 0 {
            return Err(ConfigError::InvalidValue {
                field: "fetch.max_retries".to_string(),
                reason: "at least one attempt is required".to_string(),
            });
        }

        if self.fetch.max_delay_ms < self.fetch.base_delay_ms {
            return Err(ConfigError::InvalidValue {
                field: "fetch.max_delay_ms".to_string(),
                reason: format!(
                    "must be >= base_delay_ms ({}), got {}",
                    self.fetch.base_delay_ms, self.fetch.max_delay_ms
                ),
            });
        }

        if self.scraping.concurrent_workers == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scraping.concurrent_workers".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/remedy/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("com", "remedy", "remedy").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}

/// HTTP fetching, throttling and retry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Requests per minute allowed against a single domain
    pub requests_per_minute: u32,
    /// Maximum attempts per fetch request (including the first)
    pub max_retries: u32,
    /// Base backoff delay in milliseconds
    pub base_delay_ms: u64,
    /// Backoff ceiling in milliseconds
    pub max_delay_ms: u64,
    /// Upper bound of the random jitter added to each backoff, in milliseconds
    pub jitter_max_ms: u64,
    /// Per-attempt timeout in seconds
    pub timeout_secs: u64,
    /// Reuse cookie sessions per domain
    pub use_session: bool,
    /// Extra headers merged over the built-in browser header profile
    pub headers: BTreeMap<String, String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: 30,
            max_retries: 3,
            base_delay_ms: 2000,
            max_delay_ms: 30_000,
            jitter_max_ms: 1000,
            timeout_secs: 30,
            use_session: true,
            headers: BTreeMap::new(),
        }
    }
}

/// JavaScript render fallback settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Whether the render fallback may be used at all
    pub enabled: bool,
    /// Seconds to wait after navigation before capturing the DOM
    pub wait_secs: u64,
    /// Run the browser in headless mode
    pub headless: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            wait_secs: 5,
            headless: true,
        }
    }
}

/// Pipeline scheduling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapingConfig {
    /// Number of URLs processed concurrently (1 = sequential)
    pub concurrent_workers: usize,
    /// Ignore previously stored results and fetch again
    pub force_rescrape: bool,
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            concurrent_workers: 1,
            force_rescrape: false,
        }
    }
}

/// Upstream API endpoints used by vendor strategies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// GitHub REST API base URL
    pub github_api_base: String,
    /// MSRC CVRF API base URL
    pub msrc_api_base: String,
    /// User agent sent to upstream APIs
    pub api_user_agent: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            github_api_base: "https://api.github.com".to_string(),
            msrc_api_base: "https://api.msrc.microsoft.com/cvrf/v3.0".to_string(),
            api_user_agent: "Remedy/0.1.0 (+https://github.com/remedy-advisories/remedy)"
                .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.fetch.requests_per_minute, 30);
        assert_eq!(config.fetch.max_retries, 3);
        assert!(config.fetch.use_session);
        assert!(config.render.enabled);
        assert_eq!(config.scraping.concurrent_workers, 1);
        assert!(!config.scraping.force_rescrape);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("[fetch]"));
        assert!(toml_str.contains("[render]"));
        assert!(toml_str.contains("[scraping]"));

        let parsed: AppConfig = toml::from_str(&toml_str).expect("parse serialized config");
        assert_eq!(parsed.fetch.timeout_secs, config.fetch.timeout_secs);
    }

    #[test]
    fn test_load_from_file() {
        let tmp = TempDir::new().expect("create temp dir");
        let config_path = tmp.path().join("config.toml");

        fs::write(
            &config_path,
            r#"
[fetch]
requests_per_minute = 10
max_retries = 5

[fetch.headers]
X-Research = "remedy"

[scraping]
concurrent_workers = 4
"#,
        )
        .expect("write config file");

        let config = AppConfig::load_from(&config_path).expect("load config");
        assert_eq!(config.fetch.requests_per_minute, 10);
        assert_eq!(config.fetch.max_retries, 5);
        assert_eq!(
            config.fetch.headers.get("X-Research").map(String::as_str),
            Some("remedy")
        );
        assert_eq!(config.scraping.concurrent_workers, 4);
        // These should be defaults
        assert_eq!(config.fetch.base_delay_ms, 2000);
        assert!(config.render.headless);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let tmp = TempDir::new().expect("create temp dir");
        let config = AppConfig::load_from(&tmp.path().join("absent.toml")).expect("load");
        assert_eq!(config.fetch.requests_per_minute, 30);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let tmp = TempDir::new().expect("create temp dir");
        let config_path = tmp.path().join("config.toml");
        fs::write(&config_path, "[fetch]\nrequests_per_minute = 0\n").expect("write");

        let err = AppConfig::load_from(&config_path).expect_err("zero rpm rejected");
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("REMEDY_REQUESTS_PER_MINUTE", "60"),
            ("REMEDY_MAX_RETRIES", "not-a-number"),
            ("REMEDY_CONCURRENT_WORKERS", "3"),
            ("REMEDY_RENDER_ENABLED", "false"),
        ]);

        let mut config = AppConfig::default();
        config.apply_env_overrides(|key| vars.get(key).map(|v| (*v).to_string()));

        assert_eq!(config.fetch.requests_per_minute, 60);
        assert_eq!(config.fetch.max_retries, 3);
        assert_eq!(config.scraping.concurrent_workers, 3);
        assert!(!config.render.enabled);
    }
}
