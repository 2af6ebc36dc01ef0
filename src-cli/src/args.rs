//! Command line arguments.

use anyhow::{bail, Context};
use clap::Parser;
use remedy_core::AppConfig;
use std::fs;
use std::path::PathBuf;

/// Scrape remediation details from vulnerability advisory pages.
#[derive(Debug, Parser)]
#[command(name = "remedy", version, about)]
pub struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Scrape again even when a completed result is stored.
    ///
    /// Results are kept in memory for one run, so this only affects URLs
    /// repeated in the same invocation.
    #[arg(long)]
    pub force: bool,

    /// Number of URLs processed concurrently
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// Never fall back to a headless browser
    #[arg(long)]
    pub no_render: bool,

    /// File with one URL per line; `#` starts a comment
    #[arg(long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Advisory URLs
    pub urls: Vec<String>,
}

impl Cli {
    /// Load configuration and apply the flags on top of it.
    pub fn load_config(&self) -> anyhow::Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let mut config = AppConfig::load_from(path)
                    .with_context(|| format!("failed to load config from {}", path.display()))?;
                config.apply_env_overrides(|key| std::env::var(key).ok());
                config.validate()?;
                config
            }
            None => AppConfig::load_with_env().context("failed to load config")?,
        };

        if self.force {
            config.scraping.force_rescrape = true;
        }
        if let Some(workers) = self.workers {
            config.scraping.concurrent_workers = workers.max(1);
        }
        if self.no_render {
            config.render.enabled = false;
        }
        Ok(config)
    }

    /// URLs from the command line followed by those in `--input`.
    pub fn collect_urls(&self) -> anyhow::Result<Vec<String>> {
        let mut urls = self.urls.clone();

        if let Some(path) = &self.input {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            urls.extend(parse_url_list(&contents));
        }

        if urls.is_empty() {
            bail!("no URLs given; pass them as arguments or with --input");
        }
        Ok(urls)
    }
}

/// One URL per line; blank lines and `#` comments are skipped.
pub fn parse_url_list(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(|line| line.split('#').next().unwrap_or_default().trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
