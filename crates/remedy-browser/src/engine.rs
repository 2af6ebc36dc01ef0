use crate::error::{RenderError, Result};
use crate::renderer::{RenderedPage, Renderer};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::stream::StreamExt;
use remedy_core::RenderConfig;
use std::time::Duration;
use tokio::sync::OnceCell;

/// Chromium-backed renderer.
///
/// The browser process is launched on the first render and shared by every
/// later call.
pub struct ChromiumRenderer {
    browser: OnceCell<Browser>,
    headless: bool,
    navigation_timeout: Duration,
}

impl ChromiumRenderer {
    /// Create a renderer; no browser is started until it is needed.
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            browser: OnceCell::new(),
            headless: config.headless,
            navigation_timeout: Duration::from_secs(30),
        }
    }

    async fn browser(&self) -> Result<&Browser> {
        self.browser
            .get_or_try_init(|| async {
                let mut builder = BrowserConfig::builder().no_sandbox();
                if !self.headless {
                    builder = builder.with_head();
                }
                let config = builder.build().map_err(RenderError::ChromiumError)?;

                let (browser, mut handler) = Browser::launch(config)
                    .await
                    .map_err(|e| RenderError::ChromiumError(e.to_string()))?;

                // Spawn browser handler
                tokio::spawn(async move {
                    while let Some(event) = handler.next().await {
                        let _ = event;
                    }
                });

                tracing::info!(headless = self.headless, "launched chromium for render fallback");
                Ok(browser)
            })
            .await
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn render(&self, url: &str, wait: Duration) -> Result<RenderedPage> {
        let browser = self.browser().await?;

        let page = tokio::time::timeout(self.navigation_timeout, browser.new_page(url))
            .await
            .map_err(|_| {
                RenderError::Timeout(format!("{url} after {:?}", self.navigation_timeout))
            })?
            .map_err(|e| RenderError::NavigationError(e.to_string()))?;

        if let Err(e) = page.wait_for_navigation().await {
            tracing::debug!(url, error = %e, "wait_for_navigation failed, capturing anyway");
        }
        tokio::time::sleep(wait).await;

        let content = page
            .content()
            .await
            .map_err(|e| RenderError::ChromiumError(e.to_string()));

        if let Err(e) = page.close().await {
            tracing::debug!(url, error = %e, "failed to close page");
        }

        let content = content?;
        tracing::debug!(url, bytes = content.len(), "rendered page");

        Ok(RenderedPage {
            content,
            status_code: 200,
        })
    }
}
