use crate::error::{RenderError, Result};
use async_trait::async_trait;
use std::time::Duration;

/// Static HTML captured after JavaScript has run.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub content: String,
    pub status_code: u16,
}

/// JavaScript rendering collaborator.
///
/// Only invoked when a render-sensitive vendor returns a page too small to
/// contain real content.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Navigate to `url`, let scripts run for `wait`, and return the DOM as HTML.
    async fn render(&self, url: &str, wait: Duration) -> Result<RenderedPage>;
}

/// Renderer used when the fallback is turned off in configuration.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledRenderer;

#[async_trait]
impl Renderer for DisabledRenderer {
    async fn render(&self, _url: &str, _wait: Duration) -> Result<RenderedPage> {
        Err(RenderError::Disabled)
    }
}
