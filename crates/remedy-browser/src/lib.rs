//! Browser render fallback for JavaScript-heavy advisory pages.
//!
//! Provides the [`Renderer`] collaborator interface used by the scrape
//! orchestrator and a headless Chromium implementation of it.

pub mod engine;
pub mod error;
pub mod renderer;

pub use engine::ChromiumRenderer;
pub use error::{RenderError, Result};
pub use renderer::{DisabledRenderer, RenderedPage, Renderer};
