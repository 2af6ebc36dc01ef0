use remedy_browser::{ChromiumRenderer, Renderer};
use remedy_core::RenderConfig;
use std::time::Duration;

#[tokio::test]
#[ignore] // Requires Chrome/Chromium installed
async fn test_render_static_page() {
    let renderer = ChromiumRenderer::new(&RenderConfig::default());

    let page = renderer
        .render("https://example.com", Duration::from_secs(1))
        .await
        .expect("render example.com");

    assert!(page.content.contains("Example Domain"));
}

#[tokio::test]
#[ignore] // Requires Chrome/Chromium installed
async fn test_renderer_reuses_browser() {
    let renderer = ChromiumRenderer::new(&RenderConfig::default());

    for _ in 0..2 {
        let page = renderer
            .render("https://example.com", Duration::from_millis(200))
            .await
            .expect("render");
        assert!(!page.content.is_empty());
    }
}
