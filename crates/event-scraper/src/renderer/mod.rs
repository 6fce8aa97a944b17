//! Renderer abstraction for JavaScript-dependent pages.
//!
//! Defines the `Renderer` and `RenderContext` traits that abstract over the
//! browser engine (currently Chromium via chromiumoxide). Every render gets
//! its own context; contexts are never shared between requests.

pub mod chromium;
pub mod lazy;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{FetchStage, ScrapeError, ScrapeResult};

pub use chromium::{find_chromium, ChromiumRenderer};
pub use lazy::LazyRenderer;

/// Result of navigating to a URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationResult {
    /// The final URL after any redirects.
    pub final_url: String,
    /// Time taken to load the page in milliseconds.
    pub load_time_ms: u64,
}

/// A browser engine that can create isolated rendering contexts.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Create a new isolated context (own cookies, storage and page).
    async fn new_context(&self) -> ScrapeResult<Box<dyn RenderContext>>;
    /// Shut down the browser engine.
    async fn shutdown(&self) -> ScrapeResult<()>;
    /// Number of currently open contexts.
    fn active_contexts(&self) -> usize;
    /// Whether the engine can still serve contexts. A disconnected engine
    /// must be replaced; it never recovers on its own.
    fn is_connected(&self) -> bool {
        true
    }
}

/// A single isolated browser context holding one page.
///
/// Dropping a context without calling [`close`](RenderContext::close) must
/// still release its browser resources.
#[async_trait]
pub trait RenderContext: Send + Sync {
    /// Navigate to a URL with a timeout.
    async fn navigate(&mut self, url: &str, timeout: Duration) -> ScrapeResult<NavigationResult>;
    /// Get the full page HTML.
    async fn get_html(&self) -> ScrapeResult<String>;
    /// Close the page and dispose of the context.
    async fn close(self: Box<Self>) -> ScrapeResult<()>;
}

/// A renderer that always fails, used when no browser should be started.
pub struct NoopRenderer;

#[async_trait]
impl Renderer for NoopRenderer {
    async fn new_context(&self) -> ScrapeResult<Box<dyn RenderContext>> {
        Err(ScrapeError::BrowserUnavailable(
            "rendering disabled (static-only mode)".to_string(),
        ))
    }
    async fn shutdown(&self) -> ScrapeResult<()> {
        Ok(())
    }
    fn active_contexts(&self) -> usize {
        0
    }
}

/// Render `url` in a fresh context and return the resulting markup.
///
/// The whole operation (context creation, navigation, settle wait, HTML
/// read) is bounded by `timeout`. The context is closed on every path; if
/// this future is dropped mid-render the context's own drop handles it.
pub async fn render_html(
    renderer: &dyn Renderer,
    url: &str,
    timeout: Duration,
    settle: Duration,
) -> ScrapeResult<String> {
    let work = async {
        let mut ctx = renderer.new_context().await?;
        let result = async {
            let nav = ctx.navigate(url, timeout).await?;
            tracing::debug!(url, final_url = %nav.final_url, load_time_ms = nav.load_time_ms, "page loaded");
            if !settle.is_zero() {
                tokio::time::sleep(settle).await;
            }
            ctx.get_html().await
        }
        .await;
        if let Err(e) = ctx.close().await {
            tracing::warn!("failed to close render context: {e}");
        }
        result
    };

    match tokio::time::timeout(timeout, work).await {
        Ok(result) => result,
        Err(_) => Err(ScrapeError::Timeout {
            stage: FetchStage::Rendered,
            timeout_ms: timeout.as_millis() as u64,
        }),
    }
}
