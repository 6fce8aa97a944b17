//! Chromium-based renderer using chromiumoxide.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::{BrowserContextId, CloseParams};
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use chromiumoxide::page::Page;
use futures::StreamExt;

use super::{NavigationResult, RenderContext, Renderer};
use crate::error::{ScrapeError, ScrapeResult};

/// Find the Chromium binary path.
pub fn find_chromium(explicit: Option<&Path>) -> Option<PathBuf> {
    // 1. Configured path
    if let Some(path) = explicit {
        if path.exists() {
            return Some(path.to_path_buf());
        }
        tracing::warn!("configured Chromium path {} does not exist", path.display());
    }

    // 2. ~/.event-scraper/chromium/
    if let Some(home) = dirs::home_dir() {
        let candidates = if cfg!(target_os = "macos") {
            vec![
                home.join(".event-scraper/chromium/chrome-mac-arm64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".event-scraper/chromium/chrome-mac-x64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
            ]
        } else {
            vec![
                home.join(".event-scraper/chromium/chrome-linux64/chrome"),
                home.join(".event-scraper/chromium/chrome"),
            ]
        };
        if let Some(found) = candidates.into_iter().find(|c| c.exists()) {
            return Some(found);
        }
    }

    // 3. System PATH
    for name in [
        "google-chrome",
        "google-chrome-stable",
        "chromium",
        "chromium-browser",
    ] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    // 4. Common macOS location
    if cfg!(target_os = "macos") {
        let common = PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// Options used when launching the browser process.
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    pub chromium_path: Option<PathBuf>,
    pub user_agent: Option<String>,
}

/// Chromium-based renderer. One browser process, one browser context per render.
pub struct ChromiumRenderer {
    browser: Arc<Browser>,
    active_count: Arc<AtomicUsize>,
    /// Cleared when the CDP handler stream ends (browser exited or crashed).
    connected: Arc<AtomicBool>,
}

impl ChromiumRenderer {
    /// Launch a headless Chromium instance.
    pub async fn launch(options: &LaunchOptions) -> ScrapeResult<Self> {
        let chrome_path = find_chromium(options.chromium_path.as_deref()).ok_or_else(|| {
            ScrapeError::BrowserUnavailable(
                "Chromium not found; set SCRAPER_CHROMIUM_PATH or install google-chrome"
                    .to_string(),
            )
        })?;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-background-networking");
        if let Some(ua) = &options.user_agent {
            builder = builder.arg(format!("--user-agent={ua}"));
        }
        let config = builder
            .build()
            .map_err(|e| ScrapeError::BrowserLaunch(format!("invalid browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| ScrapeError::BrowserLaunch(e.to_string()))?;

        let connected = Arc::new(AtomicBool::new(true));
        let handler_connected = Arc::clone(&connected);
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("browser handler event error: {e}");
                }
            }
            handler_connected.store(false, Ordering::Release);
            tracing::info!("browser connection closed");
        });

        tracing::info!("headless Chromium launched");

        Ok(Self {
            browser: Arc::new(browser),
            active_count: Arc::new(AtomicUsize::new(0)),
            connected,
        })
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn new_context(&self) -> ScrapeResult<Box<dyn RenderContext>> {
        let created = self
            .browser
            .execute(CreateBrowserContextParams::default())
            .await
            .map_err(|e| ScrapeError::Render(format!("failed to create browser context: {e}")))?;
        let context_id = created.result.browser_context_id.clone();

        let params = CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(context_id.clone())
            .build()
            .map_err(ScrapeError::Render)?;

        let page = match self.browser.new_page(params).await {
            Ok(page) => page,
            Err(e) => {
                let _ = self
                    .browser
                    .execute(DisposeBrowserContextParams::new(context_id))
                    .await;
                return Err(ScrapeError::Render(format!("failed to create page: {e}")));
            }
        };

        self.active_count.fetch_add(1, Ordering::Relaxed);

        Ok(Box::new(ChromiumContext {
            page: Some(page),
            context_id: Some(context_id),
            browser: Arc::clone(&self.browser),
            active_count: Arc::clone(&self.active_count),
        }))
    }

    async fn shutdown(&self) -> ScrapeResult<()> {
        self.browser
            .execute(CloseParams::default())
            .await
            .map_err(|e| ScrapeError::Render(format!("failed to close browser: {e}")))?;
        Ok(())
    }

    fn active_contexts(&self) -> usize {
        self.active_count.load(Ordering::Relaxed)
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}

/// A page inside its own browser context.
pub struct ChromiumContext {
    page: Option<Page>,
    context_id: Option<BrowserContextId>,
    browser: Arc<Browser>,
    active_count: Arc<AtomicUsize>,
}

impl ChromiumContext {
    fn page(&self) -> ScrapeResult<&Page> {
        self.page
            .as_ref()
            .ok_or_else(|| ScrapeError::Render("render context already closed".to_string()))
    }

    /// Take ownership of the page and context id, leaving nothing for `Drop`.
    fn detach(&mut self) -> (Option<Page>, Option<BrowserContextId>) {
        let taken = (self.page.take(), self.context_id.take());
        if taken.0.is_some() || taken.1.is_some() {
            self.active_count.fetch_sub(1, Ordering::Relaxed);
        }
        taken
    }
}

async fn teardown(browser: Arc<Browser>, page: Option<Page>, context_id: Option<BrowserContextId>) {
    if let Some(page) = page {
        let _ = page.close().await;
    }
    if let Some(id) = context_id {
        if let Err(e) = browser.execute(DisposeBrowserContextParams::new(id)).await {
            tracing::debug!("failed to dispose browser context: {e}");
        }
    }
}

#[async_trait]
impl RenderContext for ChromiumContext {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> ScrapeResult<NavigationResult> {
        let start = Instant::now();
        let page = self.page()?;

        let result = tokio::time::timeout(timeout, async {
            page.goto(url).await?;
            page.wait_for_navigation().await?;
            Ok::<_, chromiumoxide::error::CdpError>(())
        })
        .await;

        let load_time_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(Ok(())) => {
                let final_url = page
                    .url()
                    .await
                    .unwrap_or_default()
                    .unwrap_or_else(|| url.to_string());
                Ok(NavigationResult {
                    final_url,
                    load_time_ms,
                })
            }
            Ok(Err(e)) => Err(ScrapeError::Navigation(e.to_string())),
            Err(_) => Err(ScrapeError::Navigation(format!(
                "navigation timed out after {}ms",
                timeout.as_millis()
            ))),
        }
    }

    async fn get_html(&self) -> ScrapeResult<String> {
        let result = self
            .page()?
            .evaluate("document.documentElement.outerHTML")
            .await
            .map_err(|e| ScrapeError::Render(format!("failed to get HTML: {e}")))?;

        result
            .into_value::<String>()
            .map_err(|e| ScrapeError::Render(format!("failed to convert HTML result: {e:?}")))
    }

    async fn close(self: Box<Self>) -> ScrapeResult<()> {
        let mut this = self;
        let (page, context_id) = this.detach();
        teardown(Arc::clone(&this.browser), page, context_id).await;
        Ok(())
    }
}

impl Drop for ChromiumContext {
    fn drop(&mut self) {
        let (page, context_id) = self.detach();
        if page.is_none() && context_id.is_none() {
            return;
        }
        // Dropped mid-render (timeout or caller cancellation).
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(teardown(Arc::clone(&self.browser), page, context_id));
            }
            Err(_) => tracing::warn!("render context dropped outside a runtime; page leaked"),
        }
    }
}
