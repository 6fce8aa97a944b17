//! Lazily launched, shareable rendering engine.
//!
//! The browser process is not started until the first render is requested.
//! Launches are serialized, so concurrent first calls share one engine. A
//! failed launch leaves the slot empty and the next render tries again. An
//! engine that reports itself disconnected (the browser exited or crashed)
//! is dropped and replaced on the next render.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;

use super::chromium::{ChromiumRenderer, LaunchOptions};
use super::{RenderContext, Renderer};
use crate::config::ScraperConfig;
use crate::error::ScrapeResult;

type Launcher = Box<dyn Fn() -> BoxFuture<'static, ScrapeResult<Arc<dyn Renderer>>> + Send + Sync>;

pub struct LazyRenderer {
    launcher: Launcher,
    engine: Mutex<Option<Arc<dyn Renderer>>>,
    launching: tokio::sync::Mutex<()>,
}

impl LazyRenderer {
    /// Lazily launched headless Chromium.
    pub fn new(options: LaunchOptions) -> Self {
        Self::with_launcher(move || {
            let options = options.clone();
            async move {
                let engine = ChromiumRenderer::launch(&options).await?;
                Ok(Arc::new(engine) as Arc<dyn Renderer>)
            }
        })
    }

    pub fn from_config(config: &ScraperConfig) -> Self {
        Self::new(LaunchOptions {
            chromium_path: config.chromium_path.clone(),
            user_agent: Some(config.user_agent.clone()),
        })
    }

    /// Lazily launched engine built by `launch`, which runs on first use and
    /// again whenever the current engine has disconnected.
    pub fn with_launcher<F, Fut>(launch: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ScrapeResult<Arc<dyn Renderer>>> + Send + 'static,
    {
        Self {
            launcher: Box::new(move || launch().boxed()),
            engine: Mutex::new(None),
            launching: tokio::sync::Mutex::new(()),
        }
    }

    /// The process-wide renderer. The first caller's config decides the
    /// launch options; later callers share the same engine.
    pub fn shared(config: &ScraperConfig) -> Arc<LazyRenderer> {
        static SHARED: OnceLock<Arc<LazyRenderer>> = OnceLock::new();
        Arc::clone(SHARED.get_or_init(|| Arc::new(LazyRenderer::from_config(config))))
    }

    /// Whether an engine is currently held.
    pub fn is_started(&self) -> bool {
        self.slot().is_some()
    }

    fn slot(&self) -> MutexGuard<'_, Option<Arc<dyn Renderer>>> {
        self.engine.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn live_engine(&self) -> Option<Arc<dyn Renderer>> {
        self.slot().as_ref().filter(|e| e.is_connected()).cloned()
    }

    async fn engine(&self) -> ScrapeResult<Arc<dyn Renderer>> {
        if let Some(engine) = self.live_engine() {
            return Ok(engine);
        }

        let _launching = self.launching.lock().await;
        // Another caller may have launched while we waited.
        if let Some(engine) = self.live_engine() {
            return Ok(engine);
        }

        let previous = self.slot().take();
        match previous {
            Some(dead) => {
                tracing::warn!("browser disconnected, relaunching headless Chromium");
                drop(dead);
            }
            None => tracing::info!("first escalation, launching headless Chromium"),
        }

        let engine = (self.launcher)().await?;
        *self.slot() = Some(Arc::clone(&engine));
        Ok(engine)
    }
}

#[async_trait]
impl Renderer for LazyRenderer {
    async fn new_context(&self) -> ScrapeResult<Box<dyn RenderContext>> {
        self.engine().await?.new_context().await
    }

    async fn shutdown(&self) -> ScrapeResult<()> {
        let engine = self.slot().take();
        match engine {
            Some(engine) => engine.shutdown().await,
            None => Ok(()),
        }
    }

    fn active_contexts(&self) -> usize {
        self.slot().as_ref().map_or(0, |e| e.active_contexts())
    }
}
