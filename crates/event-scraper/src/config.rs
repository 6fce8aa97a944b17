//! Pipeline configuration and environment resolution.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; EventScraperMCP/1.0; +https://example.com/bot)";

pub const ENV_USER_AGENT: &str = "SCRAPER_USER_AGENT";
pub const ENV_REQUEST_TIMEOUT: &str = "SCRAPER_REQUEST_TIMEOUT";
pub const ENV_RENDER_TIMEOUT: &str = "SCRAPER_RENDER_TIMEOUT";
pub const ENV_RENDER_SETTLE_MS: &str = "SCRAPER_RENDER_SETTLE_MS";
pub const ENV_CHROMIUM_PATH: &str = "SCRAPER_CHROMIUM_PATH";

/// Settings for one [`EventScraper`](crate::EventScraper).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// User-Agent sent by the static fetcher and the renderer.
    pub user_agent: String,
    /// Bound on the whole static fetch (connect, headers, body).
    pub static_timeout: Duration,
    /// Bound on the whole render (context setup, navigation, settle, read).
    pub render_timeout: Duration,
    /// Extra wait after navigation for late scripts to populate the DOM.
    pub render_settle: Duration,
    /// Explicit Chromium binary; discovered on PATH when absent.
    pub chromium_path: Option<PathBuf>,
    /// Cap on images collected by the heuristic extractor.
    pub max_images: usize,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            static_timeout: Duration::from_secs(15),
            render_timeout: Duration::from_secs(30),
            render_settle: Duration::from_millis(2000),
            chromium_path: None,
            max_images: 5,
        }
    }
}

impl ScraperConfig {
    /// Defaults overlaid with `SCRAPER_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from an arbitrary key lookup.
    ///
    /// Unparsable values are ignored with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(ua) = lookup(ENV_USER_AGENT).filter(|v| !v.trim().is_empty()) {
            config.user_agent = ua;
        }
        if let Some(raw) = lookup(ENV_REQUEST_TIMEOUT) {
            match parse_seconds(&raw) {
                Some(d) => config.static_timeout = d,
                None => tracing::warn!("ignoring invalid {ENV_REQUEST_TIMEOUT}={raw:?}"),
            }
        }
        if let Some(raw) = lookup(ENV_RENDER_TIMEOUT) {
            match parse_seconds(&raw) {
                Some(d) => config.render_timeout = d,
                None => tracing::warn!("ignoring invalid {ENV_RENDER_TIMEOUT}={raw:?}"),
            }
        }
        if let Some(raw) = lookup(ENV_RENDER_SETTLE_MS) {
            match raw.trim().parse::<u64>() {
                Ok(ms) => config.render_settle = Duration::from_millis(ms),
                Err(_) => tracing::warn!("ignoring invalid {ENV_RENDER_SETTLE_MS}={raw:?}"),
            }
        }
        if let Some(path) = lookup(ENV_CHROMIUM_PATH).filter(|v| !v.trim().is_empty()) {
            config.chromium_path = Some(PathBuf::from(path));
        }

        config
    }

    pub fn with_static_timeout(mut self, timeout: Duration) -> Self {
        self.static_timeout = timeout;
        self
    }

    pub fn with_render_timeout(mut self, timeout: Duration) -> Self {
        self.render_timeout = timeout;
        self
    }

    pub fn with_render_settle(mut self, settle: Duration) -> Self {
        self.render_settle = settle;
        self
    }
}

/// Parse a positive, finite number of seconds ("15", "2.5").
fn parse_seconds(raw: &str) -> Option<Duration> {
    let secs: f64 = raw.trim().parse().ok()?;
    if secs <= 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(secs).ok()
}
