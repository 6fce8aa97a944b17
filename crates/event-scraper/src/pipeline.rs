//! The fetch orchestrator.
//!
//! ```text
//! Init -> StaticFetched -> Extracted -> Accepted
//!                                    \-> Escalated -> Rendered -> ReExtracted -> Accepted
//! any fetch failure -> Failed
//! ```
//!
//! At most two fetches happen per request: one static, at most one rendered.
//! Extraction is synchronous and never crosses an `.await`, because
//! `scraper::Html` is `!Send`.

use std::sync::Arc;
use std::time::Instant;

use crate::adapters::{AdapterRegistry, SiteAdapter};
use crate::config::ScraperConfig;
use crate::error::ScrapeError;
use crate::extract;
use crate::fetch::StaticFetcher;
use crate::quality::{self, QualityVerdict};
use crate::renderer::{self, LazyRenderer, Renderer};
use crate::types::{Event, ExtractionMethod, ExtractionResult};

/// An extracted event and the adapter that produced it, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub event: Event,
    pub adapter: Option<SiteAdapter>,
}

impl Candidate {
    /// The tag this candidate carries when accepted on the static pass.
    pub fn static_method(&self) -> ExtractionMethod {
        match self.adapter {
            Some(adapter) => ExtractionMethod::Adapter(adapter),
            None => ExtractionMethod::GenericStatic,
        }
    }
}

/// Hybrid event scraper. Cheap to share behind an `Arc`; all per-request state
/// lives on the stack of [`EventScraper::extract`].
pub struct EventScraper {
    config: ScraperConfig,
    fetcher: StaticFetcher,
    adapters: AdapterRegistry,
    renderer: Arc<dyn Renderer>,
}

impl EventScraper {
    /// Default adapter set and the process-wide lazily launched Chromium.
    pub fn new(config: ScraperConfig) -> Self {
        let renderer: Arc<dyn Renderer> = LazyRenderer::shared(&config);
        Self::with_parts(config, AdapterRegistry::default(), renderer)
    }

    pub fn with_parts(
        config: ScraperConfig,
        adapters: AdapterRegistry,
        renderer: Arc<dyn Renderer>,
    ) -> Self {
        let fetcher = StaticFetcher::new(&config);
        Self {
            config,
            fetcher,
            adapters,
            renderer,
        }
    }

    pub fn with_adapters(mut self, adapters: AdapterRegistry) -> Self {
        self.adapters = adapters;
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    pub fn adapters(&self) -> &AdapterRegistry {
        &self.adapters
    }

    pub fn renderer(&self) -> &Arc<dyn Renderer> {
        &self.renderer
    }

    /// Which adapter would handle `url`. No network access.
    pub fn detect(&self, url: &str) -> Option<SiteAdapter> {
        self.adapters.detect(url)
    }

    /// Run the extraction ladder over already-fetched markup: the matching
    /// adapter first, then generic structured data backfilled from heuristics.
    pub fn extract_candidate(&self, html: &str, url: &str) -> Option<Candidate> {
        if let Some(adapter) = self.adapters.detect(url) {
            if let Some(event) = adapter.extract_event(html, url) {
                return Some(Candidate {
                    event,
                    adapter: Some(adapter),
                });
            }
            tracing::debug!(url, adapter = adapter.id(), "adapter found no title, using generic extraction");
        }

        extract::extract_generic(html, url, self.config.max_images).map(|event| Candidate {
            event,
            adapter: None,
        })
    }

    /// Extract an event from `url`. Never fails: fetch errors become a result
    /// tagged `failed` that carries only the source URL.
    pub async fn extract(&self, url: &str) -> ExtractionResult {
        let started = Instant::now();

        let page = match self.fetcher.fetch(url).await {
            Ok(page) => page,
            Err(e) => {
                log_fetch_failure(url, &e);
                return ExtractionResult::failed(url, e);
            }
        };
        tracing::debug!(
            url,
            final_url = %page.final_url,
            status = page.status,
            bytes = page.body.len(),
            "static fetch complete"
        );

        let candidate = self.extract_candidate(&page.body, url);
        drop(page);

        if quality::assess_candidate(candidate.as_ref().map(|c| &c.event)) == QualityVerdict::Accept {
            if let Some(candidate) = candidate {
                let method = candidate.static_method();
                tracing::debug!(
                    url,
                    method = %method,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "accepted static extraction"
                );
                return ExtractionResult::new(candidate.event, method);
            }
        }

        tracing::debug!(
            url,
            signals = candidate.as_ref().map_or(0, |c| quality::signal_count(&c.event)),
            "static extraction below quality bar, escalating to rendered fetch"
        );
        self.extract_rendered(url, started).await
    }

    async fn extract_rendered(&self, url: &str, started: Instant) -> ExtractionResult {
        let html = match renderer::render_html(
            self.renderer.as_ref(),
            url,
            self.config.render_timeout,
            self.config.render_settle,
        )
        .await
        {
            Ok(html) => html,
            Err(e) => {
                log_fetch_failure(url, &e);
                return ExtractionResult::failed(url, e);
            }
        };

        let result = match self.extract_candidate(&html, url) {
            Some(candidate) if candidate.event.has_substance() => {
                ExtractionResult::new(candidate.event, ExtractionMethod::GenericRendered)
            }
            _ => ExtractionResult::new(Event::new(url), ExtractionMethod::RenderedEmpty),
        };
        tracing::debug!(
            url,
            method = %result.method,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "rendered extraction complete"
        );
        result
    }
}

fn log_fetch_failure(url: &str, error: &ScrapeError) {
    tracing::warn!(
        url,
        stage = %error.stage(),
        timed_out = error.is_timeout(),
        "{} fetch failed: {error}",
        error.stage()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScrapeResult;
    use crate::renderer::{NavigationResult, NoopRenderer, RenderContext};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Serves fixed markup and counts how many contexts were opened.
    struct CountingRenderer {
        html: String,
        renders: AtomicUsize,
    }

    struct StaticContext {
        html: String,
    }

    #[async_trait]
    impl Renderer for CountingRenderer {
        async fn new_context(&self) -> ScrapeResult<Box<dyn RenderContext>> {
            self.renders.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(StaticContext {
                html: self.html.clone(),
            }))
        }
        async fn shutdown(&self) -> ScrapeResult<()> {
            Ok(())
        }
        fn active_contexts(&self) -> usize {
            0
        }
    }

    #[async_trait]
    impl RenderContext for StaticContext {
        async fn navigate(&mut self, url: &str, _timeout: Duration) -> ScrapeResult<NavigationResult> {
            Ok(NavigationResult {
                final_url: url.to_string(),
                load_time_ms: 0,
            })
        }
        async fn get_html(&self) -> ScrapeResult<String> {
            Ok(self.html.clone())
        }
        async fn close(self: Box<Self>) -> ScrapeResult<()> {
            Ok(())
        }
    }

    fn counting(html: &str) -> Arc<CountingRenderer> {
        Arc::new(CountingRenderer {
            html: html.to_string(),
            renders: AtomicUsize::new(0),
        })
    }

    fn test_config() -> ScraperConfig {
        ScraperConfig::default()
            .with_static_timeout(Duration::from_secs(5))
            .with_render_timeout(Duration::from_secs(5))
            .with_render_settle(Duration::ZERO)
    }

    fn scraper(renderer: Arc<dyn Renderer>) -> EventScraper {
        EventScraper::with_parts(test_config(), AdapterRegistry::default(), renderer)
    }

    async fn serve(body: &str) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body.to_string()))
            .mount(&server)
            .await;
        server
    }

    const COMPLETE_PAGE: &str = r#"<html><head>
        <script type="application/ld+json">
        {"@context": "https://schema.org", "@type": "Event", "name": "Jazz Night",
         "startDate": "2026-05-01T20:00", "location": {"@type": "Place", "name": "Blue Room"}}
        </script></head><body></body></html>"#;

    const THIN_PAGE: &str = r#"<html><head><title>Loading…</title></head>
        <body><div id="root"></div></body></html>"#;

    const BARE_PAGE: &str = "<html><body><div id=\"root\"></div></body></html>";

    #[tokio::test]
    async fn test_complete_static_page_is_accepted_without_rendering() {
        let server = serve(COMPLETE_PAGE).await;
        let renderer = counting("<html></html>");
        let scraper = scraper(renderer.clone());

        let result = scraper.extract(&server.uri()).await;
        assert_eq!(result.method, ExtractionMethod::GenericStatic);
        assert_eq!(result.event.title.as_deref(), Some("Jazz Night"));
        assert_eq!(result.event.location.as_deref(), Some("Blue Room"));
        assert_eq!(result.event.source_url, server.uri());
        assert_eq!(renderer.renders.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_thin_page_escalates_once() {
        let server = serve(THIN_PAGE).await;
        let renderer = counting(COMPLETE_PAGE);
        let scraper = scraper(renderer.clone());

        let result = scraper.extract(&server.uri()).await;
        assert_eq!(result.method, ExtractionMethod::GenericRendered);
        assert_eq!(result.event.title.as_deref(), Some("Jazz Night"));
        assert_eq!(renderer.renders.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unrecognizable_page_escalates() {
        let server = serve(BARE_PAGE).await;
        let renderer = counting(BARE_PAGE);
        let scraper = scraper(renderer.clone());

        let result = scraper.extract(&server.uri()).await;
        assert_eq!(result.method, ExtractionMethod::RenderedEmpty);
        assert_eq!(result.event, Event::new(server.uri()));
        assert_eq!(renderer.renders.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rendered_result_below_bar_is_still_returned() {
        let server = serve(BARE_PAGE).await;
        let renderer = counting(THIN_PAGE);
        let scraper = scraper(renderer.clone());

        let result = scraper.extract(&server.uri()).await;
        assert_eq!(result.method, ExtractionMethod::GenericRendered);
        assert_eq!(result.event.title.as_deref(), Some("Loading…"));
        assert_eq!(renderer.renders.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_render_failure_is_failed() {
        let server = serve(BARE_PAGE).await;
        let scraper = scraper(Arc::new(NoopRenderer));

        let result = scraper.extract(&server.uri()).await;
        assert!(result.is_failed());
        assert_eq!(result.event, Event::new(server.uri()));
        assert!(result.error.is_some());
    }

    #[tokio::test]
    async fn test_static_failure_skips_rendering() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;
        let renderer = counting(COMPLETE_PAGE);
        let scraper = scraper(renderer.clone());

        let result = scraper.extract(&server.uri()).await;
        assert!(result.is_failed());
        assert_eq!(result.event, Event::new(server.uri()));
        assert_eq!(renderer.renders.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_static_timeout_is_failed_within_bound() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(COMPLETE_PAGE)
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;
        let config = test_config().with_static_timeout(Duration::from_millis(200));
        let renderer = counting(COMPLETE_PAGE);
        let scraper = EventScraper::with_parts(config, AdapterRegistry::default(), renderer.clone());

        let started = Instant::now();
        let result = scraper.extract(&server.uri()).await;
        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(result.is_failed());
        assert_eq!(result.event, Event::new(server.uri()));
        assert_eq!(renderer.renders.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_extract_is_idempotent() {
        let server = serve(COMPLETE_PAGE).await;
        let scraper = scraper(Arc::new(NoopRenderer));

        let first = scraper.extract(&server.uri()).await;
        let second = scraper.extract(&server.uri()).await;
        assert_eq!(first, second);
    }

    #[test]
    fn test_candidate_uses_matching_adapter() {
        let scraper = scraper(Arc::new(NoopRenderer));
        let html = r#"<html><head>
            <meta property="og:title" content="Rooftop Party" />
            <meta property="event:start_time" content="2026-07-04T21:00" />
            </head></html>"#;
        let url = "https://www.facebook.com/events/42";

        let candidate = scraper.extract_candidate(html, url).unwrap();
        assert_eq!(candidate.adapter, Some(SiteAdapter::Facebook));
        assert_eq!(
            candidate.static_method(),
            ExtractionMethod::Adapter(SiteAdapter::Facebook)
        );
        assert_eq!(candidate.event.start.as_deref(), Some("2026-07-04T21:00"));

        let generic = scraper
            .with_adapters(AdapterRegistry::empty())
            .extract_candidate(html, url)
            .unwrap();
        assert_eq!(generic.adapter, None);
        assert_eq!(generic.static_method(), ExtractionMethod::GenericStatic);
    }

    #[test]
    fn test_title_only_jsonld_on_platform_page_passes_gate() {
        let scraper = scraper(Arc::new(NoopRenderer));
        let html = r#"<html><head>
            <script type="application/ld+json">{"@type": "MusicEvent", "name": "Arctic Monkeys"}</script>
            </head><body>
            <time datetime="2026-10-10T20:00:00">Sat Oct 10</time>
            <div class="venue-name">Madison Square Garden</div>
            </body></html>"#;

        for url in [
            "https://www.ticketmaster.com/event/1",
            "https://example.com/event/1",
        ] {
            let candidate = scraper.extract_candidate(html, url).unwrap();
            assert_eq!(candidate.event.start.as_deref(), Some("2026-10-10T20:00:00"), "{url}");
            assert_eq!(
                candidate.event.location.as_deref(),
                Some("Madison Square Garden"),
                "{url}"
            );
            assert_eq!(quality::assess(&candidate.event), QualityVerdict::Accept, "{url}");
        }
        assert_eq!(
            scraper
                .extract_candidate(html, "https://www.ticketmaster.com/event/1")
                .unwrap()
                .adapter,
            Some(SiteAdapter::Ticketmaster)
        );
    }

    #[test]
    fn test_adapter_without_title_falls_through_to_generic() {
        let scraper = scraper(Arc::new(NoopRenderer));
        // Meetup needs an eventTitle heading; the page only has a <title>.
        let html = r#"<html><head><title>Board Games</title></head>
            <body><time datetime="2026-03-03T18:00">Mar 3</time></body></html>"#;

        let candidate = scraper
            .extract_candidate(html, "https://www.meetup.com/g/events/1")
            .unwrap();
        assert_eq!(candidate.adapter, None);
        assert_eq!(candidate.event.title.as_deref(), Some("Board Games"));
        assert_eq!(candidate.event.start.as_deref(), Some("2026-03-03T18:00"));
    }

    #[test]
    fn test_failed_result_carries_error() {
        let result = ExtractionResult::failed(
            "https://example.com",
            ScrapeError::BrowserUnavailable("no browser".to_string()),
        );
        assert!(result.error.unwrap().contains("no browser"));
    }
}
