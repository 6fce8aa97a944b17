//! End-to-end pipeline tests against a local HTTP server.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use event_scraper::renderer::{NavigationResult, RenderContext, Renderer};
use event_scraper::{
    AdapterRegistry, EventScraper, ExtractionMethod, ScrapeResult, ScraperConfig, SiteAdapter,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct PageRenderer {
    html: String,
    opened: AtomicUsize,
    open: Arc<AtomicUsize>,
}

struct PageContext {
    html: String,
    open: Arc<AtomicUsize>,
}

impl Drop for PageContext {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Renderer for PageRenderer {
    async fn new_context(&self) -> ScrapeResult<Box<dyn RenderContext>> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        self.open.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(PageContext {
            html: self.html.clone(),
            open: Arc::clone(&self.open),
        }))
    }

    async fn shutdown(&self) -> ScrapeResult<()> {
        Ok(())
    }

    fn active_contexts(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RenderContext for PageContext {
    async fn navigate(&mut self, url: &str, _timeout: Duration) -> ScrapeResult<NavigationResult> {
        Ok(NavigationResult {
            final_url: url.to_string(),
            load_time_ms: 1,
        })
    }

    async fn get_html(&self) -> ScrapeResult<String> {
        Ok(self.html.clone())
    }

    async fn close(self: Box<Self>) -> ScrapeResult<()> {
        Ok(())
    }
}

fn renderer(html: &str) -> Arc<PageRenderer> {
    Arc::new(PageRenderer {
        html: html.to_string(),
        opened: AtomicUsize::new(0),
        open: Arc::new(AtomicUsize::new(0)),
    })
}

fn config() -> ScraperConfig {
    ScraperConfig::default()
        .with_static_timeout(Duration::from_secs(5))
        .with_render_timeout(Duration::from_secs(5))
        .with_render_settle(Duration::ZERO)
}

const SPA_SHELL: &str = r#"<!doctype html><html><head></head>
<body><div id="app"></div><script src="/bundle.js"></script></body></html>"#;

const RENDERED_CONCERT: &str = r#"<!doctype html><html><head>
<script type="application/ld+json">
{
  "@context": "https://schema.org",
  "@graph": [
    {"@type": "WebPage", "name": "Tickets"},
    {
      "@type": ["MusicEvent"],
      "name": "Symphony No. 9",
      "startDate": "2026-11-20T19:30:00-05:00",
      "endDate": "2026-11-20T22:00:00-05:00",
      "location": {
        "@type": "Place",
        "name": "Orchestra Hall",
        "address": {"@type": "PostalAddress", "streetAddress": "220 S Michigan Ave", "addressLocality": "Chicago"}
      },
      "offers": [{"@type": "Offer", "price": 45, "priceCurrency": "USD"}],
      "organizer": {"@type": "Organization", "name": "City Symphony"},
      "image": ["https://cdn.example.com/symphony.jpg"]
    }
  ]
}
</script></head><body><h1>Symphony No. 9</h1></body></html>"#;

#[tokio::test]
async fn test_single_page_app_is_rendered_and_extracted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/concerts/9"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SPA_SHELL))
        .expect(1)
        .mount(&server)
        .await;

    let renderer = renderer(RENDERED_CONCERT);
    let scraper = EventScraper::with_parts(config(), AdapterRegistry::default(), renderer.clone());
    let url = format!("{}/concerts/9", server.uri());

    let result = scraper.extract(&url).await;
    assert_eq!(result.method, ExtractionMethod::GenericRendered);
    assert_eq!(result.event.source_url, url);
    assert_eq!(result.event.title.as_deref(), Some("Symphony No. 9"));
    assert_eq!(
        result.event.location.as_deref(),
        Some("Orchestra Hall, 220 S Michigan Ave, Chicago")
    );
    assert_eq!(result.event.price.as_deref(), Some("45"));
    assert_eq!(result.event.currency.as_deref(), Some("USD"));
    assert_eq!(result.event.organizer.as_deref(), Some("City Symphony"));
    assert_eq!(result.event.images, vec!["https://cdn.example.com/symphony.jpg"]);
    assert!(result.event.raw_location.is_some());

    assert_eq!(renderer.opened.load(Ordering::SeqCst), 1);
    assert_eq!(renderer.active_contexts(), 0);
}

#[tokio::test]
async fn test_result_serializes_with_method_tag() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><head>
            <meta property="og:title" content="Street Fair" />
            <meta name="description" content="Food trucks and music" />
            </head><body>
            <time datetime="2026-08-01T10:00">Aug 1</time>
            <span class="event-venue">Main Street</span>
            </body></html>"#,
        ))
        .mount(&server)
        .await;

    let scraper = EventScraper::with_parts(config(), AdapterRegistry::default(), renderer(""));
    let result = scraper.extract(&server.uri()).await;

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["scrape_method"], "generic-static");
    assert_eq!(json["event"]["title"], "Street Fair");
    assert_eq!(json["event"]["description"], "Food trucks and music");
    assert_eq!(json["event"]["start"], "2026-08-01T10:00");
    assert_eq!(json["event"]["location"], "Main Street");
    assert!(json.get("error").is_none());
}

#[tokio::test]
async fn test_concurrent_requests_are_independent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/static"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><head><script type="application/ld+json">
            {"@type": "Event", "name": "Static Show", "startDate": "2026-01-01"}
            </script></head></html>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/dynamic"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SPA_SHELL))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(410))
        .mount(&server)
        .await;

    let renderer = renderer(RENDERED_CONCERT);
    let scraper = Arc::new(EventScraper::with_parts(
        config(),
        AdapterRegistry::default(),
        renderer.clone(),
    ));

    let base = server.uri();
    let (static_url, dynamic_url, gone_url) = (
        format!("{base}/static"),
        format!("{base}/dynamic"),
        format!("{base}/gone"),
    );
    let (a, b, c) = tokio::join!(
        scraper.extract(&static_url),
        scraper.extract(&dynamic_url),
        scraper.extract(&gone_url),
    );

    assert_eq!(a.method, ExtractionMethod::GenericStatic);
    assert_eq!(a.event.title.as_deref(), Some("Static Show"));
    assert_eq!(b.method, ExtractionMethod::GenericRendered);
    assert_eq!(b.event.title.as_deref(), Some("Symphony No. 9"));
    assert_eq!(c.method, ExtractionMethod::Failed);
    assert!(c.error.as_deref().unwrap_or_default().contains("410"));

    assert_eq!(renderer.opened.load(Ordering::SeqCst), 1);
    assert_eq!(renderer.active_contexts(), 0);
}

#[tokio::test]
async fn test_cancelled_request_releases_render_context() {
    struct HangingRenderer {
        open: Arc<AtomicUsize>,
    }
    struct HangingContext {
        open: Arc<AtomicUsize>,
    }
    impl Drop for HangingContext {
        fn drop(&mut self) {
            self.open.fetch_sub(1, Ordering::SeqCst);
        }
    }
    #[async_trait]
    impl Renderer for HangingRenderer {
        async fn new_context(&self) -> ScrapeResult<Box<dyn RenderContext>> {
            self.open.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(HangingContext {
                open: Arc::clone(&self.open),
            }))
        }
        async fn shutdown(&self) -> ScrapeResult<()> {
            Ok(())
        }
        fn active_contexts(&self) -> usize {
            self.open.load(Ordering::SeqCst)
        }
    }
    #[async_trait]
    impl RenderContext for HangingContext {
        async fn navigate(&mut self, _url: &str, _timeout: Duration) -> ScrapeResult<NavigationResult> {
            futures::future::pending::<()>().await;
            unreachable!()
        }
        async fn get_html(&self) -> ScrapeResult<String> {
            Ok(String::new())
        }
        async fn close(self: Box<Self>) -> ScrapeResult<()> {
            Ok(())
        }
    }

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SPA_SHELL))
        .mount(&server)
        .await;

    let open = Arc::new(AtomicUsize::new(0));
    let renderer = Arc::new(HangingRenderer {
        open: Arc::clone(&open),
    });
    let scraper = Arc::new(EventScraper::with_parts(
        config().with_render_timeout(Duration::from_secs(60)),
        AdapterRegistry::default(),
        renderer,
    ));

    let url = server.uri();
    let task = tokio::spawn({
        let scraper = Arc::clone(&scraper);
        async move { scraper.extract(&url).await }
    });

    // Wait until the render context is open, then cancel.
    for _ in 0..200 {
        if open.load(Ordering::SeqCst) == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(open.load(Ordering::SeqCst), 1);
    task.abort();
    assert!(task.await.unwrap_err().is_cancelled());
    assert_eq!(open.load(Ordering::SeqCst), 0);
}

#[test]
fn test_detect_uses_injected_registry() {
    let scraper = EventScraper::with_parts(
        config(),
        AdapterRegistry::new(vec![SiteAdapter::Eventbrite]),
        renderer(""),
    );
    assert_eq!(
        scraper.detect("https://www.eventbrite.com/e/launch-party-1"),
        Some(SiteAdapter::Eventbrite)
    );
    assert_eq!(scraper.detect("https://www.meetup.com/g/events/1"), None);
}
