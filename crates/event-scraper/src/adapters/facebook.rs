//! Facebook Events. Content is exposed almost entirely through OpenGraph.

use scraper::Html;

use super::UrlParts;
use crate::extract::dom::meta_property;
use crate::types::Event;

/// Facebook domain and an `events` path segment; profile and page URLs on
/// the same domain are not events.
pub(super) fn matches(url: &UrlParts) -> bool {
    url.host_is("facebook.com") && url.has_segment("events")
}

pub(super) fn extract_dom(document: &Html, url: &str) -> Event {
    let mut event = Event::new(url);
    event.title = meta_property(document, "og:title");
    event.description = meta_property(document, "og:description");
    event.start = meta_property(document, "event:start_time");
    event.images = meta_property(document, "og:image").into_iter().collect();
    event
}
