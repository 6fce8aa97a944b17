//! Eventful event pages.

use scraper::Html;

use super::UrlParts;
use crate::extract::dom::meta_property;
use crate::types::Event;

pub(super) fn matches(url: &UrlParts) -> bool {
    url.host_is("eventful.com")
}

pub(super) fn extract_dom(document: &Html, url: &str) -> Event {
    let mut event = Event::new(url);
    event.title = meta_property(document, "og:title");
    event.description = meta_property(document, "og:description");
    event.images = meta_property(document, "og:image").into_iter().collect();
    event
}
