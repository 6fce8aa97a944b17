//! Eventbrite event pages.

use std::sync::OnceLock;

use regex::Regex;
use scraper::Html;

use super::UrlParts;
use crate::extract::dom::{meta_property, text_by_class_or_id, text_by_class_pattern, time_datetimes};
use crate::types::Event;

const DOMAINS: &[&str] = &[
    "eventbrite.com",
    "eventbrite.ca",
    "eventbrite.co.uk",
    "eventbrite.ie",
    "eventbrite.com.au",
    "eventbrite.co.nz",
    "eventbrite.com.mx",
    "eventbrite.com.br",
    "eventbrite.com.ar",
    "eventbrite.cl",
    "eventbrite.com.pe",
    "eventbrite.co",
    "eventbrite.de",
    "eventbrite.fr",
    "eventbrite.es",
    "eventbrite.it",
    "eventbrite.nl",
    "eventbrite.be",
    "eventbrite.at",
    "eventbrite.ch",
    "eventbrite.pt",
    "eventbrite.dk",
    "eventbrite.se",
    "eventbrite.fi",
    "eventbrite.sg",
    "eventbrite.hk",
];

pub(super) fn matches(url: &UrlParts) -> bool {
    url.host_is_any(DOMAINS)
}

fn title_class() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)eventTitle").expect("title class regex is valid"))
}

/// Eventbrite publishes `event:start_time`/`event:end_time` meta properties
/// alongside OpenGraph; `<time>` elements cover older layouts.
pub(super) fn extract_dom(document: &Html, url: &str) -> Event {
    let mut times = time_datetimes(document).into_iter();
    let mut event = Event::new(url);
    event.title = text_by_class_pattern(document, "h1", title_class())
        .or_else(|| meta_property(document, "og:title"));
    event.description = meta_property(document, "og:description");
    event.start = meta_property(document, "event:start_time").or_else(|| times.next());
    event.end = meta_property(document, "event:end_time").or_else(|| times.next());
    event.location = text_by_class_or_id(document, &["location"], 3);
    event.images = meta_property(document, "og:image").into_iter().collect();
    event
}
