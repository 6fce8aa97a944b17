//! Ticketmaster event pages.

use std::sync::OnceLock;

use regex::Regex;
use scraper::Html;

use super::UrlParts;
use crate::extract::dom::{meta_property, text_by_class_or_id, text_by_class_pattern, time_datetimes};
use crate::types::Event;

const DOMAINS: &[&str] = &[
    "ticketmaster.com",
    "ticketmaster.ca",
    "ticketmaster.co.uk",
    "ticketmaster.ie",
    "ticketmaster.com.au",
    "ticketmaster.co.nz",
    "ticketmaster.com.mx",
    "ticketmaster.de",
    "ticketmaster.fr",
    "ticketmaster.es",
    "ticketmaster.it",
    "ticketmaster.nl",
    "ticketmaster.be",
    "ticketmaster.at",
    "ticketmaster.ch",
    "ticketmaster.dk",
    "ticketmaster.se",
    "ticketmaster.no",
    "ticketmaster.fi",
    "ticketmaster.pl",
    "ticketmaster.cz",
    "ticketmaster.co.za",
    "ticketmaster.ae",
];

pub(super) fn matches(url: &UrlParts) -> bool {
    url.host_is_any(DOMAINS)
}

fn title_class() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)event.*title").expect("title class regex is valid"))
}

/// Event-title heading, else `og:title`; date from `<time>`, venue block.
pub(super) fn extract_dom(document: &Html, url: &str) -> Event {
    let mut event = Event::new(url);
    event.title = text_by_class_pattern(document, "h1", title_class())
        .or_else(|| meta_property(document, "og:title"));
    event.description = meta_property(document, "og:description");
    event.start = time_datetimes(document).into_iter().next();
    event.location = text_by_class_or_id(document, &["venue"], 3);
    event.images = meta_property(document, "og:image").into_iter().collect();
    event
}
