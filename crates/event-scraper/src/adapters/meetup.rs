//! Meetup event pages.

use std::sync::OnceLock;

use regex::Regex;
use scraper::Html;

use super::UrlParts;
use crate::extract::dom::{meta_property, text_by_class_pattern, time_datetimes};
use crate::types::Event;

/// Meetup domain with an `events` path segment. Group pages (`/group-name/`)
/// are not events.
pub(super) fn matches(url: &UrlParts) -> bool {
    url.host_is("meetup.com") && url.has_segment("events")
}

fn title_class() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)eventTitle").expect("title class regex is valid"))
}

pub(super) fn extract_dom(document: &Html, url: &str) -> Event {
    let mut event = Event::new(url);
    event.title = text_by_class_pattern(document, "h1", title_class());
    event.description = meta_property(document, "og:description");
    event.start = time_datetimes(document).into_iter().next();
    event.images = meta_property(document, "og:image").into_iter().collect();
    event
}
