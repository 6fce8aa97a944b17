//! Heuristic extraction from conventional markup.
//!
//! Social-preview meta tags are the primary source. Headings, `<time>`
//! elements and venue/location-named blocks fill in what they can. Missing
//! fields stay `None`; nothing is invented.

use scraper::Html;

use super::dom::{
    first_text, meta_name, meta_property, meta_property_all, select_all, text_by_class_or_id,
    time_datetimes,
};
use crate::types::Event;

const LOCATION_MARKERS: &[&str] = &["location", "venue"];

/// Build a partial event from raw HTML. `None` when no field was found.
pub fn extract_event(html: &str, url: &str, max_images: usize) -> Option<Event> {
    let document = Html::parse_document(html);
    extract_event_from_document(&document, url, max_images)
}

/// Same as [`extract_event`] on an already-parsed document.
pub fn extract_event_from_document(document: &Html, url: &str, max_images: usize) -> Option<Event> {
    let mut event = Event::new(url);

    event.title = meta_property(document, "og:title")
        .or_else(|| first_text(document, "title"))
        .or_else(|| first_text(document, "h1"));

    event.description =
        meta_name(document, "description").or_else(|| meta_property(document, "og:description"));

    let times = time_datetimes(document);
    let mut times = times.into_iter();
    event.start = times.next();
    event.end = times.next();

    event.location = text_by_class_or_id(document, LOCATION_MARKERS, 3);

    event.images = collect_images(document, max_images);

    if event.is_empty() {
        None
    } else {
        Some(event)
    }
}

fn collect_images(document: &Html, max_images: usize) -> Vec<String> {
    let mut images = meta_property_all(document, "og:image");
    if images.is_empty() {
        images = select_all(document, "img[src]")
            .iter()
            .filter_map(|img| img.value().attr("src"))
            .map(str::trim)
            .filter(|src| !src.is_empty())
            .map(str::to_string)
            .collect();
    }
    images.truncate(max_images);
    images
}
