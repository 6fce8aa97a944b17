//! Generic (site-agnostic) extractors.
//!
//! All entry points are synchronous: `scraper::Html` is `!Send`, so each
//! call parses, extracts and drops the document before returning.

pub mod dom;
pub mod heuristic;
pub mod structured;

use scraper::Html;

use crate::types::Event;

/// Structured data first, backfilled from heuristics; heuristics alone when
/// the page carries no schema.org Event. `None` when neither finds anything.
pub fn extract_generic(html: &str, url: &str, max_images: usize) -> Option<Event> {
    let document = Html::parse_document(html);
    let heuristic = heuristic::extract_event_from_document(&document, url, max_images);

    match structured::extract_event_from_document(&document, url) {
        Some(event) => Some(match heuristic {
            Some(fallback) => event.backfilled_from(&fallback),
            None => event,
        }),
        None => heuristic,
    }
}
