//! schema.org Event extraction from embedded JSON-LD.
//!
//! Scans every `<script type="application/ld+json">` block, unwraps one level
//! of array or `@graph` nesting, and normalizes the first Event-typed object.
//! Blocks that fail to parse are skipped; a page with no usable block yields
//! `None`.

use scraper::Html;
use serde_json::Value;

use super::dom::{non_empty, select_all};
use crate::types::Event;

/// schema.org types accepted as events.
const EVENT_TYPES: &[&str] = &[
    "Event",
    "BusinessEvent",
    "ChildrensEvent",
    "ComedyEvent",
    "CourseInstance",
    "DanceEvent",
    "DeliveryEvent",
    "EducationEvent",
    "EventSeries",
    "ExhibitionEvent",
    "Festival",
    "FoodEvent",
    "Hackathon",
    "LiteraryEvent",
    "MusicEvent",
    "PublicationEvent",
    "SaleEvent",
    "ScreeningEvent",
    "SocialEvent",
    "SportsEvent",
    "TheaterEvent",
    "VisualArtsEvent",
];

/// Extract the first schema.org Event from raw HTML.
pub fn extract_event(html: &str, url: &str) -> Option<Event> {
    let document = Html::parse_document(html);
    extract_event_from_document(&document, url)
}

/// Same as [`extract_event`] on an already-parsed document.
pub fn extract_event_from_document(document: &Html, url: &str) -> Option<Event> {
    for script in select_all(document, r#"script[type="application/ld+json"]"#) {
        let text = script.text().collect::<String>();
        let text = text.trim();
        if text.is_empty() {
            continue;
        }
        let value = match serde_json::from_str::<Value>(text) {
            Ok(v) => v,
            Err(e) => {
                tracing::trace!("skipping malformed JSON-LD block: {e}");
                continue;
            }
        };
        if let Some(obj) = find_event_object(&value) {
            return Some(normalize_event(obj, url));
        }
    }
    None
}

/// Find the first Event-typed object at the top level, inside a top-level
/// array, or inside a `@graph` wrapper.
pub fn find_event_object(value: &Value) -> Option<&Value> {
    let candidates: Vec<&Value> = match value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(_) => vec![value],
        _ => return None,
    };

    for candidate in candidates {
        if is_event_type(candidate) {
            return Some(candidate);
        }
        if let Some(graph) = candidate.get("@graph").and_then(|g| g.as_array()) {
            if let Some(found) = graph.iter().find(|item| is_event_type(item)) {
                return Some(found);
            }
        }
    }
    None
}

/// Whether a JSON-LD object declares an Event type (string or array form).
pub fn is_event_type(value: &Value) -> bool {
    match value.get("@type") {
        Some(Value::String(t)) => is_event_type_name(t),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(|t| t.as_str())
            .any(is_event_type_name),
        _ => false,
    }
}

fn is_event_type_name(name: &str) -> bool {
    let name = name
        .trim()
        .trim_start_matches("https://schema.org/")
        .trim_start_matches("http://schema.org/")
        .trim_start_matches("schema:");
    EVENT_TYPES.contains(&name)
}

/// Map a schema.org Event object onto an [`Event`].
pub fn normalize_event(obj: &Value, url: &str) -> Event {
    let location_value = displayable_location(obj.get("location"));
    let (location, raw_location) = match location_value {
        Some(Value::String(s)) => (non_empty(s), None),
        Some(loc @ Value::Object(_)) => (flatten_place(loc), Some(loc.clone())),
        _ => (None, None),
    };

    let offer = first_of(obj.get("offers"));
    let price = offer.and_then(|o| {
        o.get("price")
            .and_then(scalar_string)
            .or_else(|| o.get("lowPrice").and_then(scalar_string))
    });
    let currency = offer.and_then(|o| o.get("priceCurrency").and_then(scalar_string));

    let organizer = first_of(obj.get("organizer")).and_then(|o| match o {
        Value::String(s) => non_empty(s),
        other => other.get("name").and_then(scalar_string),
    });

    let mut event = Event::new(url);
    event.title = obj.get("name").and_then(scalar_string);
    event.description = obj.get("description").and_then(scalar_string);
    event.start = obj.get("startDate").and_then(scalar_string);
    event.end = obj.get("endDate").and_then(scalar_string);
    event.location = location;
    event.raw_location = raw_location;
    event.price = price;
    event.currency = currency;
    event.organizer = organizer;
    event.status = obj.get("eventStatus").and_then(scalar_string);
    event.event_attendance_mode = obj.get("eventAttendanceMode").and_then(scalar_string);
    event.images = obj.get("image").map(image_urls).unwrap_or_default();
    event.raw_structured_data = Some(obj.clone());
    event
}

/// "Venue Name, Street, City, Region, Postal, Country" from a Place object.
fn flatten_place(place: &Value) -> Option<String> {
    let name = place.get("name").and_then(scalar_string);

    let address = match place.get("address") {
        Some(Value::String(s)) => non_empty(s),
        Some(addr @ Value::Object(_)) => {
            let parts: Vec<String> = [
                "streetAddress",
                "addressLocality",
                "addressRegion",
                "postalCode",
                "addressCountry",
            ]
            .iter()
            .filter_map(|key| match addr.get(*key) {
                Some(Value::Object(country)) => country.get("name").and_then(scalar_string),
                Some(v) => scalar_string(v),
                None => None,
            })
            .collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        _ => None,
    };

    let combined: Vec<String> = [name, address].into_iter().flatten().collect();
    (!combined.is_empty()).then(|| combined.join(", "))
}

fn image_urls(image: &Value) -> Vec<String> {
    match image {
        Value::Array(items) => items.iter().filter_map(single_image_url).collect(),
        other => single_image_url(other).into_iter().collect(),
    }
}

fn single_image_url(image: &Value) -> Option<String> {
    match image {
        Value::String(s) => non_empty(s),
        Value::Object(_) => image
            .get("url")
            .or_else(|| image.get("contentUrl"))
            .and_then(scalar_string),
        _ => None,
    }
}

/// The first location entry that names a place: a non-empty string, or an
/// object with a `name` or `address`. Falls back to the first entry, so an
/// online-only event keeps its `VirtualLocation` as the raw location.
fn displayable_location(value: Option<&Value>) -> Option<&Value> {
    let Value::Array(items) = value? else {
        return value;
    };
    items
        .iter()
        .find(|item| match item {
            Value::String(s) => !s.trim().is_empty(),
            Value::Object(_) => item.get("name").is_some() || item.get("address").is_some(),
            _ => false,
        })
        .or_else(|| items.first())
}

/// The value itself, or the first element when it is an array.
fn first_of(value: Option<&Value>) -> Option<&Value> {
    match value? {
        Value::Array(items) => items.first(),
        other => Some(other),
    }
}

/// Strings verbatim (trimmed), numbers in their JSON rendering.
fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
