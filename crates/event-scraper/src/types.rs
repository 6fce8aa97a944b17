//! Core data types: the normalized event record and the pipeline result.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::adapters::SiteAdapter;

/// A normalized event record.
///
/// Every field except `source_url` is optional; values are kept verbatim
/// from the page (no currency, date or status normalization).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub source_url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    /// ISO-8601 start, as written by the page.
    pub start: Option<String>,
    pub end: Option<String>,
    /// Human-readable location line.
    pub location: Option<String>,
    /// Structured location object from schema.org data, untouched.
    pub raw_location: Option<Value>,
    pub price: Option<String>,
    pub currency: Option<String>,
    pub organizer: Option<String>,
    /// schema.org `eventStatus`, e.g. `https://schema.org/EventScheduled`.
    pub status: Option<String>,
    pub event_attendance_mode: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    /// The full schema.org Event object when one was found.
    pub raw_structured_data: Option<Value>,
}

impl Event {
    /// An event carrying only its source URL.
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            title: None,
            description: None,
            start: None,
            end: None,
            location: None,
            raw_location: None,
            price: None,
            currency: None,
            organizer: None,
            status: None,
            event_attendance_mode: None,
            images: Vec::new(),
            raw_structured_data: None,
        }
    }

    pub fn has_title(&self) -> bool {
        present(&self.title)
    }

    pub fn has_start(&self) -> bool {
        present(&self.start)
    }

    pub fn has_location(&self) -> bool {
        present(&self.location)
    }

    /// At least one of title, start or location is present.
    pub fn has_substance(&self) -> bool {
        self.has_title() || self.has_start() || self.has_location()
    }

    /// No field besides `source_url` carries a value.
    pub fn is_empty(&self) -> bool {
        !self.has_substance()
            && !present(&self.description)
            && !present(&self.end)
            && self.raw_location.is_none()
            && !present(&self.price)
            && !present(&self.currency)
            && !present(&self.organizer)
            && !present(&self.status)
            && !present(&self.event_attendance_mode)
            && self.images.is_empty()
            && self.raw_structured_data.is_none()
    }

    /// A new event with this event's empty text fields and image list filled
    /// from `other`. Fields already present are kept.
    pub fn backfilled_from(self, other: &Event) -> Event {
        Event {
            title: or_from(self.title, &other.title),
            description: or_from(self.description, &other.description),
            start: or_from(self.start, &other.start),
            end: or_from(self.end, &other.end),
            location: or_from(self.location, &other.location),
            price: or_from(self.price, &other.price),
            currency: or_from(self.currency, &other.currency),
            organizer: or_from(self.organizer, &other.organizer),
            images: if self.images.is_empty() {
                other.images.clone()
            } else {
                self.images
            },
            ..self
        }
    }
}

fn present(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|s| !s.trim().is_empty())
}

fn or_from(own: Option<String>, other: &Option<String>) -> Option<String> {
    if present(&own) {
        own
    } else if present(other) {
        other.clone()
    } else {
        own
    }
}

/// Which strategy produced an [`ExtractionResult`].
///
/// Serialized as a flat string tag; downstream risk scoring and metrics key
/// off these exact values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractionMethod {
    /// A platform adapter accepted on the static pass.
    Adapter(SiteAdapter),
    /// Generic structured/heuristic extraction accepted on the static pass.
    GenericStatic,
    /// Re-extraction of rendered markup found something.
    GenericRendered,
    /// Rendering succeeded but nothing of substance was extracted.
    RenderedEmpty,
    /// A fetch stage failed.
    Failed,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMethod::Adapter(adapter) => adapter.id(),
            ExtractionMethod::GenericStatic => "generic-static",
            ExtractionMethod::GenericRendered => "generic-rendered",
            ExtractionMethod::RenderedEmpty => "rendered-empty",
            ExtractionMethod::Failed => "failed",
        }
    }
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExtractionMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "generic-static" => Ok(ExtractionMethod::GenericStatic),
            "generic-rendered" => Ok(ExtractionMethod::GenericRendered),
            "rendered-empty" => Ok(ExtractionMethod::RenderedEmpty),
            "failed" => Ok(ExtractionMethod::Failed),
            other => SiteAdapter::from_id(other)
                .map(ExtractionMethod::Adapter)
                .ok_or_else(|| format!("unknown extraction method: {other}")),
        }
    }
}

impl Serialize for ExtractionMethod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ExtractionMethod {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// The outcome of one `extract` call. Always well-formed, even on failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub event: Event,
    #[serde(rename = "scrape_method")]
    pub method: ExtractionMethod,
    /// Why a fetch stage failed; only set when `method` is `failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExtractionResult {
    pub fn new(event: Event, method: ExtractionMethod) -> Self {
        Self {
            event,
            method,
            error: None,
        }
    }

    /// A failure result carrying only the source URL.
    pub fn failed(source_url: impl Into<String>, error: impl fmt::Display) -> Self {
        Self {
            event: Event::new(source_url),
            method: ExtractionMethod::Failed,
            error: Some(error.to_string()),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.method == ExtractionMethod::Failed
    }
}
