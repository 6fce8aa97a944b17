//! Event Scraper: hybrid extraction of structured event data from event-listing pages.
//!
//! A URL goes through a static fetch, the site adapter registry, the generic
//! structured-data and heuristic extractors, and a quality gate. Pages that
//! stay too thin after the static pass are rendered once in headless Chromium
//! and re-extracted.

pub mod adapters;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod pipeline;
pub mod quality;
pub mod renderer;
pub mod types;

pub use adapters::{AdapterRegistry, SiteAdapter};
pub use config::ScraperConfig;
pub use error::{FetchStage, ScrapeError, ScrapeResult};
pub use pipeline::EventScraper;
pub use quality::{assess, QualityVerdict};
pub use types::{Event, ExtractionMethod, ExtractionResult};
