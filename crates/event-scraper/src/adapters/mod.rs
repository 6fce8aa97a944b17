//! Platform-specific site adapters and their ordered registry.
//!
//! Each adapter is a pure function of `(markup, url)`: it tries the page's
//! schema.org data first. A record that already passes the quality gate is
//! returned as is; anything thinner is backfilled from the platform's own
//! DOM conventions. An adapter that cannot find a title returns `None` so
//! the orchestrator falls through to generic extraction.

mod eventbrite;
mod eventful;
mod facebook;
mod meetup;
mod ticketmaster;

use std::fmt;

use scraper::Html;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::extract::structured;
use crate::quality::{self, QualityVerdict};
use crate::types::Event;

/// The closed set of supported platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiteAdapter {
    Ticketmaster,
    Eventbrite,
    Facebook,
    Meetup,
    Eventful,
}

impl SiteAdapter {
    /// Registry order. The first matching adapter wins.
    pub const ALL: [SiteAdapter; 5] = [
        SiteAdapter::Ticketmaster,
        SiteAdapter::Eventbrite,
        SiteAdapter::Facebook,
        SiteAdapter::Meetup,
        SiteAdapter::Eventful,
    ];

    /// Stable identifier, also used as the extraction method tag.
    pub fn id(&self) -> &'static str {
        match self {
            SiteAdapter::Ticketmaster => "ticketmaster_adapter",
            SiteAdapter::Eventbrite => "eventbrite_adapter",
            SiteAdapter::Facebook => "facebook_adapter",
            SiteAdapter::Meetup => "meetup_adapter",
            SiteAdapter::Eventful => "eventful_adapter",
        }
    }

    pub fn from_id(id: &str) -> Option<SiteAdapter> {
        Self::ALL.into_iter().find(|a| a.id() == id)
    }

    /// Whether this adapter handles `url`. Pure: looks at the URL string only.
    pub fn matches(&self, url: &str) -> bool {
        let Some(target) = UrlParts::parse(url) else {
            return false;
        };
        match self {
            SiteAdapter::Ticketmaster => ticketmaster::matches(&target),
            SiteAdapter::Eventbrite => eventbrite::matches(&target),
            SiteAdapter::Facebook => facebook::matches(&target),
            SiteAdapter::Meetup => meetup::matches(&target),
            SiteAdapter::Eventful => eventful::matches(&target),
        }
    }

    /// Extract an event from `html`, or `None` when no title can be found.
    pub fn extract_event(&self, html: &str, url: &str) -> Option<Event> {
        let document = Html::parse_document(html);

        let from_jsonld = structured::extract_event_from_document(&document, url);
        if let Some(event) = &from_jsonld {
            if event.has_title() && quality::assess(event) == QualityVerdict::Accept {
                return from_jsonld;
            }
        }

        let from_dom = match self {
            SiteAdapter::Ticketmaster => ticketmaster::extract_dom(&document, url),
            SiteAdapter::Eventbrite => eventbrite::extract_dom(&document, url),
            SiteAdapter::Facebook => facebook::extract_dom(&document, url),
            SiteAdapter::Meetup => meetup::extract_dom(&document, url),
            SiteAdapter::Eventful => eventful::extract_dom(&document, url),
        };

        let event = match from_jsonld {
            Some(partial) => partial.backfilled_from(&from_dom),
            None => from_dom,
        };
        event.has_title().then_some(event)
    }
}

impl fmt::Display for SiteAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Ordered, immutable set of adapters consulted by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterRegistry {
    adapters: Vec<SiteAdapter>,
}

impl AdapterRegistry {
    pub fn new(adapters: Vec<SiteAdapter>) -> Self {
        Self { adapters }
    }

    /// A registry that never matches; every URL takes the generic path.
    pub fn empty() -> Self {
        Self {
            adapters: Vec::new(),
        }
    }

    pub fn adapters(&self) -> &[SiteAdapter] {
        &self.adapters
    }

    /// The first adapter, in registry order, that matches `url`.
    pub fn detect(&self, url: &str) -> Option<SiteAdapter> {
        self.adapters.iter().copied().find(|a| a.matches(url))
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::new(SiteAdapter::ALL.to_vec())
    }
}

/// Lowercased host and path segments of a URL.
pub(crate) struct UrlParts {
    host: String,
    segments: Vec<String>,
}

impl UrlParts {
    fn parse(url: &str) -> Option<Self> {
        let parsed = Url::parse(url.trim()).ok()?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return None;
        }
        let host = parsed.host_str()?.trim_end_matches('.').to_lowercase();
        let segments = parsed
            .path_segments()
            .map(|segs| {
                segs.filter(|s| !s.is_empty())
                    .map(|s| s.to_lowercase())
                    .collect()
            })
            .unwrap_or_default();
        Some(Self { host, segments })
    }

    /// `host` is `domain` or a subdomain of it.
    pub(crate) fn host_is(&self, domain: &str) -> bool {
        self.host == domain
            || self
                .host
                .strip_suffix(domain)
                .is_some_and(|prefix| prefix.ends_with('.'))
    }

    /// `host` is one of `domains` or a subdomain of one.
    pub(crate) fn host_is_any(&self, domains: &[&str]) -> bool {
        domains.iter().any(|d| self.host_is(d))
    }

    pub(crate) fn has_segment(&self, segment: &str) -> bool {
        self.segments.iter().any(|s| s == segment)
    }
}
