//! Quality gate deciding between accepting a candidate and escalating to a
//! rendered fetch.
//!
//! Binary and reproducible: a candidate passes when at least two of
//! {title, start, location} are present. The same bar applies to every
//! adapter and to generic extraction.

use crate::types::Event;

/// Minimum number of key signals for acceptance.
pub const MIN_SIGNALS: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityVerdict {
    Accept,
    Escalate,
}

/// How many of {title, start, location} the event carries (0-3).
pub fn signal_count(event: &Event) -> u8 {
    u8::from(event.has_title()) + u8::from(event.has_start()) + u8::from(event.has_location())
}

pub fn assess(event: &Event) -> QualityVerdict {
    if signal_count(event) >= MIN_SIGNALS {
        QualityVerdict::Accept
    } else {
        QualityVerdict::Escalate
    }
}

/// [`assess`] over an optional candidate; no candidate always escalates.
pub fn assess_candidate(candidate: Option<&Event>) -> QualityVerdict {
    candidate.map_or(QualityVerdict::Escalate, assess)
}
