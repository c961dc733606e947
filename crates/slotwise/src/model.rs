//! Value types for the scheduling engine.
//!
//! [`TimeRange`] is a half-open interval `[start, end)` over absolute
//! UTC instants; the half-open convention means back-to-back events
//! share an endpoint without conflicting. [`Event`] is immutable once
//! created — a changed event is modeled as delete + recreate by the
//! backend. [`FreeSlot`] is derived output only and is never
//! persisted. [`SchedulingRequest`] is the parser's intermediate form.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SchedulerError;

// ── TimeRange ───────────────────────────────────────────────────────────────

/// A half-open time interval `[start, end)` with `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTimeRange")]
pub struct TimeRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

/// Untrusted wire form of [`TimeRange`]; validated on deserialization.
#[derive(Deserialize)]
struct RawTimeRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TryFrom<RawTimeRange> for TimeRange {
    type Error = SchedulerError;

    fn try_from(raw: RawTimeRange) -> Result<Self, Self::Error> {
        TimeRange::new(raw.start, raw.end)
    }
}

impl TimeRange {
    /// Create a range, enforcing `start < end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, SchedulerError> {
        if start >= end {
            return Err(SchedulerError::InvalidArgument(format!(
                "time range start {start} must be before end {end}"
            )));
        }
        Ok(TimeRange { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Whether the open intervals overlap. Touching endpoints
    /// (`self.end == other.start`) are not a conflict.
    pub fn conflicts_with(&self, other: &TimeRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// The intersection with `bounds`, or `None` when the ranges are
    /// disjoint (including when they merely touch).
    pub fn clip_to(&self, bounds: &TimeRange) -> Option<TimeRange> {
        let start = self.start.max(bounds.start);
        let end = self.end.min(bounds.end);
        if start < end {
            Some(TimeRange { start, end })
        } else {
            None
        }
    }

    /// Internal constructor for ranges already known to be well-formed
    /// (e.g. gaps between sorted busy intervals).
    pub(crate) fn from_ordered(start: DateTime<Utc>, end: DateTime<Utc>) -> TimeRange {
        debug_assert!(start < end);
        TimeRange { start, end }
    }
}

// ── Event ───────────────────────────────────────────────────────────────────

/// A scheduled calendar event. The id is opaque and backend-assigned;
/// `source_text` retains the original instruction for audit and
/// cancellation confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub range: TimeRange,
    pub attendees: BTreeSet<String>,
    pub source_text: String,
}

// ── FreeSlot ────────────────────────────────────────────────────────────────

/// An available interval computed from the busy set. Recomputed on
/// every query; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FreeSlot {
    pub range: TimeRange,
}

// ── SchedulingRequest ───────────────────────────────────────────────────────

/// How precisely the parser pinned down the event start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Confidence {
    /// An explicit instant was resolved (clock time, named time, or
    /// offset like "in 2 hours").
    Exact,
    /// Only a calendar date was found; the start instant would be a
    /// guess. The engine rejects these rather than guessing.
    DateOnly,
}

/// The parsed intermediate form of a quick-add instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchedulingRequest {
    pub title: String,
    pub proposed_range: TimeRange,
    pub attendees: BTreeSet<String>,
    pub confidence: Confidence,
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 16, h, m, 0).unwrap()
    }

    #[test]
    fn test_range_rejects_inverted() {
        assert!(TimeRange::new(at(10, 0), at(9, 0)).is_err());
    }

    #[test]
    fn test_range_rejects_empty() {
        assert!(TimeRange::new(at(10, 0), at(10, 0)).is_err());
    }

    #[test]
    fn test_overlapping_ranges_conflict() {
        let a = TimeRange::new(at(9, 0), at(10, 0)).unwrap();
        let b = TimeRange::new(at(9, 30), at(11, 0)).unwrap();
        assert!(a.conflicts_with(&b));
        assert!(b.conflicts_with(&a));
    }

    #[test]
    fn test_touching_ranges_do_not_conflict() {
        let a = TimeRange::new(at(9, 0), at(10, 0)).unwrap();
        let b = TimeRange::new(at(10, 0), at(11, 0)).unwrap();
        assert!(!a.conflicts_with(&b));
        assert!(!b.conflicts_with(&a));
    }

    #[test]
    fn test_clip_partial_overlap() {
        let event = TimeRange::new(at(7, 0), at(9, 0)).unwrap();
        let bounds = TimeRange::new(at(8, 0), at(18, 0)).unwrap();
        let clipped = event.clip_to(&bounds).unwrap();
        assert_eq!(clipped.start(), at(8, 0));
        assert_eq!(clipped.end(), at(9, 0));
    }

    #[test]
    fn test_clip_disjoint_is_none() {
        let event = TimeRange::new(at(6, 0), at(7, 0)).unwrap();
        let bounds = TimeRange::new(at(8, 0), at(18, 0)).unwrap();
        assert!(event.clip_to(&bounds).is_none());
    }

    #[test]
    fn test_clip_touching_is_none() {
        let event = TimeRange::new(at(6, 0), at(8, 0)).unwrap();
        let bounds = TimeRange::new(at(8, 0), at(18, 0)).unwrap();
        assert!(event.clip_to(&bounds).is_none());
    }

    #[test]
    fn test_duration() {
        let r = TimeRange::new(at(9, 0), at(10, 30)).unwrap();
        assert_eq!(r.duration(), Duration::minutes(90));
    }
}
