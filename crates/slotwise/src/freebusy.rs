//! Free-slot computation over a day's events.
//!
//! The input events need not be sorted or disjoint: the calculator
//! sorts by `(start, id)`, clips each event to the day bounds, merges
//! overlapping and back-to-back busy intervals into a single union,
//! and sweeps the merged set for maximal gaps. Merging before the
//! sweep is what keeps the result correct when two events overlap —
//! per-event subtraction would double-count the shared time.

use chrono::Duration;

use crate::model::{Event, FreeSlot, TimeRange};

/// Compute the free slots within `day_bounds` given the day's events.
///
/// A free slot is any maximal gap — including before the first busy
/// interval and after the last — whose duration is at least
/// `min_duration` (a gap of exactly `min_duration` counts). Events
/// partially outside the bounds are clipped; events entirely outside
/// are ignored. The output is sorted by start and non-overlapping;
/// an empty result means a fully booked day and is not an error.
/// A non-positive `min_duration` reports every gap, but a zero-width
/// gap is never a slot.
pub fn free_slots(events: &[Event], day_bounds: &TimeRange, min_duration: Duration) -> Vec<FreeSlot> {
    // Clamp so a non-positive minimum cannot admit empty ranges.
    let min_duration = min_duration.max(Duration::nanoseconds(1));
    let busy = merge_busy(events, day_bounds);

    let mut slots = Vec::new();
    let mut cursor = day_bounds.start();

    for interval in &busy {
        if interval.start() - cursor >= min_duration {
            slots.push(FreeSlot {
                range: TimeRange::from_ordered(cursor, interval.start()),
            });
        }
        cursor = cursor.max(interval.end());
    }

    if day_bounds.end() - cursor >= min_duration {
        slots.push(FreeSlot {
            range: TimeRange::from_ordered(cursor, day_bounds.end()),
        });
    }

    slots
}

/// Clip the events to `bounds`, sort by `(start, id)`, and merge
/// overlapping or back-to-back intervals into a disjoint busy set.
fn merge_busy(events: &[Event], bounds: &TimeRange) -> Vec<TimeRange> {
    let mut clipped: Vec<(&Event, TimeRange)> = events
        .iter()
        .filter_map(|e| e.range.clip_to(bounds).map(|r| (e, r)))
        .collect();

    // Stable sort; id tie-break keeps the merge deterministic when two
    // events share a start.
    clipped.sort_by(|(ea, ra), (eb, rb)| {
        ra.start()
            .cmp(&rb.start())
            .then_with(|| ea.id.cmp(&eb.id))
    });

    let mut merged: Vec<TimeRange> = Vec::with_capacity(clipped.len());
    for (_, range) in clipped {
        match merged.last_mut() {
            // Back-to-back (start == end) merges too: no zero-width
            // free slot between adjacent events.
            Some(last) if range.start() <= last.end() => {
                if range.end() > last.end() {
                    *last = TimeRange::from_ordered(last.start(), range.end());
                }
            }
            _ => merged.push(range),
        }
    }
    merged
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 16, h, m, 0).unwrap()
    }

    fn event(id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Event {
        Event {
            id: id.to_string(),
            title: format!("event {id}"),
            range: TimeRange::new(start, end).unwrap(),
            attendees: BTreeSet::new(),
            source_text: String::new(),
        }
    }

    fn day() -> TimeRange {
        TimeRange::new(at(0, 0), Utc.with_ymd_and_hms(2026, 3, 17, 0, 0, 0).unwrap()).unwrap()
    }

    #[test]
    fn test_empty_day_is_one_full_slot() {
        let slots = free_slots(&[], &day(), Duration::minutes(30));
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].range.start(), day().start());
        assert_eq!(slots[0].range.end(), day().end());
    }

    #[test]
    fn test_overlapping_events_merge_before_sweep() {
        // [9:00,10:00) and [9:30,11:00) merge into [9:00,11:00).
        // Bounds [8:00,18:00), min 60m: the [8:00,9:00) gap is exactly
        // 60m and counts; then [11:00,18:00).
        let events = vec![
            event("a", at(9, 0), at(10, 0)),
            event("b", at(9, 30), at(11, 0)),
        ];
        let bounds = TimeRange::new(at(8, 0), at(18, 0)).unwrap();
        let slots = free_slots(&events, &bounds, Duration::minutes(60));
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].range.start(), at(8, 0));
        assert_eq!(slots[0].range.end(), at(9, 0));
        assert_eq!(slots[1].range.start(), at(11, 0));
        assert_eq!(slots[1].range.end(), at(18, 0));
    }

    #[test]
    fn test_gap_shorter_than_minimum_is_dropped() {
        let events = vec![
            event("a", at(9, 0), at(10, 0)),
            event("b", at(10, 30), at(18, 0)),
        ];
        let bounds = TimeRange::new(at(9, 0), at(18, 0)).unwrap();
        let slots = free_slots(&events, &bounds, Duration::minutes(60));
        assert!(slots.is_empty());
    }

    #[test]
    fn test_back_to_back_events_leave_no_gap() {
        let events = vec![
            event("a", at(9, 0), at(10, 0)),
            event("b", at(10, 0), at(11, 0)),
        ];
        let bounds = TimeRange::new(at(9, 0), at(12, 0)).unwrap();
        let slots = free_slots(&events, &bounds, Duration::minutes(30));
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].range.start(), at(11, 0));
        assert_eq!(slots[0].range.end(), at(12, 0));
    }

    #[test]
    fn test_unsorted_input_is_sorted_internally() {
        let events = vec![
            event("b", at(14, 0), at(15, 0)),
            event("a", at(9, 0), at(10, 0)),
        ];
        let bounds = TimeRange::new(at(8, 0), at(18, 0)).unwrap();
        let slots = free_slots(&events, &bounds, Duration::minutes(30));
        let starts: Vec<_> = slots.iter().map(|s| s.range.start()).collect();
        assert_eq!(starts, vec![at(8, 0), at(10, 0), at(15, 0)]);
    }

    #[test]
    fn test_event_outside_bounds_is_ignored() {
        let events = vec![event("a", at(19, 0), at(20, 0))];
        let bounds = TimeRange::new(at(8, 0), at(18, 0)).unwrap();
        let slots = free_slots(&events, &bounds, Duration::minutes(30));
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].range.start(), at(8, 0));
        assert_eq!(slots[0].range.end(), at(18, 0));
    }

    #[test]
    fn test_event_straddling_bounds_is_clipped() {
        let events = vec![event("a", at(7, 0), at(9, 0))];
        let bounds = TimeRange::new(at(8, 0), at(18, 0)).unwrap();
        let slots = free_slots(&events, &bounds, Duration::minutes(30));
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].range.start(), at(9, 0));
        assert_eq!(slots[0].range.end(), at(18, 0));
    }

    #[test]
    fn test_non_positive_minimum_yields_no_zero_width_slots() {
        // Busy from the bounds start and back-to-back: the only gap is
        // the tail. Zero and negative minimums must not surface the
        // zero-width gaps at 9:00 and 10:00.
        let events = vec![
            event("a", at(9, 0), at(10, 0)),
            event("b", at(10, 0), at(11, 0)),
        ];
        let bounds = TimeRange::new(at(9, 0), at(12, 0)).unwrap();
        for min in [Duration::zero(), Duration::minutes(-5)] {
            let slots = free_slots(&events, &bounds, min);
            assert_eq!(slots.len(), 1);
            assert_eq!(slots[0].range.start(), at(11, 0));
            assert_eq!(slots[0].range.end(), at(12, 0));
        }
    }

    #[test]
    fn test_fully_booked_day_yields_no_slots() {
        let events = vec![event("a", at(0, 0), day().end())];
        let slots = free_slots(&events, &day(), Duration::minutes(30));
        assert!(slots.is_empty());
    }

    #[test]
    fn test_event_covering_whole_bounds_from_outside() {
        let events = vec![event("a", at(6, 0), at(20, 0))];
        let bounds = TimeRange::new(at(8, 0), at(18, 0)).unwrap();
        assert!(free_slots(&events, &bounds, Duration::minutes(1)).is_empty());
    }

    // Free and merged busy time, clipped to bounds, must tile the
    // bounds exactly: sorted, disjoint, no uncovered gap.
    proptest! {
        #[test]
        fn prop_free_plus_busy_tiles_the_bounds(
            raw in prop::collection::vec((0u32..1440, 1u32..240), 0..12),
        ) {
            let base = at(0, 0);
            let bounds = day();
            let events: Vec<Event> = raw
                .iter()
                .enumerate()
                .map(|(i, (offset, len))| {
                    let start = base + Duration::minutes(*offset as i64);
                    let end = start + Duration::minutes(*len as i64);
                    event(&format!("e{i:02}"), start, end)
                })
                .collect();

            let min = Duration::minutes(1);
            let slots = free_slots(&events, &bounds, min);

            // Sorted, non-overlapping, each >= min duration.
            for pair in slots.windows(2) {
                prop_assert!(pair[0].range.end() <= pair[1].range.start());
            }
            for slot in &slots {
                prop_assert!(slot.range.duration() >= min);
                prop_assert!(slot.range.start() >= bounds.start());
                prop_assert!(slot.range.end() <= bounds.end());
            }

            // With min_duration = 1 minute and minute-aligned events,
            // every gap is reported, so free + busy = bounds.
            let busy: Duration = super::merge_busy(&events, &bounds)
                .iter()
                .map(|r| r.duration())
                .fold(Duration::zero(), |acc, d| acc + d);
            let free: Duration = slots
                .iter()
                .map(|s| s.range.duration())
                .fold(Duration::zero(), |acc, d| acc + d);
            prop_assert_eq!(busy + free, bounds.duration());
        }
    }
}
