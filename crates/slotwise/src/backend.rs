//! The calendar backend collaborator boundary.
//!
//! The engine never stores events itself; a [`CalendarBackend`] is the
//! system of record. [`InMemoryBackend`] is the reference
//! implementation of the contract (ascending ordering, no-op delete of
//! unknown ids) and backs the engine's test suite.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Mutex;

use crate::error::BackendError;
use crate::model::{Event, TimeRange};

/// The external calendar system of record.
///
/// Implementations own persistence, ids, and any network I/O; the
/// engine composes these three primitives plus a best-effort
/// notification hook.
pub trait CalendarBackend {
    /// Persist a new event and return it with its backend-assigned id.
    fn create_event(
        &self,
        title: &str,
        range: TimeRange,
        attendees: BTreeSet<String>,
        source_text: &str,
    ) -> Result<Event, BackendError>;

    /// All events whose range overlaps `window`, ascending by
    /// `(start, id)`.
    fn list_events(&self, window: &TimeRange) -> Result<Vec<Event>, BackendError>;

    /// Delete an event by id. Deleting an id that no longer exists is
    /// success-with-no-op, which makes concurrent cancellations safe.
    fn delete_event(&self, id: &str) -> Result<(), BackendError>;

    /// Best-effort cancellation notice to the event's attendees. The
    /// engine downgrades a failure here to a warning.
    fn notify_cancellation(&self, event: &Event) -> Result<(), BackendError>;
}

/// An in-process backend keeping events in a mutex-guarded map.
///
/// Ids are zero-padded (`evt-0001`, `evt-0002`, ...) so lexicographic
/// and creation order agree.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    next_id: u64,
    events: BTreeMap<String, Event>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with pre-built events (tests control the ids).
    pub fn with_events(events: impl IntoIterator<Item = Event>) -> Self {
        let backend = Self::new();
        {
            let mut state = backend
                .state
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            for event in events {
                state.events.insert(event.id.clone(), event);
            }
        }
        backend
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, State>, BackendError> {
        self.state
            .lock()
            .map_err(|_| BackendError::Unavailable("event store lock poisoned".to_string()))
    }
}

impl CalendarBackend for InMemoryBackend {
    fn create_event(
        &self,
        title: &str,
        range: TimeRange,
        attendees: BTreeSet<String>,
        source_text: &str,
    ) -> Result<Event, BackendError> {
        let mut state = self.lock()?;
        state.next_id += 1;
        let id = format!("evt-{:04}", state.next_id);
        let event = Event {
            id: id.clone(),
            title: title.to_string(),
            range,
            attendees,
            source_text: source_text.to_string(),
        };
        state.events.insert(id, event.clone());
        Ok(event)
    }

    fn list_events(&self, window: &TimeRange) -> Result<Vec<Event>, BackendError> {
        let state = self.lock()?;
        let mut events: Vec<Event> = state
            .events
            .values()
            .filter(|e| e.range.conflicts_with(window))
            .cloned()
            .collect();
        events.sort_by(|a, b| {
            a.range
                .start()
                .cmp(&b.range.start())
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(events)
    }

    fn delete_event(&self, id: &str) -> Result<(), BackendError> {
        let mut state = self.lock()?;
        // Unknown id: already gone, nothing to do.
        state.events.remove(id);
        Ok(())
    }

    fn notify_cancellation(&self, _event: &Event) -> Result<(), BackendError> {
        Ok(())
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 16, h, 0, 0).unwrap()
    }

    fn create(backend: &InMemoryBackend, title: &str, start: DateTime<Utc>) -> Event {
        let range = TimeRange::new(start, start + Duration::hours(1)).unwrap();
        backend
            .create_event(title, range, BTreeSet::new(), title)
            .unwrap()
    }

    #[test]
    fn test_ids_are_unique_and_ordered() {
        let backend = InMemoryBackend::new();
        let a = create(&backend, "a", at(9));
        let b = create(&backend, "b", at(10));
        assert_ne!(a.id, b.id);
        assert!(a.id < b.id);
    }

    #[test]
    fn test_list_orders_by_start_then_id() {
        let backend = InMemoryBackend::new();
        create(&backend, "later", at(14));
        create(&backend, "earlier", at(9));
        create(&backend, "same-start", at(9));

        let window = TimeRange::new(at(0), at(23)).unwrap();
        let events = backend.list_events(&window).unwrap();
        let titles: Vec<&str> = events.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["earlier", "same-start", "later"]);
    }

    #[test]
    fn test_list_excludes_non_overlapping() {
        let backend = InMemoryBackend::new();
        create(&backend, "inside", at(9));
        create(&backend, "outside", at(20));

        let window = TimeRange::new(at(8), at(12)).unwrap();
        let events = backend.list_events(&window).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title, "inside");
    }

    #[test]
    fn test_list_includes_straddling_event() {
        let backend = InMemoryBackend::new();
        let range = TimeRange::new(at(7), at(9)).unwrap();
        backend
            .create_event("straddle", range, BTreeSet::new(), "")
            .unwrap();

        let window = TimeRange::new(at(8), at(12)).unwrap();
        assert_eq!(backend.list_events(&window).unwrap().len(), 1);
    }

    #[test]
    fn test_delete_unknown_id_is_noop_success() {
        let backend = InMemoryBackend::new();
        assert!(backend.delete_event("evt-9999").is_ok());
    }

    #[test]
    fn test_delete_removes_event() {
        let backend = InMemoryBackend::new();
        let event = create(&backend, "gone", at(9));
        backend.delete_event(&event.id).unwrap();

        let window = TimeRange::new(at(0), at(23)).unwrap();
        assert!(backend.list_events(&window).unwrap().is_empty());
        // Second delete of the same id is still success.
        assert!(backend.delete_event(&event.id).is_ok());
    }
}
