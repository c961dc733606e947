//! JSON-file event store.
//!
//! A [`CalendarBackend`] that persists events to a single JSON file,
//! so the CLI works end to end without a cloud calendar. Every call
//! reads the file fresh and writes it back after mutation — the file
//! is the system of record, matching the engine's no-cached-state
//! model.

use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use slotwise::{BackendError, CalendarBackend, Event, TimeRange};

#[derive(Debug, Clone)]
pub struct JsonStoreBackend {
    path: PathBuf,
}

/// On-disk layout. `next_id` survives deletions so ids are never
/// reused within one store.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    next_id: u64,
    events: Vec<Event>,
}

impl JsonStoreBackend {
    pub fn new(path: PathBuf) -> Self {
        JsonStoreBackend { path }
    }

    fn load(&self) -> Result<StoreFile, BackendError> {
        if !self.path.exists() {
            return Ok(StoreFile::default());
        }
        let raw = fs::read_to_string(&self.path)
            .map_err(|e| BackendError::Unavailable(format!("{}: {e}", self.path.display())))?;
        serde_json::from_str(&raw)
            .map_err(|e| BackendError::Protocol(format!("{}: {e}", self.path.display())))
    }

    fn save(&self, store: &StoreFile) -> Result<(), BackendError> {
        let raw = serde_json::to_string_pretty(store)
            .map_err(|e| BackendError::Protocol(e.to_string()))?;
        fs::write(&self.path, raw)
            .map_err(|e| BackendError::Unavailable(format!("{}: {e}", self.path.display())))
    }
}

impl CalendarBackend for JsonStoreBackend {
    fn create_event(
        &self,
        title: &str,
        range: TimeRange,
        attendees: BTreeSet<String>,
        source_text: &str,
    ) -> Result<Event, BackendError> {
        let mut store = self.load()?;
        store.next_id += 1;
        let event = Event {
            id: format!("evt-{:04}", store.next_id),
            title: title.to_string(),
            range,
            attendees,
            source_text: source_text.to_string(),
        };
        store.events.push(event.clone());
        self.save(&store)?;
        Ok(event)
    }

    fn list_events(&self, window: &TimeRange) -> Result<Vec<Event>, BackendError> {
        let mut events: Vec<Event> = self
            .load()?
            .events
            .into_iter()
            .filter(|e| e.range.conflicts_with(window))
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
        let mut store = self.load()?;
        let before = store.events.len();
        store.events.retain(|e| e.id != id);
        if store.events.len() != before {
            self.save(&store)?;
        }
        // Unknown id: already gone, success-with-no-op.
        Ok(())
    }

    fn notify_cancellation(&self, event: &Event) -> Result<(), BackendError> {
        // No mail transport behind a local file store; log and accept.
        tracing::info!(
            id = %event.id,
            attendees = event.attendees.len(),
            "cancellation notice (local store, not delivered)"
        );
        Ok(())
    }
}
