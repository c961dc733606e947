//! # slotwise
//!
//! Natural-language calendar scheduling for conversational agents.
//!
//! The engine turns instructions like "Team meeting tomorrow at 2pm"
//! into concrete events, computes free/busy state, and makes "next
//! meeting", "cancel next meeting", and "free slots today" well-defined
//! operations. All temporal resolution takes an explicit reference
//! "now", so every operation is deterministic and testable without
//! touching the system clock. Events are persisted by a pluggable
//! [`CalendarBackend`] — the engine itself holds no state between
//! calls.
//!
//! ## Modules
//!
//! - [`model`] — `TimeRange`, `Event`, `FreeSlot`, `SchedulingRequest`
//! - [`parser`] — instruction text → structured event draft
//! - [`freebusy`] — free-slot computation over a day's events
//! - [`engine`] — the `Scheduler` orchestrator (quick-add, next, cancel-next, free-today)
//! - [`backend`] — the backend collaborator trait and an in-memory implementation
//! - [`error`] — error types
//!
//! ## Example
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use slotwise::{InMemoryBackend, Scheduler};
//!
//! let scheduler = Scheduler::new(InMemoryBackend::new(), chrono_tz::UTC);
//! let now = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
//!
//! let event = scheduler.quick_add("Team meeting tomorrow at 2pm", now).unwrap();
//! assert_eq!(event.title, "Team meeting");
//!
//! let next = scheduler.next(now).unwrap().unwrap();
//! assert_eq!(next.id, event.id);
//! ```

pub mod backend;
pub mod engine;
pub mod error;
pub mod freebusy;
pub mod model;
pub mod parser;

pub use backend::{CalendarBackend, InMemoryBackend};
pub use engine::{CancelOutcome, Scheduler};
pub use error::{BackendError, ParseError, SchedulerError};
pub use freebusy::free_slots;
pub use model::{Confidence, Event, FreeSlot, SchedulingRequest, TimeRange};
pub use parser::{parse, DEFAULT_EVENT_DURATION_MINUTES};
