//! The scheduling engine orchestrator.
//!
//! [`Scheduler`] composes the parser, the free/busy calculator, and a
//! [`CalendarBackend`] into the four caller-facing operations:
//! `quick_add`, `next`, `cancel_next`, and `free_today` (plus the
//! read-only `events_today` accessor). The engine holds no state
//! between calls — every operation re-fetches what it needs from the
//! backend, trading a little latency for immunity to staleness.
//!
//! Every operation takes an explicit `now` anchor, keeping the engine
//! deterministic under test; production callers pass `Utc::now()`.

use chrono::{DateTime, Duration, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::backend::CalendarBackend;
use crate::error::{ParseError, Result, SchedulerError};
use crate::freebusy;
use crate::model::{Confidence, Event, FreeSlot, TimeRange};
use crate::parser;

/// The outcome of a `cancel_next` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CancelOutcome {
    /// The next upcoming event was deleted. `warning` carries a
    /// secondary failure (attendee notification) that did not roll
    /// back the cancellation.
    Cancelled {
        event: Event,
        warning: Option<String>,
    },
    /// Nothing upcoming to cancel. A legitimate result, not an error.
    NoUpcoming,
}

/// The calendar scheduling engine.
pub struct Scheduler<B> {
    backend: B,
    tz: Tz,
}

impl<B: CalendarBackend> Scheduler<B> {
    /// Build an engine over `backend`, interpreting local dates and
    /// day bounds in `tz`.
    pub fn new(backend: B, tz: Tz) -> Self {
        Scheduler { backend, tz }
    }

    /// Parse a natural-language instruction and create the event.
    ///
    /// Parse failures are caller input errors and are never retried.
    /// A draft whose start is only date-precise is rejected rather
    /// than guessed at. Conflicts with existing events are *not*
    /// checked: double-booking is permitted by design, matching
    /// common calendar semantics.
    pub fn quick_add(&self, text: &str, now: DateTime<Utc>) -> Result<Event> {
        let request = parser::parse(text, now, self.tz)?;
        if request.confidence != Confidence::Exact {
            return Err(ParseError::AmbiguousStart(text.to_string()).into());
        }

        let event = self.backend.create_event(
            &request.title,
            request.proposed_range,
            request.attendees,
            text,
        )?;
        tracing::debug!(id = %event.id, title = %event.title, "created event");
        Ok(event)
    }

    /// The earliest event starting strictly after `now`, or `None`
    /// when the calendar has nothing upcoming.
    ///
    /// Simultaneous starts are broken by lexicographically smallest
    /// id, so repeated calls agree.
    pub fn next(&self, now: DateTime<Utc>) -> Result<Option<Event>> {
        // The window runs to the end of representable time, so nothing
        // upcoming is ever outside it.
        let window = TimeRange::new(now, DateTime::<Utc>::MAX_UTC)?;
        let upcoming = self
            .backend
            .list_events(&window)?
            .into_iter()
            .filter(|e| e.range.start() > now)
            .min_by(|a, b| {
                a.range
                    .start()
                    .cmp(&b.range.start())
                    .then_with(|| a.id.cmp(&b.id))
            });
        Ok(upcoming)
    }

    /// Cancel the next upcoming event: resolve, delete, then (when
    /// `notify` is set) attempt a best-effort attendee notification.
    ///
    /// The three sub-steps run in that order. A notification failure
    /// is reported as a warning on the successful outcome, never as a
    /// primary error. Calling twice in succession yields
    /// [`CancelOutcome::NoUpcoming`] the second time — a stale delete
    /// of an id that is already gone is a backend-level no-op.
    pub fn cancel_next(&self, notify: bool, now: DateTime<Utc>) -> Result<CancelOutcome> {
        let Some(event) = self.next(now)? else {
            return Ok(CancelOutcome::NoUpcoming);
        };

        self.backend.delete_event(&event.id)?;
        tracing::debug!(id = %event.id, title = %event.title, "cancelled event");

        let warning = if notify {
            self.backend.notify_cancellation(&event).err().map(|e| {
                tracing::warn!(id = %event.id, error = %e, "attendee notification failed");
                format!("event cancelled, but attendee notification failed: {e}")
            })
        } else {
            None
        };

        Ok(CancelOutcome::Cancelled { event, warning })
    }

    /// Free slots of at least `min_duration` between local midnight
    /// and the following midnight around `now`.
    ///
    /// An empty result means a fully booked day. A non-positive
    /// `min_duration` is a caller input error.
    pub fn free_today(&self, min_duration: Duration, now: DateTime<Utc>) -> Result<Vec<FreeSlot>> {
        if min_duration <= Duration::zero() {
            return Err(SchedulerError::InvalidArgument(format!(
                "min_duration must be positive, got {min_duration}"
            )));
        }
        let bounds = self.day_bounds(now)?;
        let events = self.backend.list_events(&bounds)?;
        Ok(freebusy::free_slots(&events, &bounds, min_duration))
    }

    /// Today's events in ascending order — the same fetch `free_today`
    /// consumes, exposed read-only.
    pub fn events_today(&self, now: DateTime<Utc>) -> Result<Vec<Event>> {
        let bounds = self.day_bounds(now)?;
        Ok(self.backend.list_events(&bounds)?)
    }

    /// Local midnight-to-midnight around `now`, mapped to UTC.
    fn day_bounds(&self, now: DateTime<Utc>) -> Result<TimeRange> {
        let date = now.with_timezone(&self.tz).date_naive();
        let start = self.local_midnight(date)?;
        let end = self.local_midnight(date.succ_opt().ok_or_else(|| {
            SchedulerError::InvalidArgument("date out of range".to_string())
        })?)?;
        TimeRange::new(start, end)
    }

    fn local_midnight(&self, date: chrono::NaiveDate) -> Result<DateTime<Utc>> {
        let naive = date.and_hms_opt(0, 0, 0).ok_or_else(|| {
            SchedulerError::InvalidArgument("date out of range".to_string())
        })?;
        // earliest() picks the first instant when a DST fold makes
        // midnight ambiguous; a nonexistent midnight is unresolvable.
        self.tz
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| {
                SchedulerError::InvalidArgument(format!(
                    "local midnight does not exist on {date} in {}",
                    self.tz
                ))
            })
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
