//! Error types for scheduling operations.
//!
//! The taxonomy separates permanent caller-input failures
//! ([`ParseError`], `SchedulerError::InvalidArgument`) from backend
//! I/O failures ([`BackendError`], which carries a retryability hint).
//! Legitimate empty results — no upcoming event, no free slot — are
//! not errors and never appear here.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// A scheduling instruction that could not be turned into a concrete
/// event draft. Always a caller input error; never retried.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("no time expression found in '{0}'")]
    NoTimeExpression(String),

    #[error("instruction '{0}' has no event title")]
    EmptyTitle(String),

    #[error("ambiguous start time in '{0}': found a date but no clock time")]
    AmbiguousStart(String),

    #[error("resolved start {start} is in the past (reference now: {now})")]
    StartInPast {
        start: DateTime<Utc>,
        now: DateTime<Utc>,
    },

    #[error("could not map '{0}' onto a valid local time")]
    InvalidLocalTime(String),

    #[error("time value in '{0}' is outside the representable range")]
    OutOfRange(String),
}

/// A failure reported by the calendar backend collaborator.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("backend request timed out: {0}")]
    Timeout(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("quota exhausted: {0}")]
    QuotaExhausted(String),

    #[error("backend protocol error: {0}")]
    Protocol(String),
}

impl BackendError {
    /// Whether the caller may reasonably retry the failed operation.
    ///
    /// Transient transport failures and quota windows are retryable;
    /// authentication and protocol errors are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BackendError::Unavailable(_)
                | BackendError::Timeout(_)
                | BackendError::QuotaExhausted(_)
        )
    }
}

/// Operation-level error for the scheduling engine.
#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
