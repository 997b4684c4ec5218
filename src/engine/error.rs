use chrono::NaiveDate;

use crate::model::{Minutes, format_minutes};

/// Caller-input defects raised at construction/generation time. None of
/// these are transient; nothing in the crate retries them.
#[derive(Debug)]
pub enum EngineError {
    /// Malformed `HH:MM` time-of-day string.
    Format(String),
    /// Slot end does not fall strictly after its start.
    InvalidTimeRange { start: Minutes, end: Minutes },
    /// Resolved range end precedes its start.
    InvalidRange { start: NaiveDate, end: NaiveDate },
    /// `ActiveSession` recurrence without a session end date.
    MissingSessionBound,
    /// `Custom` recurrence without an explicit range end.
    MissingCustomEnd,
    /// Selector that names no weekday.
    UnknownWeekday(String),
    /// Resolution session addressed with a slot id it does not hold.
    UnknownSlot(String),
    LimitExceeded(&'static str),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::Format(s) => write!(f, "malformed time of day: {s:?}"),
            EngineError::InvalidTimeRange { start, end } => write!(
                f,
                "end {} must fall after start {}",
                format_minutes(*end),
                format_minutes(*start)
            ),
            EngineError::InvalidRange { start, end } => {
                write!(f, "range end {end} precedes start {start}")
            }
            EngineError::MissingSessionBound => {
                write!(f, "active-session recurrence requires a session end date")
            }
            EngineError::MissingCustomEnd => {
                write!(f, "custom recurrence requires an explicit range end")
            }
            EngineError::UnknownWeekday(s) => write!(f, "unknown weekday: {s:?}"),
            EngineError::UnknownSlot(id) => write!(f, "no slot in session with id: {id}"),
            EngineError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}
