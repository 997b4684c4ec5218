//! Input bounds and fixed operating constants.

use crate::model::TimeSpan;

/// Working day used for free-window computation: 09:00–18:00.
pub const WORK_DAY: TimeSpan = TimeSpan {
    start: 9 * 60,
    end: 18 * 60,
};

/// Widest date range a single recurrence may expand to.
pub const MAX_RANGE_DAYS: i64 = 400;

/// External fetches in flight per batch in the bulk occupancy path.
pub const DEFAULT_FETCH_BATCH: usize = 6;

/// Per-fetch deadline for the data-access collaborator, in milliseconds.
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 10_000;
