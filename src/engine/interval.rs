use chrono::{NaiveTime, Timelike};

use crate::model::{Minutes, TimeSpan};

use super::EngineError;

/// Parse a `HH:MM` 24-hour time of day into minutes since midnight.
pub fn to_minutes(s: &str) -> Result<Minutes, EngineError> {
    let t = NaiveTime::parse_from_str(s, "%H:%M")
        .map_err(|_| EngineError::Format(s.to_string()))?;
    Ok((t.hour() * 60 + t.minute()) as Minutes)
}

/// Merge sorted overlapping/adjacent spans into disjoint spans.
pub fn merge_overlapping(sorted: &[TimeSpan]) -> Vec<TimeSpan> {
    let mut merged: Vec<TimeSpan> = Vec::new();
    for &span in sorted {
        if let Some(last) = merged.last_mut()
            && span.start <= last.end
        {
            last.end = last.end.max(span.end);
            continue;
        }
        merged.push(span);
    }
    merged
}

/// Maximal free sub-intervals of `work` not covered by `occupied`.
///
/// `floor` raises the lower bound — used to exclude time already past on the
/// current day. Occupied spans are sorted and merged first, so callers may
/// pass them unsorted or mutually overlapping.
pub fn free_windows(
    work: TimeSpan,
    occupied: &[TimeSpan],
    floor: Option<Minutes>,
) -> Vec<TimeSpan> {
    let mut busy = occupied.to_vec();
    busy.sort_by_key(|s| s.start);
    let busy = merge_overlapping(&busy);

    let mut cursor = work.start;
    if let Some(f) = floor {
        cursor = cursor.max(f);
    }

    let mut free = Vec::new();
    for b in &busy {
        if b.end <= cursor {
            continue;
        }
        let open_end = b.start.min(work.end);
        if cursor < open_end {
            free.push(TimeSpan::new(cursor, open_end));
        }
        cursor = cursor.max(b.end);
        if cursor >= work.end {
            return free;
        }
    }
    if cursor < work.end {
        free.push(TimeSpan::new(cursor, work.end));
    }
    free
}
