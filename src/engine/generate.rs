use chrono::{Datelike, Duration, Months, NaiveDate, Weekday};

use crate::limits::MAX_RANGE_DAYS;
use crate::model::{RecurrenceKind, RecurrenceSpec, Slot, TimeSpan, WeekdaySelector};

use super::EngineError;
use super::interval::to_minutes;

/// Expand a recurrence spec into a date-ascending sequence of slots, every
/// slot carrying the spec's `start`/`end` times.
///
/// Pure with respect to the clock: `today` is an explicit input, consulted
/// only by `ActiveSession` anchoring.
pub fn generate(spec: &RecurrenceSpec, today: NaiveDate) -> Result<Vec<Slot>, EngineError> {
    let start = to_minutes(&spec.start)?;
    let end = to_minutes(&spec.end)?;
    if end <= start {
        return Err(EngineError::InvalidTimeRange { start, end });
    }
    let span = TimeSpan::new(start, end);

    let (range_start, range_end) = resolve_range(spec, today)?;
    if range_end < range_start {
        // A session that already ended is an empty result, not a caller error.
        if spec.kind == RecurrenceKind::ActiveSession {
            return Ok(Vec::new());
        }
        return Err(EngineError::InvalidRange {
            start: range_start,
            end: range_end,
        });
    }
    if (range_end - range_start).num_days() >= MAX_RANGE_DAYS {
        return Err(EngineError::LimitExceeded("recurrence range too wide"));
    }

    let mut slots = if spec.weekdays.is_empty() {
        every_day(range_start, range_end, span)
    } else {
        selected_weekdays(&spec.weekdays, range_start, range_end, span)?
    };
    slots.sort_by_key(|s| s.date);
    Ok(slots)
}

/// Resolve the inclusive `(range_start, range_end)` date pair for a spec.
/// Only `SingleDay`/`Week`/`Month` are subject to the session-end clamp.
fn resolve_range(
    spec: &RecurrenceSpec,
    today: NaiveDate,
) -> Result<(NaiveDate, NaiveDate), EngineError> {
    let (start, mut end, clampable) = match spec.kind {
        RecurrenceKind::SingleDay => (spec.anchor_date, spec.anchor_date, true),
        RecurrenceKind::Week => (spec.anchor_date, spec.anchor_date + Duration::days(6), true),
        RecurrenceKind::Month => {
            let next = spec
                .anchor_date
                .checked_add_months(Months::new(1))
                .ok_or(EngineError::LimitExceeded("anchor date out of range"))?;
            (spec.anchor_date, next - Duration::days(1), true)
        }
        RecurrenceKind::ActiveSession => {
            let end = spec
                .session_end_date
                .ok_or(EngineError::MissingSessionBound)?;
            (today, end, false)
        }
        RecurrenceKind::Custom => {
            let end = spec
                .range_end_override
                .ok_or(EngineError::MissingCustomEnd)?;
            (spec.anchor_date, end, false)
        }
    };
    if clampable
        && spec.respect_session_end
        && let Some(cutoff) = spec.session_end_date
        && cutoff < end
    {
        end = cutoff;
    }
    Ok((start, end))
}

fn every_day(start: NaiveDate, end: NaiveDate, span: TimeSpan) -> Vec<Slot> {
    let mut slots = Vec::new();
    let mut date = start;
    while date <= end {
        slots.push(Slot::new(date, span));
        date += Duration::days(1);
    }
    slots
}

/// One stream per selected weekday: first occurrence on/after the range
/// start, then 7-day steps until the range end. Streams are merged and the
/// caller sorts; duplicate selectors collapse to one stream.
fn selected_weekdays(
    selectors: &[WeekdaySelector],
    start: NaiveDate,
    end: NaiveDate,
    span: TimeSpan,
) -> Result<Vec<Slot>, EngineError> {
    let mut days: Vec<Weekday> = Vec::with_capacity(selectors.len());
    for sel in selectors {
        let day = resolve_weekday(sel)?;
        if !days.contains(&day) {
            days.push(day);
        }
    }

    let mut slots = Vec::new();
    for day in days {
        let mut date = first_on_or_after(start, day);
        while date <= end {
            slots.push(Slot::new(date, span));
            date += Duration::days(7);
        }
    }
    Ok(slots)
}

/// First occurrence of `day` on or after `from`.
fn first_on_or_after(from: NaiveDate, day: Weekday) -> NaiveDate {
    let ahead = (7 + day.num_days_from_monday() as i64
        - from.weekday().num_days_from_monday() as i64)
        % 7;
    from + Duration::days(ahead)
}

fn resolve_weekday(sel: &WeekdaySelector) -> Result<Weekday, EngineError> {
    match sel {
        // Sun-first indexing, as the API layer sends it.
        WeekdaySelector::Index(n) => match *n {
            0 => Ok(Weekday::Sun),
            1 => Ok(Weekday::Mon),
            2 => Ok(Weekday::Tue),
            3 => Ok(Weekday::Wed),
            4 => Ok(Weekday::Thu),
            5 => Ok(Weekday::Fri),
            6 => Ok(Weekday::Sat),
            _ => Err(EngineError::UnknownWeekday(n.to_string())),
        },
        WeekdaySelector::Name(name) => {
            parse_weekday_name(name).ok_or_else(|| EngineError::UnknownWeekday(name.clone()))
        }
    }
}

/// Full names and common abbreviations, case-insensitive.
fn parse_weekday_name(name: &str) -> Option<Weekday> {
    match name.to_ascii_lowercase().as_str() {
        "sunday" | "sun" => Some(Weekday::Sun),
        "monday" | "mon" => Some(Weekday::Mon),
        "tuesday" | "tue" | "tues" => Some(Weekday::Tue),
        "wednesday" | "wed" => Some(Weekday::Wed),
        "thursday" | "thu" | "thur" | "thurs" => Some(Weekday::Thu),
        "friday" | "fri" => Some(Weekday::Fri),
        "saturday" | "sat" => Some(Weekday::Sat),
        _ => None,
    }
}
