use chrono::{Datelike, Duration, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Minutes since midnight — the only time-of-day type.
pub type Minutes = i32;

/// Format minutes-since-midnight as `HH:MM`.
pub fn format_minutes(m: Minutes) -> String {
    format!("{:02}:{:02}", m / 60, m % 60)
}

/// Half-open time-of-day interval `[start, end)`, minute resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSpan {
    pub start: Minutes,
    pub end: Minutes,
}

impl TimeSpan {
    pub fn new(start: Minutes, end: Minutes) -> Self {
        debug_assert!(start < end, "TimeSpan start must be before end");
        Self { start, end }
    }

    pub fn duration_min(&self) -> Minutes {
        self.end - self.start
    }

    /// True iff each span starts strictly before the other ends.
    /// Touching endpoints do not overlap.
    pub fn overlaps(&self, other: &TimeSpan) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains_instant(&self, t: Minutes) -> bool {
        self.start <= t && t < self.end
    }
}

/// One concrete occupancy instance: a calendar day plus a time window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub date: NaiveDate,
    pub span: TimeSpan,
}

impl Slot {
    pub fn new(date: NaiveDate, span: TimeSpan) -> Self {
        Self { date, span }
    }

    /// Deterministic identity derived from `(date, start, end)`. Two slots
    /// with the same date and times always share an id — this is an equality
    /// key for one booking interaction, not a storage key.
    pub fn id(&self) -> String {
        format!(
            "{}/{}-{}",
            self.date,
            format_minutes(self.span.start),
            format_minutes(self.span.end)
        )
    }
}

/// What a committed slot represents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExistingKind {
    /// Committed user booking.
    Booking { label: Option<String> },
    /// Fixed maintenance block — never user-editable.
    Maintenance,
}

/// A committed allocation pulled from the external store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingSlot {
    pub id: String,
    pub date: NaiveDate,
    pub span: TimeSpan,
    pub kind: ExistingKind,
}

impl ExistingSlot {
    pub fn is_maintenance(&self) -> bool {
        matches!(self.kind, ExistingKind::Maintenance)
    }
}

/// How a booking request expands into slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecurrenceKind {
    SingleDay,
    Week,
    Month,
    ActiveSession,
    Custom,
}

/// Weekday selector as the API layer sends it: a Sun-first 0–6 index or a
/// case-insensitive day name / abbreviation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WeekdaySelector {
    Index(u8),
    Name(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceSpec {
    pub kind: RecurrenceKind,
    /// Start of the range; ignored for `ActiveSession`, which anchors to today.
    pub anchor_date: NaiveDate,
    /// Shared `HH:MM` bounds for every generated slot.
    pub start: String,
    pub end: String,
    /// When non-empty, only matching weekdays are emitted.
    #[serde(default)]
    pub weekdays: Vec<WeekdaySelector>,
    /// Explicit range end, required for `Custom`.
    #[serde(default)]
    pub range_end_override: Option<NaiveDate>,
    /// Academic-session boundary: the range end for `ActiveSession`, an
    /// optional cutoff for the other kinds.
    #[serde(default)]
    pub session_end_date: Option<NaiveDate>,
    /// Clamp `SingleDay`/`Week`/`Month` ranges at `session_end_date`.
    #[serde(default = "default_true")]
    pub respect_session_end: bool,
}

fn default_true() -> bool {
    true
}

/// Explicit clock input. Nothing in this crate reads the wall clock on its
/// own; callers decide what "now" means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Now {
    pub date: NaiveDate,
    pub minute: Minutes,
}

impl Now {
    pub fn new(date: NaiveDate, minute: Minutes) -> Self {
        Self { date, minute }
    }

    /// Convenience for callers running on UTC wall-clock time.
    pub fn from_utc() -> Self {
        let now = Utc::now();
        Self {
            date: now.date_naive(),
            minute: (now.hour() * 60 + now.minute()) as Minutes,
        }
    }
}

/// Inclusive date range scoping occupant aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupancyWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl OccupancyWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        debug_assert!(start <= end, "window start must not be after end");
        Self { start, end }
    }

    /// The ISO week (Mon..Sun) containing `date`.
    pub fn iso_week_of(date: NaiveDate) -> Self {
        let monday = date - Duration::days(date.weekday().num_days_from_monday() as i64);
        Self {
            start: monday,
            end: monday + Duration::days(6),
        }
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Occupant row as the data-access collaborator returns it. Read-only here;
/// the aggregator only filters and reduces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupantRecord {
    pub occupant_id: String,
    pub display_name: String,
    pub scheduled_date: NaiveDate,
    /// `HH:MM`; absent or malformed times contribute no occupied minutes.
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn span_basics() {
        let s = TimeSpan::new(9 * 60, 10 * 60);
        assert_eq!(s.duration_min(), 60);
        assert!(s.contains_instant(9 * 60));
        assert!(s.contains_instant(10 * 60 - 1));
        assert!(!s.contains_instant(10 * 60)); // half-open
    }

    #[test]
    fn span_overlap_is_symmetric() {
        let a = TimeSpan::new(540, 560);
        let b = TimeSpan::new(555, 605);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }

    #[test]
    fn span_touching_does_not_overlap() {
        let a = TimeSpan::new(540, 555);
        let b = TimeSpan::new(555, 605);
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn format_minutes_pads() {
        assert_eq!(format_minutes(0), "00:00");
        assert_eq!(format_minutes(9 * 60 + 5), "09:05");
        assert_eq!(format_minutes(23 * 60 + 59), "23:59");
    }

    #[test]
    fn slot_id_encodes_date_and_times() {
        let slot = Slot::new(d("2025-09-05"), TimeSpan::new(9 * 60, 10 * 60));
        assert_eq!(slot.id(), "2025-09-05/09:00-10:00");
        // Identical date+times collide on id regardless of provenance.
        let twin = Slot::new(d("2025-09-05"), TimeSpan::new(9 * 60, 10 * 60));
        assert_eq!(slot.id(), twin.id());
    }

    #[test]
    fn iso_week_spans_monday_to_sunday() {
        // 2025-09-04 is a Thursday.
        let w = OccupancyWindow::iso_week_of(d("2025-09-04"));
        assert_eq!(w.start, d("2025-09-01"));
        assert_eq!(w.end, d("2025-09-07"));
        assert_eq!(w.days(), 7);
    }

    #[test]
    fn window_contains_is_inclusive() {
        let w = OccupancyWindow::new(d("2025-09-01"), d("2025-09-07"));
        assert!(w.contains(d("2025-09-01")));
        assert!(w.contains(d("2025-09-07")));
        assert!(!w.contains(d("2025-09-08")));
        assert!(!w.contains(d("2025-08-31")));
    }

    #[test]
    fn recurrence_spec_deserializes_from_api_shape() {
        let spec: RecurrenceSpec = serde_json::from_str(
            r#"{
                "kind": "active-session",
                "anchor_date": "2025-09-01",
                "start": "09:00",
                "end": "10:30",
                "weekdays": [1, "fri"],
                "session_end_date": "2025-12-19"
            }"#,
        )
        .unwrap();
        assert_eq!(spec.kind, RecurrenceKind::ActiveSession);
        assert_eq!(spec.weekdays.len(), 2);
        assert_eq!(spec.weekdays[0], WeekdaySelector::Index(1));
        assert_eq!(spec.weekdays[1], WeekdaySelector::Name("fri".into()));
        assert!(spec.respect_session_end); // defaulted
        assert_eq!(spec.range_end_override, None);
    }

    #[test]
    fn existing_slot_kind_roundtrips_through_json() {
        let slot = ExistingSlot {
            id: "m-17".into(),
            date: d("2025-09-05"),
            span: TimeSpan::new(13 * 60, 14 * 60),
            kind: ExistingKind::Maintenance,
        };
        let json = serde_json::to_string(&slot).unwrap();
        let back: ExistingSlot = serde_json::from_str(&json).unwrap();
        assert!(back.is_maintenance());
        assert_eq!(back, slot);
    }
}
