use chrono::NaiveDate;

use crate::model::{ExistingSlot, Slot, TimeSpan};

/// Candidates that overlap at least one existing slot on the same date.
///
/// First-match short-circuit per candidate — downstream only needs
/// membership, not the colliding record. Candidate order is preserved.
/// Pure; O(candidates × existing-on-same-date).
pub fn detect_conflicts(candidates: &[Slot], existing: &[ExistingSlot]) -> Vec<Slot> {
    candidates
        .iter()
        .filter(|c| first_overlap(c.date, &c.span, existing).is_some())
        .cloned()
        .collect()
}

/// First existing slot on `date` whose span overlaps `span`.
pub fn first_overlap<'a>(
    date: NaiveDate,
    span: &TimeSpan,
    existing: &'a [ExistingSlot],
) -> Option<&'a ExistingSlot> {
    existing
        .iter()
        .find(|e| e.date == date && e.span.overlaps(span))
}

/// True when any overlapping slot on `date` is a maintenance block.
pub fn touches_maintenance(date: NaiveDate, span: &TimeSpan, existing: &[ExistingSlot]) -> bool {
    existing
        .iter()
        .any(|e| e.is_maintenance() && e.date == date && e.span.overlaps(span))
}
