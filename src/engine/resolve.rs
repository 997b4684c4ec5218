use chrono::{Duration, NaiveDate};

use crate::limits::WORK_DAY;
use crate::model::{ExistingSlot, Now, Slot, TimeSpan};

use super::EngineError;
use super::conflict::{first_overlap, touches_maintenance};
use super::interval::{free_windows, to_minutes};

/// Which end of a slot `set_time` overwrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeField {
    Start,
    End,
}

/// Aggregate session state, derived from the entry list. Re-enterable:
/// any edit can move `AllResolved` back to `Open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Open,
    AllResolved,
}

/// Per-slot view the UI renders: the current slot plus derived flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionState {
    pub slot: Slot,
    pub invalid: bool,
    /// Overlaps a maintenance block. Rendered with emphasis; carries no
    /// extra validation weight.
    pub touches_maintenance: bool,
}

/// Resolved/unresolved partition of the working set at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionSummary {
    pub resolved: Vec<Slot>,
    pub unresolved: Vec<Slot>,
}

/// Interactive workflow over one booking attempt's conflicting slots.
///
/// Owns a mutable copy of the conflicts; validity is re-derived after every
/// mutation, never stored independently. Exclusively owned by one caller's
/// interaction scope — a fresh booking attempt needs a fresh session.
pub struct ResolutionSession {
    entries: Vec<ResolutionState>,
    original: Vec<Slot>,
    existing: Vec<ExistingSlot>,
    now: Now,
}

impl ResolutionSession {
    pub fn new(conflicts: Vec<Slot>, existing: Vec<ExistingSlot>, now: Now) -> Self {
        let original = conflicts.clone();
        let entries = conflicts
            .into_iter()
            .map(|slot| ResolutionState {
                slot,
                invalid: false,
                touches_maintenance: false,
            })
            .collect();
        let mut session = Self {
            entries,
            original,
            existing,
            now,
        };
        session.revalidate_all();
        session
    }

    /// Move one slot by whole days. `delta_days` may be negative.
    /// The slot's id changes with its date; address it by the new id after.
    pub fn shift_date(&mut self, slot_id: &str, delta_days: i64) -> Result<(), EngineError> {
        let idx = self.index_of(slot_id)?;
        self.entries[idx].slot.date += Duration::days(delta_days);
        self.revalidate_all();
        Ok(())
    }

    /// Overwrite one slot's start or end with an `HH:MM` value. A malformed
    /// value fails without touching the entry.
    pub fn set_time(
        &mut self,
        slot_id: &str,
        field: TimeField,
        value: &str,
    ) -> Result<(), EngineError> {
        let idx = self.index_of(slot_id)?;
        let minute = to_minutes(value)?;
        match field {
            TimeField::Start => self.entries[idx].slot.span.start = minute,
            TimeField::End => self.entries[idx].slot.span.end = minute,
        }
        self.revalidate_all();
        Ok(())
    }

    pub fn state(&self) -> SessionState {
        if self.entries.iter().any(|e| e.invalid) {
            SessionState::Open
        } else {
            SessionState::AllResolved
        }
    }

    pub fn entries(&self) -> &[ResolutionState] {
        &self.entries
    }

    /// Fresh resolved/unresolved partition; recomputed per call, not stored.
    pub fn summary(&self) -> ResolutionSummary {
        let mut resolved = Vec::new();
        let mut unresolved = Vec::new();
        for e in &self.entries {
            if e.invalid {
                unresolved.push(e.slot.clone());
            } else {
                resolved.push(e.slot.clone());
            }
        }
        ResolutionSummary {
            resolved,
            unresolved,
        }
    }

    /// Free windows on `date` against the existing allocations, within the
    /// standard working day. Today is floored at the current minute; a date
    /// strictly in the past has no free time.
    pub fn available_windows(&self, date: NaiveDate) -> Vec<TimeSpan> {
        if date < self.now.date {
            return Vec::new();
        }
        let occupied: Vec<TimeSpan> = self
            .existing
            .iter()
            .filter(|e| e.date == date)
            .map(|e| e.span)
            .collect();
        let floor = (date == self.now.date).then_some(self.now.minute);
        free_windows(WORK_DAY, &occupied, floor)
    }

    /// Terminal: commit only the entries that currently validate; unresolved
    /// entries are discarded.
    pub fn accept_resolved(self) -> Vec<Slot> {
        self.entries
            .into_iter()
            .filter(|e| !e.invalid)
            .map(|e| e.slot)
            .collect()
    }

    /// Terminal: the caller accepts the risk. Returns the original
    /// conflicting set, untouched by any edits made in this session.
    pub fn proceed_anyway(self) -> Vec<Slot> {
        self.original
    }

    fn index_of(&self, slot_id: &str) -> Result<usize, EngineError> {
        self.entries
            .iter()
            .position(|e| e.slot.id() == slot_id)
            .ok_or_else(|| EngineError::UnknownSlot(slot_id.to_string()))
    }

    /// Re-derive every entry's flags. Validity is a projection of the
    /// current slots against the clock and the existing allocations.
    fn revalidate_all(&mut self) {
        let now = self.now;
        let existing = &self.existing;
        for entry in &mut self.entries {
            let slot = &entry.slot;
            let bad_time = slot.span.end <= slot.span.start;
            let in_past = slot.date < now.date
                || (slot.date == now.date && slot.span.start <= now.minute);
            let collides = first_overlap(slot.date, &slot.span, existing).is_some();
            entry.invalid = bad_time || in_past || collides;
            entry.touches_maintenance = touches_maintenance(slot.date, &slot.span, existing);
        }
    }
}
