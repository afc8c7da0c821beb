use crate::model::*;

use super::days::DaySet;

/// Minutes since midnight, `0..=1439`.
pub type Minutes = u16;

pub fn to_minutes(time: TimeOfDay) -> Minutes {
    time.hour() as Minutes * 60 + time.minute() as Minutes
}

/// Open/close pair of a slot, in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinuteSpan {
    pub open: Minutes,
    pub close: Minutes,
}

impl MinuteSpan {
    pub fn new(open: Minutes, close: Minutes) -> Self {
        Self { open, close }
    }

    pub fn of(slot: &AvailabilitySlot) -> Self {
        Self::new(to_minutes(slot.open_time), to_minutes(slot.close_time))
    }

    /// Crosses midnight.
    pub fn is_overnight(&self) -> bool {
        self.close < self.open
    }
}

// ── Overlap Algorithm ────────────────────────────────────────────

/// Time-of-day overlap between two slots, ignoring days.
///
/// Plain spans use the half-open test, so touching boundaries do not overlap.
/// When either side is overnight the test compares boundaries with `<=`:
/// the overnight span occupies both the end of the day and the start of the
/// next, so reaching either edge counts.
pub fn intervals_overlap(a: MinuteSpan, b: MinuteSpan) -> bool {
    match (a.is_overnight(), b.is_overnight()) {
        (false, false) => a.open < b.close && b.open < a.close,
        (true, false) => b.open <= a.close || a.open <= b.close,
        (false, true) => a.open <= b.close || b.open <= a.close,
        (true, true) => a.open <= b.close || b.open <= a.close,
    }
}

/// Index of the first existing slot that shares a day with `candidate` and
/// overlaps it in time.
pub fn first_conflict(candidate: &AvailabilitySlot, existing: &[AvailabilitySlot]) -> Option<usize> {
    let days = DaySet::range(candidate.start_day, candidate.end_day);
    let span = MinuteSpan::of(candidate);
    existing.iter().position(|slot| {
        DaySet::range(slot.start_day, slot.end_day).intersects(&days)
            && intervals_overlap(span, MinuteSpan::of(slot))
    })
}

pub fn has_overlap(candidate: &AvailabilitySlot, existing: &[AvailabilitySlot]) -> bool {
    first_conflict(candidate, existing).is_some()
}

// ── Collection ordering ──────────────────────────────────────────

/// Canonical order: start-day index, then open time.
pub fn canonical_key(slot: &AvailabilitySlot) -> (usize, Minutes) {
    (slot.start_day.index(), to_minutes(slot.open_time))
}

/// Append `candidate` and return the collection in canonical order.
/// Stable: ties keep input order, so the candidate lands after equal keys.
///
/// Does not validate; callers run `validate_candidate` first.
pub fn insert_sorted(candidate: AvailabilitySlot, existing: &[AvailabilitySlot]) -> Vec<AvailabilitySlot> {
    let mut slots = Vec::with_capacity(existing.len() + 1);
    slots.extend_from_slice(existing);
    slots.push(candidate);
    slots.sort_by_key(canonical_key);
    slots
}

/// Copy of `existing` without the element at `index`; `None` if out of range.
pub fn remove_at(index: usize, existing: &[AvailabilitySlot]) -> Option<Vec<AvailabilitySlot>> {
    if index >= existing.len() {
        return None;
    }
    let mut slots = existing.to_vec();
    slots.remove(index);
    Some(slots)
}
