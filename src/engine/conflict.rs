use crate::model::*;

use super::availability::{first_conflict, insert_sorted, to_minutes};
use super::SlotError;

/// Decide whether `candidate` may join `existing`. Pure; the caller inserts
/// on success.
///
/// Checks run in order and the first failure wins: same-day time order, then
/// overlap against every existing slot.
pub fn validate_candidate(candidate: &AvailabilitySlot, existing: &[AvailabilitySlot]) -> Result<(), SlotError> {
    if candidate.is_single_day() && to_minutes(candidate.open_time) >= to_minutes(candidate.close_time) {
        return Err(SlotError::InvalidTimeOrder);
    }
    if let Some(index) = first_conflict(candidate, existing) {
        return Err(SlotError::OverlapConflict { index });
    }
    Ok(())
}

/// Build a canonical collection from `slots`, validating each against those
/// accepted before it. Fails with the input position of the first bad slot.
pub fn build_collection(slots: &[AvailabilitySlot]) -> Result<Vec<AvailabilitySlot>, (usize, SlotError)> {
    let mut out: Vec<AvailabilitySlot> = Vec::with_capacity(slots.len());
    for (position, slot) in slots.iter().enumerate() {
        validate_candidate(slot, &out).map_err(|e| (position, e))?;
        out = insert_sorted(*slot, &out);
    }
    Ok(out)
}
