use crate::model::*;

use super::availability::{intervals_overlap, to_minutes, MinuteSpan};
use super::days::DaySet;

/// Day criterion of a track search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayQuery {
    /// Open on at least one of these days.
    Days(DaySet),
    /// `from` and `to` each appear somewhere in the track's hours. The two
    /// endpoints are checked independently, not as a range intersection.
    Range { from: Weekday, to: Weekday },
}

/// Union of the expanded day ranges of every slot.
pub fn covered_days(slots: &[AvailabilitySlot]) -> DaySet {
    slots
        .iter()
        .fold(DaySet::EMPTY, |acc, s| acc.union(&DaySet::range(s.start_day, s.end_day)))
}

pub fn matches_days(slots: &[AvailabilitySlot], query: &DayQuery) -> bool {
    let covered = covered_days(slots);
    match query {
        DayQuery::Days(days) => covered.intersects(days),
        DayQuery::Range { from, to } => covered.contains(*from) && covered.contains(*to),
    }
}

/// Any slot whose hours overlap `[open, close)`, using the same overlap rule
/// as slot validation.
pub fn matches_window(slots: &[AvailabilitySlot], open: TimeOfDay, close: TimeOfDay) -> bool {
    let window = MinuteSpan::new(to_minutes(open), to_minutes(close));
    slots
        .iter()
        .any(|s| intervals_overlap(MinuteSpan::of(s), window))
}

/// Search filter over fetched tracks. Empty filter matches everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrackFilter {
    pub days: Option<DayQuery>,
    pub window: Option<(TimeOfDay, TimeOfDay)>,
}

impl TrackFilter {
    pub fn is_empty(&self) -> bool {
        self.days.is_none() && self.window.is_none()
    }

    pub fn matches(&self, slots: &[AvailabilitySlot]) -> bool {
        if let Some(query) = &self.days
            && !matches_days(slots, query)
        {
            return false;
        }
        if let Some((open, close)) = self.window
            && !matches_window(slots, open, close)
        {
            return false;
        }
        true
    }
}
