use ulid::Ulid;

use crate::model::*;

use super::conflict::validate_candidate;
use super::filter::TrackFilter;
use super::{Engine, EngineError, SlotError};

impl Engine {
    pub async fn get_track_info(&self, id: Ulid) -> Result<TrackInfo, EngineError> {
        let guard = self.read_track(id).await?;
        Ok(TrackInfo {
            id: guard.id,
            name: guard.name.clone(),
            hours: guard.slots.clone(),
        })
    }

    /// Current hours of a track, in canonical order.
    pub async fn get_hours(&self, track_id: Ulid) -> Result<Vec<AvailabilitySlot>, EngineError> {
        let guard = self.read_track(track_id).await?;
        Ok(guard.slots.clone())
    }

    /// Dry run of `add_slot`: the verdict the track's current hours give
    /// `slot`, without changing anything.
    pub async fn check_slot(&self, track_id: Ulid, slot: &AvailabilitySlot) -> Result<Result<(), SlotError>, EngineError> {
        let guard = self.read_track(track_id).await?;
        Ok(validate_candidate(slot, &guard.slots))
    }

    pub async fn list_tracks(&self) -> Vec<TrackInfo> {
        self.search_tracks(&TrackFilter::default()).await
    }

    /// Tracks whose hours match `filter`, ordered by id.
    pub async fn search_tracks(&self, filter: &TrackFilter) -> Vec<TrackInfo> {
        let tracks: Vec<_> = self.state.iter().map(|e| e.value().clone()).collect();
        let mut out = Vec::new();
        for ts in tracks {
            let guard = ts.read().await;
            if !guard.deleted && filter.matches(&guard.slots) {
                out.push(TrackInfo {
                    id: guard.id,
                    name: guard.name.clone(),
                    hours: guard.slots.clone(),
                });
            }
        }
        out.sort_by_key(|t| t.id);
        out
    }
}
