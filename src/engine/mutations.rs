use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use tokio::sync::{oneshot, RwLock};
use ulid::Ulid;

use crate::limits::*;
use crate::model::*;
use crate::observability;

use super::availability::canonical_key;
use super::conflict::{build_collection, validate_candidate};
use super::{Engine, EngineError, SharedTrackState, SlotError, WalCommand};

fn check_name(name: &Option<String>) -> Result<(), EngineError> {
    if let Some(n) = name
        && n.len() > MAX_NAME_LEN
    {
        return Err(EngineError::LimitExceeded("track name too long"));
    }
    Ok(())
}

fn record_rejection(track_id: Ulid, error: &SlotError) {
    let reason = match error {
        SlotError::InvalidTimeOrder => "invalid_time_order",
        SlotError::OverlapConflict { .. } => "overlap_conflict",
    };
    metrics::counter!(observability::SLOTS_REJECTED_TOTAL, "reason" => reason).increment(1);
    tracing::debug!("track {track_id}: slot rejected ({reason})");
}

impl Engine {
    pub async fn create_track(&self, id: Ulid, name: Option<String>) -> Result<(), EngineError> {
        let _gate = self.compaction_gate.read().await;
        check_name(&name)?;

        // Reserve the id before the WAL append. Lookups of `id` wait on the
        // held lock until the create is durable or abandoned.
        let ts = Arc::new(RwLock::new(TrackState::new(id, name.clone())));
        let mut guard = ts.clone().write_owned().await;
        match self.state.entry(id) {
            Entry::Occupied(_) => return Err(EngineError::AlreadyExists(id)),
            Entry::Vacant(vacant) => {
                vacant.insert(ts.clone());
            }
        }
        if self.state.len() > MAX_TRACKS {
            self.abandon_create(id, &ts, &mut guard);
            return Err(EngineError::LimitExceeded("too many tracks"));
        }

        let event = Event::TrackCreated { id, name };
        if let Err(e) = self.wal_append(&event).await {
            self.abandon_create(id, &ts, &mut guard);
            return Err(e);
        }
        metrics::gauge!(observability::TRACKS_ACTIVE).set(self.state.len() as f64);
        Ok(())
    }

    fn abandon_create(&self, id: Ulid, ts: &SharedTrackState, guard: &mut TrackState) {
        guard.deleted = true;
        self.state.remove_if(&id, |_, current| Arc::ptr_eq(current, ts));
    }

    pub async fn delete_track(&self, id: Ulid) -> Result<(), EngineError> {
        let _gate = self.compaction_gate.read().await;
        // Wait out in-flight slot edits before the track disappears.
        let mut guard = self.lock_track(id).await?;

        let event = Event::TrackDeleted { id };
        self.wal_append(&event).await?;
        guard.deleted = true;
        self.state.remove(&id);
        metrics::gauge!(observability::TRACKS_ACTIVE).set(self.state.len() as f64);
        Ok(())
    }

    /// Validate `slot` against the track's current hours and insert it in
    /// canonical order. Returns the slot's index after insertion.
    pub async fn add_slot(&self, track_id: Ulid, slot: AvailabilitySlot) -> Result<usize, EngineError> {
        let _gate = self.compaction_gate.read().await;
        let mut guard = self.lock_track(track_id).await?;
        if guard.slots.len() >= MAX_SLOTS_PER_TRACK {
            return Err(EngineError::LimitExceeded("too many slots on track"));
        }
        if let Err(e) = validate_candidate(&slot, &guard.slots) {
            record_rejection(track_id, &e);
            return Err(e.into());
        }

        let event = Event::SlotAdded { track_id, slot };
        self.persist_and_apply(&mut guard, &event).await?;

        // Candidate lands after any equal keys.
        let key = canonical_key(&slot);
        let index = guard.slots.partition_point(|s| canonical_key(s) <= key) - 1;
        Ok(index)
    }

    pub async fn remove_slot(&self, track_id: Ulid, index: usize) -> Result<AvailabilitySlot, EngineError> {
        let _gate = self.compaction_gate.read().await;
        let mut guard = self.lock_track(track_id).await?;
        let Some(&removed) = guard.slots.get(index) else {
            return Err(EngineError::SlotIndexOutOfRange {
                index,
                len: guard.slots.len(),
            });
        };

        let event = Event::SlotRemoved { track_id, index };
        self.persist_and_apply(&mut guard, &event).await?;
        Ok(removed)
    }

    /// Replace a track's hours with `slots`, all or nothing. The list is
    /// rebuilt from empty with the same validate-then-insert steps as
    /// `add_slot`; the first bad entry aborts and the stored hours are kept.
    pub async fn replace_hours(&self, track_id: Ulid, slots: Vec<AvailabilitySlot>) -> Result<(), EngineError> {
        if slots.len() > MAX_SLOTS_PER_TRACK {
            return Err(EngineError::LimitExceeded("too many slots on track"));
        }
        let _gate = self.compaction_gate.read().await;
        let mut guard = self.lock_track(track_id).await?;

        let canonical = match build_collection(&slots) {
            Ok(c) => c,
            Err((position, error)) => {
                record_rejection(track_id, &error);
                return Err(EngineError::InvalidHours { position, error });
            }
        };

        let event = Event::HoursReplaced {
            track_id,
            slots: canonical,
        };
        self.persist_and_apply(&mut guard, &event).await
    }

    /// Compact the WAL by rewriting it with only the events needed to recreate the current state.
    pub async fn compact_wal(&self) -> Result<(), EngineError> {
        let _gate = self.compaction_gate.write().await;
        let tracks: Vec<_> = self.state.iter().map(|e| e.value().clone()).collect();
        let mut events = Vec::with_capacity(tracks.len() * 2);
        for ts in tracks {
            let guard = ts.read().await;
            events.push(Event::TrackCreated {
                id: guard.id,
                name: guard.name.clone(),
            });
            if !guard.slots.is_empty() {
                events.push(Event::HoursReplaced {
                    track_id: guard.id,
                    slots: guard.slots.clone(),
                });
            }
        }

        let (tx, rx) = oneshot::channel();
        self.wal_tx
            .send(WalCommand::Compact { events, response: tx })
            .await
            .map_err(|_| EngineError::WalError("WAL writer shut down".into()))?;
        rx.await
            .map_err(|_| EngineError::WalError("WAL writer dropped response".into()))?
            .map_err(|e| EngineError::WalError(e.to_string()))
    }

    pub async fn wal_appends_since_compact(&self) -> u64 {
        let (tx, rx) = oneshot::channel();
        if self
            .wal_tx
            .send(WalCommand::AppendsSinceCompact { response: tx })
            .await
            .is_err()
        {
            return 0;
        }
        rx.await.unwrap_or(0)
    }
}
