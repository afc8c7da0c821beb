mod availability;
mod conflict;
mod days;
mod error;
mod filter;
mod mutations;
mod queries;

pub use availability::{
    canonical_key, first_conflict, has_overlap, insert_sorted, intervals_overlap, remove_at, to_minutes,
    MinuteSpan, Minutes,
};
pub use conflict::{build_collection, validate_candidate};
pub use days::{expand_day_range, DaySet};
pub use error::{EngineError, SlotError};
pub use filter::{covered_days, matches_days, matches_window, DayQuery, TrackFilter};

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{mpsc, oneshot, OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};
use ulid::Ulid;

use crate::model::*;
use crate::wal::Wal;

pub type SharedTrackState = Arc<RwLock<TrackState>>;

// ── Group-commit WAL channel ─────────────────────────────

pub(super) enum WalCommand {
    Append {
        event: Event,
        response: oneshot::Sender<io::Result<()>>,
    },
    Compact {
        events: Vec<Event>,
        response: oneshot::Sender<io::Result<()>>,
    },
    AppendsSinceCompact {
        response: oneshot::Sender<u64>,
    },
}

/// Background task that owns the WAL and batches appends for group commit.
/// 1. Block until the first Append arrives.
/// 2. Buffer it (no fsync).
/// 3. Drain all immediately available Appends (the batch window).
/// 4. Single flush_sync for the whole batch.
/// 5. Respond to all senders.
async fn wal_writer_loop(mut wal: Wal, mut rx: mpsc::Receiver<WalCommand>) {
    while let Some(cmd) = rx.recv().await {
        match cmd {
            WalCommand::Append { event, response } => {
                let mut batch = vec![(event, response)];
                let mut deferred = None;

                loop {
                    match rx.try_recv() {
                        Ok(WalCommand::Append { event, response }) => batch.push((event, response)),
                        Ok(other) => {
                            // handled after this batch is durable
                            deferred = Some(other);
                            break;
                        }
                        Err(_) => break,
                    }
                }

                commit_batch(&mut wal, &mut batch);
                if let Some(other) = deferred {
                    handle_non_append(&mut wal, other);
                }
            }
            other => handle_non_append(&mut wal, other),
        }
    }
}

fn commit_batch(wal: &mut Wal, batch: &mut Vec<(Event, oneshot::Sender<io::Result<()>>)>) {
    metrics::histogram!(crate::observability::WAL_FLUSH_BATCH_SIZE).record(batch.len() as f64);
    let flush_start = std::time::Instant::now();
    let result = flush_batch(wal, batch);
    metrics::histogram!(crate::observability::WAL_FLUSH_DURATION_SECONDS)
        .record(flush_start.elapsed().as_secs_f64());
    if let Err(e) = &result {
        tracing::error!("WAL flush failed for {} events: {e}", batch.len());
    }
    for (_, tx) in batch.drain(..) {
        let r = match &result {
            Ok(()) => Ok(()),
            Err(e) => Err(io::Error::new(e.kind(), e.to_string())),
        };
        let _ = tx.send(r);
    }
}

fn flush_batch(wal: &mut Wal, batch: &[(Event, oneshot::Sender<io::Result<()>>)]) -> io::Result<()> {
    let mut append_err: Option<io::Error> = None;
    for (event, _) in batch {
        if let Err(e) = wal.append_buffered(event) {
            append_err = Some(e);
            break;
        }
    }
    // Always flush, even on append error, so partially buffered bytes
    // don't leak into the next batch.
    let flush_err = wal.flush_sync().err();
    match (append_err, flush_err) {
        (Some(e), _) | (None, Some(e)) => Err(e),
        (None, None) => Ok(()),
    }
}

fn handle_non_append(wal: &mut Wal, cmd: WalCommand) {
    match cmd {
        WalCommand::Compact { events, response } => {
            let result = Wal::write_compact_file(wal.path(), &events).and_then(|()| wal.swap_compact_file());
            let _ = response.send(result);
        }
        WalCommand::AppendsSinceCompact { response } => {
            let _ = response.send(wal.appends_since_compact());
        }
        WalCommand::Append { .. } => unreachable!("appends are batched by the writer loop"),
    }
}

/// Owns every track's hours. Slot changes are validated against the track's
/// current hours under its write lock, logged, then applied.
pub struct Engine {
    pub(super) state: DashMap<Ulid, SharedTrackState>,
    pub(super) wal_tx: mpsc::Sender<WalCommand>,
    /// Mutations hold this shared; compaction holds it exclusively so its
    /// snapshot cannot miss an event already appended to the old log.
    pub(super) compaction_gate: RwLock<()>,
}

/// Apply a track-level event to its state (caller holds the lock).
fn apply_to_track(ts: &mut TrackState, event: &Event) {
    match event {
        Event::SlotAdded { slot, .. } => ts.slots = insert_sorted(*slot, &ts.slots),
        Event::SlotRemoved { index, .. } => {
            if let Some(slots) = remove_at(*index, &ts.slots) {
                ts.slots = slots;
            }
        }
        Event::HoursReplaced { slots, .. } => ts.slots = slots.clone(),
        // TrackCreated/Deleted are handled at the map level, not here
        Event::TrackCreated { .. } | Event::TrackDeleted { .. } => {}
    }
}

/// Extract the track id of a track-level event.
fn event_track_id(event: &Event) -> Option<Ulid> {
    match event {
        Event::SlotAdded { track_id, .. }
        | Event::SlotRemoved { track_id, .. }
        | Event::HoursReplaced { track_id, .. } => Some(*track_id),
        Event::TrackCreated { .. } | Event::TrackDeleted { .. } => None,
    }
}

impl Engine {
    /// Replay the WAL at `wal_path`, then start the writer task.
    /// Must be called inside a tokio runtime.
    pub fn new(wal_path: PathBuf) -> io::Result<Self> {
        let events = Wal::replay(&wal_path)?;

        // Rebuild plain state first; locks are only needed once the engine is shared.
        let mut tracks: HashMap<Ulid, TrackState> = HashMap::new();
        for event in &events {
            match event {
                Event::TrackCreated { id, name } => {
                    tracks.insert(*id, TrackState::new(*id, name.clone()));
                }
                Event::TrackDeleted { id } => {
                    tracks.remove(id);
                }
                other => {
                    if let Some(ts) = event_track_id(other).and_then(|id| tracks.get_mut(&id)) {
                        apply_to_track(ts, other);
                    }
                }
            }
        }
        tracing::info!("replayed {} WAL events into {} tracks", events.len(), tracks.len());

        let wal = Wal::open(&wal_path)?;
        let (wal_tx, wal_rx) = mpsc::channel(4096);
        tokio::spawn(wal_writer_loop(wal, wal_rx));

        let state = DashMap::with_capacity(tracks.len());
        for (id, ts) in tracks {
            state.insert(id, Arc::new(RwLock::new(ts)));
        }
        metrics::gauge!(crate::observability::TRACKS_ACTIVE).set(state.len() as f64);

        Ok(Self {
            state,
            wal_tx,
            compaction_gate: RwLock::new(()),
        })
    }

    /// Write event to WAL via the background group-commit writer.
    async fn wal_append(&self, event: &Event) -> Result<(), EngineError> {
        let (tx, rx) = oneshot::channel();
        self.wal_tx
            .send(WalCommand::Append {
                event: event.clone(),
                response: tx,
            })
            .await
            .map_err(|_| EngineError::WalError("WAL writer shut down".into()))?;
        rx.await
            .map_err(|_| EngineError::WalError("WAL writer dropped response".into()))?
            .map_err(|e| EngineError::WalError(e.to_string()))
    }

    pub fn get_track(&self, id: &Ulid) -> Option<SharedTrackState> {
        self.state.get(id).map(|e| e.value().clone())
    }

    pub fn track_count(&self) -> usize {
        self.state.len()
    }

    /// WAL-append then apply, under the caller's write lock.
    pub(super) async fn persist_and_apply(&self, ts: &mut TrackState, event: &Event) -> Result<(), EngineError> {
        self.wal_append(event).await?;
        apply_to_track(ts, event);
        Ok(())
    }

    pub(super) fn resolve_track(&self, id: Ulid) -> Result<SharedTrackState, EngineError> {
        self.get_track(&id).ok_or(EngineError::NotFound(id))
    }

    /// Resolve and write-lock a live track. A handle resolved before a
    /// concurrent delete sees the `deleted` mark once it gets the lock.
    pub(super) async fn lock_track(&self, id: Ulid) -> Result<OwnedRwLockWriteGuard<TrackState>, EngineError> {
        let guard = self.resolve_track(id)?.write_owned().await;
        if guard.deleted {
            return Err(EngineError::NotFound(id));
        }
        Ok(guard)
    }

    pub(super) async fn read_track(&self, id: Ulid) -> Result<OwnedRwLockReadGuard<TrackState>, EngineError> {
        let guard = self.resolve_track(id)?.read_owned().await;
        if guard.deleted {
            return Err(EngineError::NotFound(id));
        }
        Ok(guard)
    }
}
