use std::net::SocketAddr;

use crate::sql::Command;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: total queries executed. Labels: command, status.
pub const QUERIES_TOTAL: &str = "trackhours_queries_total";

/// Histogram: query latency in seconds. Labels: command.
pub const QUERY_DURATION_SECONDS: &str = "trackhours_query_duration_seconds";

/// Counter: candidate slots refused. Labels: reason.
pub const SLOTS_REJECTED_TOTAL: &str = "trackhours_slots_rejected_total";

// ── USE metrics (resource utilization) ──────────────────────────

/// Gauge: active TCP connections.
pub const CONNECTIONS_ACTIVE: &str = "trackhours_connections_active";

/// Counter: total connections accepted.
pub const CONNECTIONS_TOTAL: &str = "trackhours_connections_total";

/// Counter: connections rejected due to limit.
pub const CONNECTIONS_REJECTED_TOTAL: &str = "trackhours_connections_rejected_total";

/// Gauge: tracks held by the engine.
pub const TRACKS_ACTIVE: &str = "trackhours_tracks_active";

/// Histogram: WAL group-commit flush duration in seconds.
pub const WAL_FLUSH_DURATION_SECONDS: &str = "trackhours_wal_flush_duration_seconds";

/// Histogram: WAL group-commit batch size (events per flush).
pub const WAL_FLUSH_BATCH_SIZE: &str = "trackhours_wal_flush_batch_size";

/// Counter: WAL compactions. Labels: status.
pub const WAL_COMPACTIONS_TOTAL: &str = "trackhours_wal_compactions_total";

/// Install the Prometheus exporter on `port`. No-op if `port` is None.
pub fn init(port: Option<u16>) -> Result<(), metrics_exporter_prometheus::BuildError> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}

/// Short metrics label for a command.
pub fn command_label(cmd: &Command) -> &'static str {
    match cmd {
        Command::InsertTrack { .. } => "insert_track",
        Command::DeleteTrack { .. } => "delete_track",
        Command::InsertSlot { .. } => "insert_slot",
        Command::ReplaceHours { .. } => "replace_hours",
        Command::DeleteSlot { .. } => "delete_slot",
        Command::SelectHours { .. } => "select_hours",
        Command::SelectTracks { .. } => "select_tracks",
        Command::CheckSlot { .. } => "check_slot",
    }
}
