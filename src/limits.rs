/// Max tracks held by one engine.
pub const MAX_TRACKS: usize = 100_000;

/// Max availability slots on a single track. A week rarely needs more than a
/// handful; this only stops runaway clients.
pub const MAX_SLOTS_PER_TRACK: usize = 64;

/// Max byte length of a track name.
pub const MAX_NAME_LEN: usize = 256;

/// Max entries in a `weekday IN (...)` filter.
pub const MAX_FILTER_DAYS: usize = 7;

/// Largest WAL record replay will accept; a bigger length prefix is treated
/// as corruption.
pub const MAX_WAL_RECORD_BYTES: usize = 1 << 20;
