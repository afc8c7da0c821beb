use ulid::Ulid;

/// Why a candidate slot was refused. Both variants are user-facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotError {
    /// Single-day slot whose open time is not strictly before its close time.
    InvalidTimeOrder,
    /// Shares a day and overlapping hours with the existing slot at `index`.
    OverlapConflict { index: usize },
}

impl std::fmt::Display for SlotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlotError::InvalidTimeOrder => {
                write!(f, "open time must be before close time for a single-day slot")
            }
            SlotError::OverlapConflict { .. } => write!(f, "this slot overlaps an existing one"),
        }
    }
}

impl std::error::Error for SlotError {}

#[derive(Debug)]
pub enum EngineError {
    NotFound(Ulid),
    AlreadyExists(Ulid),
    Rejected(SlotError),
    /// A full hours list failed validation at `position` (input order).
    InvalidHours {
        position: usize,
        error: SlotError,
    },
    SlotIndexOutOfRange {
        index: usize,
        len: usize,
    },
    LimitExceeded(&'static str),
    WalError(String),
}

impl From<SlotError> for EngineError {
    fn from(e: SlotError) -> Self {
        EngineError::Rejected(e)
    }
}

impl EngineError {
    /// The slot rejection behind this error, if any.
    pub fn slot_error(&self) -> Option<SlotError> {
        match self {
            EngineError::Rejected(e) | EngineError::InvalidHours { error: e, .. } => Some(*e),
            _ => None,
        }
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::NotFound(id) => write!(f, "not found: {id}"),
            EngineError::AlreadyExists(id) => write!(f, "already exists: {id}"),
            EngineError::Rejected(e) => write!(f, "{e}"),
            EngineError::InvalidHours { position, error } => {
                write!(f, "slot {position}: {error}")
            }
            EngineError::SlotIndexOutOfRange { index, len } => {
                write!(f, "slot index {index} out of range (track has {len} slots)")
            }
            EngineError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            EngineError::WalError(e) => write!(f, "WAL error: {e}"),
        }
    }
}

impl std::error::Error for EngineError {}
