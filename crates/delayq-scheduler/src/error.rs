use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors surfaced by the schedule queue.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The caller supplied an empty id.
    #[error("Invalid id: must be non-empty")]
    InvalidId,

    /// The scheduled instant cannot be encoded in a file name (pre-epoch).
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(DateTime<Utc>),

    /// Underlying filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Bulk clear could not delete every file; the named files remain on disk.
    #[error("Bulk clear left {} file(s) behind", failed.len())]
    Clear { failed: Vec<PathBuf> },
}

pub type Result<T> = std::result::Result<T, QueueError>;
