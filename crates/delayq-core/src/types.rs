//! Delayed-delivery types — shared between the schedule queue and whatever
//! consumes its notifications.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Prefix for ack correlation ids. The full id is `TAG:<msg_id>`, letting the
/// transport route the ack back to the request that submitted the entry.
pub const ACK_TAG_PREFIX: &str = "TAG:";

/// One pending delayed-delivery record.
///
/// The payload bytes are not held here; they stay inside `file` until the
/// consumer reads them at delivery time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledEntry {
    /// Caller-supplied logical id. Not necessarily unique — duplicates coexist.
    pub id: String,
    /// Delivery not-before instant (UTC), millisecond precision.
    pub scheduled_at: DateTime<Utc>,
    /// Backing file, named after `(id, scheduled_at)`.
    pub file: PathBuf,
}

/// Published once per tick that drains at least one ready entry.
///
/// Receiving a batch transfers responsibility for the entries' backing files:
/// the queue no longer tracks them, and the consumer deletes each file after
/// delivery via the queue's remove operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyBatch {
    pub entries: Vec<ScheduledEntry>,
}

/// Minimal acknowledgement for a single accepted submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitAck {
    /// `TAG:<msg_id>` of the submission being acknowledged.
    pub correlation_id: String,
}

impl SubmitAck {
    /// Build the ack for the submission carrying `msg_id`.
    pub fn for_message(msg_id: &str) -> Self {
        Self {
            correlation_id: format!("{ACK_TAG_PREFIX}{msg_id}"),
        }
    }
}
