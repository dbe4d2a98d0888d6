//! `delayq-core` — types shared between the schedule queue and its consumers.
//!
//! The queue itself lives in `delayq-scheduler`; this crate holds only what
//! crosses the notification boundary, so channel adapters and transports can
//! depend on the payload shapes without pulling in the queue machinery.

pub mod types;

pub use types::{ReadyBatch, ScheduledEntry, SubmitAck, ACK_TAG_PREFIX};
