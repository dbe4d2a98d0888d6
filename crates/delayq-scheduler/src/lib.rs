//! `delayq-scheduler` — durable, restart-safe delayed-delivery queue over
//! one-file-per-entry storage.
//!
//! # Overview
//!
//! Callers hand [`ScheduleQueue::save`] an opaque payload, an id, and a future
//! instant. The payload lands in `<id>-<epochMillis>.msg` under the storage
//! directory and the entry joins an in-memory index. Once armed with
//! [`ScheduleQueue::start`], a once-per-interval tick drains every entry whose
//! instant has passed and publishes the batch to the injected ready sink.
//! Delivery itself — and deleting delivered files — belongs to the consumer.
//!
//! Disk is the source of truth: construction spawns a background scan that
//! rebuilds the index from the directory, so pending entries survive a
//! process restart. The index is a cache of the directory, never the other
//! way around.
//!
//! | Module    | Concern                                        |
//! |-----------|------------------------------------------------|
//! | `store`   | File naming scheme and the I/O behind it       |
//! | `index`   | In-memory ordered list of pending entries      |
//! | `recover` | Startup rebuild of the index from disk         |
//! | `engine`  | Tick loop, save/remove API, notification sinks |

pub mod engine;
pub mod error;
pub mod index;
pub mod recover;
pub mod store;

pub use engine::{QueueConfig, QueueHooks, ScheduleQueue, DEFAULT_TICK};
pub use error::{QueueError, Result};
pub use index::ScheduleIndex;
