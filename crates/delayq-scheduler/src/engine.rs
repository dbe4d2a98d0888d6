//! The schedule queue — recovery wiring, tick loop, and the save/remove API.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use delayq_core::{ReadyBatch, ScheduledEntry, SubmitAck};

use crate::error::{QueueError, Result};
use crate::index::ScheduleIndex;
use crate::{recover, store};

/// Default polling granularity. Coarse and cheap — delivery is promised "no
/// earlier than its timestamp", not interrupt-precise.
pub const DEFAULT_TICK: Duration = Duration::from_secs(1);

/// Construction parameters for [`ScheduleQueue`].
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Storage directory; created recursively if absent.
    pub dir: PathBuf,
    /// Tick interval of the trigger loop.
    pub tick_interval: Duration,
}

impl QueueConfig {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            tick_interval: DEFAULT_TICK,
        }
    }

    /// Override the polling interval (tests use a short one).
    pub fn tick_interval(mut self, tick: Duration) -> Self {
        self.tick_interval = tick;
        self
    }
}

/// Injected notification sinks.
///
/// Both are optional: a queue without sinks still stores, recovers, and
/// drains — it just has nowhere to publish. Sends use `try_send` so neither
/// the tick loop nor a save call ever blocks on a slow consumer.
#[derive(Debug, Default)]
pub struct QueueHooks {
    /// Receives one [`ReadyBatch`] per tick that drained at least one entry.
    pub ready_tx: Option<mpsc::Sender<ReadyBatch>>,
    /// Receives one [`SubmitAck`] per accepted save.
    pub ack_tx: Option<mpsc::Sender<SubmitAck>>,
}

/// Shutdown signal plus task handle for an armed ticker.
struct Ticker {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Durable delayed-delivery queue.
///
/// Construction creates the storage directory and spawns a background
/// recovery scan; [`start`](Self::start) arms the trigger loop. The ticker is
/// an owned task stopped deterministically by [`stop`](Self::stop) or by
/// dropping the queue — there is no process-wide timer.
pub struct ScheduleQueue {
    dir: PathBuf,
    tick_interval: Duration,
    index: Arc<ScheduleIndex>,
    ready_tx: Option<mpsc::Sender<ReadyBatch>>,
    ack_tx: Option<mpsc::Sender<SubmitAck>>,
    ticker: Mutex<Option<Ticker>>,
}

impl ScheduleQueue {
    /// Create a queue over `config.dir`, spawning the recovery scan.
    ///
    /// Must be called from within a Tokio runtime: construction spawns the
    /// scan and panics outside a runtime context, like any `tokio::spawn`.
    /// Recovery runs in the background and never blocks construction; it
    /// shares the index with the public API, so entries saved before the scan
    /// finishes simply interleave with the recovered ones.
    pub fn new(config: QueueConfig, hooks: QueueHooks) -> Result<Self> {
        std::fs::create_dir_all(&config.dir)?;
        let index = Arc::new(ScheduleIndex::new());

        let scan_dir = config.dir.clone();
        let scan_index = Arc::clone(&index);
        tokio::spawn(async move {
            if let Err(e) = recover::recover_into(&scan_dir, &scan_index).await {
                error!(dir = %scan_dir.display(), "recovery scan failed: {e}");
            }
        });

        Ok(Self {
            dir: config.dir,
            tick_interval: config.tick_interval,
            index,
            ready_tx: hooks.ready_tx,
            ack_tx: hooks.ack_tx,
            ticker: Mutex::new(None),
        })
    }

    /// Arm the trigger loop. If already armed, the old ticker is replaced.
    ///
    /// Each tick drains the index against the wall clock and publishes one
    /// [`ReadyBatch`] when anything came out. The tick does no file I/O:
    /// drained entries' backing files stay on disk until the consumer removes
    /// them.
    pub fn start(&self) {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let index = Arc::clone(&self.index);
        let ready_tx = self.ready_tx.clone();
        let tick = self.tick_interval;

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let ready = index.drain_ready(Utc::now());
                        if ready.is_empty() {
                            continue;
                        }
                        info!(count = ready.len(), "nodes ready");
                        if let Some(ref tx) = ready_tx {
                            // try_send keeps the tick loop from ever stalling
                            if tx.try_send(ReadyBatch { entries: ready }).is_err() {
                                warn!("ready channel full or closed — batch dropped");
                            }
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
        });

        let mut ticker = self.ticker.lock().unwrap();
        if let Some(old) = ticker.replace(Ticker {
            shutdown: shutdown_tx,
            task,
        }) {
            let _ = old.shutdown.send(true);
            old.task.abort();
        }
    }

    /// Disarm the trigger loop. Idempotent — a no-op when not armed.
    ///
    /// Only future ticks are cancelled; in-flight save/remove I/O issued
    /// before the call completes normally.
    pub fn stop(&self) {
        if let Some(ticker) = self.ticker.lock().unwrap().take() {
            let _ = ticker.shutdown.send(true);
            ticker.task.abort();
        }
    }

    /// Validate, persist, index, and acknowledge one submission.
    ///
    /// Effects happen in a fixed order: file write, index insert, ack. A
    /// crash mid-save can leave a stored-but-unacknowledged entry (recovery
    /// picks it up), never an acknowledged entry with no backing file.
    /// Validation failures and write failures surface synchronously with no
    /// partial effect.
    pub async fn save(
        &self,
        id: &str,
        scheduled_at: DateTime<Utc>,
        payload: &[u8],
        msg_id: &str,
    ) -> Result<ScheduledEntry> {
        if id.is_empty() {
            return Err(QueueError::InvalidId);
        }
        let millis = scheduled_at.timestamp_millis();
        if millis < 0 {
            return Err(QueueError::InvalidTimestamp(scheduled_at));
        }
        // The file name carries millisecond precision; truncate so the
        // in-memory instant matches what recovery would parse back.
        let scheduled_at = Utc
            .timestamp_millis_opt(millis)
            .single()
            .ok_or(QueueError::InvalidTimestamp(scheduled_at))?;

        let file = store::write_entry(&self.dir, id, scheduled_at, payload).await?;
        let entry = ScheduledEntry {
            id: id.to_string(),
            scheduled_at,
            file,
        };
        if !self.index.insert(entry.clone()) {
            // the recovery scan listed the freshly written file first
            debug!(file = %entry.file.display(), "entry already indexed by recovery");
        }
        info!(id, at = %scheduled_at, file = %entry.file.display(), "save node");

        if let Some(ref tx) = self.ack_tx {
            if tx.try_send(SubmitAck::for_message(msg_id)).is_err() {
                warn!(msg_id, "ack channel full or closed — ack dropped");
            }
        }
        Ok(entry)
    }

    /// Remove one entry: index first, then best-effort file unlink.
    ///
    /// An unlink failure is logged and swallowed — the index removal stands
    /// either way. Returns whether the index held a matching id.
    pub async fn remove(&self, entry: &ScheduledEntry) -> bool {
        let removed = self.index.remove_by_id(&entry.id);
        match store::remove_entry(&entry.file).await {
            Ok(()) => info!(file = %entry.file.display(), "unlink node"),
            Err(e) => error!(file = %entry.file.display(), "unlink failed: {e}"),
        }
        removed
    }

    /// Clear everything: empty the index, then delete every file in the
    /// storage directory.
    ///
    /// Deletion keeps going past individual failures; if any unlink fails the
    /// call returns [`QueueError::Clear`] naming the survivors. Non-atomic:
    /// on error the directory holds a mix of deleted and undeleted files.
    pub async fn remove_all(&self) -> Result<()> {
        self.index.clear();
        let mut failed = Vec::new();
        for path in store::list_entries(&self.dir).await? {
            match store::remove_entry(&path).await {
                Ok(()) => info!(file = %path.display(), "unlink file node"),
                Err(e) => {
                    error!(file = %path.display(), "unlink failed: {e}");
                    failed.push(path);
                }
            }
        }
        if failed.is_empty() {
            Ok(())
        } else {
            Err(QueueError::Clear { failed })
        }
    }

    /// Snapshot of the pending entries, insertion-ordered.
    pub fn pending(&self) -> Vec<ScheduledEntry> {
        self.index.pending()
    }

    /// Storage directory this queue writes under.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Drop for ScheduleQueue {
    fn drop(&mut self) {
        self.stop();
    }
}
