//! Startup recovery — rebuild the in-memory index from the storage directory.

use std::path::Path;

use tracing::{debug, info};

use crate::index::ScheduleIndex;
use crate::store;

/// Scan `dir` and insert every parseable entry file into `index`.
///
/// Best-effort: paths whose names do not match the store's pattern are
/// skipped without error — they may be unrelated files or corrupt leftovers.
/// The scan races with early save calls on the same index, so insertion
/// dedupes on the backing file path: a file that a save already indexed is
/// not counted again. Returns the number of entries recovered.
pub async fn recover_into(dir: &Path, index: &ScheduleIndex) -> std::io::Result<usize> {
    let mut recovered = 0usize;
    for path in store::list_entries(dir).await? {
        match store::parse_entry_path(&path) {
            Some(entry) => {
                if index.insert(entry) {
                    recovered += 1;
                }
            }
            None => debug!(path = %path.display(), "skipping non-entry file"),
        }
    }
    info!(count = recovered, "loaded pending nodes");
    Ok(recovered)
}
