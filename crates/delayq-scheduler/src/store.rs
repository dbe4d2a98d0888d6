//! On-disk record store — one file per scheduled entry.
//!
//! File name pattern: `<id>-<epochMillis>.msg`. The timestamp is always the
//! last dash-separated run of digits before the extension, so ids containing
//! dashes (or ending in digits) still round-trip. Names that do not match the
//! pattern are never produced here and are ignored by recovery.

use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use delayq_core::ScheduledEntry;

/// Extension carried by every entry file.
pub const FILE_EXT: &str = "msg";

/// Pure name encoding: `<id>-<epochMillis>.msg`.
pub fn file_name(id: &str, scheduled_at: DateTime<Utc>) -> String {
    format!("{id}-{}.{FILE_EXT}", scheduled_at.timestamp_millis())
}

/// Full path of the entry file for `(id, scheduled_at)` under `dir`.
pub fn entry_path(dir: &Path, id: &str, scheduled_at: DateTime<Utc>) -> PathBuf {
    dir.join(file_name(id, scheduled_at))
}

/// Pure parse of a stored path back into an entry.
///
/// Returns `None` for anything that does not match `<id>-<millis>.msg`:
/// wrong extension, missing separator, empty id, or a non-numeric timestamp.
/// Never panics on malformed input — callers skip what this rejects.
pub fn parse_entry_path(path: &Path) -> Option<ScheduledEntry> {
    let name = path.file_name()?.to_str()?;
    let (stem, ext) = name.rsplit_once('.')?;
    if ext != FILE_EXT {
        return None;
    }
    let (id, millis) = stem.rsplit_once('-')?;
    if id.is_empty() || millis.is_empty() || !millis.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let millis: i64 = millis.parse().ok()?;
    let scheduled_at = Utc.timestamp_millis_opt(millis).single()?;
    Some(ScheduledEntry {
        id: id.to_string(),
        scheduled_at,
        file: path.to_path_buf(),
    })
}

/// Write (create or overwrite) the backing file for `(id, scheduled_at)`.
pub async fn write_entry(
    dir: &Path,
    id: &str,
    scheduled_at: DateTime<Utc>,
    payload: &[u8],
) -> std::io::Result<PathBuf> {
    let path = entry_path(dir, id, scheduled_at);
    tokio::fs::write(&path, payload).await?;
    Ok(path)
}

/// Unlink one backing file.
pub async fn remove_entry(path: &Path) -> std::io::Result<()> {
    tokio::fs::remove_file(path).await
}

/// List every path currently in `dir`. Used only by recovery and bulk clear.
pub async fn list_entries(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        out.push(entry.path());
    }
    Ok(out)
}
