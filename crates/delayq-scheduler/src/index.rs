//! In-memory scheduling index — an ordered list of pending entries.
//!
//! Deliberately a list rather than a map keyed by id: duplicate ids are
//! permitted and coexist, since the store itself is keyed by the full
//! `(id, timestamp)` pair. Insertion order is stable, which keeps test
//! observation deterministic.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use delayq_core::ScheduledEntry;

/// Thread-safe pending-entry collection.
///
/// The recovery scan, the tick loop, and public-API callers all mutate this
/// concurrently; a single `Mutex` serialises them. The lock is only ever held
/// for the in-memory operation — never across I/O.
#[derive(Debug, Default)]
pub struct ScheduleIndex {
    entries: Mutex<Vec<ScheduledEntry>>,
}

impl ScheduleIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry unless its backing file is already indexed.
    ///
    /// Two entries may share an id, but never a file: the recovery scan and a
    /// racing save call can both try to index the same file, in either order,
    /// and whichever lands second is a no-op. Without the dedupe the file
    /// would sit in the index twice and drain into two batches. Returns
    /// whether the entry was inserted.
    pub fn insert(&self, entry: ScheduledEntry) -> bool {
        let mut entries = self.entries.lock().unwrap();
        if entries.iter().any(|e| e.file == entry.file) {
            return false;
        }
        entries.push(entry);
        true
    }

    /// Remove the first entry matching `id`.
    ///
    /// Returns whether anything was removed; an absent id is a no-op, not an
    /// error.
    pub fn remove_by_id(&self, id: &str) -> bool {
        let mut entries = self.entries.lock().unwrap();
        match entries.iter().position(|e| e.id == id) {
            Some(i) => {
                entries.remove(i);
                true
            }
            None => false,
        }
    }

    /// Remove and return every entry whose instant has passed.
    ///
    /// Readiness is strict: `scheduled_at < now`. The not-ready remainder
    /// replaces the collection under the same lock, so an entry can never
    /// appear in two batches and none is lost between consecutive drains.
    pub fn drain_ready(&self, now: DateTime<Utc>) -> Vec<ScheduledEntry> {
        let mut entries = self.entries.lock().unwrap();
        let (ready, pending): (Vec<_>, Vec<_>) =
            entries.drain(..).partition(|e| e.scheduled_at < now);
        *entries = pending;
        ready
    }

    /// Empty the index and return what it held.
    pub fn clear(&self) -> Vec<ScheduledEntry> {
        std::mem::take(&mut *self.entries.lock().unwrap())
    }

    /// Snapshot of the pending entries in insertion order.
    pub fn pending(&self) -> Vec<ScheduledEntry> {
        self.entries.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::path::PathBuf;

    fn entry(id: &str, millis: i64) -> ScheduledEntry {
        let scheduled_at = Utc.timestamp_millis_opt(millis).unwrap();
        ScheduledEntry {
            id: id.to_string(),
            scheduled_at,
            file: PathBuf::from(format!("/tmp/{id}-{millis}.msg")),
        }
    }

    fn now(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).unwrap()
    }

    #[test]
    fn insert_keeps_insertion_order() {
        let index = ScheduleIndex::new();
        index.insert(entry("b", 200));
        index.insert(entry("a", 100));
        let ids: Vec<_> = index.pending().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, ["b", "a"]);
    }

    #[test]
    fn same_backing_file_is_never_indexed_twice() {
        let index = ScheduleIndex::new();
        assert!(index.insert(entry("m1", 100)));
        assert!(!index.insert(entry("m1", 100)));
        assert!(index.insert(entry("m1", 200)));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn file_indexed_from_both_directions_drains_once() {
        // recovery scan and a save call both index the same file; whichever
        // lands second must be a no-op or the entry would drain twice
        let index = ScheduleIndex::new();
        index.insert(entry("m1", 100));
        index.insert(entry("m1", 100));

        assert_eq!(index.drain_ready(now(200)).len(), 1);
        assert!(index.drain_ready(now(300)).is_empty());
    }

    #[test]
    fn duplicate_ids_coexist() {
        let index = ScheduleIndex::new();
        index.insert(entry("m1", 100));
        index.insert(entry("m1", 200));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn remove_by_id_takes_first_match_only() {
        let index = ScheduleIndex::new();
        index.insert(entry("m1", 100));
        index.insert(entry("m1", 200));
        assert!(index.remove_by_id("m1"));
        let left = index.pending();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].scheduled_at, now(200));
    }

    #[test]
    fn remove_absent_id_is_noop() {
        let index = ScheduleIndex::new();
        index.insert(entry("m1", 100));
        assert!(!index.remove_by_id("nope"));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn drain_partitions_by_strict_readiness() {
        let index = ScheduleIndex::new();
        index.insert(entry("past", 100));
        index.insert(entry("boundary", 500));
        index.insert(entry("future", 900));

        let ready = index.drain_ready(now(500));
        let ids: Vec<_> = ready.into_iter().map(|e| e.id).collect();
        // boundary entry is not ready: readiness requires now strictly later
        assert_eq!(ids, ["past"]);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn drained_entry_never_reappears() {
        let index = ScheduleIndex::new();
        index.insert(entry("m1", 100));

        assert_eq!(index.drain_ready(now(200)).len(), 1);
        assert!(index.drain_ready(now(300)).is_empty());
    }

    #[test]
    fn every_entry_lands_in_exactly_one_batch() {
        let index = ScheduleIndex::new();
        for i in 0..10 {
            index.insert(entry(&format!("m{i}"), i * 100));
        }

        let mut seen = Vec::new();
        seen.extend(index.drain_ready(now(450)));
        seen.extend(index.drain_ready(now(450)));
        seen.extend(index.drain_ready(now(2_000)));

        assert_eq!(seen.len(), 10);
        let mut ids: Vec<_> = seen.into_iter().map(|e| e.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 10);
        assert!(index.is_empty());
    }

    #[test]
    fn clear_returns_previous_contents() {
        let index = ScheduleIndex::new();
        index.insert(entry("a", 100));
        index.insert(entry("b", 200));
        let drained = index.clear();
        assert_eq!(drained.len(), 2);
        assert!(index.is_empty());
    }
}
