//! Bounded, ordered, persisted history of analysis results.
//!
//! The list is newest-first and never longer than [`HISTORY_CAPACITY`]. It is
//! stored as one JSON array under [`HISTORY_KEY`] and kept write-through:
//! every mutation reaches storage before the call returns.
//!
//! # Lifecycle
//!
//! - [`HistoryStore::hydrate`] once at startup. A missing or corrupt snapshot
//!   yields an empty history without surfacing an error.
//! - [`HistoryStore::prepend`] adds a result and evicts past the cap.
//! - [`HistoryStore::clear`] empties the list and deletes the key.
//! - [`HistoryStore::reload`] picks up writes made by another process.
//!
//! The CLI and the dashboard may share one storage directory, so `prepend`
//! builds on the persisted snapshot rather than on its own copy.

use anyhow::{Context, Result};

use crate::analysis::AnalysisResult;
use crate::storage::Storage;

/// Storage key for the serialized history.
pub const HISTORY_KEY: &str = "history";

/// Maximum number of entries kept.
pub const HISTORY_CAPACITY: usize = 10;

/// Client-side history store over a durable [`Storage`] backend.
#[derive(Debug)]
pub struct HistoryStore<S: Storage> {
    storage: S,
    entries: Vec<AnalysisResult>,
}

impl<S: Storage> HistoryStore<S> {
    /// Load the history from `storage`, falling back to empty.
    pub fn hydrate(storage: S) -> Self {
        let entries = read_snapshot(&storage).unwrap_or_default();
        Self { storage, entries }
    }

    /// Replace memory with the persisted snapshot. Keeps the current list
    /// when storage cannot be read.
    pub fn reload(&mut self) {
        if let Ok(entries) = read_snapshot(&self.storage) {
            self.entries = entries;
        }
    }

    /// Entries, newest first.
    pub fn current(&self) -> &[AnalysisResult] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert `result` as the newest entry and trim to capacity.
    ///
    /// The base list is the persisted snapshot, falling back to memory when
    /// storage cannot be read. The snapshot is written before memory is
    /// updated. If the write fails the in-memory list is unchanged and the
    /// error is returned.
    pub fn prepend(&mut self, result: AnalysisResult) -> Result<()> {
        let base = read_snapshot(&self.storage).unwrap_or_else(|_| self.entries.clone());

        let mut next = Vec::with_capacity(HISTORY_CAPACITY);
        next.push(result);
        next.extend(base.into_iter().take(HISTORY_CAPACITY - 1));

        let json = serde_json::to_string(&next).context("failed to serialize history")?;
        self.storage
            .set(HISTORY_KEY, &json)
            .context("failed to persist history")?;

        self.entries = next;
        Ok(())
    }

    /// Drop every entry and delete the persisted key.
    pub fn clear(&mut self) -> Result<()> {
        self.storage
            .remove(HISTORY_KEY)
            .context("failed to remove persisted history")?;
        self.entries.clear();
        Ok(())
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}

/// Read the persisted list. A missing or corrupt snapshot reads as empty;
/// only a storage failure is an error.
fn read_snapshot<S: Storage>(storage: &S) -> Result<Vec<AnalysisResult>> {
    let Some(raw) = storage.get(HISTORY_KEY)? else {
        return Ok(Vec::new());
    };
    let mut entries: Vec<AnalysisResult> = serde_json::from_str(&raw).unwrap_or_default();
    entries.truncate(HISTORY_CAPACITY);
    Ok(entries)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
