//! Linear undo/redo history over versions of a single text buffer.
//!
//! The history is a list of versions plus a cursor pointing at the version
//! currently shown. Committing after an undo discards everything to the
//! right of the cursor. No operation fails; undo and redo at the ends are
//! no-ops.

use serde::{Deserialize, Serialize};
use snipfmt_storage::{Storage, StorageResult};
use std::sync::Arc;
use tracing::{debug, warn};

/// Storage key of the persisted history. Valid on every backend.
pub const HISTORY_KEY: &str = "code-history";

/// Edit history state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditHistory {
    entries: Vec<String>,
    cursor: usize,
}

impl Default for EditHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl EditHistory {
    /// A history holding a single empty version.
    pub fn new() -> Self {
        Self {
            entries: vec![String::new()],
            cursor: 0,
        }
    }

    /// The active version.
    pub fn current(&self) -> &str {
        &self.entries[self.cursor]
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false; a history holds at least one version.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// Record a new version.
    ///
    /// Committing the active text again changes nothing.
    pub fn commit(&mut self, text: impl Into<String>) -> &str {
        let text = text.into();
        if text != self.entries[self.cursor] {
            self.entries.truncate(self.cursor + 1);
            self.entries.push(text);
            self.cursor = self.entries.len() - 1;
        }
        self.current()
    }

    pub fn undo(&mut self) -> &str {
        if self.can_undo() {
            self.cursor -= 1;
        }
        self.current()
    }

    pub fn redo(&mut self) -> &str {
        if self.can_redo() {
            self.cursor += 1;
        }
        self.current()
    }

    /// Commit an empty version. The cleared text remains undoable.
    pub fn clear(&mut self) -> &str {
        self.commit(String::new())
    }

    /// Replace a pristine history with `initial`.
    ///
    /// Used when an editing session opens on existing text, e.g. a snippet
    /// loaded from a share link. A history that already holds edits is left
    /// alone, as is an empty `initial`.
    pub fn seed(&mut self, initial: impl Into<String>) -> &str {
        let initial = initial.into();
        if !initial.is_empty() && self.entries.len() == 1 && self.entries[0].is_empty() {
            self.entries[0] = initial;
            self.cursor = 0;
        }
        self.current()
    }

    /// Restore the invariants of a state read from outside.
    fn repaired(mut self) -> Self {
        if self.entries.is_empty() {
            self.entries.push(String::new());
        }
        if self.cursor >= self.entries.len() {
            self.cursor = self.entries.len() - 1;
        }
        self
    }
}

/// Persists an [`EditHistory`] in a key-value backend.
///
/// Writers are last-write-wins; there is no merging between sessions.
#[derive(Clone)]
pub struct HistoryRepository {
    storage: Arc<dyn Storage>,
    key: String,
}

impl HistoryRepository {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self::with_key(storage, HISTORY_KEY)
    }

    pub fn with_key(storage: Arc<dyn Storage>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    /// Load the saved history, or a fresh one if none was saved.
    ///
    /// A saved state that cannot be decoded is discarded with a warning.
    pub async fn load(&self) -> StorageResult<EditHistory> {
        match self.storage.read::<EditHistory>(&self.key).await {
            Ok(Some(history)) => Ok(history.repaired()),
            Ok(None) => Ok(EditHistory::new()),
            Err(snipfmt_storage::StorageError::Json(e)) => {
                warn!(key = %self.key, error = %e, "Discarding unreadable edit history");
                Ok(EditHistory::new())
            }
            Err(e) => Err(e),
        }
    }

    pub async fn save(&self, history: &EditHistory) -> StorageResult<()> {
        debug!(key = %self.key, len = history.len(), cursor = history.cursor(), "Saving edit history");
        self.storage.write(&self.key, history).await
    }
}
