//! Shareable snippet store with expiry.
//!
//! Snippets are written to the key-value backend under a random identifier
//! together with their creation and expiry timestamps. The backend is not
//! trusted to evict anything on time, so liveness is decided here on every
//! read: a record whose `expiresAt` has passed is reported as not found and
//! its entry is deleted on a best-effort basis.

use serde::{Deserialize, Serialize};
use snipfmt_storage::{Storage, StorageError};
use snipfmt_util::{Clock, Identifier, SystemClock};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// How long a shared snippet stays retrievable (24 hours).
pub const SNIPPET_TTL_MS: i64 = 24 * 60 * 60 * 1000;

/// Errors returned by [`SnippetStore`] operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The caller supplied unusable input.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No live record exists for the id.
    #[error("snippet not found or expired")]
    NotFound,

    /// The backend could not complete the operation. Safe to retry.
    #[error("storage backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Backend credentials are missing or were rejected.
    #[error("storage configuration error: {0}")]
    Configuration(String),
}

impl StoreError {
    /// Short message suitable for showing to an end user.
    ///
    /// Backend detail stays in the logs.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidInput(msg) => msg.clone(),
            Self::NotFound => "Shared code not found or expired".to_string(),
            Self::BackendUnavailable(_) => {
                "Storage is temporarily unavailable, please try again".to_string()
            }
            Self::Configuration(_) => "Sharing is not configured on this server".to_string(),
        }
    }
}

impl From<StorageError> for StoreError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Config(msg) => Self::Configuration(msg),
            other => Self::BackendUnavailable(other.to_string()),
        }
    }
}

/// A live snippet as returned by [`SnippetStore::get`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetRecord {
    pub id: String,
    pub text: String,
    pub created_at: i64,
    pub expires_at: i64,
}

impl SnippetRecord {
    /// Whether the record is retrievable at `now`.
    pub fn is_live(&self, now: i64) -> bool {
        now < self.expires_at
    }
}

/// Stored form of a snippet. The id is the key, not part of the value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSnippet {
    code: String,
    created_at: i64,
    expires_at: i64,
}

/// Result of a successful [`SnippetStore::put`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareReceipt {
    pub id: String,
    /// Fully qualified retrieval URL.
    pub url: String,
    /// Time-to-live in milliseconds.
    pub expires_in: i64,
}

/// Snippet store over any key-value backend.
#[derive(Clone)]
pub struct SnippetStore {
    storage: Arc<dyn Storage>,
    clock: Arc<dyn Clock>,
    ttl_ms: i64,
}

impl SnippetStore {
    /// Create a store using the system clock and the standard TTL.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self::with_clock(storage, Arc::new(SystemClock))
    }

    /// Create a store with an explicit clock.
    pub fn with_clock(storage: Arc<dyn Storage>, clock: Arc<dyn Clock>) -> Self {
        Self {
            storage,
            clock,
            ttl_ms: SNIPPET_TTL_MS,
        }
    }

    /// Time-to-live applied to new snippets, in milliseconds.
    pub fn ttl_ms(&self) -> i64 {
        self.ttl_ms
    }

    /// The backend this store writes to.
    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Store `text` and return its identifier and retrieval URL.
    ///
    /// `origin` is the scheme and host the URL is built from.
    pub async fn put(&self, text: &str, origin: &str) -> Result<ShareReceipt, StoreError> {
        if text.trim().is_empty() {
            return Err(StoreError::InvalidInput("Code cannot be empty".to_string()));
        }

        let id = Identifier::share();
        let now = self.clock.now_millis();
        let stored = StoredSnippet {
            code: text.to_string(),
            created_at: now,
            expires_at: now + self.ttl_ms,
        };

        self.storage
            .write(&id, &stored)
            .await
            .map_err(|e| {
                error!(id = %id, backend = self.storage.name(), error = %e, "Failed to store snippet");
                StoreError::from(e)
            })?;

        info!(id = %id, bytes = text.len(), "Stored snippet");
        Ok(ShareReceipt {
            url: format!("{}/share/{}", origin.trim_end_matches('/'), id),
            id,
            expires_in: self.ttl_ms,
        })
    }

    /// Fetch a live snippet.
    pub async fn get(&self, id: &str) -> Result<SnippetRecord, StoreError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(StoreError::InvalidInput("Share ID is required".to_string()));
        }
        // Ids are generated from a fixed alphabet; anything else was never stored.
        if !Identifier::is_well_formed(id) {
            debug!(id, "Rejecting malformed snippet id");
            return Err(StoreError::NotFound);
        }

        let value = self.storage.get(id).await.map_err(|e| {
            error!(id, backend = self.storage.name(), error = %e, "Failed to read snippet");
            StoreError::from(e)
        })?;

        let Some(value) = value else {
            debug!(id, "Snippet not found");
            return Err(StoreError::NotFound);
        };

        let stored: StoredSnippet = match serde_json::from_value(value) {
            Ok(stored) => stored,
            Err(e) => {
                warn!(id, error = %e, "Stored snippet has an unexpected shape");
                return Err(StoreError::NotFound);
            }
        };

        let record = SnippetRecord {
            id: id.to_string(),
            text: stored.code,
            created_at: stored.created_at,
            expires_at: stored.expires_at,
        };

        if !record.is_live(self.clock.now_millis()) {
            debug!(id, expires_at = record.expires_at, "Snippet expired");
            if let Err(e) = self.storage.delete(id).await {
                warn!(id, error = %e, "Failed to delete expired snippet");
            }
            return Err(StoreError::NotFound);
        }

        Ok(record)
    }

    /// Delete a snippet. Deleting an unknown id succeeds.
    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(StoreError::InvalidInput("Share ID is required".to_string()));
        }
        if !Identifier::is_well_formed(id) {
            return Ok(());
        }

        self.storage.delete(id).await.map_err(|e| {
            error!(id, backend = self.storage.name(), error = %e, "Failed to delete snippet");
            StoreError::from(e)
        })
    }
}
