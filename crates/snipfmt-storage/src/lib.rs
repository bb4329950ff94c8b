//! Storage layer for snipfmt.
//!
//! This crate provides a flat, string-keyed key-value abstraction with
//! multiple backends:
//! - Hosted Edge Config store (production)
//! - JSON file storage (local installs and development)
//! - In-memory storage (for testing)
//!
//! Backends offer upsert, get and delete only. There are no transactions and
//! no range queries, and the hosted backend is eventually consistent.

pub mod edge_config;
pub mod error;
pub mod json;
pub mod memory;

pub use edge_config::{EdgeConfigSettings, EdgeConfigStorage};
pub use error::{StorageError, StorageResult};
pub use json::JsonStorage;
pub use memory::MemoryStorage;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

/// A trait for key-value storage backends.
///
/// Values are JSON documents. Implementations must be safe to share between
/// request handlers.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Short backend name used in logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Read a value.
    ///
    /// Returns `None` if the key doesn't exist.
    async fn get(&self, key: &str) -> StorageResult<Option<Value>>;

    /// Insert or replace a value.
    async fn upsert(&self, key: &str, value: Value) -> StorageResult<()>;

    /// Remove a value. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> StorageResult<()>;
}

impl dyn Storage {
    /// Read a value and decode it as `T`.
    pub async fn read<T: DeserializeOwned>(&self, key: &str) -> StorageResult<Option<T>> {
        match self.get(key).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Encode `value` as JSON and upsert it.
    pub async fn write<T: Serialize + Sync>(&self, key: &str, value: &T) -> StorageResult<()> {
        let value = serde_json::to_value(value)?;
        self.upsert(key, value).await
    }
}
