//! In-memory storage implementation for testing.

use crate::{Storage, StorageError, StorageResult};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory storage for testing.
///
/// This stores all data in memory and is not persistent.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    data: RwLock<HashMap<String, Value>>,
}

impl MemoryStorage {
    /// Create a new in-memory storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.data.read().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> StorageResult<Option<Value>> {
        let data = self
            .data
            .read()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;
        Ok(data.get(key).cloned())
    }

    async fn upsert(&self, key: &str, value: Value) -> StorageResult<()> {
        if key.is_empty() {
            return Err(StorageError::invalid_key("Key cannot be empty"));
        }
        let mut data = self
            .data
            .write()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;
        data.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let mut data = self
            .data
            .write()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;
        data.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_memory_storage() {
        let storage = MemoryStorage::new();
        let value = json!({"code": "package main", "createdAt": 1});

        storage.upsert("abc", value.clone()).await.unwrap();
        assert_eq!(storage.get("abc").await.unwrap(), Some(value));
        assert_eq!(storage.len(), 1);

        storage.delete("abc").await.unwrap();
        assert_eq!(storage.get("abc").await.unwrap(), None);
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn test_memory_storage_read_nonexistent() {
        let storage = MemoryStorage::new();
        assert!(storage.get("does-not-exist").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_storage_delete_nonexistent() {
        let storage = MemoryStorage::new();
        // Removing nonexistent key should not error
        storage.delete("does-not-exist").await.unwrap();
    }

    #[tokio::test]
    async fn test_memory_storage_overwrite() {
        let storage = MemoryStorage::new();

        storage.upsert("key", json!("first")).await.unwrap();
        storage.upsert("key", json!("second")).await.unwrap();

        assert_eq!(storage.get("key").await.unwrap(), Some(json!("second")));
        assert_eq!(storage.len(), 1);
    }

    #[tokio::test]
    async fn test_memory_storage_rejects_empty_key() {
        let storage = MemoryStorage::new();
        let err = storage.upsert("", json!(1)).await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
    }
}
