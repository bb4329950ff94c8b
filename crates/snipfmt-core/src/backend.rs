//! Storage backend construction from validated settings.

use crate::config::StorageSettings;
use crate::error::CoreResult;
use snipfmt_storage::{EdgeConfigStorage, JsonStorage, MemoryStorage, Storage};
use std::sync::Arc;
use tracing::info;

/// Build the storage backend described by `settings`.
pub fn build_storage(settings: StorageSettings) -> CoreResult<Arc<dyn Storage>> {
    let storage: Arc<dyn Storage> = match settings {
        StorageSettings::EdgeConfig(settings) => {
            info!(api_url = %settings.api_url, "Using hosted key-value storage");
            Arc::new(EdgeConfigStorage::new(settings)?)
        }
        StorageSettings::File(dir) => {
            info!(path = %dir.display(), "Using file storage");
            Arc::new(JsonStorage::new(dir))
        }
        StorageSettings::Memory => {
            info!("Using in-memory storage; snippets are lost on restart");
            Arc::new(MemoryStorage::new())
        }
    };
    Ok(storage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_env(|name| map.get(name).cloned())
    }

    #[test]
    fn test_build_memory() {
        let settings = config(&[("SNIPFMT_BACKEND", "memory")])
            .storage_settings()
            .unwrap();
        assert_eq!(build_storage(settings).unwrap().name(), "memory");
    }

    #[test]
    fn test_build_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings = config(&[
            ("SNIPFMT_BACKEND", "file"),
            ("SNIPFMT_DATA_DIR", dir.path().to_str().unwrap()),
        ])
        .storage_settings()
        .unwrap();
        assert_eq!(build_storage(settings).unwrap().name(), "file");
    }

    #[test]
    fn test_build_edge_config() {
        let settings = config(&[
            (
                "EDGE_CONFIG",
                "https://edge-config.vercel.com/ecfg_abc?token=read-token",
            ),
            ("EDGE_CONFIG_ID", "ecfg_abc"),
            ("VERCEL_API_TOKEN", "write-token"),
        ])
        .storage_settings()
        .unwrap();
        assert_eq!(build_storage(settings).unwrap().name(), "edge-config");
    }
}
