//! Configuration management for snipfmt.
//!
//! Configuration is loaded from multiple sources and merged:
//! 1. Global config: `~/.config/snipfmt/config.json`
//! 2. An explicit config file passed on the command line
//! 3. Environment overrides: `SNIPFMT_*` variables and the hosted store's
//!    `EDGE_CONFIG`, `EDGE_CONFIG_ID` and `VERCEL_API_TOKEN`
//!
//! Storage credentials are validated once, at startup, by
//! [`Config::storage_settings`]. Nothing downstream re-checks them.

use crate::error::{ConfigError, CoreResult};
use serde::{Deserialize, Serialize};
use snipfmt_storage::edge_config::{DEFAULT_API_URL, DEFAULT_TIMEOUT};
use snipfmt_storage::EdgeConfigSettings;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default formatter endpoint (a local gofmt service).
pub const DEFAULT_FORMATTER_URL: &str = "http://localhost:8080/format";

/// Default base URL of a snipfmt server.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:3000";

/// Default debounce window for live formatting.
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

/// Main configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Snippet and history storage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageConfig>,

    /// HTTP server settings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerConfig>,

    /// Remote formatter settings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatter: Option<FormatterConfig>,

    /// Settings used by CLI commands that talk to a server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<ClientConfig>,
}

/// Which key-value backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Hosted Edge Config store.
    EdgeConfig,
    /// JSON files under the data directory.
    File,
    /// Process memory; lost on exit.
    Memory,
}

impl BackendKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "edge-config" | "edgeconfig" | "edge_config" => Some(Self::EdgeConfig),
            "file" | "json" => Some(Self::File),
            "memory" => Some(Self::Memory),
            _ => None,
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Backend; defaults to Edge Config when a connection string is set,
    /// otherwise to the file backend. Kept as written and checked by
    /// [`Config::backend`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,

    /// Root directory for the file backend and the edit history.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// Hosted store credentials.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edge_config: Option<EdgeConfigConfig>,
}

/// Edge Config credentials.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeConfigConfig {
    /// Read connection string (`EDGE_CONFIG`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_string: Option<String>,

    /// Store id for writes (`EDGE_CONFIG_ID`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edge_config_id: Option<String>,

    /// Management API token (`VERCEL_API_TOKEN`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,

    /// Management API base URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

/// Server configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Public origin used for share URLs when a request carries no `Origin`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,
}

/// Formatter configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatterConfig {
    /// Formatter endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Quiet period before a live format request is sent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debounce_ms: Option<u64>,
}

/// Client configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the snipfmt server used by `share` and `fetch`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,
}

/// Storage backend settings after validation.
#[derive(Debug, Clone)]
pub enum StorageSettings {
    EdgeConfig(EdgeConfigSettings),
    File(PathBuf),
    Memory,
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Returns the merged config and the files it was read from.
    pub async fn load(explicit: Option<&Path>) -> CoreResult<(Self, Vec<PathBuf>)> {
        let mut config = Config::default();
        let mut sources = Vec::new();

        // 1. Global config
        if let Some(global_dir) = Self::global_config_dir() {
            let path = global_dir.join("config.json");
            if path.exists() {
                config = config.merge(Self::load_file(&path).await?);
                sources.push(path);
            }
        }

        // 2. Explicit file
        if let Some(path) = explicit {
            config = config.merge(Self::load_file(path).await?);
            sources.push(path.to_path_buf());
        }

        // 3. Environment
        config = config.merge(Self::from_env(|name| std::env::var(name).ok()));

        Ok((config, sources))
    }

    /// Get the global config directory.
    pub fn global_config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("snipfmt"))
    }

    /// Load configuration from a file.
    pub async fn load_file(path: &Path) -> CoreResult<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::parse(&content, &path.display().to_string())
    }

    fn parse(content: &str, source: &str) -> CoreResult<Self> {
        serde_json::from_str(content).map_err(|e| {
            ConfigError::InvalidJson {
                path: source.to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Build the environment layer using `lookup` to read variables.
    ///
    /// Blank values are ignored.
    pub fn from_env(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let edge_config = EdgeConfigConfig {
            connection_string: var("EDGE_CONFIG"),
            edge_config_id: var("EDGE_CONFIG_ID"),
            api_token: var("VERCEL_API_TOKEN"),
            api_url: var("SNIPFMT_EDGE_CONFIG_API_URL"),
        };
        let storage = StorageConfig {
            backend: var("SNIPFMT_BACKEND"),
            data_dir: var("SNIPFMT_DATA_DIR").map(PathBuf::from),
            edge_config: (edge_config != EdgeConfigConfig::default()).then_some(edge_config),
        };
        let formatter = FormatterConfig {
            url: var("SNIPFMT_FORMATTER_URL"),
            debounce_ms: var("SNIPFMT_DEBOUNCE_MS").and_then(|v| v.parse().ok()),
        };

        Config {
            storage: (storage != StorageConfig::default()).then_some(storage),
            server: var("SNIPFMT_PUBLIC_URL").map(|url| ServerConfig {
                public_url: Some(url),
            }),
            formatter: (formatter != FormatterConfig::default()).then_some(formatter),
            client: var("SNIPFMT_SERVER_URL").map(|url| ClientConfig {
                server_url: Some(url),
            }),
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(mut self, other: Self) -> Self {
        self.storage = match (self.storage, other.storage) {
            (Some(base), Some(other)) => Some(base.merge(other)),
            (base, None) => base,
            (None, other) => other,
        };
        self.server = match (self.server, other.server) {
            (Some(base), Some(other)) => Some(ServerConfig {
                public_url: other.public_url.or(base.public_url),
            }),
            (base, None) => base,
            (None, other) => other,
        };
        self.formatter = match (self.formatter, other.formatter) {
            (Some(base), Some(other)) => Some(FormatterConfig {
                url: other.url.or(base.url),
                debounce_ms: other.debounce_ms.or(base.debounce_ms),
            }),
            (base, None) => base,
            (None, other) => other,
        };
        self.client = match (self.client, other.client) {
            (Some(base), Some(other)) => Some(ClientConfig {
                server_url: other.server_url.or(base.server_url),
            }),
            (base, None) => base,
            (None, other) => other,
        };
        self
    }

    fn edge_config(&self) -> Option<&EdgeConfigConfig> {
        self.storage.as_ref().and_then(|s| s.edge_config.as_ref())
    }

    /// The configured backend, or the inferred default.
    ///
    /// An unrecognised backend name is an error rather than a fallback.
    pub fn backend(&self) -> Result<BackendKind, ConfigError> {
        if let Some(name) = self.storage.as_ref().and_then(|s| s.backend.as_deref()) {
            return BackendKind::parse(name).ok_or_else(|| {
                ConfigError::invalid(
                    "SNIPFMT_BACKEND",
                    format!("unknown backend `{name}` (expected edge-config, file or memory)"),
                )
            });
        }
        Ok(match self.edge_config().and_then(|e| e.connection_string.as_ref()) {
            Some(_) => BackendKind::EdgeConfig,
            None => BackendKind::File,
        })
    }

    /// Data directory for the file backend and the edit history.
    pub fn data_dir(&self) -> Option<PathBuf> {
        self.storage
            .as_ref()
            .and_then(|s| s.data_dir.clone())
            .or_else(|| dirs::data_local_dir().map(|d| d.join("snipfmt")))
    }

    /// Formatter endpoint.
    pub fn formatter_url(&self) -> &str {
        self.formatter
            .as_ref()
            .and_then(|f| f.url.as_deref())
            .unwrap_or(DEFAULT_FORMATTER_URL)
    }

    /// Debounce window for live formatting.
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(
            self.formatter
                .as_ref()
                .and_then(|f| f.debounce_ms)
                .unwrap_or(DEFAULT_DEBOUNCE_MS),
        )
    }

    /// Fallback public origin for share URLs.
    pub fn public_url(&self) -> &str {
        self.server
            .as_ref()
            .and_then(|s| s.public_url.as_deref())
            .unwrap_or(DEFAULT_SERVER_URL)
    }

    /// Server base URL used by client commands.
    pub fn server_url(&self) -> &str {
        self.client
            .as_ref()
            .and_then(|c| c.server_url.as_deref())
            .unwrap_or(DEFAULT_SERVER_URL)
    }

    /// Whether each hosted store credential is present, for diagnostics.
    /// Never exposes the values.
    pub fn credential_presence(&self) -> [(&'static str, bool); 3] {
        let edge = self.edge_config();
        [
            (
                "EDGE_CONFIG",
                edge.and_then(|e| e.connection_string.as_ref()).is_some(),
            ),
            (
                "EDGE_CONFIG_ID",
                edge.and_then(|e| e.edge_config_id.as_ref()).is_some(),
            ),
            (
                "VERCEL_API_TOKEN",
                edge.and_then(|e| e.api_token.as_ref()).is_some(),
            ),
        ]
    }

    /// Validate storage settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.storage_settings().map(|_| ())
    }

    /// Resolve and validate the storage backend settings.
    pub fn storage_settings(&self) -> Result<StorageSettings, ConfigError> {
        match self.backend()? {
            BackendKind::Memory => Ok(StorageSettings::Memory),
            BackendKind::File => {
                let dir = self.data_dir().ok_or_else(|| {
                    ConfigError::InvalidPath("could not determine data directory".to_string())
                })?;
                Ok(StorageSettings::File(dir.join("snippets")))
            }
            BackendKind::EdgeConfig => {
                let edge = self.edge_config().cloned().unwrap_or_default();
                let connection_string = edge
                    .connection_string
                    .ok_or_else(|| ConfigError::missing("EDGE_CONFIG"))?;
                let edge_config_id = edge
                    .edge_config_id
                    .ok_or_else(|| ConfigError::missing("EDGE_CONFIG_ID"))?;
                let api_token = edge
                    .api_token
                    .ok_or_else(|| ConfigError::missing("VERCEL_API_TOKEN"))?;

                let url = url::Url::parse(&connection_string)
                    .map_err(|e| ConfigError::invalid("EDGE_CONFIG", e.to_string()))?;
                if !url.query_pairs().any(|(k, v)| k == "token" && !v.is_empty()) {
                    return Err(ConfigError::invalid(
                        "EDGE_CONFIG",
                        "connection string has no token parameter",
                    ));
                }

                Ok(StorageSettings::EdgeConfig(EdgeConfigSettings {
                    connection_string,
                    edge_config_id,
                    api_token,
                    api_url: edge.api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
                    timeout: DEFAULT_TIMEOUT,
                }))
            }
        }
    }
}

impl StorageConfig {
    fn merge(self, other: Self) -> Self {
        let edge_config = match (self.edge_config, other.edge_config) {
            (Some(base), Some(other)) => Some(EdgeConfigConfig {
                connection_string: other.connection_string.or(base.connection_string),
                edge_config_id: other.edge_config_id.or(base.edge_config_id),
                api_token: other.api_token.or(base.api_token),
                api_url: other.api_url.or(base.api_url),
            }),
            (base, None) => base,
            (None, other) => other,
        };
        Self {
            backend: other.backend.or(self.backend),
            data_dir: other.data_dir.or(self.data_dir),
            edge_config,
        }
    }
}
