//! Core logic for snipfmt.
//!
//! - Configuration (file and environment layers, validated once at startup)
//! - The expiring snippet store over any [`snipfmt_storage::Storage`] backend
//! - Linear edit history with persistence
//! - Remote and live (debounced, sequenced) formatting
//! - A client for the share API

pub mod backend;
pub mod config;
pub mod error;
pub mod format;
pub mod history;
pub mod share;
pub mod snippet;

pub use backend::build_storage;
pub use config::{BackendKind, Config, StorageSettings};
pub use error::{ConfigError, CoreError, CoreResult};
pub use format::{FormatError, FormatOutcome, Formatter, LiveFormatter, RemoteFormatter};
pub use history::{EditHistory, HistoryRepository};
pub use share::{ShareClient, ShareCreated, ShareError};
pub use snippet::{ShareReceipt, SnippetRecord, SnippetStore, StoreError, SNIPPET_TTL_MS};
