//! Server command handler.

use anyhow::Context;
use snipfmt_core::{build_storage, Config, RemoteFormatter, SnippetStore};
use snipfmt_server::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

/// Validate configuration, build the backend and serve the API.
pub async fn serve(config: &Config, address: SocketAddr) -> anyhow::Result<()> {
    let settings = config
        .storage_settings()
        .context("Invalid storage configuration")?;
    let storage = build_storage(settings)?;

    info!(
        "Starting snipfmt server on {} (formatter: {})",
        address,
        config.formatter_url()
    );

    let state = AppState::new(
        SnippetStore::new(storage),
        Arc::new(RemoteFormatter::new(config.formatter_url())),
    )
    .with_public_url(config.public_url())
    .with_credentials(config.credential_presence());

    snipfmt_server::serve(state, address).await?;
    Ok(())
}
