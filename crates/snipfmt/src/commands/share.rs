//! Share and fetch command handlers.

use super::{open_history, print_text, read_input, seed_history};
use snipfmt_core::{Config, ShareClient};
use std::path::Path;

/// Share a file (or stdin) through the configured server and print the URL.
pub async fn share(config: &Config, file: Option<&Path>) -> anyhow::Result<()> {
    let code = read_input(file).await?;
    let client = ShareClient::new(Some(config.server_url()));

    let created = client.create(&code).await?;
    println!("{}", created.url);
    eprintln!(
        "Share ID {} expires in {} hours",
        created.share_id,
        created.expires_in / (60 * 60 * 1000)
    );
    Ok(())
}

/// Print the code of a shared snippet.
///
/// With `edit`, a saved history without edits starts from the snippet.
pub async fn fetch(config: &Config, id: &str, edit: bool) -> anyhow::Result<()> {
    let client = ShareClient::new(Some(config.server_url()));
    let code = client.fetch(id).await?;

    if edit {
        let repo = open_history(config)?;
        if seed_history(&repo, &code).await? {
            eprintln!("Edit history starts from {id}");
        } else {
            eprintln!("Edit history already has edits; left unchanged");
        }
    }

    print_text(&code);
    Ok(())
}
