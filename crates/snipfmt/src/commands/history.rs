//! Edit history command handlers.

use super::{print_text, read_input};
use anyhow::Context;
use clap::Subcommand;
use snipfmt_core::{Config, EditHistory, HistoryRepository};
use snipfmt_storage::JsonStorage;
use std::path::PathBuf;
use std::sync::Arc;

/// History subcommands.
#[derive(Subcommand)]
pub enum HistoryCommands {
    /// Print the active version and the history position
    Show,
    /// Record a new version from a file (stdin if omitted)
    Commit {
        /// File holding the new version
        file: Option<PathBuf>,
    },
    /// Step back one version
    Undo,
    /// Step forward one version
    Redo,
    /// Record an empty version
    Clear,
}

/// Open the saved history under the configured data directory.
pub fn open_history(config: &Config) -> anyhow::Result<HistoryRepository> {
    let data_dir = config
        .data_dir()
        .context("Could not determine data directory")?;
    Ok(HistoryRepository::new(Arc::new(JsonStorage::new(data_dir))))
}

/// Start the saved history from `code` if it holds no edits yet.
///
/// Returns whether the history now starts from `code`.
pub async fn seed_history(repo: &HistoryRepository, code: &str) -> anyhow::Result<bool> {
    let saved = repo.load().await?;
    let mut history = saved.clone();
    history.seed(code);
    if history == saved {
        return Ok(false);
    }
    repo.save(&history).await?;
    Ok(true)
}

/// Handle history commands.
pub async fn handle_history(config: &Config, command: HistoryCommands) -> anyhow::Result<()> {
    let repo = open_history(config)?;
    let mut history = repo.load().await?;

    match command {
        HistoryCommands::Show => {
            print_status(&history);
            print_text(history.current());
            return Ok(());
        }
        HistoryCommands::Commit { file } => {
            let text = read_input(file.as_deref()).await?;
            history.commit(text);
        }
        HistoryCommands::Undo => {
            history.undo();
        }
        HistoryCommands::Redo => {
            history.redo();
        }
        HistoryCommands::Clear => {
            history.clear();
        }
    }

    repo.save(&history).await?;
    print_text(history.current());
    Ok(())
}

fn print_status(history: &EditHistory) {
    eprintln!(
        "Version {} of {} (undo: {}, redo: {})",
        history.cursor() + 1,
        history.len(),
        if history.can_undo() { "yes" } else { "no" },
        if history.can_redo() { "yes" } else { "no" },
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repository(dir: &std::path::Path) -> HistoryRepository {
        HistoryRepository::new(Arc::new(JsonStorage::new(dir)))
    }

    #[tokio::test]
    async fn test_seed_history_starts_pristine_history() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repository(dir.path());

        assert!(seed_history(&repo, "package shared").await.unwrap());

        let history = repo.load().await.unwrap();
        assert_eq!(history.current(), "package shared");
        assert_eq!(history.len(), 1);
        assert!(!history.can_undo());
    }

    #[tokio::test]
    async fn test_seed_history_keeps_existing_edits() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repository(dir.path());
        let mut history = repo.load().await.unwrap();
        history.commit("package mine");
        repo.save(&history).await.unwrap();

        assert!(!seed_history(&repo, "package shared").await.unwrap());
        assert_eq!(repo.load().await.unwrap().current(), "package mine");
    }

    #[tokio::test]
    async fn test_seed_history_ignores_empty_code() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repository(dir.path());

        assert!(!seed_history(&repo, "").await.unwrap());
        assert_eq!(repo.load().await.unwrap(), EditHistory::new());
    }
}
