//! Format and watch command handlers.

use super::{print_text, read_input};
use anyhow::Context;
use notify::{EventKind, RecursiveMode, Watcher};
use snipfmt_core::{Config, FormatError, FormatOutcome, Formatter, LiveFormatter, RemoteFormatter};
use std::path::Path;
use tracing::{debug, warn};

/// Format a file (or stdin) once and print the result.
pub async fn format(config: &Config, file: Option<&Path>) -> anyhow::Result<()> {
    let code = read_input(file).await?;
    let formatter = RemoteFormatter::new(config.formatter_url());

    match formatter.format(&code).await {
        Ok(formatted) => {
            print_text(&formatted);
            Ok(())
        }
        Err(FormatError::Rejected(message)) => anyhow::bail!("{message}"),
        Err(e) => Err(e).with_context(|| format!("Formatter at {} failed", formatter.url())),
    }
}

/// Re-format `path` after each change until Ctrl+C.
///
/// The parent directory is watched so editors that save by replacing the
/// file are still picked up.
pub async fn watch(config: &Config, path: &Path) -> anyhow::Result<()> {
    let path = tokio::fs::canonicalize(path)
        .await
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let dir = path
        .parent()
        .context("Watched file has no parent directory")?
        .to_path_buf();

    let live = LiveFormatter::new(
        RemoteFormatter::new(config.formatter_url()),
        config.debounce(),
    );
    let mut outcomes = live.subscribe();

    let (tx, mut events) = tokio::sync::mpsc::unbounded_channel();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        let _ = tx.send(res);
    })?;
    watcher.watch(&dir, RecursiveMode::NonRecursive)?;

    let mut last = tokio::fs::read_to_string(&path).await?;
    live.submit(last.clone());
    eprintln!("Watching {} (Ctrl+C to stop)", path.display());

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(Ok(event)) => {
                    let relevant = matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_))
                        && event.paths.iter().any(|p| p.file_name() == path.file_name());
                    if !relevant {
                        continue;
                    }
                    match tokio::fs::read_to_string(&path).await {
                        Ok(text) if text != last => {
                            let seq = live.submit(text.clone());
                            debug!(seq, "Submitted change");
                            last = text;
                        }
                        Ok(_) => {}
                        Err(e) => warn!(error = %e, "Failed to read watched file"),
                    }
                }
                Some(Err(e)) => warn!(error = %e, "File watch error"),
                None => break,
            },
            changed = outcomes.changed() => {
                if changed.is_err() {
                    break;
                }
                let outcome = outcomes.borrow_and_update().clone();
                if let Some(outcome) = outcome {
                    print_outcome(outcome);
                }
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    Ok(())
}

fn print_outcome(outcome: FormatOutcome) {
    match outcome.result {
        Ok(formatted) => {
            eprintln!("--- #{} ---", outcome.seq);
            print_text(&formatted);
        }
        Err(e) => eprintln!("--- #{} --- {}", outcome.seq, e),
    }
}
