//! Command handlers for the snipfmt CLI.

pub mod format;
pub mod history;
pub mod serve;
pub mod share;

pub use format::*;
pub use history::*;
pub use serve::*;
pub use share::*;

use anyhow::Context;
use std::path::Path;
use tokio::io::AsyncReadExt;

/// Read a whole file, or stdin when no file is given.
pub async fn read_input(file: Option<&Path>) -> anyhow::Result<String> {
    match file {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut input = String::new();
            tokio::io::stdin()
                .read_to_string(&mut input)
                .await
                .context("Failed to read stdin")?;
            Ok(input)
        }
    }
}

/// Print text to stdout, ending with exactly one newline if it has none.
pub fn print_text(text: &str) {
    if text.ends_with('\n') {
        print!("{text}");
    } else {
        println!("{text}");
    }
}
