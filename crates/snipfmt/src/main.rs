//! snipfmt - format, share and version code snippets.
//!
//! This is the main entry point for the snipfmt CLI.

mod commands;

use clap::{Parser, Subcommand};
use commands::HistoryCommands;
use snipfmt_core::Config;
use snipfmt_util::log::LogConfig;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "snipfmt")]
#[command(author, version, about = "Format, share and version code snippets", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Additional config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Subcommand
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Address to bind to
        #[arg(short, long, default_value = "127.0.0.1:3000")]
        address: SocketAddr,
    },
    /// Share code and print its URL
    Share {
        /// File to share (stdin if omitted)
        file: Option<PathBuf>,
    },
    /// Print the code of a shared snippet
    Fetch {
        /// Share ID
        id: String,

        /// Start the saved edit history from the snippet
        #[arg(long)]
        edit: bool,
    },
    /// Format code once and print the result
    Format {
        /// File to format (stdin if omitted)
        file: Option<PathBuf>,
    },
    /// Re-format a file every time it changes
    Watch {
        /// File to watch
        file: PathBuf,
    },
    /// Inspect and edit the saved edit history
    History {
        #[command(subcommand)]
        command: HistoryCommands,
    },
    /// Print version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let serving = matches!(cli.command, Commands::Serve { .. });
    snipfmt_util::log::init(LogConfig {
        level: match (cli.verbose, serving) {
            (true, _) => tracing::Level::DEBUG,
            (false, true) => tracing::Level::INFO,
            (false, false) => tracing::Level::WARN,
        },
        http: serving || cli.verbose,
        ..Default::default()
    });

    if let Commands::Version = cli.command {
        print_version();
        return Ok(());
    }

    let (config, sources) = Config::load(cli.config.as_deref()).await?;
    for source in &sources {
        tracing::debug!(path = %source.display(), "Loaded config");
    }

    match cli.command {
        Commands::Serve { address } => commands::serve(&config, address).await,
        Commands::Share { file } => commands::share(&config, file.as_deref()).await,
        Commands::Fetch { id, edit } => commands::fetch(&config, &id, edit).await,
        Commands::Format { file } => commands::format(&config, file.as_deref()).await,
        Commands::Watch { file } => commands::watch(&config, &file).await,
        Commands::History { command } => commands::handle_history(&config, command).await,
        Commands::Version => Ok(()),
    }
}

/// Print version information.
fn print_version() {
    println!("snipfmt {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Format, share and version code snippets.");
}
