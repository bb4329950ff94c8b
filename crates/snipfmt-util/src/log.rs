//! Logging setup using tracing.
//!
//! One subscriber for the whole process, writing to stderr so command
//! output on stdout stays pipeable.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Crates whose events are governed by [`LogConfig::level`].
const WORKSPACE_TARGETS: [&str; 4] = [
    "snipfmt",
    "snipfmt_core",
    "snipfmt_storage",
    "snipfmt_server",
];

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Whether to print logs to stderr.
    pub print: bool,
    /// Level applied to the snipfmt crates. Everything else logs at warn.
    pub level: Level,
    /// Whether HTTP request tracing (`tower_http`) is included.
    pub http: bool,
    /// Whether to include file/line info in logs.
    pub include_location: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            print: true,
            level: Level::INFO,
            http: false,
            include_location: false,
        }
    }
}

impl LogConfig {
    /// Build the filter directive for this configuration.
    ///
    /// `RUST_LOG` takes precedence when set.
    pub fn directive(&self) -> String {
        let level = self.level.as_str().to_ascii_lowercase();
        let mut directive = String::from("warn");
        for target in WORKSPACE_TARGETS {
            directive.push_str(&format!(",{target}={level}"));
        }
        if self.http {
            directive.push_str(&format!(",tower_http={level}"));
        }
        directive
    }
}

/// Install the global subscriber.
///
/// Call once at startup. Later calls leave the first subscriber in place.
pub fn init(config: LogConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.directive()));
    let registry = tracing_subscriber::registry().with(filter);

    if !config.print {
        let _ = registry.try_init();
        return;
    }

    let stderr = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(config.include_location)
        .with_line_number(config.include_location);
    let _ = registry.with(stderr).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_prints_at_info() {
        let config = LogConfig::default();
        assert!(config.print);
        assert!(!config.http);
        assert_eq!(config.level, Level::INFO);
    }

    #[test]
    fn test_directive_covers_workspace_crates() {
        let directive = LogConfig::default().directive();
        assert!(directive.starts_with("warn,"));
        for target in WORKSPACE_TARGETS {
            assert!(directive.contains(&format!("{target}=info")), "{directive}");
        }
    }

    #[test]
    fn test_directive_includes_http_only_when_enabled() {
        let mut config = LogConfig {
            level: Level::DEBUG,
            ..Default::default()
        };
        assert!(config.directive().contains("snipfmt_core=debug"));
        assert!(!config.directive().contains("tower_http"));

        config.http = true;
        assert!(config.directive().ends_with(",tower_http=debug"));
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init(LogConfig {
            print: false,
            ..Default::default()
        });
        init(LogConfig::default());
    }
}
