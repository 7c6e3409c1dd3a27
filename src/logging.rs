//! Tracing subscriber setup shared by the binaries
//!
//! Logs go to stderr so stdout stays free for MCP traffic. An optional file
//! layer (no ANSI colours) mirrors everything to `file`. Set `json` for
//! JSON lines on stderr.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when neither `RUST_LOG` nor the config sets one
pub const DEFAULT_FILTER: &str = "info,notes_orchestrator=debug";

/// Logging section of the configuration
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directives, e.g. `"warn,notes_orchestrator=info"`
    pub filter: Option<String>,
    /// Also append logs to this file
    pub file: Option<PathBuf>,
    /// Emit stderr logs as JSON lines
    pub json: bool,
}

/// Pick the filter directives: `RUST_LOG`, then the config, then the default
fn filter_directives(from_env: Option<String>, configured: Option<&str>) -> String {
    from_env
        .filter(|s| !s.trim().is_empty())
        .or_else(|| configured.map(str::to_string))
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init(config: &LogConfig) -> Result<()> {
    let directives = filter_directives(std::env::var("RUST_LOG").ok(), config.filter.as_deref());
    let filter = EnvFilter::try_new(&directives)
        .with_context(|| format!("invalid log filter: {}", directives))?;

    let file_layer = match &config.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    let (json_layer, text_layer) = if config.json {
        (Some(fmt::layer().json().with_writer(std::io::stderr)), None)
    } else {
        (None, Some(fmt::layer().with_writer(std::io::stderr)))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .with(file_layer)
        .try_init()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_precedence() {
        assert_eq!(
            filter_directives(Some("trace".into()), Some("warn")),
            "trace"
        );
        assert_eq!(filter_directives(Some("  ".into()), Some("warn")), "warn");
        assert_eq!(filter_directives(None, None), DEFAULT_FILTER);
    }

    #[test]
    fn test_log_config_from_yaml() {
        let config: LogConfig =
            serde_yaml::from_str("file: slite_integration.log\n").unwrap();
        assert_eq!(config.file, Some(PathBuf::from("slite_integration.log")));
        assert!(config.filter.is_none());
        assert!(!config.json);

        let config: LogConfig = serde_yaml::from_str("json: true\nfilter: warn\n").unwrap();
        assert!(config.json);
        assert_eq!(config.filter.as_deref(), Some("warn"));
    }
}
