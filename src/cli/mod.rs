//! CLI helpers.
//!
//! Shared pieces of the `agent-forge` binary: path expansion, tracing setup and
//! argument parsing helpers.

use std::io::Read;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use crate::config::LoggingConfig;
use crate::logging::Payload;

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "~/.agent-forge/config.json";

/// Expand tilde (~) in paths.
pub fn expand_path(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    if let Some(rest) = path_str.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    path.to_path_buf()
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level; `verbose` raises the
/// configured level to `debug`.
pub fn init_tracing(config: &LoggingConfig, verbose: bool) {
    let level = if verbose { "debug" } else { config.level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    if config.json_format {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// Read an argument, taking it from stdin when it is `-`.
pub fn read_arg_or_stdin(arg: &str) -> std::io::Result<String> {
    if arg != "-" {
        return Ok(arg.to_string());
    }
    let mut buf = String::new();
    std::io::stdin().read_to_string(&mut buf)?;
    Ok(buf.trim_end_matches('\n').to_string())
}

/// Read a command-line payload (`-` reads stdin).
///
/// Payloads always arrive as text, so they go through the full text
/// normalization, including unwrapping JSON nested inside string values.
pub fn payload_arg(arg: &str) -> std::io::Result<Payload> {
    read_arg_or_stdin(arg).map(Payload::Text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_expand_path_leaves_plain_paths() {
        assert_eq!(expand_path(Path::new("/tmp/x.json")), PathBuf::from("/tmp/x.json"));
        assert_eq!(expand_path(Path::new("rel/x.json")), PathBuf::from("rel/x.json"));
    }

    #[test]
    fn test_expand_path_home() {
        if let Ok(home) = std::env::var("HOME") {
            assert_eq!(
                expand_path(Path::new("~/.agent-forge/config.json")),
                PathBuf::from(home).join(".agent-forge/config.json")
            );
        }
    }

    #[test]
    fn test_payload_arg_stays_text() {
        let payload = payload_arg(r#"{"p": "{\"m\": 1}"}"#).unwrap();
        assert_eq!(payload, Payload::Text(r#"{"p": "{\"m\": 1}"}"#.to_string()));

        let restored: Value = serde_json::from_str(&payload.normalize()).unwrap();
        assert_eq!(restored["p"], "{\n    \"m\": 1\n}");
    }

    #[test]
    fn test_read_arg_passthrough() {
        assert_eq!(read_arg_or_stdin("hello").unwrap(), "hello");
    }
}
