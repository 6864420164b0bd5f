//! Configuration.
//!
//! Settings live in a JSON file. Every field has a default, so an empty
//! object (or no file at all) is a valid configuration. The Google secrets can
//! also come from the environment.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use crate::error::ConfigError;
use crate::retry::RetryPolicy;
use crate::search::{DEFAULT_NUM_RESULTS, MAX_NUM_RESULTS, MIN_NUM_RESULTS};

/// Environment variable holding the Google API key.
pub const GOOGLE_API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Environment variable holding the Google custom search engine id.
pub const GOOGLE_CSE_ID_ENV: &str = "GOOGLE_CUSTOM_SEARCH_ENGINE_ID";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Search settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Call trace log settings
    #[serde(default)]
    pub trace: TraceConfig,

    /// Diagnostic logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which provider backs the `web_search` action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    #[value(name = "duckduckgo")]
    DuckDuckGo,
    Google,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::DuckDuckGo => write!(f, "duckduckgo"),
            ProviderKind::Google => write!(f, "google"),
        }
    }
}

/// Search configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Provider used by `web_search`
    #[serde(default)]
    pub provider: ProviderKind,

    /// Results requested per query
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Attempts made when the provider returns nothing
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Pause between attempts in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Growth factor applied to the pause after each attempt
    #[serde(default = "default_backoff_multiplier")]
    pub retry_backoff_multiplier: f64,

    /// Randomize pauses by +/- 50%
    #[serde(default)]
    pub retry_jitter: bool,

    /// HTTP timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User-Agent header sent to providers
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Google API key
    #[serde(default)]
    pub google_api_key: Option<Secret>,

    /// Google custom search engine id
    #[serde(default)]
    pub google_custom_search_engine_id: Option<Secret>,
}

/// Call trace configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceConfig {
    /// Record executed actions
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Trace log file
    #[serde(default = "default_trace_log_file")]
    pub log_file: PathBuf,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Enable JSON logging format
    #[serde(default)]
    pub json_format: bool,
}

/// A configuration value that must not show up in logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The wrapped value.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret(***)")
    }
}

// Default value functions
fn default_max_results() -> usize {
    DEFAULT_NUM_RESULTS
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_backoff_multiplier() -> f64 {
    1.0
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("agent-forge/{}", env!("CARGO_PKG_VERSION"))
}

fn default_true() -> bool {
    true
}

fn default_trace_log_file() -> PathBuf {
    PathBuf::from("logs/agent_trace.log")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            max_results: default_max_results(),
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            retry_backoff_multiplier: default_backoff_multiplier(),
            retry_jitter: false,
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            google_api_key: None,
            google_custom_search_engine_id: None,
        }
    }
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            log_file: default_trace_log_file(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
        }
    }
}

impl SearchConfig {
    /// Retry policy for empty provider responses.
    pub fn retry_policy(&self) -> RetryPolicy {
        let delay = std::time::Duration::from_millis(self.retry_delay_ms);
        RetryPolicy {
            max_attempts: self.max_attempts,
            initial_delay: delay,
            max_delay: delay.saturating_mul(8).max(delay),
            backoff_multiplier: self.retry_backoff_multiplier,
            jitter: self.retry_jitter,
        }
    }

    /// Whether both Google secrets are present.
    pub fn has_google_credentials(&self) -> bool {
        self.google_api_key.is_some() && self.google_custom_search_engine_id.is_some()
    }
}

impl AppConfig {
    /// Create a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        serde_json::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Load from `path` if it exists, otherwise start from defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::FileNotFound(path)) => {
                tracing::debug!("No config at {}, using defaults", path);
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Save configuration to a JSON file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            }
        }

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Fill the Google secrets from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Fill the Google secrets from `lookup`. Non-empty values win over the file.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(GOOGLE_API_KEY_ENV).filter(|v| !v.is_empty()) {
            self.search.google_api_key = Some(Secret::new(key));
        }
        if let Some(id) = lookup(GOOGLE_CSE_ID_ENV).filter(|v| !v.is_empty()) {
            self.search.google_custom_search_engine_id = Some(Secret::new(id));
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let search = &self.search;

        if !(MIN_NUM_RESULTS..=MAX_NUM_RESULTS).contains(&search.max_results) {
            return Err(ConfigError::InvalidValue {
                key: "search.max_results".to_string(),
                reason: format!("must be between {} and {}", MIN_NUM_RESULTS, MAX_NUM_RESULTS),
            });
        }

        if search.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                key: "search.max_attempts".to_string(),
                reason: "at least one attempt is required".to_string(),
            });
        }

        if search.retry_backoff_multiplier < 1.0 {
            return Err(ConfigError::InvalidValue {
                key: "search.retry_backoff_multiplier".to_string(),
                reason: "must be 1.0 or greater".to_string(),
            });
        }

        if search.provider == ProviderKind::Google && !search.has_google_credentials() {
            return Err(ConfigError::MissingRequired(format!(
                "search.google_api_key and search.google_custom_search_engine_id (or {} and {})",
                GOOGLE_API_KEY_ENV, GOOGLE_CSE_ID_ENV
            )));
        }

        if self.trace.enabled && self.trace.log_file.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "trace.log_file".to_string(),
                reason: "a log file path is required when tracing is enabled".to_string(),
            });
        }

        Ok(())
    }
}
