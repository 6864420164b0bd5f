//! Error types for agent-forge.
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Main error type for agent-forge operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Search errors
    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    /// Action errors
    #[error("Action error: {0}")]
    Action(#[from] ActionError),

    /// File write errors
    #[error("File error: {0}")]
    File(#[from] FileError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Result type alias for agent-forge.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by search providers.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Provider returned {status}: {message}")]
    Provider { status: u16, message: String },

    /// The provider rejected the configured credentials.
    #[error("{0}")]
    Configuration(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Failed to parse response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        SearchError::Request(err.to_string())
    }
}

/// Errors related to the action registry.
#[derive(Error, Debug)]
pub enum ActionError {
    #[error("Action not found: {0}")]
    NotFound(String),

    #[error("Action already registered: {0}")]
    AlreadyRegistered(String),

    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid value for parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },
}

/// Errors from the file write helper.
#[derive(Error, Debug)]
pub enum FileError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors related to Configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid config value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Missing required config: {0}")]
    MissingRequired(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}
