//! # agent-forge
//!
//! Building blocks for LLM agents: web search actions, a system prompt
//! component and a structured trace log of every action call.
//!
//! ## Overview
//!
//! Every action executed through an [`ActionRegistry`] is recorded as a
//! human-readable block in a trace log file. Payloads are normalized first so
//! double-escaped JSON produced by models ends up pretty-printed.
//!
//! ## Core Concepts
//!
//! - **Trace Log**: append-only file of `LogEntry` blocks, one per call
//! - **Payload Normalization**: unescape, reparse and pretty-print payloads
//! - **Actions**: named, parameterized operations (`web_search`, `google`)
//! - **Retry**: empty search result sets are retried with a fixed pause
//!
//! ## Example
//!
//! ```rust,ignore
//! use agent_forge::{ActionContext, ActionRegistry, AppConfig};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load("config.json")?;
//!     let registry = ActionRegistry::with_builtins(&config)?;
//!     let ctx = ActionContext::new("task-1");
//!     let urls = registry.execute("web_search", &ctx, json!({"query": "rust"})).await?;
//!     println!("{}", urls);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod config;
pub mod logging;
pub mod retry;
pub mod search;
pub mod actions;
pub mod prompts;
pub mod files;
pub mod cli;

// Re-export commonly used types
pub use actions::{Action, ActionContext, ActionRegistry};
pub use config::AppConfig;
pub use error::{Error, Result};
pub use files::write_to_file;
pub use logging::{append_entry, normalize, LogEntry, Payload};
pub use prompts::SystemPrompt;
pub use search::{SearchProvider, SearchResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
