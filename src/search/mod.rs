//! Web search providers.
//!
//! A [`SearchProvider`] turns a query into an ordered list of
//! [`SearchResult`]s. Two providers are built in:
//!
//! | Provider   | Credentials                        | Module         |
//! |------------|------------------------------------|----------------|
//! | DuckDuckGo | none                               | `duckduckgo`   |
//! | Google     | API key + custom search engine id  | `google`       |
//!
//! Retrying and output formatting happen in the actions built on top of
//! these providers (see `crate::actions`).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::SearchError;
use crate::logging::format::to_pretty_json;

pub mod duckduckgo;
pub mod google;

pub use duckduckgo::DuckDuckGoProvider;
pub use google::GoogleProvider;

/// Smallest result count a caller may request.
pub const MIN_NUM_RESULTS: usize = 1;
/// Largest result count a caller may request.
pub const MAX_NUM_RESULTS: usize = 10;
/// Result count used when the caller does not ask for one.
pub const DEFAULT_NUM_RESULTS: usize = 8;

/// One search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

impl SearchResult {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            title: None,
            url: url.into(),
            snippet: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }
}

/// Trait that all search backends implement.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Provider identifier (e.g., "duckduckgo").
    fn name(&self) -> &str;

    /// Run one query. An empty list is a valid answer.
    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, SearchError>;
}

/// Check a requested result count against the allowed range.
pub fn check_num_results(requested: u64) -> Result<usize, SearchError> {
    let allowed = MIN_NUM_RESULTS as u64..=MAX_NUM_RESULTS as u64;
    if allowed.contains(&requested) {
        Ok(requested as usize)
    } else {
        Err(SearchError::InvalidParameter(format!(
            "num_results must be between {} and {}, got {}",
            MIN_NUM_RESULTS, MAX_NUM_RESULTS, requested
        )))
    }
}

/// Decode provider bytes as UTF-8, dropping invalid sequences.
pub fn sanitize_utf8(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        out.push_str(chunk.valid());
    }
    out
}

/// Pretty JSON array of result objects.
pub fn results_to_json(results: &[SearchResult]) -> String {
    to_pretty_json(results)
}

/// Compact JSON array of result URLs.
pub fn links_to_json(results: &[SearchResult]) -> String {
    let links: Vec<&str> = results.iter().map(|r| r.url.as_str()).collect();
    serde_json::to_string(&links).unwrap_or_else(|_| "[]".to_string())
}
