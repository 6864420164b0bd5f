//! `web_search` action.

use std::sync::Arc;
use async_trait::async_trait;
use serde_json::Value;
use crate::config::{ProviderKind, SearchConfig};
use crate::error::{Result, SearchError};
use crate::retry::{retry_until, RetryPolicy};
use crate::search::{
    results_to_json, DuckDuckGoProvider, GoogleProvider, SearchProvider, SearchResult,
    DEFAULT_NUM_RESULTS,
};
use super::{required_str, Action, ActionContext, ActionParameter, ParameterType};

/// Searches the web and returns the hits as a pretty JSON array.
///
/// Providers occasionally answer a valid query with nothing, so an empty
/// answer is retried according to the retry policy (3 attempts, 1 second
/// apart, by default). An empty query returns `[]` without calling the
/// provider.
pub struct WebSearchAction {
    provider: Arc<dyn SearchProvider>,
    policy: RetryPolicy,
    num_results: usize,
}

impl WebSearchAction {
    pub fn new(provider: Arc<dyn SearchProvider>) -> Self {
        Self {
            provider,
            policy: RetryPolicy::default(),
            num_results: DEFAULT_NUM_RESULTS,
        }
    }

    /// Build the action for the provider selected in `config`.
    pub fn from_config(config: &SearchConfig) -> Result<Self> {
        let provider: Arc<dyn SearchProvider> = match config.provider {
            ProviderKind::DuckDuckGo => Arc::new(DuckDuckGoProvider::new(config)?),
            ProviderKind::Google => Arc::new(GoogleProvider::new(config)?),
        };

        Ok(Self::new(provider)
            .with_retry_policy(config.retry_policy())
            .with_num_results(config.max_results))
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_num_results(mut self, num_results: usize) -> Self {
        self.num_results = num_results;
        self
    }

    /// Run `query`, retrying while the provider returns no results.
    pub async fn search(&self, query: &str) -> std::result::Result<Vec<SearchResult>, SearchError> {
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let outcome = retry_until(
            &self.policy,
            || self.provider.search(query, self.num_results),
            |results: &Vec<SearchResult>| !results.is_empty(),
        )
        .await?;

        if !outcome.accepted {
            tracing::info!(
                "{} returned no results for '{}' after {} attempts",
                self.provider.name(),
                query,
                outcome.attempts
            );
        }
        Ok(outcome.value)
    }
}

#[async_trait]
impl Action for WebSearchAction {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Searches the web"
    }

    fn parameters(&self) -> Vec<ActionParameter> {
        vec![ActionParameter::new("query", "The search query", ParameterType::String, true)]
    }

    fn output_type(&self) -> &str {
        "list[str]"
    }

    async fn execute(&self, _ctx: &ActionContext, params: &Value) -> Result<String> {
        let query = required_str(params, "query")?;
        let results = self.search(query).await?;
        Ok(results_to_json(&results))
    }
}
