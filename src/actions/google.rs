//! `google` action.

use std::sync::Arc;
use async_trait::async_trait;
use serde_json::Value;
use crate::config::SearchConfig;
use crate::error::Result;
use crate::search::{
    check_num_results, links_to_json, GoogleProvider, SearchProvider, DEFAULT_NUM_RESULTS,
    MAX_NUM_RESULTS, MIN_NUM_RESULTS,
};
use super::{optional_u64, required_str, Action, ActionContext, ActionParameter, ParameterType};

/// Searches through the official Google API and returns result URLs.
///
/// There is no retry here. An invalid API key surfaces as
/// `SearchError::Configuration`.
pub struct GoogleSearchAction {
    provider: Arc<dyn SearchProvider>,
}

impl GoogleSearchAction {
    pub fn new(provider: Arc<dyn SearchProvider>) -> Self {
        Self { provider }
    }

    pub fn from_config(config: &SearchConfig) -> Result<Self> {
        Ok(Self::new(Arc::new(GoogleProvider::new(config)?)))
    }
}

#[async_trait]
impl Action for GoogleSearchAction {
    fn name(&self) -> &str {
        "google"
    }

    fn description(&self) -> &str {
        "Google Search"
    }

    fn parameters(&self) -> Vec<ActionParameter> {
        vec![
            ActionParameter::new("query", "The search query", ParameterType::String, true),
            ActionParameter::new(
                "num_results",
                "The number of results to return",
                ParameterType::Integer,
                false,
            )
            .with_range(MIN_NUM_RESULTS as u64, MAX_NUM_RESULTS as u64),
        ]
    }

    fn output_type(&self) -> &str {
        "list[str]"
    }

    async fn execute(&self, _ctx: &ActionContext, params: &Value) -> Result<String> {
        let query = required_str(params, "query")?;
        let num_results = match optional_u64(params, "num_results")? {
            Some(requested) => check_num_results(requested)?,
            None => DEFAULT_NUM_RESULTS,
        };

        if query.is_empty() {
            return Ok(links_to_json(&[]));
        }

        let results = self.provider.search(query, num_results).await?;
        Ok(links_to_json(&results))
    }
}
