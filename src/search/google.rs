//! Google Custom Search JSON API.

use std::time::Duration;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use crate::config::{SearchConfig, Secret};
use crate::error::{ConfigError, Error, SearchError};
use super::{sanitize_utf8, SearchProvider, SearchResult};

/// Custom Search API v1 endpoint.
pub const GOOGLE_CUSTOM_SEARCH_URL: &str = "https://www.googleapis.com/customsearch/v1";

/// Message returned when Google rejects the API key.
pub const INVALID_KEY_MESSAGE: &str = "The provided Google API key is invalid or missing.";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    link: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    snippet: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    message: String,
}

/// Google provider. Needs an API key and a custom search engine id.
pub struct GoogleProvider {
    client: Client,
    api_key: Secret,
    engine_id: Secret,
}

impl GoogleProvider {
    /// Create a provider from `config`.
    ///
    /// Fails with [`ConfigError::MissingRequired`] when either secret is absent.
    pub fn new(config: &SearchConfig) -> Result<Self, Error> {
        let api_key = config
            .google_api_key
            .clone()
            .ok_or_else(|| ConfigError::MissingRequired("search.google_api_key".to_string()))?;
        let engine_id = config
            .google_custom_search_engine_id
            .clone()
            .ok_or_else(|| {
                ConfigError::MissingRequired("search.google_custom_search_engine_id".to_string())
            })?;

        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(SearchError::from)?;

        Ok(Self {
            client,
            api_key,
            engine_id,
        })
    }
}

#[async_trait]
impl SearchProvider for GoogleProvider {
    fn name(&self) -> &str {
        "google"
    }

    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, SearchError> {
        tracing::debug!("Searching Google: {}", query);

        let num = max_results.to_string();
        let response = self
            .client
            .get(GOOGLE_CUSTOM_SEARCH_URL)
            .query(&[
                ("key", self.api_key.expose()),
                ("cx", self.engine_id.expose()),
                ("q", query),
                ("num", num.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = sanitize_utf8(&response.bytes().await?);
        if !status.is_success() {
            return Err(classify_error(status.as_u16(), &body));
        }

        parse_response(&body)
    }
}

/// Read result items out of a successful response body.
fn parse_response(body: &str) -> Result<Vec<SearchResult>, SearchError> {
    let response: SearchResponse =
        serde_json::from_str(body).map_err(|e| SearchError::Parse(e.to_string()))?;

    Ok(response
        .items
        .into_iter()
        .map(|item| SearchResult {
            title: item.title,
            url: item.link,
            snippet: item.snippet,
        })
        .collect())
}

/// Map an error response to a [`SearchError`].
///
/// A 403 whose message mentions an invalid API key is a configuration
/// problem, not a transient provider failure.
fn classify_error(status: u16, body: &str) -> SearchError {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(ErrorResponse { error }) => {
            let code = error.code.unwrap_or(status);
            if code == 403 && error.message.contains("invalid API key") {
                SearchError::Configuration(INVALID_KEY_MESSAGE.to_string())
            } else {
                SearchError::Provider { status: code, message: error.message }
            }
        }
        Err(_) => SearchError::Provider {
            status,
            message: body.trim().to_string(),
        },
    }
}
