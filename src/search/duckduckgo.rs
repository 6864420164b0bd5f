//! DuckDuckGo search via the HTML endpoint (no API key required).

use std::time::Duration;
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use crate::config::SearchConfig;
use crate::error::SearchError;
use super::{sanitize_utf8, SearchProvider, SearchResult};

/// HTML search endpoint.
pub const DUCKDUCKGO_HTML_URL: &str = "https://html.duckduckgo.com/html/";

/// Scrapes result titles, links and snippets out of the HTML results page.
#[derive(Debug, Clone)]
pub struct ResultPage {
    link: Regex,
    snippet: Regex,
    tag: Regex,
}

impl ResultPage {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            link: Regex::new(r#"(?s)<a[^>]*class="result__a"[^>]*href="([^"]*)"[^>]*>(.*?)</a>"#)?,
            snippet: Regex::new(r#"(?s)<a[^>]*class="result__snippet"[^>]*>(.*?)</a>"#)?,
            tag: Regex::new(r"<[^>]+>")?,
        })
    }

    /// Extract up to `max_results` results, in page order.
    ///
    /// Sponsored links are skipped. A snippet belongs to the result whose
    /// link precedes it, up to the next result link.
    pub fn parse(&self, html: &str, max_results: usize) -> Vec<SearchResult> {
        let links: Vec<_> = self.link.captures_iter(html).collect();

        links
            .iter()
            .enumerate()
            .filter_map(|(i, caps)| {
                let whole = caps.get(0)?;
                let block_end = links
                    .get(i + 1)
                    .and_then(|next| next.get(0))
                    .map_or(html.len(), |next| next.start());
                let block = &html[whole.end()..block_end];

                let url = decode_link(caps.get(1)?.as_str())?;
                let mut result = SearchResult::new(url);
                let title = self.text(caps.get(2)?.as_str());
                if !title.is_empty() {
                    result = result.with_title(title);
                }
                let snippet = self
                    .snippet
                    .captures(block)
                    .and_then(|c| c.get(1))
                    .map(|m| self.text(m.as_str()))
                    .filter(|s| !s.is_empty());
                if let Some(snippet) = snippet {
                    result = result.with_snippet(snippet);
                }
                Some(result)
            })
            .take(max_results)
            .collect()
    }

    fn text(&self, fragment: &str) -> String {
        let stripped = self.tag.replace_all(fragment, "");
        html_escape::decode_html_entities(&stripped).trim().to_string()
    }
}

/// Turn a result href into the target URL.
///
/// Result links go through a `/l/?uddg=<encoded target>` redirect. Ad links
/// (`/y.js`) yield `None`.
fn decode_link(href: &str) -> Option<String> {
    let href = html_escape::decode_html_entities(href);
    if href.is_empty() || href.contains("/y.js") {
        return None;
    }

    if let Some(start) = href.find("uddg=") {
        let encoded = &href[start + "uddg=".len()..];
        let encoded = encoded.split('&').next().unwrap_or(encoded);
        return urlencoding::decode(encoded).ok().map(|s| s.into_owned());
    }

    if let Some(rest) = href.strip_prefix("//") {
        return Some(format!("https://{}", rest));
    }
    Some(href.into_owned())
}

/// DuckDuckGo provider.
pub struct DuckDuckGoProvider {
    client: Client,
    page: ResultPage,
}

impl DuckDuckGoProvider {
    /// Create a provider using the HTTP settings from `config`.
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let page = ResultPage::new().map_err(|e| SearchError::Parse(e.to_string()))?;

        Ok(Self { client, page })
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoProvider {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, SearchError> {
        tracing::debug!("Searching DuckDuckGo: {}", query);

        let response = self
            .client
            .get(DUCKDUCKGO_HTML_URL)
            .query(&[("q", query)])
            .send()
            .await?;

        let status = response.status();
        let body = sanitize_utf8(&response.bytes().await?);
        if !status.is_success() {
            return Err(SearchError::Provider {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        let results = self.page.parse(&body, max_results);
        tracing::debug!("DuckDuckGo returned {} results for '{}'", results.len(), query);
        Ok(results)
    }
}
