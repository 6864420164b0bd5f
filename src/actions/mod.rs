//! Agent actions.
//!
//! An action is a named operation an agent can invoke with JSON parameters,
//! for example `web_search`. Actions are kept in an [`ActionRegistry`]. When
//! the registry has a [`LogSink`], every execution is timed and written to it
//! as a trace entry: the action name is the question, the output (or error)
//! is the answer, and the call parameters are the payload.
//!
//! ## Built-in actions
//!
//! | Action       | Output                          | Needs              |
//! |--------------|---------------------------------|--------------------|
//! | `web_search` | pretty JSON array of results    | -                  |
//! | `google`     | JSON array of result URLs       | Google credentials |

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use crate::config::AppConfig;
use crate::error::{ActionError, Result};
use crate::logging::{FileLogSink, LogEntry, LogSink};

mod google;
mod web_search;

pub use google::GoogleSearchAction;
pub use web_search::WebSearchAction;

/// JSON type of an action parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    String,
    Integer,
}

/// Declared parameter of an action.
#[derive(Debug, Clone, Serialize)]
pub struct ActionParameter {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub param_type: ParameterType,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<u64>,
}

impl ActionParameter {
    pub fn new(name: &str, description: &str, param_type: ParameterType, required: bool) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            param_type,
            required,
            minimum: None,
            maximum: None,
        }
    }

    /// Bound an integer parameter.
    pub fn with_range(mut self, minimum: u64, maximum: u64) -> Self {
        self.minimum = Some(minimum);
        self.maximum = Some(maximum);
        self
    }
}

/// Who is calling an action.
#[derive(Debug, Clone)]
pub struct ActionContext {
    /// Task the call belongs to.
    pub task_id: String,
    /// Step within the task, if the caller tracks steps.
    pub step_id: Option<String>,
}

impl ActionContext {
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            step_id: None,
        }
    }

    /// Context with a freshly generated task id.
    pub fn generated() -> Self {
        Self::new(uuid::Uuid::new_v4().to_string())
    }

    pub fn with_step_id(mut self, step_id: impl Into<String>) -> Self {
        self.step_id = Some(step_id.into());
        self
    }
}

/// Trait that all actions implement.
#[async_trait]
pub trait Action: Send + Sync {
    /// Unique action name.
    fn name(&self) -> &str;

    /// What the action does, for the agent's prompt.
    fn description(&self) -> &str;

    /// Declared parameters.
    fn parameters(&self) -> Vec<ActionParameter>;

    /// Type of the returned text, as shown to the agent.
    fn output_type(&self) -> &str {
        "str"
    }

    /// Run the action.
    async fn execute(&self, ctx: &ActionContext, params: &Value) -> Result<String>;
}

/// Read a required string parameter.
pub fn required_str<'a>(
    params: &'a Value,
    name: &str,
) -> std::result::Result<&'a str, ActionError> {
    match params.get(name) {
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(ActionError::InvalidParameter {
            name: name.to_string(),
            reason: "expected a string".to_string(),
        }),
        None => Err(ActionError::MissingParameter(name.to_string())),
    }
}

/// Read an optional non-negative integer parameter.
pub fn optional_u64(params: &Value, name: &str) -> std::result::Result<Option<u64>, ActionError> {
    match params.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value.as_u64().map(Some).ok_or_else(|| ActionError::InvalidParameter {
            name: name.to_string(),
            reason: "expected a non-negative integer".to_string(),
        }),
    }
}

/// Registry of available actions.
#[derive(Default)]
pub struct ActionRegistry {
    actions: BTreeMap<String, Arc<dyn Action>>,
    sink: Option<Arc<dyn LogSink>>,
}

impl ActionRegistry {
    /// Create an empty registry without tracing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every execution to `sink`.
    pub fn with_log_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Build a registry with the built-in actions enabled by `config`.
    ///
    /// `web_search` is always present. `google` is added when both Google
    /// secrets are configured. The trace log file from `config.trace` is
    /// attached when tracing is enabled.
    pub fn with_builtins(config: &AppConfig) -> Result<Self> {
        let mut registry = Self::new();
        if config.trace.enabled {
            registry = registry.with_log_sink(Arc::new(FileLogSink::new(&config.trace.log_file)));
        }

        registry.register(Arc::new(WebSearchAction::from_config(&config.search)?))?;
        if config.search.has_google_credentials() {
            registry.register(Arc::new(GoogleSearchAction::from_config(&config.search)?))?;
        }

        tracing::info!("Loaded {} built-in actions", registry.len());
        Ok(registry)
    }

    /// Register an action under its own name.
    pub fn register(&mut self, action: Arc<dyn Action>) -> std::result::Result<(), ActionError> {
        let name = action.name().to_string();
        if self.actions.contains_key(&name) {
            return Err(ActionError::AlreadyRegistered(name));
        }
        tracing::debug!("Registered action '{}'", name);
        self.actions.insert(name, action);
        Ok(())
    }

    /// Look up an action by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Action>> {
        self.actions.get(name).cloned()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.actions.keys().map(String::as_str).collect()
    }

    /// Registered actions, sorted by name.
    pub fn actions(&self) -> impl Iterator<Item = &Arc<dyn Action>> {
        self.actions.values()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Execute an action by name, tracing the call when a sink is attached.
    ///
    /// A trace write failure is returned when the action succeeded. When the
    /// action failed too, the write failure is logged and the action's error
    /// is returned.
    pub async fn execute(&self, name: &str, ctx: &ActionContext, params: Value) -> Result<String> {
        let action = self
            .get(name)
            .ok_or_else(|| ActionError::NotFound(name.to_string()))?;

        let started_at = Instant::now();
        let result = action.execute(ctx, &params).await;

        if let Some(sink) = &self.sink {
            let answer = match &result {
                Ok(output) => output.clone(),
                Err(e) => format!("Error: {}", e),
            };
            let mut entry = LogEntry::new()
                .with_task_id(ctx.task_id.as_str())
                .with_question(name)
                .with_answer(answer)
                .with_payload(params)
                .finished(started_at);
            if let Some(step_id) = &ctx.step_id {
                entry = entry.with_step_id(step_id.as_str());
            }
            if let Err(e) = sink.append(&entry).await {
                if result.is_ok() {
                    return Err(e);
                }
                tracing::warn!("Failed to trace failed action '{}': {}", name, e);
            }
        }

        result
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use async_trait::async_trait;
    use crate::error::SearchError;
    use crate::search::{SearchProvider, SearchResult};

    /// Provider that replays canned responses and counts calls.
    pub struct ScriptedProvider {
        responses: Mutex<VecDeque<Result<Vec<SearchResult>, SearchError>>>,
        calls: AtomicU32,
        last_max_results: AtomicUsize,
    }

    impl ScriptedProvider {
        pub fn new(responses: Vec<Result<Vec<SearchResult>, SearchError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: AtomicU32::new(0),
                last_max_results: AtomicUsize::new(0),
            }
        }

        pub fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn last_max_results(&self) -> usize {
            self.last_max_results.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SearchProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn search(
            &self,
            _query: &str,
            max_results: usize,
        ) -> Result<Vec<SearchResult>, SearchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.last_max_results.store(max_results, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    pub fn hit(url: &str) -> SearchResult {
        SearchResult::new(url).with_title("title").with_snippet("snippet")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use crate::config::Secret;
    use crate::error::Error;
    use crate::logging::MemoryLogSink;
    use crate::retry::RetryPolicy;
    use super::test_support::{hit, ScriptedProvider};

    fn registry_with(provider: Arc<ScriptedProvider>, sink: Arc<MemoryLogSink>) -> ActionRegistry {
        let mut registry = ActionRegistry::new().with_log_sink(sink);
        registry
            .register(Arc::new(
                WebSearchAction::new(provider).with_retry_policy(RetryPolicy::no_retry()),
            ))
            .unwrap();
        registry
    }

    #[tokio::test]
    async fn test_unknown_action() {
        let registry = ActionRegistry::new();
        let result = registry
            .execute("nope", &ActionContext::new("t"), json!({}))
            .await;
        assert!(matches!(result, Err(Error::Action(ActionError::NotFound(_)))));
    }

    #[tokio::test]
    async fn test_duplicate_registration() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let mut registry = ActionRegistry::new();
        registry.register(Arc::new(WebSearchAction::new(provider.clone()))).unwrap();

        let again = registry.register(Arc::new(WebSearchAction::new(provider)));
        assert!(matches!(again, Err(ActionError::AlreadyRegistered(_))));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_execution_is_traced() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(vec![hit("https://a.example")])]));
        let sink = Arc::new(MemoryLogSink::new());
        let registry = registry_with(provider, sink.clone());

        let ctx = ActionContext::new("task-42").with_step_id("step-1");
        let output = registry
            .execute("web_search", &ctx, json!({"query": "rust"}))
            .await
            .unwrap();
        assert!(output.contains("https://a.example"));

        let blocks = sink.blocks().await;
        assert_eq!(blocks.len(), 1);
        let block = &blocks[0];
        assert!(block
            .starts_with("-----Task ID: task-42----\nStep ID: step-1\nQuestion: web_search\n"));
        assert!(block.contains("Answer: [\n    {"));
        assert!(block.contains("Chat Completion Kwargs: {\n    \"query\": \"rust\"\n}"));
    }

    #[tokio::test]
    async fn test_failed_execution_is_traced() {
        let provider = Arc::new(ScriptedProvider::new(vec![Err(
            crate::error::SearchError::Request("timeout".to_string()),
        )]));
        let sink = Arc::new(MemoryLogSink::new());
        let registry = registry_with(provider, sink.clone());

        let result = registry
            .execute("web_search", &ActionContext::new("t"), json!({"query": "rust"}))
            .await;
        assert!(result.is_err());

        let blocks = sink.blocks().await;
        assert!(blocks[0].contains("Step ID: Unknown Step ID"));
        assert!(blocks[0].contains("Answer: Error: Search error: Request failed: timeout"));
    }

    struct BrokenSink;

    #[async_trait]
    impl LogSink for BrokenSink {
        async fn append(&self, _entry: &LogEntry) -> Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full").into())
        }
    }

    fn registry_with_broken_sink(provider: Arc<ScriptedProvider>) -> ActionRegistry {
        let mut registry = ActionRegistry::new().with_log_sink(Arc::new(BrokenSink));
        registry
            .register(Arc::new(
                WebSearchAction::new(provider).with_retry_policy(RetryPolicy::no_retry()),
            ))
            .unwrap();
        registry
    }

    #[tokio::test]
    async fn test_trace_failure_after_success_is_returned() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(vec![hit("https://a.example")])]));
        let registry = registry_with_broken_sink(provider);

        let result = registry
            .execute("web_search", &ActionContext::new("t"), json!({"query": "rust"}))
            .await;

        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[tokio::test]
    async fn test_action_error_wins_over_trace_failure() {
        let provider = Arc::new(ScriptedProvider::new(vec![Err(
            crate::error::SearchError::Request("timeout".to_string()),
        )]));
        let registry = registry_with_broken_sink(provider);

        let result = registry
            .execute("web_search", &ActionContext::new("t"), json!({"query": "rust"}))
            .await;

        assert!(matches!(
            result,
            Err(Error::Search(crate::error::SearchError::Request(_)))
        ));
    }

    #[tokio::test]
    async fn test_builtins_follow_credentials() {
        let mut config = AppConfig::default();
        config.trace.enabled = false;

        let registry = ActionRegistry::with_builtins(&config).unwrap();
        assert_eq!(registry.names(), vec!["web_search"]);

        config.search.google_api_key = Some(Secret::new("key"));
        config.search.google_custom_search_engine_id = Some(Secret::new("cx"));
        let registry = ActionRegistry::with_builtins(&config).unwrap();
        assert_eq!(registry.names(), vec!["google", "web_search"]);
    }

    #[test]
    fn test_parameter_helpers() {
        let params = json!({"query": "q", "num_results": 3, "bad": -1});

        assert_eq!(required_str(&params, "query").unwrap(), "q");
        assert!(matches!(required_str(&params, "missing"), Err(ActionError::MissingParameter(_))));
        assert!(matches!(
            required_str(&params, "num_results"),
            Err(ActionError::InvalidParameter { .. })
        ));
        assert_eq!(optional_u64(&params, "num_results").unwrap(), Some(3));
        assert_eq!(optional_u64(&params, "absent").unwrap(), None);
        assert!(optional_u64(&params, "bad").is_err());
    }

    #[test]
    fn test_parameter_schema_serialization() {
        let param = ActionParameter::new("num_results", "How many", ParameterType::Integer, false)
            .with_range(1, 10);
        let value = serde_json::to_value(&param).unwrap();

        assert_eq!(value["type"], "integer");
        assert_eq!(value["minimum"], 1);
        assert_eq!(value["maximum"], 10);
    }
}
