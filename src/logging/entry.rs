//! Trace log entries.

use std::time::{Duration, Instant};
use super::format::Payload;

/// Line closing every rendered entry.
pub const SEPARATOR: &str = "------------------------";

pub const UNKNOWN_TASK_ID: &str = "Unknown Task ID";
pub const UNKNOWN_STEP_ID: &str = "Unknown Step ID";
pub const UNKNOWN_QUESTION: &str = "Unknown Question";
pub const UNKNOWN_ANSWER: &str = "Unknown Answer";
pub const UNKNOWN_PAYLOAD: &str = "Unknown chat_completion_kwargs";

/// One logged call.
///
/// Entries only exist long enough to be rendered and appended. Every field
/// starts out as a sentinel so a partially filled entry still renders.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    /// Enclosing task.
    pub task_id: String,
    /// Sub-step inside the task.
    pub step_id: String,
    /// Input prompt or question.
    pub question: String,
    /// Produced output.
    pub answer: String,
    /// Auxiliary call data, normalized on render.
    pub payload: Payload,
    /// Time spent on the logged work.
    pub execution_time: Duration,
}

impl Default for LogEntry {
    fn default() -> Self {
        Self {
            task_id: UNKNOWN_TASK_ID.to_string(),
            step_id: UNKNOWN_STEP_ID.to_string(),
            question: UNKNOWN_QUESTION.to_string(),
            answer: UNKNOWN_ANSWER.to_string(),
            payload: Payload::from(UNKNOWN_PAYLOAD),
            execution_time: Duration::ZERO,
        }
    }
}

impl LogEntry {
    /// Create an entry with every field set to its sentinel.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_task_id(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = task_id.into();
        self
    }

    pub fn with_step_id(mut self, step_id: impl Into<String>) -> Self {
        self.step_id = step_id.into();
        self
    }

    pub fn with_question(mut self, question: impl Into<String>) -> Self {
        self.question = question.into();
        self
    }

    pub fn with_answer(mut self, answer: impl Into<String>) -> Self {
        self.answer = answer.into();
        self
    }

    pub fn with_payload(mut self, payload: impl Into<Payload>) -> Self {
        self.payload = payload.into();
        self
    }

    pub fn with_execution_time(mut self, execution_time: Duration) -> Self {
        self.execution_time = execution_time;
        self
    }

    /// Record the time elapsed since `started_at`, which the caller captured
    /// before doing the logged work.
    pub fn finished(mut self, started_at: Instant) -> Self {
        self.execution_time = started_at.elapsed();
        self
    }

    /// Execution time in seconds, rounded to milliseconds.
    pub fn execution_seconds(&self) -> f64 {
        (self.execution_time.as_secs_f64() * 1000.0).round() / 1000.0
    }

    /// Render the banner-delimited text block, trailing newline included.
    pub fn render(&self) -> String {
        format!(
            "-----Task ID: {}----\n\
             Step ID: {}\n\
             Question: {}\n\
             Answer: {}\n\
             Chat Completion Kwargs: {}\n\
             Execution Time: {:.3} seconds\n\
             {}\n",
            self.task_id,
            self.step_id,
            self.question,
            self.answer,
            self.payload.normalize(),
            self.execution_seconds(),
            SEPARATOR,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_defaults() {
        let rendered = LogEntry::new().render();

        assert_eq!(
            rendered,
            "-----Task ID: Unknown Task ID----\n\
             Step ID: Unknown Step ID\n\
             Question: Unknown Question\n\
             Answer: Unknown Answer\n\
             Chat Completion Kwargs: Unknown chat_completion_kwargs\n\
             Execution Time: 0.000 seconds\n\
             ------------------------\n"
        );
    }

    #[test]
    fn test_render_filled_entry() {
        let entry = LogEntry::new()
            .with_task_id("task-1")
            .with_step_id("step-7")
            .with_question("What is 2 + 2?")
            .with_answer("4")
            .with_payload(json!({"model": "gpt-4"}))
            .with_execution_time(Duration::from_millis(1234));

        let rendered = entry.render();
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines[0], "-----Task ID: task-1----");
        assert_eq!(lines[1], "Step ID: step-7");
        assert_eq!(lines[2], "Question: What is 2 + 2?");
        assert_eq!(lines[3], "Answer: 4");
        assert_eq!(lines[4], "Chat Completion Kwargs: {");
        assert_eq!(lines[5], "    \"model\": \"gpt-4\"");
        assert_eq!(lines[6], "}");
        assert_eq!(lines[7], "Execution Time: 1.234 seconds");
        assert_eq!(lines[8], SEPARATOR);
        assert!(rendered.ends_with("------------------------\n"));
    }

    #[test]
    fn test_execution_time_rounding() {
        let entry = LogEntry::new().with_execution_time(Duration::from_micros(2_718_600));
        assert_eq!(entry.execution_seconds(), 2.719);
        assert!(entry.render().contains("Execution Time: 2.719 seconds"));
    }

    #[test]
    fn test_finished_measures_from_start() {
        let started_at = Instant::now() - Duration::from_millis(250);
        let entry = LogEntry::new().finished(started_at);
        assert!(entry.execution_time >= Duration::from_millis(250));
    }
}
