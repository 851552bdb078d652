//! # Step Schema
//!
//! A step is one structured model output: a thought plus either a tool
//! action or a final answer. Model output is untrusted input, so every raw
//! response goes through [`Step::parse`] before the loop acts on it.
//!
//! Wire shape:
//!
//! ```json
//! {
//!   "thought": "disk is full, check usage first",
//!   "action": { "name": "bash", "arguments": { "cmd": "df -h" } }
//! }
//! ```
//!
//! or
//!
//! ```json
//! { "thought": "usage is back to 4%", "finalAnswer": "Cleared error.log" }
//! ```
//!
//! Once `finalAnswer` is present the action is optional; a placeholder action
//! sent alongside a final answer is accepted and dropped.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A requested tool invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Registered tool name
    pub name: String,
    /// Tool-specific arguments; each tool validates its own shape
    pub arguments: Map<String, Value>,
}

impl Action {
    pub fn new(name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// One validated model output.
///
/// Exactly one of `action` / `final_answer` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawStep")]
pub struct Step {
    thought: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    action: Option<Action>,
    #[serde(skip_serializing_if = "Option::is_none")]
    final_answer: Option<String>,
}

/// Unvalidated wire form
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStep {
    thought: String,
    #[serde(default)]
    action: Option<Action>,
    #[serde(default)]
    final_answer: Option<String>,
}

impl TryFrom<RawStep> for Step {
    type Error = String;

    fn try_from(raw: RawStep) -> std::result::Result<Self, Self::Error> {
        if raw.thought.trim().is_empty() {
            return Err("`thought` must be a non-empty string".to_string());
        }

        match (raw.final_answer.filter(|a| !a.is_empty()), raw.action) {
            (Some(answer), _) => Ok(Step::finish(raw.thought, answer)),
            (None, Some(action)) => Ok(Step::act(raw.thought, action)),
            (None, None) => Err("step needs either `action` or `finalAnswer`".to_string()),
        }
    }
}

impl Step {
    /// A step that requests a tool call
    pub fn act(thought: impl Into<String>, action: Action) -> Self {
        Self {
            thought: thought.into(),
            action: Some(action),
            final_answer: None,
        }
    }

    /// A step that ends the run
    pub fn finish(thought: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            thought: thought.into(),
            action: None,
            final_answer: Some(answer.into()),
        }
    }

    /// Parse and validate raw model output.
    ///
    /// Accepts a bare JSON object or one wrapped in a markdown code fence.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        // string values may legitimately contain backticks
        if trimmed.starts_with('{') {
            if let Ok(step) = serde_json::from_str::<Step>(trimmed) {
                return Ok(step);
            }
        }

        let json_str = strip_fences(trimmed);
        serde_json::from_str::<Step>(json_str).map_err(|e| {
            Error::malformed_step(e.to_string())
                .with_operation("step::parse")
                .with_context("raw", truncate(json_str, 200))
        })
    }

    pub fn thought(&self) -> &str {
        &self.thought
    }

    pub fn action(&self) -> Option<&Action> {
        self.action.as_ref()
    }

    pub fn final_answer(&self) -> Option<&str> {
        self.final_answer.as_deref()
    }

    pub fn is_final(&self) -> bool {
        self.final_answer.is_some()
    }

    /// Compact JSON form, as stored in history
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

fn strip_fences(content: &str) -> &str {
    if content.contains("```json") {
        content
            .split("```json")
            .nth(1)
            .and_then(|s| s.split("```").next())
            .map(|s| s.trim())
            .unwrap_or(content)
    } else if content.contains("```") {
        content
            .split("```")
            .nth(1)
            .map(|s| s.trim())
            .unwrap_or(content)
    } else {
        content.trim()
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    match s.char_indices().nth(max_len) {
        Some((idx, _)) => format!("{}…", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_parse_action_step() {
        let raw = r#"{"thought": "check disk", "action": {"name": "bash", "arguments": {"cmd": "df -h"}}}"#;
        let step = Step::parse(raw).unwrap();

        assert_eq!(step.thought(), "check disk");
        assert!(!step.is_final());
        let action = step.action().unwrap();
        assert_eq!(action.name, "bash");
        assert_eq!(action.arguments["cmd"], json!("df -h"));
    }

    #[test]
    fn test_parse_final_answer_without_action() {
        let step = Step::parse(r#"{"thought": "done", "finalAnswer": "disk cleared"}"#).unwrap();
        assert_eq!(step.final_answer(), Some("disk cleared"));
        assert!(step.action().is_none());
    }

    #[test]
    fn test_placeholder_action_dropped_on_final_answer() {
        let raw = json!({
            "thought": "My previous action was blocked. I will stop now.",
            "finalAnswer": "I cannot perform that action.",
            "action": { "name": "none", "arguments": {} }
        })
        .to_string();

        let step = Step::parse(&raw).unwrap();
        assert!(step.is_final());
        assert!(step.action().is_none());
    }

    #[test]
    fn test_parse_fenced_json() {
        let raw = "Here you go:\n```json\n{\"thought\": \"t\", \"finalAnswer\": \"a\"}\n```\n";
        let step = Step::parse(raw).unwrap();
        assert_eq!(step.final_answer(), Some("a"));
    }

    #[test]
    fn test_backticks_inside_bare_json() {
        let raw = r#"{"thought": "run ```df -h``` first", "action": {"name": "bash", "arguments": {"cmd": "df -h"}}}"#;
        let step = Step::parse(raw).unwrap();
        assert_eq!(step.thought(), "run ```df -h``` first");
        assert_eq!(step.action().unwrap().arguments["cmd"], json!("df -h"));

        let raw = "{\"thought\": \"use `ls`\", \"finalAnswer\": \"see ```json\\n{}\\n```\"}";
        let step = Step::parse(raw).unwrap();
        assert_eq!(step.final_answer(), Some("see ```json\n{}\n```"));
    }

    #[test]
    fn test_rejects_non_json() {
        let err = Step::parse("I think I should run df").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedStep);
        assert_eq!(err.operation(), "step::parse");
    }

    #[test]
    fn test_rejects_missing_or_empty_thought() {
        let err = Step::parse(r#"{"finalAnswer": "x"}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedStep);

        let err = Step::parse(r#"{"thought": "  ", "finalAnswer": "x"}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedStep);
    }

    #[test]
    fn test_rejects_mistyped_fields() {
        let cases = [
            r#"{"thought": 42, "finalAnswer": "x"}"#,
            r#"{"thought": "t", "finalAnswer": 7}"#,
            r#"{"thought": "t", "action": {"name": 1, "arguments": {}}}"#,
            r#"{"thought": "t", "action": {"name": "bash", "arguments": "df"}}"#,
            r#"{"thought": "t", "action": {"name": "bash"}}"#,
            r#"["thought"]"#,
        ];

        for raw in cases {
            let err = Step::parse(raw).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::MalformedStep, "accepted: {}", raw);
        }
    }

    #[test]
    fn test_rejects_step_with_neither_action_nor_answer() {
        let err = Step::parse(r#"{"thought": "hmm"}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedStep);
        assert!(err.message().contains("finalAnswer"));
    }

    #[test]
    fn test_empty_final_answer_falls_back_to_action() {
        let raw = r#"{"thought": "t", "finalAnswer": "", "action": {"name": "bash", "arguments": {"cmd": "ls"}}}"#;
        let step = Step::parse(raw).unwrap();
        assert!(!step.is_final());
        assert_eq!(step.action().unwrap().name, "bash");
    }

    #[test]
    fn test_to_json_uses_wire_names() {
        let step = Step::finish("t", "a");
        let value: Value = serde_json::from_str(&step.to_json()).unwrap();
        assert_eq!(value, json!({"thought": "t", "finalAnswer": "a"}));
    }
}
