//! # Safety Gate
//!
//! Blacklist check that runs before every tool dispatch. Arguments are
//! serialized to compact JSON (keys sorted) and searched for forbidden
//! substrings. This is a literal filter for known-dangerous idioms, not a
//! sandbox.

use crate::error::{Error, Result};
use serde_json::{Map, Value};

/// Patterns blocked by [`Guardrail::default`]
pub const DEFAULT_FORBIDDEN_PATTERNS: &[&str] = &[
    // recursive delete
    "rm -rf",
    // database destruction
    "DROP TABLE",
    // killing the host process
    "System.exit",
    // fork bomb
    ":(){ :|:& };:",
];

/// Reported when arguments cannot be serialized; such calls are always blocked.
const UNSERIALIZABLE: &str = "<unserializable arguments>";

/// Pre-execution blacklist for tool calls
#[derive(Debug, Clone)]
pub struct Guardrail {
    patterns: Vec<String>,
}

impl Default for Guardrail {
    fn default() -> Self {
        Self {
            patterns: DEFAULT_FORBIDDEN_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

impl Guardrail {
    /// Guardrail with the default blacklist
    pub fn new() -> Self {
        Self::default()
    }

    /// Guardrail with no patterns at all
    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.patterns.push(pattern.into());
        self
    }

    pub fn with_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.patterns.extend(patterns.into_iter().map(Into::into));
        self
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// First forbidden pattern found in the serialized arguments
    pub fn find_violation(&self, arguments: &Map<String, Value>) -> Option<&str> {
        let serialized = match serde_json::to_string(arguments) {
            Ok(s) => s,
            Err(_) => return Some(UNSERIALIZABLE),
        };

        self.patterns
            .iter()
            .find(|pattern| serialized.contains(pattern.as_str()))
            .map(|pattern| pattern.as_str())
    }

    /// `true` if the call may proceed, `false` on the first forbidden match.
    ///
    /// The decision depends only on the arguments, never on the tool name.
    pub fn validate(&self, tool_name: &str, arguments: &Map<String, Value>) -> bool {
        self.check(tool_name, arguments).is_ok()
    }

    /// Like [`validate`](Self::validate) but returns the violation as a
    /// `SecurityViolation` error naming the pattern.
    pub fn check(&self, tool_name: &str, arguments: &Map<String, Value>) -> Result<()> {
        match self.find_violation(arguments) {
            Some(pattern) => {
                tracing::warn!(
                    tool = tool_name,
                    pattern,
                    "guardrail violation: forbidden pattern in tool arguments"
                );
                Err(Error::security_violation(tool_name, pattern).with_operation("guardrail::check"))
            }
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    fn args(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("arguments must be an object"),
        }
    }

    #[test]
    fn test_allows_safe_commands() {
        let guardrail = Guardrail::default();
        assert!(guardrail.validate("bash", &args(json!({"cmd": "ls -la"}))));
        assert!(guardrail.validate("bash", &args(json!({"cmd": "df -h"}))));
        assert!(guardrail.validate("bash", &args(json!({}))));
    }

    #[test]
    fn test_blocks_recursive_delete() {
        let guardrail = Guardrail::default();
        assert!(!guardrail.validate("bash", &args(json!({"cmd": "rm -rf /"}))));
    }

    #[test]
    fn test_blocks_drop_table() {
        let guardrail = Guardrail::default();
        assert!(!guardrail.validate("sql_executor", &args(json!({"query": "DROP TABLE users;"}))));
    }

    #[test]
    fn test_blocks_system_exit() {
        let guardrail = Guardrail::default();
        assert!(!guardrail.validate("eval", &args(json!({"code": "System.exit(0)"}))));
    }

    #[test]
    fn test_blocks_fork_bomb() {
        let guardrail = Guardrail::default();
        assert!(!guardrail.validate("bash", &args(json!({"cmd": ":(){ :|:& };:"}))));
    }

    #[test]
    fn test_match_is_independent_of_tool_name() {
        let guardrail = Guardrail::default();
        let dangerous = args(json!({"note": "please rm -rf the cache"}));
        for tool in ["bash", "notes", "does_not_exist"] {
            assert!(!guardrail.validate(tool, &dangerous));
        }
    }

    #[test]
    fn test_nested_arguments_are_searched() {
        let guardrail = Guardrail::default();
        let nested = args(json!({"steps": [{"cmd": "echo ok"}, {"cmd": "rm -rf /var"}]}));
        assert_eq!(guardrail.find_violation(&nested), Some("rm -rf"));
    }

    #[test]
    fn test_first_matching_pattern_reported() {
        let guardrail = Guardrail::default();
        let both = args(json!({"cmd": "rm -rf / ; DROP TABLE x"}));
        assert_eq!(guardrail.find_violation(&both), Some("rm -rf"));
    }

    #[test]
    fn test_extendable_patterns() {
        let guardrail = Guardrail::default().with_pattern("shutdown");
        assert!(!guardrail.validate("bash", &args(json!({"cmd": "shutdown -h now"}))));

        let guardrail = Guardrail::empty();
        assert!(guardrail.validate("bash", &args(json!({"cmd": "rm -rf /"}))));
    }

    #[test]
    fn test_check_returns_security_violation() {
        let guardrail = Guardrail::default();
        let err = guardrail
            .check("bash", &args(json!({"cmd": "rm -rf /"})))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SecurityViolation);
        assert!(err.context().iter().any(|(k, v)| *k == "pattern" && v == "rm -rf"));
    }
}
