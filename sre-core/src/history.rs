//! # History
//!
//! Ordered, append-only context the loop feeds back to the model each
//! iteration. A history belongs to exactly one run.

use crate::error::{Error, ErrorKind};
use crate::step::Step;
use serde::Serialize;

/// Why an observation was recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservationKind {
    /// Tool ran and produced output
    Output,
    /// Safety gate vetoed the call
    SecurityViolation,
    /// No tool registered under the requested name
    ToolNotFound,
    /// Tool returned an error
    ToolError,
}

/// Textual feedback about an action attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Observation {
    kind: ObservationKind,
    text: String,
}

impl Observation {
    pub fn output(result: impl AsRef<str>) -> Self {
        Self {
            kind: ObservationKind::Output,
            text: format!("Observation: {}", result.as_ref()),
        }
    }

    pub fn security_violation(tool: &str) -> Self {
        Self {
            kind: ObservationKind::SecurityViolation,
            text: format!("Observation: Security Violation - {}", tool),
        }
    }

    pub fn tool_not_found(tool: &str) -> Self {
        Self {
            kind: ObservationKind::ToolNotFound,
            text: format!("Observation: Tool not found - '{}'", tool),
        }
    }

    pub fn tool_error(message: impl AsRef<str>) -> Self {
        Self {
            kind: ObservationKind::ToolError,
            text: format!("Observation: Tool Error - {}", message.as_ref()),
        }
    }

    /// Observation for a failed action attempt.
    ///
    /// Vetoes and unknown tools keep their fixed texts; every other error is
    /// reported as a tool error with its message.
    pub fn from_error(tool: &str, err: &Error) -> Self {
        match err.kind() {
            ErrorKind::SecurityViolation => Self::security_violation(tool),
            ErrorKind::ToolNotFound => Self::tool_not_found(tool),
            _ => Self::tool_error(err.message()),
        }
    }

    pub fn kind(&self) -> ObservationKind {
        self.kind
    }

    /// Rendered text, always prefixed with `Observation: `
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// One history entry
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryEntry {
    /// Setup notes (system prompt override, tool menu)
    SystemNote(String),
    /// The caller's goal
    Goal(String),
    /// A past action step
    Step(Step),
    /// Result of an action attempt
    Observation(Observation),
}

impl HistoryEntry {
    /// Text form sent to the model
    pub fn render(&self) -> String {
        match self {
            HistoryEntry::SystemNote(note) => note.clone(),
            HistoryEntry::Goal(goal) => goal.clone(),
            HistoryEntry::Step(step) => step.to_json(),
            HistoryEntry::Observation(obs) => obs.text().to_string(),
        }
    }
}

/// Append-only sequence of entries
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn observations(&self) -> impl Iterator<Item = &Observation> {
        self.entries.iter().filter_map(|entry| match entry {
            HistoryEntry::Observation(obs) => Some(obs),
            _ => None,
        })
    }

    pub fn last_observation(&self) -> Option<&Observation> {
        self.observations().last()
    }

    /// Rendered entries, oldest first
    pub fn render(&self) -> Vec<String> {
        self.entries.iter().map(HistoryEntry::render).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::Action;
    use serde_json::Map;

    #[test]
    fn test_observation_text() {
        assert_eq!(Observation::output("ok").text(), "Observation: ok");
        assert_eq!(
            Observation::security_violation("bash").text(),
            "Observation: Security Violation - bash"
        );
        assert_eq!(
            Observation::tool_not_found("kubectl").text(),
            "Observation: Tool not found - 'kubectl'"
        );
        assert_eq!(
            Observation::tool_error("boom").text(),
            "Observation: Tool Error - boom"
        );
    }

    #[test]
    fn test_observation_from_error() {
        let vetoed = Error::security_violation("bash", "rm -rf");
        assert_eq!(
            Observation::from_error("bash", &vetoed).text(),
            "Observation: Security Violation - bash"
        );

        let missing = Error::tool_not_found("kubectl");
        let obs = Observation::from_error("kubectl", &missing);
        assert_eq!(obs.kind(), ObservationKind::ToolNotFound);
        assert_eq!(obs.text(), "Observation: Tool not found - 'kubectl'");

        let failed = Error::invalid_argument("empty command");
        let obs = Observation::from_error("bash", &failed);
        assert_eq!(obs.kind(), ObservationKind::ToolError);
        assert_eq!(obs.text(), "Observation: Tool Error - empty command");
    }

    #[test]
    fn test_history_preserves_order_and_filters_observations() {
        let mut history = History::new();
        history.push(HistoryEntry::SystemNote("tools".into()));
        history.push(HistoryEntry::Goal("fix disk".into()));
        history.push(HistoryEntry::Step(Step::act(
            "look",
            Action::new("bash", Map::new()),
        )));
        history.push(HistoryEntry::Observation(Observation::output("100%")));

        assert_eq!(history.len(), 4);
        assert_eq!(history.observations().count(), 1);
        assert_eq!(
            history.last_observation().map(Observation::kind),
            Some(ObservationKind::Output)
        );

        let rendered = history.render();
        assert_eq!(rendered[1], "fix disk");
        assert!(rendered[2].starts_with(r#"{"thought":"look""#));
        assert_eq!(rendered[3], "Observation: 100%");
    }
}
