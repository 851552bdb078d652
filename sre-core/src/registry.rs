//! # Tool Registry
//!
//! Name-keyed lookup of executable tools. Populated once before a run and
//! only read while the loop is running.

use crate::error::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// A capability the model can invoke by name.
///
/// `execute` receives the raw argument mapping; each tool deserializes it
/// into its own typed shape and reports a mismatch as an error.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique registry key
    fn name(&self) -> &str;

    /// Free text shown to the model in the capability menu
    fn description(&self) -> &str;

    /// JSON-schema style declaration of the expected arguments (informational)
    fn parameters(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    async fn execute(&self, arguments: &Map<String, Value>) -> Result<String>;
}

/// Name -> tool mapping that remembers registration order
#[derive(Default, Clone)]
pub struct Registry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a tool. A tool with the same name is replaced in place.
    pub fn register(&mut self, tool: impl Tool + 'static) {
        self.register_arc(Arc::new(tool));
    }

    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        match self.index.get(&name) {
            Some(&slot) => {
                tracing::debug!(tool = %name, "replacing registered tool");
                self.tools[slot] = tool;
            }
            None => {
                self.index.insert(name, self.tools.len());
                self.tools.push(tool);
            }
        }
    }

    /// Builder form of [`register`](Self::register)
    pub fn with_tool(mut self, tool: impl Tool + 'static) -> Self {
        self.register(tool);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.index.get(name).map(|&slot| Arc::clone(&self.tools[slot]))
    }

    /// All tools in registration order
    pub fn list_all(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Human-readable capability menu, one tool per line
    pub fn tools_prompt(&self) -> String {
        self.tools
            .iter()
            .map(|tool| match usage_hint(&tool.parameters()) {
                Some(usage) => format!("- {}: {} Usage: {}", tool.name(), tool.description(), usage),
                None => format!("- {}: {}", tool.name(), tool.description()),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.tools.iter().map(|t| t.name()))
            .finish()
    }
}

/// `{ "cmd": "..." }` built from the declared properties
fn usage_hint(parameters: &Value) -> Option<String> {
    let properties = parameters.get("properties")?.as_object()?;
    if properties.is_empty() {
        return None;
    }

    let fields: Vec<String> = properties
        .keys()
        .map(|key| format!("\"{}\": \"...\"", key))
        .collect();
    Some(format!("{{ {} }}", fields.join(", ")))
}
