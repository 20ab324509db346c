use crate::tool::{Tool, ToolDefinition, ToolResult};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Manages available tools, their schemas, and dispatch.
/// Read-only once built; share it behind an `Arc`.
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// Register a tool. Returns error if name already registered.
    pub fn register(&mut self, tool: impl Tool + 'static) -> Result<(), RegistryError> {
        let def = tool.definition();
        if self.tools.contains_key(&def.name) {
            return Err(RegistryError::DuplicateName(def.name));
        }
        self.tools.insert(def.name, Arc::new(tool));
        Ok(())
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// List all registered tool definitions (for sending to LLM), sorted by name.
    pub fn list(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.definition()).collect()
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Dispatch a named call. Never fails: unknown tools, missing required
    /// fields and tool errors all come back as `success: false`.
    pub async fn execute(&self, tool_name: &str, arguments: Value) -> ToolResult {
        let Some(tool) = self.get(tool_name) else {
            warn!(tool = tool_name, "unknown tool requested");
            return ToolResult::failure(format!("unknown tool: {tool_name}"));
        };

        let def = tool.definition();
        let missing: Vec<&str> = def
            .required_fields()
            .into_iter()
            .filter(|field| arguments.get(*field).map_or(true, Value::is_null))
            .collect();
        if !missing.is_empty() {
            return ToolResult::failure(format!(
                "missing required argument(s) for {}: {}",
                tool_name,
                missing.join(", ")
            ));
        }

        debug!(tool = tool_name, "executing tool");
        match tool.execute(arguments).await {
            Ok(result) => result,
            Err(e) => {
                warn!(tool = tool_name, error = %e, "tool execution failed");
                ToolResult::failure(format!("Tool error: {e}"))
            }
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Tool with name '{0}' is already registered")]
    DuplicateName(String),
}
