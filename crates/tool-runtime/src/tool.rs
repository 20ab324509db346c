use async_trait::async_trait;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// Describes a tool's interface for LLM consumption.
/// Provider adapters translate this into Claude's tool format or OpenAI's
/// function format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique tool name (e.g., "search_subsidies")
    pub name: String,
    /// Human-readable description for the LLM
    pub description: String,
    /// JSON Schema describing the expected input
    pub input_schema: Value,
}

impl ToolDefinition {
    /// Field names listed under the schema's `required` array.
    pub fn required_fields(&self) -> Vec<&str> {
        self.input_schema
            .get("required")
            .and_then(Value::as_array)
            .map(|fields| fields.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

/// Represents an LLM requesting execution of a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-issued id; the matching result must carry it back.
    pub correlation_id: String,
    /// Tool name to execute
    pub name: String,
    /// JSON input arguments
    pub arguments: Value,
}

/// Normalized outcome of a tool execution.
///
/// Serializes flat: the payload's fields sit next to `success` (and `error`
/// when set), e.g. `{"success":true,"count":3,"subsidies":[...]}` or
/// `{"success":false,"error":"..."}`.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    pub success: bool,
    pub payload: Value,
    pub error: Option<String>,
}

impl ToolResult {
    pub fn ok(payload: Value) -> Self {
        Self {
            success: true,
            payload,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            payload: Value::Null,
            error: Some(error.into()),
        }
    }

    /// The JSON object handed back to models and HTTP clients.
    pub fn to_json(&self) -> Value {
        let mut obj = match &self.payload {
            Value::Object(fields) => fields.clone(),
            Value::Null => Map::new(),
            other => {
                let mut m = Map::new();
                m.insert("payload".to_string(), other.clone());
                m
            }
        };
        obj.insert("success".to_string(), Value::Bool(self.success));
        if let Some(error) = &self.error {
            obj.insert("error".to_string(), Value::String(error.clone()));
        }
        Value::Object(obj)
    }

    /// Pretty-printed JSON text, the form tool results take inside a
    /// provider conversation.
    pub fn to_content(&self) -> String {
        serde_json::to_string_pretty(&self.to_json()).unwrap_or_else(|_| "{}".to_string())
    }
}

impl Serialize for ToolResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// The primary extension point: all tools implement this trait.
///
/// Tools are object-safe, Send + Sync, and async.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the tool's definition (name, description, JSON Schema).
    fn definition(&self) -> ToolDefinition;

    /// Execute the tool with the given JSON input.
    async fn execute(&self, input: Value) -> Result<ToolResult, ToolError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl fmt::Display for ToolDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.description)
    }
}

/// Read a required string argument.
pub fn required_str<'a>(input: &'a Value, field: &str) -> Result<&'a str, ToolError> {
    input
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::InvalidInput(format!("missing '{field}' field")))
}

/// Read an optional string argument; null and empty strings count as absent.
pub fn optional_str<'a>(input: &'a Value, field: &str) -> Option<&'a str> {
    input
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Simple echo tool for testing purposes.
pub struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "echo".to_string(),
            description: "Echoes back the input message. For testing.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "message": {
                        "type": "string",
                        "description": "The message to echo back"
                    }
                },
                "required": ["message"]
            }),
        }
    }

    async fn execute(&self, input: Value) -> Result<ToolResult, ToolError> {
        let message = required_str(&input, "message")?;
        Ok(ToolResult::ok(serde_json::json!({ "message": message })))
    }
}
