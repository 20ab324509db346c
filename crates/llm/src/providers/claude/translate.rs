//! Translation between the neutral conversation types and the Anthropic
//! Messages API format.

use serde_json::{json, Map, Value};

use jgrants_tool_runtime::{LlmError, Message, Role, ToolCall, ToolDefinition, ToolResult};

pub(super) fn tool_definition_to_claude(tool: &ToolDefinition) -> Value {
    json!({
        "name": tool.name,
        "description": tool.description,
        "input_schema": tool.input_schema,
    })
}

/// Claude only knows `user` and `assistant`; tool results travel in user turns.
pub(super) fn message_to_claude(msg: &Message) -> Value {
    let role = match msg.role {
        Role::Assistant => "assistant",
        Role::User | Role::Tool => "user",
    };
    let mut wire = Map::new();
    wire.insert("role".into(), json!(role));
    wire.insert("content".into(), msg.content.clone());
    for (key, value) in &msg.extra {
        wire.entry(key.clone()).or_insert_with(|| value.clone());
    }
    Value::Object(wire)
}

fn content_blocks(body: &Value) -> Result<&Vec<Value>, LlmError> {
    body["content"]
        .as_array()
        .ok_or_else(|| LlmError::InvalidResponse("missing content array".into()))
}

/// `tool_use` blocks in response order.
pub(super) fn tool_uses(body: &Value) -> Result<Vec<ToolCall>, LlmError> {
    content_blocks(body)?
        .iter()
        .filter(|block| block["type"] == "tool_use")
        .map(|block| {
            let id = block["id"]
                .as_str()
                .ok_or_else(|| LlmError::InvalidResponse("tool_use block without id".into()))?;
            let name = block["name"]
                .as_str()
                .ok_or_else(|| LlmError::InvalidResponse("tool_use block without name".into()))?;
            let arguments = match &block["input"] {
                Value::Null => json!({}),
                input => input.clone(),
            };
            Ok(ToolCall {
                correlation_id: id.to_string(),
                name: name.to_string(),
                arguments,
            })
        })
        .collect()
}

/// Concatenation of every text block.
pub(super) fn text_of(body: &Value) -> String {
    body["content"]
        .as_array()
        .map(|blocks| {
            blocks
                .iter()
                .filter(|b| b["type"] == "text")
                .filter_map(|b| b["text"].as_str())
                .collect()
        })
        .unwrap_or_default()
}

/// The whole content array is kept, text and `tool_use` blocks alike.
pub(super) fn assistant_turn(body: &Value) -> Message {
    let content = match &body["content"] {
        Value::Null => Value::Array(Vec::new()),
        content => content.clone(),
    };
    Message::new(Role::Assistant, content)
}

/// One user turn holding a `tool_result` block per call, in call order.
pub(super) fn tool_results_turn(calls: &[ToolCall], results: &[ToolResult]) -> Message {
    let blocks = calls
        .iter()
        .zip(results)
        .map(|(call, result)| {
            let mut block = json!({
                "type": "tool_result",
                "tool_use_id": call.correlation_id,
                "content": result.to_content(),
            });
            if !result.success {
                block["is_error"] = json!(true);
            }
            block
        })
        .collect();
    Message::new(Role::User, Value::Array(blocks))
}
