//! Translation between the neutral conversation types and the OpenAI Chat
//! Completions format.

use serde_json::{json, Map, Value};

use jgrants_tool_runtime::{LlmError, Message, Role, ToolCall, ToolDefinition, ToolResult};

pub(super) fn tool_definition_to_openai(tool: &ToolDefinition) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": tool.name,
            "description": tool.description,
            "parameters": tool.input_schema,
        }
    })
}

/// `extra` carries `tool_calls` on assistant turns and `tool_call_id` on
/// tool turns.
pub(super) fn message_to_openai(msg: &Message) -> Value {
    let mut wire = Map::new();
    wire.insert("role".into(), json!(msg.role.as_str()));
    wire.insert("content".into(), msg.content.clone());
    for (key, value) in &msg.extra {
        wire.entry(key.clone()).or_insert_with(|| value.clone());
    }
    Value::Object(wire)
}

fn first_message(body: &Value) -> Result<&Value, LlmError> {
    let message = &body["choices"][0]["message"];
    if message.is_object() {
        Ok(message)
    } else {
        Err(LlmError::InvalidResponse("missing choices[0].message".into()))
    }
}

/// Function calls in response order. `arguments` arrives as a JSON string.
pub(super) fn function_calls(body: &Value) -> Result<Vec<ToolCall>, LlmError> {
    let message = first_message(body)?;
    let Some(calls) = message["tool_calls"].as_array() else {
        return Ok(Vec::new());
    };

    calls
        .iter()
        .map(|call| {
            let id = call["id"]
                .as_str()
                .ok_or_else(|| LlmError::InvalidResponse("tool call without id".into()))?;
            let function = &call["function"];
            let name = function["name"]
                .as_str()
                .ok_or_else(|| {
                    LlmError::InvalidResponse("tool call without function name".into())
                })?;
            let arguments = match function["arguments"].as_str().map(str::trim) {
                None | Some("") => json!({}),
                Some(raw) => serde_json::from_str(raw).map_err(|e| {
                    LlmError::InvalidResponse(format!(
                        "arguments for {name} are not valid JSON: {e}"
                    ))
                })?,
            };
            Ok(ToolCall {
                correlation_id: id.to_string(),
                name: name.to_string(),
                arguments,
            })
        })
        .collect()
}

pub(super) fn text_of(body: &Value) -> String {
    body["choices"][0]["message"]["content"]
        .as_str()
        .unwrap_or_default()
        .to_string()
}

/// Assistant text (possibly null) plus the raw `tool_calls` list, which the
/// following tool turns refer to by id.
pub(super) fn assistant_turn(body: &Value) -> Message {
    let message = &body["choices"][0]["message"];
    let turn = Message::new(Role::Assistant, message["content"].clone());
    match &message["tool_calls"] {
        Value::Array(calls) if !calls.is_empty() => {
            turn.with_extra("tool_calls", Value::Array(calls.clone()))
        }
        _ => turn,
    }
}

/// One `tool` turn per result, in call order.
pub(super) fn tool_turns(calls: &[ToolCall], results: &[ToolResult]) -> Vec<Message> {
    calls
        .iter()
        .zip(results)
        .map(|(call, result)| {
            Message::new(Role::Tool, Value::String(result.to_content()))
                .with_extra("tool_call_id", json!(call.correlation_id))
        })
        .collect()
}
