use crate::conversation::Message;
use crate::tool::{ToolCall, ToolDefinition, ToolResult};
use async_trait::async_trait;
use serde_json::Value;

/// Unparsed body of one provider round trip. Only the adapter that produced
/// it knows its shape.
#[derive(Debug, Clone, PartialEq)]
pub struct RawProviderResponse {
    pub body: Value,
}

impl RawProviderResponse {
    pub fn new(body: Value) -> Self {
        Self { body }
    }
}

/// Bidirectional translation between the neutral conversation/tool model and
/// one LLM provider's wire protocol.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Provider name used for tagging outcomes and logs (e.g. "claude", "openai").
    fn provider_name(&self) -> &str;

    /// Translate neutral tool definitions into the provider's declaration list.
    fn to_wire_tools(&self, tools: &[ToolDefinition]) -> Value;

    /// One network round trip with the full running history.
    async fn send(
        &self,
        messages: &[Message],
        wire_tools: &Value,
    ) -> Result<RawProviderResponse, LlmError>;

    /// Tool invocations requested by the response. Empty means the model
    /// produced its final answer.
    fn extract_invocations(
        &self,
        response: &RawProviderResponse,
    ) -> Result<Vec<ToolCall>, LlmError>;

    /// Final answer text. Only meaningful when `extract_invocations` is empty.
    fn extract_final_text(&self, response: &RawProviderResponse) -> String;

    /// Append the assistant turn, keeping both its text and its raw tool-call
    /// intent so the provider can resolve the results that follow.
    fn append_assistant_turn(&self, messages: &mut Vec<Message>, response: &RawProviderResponse);

    /// Append tool results in the provider's expected shape. `calls` and
    /// `results` are parallel slices.
    fn append_tool_results(
        &self,
        messages: &mut Vec<Message>,
        calls: &[ToolCall],
        results: &[ToolResult],
    );
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
    #[error("Authentication failed")]
    AuthError,
}

/// Scripted provider adapters for testing the loop and fan-out without real
/// API calls.
///
/// The scripted wire format is `{"text": "...", "calls": [{"id", "name",
/// "arguments"}]}`; tool results are appended one `tool` turn per result.
#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    use super::*;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    enum Script {
        /// Pop queued responses; final text "" once exhausted.
        Queue(Mutex<VecDeque<Value>>),
        /// Request the same tool call forever.
        AlwaysCall { name: String, arguments: Value },
        /// Every send fails.
        AlwaysFail(String),
        /// Every send panics.
        Panic,
    }

    pub struct MockProvider {
        name: String,
        script: Script,
        sends: AtomicUsize,
        seen: Mutex<Vec<Vec<Message>>>,
    }

    impl MockProvider {
        fn with_script(name: &str, script: Script) -> Self {
            Self {
                name: name.to_string(),
                script,
                sends: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            }
        }

        /// Provider that replays queued responses in order.
        pub fn scripted(name: &str) -> Self {
            Self::with_script(name, Script::Queue(Mutex::new(VecDeque::new())))
        }

        pub fn always_calling(name: &str, tool: &str, arguments: Value) -> Self {
            Self::with_script(
                name,
                Script::AlwaysCall {
                    name: tool.to_string(),
                    arguments,
                },
            )
        }

        pub fn failing(name: &str, message: &str) -> Self {
            Self::with_script(name, Script::AlwaysFail(message.to_string()))
        }

        pub fn panicking(name: &str) -> Self {
            Self::with_script(name, Script::Panic)
        }

        /// Queue a final text response.
        pub fn queue_text(&self, text: &str) -> &Self {
            self.push(json!({ "text": text, "calls": [] }))
        }

        /// Queue a response requesting the given `(id, tool, arguments)` calls.
        pub fn queue_calls(&self, text: Option<&str>, calls: &[(&str, &str, Value)]) -> &Self {
            let calls: Vec<Value> = calls
                .iter()
                .map(|(id, name, arguments)| {
                    json!({ "id": id, "name": name, "arguments": arguments })
                })
                .collect();
            self.push(json!({ "text": text, "calls": calls }))
        }

        fn push(&self, body: Value) -> &Self {
            if let Script::Queue(queue) = &self.script {
                queue.lock().unwrap().push_back(body);
            }
            self
        }

        /// Number of `send` round trips made so far.
        pub fn send_count(&self) -> usize {
            self.sends.load(Ordering::SeqCst)
        }

        /// Histories passed to each `send`, in call order.
        pub fn seen_histories(&self) -> Vec<Vec<Message>> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ProviderAdapter for MockProvider {
        fn provider_name(&self) -> &str {
            &self.name
        }

        fn to_wire_tools(&self, tools: &[ToolDefinition]) -> Value {
            Value::Array(tools.iter().map(|t| json!(t.name)).collect())
        }

        async fn send(
            &self,
            messages: &[Message],
            _wire_tools: &Value,
        ) -> Result<RawProviderResponse, LlmError> {
            let n = self.sends.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(messages.to_vec());
            match &self.script {
                Script::Queue(queue) => {
                    let body = queue
                        .lock()
                        .unwrap()
                        .pop_front()
                        .unwrap_or_else(|| json!({ "text": "", "calls": [] }));
                    Ok(RawProviderResponse::new(body))
                }
                Script::AlwaysCall { name, arguments } => Ok(RawProviderResponse::new(json!({
                    "text": null,
                    "calls": [{ "id": format!("call_{n}"), "name": name, "arguments": arguments }],
                }))),
                Script::AlwaysFail(message) => Err(LlmError::ApiError {
                    status: 500,
                    message: message.clone(),
                }),
                Script::Panic => panic!("mock provider '{}' panicked", self.name),
            }
        }

        fn extract_invocations(
            &self,
            response: &RawProviderResponse,
        ) -> Result<Vec<ToolCall>, LlmError> {
            let calls = response.body["calls"].as_array().cloned().unwrap_or_default();
            calls
                .into_iter()
                .map(|c| {
                    Ok(ToolCall {
                        correlation_id: c["id"]
                            .as_str()
                            .ok_or_else(|| LlmError::InvalidResponse("call without id".into()))?
                            .to_string(),
                        name: c["name"].as_str().unwrap_or_default().to_string(),
                        arguments: c["arguments"].clone(),
                    })
                })
                .collect()
        }

        fn extract_final_text(&self, response: &RawProviderResponse) -> String {
            response.body["text"].as_str().unwrap_or_default().to_string()
        }

        fn append_assistant_turn(
            &self,
            messages: &mut Vec<Message>,
            response: &RawProviderResponse,
        ) {
            messages.push(Message::new(crate::Role::Assistant, response.body.clone()));
        }

        fn append_tool_results(
            &self,
            messages: &mut Vec<Message>,
            calls: &[ToolCall],
            results: &[ToolResult],
        ) {
            for (call, result) in calls.iter().zip(results) {
                messages.push(
                    Message::new(crate::Role::Tool, Value::String(result.to_content()))
                        .with_extra("correlation_id", json!(call.correlation_id)),
                );
            }
        }
    }
}
