//! Claude (Anthropic Messages API) implementation of [`ProviderAdapter`].
//!
//! Tool calls arrive as `tool_use` content blocks; results go back as a
//! single user turn of `tool_result` blocks.

mod translate;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use jgrants_tool_runtime::{
    LlmError, Message, ProviderAdapter, RawProviderResponse, ToolCall, ToolDefinition, ToolResult,
};

use self::translate::{
    assistant_turn, message_to_claude, text_of, tool_definition_to_claude, tool_results_turn,
    tool_uses,
};
use super::{http_client, read_json, CLAUDE};

pub const ANTHROPIC_VERSION: &str = "2023-06-01";
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

pub struct ClaudeAdapter {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    max_tokens: u32,
}

impl ClaudeAdapter {
    /// # Arguments
    /// * `api_key` - Anthropic API key
    /// * `model` - Model name (e.g. `"claude-sonnet-4-5-20250929"`)
    /// * `base_url` - API base URL (e.g. `"https://api.anthropic.com"`)
    /// * `timeout` - per-request timeout
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: http_client(timeout)?,
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        })
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ProviderAdapter for ClaudeAdapter {
    fn provider_name(&self) -> &str {
        CLAUDE
    }

    fn to_wire_tools(&self, tools: &[ToolDefinition]) -> Value {
        Value::Array(tools.iter().map(tool_definition_to_claude).collect())
    }

    async fn send(
        &self,
        messages: &[Message],
        wire_tools: &Value,
    ) -> Result<RawProviderResponse, LlmError> {
        let url = format!("{}/v1/messages", self.base_url);
        let api_messages: Vec<Value> = messages.iter().map(message_to_claude).collect();

        let mut body = json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "messages": api_messages,
        });
        if wire_tools.as_array().is_some_and(|t| !t.is_empty()) {
            body["tools"] = wire_tools.clone();
        }

        debug!(model = %self.model, messages = messages.len(), "Claude request");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::NetworkError(e.to_string()))?;

        let body = read_json(response).await?;
        debug!(stop_reason = ?body["stop_reason"].as_str(), "Claude response");
        Ok(RawProviderResponse::new(body))
    }

    fn extract_invocations(
        &self,
        response: &RawProviderResponse,
    ) -> Result<Vec<ToolCall>, LlmError> {
        tool_uses(&response.body)
    }

    fn extract_final_text(&self, response: &RawProviderResponse) -> String {
        text_of(&response.body)
    }

    fn append_assistant_turn(&self, messages: &mut Vec<Message>, response: &RawProviderResponse) {
        messages.push(assistant_turn(&response.body));
    }

    fn append_tool_results(
        &self,
        messages: &mut Vec<Message>,
        calls: &[ToolCall],
        results: &[ToolResult],
    ) {
        messages.push(tool_results_turn(calls, results));
    }
}
