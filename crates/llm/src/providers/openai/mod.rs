//! OpenAI (Chat Completions API) implementation of [`ProviderAdapter`].
//!
//! Tool calls arrive under `choices[0].message.tool_calls`; each result goes
//! back as its own `tool` message keyed by `tool_call_id`.

mod translate;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use jgrants_tool_runtime::{
    LlmError, Message, ProviderAdapter, RawProviderResponse, ToolCall, ToolDefinition, ToolResult,
};

use self::translate::{
    assistant_turn, function_calls, message_to_openai, text_of, tool_definition_to_openai,
    tool_turns,
};
use super::{http_client, read_json, OPENAI};

pub struct OpenAiAdapter {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiAdapter {
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
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiAdapter {
    fn provider_name(&self) -> &str {
        OPENAI
    }

    fn to_wire_tools(&self, tools: &[ToolDefinition]) -> Value {
        Value::Array(tools.iter().map(tool_definition_to_openai).collect())
    }

    async fn send(
        &self,
        messages: &[Message],
        wire_tools: &Value,
    ) -> Result<RawProviderResponse, LlmError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let api_messages: Vec<Value> = messages.iter().map(message_to_openai).collect();

        let mut body = json!({
            "model": self.model,
            "messages": api_messages,
        });
        // tool_choice is rejected without tools.
        if wire_tools.as_array().is_some_and(|t| !t.is_empty()) {
            body["tools"] = wire_tools.clone();
            body["tool_choice"] = json!("auto");
        }

        debug!(model = %self.model, messages = messages.len(), "OpenAI request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::NetworkError(e.to_string()))?;

        let body = read_json(response).await?;
        debug!(finish_reason = ?body["choices"][0]["finish_reason"].as_str(), "OpenAI response");
        Ok(RawProviderResponse::new(body))
    }

    fn extract_invocations(
        &self,
        response: &RawProviderResponse,
    ) -> Result<Vec<ToolCall>, LlmError> {
        function_calls(&response.body)
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
        messages.extend(tool_turns(calls, results));
    }
}
