use crate::conversation::Message;
use crate::provider::{LlmError, ProviderAdapter};
use crate::registry::ToolRegistry;
use crate::tool::{ToolCall, ToolResult};
use futures::future::join_all;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const DEFAULT_MAX_ITERATIONS: usize = 5;

/// One executed invocation, reported back alongside the final answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolCallRecord {
    pub name: String,
    pub arguments: Value,
    pub result: ToolResult,
}

/// Terminal value of one conversation loop run.
/// Exactly one of `final_text` (success) or `error` (failure) is set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoopOutcome {
    pub success: bool,
    #[serde(rename = "model")]
    pub provider: String,
    #[serde(rename = "response", skip_serializing_if = "Option::is_none")]
    pub final_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub tool_calls: Vec<ToolCallRecord>,
}

impl LoopOutcome {
    pub fn completed(provider: &str, final_text: String, tool_calls: Vec<ToolCallRecord>) -> Self {
        Self {
            success: true,
            provider: provider.to_string(),
            final_text: Some(final_text),
            error: None,
            tool_calls,
        }
    }

    pub fn failed(provider: &str, error: impl Into<String>) -> Self {
        Self {
            success: false,
            provider: provider.to_string(),
            final_text: None,
            error: Some(error.into()),
            tool_calls: Vec::new(),
        }
    }
}

/// Drives a conversation with one provider: send → tool calls → execute →
/// append results → send again, until the model answers or the iteration
/// budget runs out.
pub struct ConversationLoop {
    provider: Arc<dyn ProviderAdapter>,
    registry: Arc<ToolRegistry>,
    max_iterations: usize,
}

impl ConversationLoop {
    pub fn new(provider: Arc<dyn ProviderAdapter>, registry: Arc<ToolRegistry>) -> Self {
        Self {
            provider,
            registry,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.provider_name()
    }

    /// Run the loop over a private copy of `messages`. Never returns an
    /// error: every failure is folded into a failed `LoopOutcome`.
    pub async fn run(&self, messages: &[Message]) -> LoopOutcome {
        let name = self.provider.provider_name();
        let mut trace = Vec::new();
        match self.drive(messages.to_vec(), &mut trace).await {
            Ok(text) => {
                info!(provider = name, tool_calls = trace.len(), "conversation complete");
                LoopOutcome::completed(name, text, trace)
            }
            Err(e) => {
                warn!(provider = name, error = %e, "conversation failed");
                let mut outcome = LoopOutcome::failed(name, e.describe(name));
                outcome.tool_calls = trace;
                outcome
            }
        }
    }

    async fn drive(
        &self,
        mut history: Vec<Message>,
        trace: &mut Vec<ToolCallRecord>,
    ) -> Result<String, LoopError> {
        let wire_tools = self.provider.to_wire_tools(&self.registry.list());

        for iteration in 0..self.max_iterations {
            debug!(
                provider = self.provider_name(),
                iteration,
                messages = history.len(),
                "sending turn"
            );

            let response = self.provider.send(&history, &wire_tools).await?;
            let calls = self.provider.extract_invocations(&response)?;

            if calls.is_empty() {
                return Ok(self.provider.extract_final_text(&response));
            }

            info!(
                provider = self.provider_name(),
                iteration,
                count = calls.len(),
                "executing tool calls"
            );
            let results = self.execute_tool_calls(&calls).await;

            for (call, result) in calls.iter().zip(&results) {
                trace.push(ToolCallRecord {
                    name: call.name.clone(),
                    arguments: call.arguments.clone(),
                    result: result.clone(),
                });
            }

            self.provider.append_assistant_turn(&mut history, &response);
            self.provider.append_tool_results(&mut history, &calls, &results);
        }

        Err(LoopError::BudgetExhausted(self.max_iterations))
    }

    /// Execute a whole batch concurrently; results line up with `calls`.
    async fn execute_tool_calls(&self, calls: &[ToolCall]) -> Vec<ToolResult> {
        join_all(
            calls
                .iter()
                .map(|call| self.registry.execute(&call.name, call.arguments.clone())),
        )
        .await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoopError {
    #[error(transparent)]
    Provider(#[from] LlmError),
    #[error("最大反復回数に達しました ({0})")]
    BudgetExhausted(usize),
}

impl LoopError {
    /// Error text for the outcome, tagged with the provider name.
    fn describe(&self, provider: &str) -> String {
        match self {
            LoopError::Provider(e) => format!("{provider} API error: {e}"),
            LoopError::BudgetExhausted(_) => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Role;
    use crate::provider::mock::MockProvider;
    use crate::tool::EchoTool;
    use serde_json::json;

    fn registry() -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool).unwrap();
        Arc::new(registry)
    }

    fn loop_for(provider: &Arc<MockProvider>) -> ConversationLoop {
        ConversationLoop::new(provider.clone() as Arc<dyn ProviderAdapter>, registry())
    }

    #[tokio::test]
    async fn test_simple_text_response() {
        let provider = Arc::new(MockProvider::scripted("mock"));
        provider.queue_text("こんにちは");

        let outcome = loop_for(&provider).run(&[Message::user("hello")]).await;

        assert!(outcome.success);
        assert_eq!(outcome.provider, "mock");
        assert_eq!(outcome.final_text.as_deref(), Some("こんにちは"));
        assert!(outcome.error.is_none());
        assert_eq!(provider.send_count(), 1);
    }

    #[tokio::test]
    async fn test_one_tool_call_then_answer() {
        let provider = Arc::new(MockProvider::scripted("mock"));
        provider
            .queue_calls(Some("checking"), &[("call_1", "echo", json!({"message": "test"}))])
            .queue_text("Done!");

        let outcome = loop_for(&provider).run(&[Message::user("Echo test")]).await;

        assert!(outcome.success);
        assert_eq!(outcome.final_text.as_deref(), Some("Done!"));
        assert_eq!(outcome.tool_calls.len(), 1);
        assert_eq!(outcome.tool_calls[0].name, "echo");
        assert!(outcome.tool_calls[0].result.success);
        assert_eq!(provider.send_count(), 2);

        // Second send sees: user, assistant (call intent), tool result.
        let second = &provider.seen_histories()[1];
        assert_eq!(second.len(), 3);
        assert_eq!(second[1].role, Role::Assistant);
        assert_eq!(second[1].content["text"], "checking");
        assert_eq!(second[2].role, Role::Tool);
        assert_eq!(second[2].extra["correlation_id"], "call_1");
    }

    #[tokio::test]
    async fn test_budget_exhausted_at_exact_limit() {
        let provider = Arc::new(MockProvider::always_calling(
            "mock",
            "echo",
            json!({"message": "again"}),
        ));

        let outcome = loop_for(&provider)
            .with_max_iterations(3)
            .run(&[Message::user("loop forever")])
            .await;

        assert!(!outcome.success);
        assert!(outcome.final_text.is_none());
        assert!(outcome.error.unwrap().contains("最大反復回数"));
        assert_eq!(provider.send_count(), 3);
        assert_eq!(outcome.tool_calls.len(), 3);
    }

    #[tokio::test]
    async fn test_default_budget_is_five() {
        let provider = Arc::new(MockProvider::always_calling(
            "mock",
            "echo",
            json!({"message": "x"}),
        ));
        let outcome = loop_for(&provider).run(&[Message::user("x")]).await;
        assert!(!outcome.success);
        assert_eq!(provider.send_count(), DEFAULT_MAX_ITERATIONS);
    }

    #[tokio::test]
    async fn test_provider_failure_is_tagged() {
        let provider = Arc::new(MockProvider::failing("claude", "overloaded"));
        let outcome = loop_for(&provider).run(&[Message::user("hi")]).await;

        assert!(!outcome.success);
        assert_eq!(outcome.provider, "claude");
        let error = outcome.error.unwrap();
        assert!(error.starts_with("claude API error"));
        assert!(error.contains("overloaded"));
        assert_eq!(provider.send_count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_tool_is_reported_to_model() {
        let provider = Arc::new(MockProvider::scripted("mock"));
        provider
            .queue_calls(None, &[("call_x", "does_not_exist", json!({}))])
            .queue_text("sorry");

        let outcome = loop_for(&provider).run(&[Message::user("hi")]).await;

        assert!(outcome.success);
        assert!(!outcome.tool_calls[0].result.success);
        let second = &provider.seen_histories()[1];
        assert!(second[2].content.as_str().unwrap().contains("unknown tool"));
    }

    #[tokio::test]
    async fn test_batch_results_keep_correlation() {
        let provider = Arc::new(MockProvider::scripted("mock"));
        provider
            .queue_calls(
                None,
                &[
                    ("a", "echo", json!({"message": "one"})),
                    ("b", "echo", json!({"message": "two"})),
                    ("c", "missing", json!({})),
                ],
            )
            .queue_text("ok");

        let outcome = loop_for(&provider).run(&[Message::user("batch")]).await;
        assert!(outcome.success);

        let second = &provider.seen_histories()[1];
        let ids: Vec<&str> = second
            .iter()
            .filter(|m| m.role == Role::Tool)
            .map(|m| m.extra["correlation_id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert!(second[2].content.as_str().unwrap().contains("one"));
        assert!(second[3].content.as_str().unwrap().contains("two"));
    }

    #[tokio::test]
    async fn test_caller_history_untouched() {
        let provider = Arc::new(MockProvider::scripted("mock"));
        provider
            .queue_calls(None, &[("call_1", "echo", json!({"message": "m"}))])
            .queue_text("fin");

        let history = vec![Message::user("hello")];
        let before = history.clone();
        let _ = loop_for(&provider).run(&history).await;
        assert_eq!(history, before);
    }

    #[test]
    fn test_outcome_wire_names() {
        let outcome = LoopOutcome::completed("openai", "answer".into(), vec![]);
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["model"], "openai");
        assert_eq!(value["response"], "answer");
        assert!(value.get("error").is_none());

        let failed = serde_json::to_value(LoopOutcome::failed("claude", "boom")).unwrap();
        assert_eq!(failed["success"], false);
        assert!(failed.get("response").is_none());
        assert_eq!(failed["error"], "boom");
    }
}
