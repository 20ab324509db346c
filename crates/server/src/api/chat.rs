//! `POST /api/chat`: run a conversation against one provider or all of them.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use jgrants_llm::KNOWN_PROVIDERS;
use jgrants_tool_runtime::{FanoutResult, Message, Role, Target};

use super::ApiError;
use crate::state::AppState;

/// Only `role` and `content` are taken from the client; anything else the
/// front-end attaches (timestamps, ids) is dropped here.
#[derive(Debug, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(default = "default_model")]
    pub model: String,
}

fn default_model() -> String {
    "both".to_string()
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub responses: FanoutResult,
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let target: Target = req
        .model
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid model parameter"))?;
    if let Target::Single(name) = &target {
        if !KNOWN_PROVIDERS.contains(&name.as_str()) {
            return Err(ApiError::bad_request("Invalid model parameter"));
        }
    }
    if req.messages.is_empty() {
        return Err(ApiError::bad_request("messages must not be empty"));
    }
    if req.messages.iter().any(|m| m.role == Role::Tool) {
        return Err(ApiError::bad_request("role must be user or assistant"));
    }

    let messages: Vec<Message> = req
        .messages
        .into_iter()
        .map(|m| Message::new(m.role, Value::String(m.content)))
        .collect();
    info!(model = %req.model, turns = messages.len(), "chat request");

    let responses = match target {
        // Every known provider gets an entry, configured or not.
        Target::All => {
            let names: Vec<String> = KNOWN_PROVIDERS.iter().map(|n| n.to_string()).collect();
            state.orchestrator.run_all(&messages, &names).await
        }
        single => state.orchestrator.run_conversation(&messages, &single).await.into_map(),
    };

    Ok(Json(ChatResponse { responses }))
}
