pub mod claude;
pub mod openai;

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{info, warn};

use jgrants_core::LlmConfig;
use jgrants_tool_runtime::{LlmError, ProviderAdapter};

pub use claude::ClaudeAdapter;
pub use openai::OpenAiAdapter;

pub const CLAUDE: &str = "claude";
pub const OPENAI: &str = "openai";

/// Every provider this crate can build, in fan-out order.
pub const KNOWN_PROVIDERS: [&str; 2] = [CLAUDE, OPENAI];

/// Fallback when a 429 carries no usable `retry-after`.
const DEFAULT_RETRY_AFTER_SECS: u64 = 30;

/// Build an adapter for every provider whose API key is configured.
pub fn build_providers(config: &LlmConfig) -> Result<Vec<Arc<dyn ProviderAdapter>>, LlmError> {
    let timeout = Duration::from_secs(config.timeout_secs);
    let mut providers: Vec<Arc<dyn ProviderAdapter>> = Vec::new();

    match &config.anthropic_api_key {
        Some(key) => {
            let adapter = ClaudeAdapter::new(
                key.clone(),
                config.anthropic_model.clone(),
                config.anthropic_base_url.clone(),
                timeout,
            )?
            .with_max_tokens(config.max_tokens);
            info!(provider = CLAUDE, model = %adapter.model(), "provider enabled");
            providers.push(Arc::new(adapter));
        }
        None => warn!(provider = CLAUDE, "ANTHROPIC_API_KEY not set, provider disabled"),
    }

    match &config.openai_api_key {
        Some(key) => {
            let adapter = OpenAiAdapter::new(
                key.clone(),
                config.openai_model.clone(),
                config.openai_base_url.clone(),
                timeout,
            )?;
            info!(provider = OPENAI, model = %adapter.model(), "provider enabled");
            providers.push(Arc::new(adapter));
        }
        None => warn!(provider = OPENAI, "OPENAI_API_KEY not set, provider disabled"),
    }

    Ok(providers)
}

pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, LlmError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| LlmError::NetworkError(e.to_string()))
}

/// Map the HTTP status onto [`LlmError`] and decode a successful body.
pub(crate) async fn read_json(response: reqwest::Response) -> Result<Value, LlmError> {
    let status = response.status();
    if status.is_success() {
        return response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()));
    }

    let retry_after = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());
    let body = response.text().await.unwrap_or_default();

    match status.as_u16() {
        401 | 403 => Err(LlmError::AuthError),
        429 => Err(LlmError::RateLimited {
            retry_after_secs: retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS),
        }),
        code => Err(LlmError::ApiError {
            status: code,
            message: error_message(&body),
        }),
    }
}

/// Both providers wrap failures as `{"error": {"message": ...}}`.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(String::from))
        .unwrap_or_else(|| body.to_string())
}
