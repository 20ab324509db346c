//! Provider protocol adapters for the Anthropic Messages API and the OpenAI
//! Chat Completions API.

pub mod providers;

pub use providers::{
    build_providers, ClaudeAdapter, OpenAiAdapter, CLAUDE, KNOWN_PROVIDERS, OPENAI,
};
