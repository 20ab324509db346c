pub mod config;

pub use config::{Config, KeyStatus, LlmConfig, SearchConfig, ServerConfig};
