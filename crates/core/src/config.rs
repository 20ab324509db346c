use std::env;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

/// Key lookup used while building the config. Production reads the process
/// environment; tests pass a closure over a fixed map.
type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

fn process_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled key: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_opt(lookup: Lookup, profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        if let Some(v) = lookup(&format!("{}_{}", profile, key)) {
            return Some(v);
        }
    }
    lookup(key)
}

fn profiled_or(lookup: Lookup, profile: &str, key: &str, default: &str) -> String {
    profiled_opt(lookup, profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_parse<T: std::str::FromStr>(lookup: Lookup, profile: &str, key: &str, default: T) -> T {
    profiled_opt(lookup, profile, key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub server: ServerConfig,
    pub search: SearchConfig,
    pub llm: LlmConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `JGRANTS_PROFILE`. When set (e.g. `PROD`), every
    /// key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = process_env("JGRANTS_PROFILE").unwrap_or_default();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        Self::from_lookup(profile, &process_env)
    }

    /// Build config from an arbitrary key source.
    pub fn from_lookup(profile: &str, lookup: Lookup) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            server: ServerConfig::from_lookup(lookup, p),
            search: SearchConfig::from_lookup(lookup, p),
            llm: LlmConfig::from_lookup(lookup, p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() {
            "default"
        } else {
            &self.profile
        }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        let keys = self.llm.key_status();
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  server:  {}:{} origins={:?}",
            self.server.host,
            self.server.port,
            self.server.allowed_origins
        );
        tracing::info!(
            "  search:  base_url={}, timeout={}s",
            self.search.base_url,
            self.search.timeout_secs
        );
        tracing::info!(
            "  llm:     anthropic={} ({}), openai={} ({})",
            keys.anthropic,
            self.llm.anthropic_model,
            keys.openai,
            self.llm.openai_model
        );
        tracing::info!(
            "  loop:    max_iterations={}, max_tokens={}",
            self.llm.max_iterations,
            self.llm.max_tokens
        );
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origins allowed by CORS, from a comma-separated `ALLOWED_ORIGINS`.
    pub allowed_origins: Vec<String>,
}

impl ServerConfig {
    fn from_lookup(lookup: Lookup, p: &str) -> Self {
        let origins = profiled_or(
            lookup,
            p,
            "ALLOWED_ORIGINS",
            "http://localhost:3000,http://localhost:3001",
        );
        Self {
            host: profiled_or(lookup, p, "HOST", "0.0.0.0"),
            port: profiled_parse(lookup, p, "PORT", 8000),
            allowed_origins: origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect(),
        }
    }
}

// ── Subsidy search backend (J-Grants) ─────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl SearchConfig {
    fn from_lookup(lookup: Lookup, p: &str) -> Self {
        Self {
            base_url: profiled_or(
                lookup,
                p,
                "JGRANTS_API_BASE",
                "https://api.jgrants-portal.go.jp/exp/v1/public",
            ),
            timeout_secs: profiled_parse(lookup, p, "JGRANTS_TIMEOUT_SECS", 30),
        }
    }
}

// ── LLM (Anthropic / OpenAI) ─────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub anthropic_api_key: Option<String>,
    pub anthropic_model: String,
    pub anthropic_base_url: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,
    pub max_tokens: u32,
    /// Tool-call round trips allowed per conversation loop.
    pub max_iterations: usize,
    pub timeout_secs: u64,
}

/// `configured` / `missing` per provider, safe to expose over HTTP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyStatus {
    pub anthropic: &'static str,
    pub openai: &'static str,
}

impl LlmConfig {
    fn from_lookup(lookup: Lookup, p: &str) -> Self {
        Self {
            anthropic_api_key: profiled_opt(lookup, p, "ANTHROPIC_API_KEY"),
            anthropic_model: profiled_or(
                lookup,
                p,
                "ANTHROPIC_MODEL",
                "claude-sonnet-4-5-20250929",
            ),
            anthropic_base_url: profiled_or(
                lookup,
                p,
                "ANTHROPIC_BASE_URL",
                "https://api.anthropic.com",
            ),
            openai_api_key: profiled_opt(lookup, p, "OPENAI_API_KEY"),
            openai_model: profiled_or(lookup, p, "OPENAI_MODEL", "gpt-4-turbo-preview"),
            openai_base_url: profiled_or(lookup, p, "OPENAI_BASE_URL", "https://api.openai.com"),
            max_tokens: profiled_parse(lookup, p, "LLM_MAX_TOKENS", 4096),
            max_iterations: profiled_parse(lookup, p, "LLM_MAX_ITERATIONS", 5),
            timeout_secs: profiled_parse(lookup, p, "LLM_TIMEOUT_SECS", 120),
        }
    }

    pub fn key_status(&self) -> KeyStatus {
        fn status(key: &Option<String>) -> &'static str {
            if key.is_some() { "configured" } else { "missing" }
        }
        KeyStatus {
            anthropic: status(&self.anthropic_api_key),
            openai: status(&self.openai_api_key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)], profile: &str) -> Config {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(profile, &move |key: &str| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[], "");
        assert_eq!(config.profile_label(), "default");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.allowed_origins.len(), 2);
        assert_eq!(config.search.timeout_secs, 30);
        assert!(config.search.base_url.ends_with("/exp/v1/public"));
        assert_eq!(config.llm.max_iterations, 5);
        assert_eq!(config.llm.key_status().anthropic, "missing");
    }

    #[test]
    fn test_profile_prefix_wins() {
        let config = config_from(
            &[("PORT", "9000"), ("PROD_PORT", "9100"), ("OPENAI_API_KEY", "sk-test")],
            "prod",
        );
        assert_eq!(config.profile, "PROD");
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.llm.key_status().openai, "configured");
    }

    #[test]
    fn test_unparseable_numbers_fall_back() {
        let config = config_from(
            &[("LLM_MAX_ITERATIONS", "lots"), ("JGRANTS_TIMEOUT_SECS", "-1")],
            "",
        );
        assert_eq!(config.llm.max_iterations, 5);
        assert_eq!(config.search.timeout_secs, 30);
    }

    #[test]
    fn test_origins_are_trimmed() {
        let config = config_from(
            &[("ALLOWED_ORIGINS", " https://a.example , ,https://b.example")],
            "",
        );
        assert_eq!(
            config.server.allowed_origins,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
    }
}
