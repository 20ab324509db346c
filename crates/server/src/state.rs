use std::sync::Arc;

use tracing::info;

use jgrants_core::{Config, KeyStatus};
use jgrants_llm::build_providers;
use jgrants_search::{register_subsidy_tools, JGrantsClient};
use jgrants_tool_runtime::{Orchestrator, ToolRegistry};

/// Shared by every handler. Built once at startup, read-only afterwards.
pub struct AppState {
    pub orchestrator: Orchestrator,
    pub jgrants: Arc<JGrantsClient>,
    pub key_status: KeyStatus,
}

impl AppState {
    pub fn new(
        orchestrator: Orchestrator,
        jgrants: Arc<JGrantsClient>,
        key_status: KeyStatus,
    ) -> Self {
        Self {
            orchestrator,
            jgrants,
            key_status,
        }
    }

    /// Wire the subsidy client, the tool registry and every configured
    /// provider adapter.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let jgrants = Arc::new(JGrantsClient::from_config(&config.search)?);

        let mut registry = ToolRegistry::new();
        register_subsidy_tools(&mut registry, jgrants.clone())?;
        info!(tools = registry.len(), "tool registry ready");

        let mut orchestrator = Orchestrator::new(Arc::new(registry))
            .with_max_iterations(config.llm.max_iterations);
        for provider in build_providers(&config.llm)? {
            orchestrator = orchestrator.with_provider(provider);
        }

        Ok(Self::new(orchestrator, jgrants, config.llm.key_status()))
    }
}
