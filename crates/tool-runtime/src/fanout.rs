//! Multi-provider fan-out.
//!
//! Each requested provider gets its own [`ConversationLoop`] over its own copy
//! of the history, spawned as an independent task. A branch that fails, or
//! panics, only produces a failed [`LoopOutcome`] under its own key.

use crate::conversation::Message;
use crate::provider::ProviderAdapter;
use crate::registry::ToolRegistry;
use crate::runtime::{ConversationLoop, LoopOutcome, DEFAULT_MAX_ITERATIONS};
use futures::future::join_all;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info};

/// Provider name → outcome, one entry per provider invoked.
pub type FanoutResult = BTreeMap<String, LoopOutcome>;

/// Which providers a conversation should run against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Single(String),
    All,
}

impl FromStr for Target {
    type Err = OrchestratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Err(OrchestratorError::UnknownTarget(s.to_string())),
            "all" | "both" => Ok(Target::All),
            name => Ok(Target::Single(name.to_string())),
        }
    }
}

/// Envelope returned by [`Orchestrator::run_conversation`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConversationResponse {
    Single(LoopOutcome),
    Fanout(FanoutResult),
}

impl ConversationResponse {
    /// Flatten into a provider-keyed map regardless of shape.
    pub fn into_map(self) -> FanoutResult {
        match self {
            ConversationResponse::Single(outcome) => {
                let mut map = FanoutResult::new();
                map.insert(outcome.provider.clone(), outcome);
                map
            }
            ConversationResponse::Fanout(map) => map,
        }
    }
}

/// Owns the tool registry and the configured provider adapters.
/// Stateless between calls; share it behind an `Arc`.
pub struct Orchestrator {
    registry: Arc<ToolRegistry>,
    providers: BTreeMap<String, Arc<dyn ProviderAdapter>>,
    max_iterations: usize,
}

impl Orchestrator {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            providers: BTreeMap::new(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    /// Register a provider under its own `provider_name()`.
    pub fn with_provider(mut self, provider: Arc<dyn ProviderAdapter>) -> Self {
        self.providers
            .insert(provider.provider_name().to_string(), provider);
        self
    }

    pub fn provider_names(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    fn loop_for(&self, name: &str) -> Result<ConversationLoop, OrchestratorError> {
        let provider = self
            .providers
            .get(name)
            .ok_or_else(|| OrchestratorError::UnknownProvider(name.to_string()))?;
        Ok(ConversationLoop::new(provider.clone(), self.registry.clone())
            .with_max_iterations(self.max_iterations))
    }

    /// One provider's loop on its own task. Unregistered names, loop
    /// failures and panics all come back as a failed outcome.
    async fn run_branch(&self, name: &str, history: Vec<Message>) -> LoopOutcome {
        let conversation = match self.loop_for(name) {
            Ok(c) => c,
            Err(e) => return LoopOutcome::failed(name, e.to_string()),
        };
        let handle = tokio::spawn(async move { conversation.run(&history).await });
        match handle.await {
            Ok(outcome) => outcome,
            Err(join_err) => {
                error!(provider = %name, error = %join_err, "conversation branch aborted");
                LoopOutcome::failed(name, format!("{name} branch aborted: {join_err}"))
            }
        }
    }

    /// Run a single provider.
    pub async fn run_single(&self, name: &str, messages: &[Message]) -> LoopOutcome {
        self.run_branch(name, messages.to_vec()).await
    }

    /// Run every named provider concurrently. The result holds exactly one
    /// entry per distinct requested name, whatever order the branches
    /// finish in. Repeated names run once.
    pub async fn run_all(&self, messages: &[Message], providers: &[String]) -> FanoutResult {
        let mut seen = BTreeSet::new();
        let branches = providers
            .iter()
            .filter(|name| seen.insert(name.as_str()))
            .map(|name| async move {
                let outcome = self.run_branch(name, messages.to_vec()).await;
                (name.clone(), outcome)
            });

        let results: FanoutResult = join_all(branches).await.into_iter().collect();
        info!(
            providers = results.len(),
            succeeded = results.values().filter(|o| o.success).count(),
            "fan-out complete"
        );
        results
    }

    /// Entry point for front-ends: one provider, or all registered ones.
    pub async fn run_conversation(
        &self,
        messages: &[Message],
        target: &Target,
    ) -> ConversationResponse {
        match target {
            Target::Single(name) => {
                ConversationResponse::Single(self.run_single(name, messages).await)
            }
            Target::All => {
                let names = self.provider_names();
                ConversationResponse::Fanout(self.run_all(messages, &names).await)
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("provider '{0}' is not configured")]
    UnknownProvider(String),
    #[error("invalid conversation target '{0}'")]
    UnknownTarget(String),
}
