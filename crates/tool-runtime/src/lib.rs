pub mod conversation;
pub mod fanout;
pub mod provider;
pub mod registry;
pub mod runtime;
pub mod tool;

pub use conversation::{Message, Role};
pub use fanout::{ConversationResponse, FanoutResult, Orchestrator, OrchestratorError, Target};
pub use provider::{LlmError, ProviderAdapter, RawProviderResponse};
pub use registry::{RegistryError, ToolRegistry};
pub use runtime::{ConversationLoop, LoopOutcome, ToolCallRecord, DEFAULT_MAX_ITERATIONS};
pub use tool::{Tool, ToolCall, ToolDefinition, ToolError, ToolResult};
