//! MCP (Model Context Protocol) tool server for the subsidy tools.
//!
//! Exposes the same registry the chat loop uses (`search_subsidies`,
//! `get_subsidy_detail`, `search_active_subsidies`) to any MCP client over
//! newline-delimited JSON-RPC 2.0 on stdio.
//!
//! - **types**: JSON-RPC envelopes and the MCP payloads this server speaks
//! - **transport**: line transport trait, stdio and in-memory channel impls
//! - **server**: request dispatch over a shared `ToolRegistry`
//! - **error**: protocol errors and their JSON-RPC codes

pub mod error;
pub mod server;
pub mod transport;
pub mod types;

pub use error::McpError;
pub use server::{McpServer, SERVER_NAME};
pub use transport::{ChannelTransport, McpTransport, StdioTransport};
pub use types::{JsonRpcRequest, JsonRpcResponse, RpcId, PROTOCOL_VERSION};
