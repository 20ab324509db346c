//! HTTP front-end for the subsidy chat: chat fan-out, direct subsidy
//! lookups and health endpoints.

pub mod api;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::AppState;
