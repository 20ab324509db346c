//! J-Grants subsidy search backend and the tools that expose it to models.

pub mod client;
pub mod error;
pub mod models;
pub mod query;
pub mod tools;

pub use client::{JGrantsClient, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use error::SearchError;
pub use models::{DetailResponse, SearchResponse, SubsidyDetail, SubsidySummary};
pub use query::{SearchQuery, SortField, SortOrder};
pub use tools::{
    register_subsidy_tools, ActiveSubsidiesTool, SearchSubsidiesTool, SubsidyDetailTool,
};
