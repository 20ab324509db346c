//! Direct subsidy lookups, bypassing the models.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use jgrants_search::{SearchQuery, SortField, SortOrder};
use jgrants_tool_runtime::ToolResult;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub keyword: String,
    pub acceptance: Option<i64>,
    pub target_area: Option<String>,
    #[serde(default = "default_sort")]
    pub sort: String,
    #[serde(default = "default_order")]
    pub order: String,
    pub target_number_of_employees: Option<String>,
    pub use_purpose: Option<String>,
    pub industry: Option<String>,
}

fn default_sort() -> String {
    SortField::CreatedDate.to_string()
}

fn default_order() -> String {
    SortOrder::Desc.to_string()
}

impl From<SearchRequest> for SearchQuery {
    fn from(req: SearchRequest) -> Self {
        let mut query = SearchQuery::new(req.keyword)
            .sorted_by(&req.sort, &req.order)
            .with_target_area(req.target_area);
        query.acceptance = req.acceptance;
        query.target_number_of_employees = req.target_number_of_employees;
        query.use_purpose = req.use_purpose;
        query.industry = req.industry;
        query
    }
}

#[derive(Debug, Deserialize)]
pub struct ActiveParams {
    pub keyword: String,
    pub target_area: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DetailRequest {
    pub subsidy_id: String,
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SearchRequest>,
) -> Json<ToolResult> {
    Json(state.jgrants.search(&req.into()).await)
}

pub async fn active(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ActiveParams>,
) -> Json<ToolResult> {
    let area = params.target_area.as_deref().filter(|a| !a.is_empty());
    Json(state.jgrants.search_active(&params.keyword, area).await)
}

pub async fn detail(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DetailRequest>,
) -> Json<ToolResult> {
    Json(state.jgrants.detail(&req.subsidy_id).await)
}
