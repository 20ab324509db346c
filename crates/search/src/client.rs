use std::time::Duration;

use reqwest::StatusCode;
use serde::Serialize;
use tracing::{debug, warn};

use jgrants_core::SearchConfig;
use jgrants_tool_runtime::ToolResult;

use crate::error::SearchError;
use crate::models::{DetailEnvelope, DetailResponse, SearchEnvelope, SearchResponse};
use crate::query::SearchQuery;

pub const DEFAULT_BASE_URL: &str = "https://api.jgrants-portal.go.jp/exp/v1/public";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Read-only client for the J-Grants public subsidy API.
///
/// Every operation returns a [`ToolResult`]; validation, transport and
/// not-found failures all come back as `success: false` with a readable
/// `error`, never as a panic or a propagated transport error.
#[derive(Debug, Clone)]
pub struct JGrantsClient {
    client: reqwest::Client,
    base_url: String,
}

impl JGrantsClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SearchError::Unexpected(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &SearchConfig) -> Result<Self, SearchError> {
        Self::new(config.base_url.clone(), Duration::from_secs(config.timeout_secs))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Keyword search (`GET /subsidies`).
    pub async fn search(&self, query: &SearchQuery) -> ToolResult {
        into_tool_result(self.try_search(query).await)
    }

    /// Full record for one subsidy (`GET /subsidies/id/{id}`).
    pub async fn detail(&self, id: &str) -> ToolResult {
        into_tool_result(self.try_detail(id).await)
    }

    /// Open calls only, soonest deadline first. Same as `search` with
    /// `acceptance=1, sort=acceptance_end_datetime, order=ASC`.
    pub async fn search_active(&self, keyword: &str, target_area: Option<&str>) -> ToolResult {
        let query = SearchQuery::active(keyword, target_area.map(String::from));
        self.search(&query).await
    }

    pub async fn try_search(&self, query: &SearchQuery) -> Result<SearchResponse, SearchError> {
        let params = query.to_params()?;
        let url = format!("{}/subsidies", self.base_url);
        debug!(
            keyword = %query.keyword,
            sort = %query.sort,
            order = %query.order,
            "searching subsidies"
        );

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await?
            .error_for_status()?;
        let envelope: SearchEnvelope = response.json().await?;
        let result = SearchResponse::from(envelope);
        debug!(count = result.count, returned = result.subsidies.len(), "search complete");
        Ok(result)
    }

    pub async fn try_detail(&self, id: &str) -> Result<DetailResponse, SearchError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(SearchError::Validation("subsidy_idを指定してください".into()));
        }

        let mut url = reqwest::Url::parse(&format!("{}/subsidies/id/", self.base_url))
            .map_err(|e| SearchError::Unexpected(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| {
                SearchError::Unexpected(format!("base url cannot be a base: {}", self.base_url))
            })?
            .pop_if_empty()
            .push(id);
        debug!(%url, "fetching subsidy detail");

        let response = self.client.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(SearchError::NotFound);
        }
        let envelope: DetailEnvelope = response.error_for_status()?.json().await?;
        let record = envelope.into_record()?;
        Ok(DetailResponse {
            subsidy: record.into(),
        })
    }
}

fn into_tool_result<T: Serialize>(outcome: Result<T, SearchError>) -> ToolResult {
    match outcome.and_then(|value| {
        serde_json::to_value(value).map_err(|e| SearchError::Unexpected(e.to_string()))
    }) {
        Ok(payload) => ToolResult::ok(payload),
        Err(e) => {
            warn!(error = %e, "subsidy lookup failed");
            e.into()
        }
    }
}
