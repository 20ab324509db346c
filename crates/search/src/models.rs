//! Upstream J-Grants payloads and the trimmed shapes handed to models.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SearchError;

// ── Upstream ──────────────────────────────────────────────────

/// `GET /subsidies` body.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct SearchEnvelope {
    #[serde(default)]
    pub metadata: Option<Metadata>,
    #[serde(default)]
    pub result: Option<Vec<RawSubsidy>>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Metadata {
    #[serde(default)]
    pub resultset: Option<ResultSet>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ResultSet {
    #[serde(default)]
    pub count: Option<u64>,
}

/// Upstream record fields are kept as raw JSON so an unexpected type in one
/// record (a numeric employee count, say) passes through instead of failing
/// the whole response.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawSubsidy {
    pub id: Value,
    pub name: Value,
    pub title: Value,
    pub target_area_search: Value,
    pub subsidy_max_limit: Value,
    pub acceptance_start_datetime: Value,
    pub acceptance_end_datetime: Value,
    pub target_number_of_employees: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawSubsidyDetail {
    #[serde(flatten)]
    pub base: RawSubsidy,
    pub subsidy_rate: Value,
    pub purpose: Value,
    pub outline: Value,
    pub note: Value,
    pub grant_guideline_url: Value,
    pub application_form_files: Value,
}

/// `GET /subsidies/id/{id}` body: `result` is an object or a one-element list.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct DetailEnvelope {
    #[serde(default)]
    pub result: Value,
}

impl DetailEnvelope {
    /// The single record, or `NotFound` when `result` is null or empty.
    pub fn into_record(self) -> Result<RawSubsidyDetail, SearchError> {
        let record = match self.result {
            Value::Array(mut items) if !items.is_empty() => items.swap_remove(0),
            Value::Object(fields) if !fields.is_empty() => Value::Object(fields),
            _ => return Err(SearchError::NotFound),
        };
        serde_json::from_value(record).map_err(|e| SearchError::Unexpected(e.to_string()))
    }
}

// ── Shaped output ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubsidySummary {
    pub id: Value,
    pub name: Value,
    pub title: Value,
    pub target_area: Value,
    pub subsidy_max_limit: Value,
    pub acceptance_start: Value,
    pub acceptance_end: Value,
    pub target_employees: Value,
}

impl From<RawSubsidy> for SubsidySummary {
    fn from(raw: RawSubsidy) -> Self {
        Self {
            id: raw.id,
            name: raw.name,
            title: raw.title,
            target_area: raw.target_area_search,
            subsidy_max_limit: raw.subsidy_max_limit,
            acceptance_start: raw.acceptance_start_datetime,
            acceptance_end: raw.acceptance_end_datetime,
            target_employees: raw.target_number_of_employees,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResponse {
    pub count: u64,
    pub subsidies: Vec<SubsidySummary>,
}

impl From<SearchEnvelope> for SearchResponse {
    fn from(envelope: SearchEnvelope) -> Self {
        let count = envelope
            .metadata
            .and_then(|m| m.resultset)
            .and_then(|r| r.count)
            .unwrap_or(0);
        Self {
            count,
            subsidies: envelope
                .result
                .unwrap_or_default()
                .into_iter()
                .map(SubsidySummary::from)
                .collect(),
        }
    }
}

/// Detail record. Attached application files are reported as a count only;
/// their base64 bodies never reach the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubsidyDetail {
    #[serde(flatten)]
    pub summary: SubsidySummary,
    pub subsidy_rate: Value,
    pub purpose: Value,
    pub outline: Value,
    pub note: Value,
    pub grant_guideline_url: Value,
    pub application_form_files: usize,
}

impl From<RawSubsidyDetail> for SubsidyDetail {
    fn from(raw: RawSubsidyDetail) -> Self {
        Self {
            summary: raw.base.into(),
            subsidy_rate: raw.subsidy_rate,
            purpose: raw.purpose,
            outline: raw.outline,
            note: raw.note,
            grant_guideline_url: raw.grant_guideline_url,
            application_form_files: raw.application_form_files.as_array().map_or(0, Vec::len),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailResponse {
    pub subsidy: SubsidyDetail,
}
