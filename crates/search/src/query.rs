//! Search parameters and the local validation that runs before any request.

use std::fmt;
use std::str::FromStr;

use crate::error::SearchError;

pub const KEYWORD_MIN_CHARS: usize = 2;
pub const KEYWORD_MAX_CHARS: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedDate,
    AcceptanceStart,
    AcceptanceEnd,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::CreatedDate => "created_date",
            SortField::AcceptanceStart => "acceptance_start_datetime",
            SortField::AcceptanceEnd => "acceptance_end_datetime",
        }
    }
}

impl FromStr for SortField {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created_date" => Ok(SortField::CreatedDate),
            "acceptance_start_datetime" => Ok(SortField::AcceptanceStart),
            "acceptance_end_datetime" => Ok(SortField::AcceptanceEnd),
            _ => Err(SearchError::Validation(
                "sortはcreated_date, acceptance_start_datetime, acceptance_end_datetimeのいずれかを指定してください".into(),
            )),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ASC" => Ok(SortOrder::Asc),
            "DESC" => Ok(SortOrder::Desc),
            _ => Err(SearchError::Validation("orderはASCまたはDESCを指定してください".into())),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A subsidy search as callers express it. `sort` and `order` stay raw
/// strings until [`SearchQuery::to_params`] validates them, so bad values
/// from a model or an HTTP client are rejected locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub keyword: String,
    pub sort: String,
    pub order: String,
    /// 1 = accepting applications only, 0 = all.
    pub acceptance: Option<i64>,
    pub target_area: Option<String>,
    pub target_number_of_employees: Option<String>,
    /// Multiple purposes are separated by " / ".
    pub use_purpose: Option<String>,
    /// Multiple industries are separated by " / ".
    pub industry: Option<String>,
}

impl SearchQuery {
    /// Newest first by creation date.
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            sort: SortField::CreatedDate.as_str().to_string(),
            order: SortOrder::Desc.as_str().to_string(),
            acceptance: None,
            target_area: None,
            target_number_of_employees: None,
            use_purpose: None,
            industry: None,
        }
    }

    /// Open calls only, soonest deadline first.
    pub fn active(keyword: impl Into<String>, target_area: Option<String>) -> Self {
        Self::new(keyword)
            .sorted_by(SortField::AcceptanceEnd.as_str(), SortOrder::Asc.as_str())
            .with_acceptance(1)
            .with_target_area(target_area)
    }

    pub fn sorted_by(mut self, sort: &str, order: &str) -> Self {
        self.sort = sort.to_string();
        self.order = order.to_string();
        self
    }

    pub fn with_acceptance(mut self, acceptance: i64) -> Self {
        self.acceptance = Some(acceptance);
        self
    }

    pub fn with_target_area(mut self, area: Option<String>) -> Self {
        self.target_area = area;
        self
    }

    /// Validate and render the query string pairs. No I/O.
    pub fn to_params(&self) -> Result<Vec<(&'static str, String)>, SearchError> {
        let chars = self.keyword.chars().count();
        if !(KEYWORD_MIN_CHARS..=KEYWORD_MAX_CHARS).contains(&chars) {
            return Err(SearchError::Validation("keywordは2～255文字で指定してください".into()));
        }
        let sort: SortField = self.sort.parse()?;
        let order: SortOrder = self.order.parse()?;

        let mut params = vec![
            ("keyword", self.keyword.clone()),
            ("sort", sort.to_string()),
            ("order", order.to_string()),
        ];

        if let Some(acceptance) = self.acceptance {
            if acceptance != 0 && acceptance != 1 {
                return Err(SearchError::Validation(
                    "acceptanceは0または1を指定してください".into(),
                ));
            }
            params.push(("acceptance", acceptance.to_string()));
        }

        let optional = [
            ("target_area_search", &self.target_area),
            ("target_number_of_employees", &self.target_number_of_employees),
            ("use_purpose", &self.use_purpose),
            ("industry", &self.industry),
        ];
        for (key, value) in optional {
            if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
                params.push((key, v.to_string()));
            }
        }

        Ok(params)
    }
}
