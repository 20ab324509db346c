use thiserror::Error;

use jgrants_tool_runtime::ToolResult;

/// Failures of a subsidy lookup. The `Display` text is what callers and
/// models see in `ToolResult.error`.
#[derive(Error, Debug)]
pub enum SearchError {
    /// Rejected locally, before any request was sent.
    #[error("{0}")]
    Validation(String),

    #[error("API通信エラー: {0}")]
    Transport(String),

    #[error("指定されたIDの補助金が見つかりませんでした")]
    NotFound,

    #[error("予期しないエラー: {0}")]
    Unexpected(String),
}

impl From<reqwest::Error> for SearchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            SearchError::Unexpected(e.to_string())
        } else {
            SearchError::Transport(e.to_string())
        }
    }
}

impl From<SearchError> for ToolResult {
    fn from(e: SearchError) -> Self {
        ToolResult::failure(e.to_string())
    }
}
