//! The subsidy tools offered to models: `search_subsidies`,
//! `get_subsidy_detail` and `search_active_subsidies`.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use jgrants_tool_runtime::tool::{optional_str, required_str};
use jgrants_tool_runtime::{
    RegistryError, Tool, ToolDefinition, ToolError, ToolRegistry, ToolResult,
};

use crate::client::JGrantsClient;
use crate::query::SearchQuery;

pub struct SearchSubsidiesTool {
    client: Arc<JGrantsClient>,
}

pub struct SubsidyDetailTool {
    client: Arc<JGrantsClient>,
}

pub struct ActiveSubsidiesTool {
    client: Arc<JGrantsClient>,
}

/// Register all three subsidy tools against one shared client.
pub fn register_subsidy_tools(
    registry: &mut ToolRegistry,
    client: Arc<JGrantsClient>,
) -> Result<(), RegistryError> {
    registry.register(SearchSubsidiesTool { client: client.clone() })?;
    registry.register(SubsidyDetailTool { client: client.clone() })?;
    registry.register(ActiveSubsidiesTool { client })?;
    Ok(())
}

fn target_area_property() -> Value {
    json!({
        "type": "string",
        "description": "対象地域（例: 東京都、大阪府など）"
    })
}

#[async_trait]
impl Tool for SearchSubsidiesTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "search_subsidies".to_string(),
            description: "Jグランツで補助金を検索します。キーワードで検索し、募集中のみや地域でフィルタリングできます。".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "keyword": {
                        "type": "string",
                        "description": "検索キーワード（2～255文字）"
                    },
                    "acceptance": {
                        "type": "integer",
                        "description": "募集中フィルタ（1: 募集中のみ, 0: 全て）",
                        "enum": [0, 1]
                    },
                    "target_area": target_area_property(),
                    "sort": {
                        "type": "string",
                        "description": "ソート項目",
                        "enum": ["created_date", "acceptance_start_datetime", "acceptance_end_datetime"]
                    },
                    "order": {
                        "type": "string",
                        "description": "ソート順",
                        "enum": ["ASC", "DESC"]
                    }
                },
                "required": ["keyword"]
            }),
        }
    }

    async fn execute(&self, input: Value) -> Result<ToolResult, ToolError> {
        let keyword = required_str(&input, "keyword")?;
        let acceptance = match input.get("acceptance") {
            None | Some(Value::Null) => None,
            Some(v) => Some(v.as_i64().ok_or_else(|| {
                ToolError::InvalidInput("'acceptance' must be 0 or 1".to_string())
            })?),
        };

        let mut query = SearchQuery::new(keyword)
            .with_target_area(optional_str(&input, "target_area").map(String::from));
        if let Some(acceptance) = acceptance {
            query = query.with_acceptance(acceptance);
        }
        let sort = optional_str(&input, "sort").unwrap_or("created_date");
        let order = optional_str(&input, "order").unwrap_or("DESC");
        query = query.sorted_by(sort, order);

        Ok(self.client.search(&query).await)
    }
}

#[async_trait]
impl Tool for SubsidyDetailTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "get_subsidy_detail".to_string(),
            description: "補助金IDを指定して詳細情報を取得します。補助率、概要、注意事項などの詳細が取得できます。".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "subsidy_id": {
                        "type": "string",
                        "description": "補助金ID（search_subsidiesで取得したID）"
                    }
                },
                "required": ["subsidy_id"]
            }),
        }
    }

    async fn execute(&self, input: Value) -> Result<ToolResult, ToolError> {
        let id = required_str(&input, "subsidy_id")?;
        Ok(self.client.detail(id).await)
    }
}

#[async_trait]
impl Tool for ActiveSubsidiesTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "search_active_subsidies".to_string(),
            description: "現在募集中の補助金を検索します。申請期限が近い順に表示します。".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "keyword": {
                        "type": "string",
                        "description": "検索キーワード"
                    },
                    "target_area": target_area_property()
                },
                "required": ["keyword"]
            }),
        }
    }

    async fn execute(&self, input: Value) -> Result<ToolResult, ToolError> {
        let keyword = required_str(&input, "keyword")?;
        let target_area = optional_str(&input, "target_area");
        Ok(self.client.search_active(keyword, target_area).await)
    }
}
