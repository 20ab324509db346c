use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

/// One turn of the running history.
///
/// `content` is opaque outside the provider adapters: plain text for turns
/// supplied by the caller, and whatever block structure a provider needs for
/// the turns its adapter appends. `extra` holds adapter-owned sibling fields
/// of the wire message (for example the id a tool turn answers).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Value,
    #[serde(flatten, default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl Message {
    pub fn new(role: Role, content: Value) -> Self {
        Self {
            role,
            content,
            extra: Map::new(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, Value::String(text.into()))
    }

    pub fn with_extra(mut self, key: &str, value: Value) -> Self {
        self.extra.insert(key.to_string(), value);
        self
    }

    /// Text content, when the turn is plain text.
    pub fn text(&self) -> Option<&str> {
        self.content.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_message_wire_shape() {
        let msg = Message::user("補助金を探して");
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value, json!({"role": "user", "content": "補助金を探して"}));
    }

    #[test]
    fn test_extra_fields_flatten() {
        let msg = Message::new(Role::Tool, json!("{}")).with_extra("tool_call_id", json!("call_1"));
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["role"], "tool");
        assert_eq!(value["tool_call_id"], "call_1");
    }

    #[test]
    fn test_deserialize_from_front_end() {
        let msg: Message =
            serde_json::from_value(json!({"role": "assistant", "content": "はい"})).unwrap();
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.text(), Some("はい"));
        assert!(msg.extra.is_empty());
    }

    #[test]
    fn test_unknown_role_rejected() {
        let parsed: Result<Message, _> =
            serde_json::from_value(json!({"role": "system", "content": "x"}));
        assert!(parsed.is_err());
    }
}
