use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::envelope::timestamp;

pub const PLACEHOLDER_PREFIX: &str = "temp-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
    System,
}

impl std::fmt::Display for ChatRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
            Self::System => write!(f, "system"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    #[serde(default)]
    pub session_id: Option<String>,
    pub role: ChatRole,
    pub content: String,
    #[serde(default, with = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

impl ChatMessage {
    /// A locally generated user message shown until the server confirms it.
    pub fn placeholder(session_id: Option<String>, content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: format!("{}{}", PLACEHOLDER_PREFIX, now.timestamp_millis()),
            session_id,
            role: ChatRole::User,
            content: content.into(),
            created_at: Some(now),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.id.starts_with(PLACEHOLDER_PREFIX)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewMessage {
    pub content: String,
    pub role: ChatRole,
}

impl NewMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            role: ChatRole::User,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageReply {
    #[serde(default)]
    pub session_id: Option<String>,
    pub user_message: ChatMessage,
    pub assistant_message: ChatMessage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_id_format() {
        let msg = ChatMessage::placeholder(Some("s1".to_string()), "hello");
        assert!(msg.id.starts_with("temp-"));
        assert!(msg.id["temp-".len()..].parse::<i64>().is_ok());
        assert!(msg.is_placeholder());
        assert_eq!(msg.role, ChatRole::User);
    }

    #[test]
    fn test_role_wire_format() {
        let role: ChatRole = serde_json::from_str("\"assistant\"").unwrap();
        assert_eq!(role, ChatRole::Assistant);
        assert_eq!(
            serde_json::to_value(NewMessage::user("hi")).unwrap(),
            serde_json::json!({"content": "hi", "role": "user"})
        );
    }

    #[test]
    fn test_send_reply_deserializes() {
        let json = r#"{
            "session_id": "s1",
            "user_message": {"id": "m1", "session_id": "s1", "role": "user", "content": "hi"},
            "assistant_message": {"id": "m2", "session_id": "s1", "role": "assistant", "content": "hello"}
        }"#;
        let reply: SendMessageReply = serde_json::from_str(json).unwrap();
        assert_eq!(reply.user_message.id, "m1");
        assert_eq!(reply.assistant_message.role, ChatRole::Assistant);
        assert!(!reply.user_message.is_placeholder());
    }
}
