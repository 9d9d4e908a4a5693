use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::envelope::timestamp;

pub const UNTITLED_SESSION: &str = "New chat";

/// Longest title the backend derives from a session's first message.
pub const AUTO_TITLE_LEN: usize = 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, with = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ChatSession {
    pub fn new(id: impl Into<String>, title: Option<String>) -> Self {
        Self {
            id: id.into(),
            user_id: None,
            title,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn display_title(&self) -> &str {
        match self.title.as_deref() {
            Some(t) if !t.trim().is_empty() => t,
            _ => UNTITLED_SESSION,
        }
    }

    pub fn is_untitled(&self) -> bool {
        self.title.as_deref().map_or(true, |t| t.trim().is_empty())
    }

    /// Mirrors the title the backend assigns after the first message.
    pub fn auto_title(content: &str) -> String {
        content.trim().chars().take(AUTO_TITLE_LEN).collect()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewSession {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionUpdate {
    pub title: String,
}
