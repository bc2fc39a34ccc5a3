use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CHANNEL: &str = "general";
pub const DEFAULT_CHAT_LIMIT: i64 = 100;
pub const MAX_BODY_LEN: usize = 2000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: i64,
    pub channel: String,
    pub author_id: i64,
    pub author_name: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn time_label(&self) -> String {
        self.created_at.format("%d/%m %H:%M").to_string()
    }
}

/// Per-OP thread channel name.
pub fn task_channel(task_id: i64) -> String {
    format!("task:{task_id}")
}

/// Accept `general` or `task:{id}`; anything else falls back to `general`.
pub fn normalize_channel(raw: &str) -> String {
    let raw = raw.trim();
    match raw.strip_prefix("task:").map(str::parse::<i64>) {
        Some(Ok(id)) if id > 0 => task_channel(id),
        _ => DEFAULT_CHANNEL.to_string(),
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatForm {
    #[serde(default)]
    pub channel: String,
    pub body: String,
    pub csrf_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channels_are_normalized() {
        assert_eq!(normalize_channel("task:12"), "task:12");
        assert_eq!(normalize_channel(" general "), "general");
        assert_eq!(normalize_channel("task:abc"), "general");
        assert_eq!(normalize_channel("task:-1"), "general");
        assert_eq!(normalize_channel("random"), "general");
    }
}
