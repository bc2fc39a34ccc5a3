use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Assigned,
    Moved,
    Stalled,
    Mention,
    Chat,
}

impl NotificationKind {
    pub const ALL: [NotificationKind; 5] = [
        NotificationKind::Assigned,
        NotificationKind::Moved,
        NotificationKind::Stalled,
        NotificationKind::Mention,
        NotificationKind::Chat,
    ];

    pub fn id(self) -> &'static str {
        match self {
            NotificationKind::Assigned => "assigned",
            NotificationKind::Moved => "moved",
            NotificationKind::Stalled => "stalled",
            NotificationKind::Mention => "mention",
            NotificationKind::Chat => "chat",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.id() == id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub recipient_id: i64,
    pub kind: NotificationKind,
    pub message: String,
    pub task_id: Option<i64>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn time_label(&self) -> String {
        self.created_at.format("%d/%m %H:%M").to_string()
    }
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub recipient_id: i64,
    pub kind: NotificationKind,
    pub message: String,
    pub task_id: Option<i64>,
}
