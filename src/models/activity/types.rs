use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::stage::Stage;

/// One entry of an OP's movement history. Never mutated once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub id: i64,
    pub task_id: i64,
    /// `None` for the entry recorded when the OP is created.
    pub from_status: Option<Stage>,
    pub to_status: Stage,
    pub actor_id: Option<i64>,
    pub actor_name: Option<String>,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

impl ActivityEvent {
    pub fn from_label(&self) -> &'static str {
        self.from_status.map(|s| s.label()).unwrap_or("—")
    }

    pub fn actor_label(&self) -> &str {
        self.actor_name.as_deref().unwrap_or("Sistema")
    }
}

/// Activity entry waiting to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewActivity {
    pub task_id: i64,
    pub from_status: Option<Stage>,
    pub to_status: Stage,
    pub actor_id: Option<i64>,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

/// Default cap on activity fetches.
pub const DEFAULT_ACTIVITY_LIMIT: i64 = 200;
