use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::models::activity::ActivityEvent;
use crate::models::member::TeamMember;
use crate::models::stage::{ColumnConfig, Impact, Priority, Stage};
use crate::models::task::{BoardQuery, Task, TaskUpdate};

/// Generic paginated response wrapper for API endpoints.
#[derive(Serialize, Debug, Clone)]
pub struct PaginatedResponse<T: Serialize> {
    pub items: Vec<T>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
}

impl<T: Serialize> PaginatedResponse<T> {
    /// Slice one page out of an already filtered list. `page` is 1-based.
    pub fn from_all(all: Vec<T>, page: i64, per_page: i64) -> Self {
        let total = all.len() as i64;
        let skip = page.saturating_sub(1).max(0).saturating_mul(per_page.max(0));
        let skip = usize::try_from(skip).unwrap_or(usize::MAX);
        let take = usize::try_from(per_page).unwrap_or(0);
        let items = all.into_iter().skip(skip).take(take).collect();
        PaginatedResponse { items, page, per_page, total }
    }
}

/// API error response.
#[derive(Serialize, Deserialize, Debug)]
pub struct ApiErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct ApiTokenRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Debug)]
pub struct ApiTokenResponse {
    pub token: String,
    pub member: TeamMember,
}

/// Body of `POST /api/v1/tasks/{id}/move`. `status` accepts a stage id or label.
#[derive(Deserialize, Debug)]
pub struct ApiMoveRequest {
    pub status: String,
}

/// Query string of `GET /api/v1/tasks`: board filters plus paging.
#[derive(Deserialize, Debug, Default)]
pub struct ApiTaskQuery {
    pub owner: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub q: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl ApiTaskQuery {
    pub fn board_query(&self) -> BoardQuery {
        BoardQuery {
            owner: self.owner.clone(),
            status: self.status.clone(),
            priority: self.priority.clone(),
            q: self.q.clone(),
        }
    }

    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> i64 {
        self.per_page.unwrap_or(50).clamp(1, 200)
    }
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Body of `PUT /api/v1/tasks/{id}`. Absent fields keep their value;
/// `"owner_id": null` unassigns and `"due_date": null` clears the date.
#[derive(Deserialize, Debug, Default)]
pub struct ApiTaskUpdate {
    pub op_number: Option<String>,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub status: Option<Stage>,
    pub priority: Option<Priority>,
    #[serde(default, deserialize_with = "double_option")]
    pub owner_id: Option<Option<i64>>,
    pub tags: Option<Vec<String>>,
    pub materials: Option<Vec<String>>,
    pub impact: Option<Impact>,
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<NaiveDate>>,
    pub progress: Option<i32>,
}

impl ApiTaskUpdate {
    pub fn apply_to(self, mut base: TaskUpdate) -> TaskUpdate {
        if let Some(v) = self.op_number {
            base.op_number = v.trim().to_string();
        }
        if let Some(v) = self.title {
            base.title = v.trim().to_string();
        }
        if let Some(v) = self.summary {
            base.summary = v;
        }
        if let Some(v) = self.status {
            base.status = v;
        }
        if let Some(v) = self.priority {
            base.priority = v;
        }
        if let Some(v) = self.owner_id {
            base.owner_id = v;
        }
        if let Some(v) = self.tags {
            base.tags = v;
        }
        if let Some(v) = self.materials {
            base.materials = v;
        }
        if let Some(v) = self.impact {
            base.impact = v;
        }
        if let Some(v) = self.due_date {
            base.due_date = v;
        }
        if let Some(v) = self.progress {
            base.progress = v;
        }
        base
    }
}

/// Result of a move or an edit: the task plus the activity it produced, if any.
#[derive(Serialize, Debug)]
pub struct ApiTaskChange {
    pub task: Task,
    pub activity: Option<ActivityEvent>,
}

#[derive(Deserialize, Debug, Default)]
pub struct ApiActivityQuery {
    pub task_id: Option<i64>,
    pub limit: Option<i64>,
}

/// Column configuration as served by `GET /api/v1/stages`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ApiStage {
    pub id: String,
    pub label: String,
    pub description: String,
    pub sector: String,
    pub color: String,
    pub position: usize,
    pub terminal: bool,
}

impl From<&ColumnConfig> for ApiStage {
    fn from(c: &ColumnConfig) -> Self {
        let stage: Stage = c.stage;
        ApiStage {
            id: stage.id().to_string(),
            label: c.label.to_string(),
            description: c.description.to_string(),
            sector: c.sector.to_string(),
            color: c.color.to_string(),
            position: stage.position(),
            terminal: stage.is_terminal(),
        }
    }
}
