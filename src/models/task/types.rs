use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::validate;
use crate::models::stage::{Impact, Priority, Stage};

/// A production order (OP) as shown on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub op_number: String,
    /// Client name.
    pub title: String,
    pub summary: String,
    pub status: Stage,
    pub priority: Priority,
    pub owner_id: Option<i64>,
    /// Owner display name, joined from `members` when loaded.
    pub owner_name: Option<String>,
    pub created_by: String,
    pub tags: Vec<String>,
    pub materials: Vec<String>,
    pub sector: String,
    pub photo_url: Option<String>,
    pub progress: i32,
    pub impact: Impact,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn owner_label(&self) -> &str {
        self.owner_name.as_deref().unwrap_or("Sin asignar")
    }

    pub fn due_label(&self) -> String {
        self.due_date
            .map(|d| d.format("%d/%m/%Y").to_string())
            .unwrap_or_default()
    }

    pub fn is_overdue(&self, today: &NaiveDate) -> bool {
        !self.status.is_terminal() && self.due_date.is_some_and(|d| d < *today)
    }
}

/// Input for creating a task.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTask {
    pub op_number: String,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub status: Option<Stage>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub owner_id: Option<i64>,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub materials: Vec<String>,
    #[serde(default)]
    pub impact: Option<Impact>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

/// Full replacement of the editable fields of a task.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskUpdate {
    pub op_number: String,
    pub title: String,
    pub summary: String,
    pub status: Stage,
    pub priority: Priority,
    pub owner_id: Option<i64>,
    pub tags: Vec<String>,
    pub materials: Vec<String>,
    pub impact: Impact,
    pub due_date: Option<NaiveDate>,
    pub progress: i32,
}

impl TaskUpdate {
    /// Start an update from the current state of a task.
    pub fn from_task(task: &Task) -> Self {
        Self {
            op_number: task.op_number.clone(),
            title: task.title.clone(),
            summary: task.summary.clone(),
            status: task.status,
            priority: task.priority,
            owner_id: task.owner_id,
            tags: task.tags.clone(),
            materials: task.materials.clone(),
            impact: task.impact,
            due_date: task.due_date,
            progress: task.progress,
        }
    }
}

/// Form data from the create/edit task pages. Lists arrive comma separated.
#[derive(Debug, Deserialize)]
pub struct TaskForm {
    pub op_number: String,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    pub status: String,
    pub priority: String,
    #[serde(default)]
    pub owner_id: String,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub materials: String,
    #[serde(default)]
    pub impact: String,
    #[serde(default)]
    pub due_date: String,
    #[serde(default)]
    pub progress: String,
    pub csrf_token: String,
}

impl NewTask {
    /// A new OP carrying the fields of a parsed form. Progress is derived
    /// from the stage on creation.
    pub fn from_update(update: TaskUpdate, created_by: &str) -> Self {
        Self {
            op_number: update.op_number,
            title: update.title,
            summary: update.summary,
            status: Some(update.status),
            priority: Some(update.priority),
            owner_id: update.owner_id,
            created_by: created_by.to_string(),
            tags: update.tags,
            materials: update.materials,
            impact: Some(update.impact),
            due_date: update.due_date,
        }
    }
}

impl TaskForm {
    /// Validate the raw form fields. Every problem is reported, not just the first.
    pub fn parse(&self) -> Result<TaskUpdate, Vec<String>> {
        let mut errors = Vec::new();
        errors.extend(validate::validate_required(&self.op_number, "OP number", 40));
        errors.extend(validate::validate_required(&self.title, "Client", 200));
        errors.extend(validate::validate_optional(&self.summary, "Summary", 2000));

        let status = Stage::from_id(self.status.trim()).or_else(|| Stage::from_label(self.status.trim()));
        if status.is_none() {
            errors.push(format!("Unknown stage '{}'", self.status.trim()));
        }
        let priority = Priority::from_id(self.priority.trim());
        if priority.is_none() {
            errors.push(format!("Unknown priority '{}'", self.priority.trim()));
        }
        let impact = match self.impact.trim() {
            "" => Some(Impact::Medio),
            raw => Impact::from_id(raw),
        };
        if impact.is_none() {
            errors.push(format!("Unknown impact '{}'", self.impact.trim()));
        }
        let owner_id = match self.owner_id.trim() {
            "" | "sin_asignar" => None,
            raw => match raw.parse::<i64>() {
                Ok(id) => Some(id),
                Err(_) => {
                    errors.push("Owner must be a team member".to_string());
                    None
                }
            },
        };
        let due_date = match self.due_date.trim() {
            "" => None,
            raw => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
                Ok(d) => Some(d),
                Err(_) => {
                    errors.push("Due date must be YYYY-MM-DD".to_string());
                    None
                }
            },
        };
        let progress = validate::validate_progress(&self.progress).unwrap_or_else(|e| {
            errors.push(e);
            0
        });

        match (status, priority, impact) {
            (Some(status), Some(priority), Some(impact)) if errors.is_empty() => Ok(TaskUpdate {
                op_number: self.op_number.trim().to_string(),
                title: self.title.trim().to_string(),
                summary: self.summary.trim().to_string(),
                status,
                priority,
                owner_id,
                tags: split_list(&self.tags),
                materials: split_list(&self.materials),
                impact,
                due_date,
                progress,
            }),
            _ => Err(errors),
        }
    }
}

/// Split a comma separated list, trimming and dropping empties.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> TaskForm {
        TaskForm {
            op_number: " OP-77 ".to_string(),
            title: "Ferretería Norte".to_string(),
            summary: String::new(),
            status: "Impresión".to_string(),
            priority: "alta".to_string(),
            owner_id: "3".to_string(),
            tags: "lona, , urgente".to_string(),
            materials: String::new(),
            impact: String::new(),
            due_date: "2024-06-30".to_string(),
            progress: "40".to_string(),
            csrf_token: "t".to_string(),
        }
    }

    #[test]
    fn parse_accepts_labels_and_trims() {
        let update = form().parse().unwrap();
        assert_eq!(update.op_number, "OP-77");
        assert_eq!(update.status, Stage::Impresion);
        assert_eq!(update.priority, Priority::Alta);
        assert_eq!(update.owner_id, Some(3));
        assert_eq!(update.tags, vec!["lona", "urgente"]);
        assert_eq!(update.impact, Impact::Medio);
        assert_eq!(update.progress, 40);
    }

    #[test]
    fn parse_collects_every_error() {
        let mut bad = form();
        bad.title = "  ".to_string();
        bad.status = "bodega".to_string();
        bad.due_date = "30/06/2024".to_string();
        bad.progress = "120".to_string();
        let errors = bad.parse().unwrap_err();
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn delivered_ops_are_never_overdue() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let mut t = crate::models::testutil::task(1, Stage::Pintura, None);
        assert!(!t.is_overdue(&today));
        t.due_date = NaiveDate::from_ymd_opt(2024, 6, 9);
        assert!(t.is_overdue(&today));
        t.due_date = Some(today);
        assert!(!t.is_overdue(&today));
        t.due_date = NaiveDate::from_ymd_opt(2024, 6, 1);
        t.status = Stage::Entrega;
        assert!(!t.is_overdue(&today));
    }
}
