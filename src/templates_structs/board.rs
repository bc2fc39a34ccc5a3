use askama::Template;

use super::PageContext;
use crate::models::activity::ActivityEvent;
use crate::models::board::Column;
use crate::models::chat::ChatMessage;
use crate::models::member::TeamMember;
use crate::models::stage::{COLUMNS, ColumnConfig, Impact, Priority};
use crate::models::task::{Task, TaskForm};

#[derive(Template)]
#[template(path = "board.html")]
pub struct BoardTemplate {
    pub ctx: PageContext,
    pub columns: Vec<Column>,
    pub members: Vec<TeamMember>,
    pub stages: &'static [ColumnConfig],
    pub priorities: &'static [Priority],
    /// Current toolbar values, echoed back into the form.
    pub owner_value: String,
    pub status_value: String,
    pub priority_value: String,
    pub q_value: String,
    pub visible: usize,
    pub total: usize,
    pub today: chrono::NaiveDate,
}

/// Raw values shown in the create/edit form, so a rejected submit can be
/// re-rendered as typed.
#[derive(Debug, Clone, Default)]
pub struct TaskFormValues {
    pub op_number: String,
    pub title: String,
    pub summary: String,
    pub status: String,
    pub priority: String,
    pub owner_id: String,
    pub tags: String,
    pub materials: String,
    pub impact: String,
    pub due_date: String,
    pub progress: String,
}

impl TaskFormValues {
    pub fn blank() -> Self {
        Self {
            status: "pendiente".to_string(),
            priority: Priority::Media.id().to_string(),
            impact: Impact::Medio.id().to_string(),
            progress: "0".to_string(),
            ..Default::default()
        }
    }

    pub fn from_task(task: &Task) -> Self {
        Self {
            op_number: task.op_number.clone(),
            title: task.title.clone(),
            summary: task.summary.clone(),
            status: task.status.id().to_string(),
            priority: task.priority.id().to_string(),
            owner_id: task.owner_id.map(|id| id.to_string()).unwrap_or_default(),
            tags: task.tags.join(", "),
            materials: task.materials.join(", "),
            impact: task.impact.id().to_string(),
            due_date: task.due_date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default(),
            progress: task.progress.to_string(),
        }
    }

    pub fn from_form(form: &TaskForm) -> Self {
        Self {
            op_number: form.op_number.clone(),
            title: form.title.clone(),
            summary: form.summary.clone(),
            status: form.status.clone(),
            priority: form.priority.clone(),
            owner_id: form.owner_id.clone(),
            tags: form.tags.clone(),
            materials: form.materials.clone(),
            impact: form.impact.clone(),
            due_date: form.due_date.clone(),
            progress: form.progress.clone(),
        }
    }
}

#[derive(Template)]
#[template(path = "task_form.html")]
pub struct TaskFormTemplate {
    pub ctx: PageContext,
    pub form_title: String,
    pub form_action: String,
    pub is_edit: bool,
    pub values: TaskFormValues,
    pub members: Vec<TeamMember>,
    pub stages: &'static [ColumnConfig],
    pub priorities: &'static [Priority],
    pub impacts: &'static [Impact],
    pub errors: Vec<String>,
}

impl TaskFormTemplate {
    pub fn new(ctx: PageContext, is_edit: bool, action: String, values: TaskFormValues, members: Vec<TeamMember>) -> Self {
        Self {
            ctx,
            form_title: if is_edit { "Editar OP".to_string() } else { "Nueva OP".to_string() },
            form_action: action,
            is_edit,
            values,
            members,
            stages: &COLUMNS,
            priorities: &Priority::ALL,
            impacts: &Impact::ALL,
            errors: Vec::new(),
        }
    }
}

#[derive(Template)]
#[template(path = "task_detail.html")]
pub struct TaskDetailTemplate {
    pub ctx: PageContext,
    pub task: Task,
    pub activity: Vec<ActivityEvent>,
    pub messages: Vec<ChatMessage>,
    pub channel: String,
    pub stages: &'static [ColumnConfig],
    pub today: chrono::NaiveDate,
}
