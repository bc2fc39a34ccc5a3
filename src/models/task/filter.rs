// src/models/task/filter.rs
use serde::Deserialize;

use super::types::Task;
use crate::models::stage::{Priority, Stage};

/// Owner selector on the board toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OwnerFilter {
    /// "todos": every task regardless of owner.
    #[default]
    All,
    Unassigned,
    Member(i64),
}

impl OwnerFilter {
    /// Parse the query-string value (`todos`, `sin_asignar` or a member id).
    /// Anything unrecognised means "todos".
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "" | "todos" => OwnerFilter::All,
            "sin_asignar" => OwnerFilter::Unassigned,
            other => other
                .parse::<i64>()
                .map(OwnerFilter::Member)
                .unwrap_or(OwnerFilter::All),
        }
    }

    pub fn as_query(&self) -> String {
        match self {
            OwnerFilter::All => "todos".to_string(),
            OwnerFilter::Unassigned => "sin_asignar".to_string(),
            OwnerFilter::Member(id) => id.to_string(),
        }
    }

    fn matches(&self, task: &Task) -> bool {
        match self {
            OwnerFilter::All => true,
            OwnerFilter::Unassigned => task.owner_id.is_none(),
            OwnerFilter::Member(id) => task.owner_id == Some(*id),
        }
    }
}

/// Raw board query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct BoardQuery {
    pub owner: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub q: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskFilter {
    pub owner: OwnerFilter,
    pub status: Option<Stage>,
    pub priority: Option<Priority>,
    pub search: Option<String>,
}

impl TaskFilter {
    pub fn from_query(query: &BoardQuery) -> Self {
        let search = query
            .q
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);
        Self {
            owner: OwnerFilter::parse(query.owner.as_deref().unwrap_or("")),
            status: query.status.as_deref().and_then(Stage::from_id),
            priority: query.priority.as_deref().and_then(Priority::from_id),
            search,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == TaskFilter::default()
    }

    pub fn matches(&self, task: &Task) -> bool {
        if !self.owner.matches(task) {
            return false;
        }
        if self.status.is_some_and(|s| s != task.status) {
            return false;
        }
        if self.priority.is_some_and(|p| p != task.priority) {
            return false;
        }
        if let Some(needle) = &self.search {
            let hit = task.op_number.to_lowercase().contains(needle)
                || task.title.to_lowercase().contains(needle)
                || task.summary.to_lowercase().contains(needle)
                || task.tags.iter().any(|t| t.to_lowercase().contains(needle));
            if !hit {
                return false;
            }
        }
        true
    }

    /// Keep the tasks that match, preserving order.
    pub fn apply(&self, tasks: Vec<Task>) -> Vec<Task> {
        tasks.into_iter().filter(|t| self.matches(t)).collect()
    }
}
