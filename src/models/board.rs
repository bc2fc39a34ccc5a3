//! Board-level operations that do not touch the store: status transitions,
//! edits and column grouping. The query layer calls these and persists the
//! result, so both backends share the exact same semantics.

use chrono::{DateTime, Utc};

use crate::models::activity::NewActivity;
use crate::models::stage::{ColumnConfig, Stage, COLUMNS};
use crate::models::task::{Task, TaskUpdate};

/// Move `task` to `to`. Returns the activity entry to append, or `None` when
/// the task already sits in `to` (nothing changes in that case).
///
/// Any stage may move to any other; there is no ordering enforcement.
pub fn apply_move(task: &mut Task, to: Stage, now: DateTime<Utc>) -> Option<NewActivity> {
    if task.status == to {
        return None;
    }
    let from = task.status;
    set_stage(task, to, now);
    Some(NewActivity {
        task_id: task.id,
        from_status: Some(from),
        to_status: to,
        // The owner is recorded, not whoever dragged the card.
        actor_id: task.owner_id,
        note: move_note(task, from, to),
        created_at: now,
    })
}

/// Overwrite the editable fields of `task`. When the edit changes the status
/// it is logged exactly like a move; otherwise no activity is produced.
pub fn apply_edit(task: &mut Task, update: TaskUpdate, now: DateTime<Utc>) -> Option<NewActivity> {
    let from = task.status;
    task.op_number = update.op_number;
    task.title = update.title;
    task.summary = update.summary;
    task.priority = update.priority;
    task.owner_id = update.owner_id;
    task.tags = update.tags;
    task.materials = update.materials;
    task.impact = update.impact;
    task.due_date = update.due_date;
    task.progress = update.progress.clamp(0, 100);
    task.updated_at = now;

    if from == update.status {
        return None;
    }
    set_stage(task, update.status, now);
    Some(NewActivity {
        task_id: task.id,
        from_status: Some(from),
        to_status: update.status,
        actor_id: task.owner_id,
        note: format!("{} (editada)", move_note(task, from, update.status)),
        created_at: now,
    })
}

/// Activity entry recorded when an OP enters the board.
pub fn creation_activity(task: &Task) -> NewActivity {
    NewActivity {
        task_id: task.id,
        from_status: None,
        to_status: task.status,
        actor_id: task.owner_id,
        note: format!("OP {} creada en {}", task.op_number, task.status.label()),
        created_at: task.created_at,
    }
}

fn set_stage(task: &mut Task, to: Stage, now: DateTime<Utc>) {
    task.status = to;
    task.sector = to.sector().to_string();
    task.updated_at = now;
    if to.is_terminal() {
        task.progress = 100;
    }
}

fn move_note(task: &Task, from: Stage, to: Stage) -> String {
    format!("OP {}: {} → {}", task.op_number, from.label(), to.label())
}

/// A board column with its cards.
#[derive(Debug, Clone)]
pub struct Column {
    pub config: &'static ColumnConfig,
    pub tasks: Vec<Task>,
}

impl Column {
    pub fn stage_id(&self) -> &'static str {
        self.config.stage.id()
    }
}

/// Split tasks into the ten fixed columns. Within a column cards are ordered
/// by priority, then due date (undated last), then op number.
pub fn group_by_stage(tasks: Vec<Task>) -> Vec<Column> {
    let mut columns: Vec<Column> = COLUMNS
        .iter()
        .map(|config| Column { config, tasks: Vec::new() })
        .collect();
    for task in tasks {
        columns[task.status.position()].tasks.push(task);
    }
    for column in &mut columns {
        column.tasks.sort_by(|a, b| {
            a.priority
                .to_level()
                .cmp(&b.priority.to_level())
                .then_with(|| match (a.due_date, b.due_date) {
                    (Some(x), Some(y)) => x.cmp(&y),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => std::cmp::Ordering::Equal,
                })
                .then_with(|| a.op_number.cmp(&b.op_number))
        });
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::stage::Priority;
    use crate::models::task::filter::{BoardQuery, OwnerFilter, TaskFilter};
    use crate::models::testutil::task;
    use chrono::{Duration, NaiveDate};

    #[test]
    fn delivery_forces_full_progress() {
        for progress in [0, 35, 99, 100] {
            let mut t = task(1, Stage::Instalacion, Some(2));
            t.progress = progress;
            apply_move(&mut t, Stage::Entrega, Utc::now());
            assert_eq!(t.progress, 100);
        }
    }

    #[test]
    fn move_logs_owner_and_sector() {
        let mut t = task(7, Stage::Diseno, Some(3));
        let now = t.updated_at + Duration::hours(5);
        let activity = apply_move(&mut t, Stage::Herreria, now).expect("status changed");
        assert_eq!(activity.from_status, Some(Stage::Diseno));
        assert_eq!(activity.to_status, Stage::Herreria);
        assert_eq!(activity.actor_id, Some(3));
        assert_eq!(activity.task_id, 7);
        assert!(activity.note.contains("Diseño"));
        assert!(activity.note.contains("Herrería"));
        assert_eq!(t.sector, "Herrería");
        assert_eq!(t.updated_at, now);
    }

    #[test]
    fn backwards_moves_are_allowed() {
        let mut t = task(1, Stage::Entrega, None);
        assert!(apply_move(&mut t, Stage::Pendiente, Utc::now()).is_some());
        assert_eq!(t.status, Stage::Pendiente);
        // Progress is only forced on entering delivery, never reset.
        assert_eq!(t.progress, 100);
    }

    #[test]
    fn same_stage_move_is_a_no_op() {
        let mut t = task(1, Stage::Taller, Some(1));
        let before = t.clone();
        assert!(apply_move(&mut t, Stage::Taller, Utc::now()).is_none());
        assert_eq!(t, before);
    }

    #[test]
    fn edit_without_status_change_logs_nothing() {
        let mut t = task(1, Stage::Corte, Some(1));
        let mut update = TaskUpdate::from_task(&t);
        update.title = "Cliente nuevo".into();
        update.progress = 140;
        assert!(apply_edit(&mut t, update, Utc::now()).is_none());
        assert_eq!(t.title, "Cliente nuevo");
        assert_eq!(t.progress, 100);
    }

    #[test]
    fn edit_with_status_change_logs_once() {
        let mut t = task(1, Stage::Corte, Some(1));
        let mut update = TaskUpdate::from_task(&t);
        update.status = Stage::Entrega;
        update.owner_id = Some(9);
        let activity = apply_edit(&mut t, update, Utc::now()).expect("logged");
        assert_eq!(activity.actor_id, Some(9));
        assert_eq!(t.progress, 100);
        assert_eq!(t.sector, Stage::Entrega.sector());
    }

    #[test]
    fn owner_filter_todos_returns_everything() {
        let tasks = vec![task(1, Stage::Diseno, Some(1)), task(2, Stage::Taller, Some(2)), task(3, Stage::Taller, None)];
        let filter = TaskFilter::from_query(&BoardQuery { owner: Some("todos".into()), ..Default::default() });
        assert_eq!(filter.apply(tasks.clone()), tasks);
    }

    #[test]
    fn owner_filter_selects_exact_subset() {
        let tasks = vec![task(1, Stage::Diseno, Some(1)), task(2, Stage::Taller, Some(2)), task(3, Stage::Taller, Some(1)), task(4, Stage::Pintura, None)];
        let filter = TaskFilter { owner: OwnerFilter::Member(1), ..Default::default() };
        let ids: Vec<i64> = filter.apply(tasks.clone()).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 3]);

        let filter = TaskFilter { owner: OwnerFilter::Unassigned, ..Default::default() };
        let ids: Vec<i64> = filter.apply(tasks).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![4]);
    }

    #[test]
    fn combined_filters_and_search() {
        let mut a = task(1, Stage::Impresion, Some(1));
        a.priority = Priority::Alta;
        a.tags = vec!["Vinilo".into()];
        let mut b = task(2, Stage::Impresion, Some(1));
        b.priority = Priority::Baja;
        let query = BoardQuery {
            owner: Some("1".into()),
            status: Some("impresion".into()),
            priority: Some("alta".into()),
            q: Some("  VINILO ".into()),
        };
        let filter = TaskFilter::from_query(&query);
        let ids: Vec<i64> = filter.apply(vec![a, b]).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn unparsable_query_values_are_ignored() {
        let filter = TaskFilter::from_query(&BoardQuery {
            owner: Some("alguien".into()),
            status: Some("fabricacion".into()),
            priority: Some("urgente".into()),
            q: Some("   ".into()),
        });
        assert!(filter.is_empty());
    }

    #[test]
    fn grouping_keeps_ten_columns_in_order() {
        let mut urgent = task(1, Stage::Taller, None);
        urgent.priority = Priority::Alta;
        let mut dated = task(2, Stage::Taller, None);
        dated.due_date = NaiveDate::from_ymd_opt(2024, 3, 1);
        let undated = task(3, Stage::Taller, None);
        let columns = group_by_stage(vec![undated, dated, urgent, task(4, Stage::Entrega, None)]);
        assert_eq!(columns.len(), 10);
        assert_eq!(columns[0].stage_id(), "pendiente");
        let taller: Vec<i64> = columns[Stage::Taller.position()].tasks.iter().map(|t| t.id).collect();
        assert_eq!(taller, vec![1, 2, 3]);
        assert_eq!(columns[9].tasks.len(), 1);
    }
}
