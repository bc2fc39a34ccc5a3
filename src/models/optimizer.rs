//! Canned sprint-optimizer suggestions derived from board statistics.

use serde::Serialize;

use crate::models::stage::{Priority, Stage};
use crate::models::stalled::{StallSeverity, StalledTask};
use crate::models::stats::BoardStats;
use crate::models::task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    Rebalance,
    FollowUp,
    FastTrack,
    Unassigned,
}

#[derive(Debug, Clone, Serialize)]
pub struct Suggestion {
    pub kind: SuggestionKind,
    pub text: String,
    pub task_id: Option<i64>,
}

/// Members at or above this multiple of the mean open load are overloaded.
const OVERLOAD_FACTOR: f64 = 1.5;
const MAX_FOLLOW_UPS: usize = 5;

pub fn suggest(stats: &BoardStats, stalled: &[StalledTask], tasks: &[Task]) -> Vec<Suggestion> {
    let mut out = Vec::new();

    let mean = stats.mean_open_per_member();
    if mean > 0.0 && stats.per_member.len() > 1 {
        let lightest = stats
            .per_member
            .iter()
            .min_by(|a, b| a.open.cmp(&b.open).then_with(|| a.name.cmp(&b.name)));
        for load in &stats.per_member {
            if (load.open as f64) < mean * OVERLOAD_FACTOR {
                continue;
            }
            if let Some(target) = lightest.filter(|l| l.member_id != load.member_id) {
                out.push(Suggestion {
                    kind: SuggestionKind::Rebalance,
                    text: format!(
                        "{} tiene {} OPs abiertas (promedio {:.1}). Reasignar alguna a {} ({} abiertas).",
                        load.name, load.open, mean, target.name, target.open
                    ),
                    task_id: None,
                });
            }
        }
    }

    for s in stalled.iter().take(MAX_FOLLOW_UPS) {
        let urgency = match s.severity {
            StallSeverity::Critical => "Urgente: ",
            StallSeverity::Warning => "",
        };
        out.push(Suggestion {
            kind: SuggestionKind::FollowUp,
            text: format!(
                "{}OP {} ({}) lleva {} sin moverse en {}. Consultar con {}.",
                urgency,
                s.task.op_number,
                s.task.title,
                s.idle_label(),
                s.task.status.label(),
                s.task.owner_label()
            ),
            task_id: Some(s.task.id),
        });
    }

    for t in tasks.iter().filter(|t| {
        t.priority == Priority::Alta && matches!(t.status, Stage::Pendiente | Stage::Diseno)
    }) {
        out.push(Suggestion {
            kind: SuggestionKind::FastTrack,
            text: format!(
                "OP {} es prioridad alta y sigue en {}. Adelantarla en la cola.",
                t.op_number,
                t.status.label()
            ),
            task_id: Some(t.id),
        });
    }

    if stats.unassigned_open > 0 {
        out.push(Suggestion {
            kind: SuggestionKind::Unassigned,
            text: format!("Hay {} OPs abiertas sin responsable.", stats.unassigned_open),
            task_id: None,
        });
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::stalled;
    use crate::models::stats::compute;
    use crate::models::testutil::{member, task};
    use chrono::Duration;

    #[test]
    fn quiet_board_has_no_suggestions() {
        let tasks = vec![task(1, Stage::Taller, Some(1)), task(2, Stage::Taller, Some(2))];
        let stats = compute(&tasks, &[member(1, "Ana"), member(2, "Beto")]);
        assert!(suggest(&stats, &[], &tasks).is_empty());
    }

    #[test]
    fn overloaded_member_gets_rebalance() {
        let mut tasks: Vec<_> = (1..=5).map(|i| task(i, Stage::Impresion, Some(1))).collect();
        tasks.push(task(6, Stage::Impresion, Some(2)));
        let stats = compute(&tasks, &[member(1, "Ana"), member(2, "Beto"), member(3, "Ciro")]);
        let out = suggest(&stats, &[], &tasks);
        let rebalance: Vec<_> = out.iter().filter(|s| s.kind == SuggestionKind::Rebalance).collect();
        assert_eq!(rebalance.len(), 1);
        assert!(rebalance[0].text.starts_with("Ana"));
        assert!(rebalance[0].text.contains("Ciro"));
    }

    #[test]
    fn stalled_high_priority_and_unassigned_are_reported() {
        let mut urgent = task(1, Stage::Pendiente, None);
        urgent.priority = Priority::Alta;
        let tasks = vec![urgent];
        let stats = compute(&tasks, &[]);
        let now = tasks[0].updated_at + Duration::hours(100);
        let stalled = stalled::detect(&tasks, now, 48);
        let kinds: Vec<_> = suggest(&stats, &stalled, &tasks).iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![SuggestionKind::FollowUp, SuggestionKind::FastTrack, SuggestionKind::Unassigned]
        );
    }
}
