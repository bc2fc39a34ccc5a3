use std::collections::HashMap;

use serde::Serialize;

use crate::models::member::TeamMember;
use crate::models::stage::{Priority, Stage};
use crate::models::task::Task;

#[derive(Debug, Clone, Serialize)]
pub struct StageCount {
    pub stage: Stage,
    pub label: &'static str,
    pub color: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PriorityCount {
    pub priority: Priority,
    pub count: usize,
}

/// Workload of one member.
#[derive(Debug, Clone, Serialize)]
pub struct MemberLoad {
    pub member_id: i64,
    pub name: String,
    pub initials: String,
    pub productivity: f64,
    pub open: usize,
    pub delivered: usize,
}

impl MemberLoad {
    pub fn total(&self) -> usize {
        self.open + self.delivered
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BoardStats {
    pub total: usize,
    pub delivered: usize,
    pub open: usize,
    pub unassigned_open: usize,
    pub per_stage: Vec<StageCount>,
    pub per_priority: Vec<PriorityCount>,
    pub per_member: Vec<MemberLoad>,
    /// Delivered / total, in percent. 0 for an empty board.
    pub completion_rate: f64,
    pub average_progress: f64,
}

impl BoardStats {
    /// Mean open tasks per member; 0 without members.
    pub fn mean_open_per_member(&self) -> f64 {
        if self.per_member.is_empty() {
            return 0.0;
        }
        let open: usize = self.per_member.iter().map(|m| m.open).sum();
        open as f64 / self.per_member.len() as f64
    }

    pub fn completion_label(&self) -> String {
        format!("{:.0}%", self.completion_rate)
    }
}

/// Aggregate the board in one pass over the tasks. Every member appears in
/// `per_member`, ordered by open load (heaviest first), then name.
/// Tasks owned by unknown member ids count toward the totals only.
pub fn compute(tasks: &[Task], members: &[TeamMember]) -> BoardStats {
    let mut per_stage = [0usize; 10];
    let mut per_priority: HashMap<Priority, usize> = HashMap::new();
    let mut loads: HashMap<i64, (usize, usize)> = HashMap::new();
    let mut delivered = 0;
    let mut unassigned_open = 0;
    let mut progress_sum: i64 = 0;

    for task in tasks {
        per_stage[task.status.position()] += 1;
        *per_priority.entry(task.priority).or_default() += 1;
        progress_sum += i64::from(task.progress);
        let done = task.status.is_terminal();
        if done {
            delivered += 1;
        }
        match task.owner_id {
            Some(owner) => {
                let entry = loads.entry(owner).or_default();
                if done { entry.1 += 1 } else { entry.0 += 1 }
            }
            None if !done => unassigned_open += 1,
            None => {}
        }
    }

    let mut per_member: Vec<MemberLoad> = members
        .iter()
        .map(|m| {
            let (open, delivered) = loads.get(&m.id).copied().unwrap_or_default();
            MemberLoad {
                member_id: m.id,
                name: m.display_name.clone(),
                initials: m.initials(),
                productivity: m.productivity,
                open,
                delivered,
            }
        })
        .collect();
    per_member.sort_by(|a, b| b.open.cmp(&a.open).then_with(|| a.name.cmp(&b.name)));

    let total = tasks.len();
    let (completion_rate, average_progress) = if total == 0 {
        (0.0, 0.0)
    } else {
        (
            delivered as f64 * 100.0 / total as f64,
            progress_sum as f64 / total as f64,
        )
    };

    BoardStats {
        total,
        delivered,
        open: total - delivered,
        unassigned_open,
        per_stage: Stage::ALL
            .into_iter()
            .map(|stage| StageCount {
                stage,
                label: stage.label(),
                color: stage.color(),
                count: per_stage[stage.position()],
            })
            .collect(),
        per_priority: Priority::ALL
            .into_iter()
            .map(|priority| PriorityCount {
                priority,
                count: per_priority.get(&priority).copied().unwrap_or(0),
            })
            .collect(),
        per_member,
        completion_rate,
        average_progress,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::testutil::{member, task};

    #[test]
    fn empty_board_has_zero_rates() {
        let stats = compute(&[], &[member(1, "Ana")]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.completion_rate, 0.0);
        assert_eq!(stats.per_stage.len(), 10);
        assert_eq!(stats.per_member[0].open, 0);
    }

    #[test]
    fn counts_per_stage_member_and_priority() {
        let mut delivered = task(3, Stage::Entrega, Some(1));
        delivered.progress = 100;
        let tasks = vec![
            task(1, Stage::Diseno, Some(1)),
            task(2, Stage::Diseno, Some(2)),
            delivered,
            task(4, Stage::Taller, None),
            task(5, Stage::Entrega, None),
        ];
        let stats = compute(&tasks, &[member(1, "Ana"), member(2, "Beto"), member(3, "Ciro")]);

        assert_eq!(stats.total, 5);
        assert_eq!(stats.delivered, 2);
        assert_eq!(stats.open, 3);
        assert_eq!(stats.unassigned_open, 1);
        assert_eq!(stats.per_stage[Stage::Diseno.position()].count, 2);
        assert_eq!(stats.per_priority[1].count, 5);
        assert_eq!(stats.completion_rate, 40.0);
        assert_eq!(stats.average_progress, 20.0);

        let ana = stats.per_member.iter().find(|m| m.member_id == 1).unwrap();
        assert_eq!((ana.open, ana.delivered, ana.total()), (1, 1, 2));
        // Ciro has nothing and sorts last.
        assert_eq!(stats.per_member.last().unwrap().member_id, 3);
        assert!((stats.mean_open_per_member() - 2.0 / 3.0).abs() < 1e-9);
    }
}
