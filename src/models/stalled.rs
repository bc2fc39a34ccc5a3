use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::models::task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StallSeverity {
    Warning,
    Critical,
}

impl StallSeverity {
    pub fn id(self) -> &'static str {
        match self {
            StallSeverity::Warning => "warning",
            StallSeverity::Critical => "critical",
        }
    }
}

/// An open OP that has not moved for at least the threshold.
#[derive(Debug, Clone, Serialize)]
pub struct StalledTask {
    pub task: Task,
    pub hours_idle: i64,
    pub severity: StallSeverity,
}

impl StalledTask {
    pub fn idle_label(&self) -> String {
        if self.hours_idle >= 48 {
            format!("{} días", self.hours_idle / 24)
        } else {
            format!("{} h", self.hours_idle)
        }
    }
}

/// Find stalled tasks: not delivered and idle for `threshold_hours` or more.
/// Twice the threshold is critical. Longest idle first.
/// A threshold too large for a `Duration` never fires.
pub fn detect(tasks: &[Task], now: DateTime<Utc>, threshold_hours: i64) -> Vec<StalledTask> {
    let Some(threshold) = Duration::try_hours(threshold_hours.max(1)) else {
        return Vec::new();
    };
    let critical = threshold.checked_mul(2);
    let mut stalled: Vec<StalledTask> = tasks
        .iter()
        .filter(|t| !t.status.is_terminal())
        .filter_map(|t| {
            let idle = now.signed_duration_since(t.updated_at);
            if idle < threshold {
                return None;
            }
            let severity = if critical.is_some_and(|c| idle >= c) {
                StallSeverity::Critical
            } else {
                StallSeverity::Warning
            };
            Some(StalledTask {
                task: t.clone(),
                hours_idle: idle.num_hours(),
                severity,
            })
        })
        .collect();
    stalled.sort_by(|a, b| b.hours_idle.cmp(&a.hours_idle).then_with(|| a.task.id.cmp(&b.task.id)));
    stalled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::stage::Stage;
    use crate::models::testutil::task;

    #[test]
    fn threshold_is_inclusive() {
        let t = task(1, Stage::Diseno, None);
        let at_threshold = t.updated_at + Duration::hours(48);
        let just_before = at_threshold - Duration::minutes(1);
        assert_eq!(detect(&[t.clone()], just_before, 48).len(), 0);
        let found = detect(&[t], at_threshold, 48);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].severity, StallSeverity::Warning);
        assert_eq!(found[0].hours_idle, 48);
    }

    #[test]
    fn double_threshold_is_critical_and_sorted_first() {
        let old = task(1, Stage::Taller, None);
        let mut recent = task(2, Stage::Taller, None);
        recent.updated_at = old.updated_at + Duration::hours(60);
        let now = old.updated_at + Duration::hours(100);
        let found = detect(&[recent, old], now, 48);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].task.id, 1);
        assert_eq!(found[0].severity, StallSeverity::Critical);
        assert_eq!(found[0].idle_label(), "4 días");
    }

    #[test]
    fn delivered_tasks_never_stall() {
        let t = task(1, Stage::Entrega, None);
        let now = t.updated_at + Duration::days(30);
        assert!(detect(&[t], now, 48).is_empty());
    }

    #[test]
    fn out_of_range_threshold_never_fires() {
        let t = task(1, Stage::Diseno, None);
        let now = t.updated_at + Duration::days(365);
        assert!(detect(&[t.clone()], now, 3_000_000_000_000).is_empty());
        assert!(detect(&[t], now, i64::MAX).is_empty());
    }
}
