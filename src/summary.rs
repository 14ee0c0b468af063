//! Project summary statistics.
//!
//! Computes headline indicators from a task tree and its computed fields,
//! for dashboards and status reports.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Project start / finish | min early start / max early finish over leaves |
//! | Overdue | Tasks finishing after their deadline |
//! | Critical | Leaves with zero total slack |
//! | Constraint violations | Leaves whose constraint date conflicts with dependencies |
//! | Percent complete | Duration-weighted mean over root tasks |
//!
//! # Reference
//! PMI (2021), "A Guide to the Project Management Body of Knowledge", 7th ed., §2.7: Measurement

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::models::{ComputedFields, Day, TaskId, TaskStatus};
use crate::rollup::HierarchyRollup;
use crate::store::TaskStore;

/// Project-level indicators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleSummary {
    /// Number of tasks, summaries included.
    pub total_tasks: usize,
    /// Number of summary tasks.
    pub summary_tasks: usize,
    /// Number of milestones.
    pub milestones: usize,
    /// Task count per workflow status.
    pub by_status: HashMap<TaskStatus, usize>,
    /// Leaves with zero total slack.
    pub critical_tasks: usize,
    /// Tasks (leaves and summaries) finishing after their deadline.
    pub overdue_tasks: usize,
    /// Leaves whose constraint conflicts with their dependencies.
    pub constraint_violations: usize,
    /// Earliest early start over all leaves (`None` for an empty project).
    pub project_start: Option<Day>,
    /// Latest early finish over all leaves.
    pub project_finish: Option<Day>,
    /// Duration-weighted progress of the whole project.
    pub percent_complete: u8,
}

impl ScheduleSummary {
    /// Computes the summary from the task tree and computed fields.
    pub fn calculate(store: &TaskStore, computed: &BTreeMap<TaskId, ComputedFields>) -> Self {
        let mut by_status: HashMap<TaskStatus, usize> = HashMap::new();
        let mut summary_tasks = 0;
        let mut milestones = 0;
        let mut critical_tasks = 0;
        let mut overdue_tasks = 0;
        let mut constraint_violations = 0;
        let mut project_start: Option<Day> = None;
        let mut project_finish: Option<Day> = None;

        for task in store.tasks() {
            *by_status.entry(task.status).or_insert(0) += 1;
            let is_leaf = store.is_leaf(task.id);
            if !is_leaf {
                summary_tasks += 1;
            } else if task.is_milestone {
                milestones += 1;
            }

            let Some(c) = computed.get(&task.id) else {
                continue;
            };
            if c.deadline_missed {
                overdue_tasks += 1;
            }
            if is_leaf {
                if c.is_critical {
                    critical_tasks += 1;
                }
                if c.constraint_violated {
                    constraint_violations += 1;
                }
                project_start = Some(project_start.map_or(c.early_start, |s| s.min(c.early_start)));
                project_finish = Some(project_finish.map_or(c.early_finish, |f| f.max(c.early_finish)));
            }
        }

        Self {
            total_tasks: store.len(),
            summary_tasks,
            milestones,
            by_status,
            critical_tasks,
            overdue_tasks,
            constraint_violations,
            project_start,
            project_finish,
            percent_complete: overall_percent(store, computed),
        }
    }

    /// Calendar days from project start to finish.
    pub fn span_days(&self) -> i64 {
        match (self.project_start, self.project_finish) {
            (Some(s), Some(f)) => f.saturating_sub(s),
            _ => 0,
        }
    }

    /// Whether every task is complete.
    pub fn is_complete(&self) -> bool {
        self.total_tasks > 0 && self.by_status.get(&TaskStatus::Complete) == Some(&self.total_tasks)
    }
}

/// Rolls the root tasks up the same way a summary rolls up its children.
fn overall_percent(store: &TaskStore, computed: &BTreeMap<TaskId, ComputedFields>) -> u8 {
    let rollup = HierarchyRollup::new(store);
    let mut weighted = 0u64;
    let mut total = 0u64;
    let mut plain = 0u64;
    let mut counted = 0u64;
    for &root in store.roots() {
        let Some(c) = computed.get(&root) else {
            continue;
        };
        let weight = rollup.weight(root);
        weighted += weight * u64::from(c.percent_complete);
        total += weight;
        plain += u64::from(c.percent_complete);
        counted += 1;
    }
    let (num, den) = if total > 0 { (weighted, total) } else { (plain, counted) };
    if den == 0 {
        0
    } else {
        ((num + den / 2) / den).min(100) as u8
    }
}
