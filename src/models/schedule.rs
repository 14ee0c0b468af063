//! Computed schedule data.
//!
//! Holds the engine-owned projection of every task: CPM dates, slack,
//! criticality and diagnostic flags, plus the read models handed to
//! rendering and persistence adapters.
//!
//! # Reference
//! Kelley & Walker (1959), "Critical-Path Planning and Scheduling"

use serde::{Deserialize, Serialize};

use super::{Day, Dependency, Field, Task, TaskId};

/// Engine-derived fields of a task. Never writable by callers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputedFields {
    /// Earliest start allowed by dependencies and constraints.
    pub early_start: Day,
    /// `early_start + duration` (exclusive end).
    pub early_finish: Day,
    /// Latest start that does not delay the anchor.
    pub late_start: Day,
    /// Latest finish that does not delay the anchor.
    pub late_finish: Day,
    /// Scheduled start (differs from `early_start` for as-late-as-possible tasks).
    pub start: Day,
    /// Scheduled finish.
    pub finish: Day,
    /// `late_start - early_start`. `None` for summary tasks.
    pub total_slack_days: Option<i64>,
    /// Slip allowed before any finish-to-start successor moves. `None` for summary tasks.
    pub free_slack_days: Option<i64>,
    /// Zero total slack (leaves) or any critical child (summaries).
    pub is_critical: bool,
    /// A constraint date conflicts with the dependency chain.
    pub constraint_violated: bool,
    /// The task finishes after its deadline.
    pub deadline_missed: bool,
    /// Leaf: the reported value. Summary: duration-weighted rollup.
    pub percent_complete: u8,
}

impl ComputedFields {
    /// Scheduled length in calendar days.
    #[inline]
    pub fn span_days(&self) -> i64 {
        self.finish.saturating_sub(self.start)
    }

    /// Fields that differ between `self` and `other`.
    pub fn diff(&self, other: &Self) -> Vec<Field> {
        let mut changed = Vec::new();
        if self.early_start != other.early_start {
            changed.push(Field::EarlyStart);
        }
        if self.early_finish != other.early_finish {
            changed.push(Field::EarlyFinish);
        }
        if self.late_start != other.late_start {
            changed.push(Field::LateStart);
        }
        if self.late_finish != other.late_finish {
            changed.push(Field::LateFinish);
        }
        if self.start != other.start {
            changed.push(Field::Start);
        }
        if self.finish != other.finish {
            changed.push(Field::Finish);
        }
        if self.total_slack_days != other.total_slack_days {
            changed.push(Field::TotalSlack);
        }
        if self.free_slack_days != other.free_slack_days {
            changed.push(Field::FreeSlack);
        }
        if self.is_critical != other.is_critical {
            changed.push(Field::Critical);
        }
        if self.constraint_violated != other.constraint_violated {
            changed.push(Field::ConstraintViolated);
        }
        if self.deadline_missed != other.deadline_missed {
            changed.push(Field::DeadlineMissed);
        }
        if self.percent_complete != other.percent_complete {
            changed.push(Field::PercentComplete);
        }
        changed
    }
}

/// Read model of one task: editable record, computed projection and
/// outline position. Used for snapshots and Gantt rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskView {
    /// Editable record.
    pub task: Task,
    /// Engine-derived fields.
    pub computed: ComputedFields,
    /// Outline depth (roots = 0).
    pub level: usize,
    /// Outline number, e.g. "1.2.3".
    pub wbs_code: String,
    /// Whether the task has children.
    pub is_summary: bool,
    /// Incoming dependencies.
    pub predecessors: Vec<Dependency>,
}

impl TaskView {
    /// Task identifier.
    #[inline]
    pub fn id(&self) -> TaskId {
        self.task.id
    }
}

/// A schedule problem surfaced for display. Not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Type of violation.
    pub violation_type: ViolationType,
    /// Affected task.
    pub task_id: TaskId,
    /// Human-readable description.
    pub message: String,
    /// Severity (0-100, higher = worse).
    pub severity: i32,
}

/// Classification of schedule violations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationType {
    /// A constraint date conflicts with dependencies.
    ConstraintConflict,
    /// The task finishes after its deadline.
    DeadlineMiss,
}

impl Violation {
    /// Creates a constraint conflict violation.
    pub fn constraint_conflict(task_id: TaskId, message: impl Into<String>) -> Self {
        Self {
            violation_type: ViolationType::ConstraintConflict,
            task_id,
            message: message.into(),
            severity: 90,
        }
    }

    /// Creates a deadline miss violation.
    pub fn deadline_miss(task_id: TaskId, message: impl Into<String>) -> Self {
        Self {
            violation_type: ViolationType::DeadlineMiss,
            task_id,
            message: message.into(),
            severity: 80,
        }
    }
}
