//! Task model.
//!
//! A task is the schedulable unit of a project plan. Leaf tasks carry
//! durations and progress; tasks with children are summary tasks whose
//! dates and progress are derived from their subtree.
//!
//! Only caller-editable fields live here. Everything the engine derives
//! (early/late dates, slack, criticality) lives in
//! [`ComputedFields`](super::ComputedFields) so that no API can write a
//! derived value by accident.
//!
//! # Reference
//! PMI (2017), "PMBOK Guide", 6th ed., §6.2 (Define Activities)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::{Day, TaskConstraint};

/// Opaque task identifier.
///
/// Identifiers are arena keys: the engine never hands out references into
/// its storage, only ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for TaskId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// Workflow status of a task.
///
/// A display attribute owned by the caller. The engine never recomputes it;
/// it only rejects the `Complete → AtRisk` transition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Work has not begun.
    #[default]
    NotStarted,
    /// Work is underway.
    InProgress,
    /// Work is finished.
    Complete,
    /// Work is paused.
    OnHold,
    /// Work is expected to slip.
    AtRisk,
}

impl TaskStatus {
    /// Whether a caller may move a task from `self` to `next`.
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        !(self == TaskStatus::Complete && next == TaskStatus::AtRisk)
    }
}

/// A project task record (editable fields only).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique task identifier.
    pub id: TaskId,
    /// Parent task. `None` for roots.
    pub parent_id: Option<TaskId>,
    /// Rank among siblings (dense, 0-based once loaded).
    pub order_key: u32,
    /// Human-readable name.
    pub name: String,
    /// Milestones always have zero duration.
    pub is_milestone: bool,
    /// Working days of effort. Ignored for milestones and summary tasks.
    pub duration_days: u32,
    /// Manually reported progress (0..=100). Only meaningful on leaves.
    pub percent_complete: u8,
    /// Workflow status.
    pub status: TaskStatus,
    /// Scheduling constraint.
    pub constraint: TaskConstraint,
    /// Soft deadline; missing it is reported, never enforced.
    pub deadline: Option<Day>,
    /// Caller-owned attributes (assignee, color, ...), passed through untouched.
    pub metadata: BTreeMap<String, String>,
}

impl Task {
    /// Creates a root task with the given ID.
    pub fn new(id: impl Into<TaskId>) -> Self {
        Self {
            id: id.into(),
            parent_id: None,
            order_key: 0,
            name: String::new(),
            is_milestone: false,
            duration_days: 0,
            percent_complete: 0,
            status: TaskStatus::NotStarted,
            constraint: TaskConstraint::AsSoonAsPossible,
            deadline: None,
            metadata: BTreeMap::new(),
        }
    }

    /// Sets the task name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the parent task.
    pub fn with_parent(mut self, parent: impl Into<TaskId>) -> Self {
        self.parent_id = Some(parent.into());
        self
    }

    /// Sets the sibling rank.
    pub fn with_order(mut self, order_key: u32) -> Self {
        self.order_key = order_key;
        self
    }

    /// Sets the duration in working days.
    pub fn with_duration(mut self, days: u32) -> Self {
        self.duration_days = days;
        self
    }

    /// Marks the task as a milestone (zero duration).
    pub fn milestone(mut self) -> Self {
        self.is_milestone = true;
        self.duration_days = 0;
        self
    }

    /// Sets progress.
    pub fn with_percent(mut self, percent: u8) -> Self {
        self.percent_complete = percent;
        self
    }

    /// Sets the workflow status.
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// Sets the scheduling constraint.
    pub fn with_constraint(mut self, constraint: TaskConstraint) -> Self {
        self.constraint = constraint;
        self
    }

    /// Sets a soft deadline.
    pub fn with_deadline(mut self, deadline: Day) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Adds a caller-owned attribute.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Duration used for scheduling (0 for milestones).
    #[inline]
    pub fn effective_duration(&self) -> u32 {
        if self.is_milestone {
            0
        } else {
            self.duration_days
        }
    }
}

/// A partial update of a task's editable fields.
///
/// `None` leaves the field untouched. Hierarchy and computed fields are not
/// part of a patch: the former change through indent/outdent, the latter
/// are owned by the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskPatch {
    pub name: Option<String>,
    pub is_milestone: Option<bool>,
    pub duration_days: Option<u32>,
    pub percent_complete: Option<u8>,
    pub status: Option<TaskStatus>,
    pub constraint: Option<TaskConstraint>,
    /// `Some(None)` clears the deadline.
    pub deadline: Option<Option<Day>>,
    /// Replaces the whole metadata map.
    pub metadata: Option<BTreeMap<String, String>>,
}

impl TaskPatch {
    /// Creates an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn milestone(mut self, is_milestone: bool) -> Self {
        self.is_milestone = Some(is_milestone);
        self
    }

    pub fn duration(mut self, days: u32) -> Self {
        self.duration_days = Some(days);
        self
    }

    pub fn percent(mut self, percent: u8) -> Self {
        self.percent_complete = Some(percent);
        self
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn constraint(mut self, constraint: TaskConstraint) -> Self {
        self.constraint = Some(constraint);
        self
    }

    pub fn deadline(mut self, deadline: Option<Day>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn metadata(mut self, metadata: BTreeMap<String, String>) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_builder() {
        let task = Task::new(7)
            .with_name("Pour foundation")
            .with_parent(1)
            .with_order(2)
            .with_duration(5)
            .with_percent(40)
            .with_status(TaskStatus::InProgress)
            .with_deadline(30)
            .with_metadata("assignee", "crew-a");

        assert_eq!(task.id, TaskId(7));
        assert_eq!(task.parent_id, Some(TaskId(1)));
        assert_eq!(task.order_key, 2);
        assert_eq!(task.effective_duration(), 5);
        assert_eq!(task.deadline, Some(30));
        assert_eq!(task.metadata.get("assignee"), Some(&"crew-a".to_string()));
    }

    #[test]
    fn test_milestone_has_zero_duration() {
        let task = Task::new(1).with_duration(4).milestone();
        assert_eq!(task.effective_duration(), 0);

        let mut flagged = Task::new(2).with_duration(4);
        flagged.is_milestone = true;
        assert_eq!(flagged.effective_duration(), 0);
    }

    #[test]
    fn test_status_transitions() {
        assert!(!TaskStatus::Complete.can_transition_to(TaskStatus::AtRisk));
        assert!(TaskStatus::Complete.can_transition_to(TaskStatus::InProgress));
        assert!(TaskStatus::AtRisk.can_transition_to(TaskStatus::Complete));
        assert!(TaskStatus::NotStarted.can_transition_to(TaskStatus::AtRisk));
    }

    #[test]
    fn test_task_record_serde() {
        let task = Task::new(3).with_name("Frame").with_duration(2);
        let json = serde_json::to_string(&task).unwrap();
        let back: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(back, task);
        assert!(json.contains("\"id\":3"));
    }
}
