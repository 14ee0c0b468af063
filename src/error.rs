//! Error taxonomy.
//!
//! Caller mistakes are returned as values and leave the engine untouched.
//! Constraint conflicts are not errors: they are reported through
//! [`ComputedFields::constraint_violated`](crate::models::ComputedFields).
//! Broken engine invariants are bugs and trip `debug_assert!`s instead.

use thiserror::Error;

use crate::models::{Day, TaskId, TaskStatus};

/// Hierarchy (task tree) errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    #[error("task not found: {0}")]
    NotFound(TaskId),

    #[error("task already exists: {0}")]
    DuplicateId(TaskId),

    #[error("moving {id} under {parent} would create a cycle")]
    WouldCreateCycle { id: TaskId, parent: TaskId },

    #[error("task {0} has no preceding sibling to indent under")]
    NoPrecedingSibling(TaskId),

    #[error("task {0} is already at root level")]
    NoParent(TaskId),
}

/// Dependency graph errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("dependency references unknown task {0}")]
    UnknownTask(TaskId),

    #[error("task {0} cannot depend on itself")]
    SelfLoop(TaskId),

    #[error("dependency {pred} -> {succ} already exists")]
    DuplicateEdge { pred: TaskId, succ: TaskId },

    #[error("dependency {pred} -> {succ} would create a cycle")]
    Cycle { pred: TaskId, succ: TaskId },

    #[error("dependency {pred} -> {succ} links a summary task with its own subtree")]
    HierarchyConflict { pred: TaskId, succ: TaskId },

    #[error("dependency {pred} -> {succ} not found")]
    NotFound { pred: TaskId, succ: TaskId },
}

/// Errors returned by [`ScheduleEngine`](crate::engine::ScheduleEngine) mutations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error(transparent)]
    Structural(#[from] StructuralError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("percent complete must be within 0..=100, got {0}")]
    InvalidPercent(u8),

    #[error("percent complete of summary task {0} is derived from its children")]
    DerivedField(TaskId),

    #[error("status of {id} cannot change from {from:?} to {to:?}")]
    InvalidStatusTransition {
        id: TaskId,
        from: TaskStatus,
        to: TaskStatus,
    },

    #[error("day offset {0} is outside the supported range")]
    DayOutOfRange(Day),

    #[error("input records are invalid: {0} problem(s)")]
    InvalidInput(usize),
}

impl EngineError {
    /// Whether the error means a referenced task does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Structural(StructuralError::NotFound(_))
                | Self::Graph(GraphError::UnknownTask(_))
                | Self::Graph(GraphError::NotFound { .. })
        )
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            StructuralError::NoPrecedingSibling(TaskId(4)).to_string(),
            "task #4 has no preceding sibling to indent under"
        );
        assert_eq!(
            GraphError::Cycle {
                pred: TaskId(1),
                succ: TaskId(2)
            }
            .to_string(),
            "dependency #1 -> #2 would create a cycle"
        );
    }

    #[test]
    fn test_engine_error_wraps_transparently() {
        let err: EngineError = StructuralError::NotFound(TaskId(9)).into();
        assert_eq!(err.to_string(), "task not found: #9");
        assert!(err.is_not_found());

        let err: EngineError = GraphError::SelfLoop(TaskId(1)).into();
        assert!(!err.is_not_found());
    }
}
