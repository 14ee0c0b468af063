//! Precedence dependency model.
//!
//! A dependency links a predecessor to a successor with one of the four
//! classic precedence relations and a lag (negative lag = lead).
//!
//! # Reference
//! Kelley & Walker (1959), "Critical-Path Planning and Scheduling";
//! Fondahl (1961), precedence diagramming method

use serde::{Deserialize, Serialize};

use super::TaskId;

/// Precedence relation between two tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    /// Successor starts after predecessor finishes.
    #[default]
    FinishToStart,
    /// Successor starts after predecessor starts.
    StartToStart,
    /// Successor finishes after predecessor finishes.
    FinishToFinish,
    /// Successor finishes after predecessor starts.
    StartToFinish,
}

impl DependencyKind {
    /// Short display label ("FS", "SS", ...).
    pub fn label(self) -> &'static str {
        match self {
            Self::FinishToStart => "FS",
            Self::StartToStart => "SS",
            Self::FinishToFinish => "FF",
            Self::StartToFinish => "SF",
        }
    }
}

/// A directed precedence edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency {
    /// Task that constrains.
    pub predecessor_id: TaskId,
    /// Task that is constrained.
    pub successor_id: TaskId,
    /// Precedence relation.
    pub kind: DependencyKind,
    /// Working days between the two link ends; negative for a lead.
    pub lag_days: i64,
}

impl Dependency {
    /// Creates a zero-lag finish-to-start dependency.
    pub fn new(predecessor: impl Into<TaskId>, successor: impl Into<TaskId>) -> Self {
        Self {
            predecessor_id: predecessor.into(),
            successor_id: successor.into(),
            kind: DependencyKind::FinishToStart,
            lag_days: 0,
        }
    }

    /// Sets the relation kind.
    pub fn with_kind(mut self, kind: DependencyKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the lag (negative for lead).
    pub fn with_lag(mut self, lag_days: i64) -> Self {
        self.lag_days = lag_days;
        self
    }

    /// `(predecessor, successor)` key of this edge.
    #[inline]
    pub fn key(&self) -> (TaskId, TaskId) {
        (self.predecessor_id, self.successor_id)
    }

    /// Whether the edge touches the given task.
    #[inline]
    pub fn touches(&self, id: TaskId) -> bool {
        self.predecessor_id == id || self.successor_id == id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependency_builder() {
        let dep = Dependency::new(1, 2)
            .with_kind(DependencyKind::StartToStart)
            .with_lag(-2);
        assert_eq!(dep.key(), (TaskId(1), TaskId(2)));
        assert_eq!(dep.kind, DependencyKind::StartToStart);
        assert_eq!(dep.lag_days, -2);
        assert!(dep.touches(TaskId(1)));
        assert!(!dep.touches(TaskId(3)));
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(DependencyKind::FinishToStart.label(), "FS");
        assert_eq!(DependencyKind::FinishToFinish.label(), "FF");
    }
}
