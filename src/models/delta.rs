//! Mutation deltas.
//!
//! Every successful engine mutation reports which tasks changed and which
//! of their fields changed, so the caller can re-render or persist only
//! those rows.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::TaskId;

/// A task field named in a delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Created,
    Removed,
    Parent,
    Order,
    Name,
    Milestone,
    Duration,
    PercentComplete,
    Status,
    Constraint,
    Deadline,
    Metadata,
    EarlyStart,
    EarlyFinish,
    LateStart,
    LateFinish,
    Start,
    Finish,
    TotalSlack,
    FreeSlack,
    Critical,
    ConstraintViolated,
    DeadlineMissed,
}

/// Set of `(task, changed fields)` produced by one mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Delta {
    changes: BTreeMap<TaskId, BTreeSet<Field>>,
}

impl Delta {
    /// Creates an empty delta.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a single changed field.
    pub fn record(&mut self, id: TaskId, field: Field) {
        self.changes.entry(id).or_default().insert(field);
    }

    /// Records several changed fields. No-op for an empty iterator.
    pub fn record_all(&mut self, id: TaskId, fields: impl IntoIterator<Item = Field>) {
        let mut fields = fields.into_iter().peekable();
        if fields.peek().is_none() {
            return;
        }
        self.changes.entry(id).or_default().extend(fields);
    }

    /// Changed fields of a task.
    pub fn fields(&self, id: TaskId) -> Option<&BTreeSet<Field>> {
        self.changes.get(&id)
    }

    /// Whether `field` of `id` changed.
    pub fn contains(&self, id: TaskId, field: Field) -> bool {
        self.changes.get(&id).is_some_and(|f| f.contains(&field))
    }

    /// Whether the task appears in the delta at all.
    pub fn touches(&self, id: TaskId) -> bool {
        self.changes.contains_key(&id)
    }

    /// Changed task ids in ascending order.
    pub fn task_ids(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.changes.keys().copied()
    }

    /// Iterates `(task, fields)` in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (TaskId, &BTreeSet<Field>)> {
        self.changes.iter().map(|(id, f)| (*id, f))
    }

    /// Number of changed tasks.
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Whether nothing changed.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_query() {
        let mut delta = Delta::new();
        delta.record(TaskId(2), Field::EarlyStart);
        delta.record_all(TaskId(2), [Field::EarlyFinish, Field::EarlyStart]);
        delta.record_all(TaskId(9), []);

        assert_eq!(delta.len(), 1);
        assert!(delta.contains(TaskId(2), Field::EarlyFinish));
        assert!(!delta.contains(TaskId(2), Field::LateStart));
        assert!(!delta.touches(TaskId(9)));
        assert_eq!(delta.fields(TaskId(2)).map(|f| f.len()), Some(2));
    }

    #[test]
    fn test_delta_serializes_as_map() {
        let mut delta = Delta::new();
        delta.record(TaskId(4), Field::Critical);
        let json = serde_json::to_string(&delta).unwrap();
        assert_eq!(json, r#"{"4":["critical"]}"#);
    }
}
