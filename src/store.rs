//! Task hierarchy storage.
//!
//! [`TaskStore`] owns the authoritative task records and the forest formed
//! by their parent pointers. Tasks live in an arena keyed by [`TaskId`];
//! parent/child relations are id lists, never references.
//!
//! # Invariants
//! - The parent relation is a forest: no task is its own ancestor.
//! - Every sibling list is densely ranked: `order_key == index`.
//! - `task.parent_id` and the owning sibling list always agree.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::error::StructuralError;
use crate::models::{Task, TaskId};

/// What happens to the children of a deleted task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadePolicy {
    /// Children move up to the deleted task's parent, in its place.
    #[default]
    ReparentChildren,
    /// The whole subtree is deleted.
    DeleteSubtree,
}

#[derive(Debug, Clone, PartialEq)]
struct TaskNode {
    task: Task,
    children: Vec<TaskId>,
}

/// Arena of tasks with ordered parent/child structure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskStore {
    nodes: BTreeMap<TaskId, TaskNode>,
    roots: Vec<TaskId>,
    next_id: u64,
}

impl TaskStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from materialized records.
    ///
    /// Sibling order follows `order_key`, ties broken by input order. Ranks
    /// are renumbered densely afterwards.
    pub fn from_tasks(tasks: Vec<Task>) -> Result<Self, StructuralError> {
        let mut store = Self::new();
        let mut input_index: HashMap<TaskId, usize> = HashMap::new();

        for (i, task) in tasks.into_iter().enumerate() {
            if store.nodes.contains_key(&task.id) {
                return Err(StructuralError::DuplicateId(task.id));
            }
            input_index.insert(task.id, i);
            store.bump_next_id(task.id);
            store.nodes.insert(
                task.id,
                TaskNode {
                    task,
                    children: Vec::new(),
                },
            );
        }

        let ids: Vec<TaskId> = store.nodes.keys().copied().collect();
        for &id in &ids {
            match store.nodes[&id].task.parent_id {
                None => store.roots.push(id),
                Some(parent) if parent == id => {
                    return Err(StructuralError::WouldCreateCycle { id, parent });
                }
                Some(parent) => match store.nodes.get_mut(&parent) {
                    Some(p) => p.children.push(id),
                    None => return Err(StructuralError::NotFound(parent)),
                },
            }
        }

        // A parent chain that never reaches a root is a cycle.
        for &id in &ids {
            let mut cur = id;
            let mut steps = 0;
            while let Some(parent) = store.parent_of(cur) {
                steps += 1;
                if steps > ids.len() {
                    return Err(StructuralError::WouldCreateCycle { id, parent });
                }
                cur = parent;
            }
        }

        let rank = |store: &Self, id: &TaskId| (store.nodes[id].task.order_key, input_index[id]);
        let mut roots = std::mem::take(&mut store.roots);
        roots.sort_by_key(|id| rank(&store, id));
        store.roots = roots;
        for &id in &ids {
            let mut children = match store.nodes.get_mut(&id) {
                Some(node) => std::mem::take(&mut node.children),
                None => continue,
            };
            children.sort_by_key(|c| rank(&store, c));
            if let Some(node) = store.nodes.get_mut(&id) {
                node.children = children;
            }
        }

        store.renumber(None);
        for &id in &ids {
            store.renumber(Some(id));
        }
        Ok(store)
    }

    /// Allocates a fresh task id.
    pub fn allocate_id(&mut self) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Inserts a task as a child of `task.parent_id` at rank `task.order_key`
    /// (clamped to the end of the sibling list).
    pub fn insert(&mut self, mut task: Task) -> Result<TaskId, StructuralError> {
        let id = task.id;
        if self.nodes.contains_key(&id) {
            return Err(StructuralError::DuplicateId(id));
        }
        if let Some(parent) = task.parent_id {
            if parent == id {
                return Err(StructuralError::WouldCreateCycle { id, parent });
            }
            if !self.nodes.contains_key(&parent) {
                return Err(StructuralError::NotFound(parent));
            }
        }

        let parent = task.parent_id;
        let position = task.order_key as usize;
        task.order_key = 0;
        self.bump_next_id(id);
        self.nodes.insert(
            id,
            TaskNode {
                task,
                children: Vec::new(),
            },
        );
        self.attach(id, parent, Some(position));
        Ok(id)
    }

    /// Moves `id` under `new_parent` at `position` (`None` = last).
    pub fn reparent(
        &mut self,
        id: TaskId,
        new_parent: Option<TaskId>,
        position: Option<usize>,
    ) -> Result<(), StructuralError> {
        if !self.nodes.contains_key(&id) {
            return Err(StructuralError::NotFound(id));
        }
        if let Some(parent) = new_parent {
            if !self.nodes.contains_key(&parent) {
                return Err(StructuralError::NotFound(parent));
            }
            if parent == id || self.is_ancestor(id, parent) {
                return Err(StructuralError::WouldCreateCycle { id, parent });
            }
        }

        self.detach(id);
        self.attach(id, new_parent, position);
        Ok(())
    }

    /// Removes `id` and returns the removed records (pre-order).
    pub fn remove(&mut self, id: TaskId, policy: CascadePolicy) -> Result<Vec<Task>, StructuralError> {
        if !self.nodes.contains_key(&id) {
            return Err(StructuralError::NotFound(id));
        }

        let parent = self.parent_of(id);
        let position = self.detach(id);
        match policy {
            CascadePolicy::ReparentChildren => {
                let children = self.children_of(id).to_vec();
                for (offset, child) in children.into_iter().enumerate() {
                    self.attach(child, parent, Some(position + offset));
                }
                let removed = self.nodes.remove(&id).map(|n| n.task);
                Ok(removed.into_iter().collect())
            }
            CascadePolicy::DeleteSubtree => {
                let subtree = self.subtree(id);
                Ok(subtree
                    .into_iter()
                    .filter_map(|t| self.nodes.remove(&t).map(|n| n.task))
                    .collect())
            }
        }
    }

    /// Task record by id.
    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.nodes.get(&id).map(|n| &n.task)
    }

    /// Mutable access to the editable record. Hierarchy fields must not be
    /// changed through this handle.
    pub(crate) fn get_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.nodes.get_mut(&id).map(|n| &mut n.task)
    }

    /// Whether the task exists.
    pub fn contains(&self, id: TaskId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Number of tasks.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All task ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.nodes.keys().copied()
    }

    /// All task records in ascending id order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.nodes.values().map(|n| &n.task)
    }

    /// Ordered children of `id` (empty for leaves and unknown ids).
    pub fn children_of(&self, id: TaskId) -> &[TaskId] {
        self.nodes
            .get(&id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Ordered root tasks.
    pub fn roots(&self) -> &[TaskId] {
        &self.roots
    }

    /// Parent of `id`.
    pub fn parent_of(&self, id: TaskId) -> Option<TaskId> {
        self.nodes.get(&id).and_then(|n| n.task.parent_id)
    }

    /// Sibling list containing `id` (including `id`).
    pub fn siblings_of(&self, id: TaskId) -> &[TaskId] {
        match self.parent_of(id) {
            Some(parent) => self.children_of(parent),
            None => &self.roots,
        }
    }

    /// Rank of `id` among its siblings.
    pub fn position_of(&self, id: TaskId) -> Option<usize> {
        self.siblings_of(id).iter().position(|&s| s == id)
    }

    /// Whether `id` has no children.
    pub fn is_leaf(&self, id: TaskId) -> bool {
        self.children_of(id).is_empty()
    }

    /// Whether `ancestor` is a proper ancestor of `id`.
    pub fn is_ancestor(&self, ancestor: TaskId, id: TaskId) -> bool {
        let mut cur = self.parent_of(id);
        while let Some(p) = cur {
            if p == ancestor {
                return true;
            }
            cur = self.parent_of(p);
        }
        false
    }

    /// Whether the two tasks lie on one root-to-leaf line (either is an
    /// ancestor of the other, or they are the same task).
    pub fn same_lineage(&self, a: TaskId, b: TaskId) -> bool {
        a == b || self.is_ancestor(a, b) || self.is_ancestor(b, a)
    }

    /// Proper ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: TaskId) -> Vec<TaskId> {
        let mut out = Vec::new();
        let mut cur = self.parent_of(id);
        while let Some(p) = cur {
            out.push(p);
            cur = self.parent_of(p);
        }
        out
    }

    /// `id` and all of its descendants, pre-order.
    pub fn subtree(&self, id: TaskId) -> Vec<TaskId> {
        let mut out = Vec::new();
        if !self.contains(id) {
            return out;
        }
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            out.push(cur);
            stack.extend(self.children_of(cur).iter().rev().copied());
        }
        out
    }

    /// Leaf tasks in the subtree of `id` (`[id]` if it is a leaf).
    pub fn leaves_of(&self, id: TaskId) -> Vec<TaskId> {
        self.subtree(id)
            .into_iter()
            .filter(|&t| self.is_leaf(t))
            .collect()
    }

    /// Every task in outline (pre-order) order.
    pub fn preorder(&self) -> Vec<TaskId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<TaskId> = self.roots.iter().rev().copied().collect();
        while let Some(cur) = stack.pop() {
            out.push(cur);
            stack.extend(self.children_of(cur).iter().rev().copied());
        }
        out
    }

    /// Outline depth (roots = 0).
    pub fn level(&self, id: TaskId) -> usize {
        self.ancestors(id).len()
    }

    /// Outline number built from 1-based sibling ranks, e.g. "2.1.3".
    pub fn wbs_code(&self, id: TaskId) -> String {
        let mut parts = Vec::new();
        let mut cur = Some(id);
        while let Some(t) = cur {
            match self.position_of(t) {
                Some(pos) => parts.push((pos + 1).to_string()),
                None => return String::new(),
            }
            cur = self.parent_of(t);
        }
        parts.reverse();
        parts.join(".")
    }

    fn bump_next_id(&mut self, id: TaskId) {
        self.next_id = self.next_id.max(id.0 + 1);
    }

    /// Removes `id` from its sibling list; returns its former rank.
    fn detach(&mut self, id: TaskId) -> usize {
        let parent = self.parent_of(id);
        let list = match parent {
            Some(p) => match self.nodes.get_mut(&p) {
                Some(node) => &mut node.children,
                None => return 0,
            },
            None => &mut self.roots,
        };
        let position = list.iter().position(|&s| s == id).unwrap_or(list.len());
        if position < list.len() {
            list.remove(position);
        }
        self.renumber(parent);
        position
    }

    /// Inserts `id` into the sibling list of `parent` at `position`.
    fn attach(&mut self, id: TaskId, parent: Option<TaskId>, position: Option<usize>) {
        let list = match parent {
            Some(p) => match self.nodes.get_mut(&p) {
                Some(node) => &mut node.children,
                None => return,
            },
            None => &mut self.roots,
        };
        let at = position.unwrap_or(list.len()).min(list.len());
        list.insert(at, id);
        if let Some(node) = self.nodes.get_mut(&id) {
            node.task.parent_id = parent;
        }
        self.renumber(parent);
    }

    fn renumber(&mut self, parent: Option<TaskId>) {
        let list = match parent {
            Some(p) => match self.nodes.get(&p) {
                Some(node) => node.children.clone(),
                None => return,
            },
            None => self.roots.clone(),
        };
        for (rank, child) in list.into_iter().enumerate() {
            if let Some(node) = self.nodes.get_mut(&child) {
                node.task.order_key = rank as u32;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 1
    /// ├── 2
    /// │   └── 4
    /// └── 3
    /// 5
    fn sample_store() -> TaskStore {
        TaskStore::from_tasks(vec![
            Task::new(1).with_name("Site work"),
            Task::new(2).with_parent(1).with_order(0),
            Task::new(3).with_parent(1).with_order(1),
            Task::new(4).with_parent(2),
            Task::new(5).with_order(1),
        ])
        .unwrap()
    }

    #[test]
    fn test_from_tasks_builds_forest() {
        let store = sample_store();
        assert_eq!(store.len(), 5);
        assert_eq!(store.roots(), &[TaskId(1), TaskId(5)]);
        assert_eq!(store.children_of(TaskId(1)), &[TaskId(2), TaskId(3)]);
        assert_eq!(store.parent_of(TaskId(4)), Some(TaskId(2)));
        assert!(store.is_leaf(TaskId(4)));
        assert!(!store.is_leaf(TaskId(2)));
    }

    #[test]
    fn test_from_tasks_orders_by_key_then_input() {
        let store = TaskStore::from_tasks(vec![
            Task::new(1),
            Task::new(2).with_parent(1).with_order(20),
            Task::new(3).with_parent(1).with_order(10),
            Task::new(4).with_parent(1).with_order(10),
        ])
        .unwrap();
        assert_eq!(store.children_of(TaskId(1)), &[TaskId(3), TaskId(4), TaskId(2)]);
        assert_eq!(store.get(TaskId(2)).map(|t| t.order_key), Some(2));
    }

    #[test]
    fn test_from_tasks_rejects_parent_cycle() {
        let err = TaskStore::from_tasks(vec![
            Task::new(1).with_parent(2),
            Task::new(2).with_parent(1),
        ])
        .unwrap_err();
        assert!(matches!(err, StructuralError::WouldCreateCycle { .. }));
    }

    #[test]
    fn test_from_tasks_rejects_missing_parent_and_duplicates() {
        assert_eq!(
            TaskStore::from_tasks(vec![Task::new(1).with_parent(9)]).unwrap_err(),
            StructuralError::NotFound(TaskId(9))
        );
        assert_eq!(
            TaskStore::from_tasks(vec![Task::new(1), Task::new(1)]).unwrap_err(),
            StructuralError::DuplicateId(TaskId(1))
        );
    }

    #[test]
    fn test_insert_at_rank() {
        let mut store = sample_store();
        let id = store.allocate_id();
        assert_eq!(id, TaskId(6));
        store
            .insert(Task::new(id).with_parent(1).with_order(1))
            .unwrap();
        assert_eq!(store.children_of(TaskId(1)), &[TaskId(2), TaskId(6), TaskId(3)]);
        assert_eq!(store.get(TaskId(3)).map(|t| t.order_key), Some(2));

        // Ranks past the end append.
        store.insert(Task::new(7).with_order(99)).unwrap();
        assert_eq!(store.roots().last(), Some(&TaskId(7)));
    }

    #[test]
    fn test_insert_errors() {
        let mut store = sample_store();
        assert_eq!(
            store.insert(Task::new(1)).unwrap_err(),
            StructuralError::DuplicateId(TaskId(1))
        );
        assert_eq!(
            store.insert(Task::new(8).with_parent(42)).unwrap_err(),
            StructuralError::NotFound(TaskId(42))
        );
        assert!(matches!(
            store.insert(Task::new(9).with_parent(9)).unwrap_err(),
            StructuralError::WouldCreateCycle { .. }
        ));
    }

    #[test]
    fn test_reparent_rejects_descendant() {
        let mut store = sample_store();
        let before = store.clone();
        let err = store.reparent(TaskId(1), Some(TaskId(4)), None).unwrap_err();
        assert_eq!(
            err,
            StructuralError::WouldCreateCycle {
                id: TaskId(1),
                parent: TaskId(4)
            }
        );
        assert!(store.reparent(TaskId(2), Some(TaskId(2)), None).is_err());
        assert_eq!(store, before);
    }

    #[test]
    fn test_reparent_moves_and_renumbers() {
        let mut store = sample_store();
        store.reparent(TaskId(5), Some(TaskId(1)), Some(0)).unwrap();
        assert_eq!(store.roots(), &[TaskId(1)]);
        assert_eq!(store.children_of(TaskId(1)), &[TaskId(5), TaskId(2), TaskId(3)]);
        assert_eq!(store.get(TaskId(3)).map(|t| t.order_key), Some(2));
        assert_eq!(store.parent_of(TaskId(5)), Some(TaskId(1)));
    }

    #[test]
    fn test_remove_reparents_children_in_place() {
        let mut store = sample_store();
        let removed = store.remove(TaskId(1), CascadePolicy::ReparentChildren).unwrap();
        assert_eq!(removed.len(), 1);
        assert_eq!(store.roots(), &[TaskId(2), TaskId(3), TaskId(5)]);
        assert_eq!(store.parent_of(TaskId(2)), None);
        assert_eq!(store.parent_of(TaskId(4)), Some(TaskId(2)));
    }

    #[test]
    fn test_remove_subtree() {
        let mut store = sample_store();
        let removed = store.remove(TaskId(1), CascadePolicy::DeleteSubtree).unwrap();
        let ids: Vec<TaskId> = removed.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![TaskId(1), TaskId(2), TaskId(4), TaskId(3)]);
        assert_eq!(store.len(), 1);
        assert_eq!(store.roots(), &[TaskId(5)]);
        assert_eq!(store.get(TaskId(5)).map(|t| t.order_key), Some(0));
    }

    #[test]
    fn test_remove_unknown() {
        let mut store = sample_store();
        assert_eq!(
            store.remove(TaskId(77), CascadePolicy::DeleteSubtree).unwrap_err(),
            StructuralError::NotFound(TaskId(77))
        );
    }

    #[test]
    fn test_outline_queries() {
        let store = sample_store();
        assert_eq!(
            store.preorder(),
            vec![TaskId(1), TaskId(2), TaskId(4), TaskId(3), TaskId(5)]
        );
        assert_eq!(store.level(TaskId(4)), 2);
        assert_eq!(store.wbs_code(TaskId(4)), "1.1.1");
        assert_eq!(store.wbs_code(TaskId(3)), "1.2");
        assert_eq!(store.wbs_code(TaskId(5)), "2");
        assert_eq!(store.ancestors(TaskId(4)), vec![TaskId(2), TaskId(1)]);
        assert_eq!(store.leaves_of(TaskId(1)), vec![TaskId(4), TaskId(3)]);
        assert!(store.same_lineage(TaskId(1), TaskId(4)));
        assert!(!store.same_lineage(TaskId(3), TaskId(4)));
    }
}
