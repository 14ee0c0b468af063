//! Precedence dependency graph.
//!
//! [`DependencyGraph`] owns the dependency edges. Edges may touch summary
//! tasks, but only leaf tasks are scheduled, so every query that drives
//! propagation works on the *leaf-expanded* view:
//!
//! - a link into a summary task constrains every leaf beneath it;
//! - a link out of a summary task is driven by every leaf beneath it.
//!
//! A leaf therefore inherits the links of all its ancestors. Acyclicity is
//! checked on this expanded view, which also covers the plain
//! dependency + containment DAG requirement.
//!
//! # Algorithm
//! - Cycle check on insert: DFS reachability from the successor's leaves
//!   to the predecessor's leaves, O(V + E) per edit.
//! - Ordering: Kahn's algorithm with ties broken by outline position.
//!
//! # Reference
//! Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4 (Topological Sort)

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap, HashMap, HashSet};

use crate::error::GraphError;
use crate::models::{Dependency, TaskId};
use crate::store::TaskStore;

/// Set of dependency edges, at most one per `(predecessor, successor)` pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DependencyGraph {
    edges: BTreeMap<(TaskId, TaskId), Dependency>,
    outgoing: BTreeMap<TaskId, BTreeSet<TaskId>>,
    incoming: BTreeMap<TaskId, BTreeSet<TaskId>>,
}

impl DependencyGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from materialized records, validating the whole set.
    pub fn from_edges(store: &TaskStore, deps: Vec<Dependency>) -> Result<Self, GraphError> {
        let mut graph = Self::new();
        for dep in deps {
            graph.check_endpoints(store, &dep)?;
            graph.insert_unchecked(dep);
        }
        graph.check_structure(store)?;
        Ok(graph)
    }

    /// Adds a dependency after checking that the graph stays acyclic and
    /// that the link does not join a summary task to its own subtree.
    pub fn add_edge(&mut self, store: &TaskStore, dep: Dependency) -> Result<(), GraphError> {
        self.check_endpoints(store, &dep)?;
        if self.would_create_cycle(store, dep.predecessor_id, dep.successor_id) {
            return Err(GraphError::Cycle {
                pred: dep.predecessor_id,
                succ: dep.successor_id,
            });
        }
        self.insert_unchecked(dep);
        Ok(())
    }

    /// Removes the `pred → succ` edge.
    pub fn remove_edge(&mut self, pred: TaskId, succ: TaskId) -> Result<Dependency, GraphError> {
        let dep = self
            .edges
            .remove(&(pred, succ))
            .ok_or(GraphError::NotFound { pred, succ })?;
        remove_link(&mut self.outgoing, pred, succ);
        remove_link(&mut self.incoming, succ, pred);
        Ok(dep)
    }

    /// Removes every edge touching `id` and returns them.
    pub fn remove_task_edges(&mut self, id: TaskId) -> Vec<Dependency> {
        let keys: Vec<(TaskId, TaskId)> = self
            .predecessors_of(id)
            .chain(self.successors_of(id))
            .map(|d| d.key())
            .collect();
        keys.into_iter()
            .filter_map(|(p, s)| self.remove_edge(p, s).ok())
            .collect()
    }

    /// The `pred → succ` edge, if present.
    pub fn get(&self, pred: TaskId, succ: TaskId) -> Option<&Dependency> {
        self.edges.get(&(pred, succ))
    }

    /// Whether the `pred → succ` edge exists.
    pub fn contains(&self, pred: TaskId, succ: TaskId) -> bool {
        self.edges.contains_key(&(pred, succ))
    }

    /// Number of edges.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Whether there are no edges.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// All edges in `(pred, succ)` order.
    pub fn edges(&self) -> impl Iterator<Item = &Dependency> {
        self.edges.values()
    }

    /// Direct incoming edges of `id`.
    pub fn predecessors_of(&self, id: TaskId) -> impl Iterator<Item = &Dependency> + '_ {
        self.incoming
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(move |&p| self.edges.get(&(p, id)))
    }

    /// Direct outgoing edges of `id`.
    pub fn successors_of(&self, id: TaskId) -> impl Iterator<Item = &Dependency> + '_ {
        self.outgoing
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(move |&s| self.edges.get(&(id, s)))
    }

    /// Edges that constrain `leaf`: its own incoming edges and those of
    /// every ancestor.
    pub fn leaf_predecessors(&self, store: &TaskStore, leaf: TaskId) -> Vec<Dependency> {
        std::iter::once(leaf)
            .chain(store.ancestors(leaf))
            .flat_map(|t| self.predecessors_of(t).copied().collect::<Vec<_>>())
            .collect()
    }

    /// Edges driven by `leaf`, each paired with one constrained leaf.
    pub fn leaf_successors(&self, store: &TaskStore, leaf: TaskId) -> Vec<(Dependency, TaskId)> {
        let mut out = Vec::new();
        for t in std::iter::once(leaf).chain(store.ancestors(leaf)) {
            for dep in self.successors_of(t) {
                for target in store.leaves_of(dep.successor_id) {
                    out.push((*dep, target));
                }
            }
        }
        out
    }

    /// Leaves that constrain `leaf` through some link.
    pub fn leaf_predecessor_leaves(&self, store: &TaskStore, leaf: TaskId) -> Vec<TaskId> {
        self.leaf_predecessors(store, leaf)
            .iter()
            .flat_map(|dep| store.leaves_of(dep.predecessor_id))
            .collect()
    }

    /// Whether adding `pred → succ` would close a cycle in the leaf view.
    pub fn would_create_cycle(&self, store: &TaskStore, pred: TaskId, succ: TaskId) -> bool {
        let targets: HashSet<TaskId> = store.leaves_of(pred).into_iter().collect();
        let mut stack = store.leaves_of(succ);
        let mut visited: HashSet<TaskId> = HashSet::new();
        while let Some(cur) = stack.pop() {
            if targets.contains(&cur) {
                return true;
            }
            if !visited.insert(cur) {
                continue;
            }
            for (_, next) in self.leaf_successors(store, cur) {
                if !visited.contains(&next) {
                    stack.push(next);
                }
            }
        }
        false
    }

    /// All leaf tasks in a deterministic topological order.
    ///
    /// Ties are broken by outline position (sibling `order_key`, depth
    /// first). Leaves caught in a cycle are omitted; the graph invariants
    /// make that unreachable for a graph built through [`add_edge`](Self::add_edge).
    pub fn topological_order(&self, store: &TaskStore) -> Vec<TaskId> {
        let leaves: BTreeSet<TaskId> = store.ids().filter(|&t| store.is_leaf(t)).collect();
        self.kahn(store, &leaves)
    }

    /// Topological order of `subset` (leaf ids) using only links inside it.
    pub fn topological_order_of(&self, store: &TaskStore, subset: &BTreeSet<TaskId>) -> Vec<TaskId> {
        self.kahn(store, subset)
    }

    /// Checks the whole graph against the current hierarchy: no link may
    /// join a task to its own ancestor or descendant, and the leaf view
    /// must be acyclic.
    pub fn check_structure(&self, store: &TaskStore) -> Result<(), GraphError> {
        for dep in self.edges.values() {
            self.check_endpoints_lineage(store, dep)?;
        }

        let leaves: BTreeSet<TaskId> = store.ids().filter(|&t| store.is_leaf(t)).collect();
        let order = self.kahn(store, &leaves);
        if order.len() == leaves.len() {
            return Ok(());
        }

        let ordered: HashSet<TaskId> = order.into_iter().collect();
        let stuck = |t: TaskId| store.leaves_of(t).iter().any(|l| !ordered.contains(l));
        let culprit = self
            .edges
            .values()
            .find(|d| stuck(d.predecessor_id) && stuck(d.successor_id))
            .or_else(|| self.edges.values().next());
        match culprit {
            Some(dep) => Err(GraphError::Cycle {
                pred: dep.predecessor_id,
                succ: dep.successor_id,
            }),
            None => Ok(()),
        }
    }

    fn check_endpoints(&self, store: &TaskStore, dep: &Dependency) -> Result<(), GraphError> {
        let (pred, succ) = dep.key();
        for id in [pred, succ] {
            if !store.contains(id) {
                return Err(GraphError::UnknownTask(id));
            }
        }
        if pred == succ {
            return Err(GraphError::SelfLoop(pred));
        }
        if self.contains(pred, succ) {
            return Err(GraphError::DuplicateEdge { pred, succ });
        }
        self.check_endpoints_lineage(store, dep)
    }

    fn check_endpoints_lineage(&self, store: &TaskStore, dep: &Dependency) -> Result<(), GraphError> {
        let (pred, succ) = dep.key();
        if store.same_lineage(pred, succ) {
            return Err(GraphError::HierarchyConflict { pred, succ });
        }
        Ok(())
    }

    fn insert_unchecked(&mut self, dep: Dependency) {
        let (pred, succ) = dep.key();
        self.edges.insert((pred, succ), dep);
        self.outgoing.entry(pred).or_default().insert(succ);
        self.incoming.entry(succ).or_default().insert(pred);
    }

    fn kahn(&self, store: &TaskStore, nodes: &BTreeSet<TaskId>) -> Vec<TaskId> {
        let position: HashMap<TaskId, usize> = store
            .preorder()
            .into_iter()
            .enumerate()
            .map(|(i, t)| (t, i))
            .collect();
        let rank = |t: TaskId| position.get(&t).copied().unwrap_or(usize::MAX);

        let mut successors: HashMap<TaskId, Vec<TaskId>> = HashMap::new();
        let mut in_degree: HashMap<TaskId, usize> = nodes.iter().map(|&t| (t, 0)).collect();
        for &node in nodes {
            let targets: Vec<TaskId> = self
                .leaf_successors(store, node)
                .into_iter()
                .map(|(_, t)| t)
                .filter(|t| nodes.contains(t))
                .collect();
            for &t in &targets {
                if let Some(d) = in_degree.get_mut(&t) {
                    *d += 1;
                }
            }
            successors.insert(node, targets);
        }

        let mut ready: BinaryHeap<Reverse<(usize, TaskId)>> = in_degree
            .iter()
            .filter(|&(_, &d)| d == 0)
            .map(|(&t, _)| Reverse((rank(t), t)))
            .collect();

        let mut order = Vec::with_capacity(nodes.len());
        while let Some(Reverse((_, node))) = ready.pop() {
            order.push(node);
            for &next in successors.get(&node).map(|v| v.as_slice()).unwrap_or(&[]) {
                if let Some(d) = in_degree.get_mut(&next) {
                    *d -= 1;
                    if *d == 0 {
                        ready.push(Reverse((rank(next), next)));
                    }
                }
            }
        }
        order
    }
}

fn remove_link(map: &mut BTreeMap<TaskId, BTreeSet<TaskId>>, from: TaskId, to: TaskId) {
    if let Some(set) = map.get_mut(&from) {
        set.remove(&to);
        if set.is_empty() {
            map.remove(&from);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DependencyKind, Task};

    /// 1 (summary)
    /// ├── 2
    /// └── 3
    /// 4
    /// 5
    fn sample_store() -> TaskStore {
        TaskStore::from_tasks(vec![
            Task::new(1),
            Task::new(2).with_parent(1).with_order(0),
            Task::new(3).with_parent(1).with_order(1),
            Task::new(4).with_order(1),
            Task::new(5).with_order(2),
        ])
        .unwrap()
    }

    #[test]
    fn test_add_and_query_edges() {
        let store = sample_store();
        let mut graph = DependencyGraph::new();
        graph.add_edge(&store, Dependency::new(2, 3)).unwrap();
        graph
            .add_edge(&store, Dependency::new(3, 4).with_kind(DependencyKind::StartToStart))
            .unwrap();

        assert_eq!(graph.len(), 2);
        assert!(graph.contains(TaskId(2), TaskId(3)));
        assert_eq!(graph.successors_of(TaskId(3)).count(), 1);
        assert_eq!(graph.predecessors_of(TaskId(3)).next().map(|d| d.predecessor_id), Some(TaskId(2)));
    }

    #[test]
    fn test_add_edge_errors_leave_graph_unchanged() {
        let store = sample_store();
        let mut graph = DependencyGraph::new();
        graph.add_edge(&store, Dependency::new(2, 4)).unwrap();
        let before = graph.clone();

        assert_eq!(
            graph.add_edge(&store, Dependency::new(9, 4)).unwrap_err(),
            GraphError::UnknownTask(TaskId(9))
        );
        assert_eq!(
            graph.add_edge(&store, Dependency::new(4, 4)).unwrap_err(),
            GraphError::SelfLoop(TaskId(4))
        );
        assert!(matches!(
            graph.add_edge(&store, Dependency::new(2, 4)).unwrap_err(),
            GraphError::DuplicateEdge { .. }
        ));
        assert!(matches!(
            graph.add_edge(&store, Dependency::new(1, 2)).unwrap_err(),
            GraphError::HierarchyConflict { .. }
        ));
        assert!(matches!(
            graph.add_edge(&store, Dependency::new(4, 2)).unwrap_err(),
            GraphError::Cycle { .. }
        ));
        assert_eq!(graph, before);
    }

    #[test]
    fn test_cycle_through_summary_is_detected() {
        // 1 → 4 makes every leaf of 1 drive 4; 4 → 3 would close 3 → 4 → 3.
        let store = sample_store();
        let mut graph = DependencyGraph::new();
        graph.add_edge(&store, Dependency::new(1, 4)).unwrap();
        assert!(graph.would_create_cycle(&store, TaskId(4), TaskId(3)));
        assert!(matches!(
            graph.add_edge(&store, Dependency::new(4, 3)).unwrap_err(),
            GraphError::Cycle { .. }
        ));
        // 4 → 5 is fine.
        assert!(graph.add_edge(&store, Dependency::new(4, 5)).is_ok());
    }

    #[test]
    fn test_remove_edge() {
        let store = sample_store();
        let mut graph = DependencyGraph::new();
        graph.add_edge(&store, Dependency::new(2, 4)).unwrap();
        let removed = graph.remove_edge(TaskId(2), TaskId(4)).unwrap();
        assert_eq!(removed.key(), (TaskId(2), TaskId(4)));
        assert!(graph.is_empty());
        assert_eq!(graph, DependencyGraph::new());
        assert!(matches!(
            graph.remove_edge(TaskId(2), TaskId(4)).unwrap_err(),
            GraphError::NotFound { .. }
        ));
    }

    #[test]
    fn test_remove_task_edges() {
        let store = sample_store();
        let mut graph = DependencyGraph::new();
        graph.add_edge(&store, Dependency::new(2, 4)).unwrap();
        graph.add_edge(&store, Dependency::new(4, 5)).unwrap();
        graph.add_edge(&store, Dependency::new(3, 5)).unwrap();
        let removed = graph.remove_task_edges(TaskId(4));
        assert_eq!(removed.len(), 2);
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_leaf_expansion() {
        let store = sample_store();
        let mut graph = DependencyGraph::new();
        graph.add_edge(&store, Dependency::new(4, 1)).unwrap();
        graph.add_edge(&store, Dependency::new(1, 5)).unwrap();

        // Both children inherit the link into their parent.
        assert_eq!(graph.leaf_predecessors(&store, TaskId(2)).len(), 1);
        assert_eq!(graph.leaf_predecessor_leaves(&store, TaskId(3)), vec![TaskId(4)]);
        let targets: Vec<TaskId> = graph
            .leaf_successors(&store, TaskId(4))
            .into_iter()
            .map(|(_, t)| t)
            .collect();
        assert_eq!(targets, vec![TaskId(2), TaskId(3)]);
        // Both children drive the link out of their parent.
        assert_eq!(graph.leaf_successors(&store, TaskId(3)).len(), 1);
    }

    #[test]
    fn test_topological_order_ties_follow_outline() {
        let store = sample_store();
        let mut graph = DependencyGraph::new();
        graph.add_edge(&store, Dependency::new(5, 2)).unwrap();

        let order = graph.topological_order(&store);
        assert_eq!(order, vec![TaskId(3), TaskId(4), TaskId(5), TaskId(2)]);
    }

    #[test]
    fn test_topological_order_of_subset() {
        let store = sample_store();
        let mut graph = DependencyGraph::new();
        graph.add_edge(&store, Dependency::new(5, 4)).unwrap();
        graph.add_edge(&store, Dependency::new(4, 3)).unwrap();
        let subset: BTreeSet<TaskId> = [TaskId(3), TaskId(5)].into_iter().collect();
        assert_eq!(graph.topological_order_of(&store, &subset), vec![TaskId(3), TaskId(5)]);
    }

    #[test]
    fn test_from_edges_rejects_cycle() {
        let store = sample_store();
        let err = DependencyGraph::from_edges(
            &store,
            vec![Dependency::new(2, 4), Dependency::new(4, 5), Dependency::new(5, 2)],
        )
        .unwrap_err();
        assert!(matches!(err, GraphError::Cycle { .. }));

        let ok = DependencyGraph::from_edges(&store, vec![Dependency::new(2, 4)]).unwrap();
        assert_eq!(ok.len(), 1);
    }

    #[test]
    fn test_check_structure_after_reparent() {
        let mut store = sample_store();
        let mut graph = DependencyGraph::new();
        graph.add_edge(&store, Dependency::new(4, 5)).unwrap();
        assert!(graph.check_structure(&store).is_ok());

        store.reparent(TaskId(5), Some(TaskId(4)), None).unwrap();
        assert!(matches!(
            graph.check_structure(&store).unwrap_err(),
            GraphError::HierarchyConflict { .. }
        ));
    }
}
