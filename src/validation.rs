//! Input validation for materialized task and dependency records.
//!
//! Checks structural integrity of a persisted project before it is loaded
//! into a [`ScheduleEngine`](crate::engine::ScheduleEngine). Detects:
//! - Duplicate task ids and duplicate dependencies
//! - Dangling parent and dependency references
//! - Parent cycles
//! - Self-dependencies and dependencies between a summary task and its own subtree
//! - Circular precedence dependencies (on the leaf-expanded graph)
//! - Out-of-range percent complete
//! - Constraint dates, deadlines and lags beyond the supported day range
//!
//! Unlike the engine's mutation checks, which stop at the first problem,
//! validation reports every problem it finds.
//!
//! # Reference
//! Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4 (Topological Sort)

use std::collections::{HashMap, HashSet};

use crate::models::{day_in_range, Dependency, Task, TaskId};
use crate::store::TaskStore;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two tasks share the same id.
    DuplicateId,
    /// A task references a parent that doesn't exist.
    MissingParent,
    /// A parent chain loops back on itself.
    ParentCycle,
    /// A dependency references a task that doesn't exist.
    InvalidPredecessor,
    /// A dependency links a task to itself.
    SelfDependency,
    /// The same predecessor/successor pair appears twice.
    DuplicateDependency,
    /// A dependency joins a summary task to its own subtree.
    HierarchyConflict,
    /// Precedence graph contains a cycle.
    CyclicDependency,
    /// Percent complete above 100.
    InvalidPercent,
    /// A date or lag outside `±MAX_DAY_OFFSET`.
    DayOutOfRange,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates a materialized project.
///
/// Checks:
/// 1. No duplicate task ids
/// 2. Percent complete within 0..=100; dates and lags within the day range
/// 3. Every parent reference points to an existing task
/// 4. No parent cycles
/// 5. Every dependency endpoint exists, is not a self-link and is unique
/// 6. No dependency joins a task to its ancestor or descendant
/// 7. No circular precedence dependencies
///
/// Checks 6 and 7 need a well-formed hierarchy and are skipped when any of
/// checks 1, 3 or 4 fail.
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_records(tasks: &[Task], dependencies: &[Dependency]) -> ValidationResult {
    let mut errors = Vec::new();

    let mut task_ids = HashSet::new();
    for task in tasks {
        if !task_ids.insert(task.id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate task ID: {}", task.id),
            ));
        }
        if task.percent_complete > 100 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidPercent,
                format!(
                    "Task {} has percent complete {}",
                    task.id, task.percent_complete
                ),
            ));
        }
        for day in task.constraint.date().into_iter().chain(task.deadline) {
            if !day_in_range(day) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::DayOutOfRange,
                    format!("Task {} has out-of-range date {day}", task.id),
                ));
            }
        }
    }

    let parents: HashMap<TaskId, Option<TaskId>> =
        tasks.iter().map(|t| (t.id, t.parent_id)).collect();
    let mut hierarchy_ok = errors
        .iter()
        .all(|e| e.kind != ValidationErrorKind::DuplicateId);

    for task in tasks {
        if let Some(parent) = task.parent_id {
            if !task_ids.contains(&parent) {
                hierarchy_ok = false;
                errors.push(ValidationError::new(
                    ValidationErrorKind::MissingParent,
                    format!("Task {} references unknown parent {}", task.id, parent),
                ));
            }
        }
    }

    if let Some(cycle_err) = detect_parent_cycle(&parents) {
        hierarchy_ok = false;
        errors.push(cycle_err);
    }

    let mut valid_deps = Vec::new();
    let mut seen_pairs = HashSet::new();
    for dep in dependencies {
        let (pred, succ) = dep.key();
        if !day_in_range(dep.lag_days) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DayOutOfRange,
                format!("Dependency {pred} -> {succ} has out-of-range lag {}", dep.lag_days),
            ));
            continue;
        }
        let missing: Vec<TaskId> = [pred, succ]
            .into_iter()
            .filter(|id| !task_ids.contains(id))
            .collect();
        if !missing.is_empty() {
            for id in missing {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidPredecessor,
                    format!("Dependency {pred} -> {succ} references unknown task {id}"),
                ));
            }
            continue;
        }
        if pred == succ {
            errors.push(ValidationError::new(
                ValidationErrorKind::SelfDependency,
                format!("Task {pred} depends on itself"),
            ));
            continue;
        }
        if !seen_pairs.insert((pred, succ)) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateDependency,
                format!("Duplicate dependency {pred} -> {succ}"),
            ));
            continue;
        }
        valid_deps.push(*dep);
    }

    if hierarchy_ok {
        if let Ok(store) = TaskStore::from_tasks(tasks.to_vec()) {
            valid_deps.retain(|dep| {
                let (pred, succ) = dep.key();
                if store.same_lineage(pred, succ) {
                    errors.push(ValidationError::new(
                        ValidationErrorKind::HierarchyConflict,
                        format!("Dependency {pred} -> {succ} links a summary task with its own subtree"),
                    ));
                    return false;
                }
                true
            });
            if let Some(cycle_err) = detect_cycles(&store, &valid_deps) {
                errors.push(cycle_err);
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn detect_parent_cycle(parents: &HashMap<TaskId, Option<TaskId>>) -> Option<ValidationError> {
    let mut ids: Vec<TaskId> = parents.keys().copied().collect();
    ids.sort();
    for id in ids {
        let mut cur = id;
        let mut steps = 0;
        while let Some(Some(parent)) = parents.get(&cur) {
            steps += 1;
            if *parent == id || steps > parents.len() {
                return Some(ValidationError::new(
                    ValidationErrorKind::ParentCycle,
                    format!("Parent chain of task {id} loops back on itself"),
                ));
            }
            cur = *parent;
        }
    }
    None
}

/// Detects cycles in the leaf-expanded precedence graph using DFS.
///
/// A link into a summary task reaches each of its leaves, and a link out of
/// one is driven by each of its leaves.
///
/// # Algorithm
/// Topological sort via DFS. If a back-edge is found (visiting a node
/// currently in the recursion stack), a cycle exists.
///
/// # Reference
/// Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4
fn detect_cycles(store: &TaskStore, dependencies: &[Dependency]) -> Option<ValidationError> {
    // Build adjacency list: leaf → successor leaves
    let mut adj: HashMap<TaskId, Vec<TaskId>> = HashMap::new();
    for dep in dependencies {
        let targets = store.leaves_of(dep.successor_id);
        for from in store.leaves_of(dep.predecessor_id) {
            adj.entry(from).or_default().extend(targets.iter().copied());
        }
    }

    let mut nodes: Vec<TaskId> = adj.keys().copied().collect();
    nodes.sort();

    let mut visited = HashSet::new();
    let mut in_stack = HashSet::new();
    for node in nodes {
        if !visited.contains(&node) && has_cycle_dfs(node, &adj, &mut visited, &mut in_stack) {
            return Some(ValidationError::new(
                ValidationErrorKind::CyclicDependency,
                format!("Circular dependency detected involving task {node}"),
            ));
        }
    }

    None
}

fn has_cycle_dfs(
    node: TaskId,
    adj: &HashMap<TaskId, Vec<TaskId>>,
    visited: &mut HashSet<TaskId>,
    in_stack: &mut HashSet<TaskId>,
) -> bool {
    visited.insert(node);
    in_stack.insert(node);

    if let Some(neighbors) = adj.get(&node) {
        for &next in neighbors {
            if in_stack.contains(&next) {
                return true; // Back edge → cycle
            }
            if !visited.contains(&next) && has_cycle_dfs(next, adj, visited, in_stack) {
                return true;
            }
        }
    }

    in_stack.remove(&node);
    false
}
