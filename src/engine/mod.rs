//! Schedule engine facade.
//!
//! [`ScheduleEngine`] owns the task tree, the dependency graph and the
//! computed projection and keeps them consistent. A successful mutation is
//! followed by a dirty-set recompute and returns the resulting [`Delta`];
//! a failed mutation leaves the engine exactly as it was.
//!
//! # Recompute pipeline
//!
//! 1. Collect the leaves of every touched task together with the leaves
//!    they are linked to, both before and after the edit.
//! 2. [`DatePropagator`] recomputes the forward/backward closure of that set.
//! 3. [`HierarchyRollup`] refreshes the summaries above every recomputed
//!    leaf and every touched task.
//!
//! The engine is single-threaded and synchronous. Callers that share one
//! project across requests serialize mutations themselves.

mod options;

pub use options::{ScheduleOptions, SinkAnchor};

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use crate::error::{EngineError, GraphError, Result, StructuralError};
use crate::graph::DependencyGraph;
use crate::models::{
    day_in_range, ComputedFields, Day, Delta, Dependency, DependencyKind, Field, Task,
    TaskConstraint, TaskId, TaskPatch, TaskView, Violation, WorkCalendar,
};
use crate::propagation::{commit, DatePropagator};
use crate::rollup::HierarchyRollup;
use crate::store::{CascadePolicy, TaskStore};
use crate::summary::ScheduleSummary;
use crate::validation::validate_records;

/// Tasks to reprocess after an edit.
#[derive(Debug, Default)]
struct Dirty {
    /// Seeds of the date propagation.
    leaves: BTreeSet<TaskId>,
    /// Tasks whose ancestor chains need a rollup.
    rollup: BTreeSet<TaskId>,
}

/// Outcome of [`ScheduleEngine::bulk_update`].
#[derive(Debug, Clone, PartialEq)]
pub struct BulkUpdate {
    /// Tasks the patch was applied to.
    pub updated: Vec<TaskId>,
    /// Tasks the patch was rejected for, with the reason.
    pub failed: Vec<(TaskId, EngineError)>,
    /// Changes caused by the whole batch.
    pub delta: Delta,
}

/// Incremental CPM scheduler for one project.
///
/// # Examples
///
/// ```
/// use gantt_core::engine::{ScheduleEngine, ScheduleOptions};
/// use gantt_core::models::DependencyKind;
///
/// let mut engine = ScheduleEngine::new(ScheduleOptions::default());
/// let (design, _) = engine.create_task(None, "Design", 3, None)?;
/// let (build, _) = engine.create_task(None, "Build", 2, None)?;
/// engine.add_dependency(design, build, DependencyKind::FinishToStart, 0)?;
///
/// let build_dates = engine.computed(build).unwrap();
/// assert_eq!((build_dates.early_start, build_dates.early_finish), (3, 5));
/// assert!(build_dates.is_critical);
/// # Ok::<(), gantt_core::EngineError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ScheduleEngine {
    store: TaskStore,
    graph: DependencyGraph,
    computed: BTreeMap<TaskId, ComputedFields>,
    options: ScheduleOptions,
    calendar: WorkCalendar,
}

/// Compares schedule state. The calendar holds a closure and is ignored.
impl PartialEq for ScheduleEngine {
    fn eq(&self, other: &Self) -> bool {
        self.store == other.store
            && self.graph == other.graph
            && self.computed == other.computed
            && self.options == other.options
    }
}

impl Default for ScheduleEngine {
    fn default() -> Self {
        Self::new(ScheduleOptions::default())
    }
}

impl ScheduleEngine {
    /// Creates an empty project.
    pub fn new(options: ScheduleOptions) -> Self {
        Self {
            store: TaskStore::new(),
            graph: DependencyGraph::new(),
            computed: BTreeMap::new(),
            options,
            calendar: WorkCalendar::continuous(),
        }
    }

    /// Replaces the working-day calendar and recomputes every task.
    pub fn with_calendar(mut self, calendar: WorkCalendar) -> Self {
        self.calendar = calendar;
        self.refresh_all();
        self
    }

    /// Loads a materialized project and computes it in full.
    ///
    /// Every problem in the records is logged; the error carries their count.
    /// Use [`validate_records`](crate::validation::validate_records) for the
    /// details.
    pub fn from_records(
        mut tasks: Vec<Task>,
        dependencies: Vec<Dependency>,
        options: ScheduleOptions,
    ) -> Result<Self> {
        if let Err(errors) = validate_records(&tasks, &dependencies) {
            for e in &errors {
                warn!(kind = ?e.kind, "{}", e.message);
            }
            return Err(EngineError::InvalidInput(errors.len()));
        }
        for task in tasks.iter_mut().filter(|t| t.is_milestone) {
            task.duration_days = 0;
        }

        let store = TaskStore::from_tasks(tasks)?;
        let graph = DependencyGraph::from_edges(&store, dependencies)?;
        let mut engine = Self {
            store,
            graph,
            computed: BTreeMap::new(),
            options,
            calendar: WorkCalendar::continuous(),
        };
        engine.refresh_all();
        debug!(
            tasks = engine.store.len(),
            dependencies = engine.graph.len(),
            "loaded project"
        );
        Ok(engine)
    }

    /// Current task records (outline order) and dependency records, for
    /// persistence.
    pub fn records(&self) -> (Vec<Task>, Vec<Dependency>) {
        let tasks = self
            .store
            .preorder()
            .into_iter()
            .filter_map(|id| self.store.get(id).cloned())
            .collect();
        let dependencies = self.graph.edges().copied().collect();
        (tasks, dependencies)
    }

    /// Full rebuild with new project bounds. Returns the whole snapshot.
    pub fn recompute(&mut self, project_start: Day, project_deadline: Option<Day>) -> Vec<TaskView> {
        self.options.project_start = project_start;
        self.options.project_deadline = project_deadline;
        let delta = self.refresh_all();
        debug!(
            project_start,
            project_deadline = ?project_deadline,
            changed = delta.len(),
            "full recompute"
        );
        self.snapshot()
    }

    /// Replaces the options and recomputes every task.
    pub fn set_options(&mut self, options: ScheduleOptions) -> Delta {
        self.options = options;
        self.refresh_all()
    }

    // ---- mutations ----

    /// Creates a task as the last child of `parent` (or as the last root).
    pub fn create_task(
        &mut self,
        parent: Option<TaskId>,
        name: impl Into<String>,
        duration_days: u32,
        constraint: Option<TaskConstraint>,
    ) -> Result<(TaskId, Delta)> {
        self.create_task_at(parent, None, name, duration_days, constraint)
    }

    /// Creates a task right below `sibling`, under the same parent.
    pub fn create_task_after(
        &mut self,
        sibling: TaskId,
        name: impl Into<String>,
        duration_days: u32,
        constraint: Option<TaskConstraint>,
    ) -> Result<(TaskId, Delta)> {
        let position = self
            .store
            .position_of(sibling)
            .ok_or(StructuralError::NotFound(sibling))?;
        let parent = self.store.parent_of(sibling);
        self.create_task_at(parent, Some(position + 1), name, duration_days, constraint)
    }

    /// Creates a task under `parent` at sibling rank `position`
    /// (`None` or past the end = last). Later siblings shift down one rank.
    pub fn create_task_at(
        &mut self,
        parent: Option<TaskId>,
        position: Option<usize>,
        name: impl Into<String>,
        duration_days: u32,
        constraint: Option<TaskConstraint>,
    ) -> Result<(TaskId, Delta)> {
        let constraint = constraint.unwrap_or_default();
        check_day(constraint.date())?;
        let mut dirty = Dirty::default();
        if let Some(p) = parent {
            if !self.store.contains(p) {
                return Err(StructuralError::NotFound(p).into());
            }
            // A leaf parent turns into a summary; its links move to the new child.
            self.collect_affected(p, &mut dirty);
        }
        let lists = [parent];
        let before = self.outline(&lists);

        let id = self.store.allocate_id();
        let rank = position.map_or(u32::MAX, |p| u32::try_from(p).unwrap_or(u32::MAX));
        let mut task = Task::new(id)
            .with_name(name)
            .with_duration(duration_days)
            .with_order(rank)
            .with_constraint(constraint);
        task.parent_id = parent;
        self.store.insert(task)?;

        let mut delta = Delta::new();
        delta.record(id, Field::Created);
        self.record_outline(&before, &lists, &mut delta);
        self.collect_affected(id, &mut dirty);
        let delta = self.run(dirty, delta);
        debug!(
            task = %id,
            parent = ?parent,
            position = ?position,
            changed = delta.len(),
            "created task"
        );
        Ok((id, delta))
    }

    /// Applies `patch` to the editable fields of `id`.
    ///
    /// Rejects percent complete above 100, percent writes on summary tasks
    /// and the `Complete → AtRisk` status transition. Only date-relevant
    /// changes trigger a date recompute; a progress change only refreshes
    /// the task and its ancestors.
    pub fn update_task_fields(&mut self, id: TaskId, patch: TaskPatch) -> Result<Delta> {
        let changed = self.apply_patch(id, &patch)?;
        let mut delta = Delta::new();
        delta.record_all(id, changed.iter().copied());

        let delta = if changed.iter().any(|&f| moves_dates(f)) {
            let mut dirty = Dirty::default();
            self.collect_affected(id, &mut dirty);
            self.run(dirty, delta)
        } else if changed.contains(&Field::PercentComplete) {
            self.refresh_progress(id, delta)
        } else {
            delta
        };
        debug!(task = %id, fields = changed.len(), changed = delta.len(), "updated task");
        Ok(delta)
    }

    /// Applies one patch to many tasks with a single recompute.
    ///
    /// Tasks the patch is invalid for are skipped and reported; the others
    /// are updated.
    pub fn bulk_update(&mut self, ids: &[TaskId], patch: &TaskPatch) -> BulkUpdate {
        let mut dirty = Dirty::default();
        let mut delta = Delta::new();
        let mut updated = Vec::new();
        let mut failed = Vec::new();

        for &id in ids {
            match self.apply_patch(id, patch) {
                Ok(changed) => {
                    if changed
                        .iter()
                        .any(|&f| moves_dates(f) || f == Field::PercentComplete)
                    {
                        self.collect_affected(id, &mut dirty);
                    }
                    delta.record_all(id, changed);
                    updated.push(id);
                }
                Err(err) => {
                    warn!(task = %id, error = %err, "bulk update skipped task");
                    failed.push((id, err));
                }
            }
        }

        let delta = self.run(dirty, delta);
        debug!(
            updated = updated.len(),
            failed = failed.len(),
            changed = delta.len(),
            "bulk update"
        );
        BulkUpdate {
            updated,
            failed,
            delta,
        }
    }

    /// Deletes `id`, its dependencies and, per `policy`, its subtree.
    pub fn delete_task(&mut self, id: TaskId, policy: CascadePolicy) -> Result<Delta> {
        if !self.store.contains(id) {
            return Err(StructuralError::NotFound(id).into());
        }
        let parent = self.store.parent_of(id);
        let children = self.store.children_of(id).to_vec();
        let mut dirty = Dirty::default();
        self.collect_affected(id, &mut dirty);
        let lists = [parent, Some(id)];
        let before = self.outline(&lists);

        let removed = self.store.remove(id, policy)?;
        let mut delta = Delta::new();
        let mut edges = 0;
        for task in &removed {
            edges += self.graph.remove_task_edges(task.id).len();
            self.computed.remove(&task.id);
            delta.record(task.id, Field::Removed);
        }
        self.record_outline(&before, &lists, &mut delta);

        for t in parent.into_iter().chain(children) {
            self.collect_affected(t, &mut dirty);
        }
        let delta = self.run(dirty, delta);
        debug!(
            task = %id,
            ?policy,
            removed = removed.len(),
            edges,
            changed = delta.len(),
            "deleted task"
        );
        Ok(delta)
    }

    /// Moves `id` under its immediately preceding sibling, as its last child.
    pub fn indent(&mut self, id: TaskId) -> Result<Delta> {
        let position = self
            .store
            .position_of(id)
            .ok_or(StructuralError::NotFound(id))?;
        if position == 0 {
            return Err(StructuralError::NoPrecedingSibling(id).into());
        }
        let new_parent = self.store.siblings_of(id)[position - 1];
        self.move_task(id, Some(new_parent), None)
    }

    /// Moves `id` up one level, right after its former parent.
    pub fn outdent(&mut self, id: TaskId) -> Result<Delta> {
        if !self.store.contains(id) {
            return Err(StructuralError::NotFound(id).into());
        }
        let parent = self
            .store
            .parent_of(id)
            .ok_or(StructuralError::NoParent(id))?;
        let grandparent = self.store.parent_of(parent);
        let position = self.store.position_of(parent).map(|p| p + 1);
        self.move_task(id, grandparent, position)
    }

    /// Moves `id` under `new_parent` at `position` (`None` = last).
    ///
    /// The move is rolled back if it makes a dependency join a task to its
    /// own subtree or closes a cycle between leaves.
    pub fn move_task(
        &mut self,
        id: TaskId,
        new_parent: Option<TaskId>,
        position: Option<usize>,
    ) -> Result<Delta> {
        if !self.store.contains(id) {
            return Err(StructuralError::NotFound(id).into());
        }
        let old_parent = self.store.parent_of(id);
        let touched: Vec<TaskId> = [Some(id), old_parent, new_parent]
            .into_iter()
            .flatten()
            .collect();
        let mut dirty = Dirty::default();
        for &t in &touched {
            self.collect_affected(t, &mut dirty);
        }
        let lists = [old_parent, new_parent];
        let before = self.outline(&lists);

        let saved = self.store.clone();
        self.store.reparent(id, new_parent, position)?;
        if let Err(err) = self.graph.check_structure(&self.store) {
            self.store = saved;
            debug!(task = %id, error = %err, "move rejected");
            return Err(err.into());
        }

        let mut delta = Delta::new();
        self.record_outline(&before, &lists, &mut delta);
        for &t in &touched {
            self.collect_affected(t, &mut dirty);
        }
        let delta = self.run(dirty, delta);
        debug!(
            task = %id,
            from = ?old_parent,
            to = ?new_parent,
            changed = delta.len(),
            "moved task"
        );
        Ok(delta)
    }

    /// Adds a precedence link `pred → succ`.
    pub fn add_dependency(
        &mut self,
        pred: TaskId,
        succ: TaskId,
        kind: DependencyKind,
        lag_days: i64,
    ) -> Result<Delta> {
        check_day(Some(lag_days))?;
        let dep = Dependency::new(pred, succ).with_kind(kind).with_lag(lag_days);
        self.graph.add_edge(&self.store, dep)?;

        let mut dirty = Dirty::default();
        self.collect_affected(pred, &mut dirty);
        self.collect_affected(succ, &mut dirty);
        let delta = self.run(dirty, Delta::new());
        debug!(
            pred = %pred,
            succ = %succ,
            kind = kind.label(),
            lag_days,
            changed = delta.len(),
            "added dependency"
        );
        Ok(delta)
    }

    /// Removes the link `pred → succ`.
    pub fn remove_dependency(&mut self, pred: TaskId, succ: TaskId) -> Result<Delta> {
        if !self.graph.contains(pred, succ) {
            return Err(GraphError::NotFound { pred, succ }.into());
        }
        let mut dirty = Dirty::default();
        self.collect_affected(pred, &mut dirty);
        self.collect_affected(succ, &mut dirty);
        self.graph.remove_edge(pred, succ)?;

        let delta = self.run(dirty, Delta::new());
        debug!(pred = %pred, succ = %succ, changed = delta.len(), "removed dependency");
        Ok(delta)
    }

    // ---- queries ----

    /// Scheduling options.
    pub fn options(&self) -> &ScheduleOptions {
        &self.options
    }

    /// Working-day calendar.
    pub fn calendar(&self) -> &WorkCalendar {
        &self.calendar
    }

    /// Task tree.
    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    /// Dependency graph.
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Number of tasks.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Whether the project has no tasks.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Editable record of `id`.
    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.store.get(id)
    }

    /// Computed fields of `id`.
    pub fn computed(&self, id: TaskId) -> Option<&ComputedFields> {
        self.computed.get(&id)
    }

    /// Read model of `id`.
    pub fn view(&self, id: TaskId) -> Option<TaskView> {
        let task = self.store.get(id)?.clone();
        Some(TaskView {
            computed: self.computed.get(&id).cloned().unwrap_or_default(),
            level: self.store.level(id),
            wbs_code: self.store.wbs_code(id),
            is_summary: !self.store.is_leaf(id),
            predecessors: self.graph.predecessors_of(id).copied().collect(),
            task,
        })
    }

    /// Every task in outline order.
    pub fn snapshot(&self) -> Vec<TaskView> {
        self.store
            .preorder()
            .into_iter()
            .filter_map(|id| self.view(id))
            .collect()
    }

    /// Constraint conflicts and deadline misses, in outline order.
    pub fn violations(&self) -> Vec<Violation> {
        let mut out = Vec::new();
        for id in self.store.preorder() {
            let (Some(task), Some(c)) = (self.store.get(id), self.computed.get(&id)) else {
                continue;
            };
            if c.constraint_violated {
                out.push(Violation::constraint_conflict(
                    id,
                    format!(
                        "'{}': {} constraint conflicts with its dependencies",
                        task.name,
                        task.constraint.label()
                    ),
                ));
            }
            if let (true, Some(deadline)) = (c.deadline_missed, task.deadline) {
                out.push(Violation::deadline_miss(
                    id,
                    format!(
                        "'{}' finishes on day {} after its deadline (day {})",
                        task.name, c.early_finish, deadline
                    ),
                ));
            }
        }
        out
    }

    /// Project-level indicators.
    pub fn summary(&self) -> ScheduleSummary {
        ScheduleSummary::calculate(&self.store, &self.computed)
    }

    /// Leaf tasks in scheduling order.
    pub fn topological_order(&self) -> Vec<TaskId> {
        self.graph.topological_order(&self.store)
    }

    /// Critical leaves in scheduling order.
    pub fn critical_path(&self) -> Vec<TaskId> {
        self.topological_order()
            .into_iter()
            .filter(|id| self.computed.get(id).is_some_and(|c| c.is_critical))
            .collect()
    }

    // ---- internals ----

    fn refresh_all(&mut self) -> Delta {
        let ids: BTreeSet<TaskId> = self.store.ids().collect();
        let dirty = Dirty {
            leaves: ids.clone(),
            rollup: ids,
        };
        self.run(dirty, Delta::new())
    }

    /// Propagates dates from `dirty` and rolls the result up.
    fn run(&mut self, dirty: Dirty, mut delta: Delta) -> Delta {
        self.computed.retain(|id, _| self.store.contains(*id));
        let seeds: BTreeSet<TaskId> = dirty
            .leaves
            .into_iter()
            .filter(|&t| self.store.contains(t))
            .collect();

        let recomputed = DatePropagator::new(&self.store, &self.graph, &self.calendar, &self.options)
            .propagate(&seeds, &mut self.computed, &mut delta);
        let summaries = HierarchyRollup::new(&self.store).rollup(
            recomputed.iter().copied().chain(dirty.rollup),
            &mut self.computed,
            &mut delta,
        );
        debug!(
            seeds = seeds.len(),
            closure = recomputed.len(),
            summaries,
            changed = delta.len(),
            "recomputed"
        );
        debug_assert!(self.is_consistent(), "computed fields out of sync");
        delta
    }

    /// Adds the leaves of `id` and their linked leaves to the propagation
    /// seeds, and `id` to the rollup set.
    fn collect_affected(&self, id: TaskId, dirty: &mut Dirty) {
        if !self.store.contains(id) {
            return;
        }
        for leaf in self.store.leaves_of(id) {
            dirty.leaves.insert(leaf);
            dirty
                .leaves
                .extend(self.graph.leaf_predecessor_leaves(&self.store, leaf));
            dirty.leaves.extend(
                self.graph
                    .leaf_successors(&self.store, leaf)
                    .into_iter()
                    .map(|(_, t)| t),
            );
        }
        dirty.rollup.insert(id);
    }

    /// Validates and applies a patch; returns the fields that changed.
    fn apply_patch(&mut self, id: TaskId, patch: &TaskPatch) -> Result<Vec<Field>> {
        let task = self.store.get(id).ok_or(StructuralError::NotFound(id))?;
        check_day(patch.constraint.and_then(|c| c.date()))?;
        check_day(patch.deadline.flatten())?;
        if let Some(percent) = patch.percent_complete {
            if percent > 100 {
                return Err(EngineError::InvalidPercent(percent));
            }
            if !self.store.is_leaf(id) {
                return Err(EngineError::DerivedField(id));
            }
        }
        if let Some(status) = patch.status {
            if !task.status.can_transition_to(status) {
                return Err(EngineError::InvalidStatusTransition {
                    id,
                    from: task.status,
                    to: status,
                });
            }
        }

        let task = self
            .store
            .get_mut(id)
            .ok_or(StructuralError::NotFound(id))?;
        let mut changed = Vec::new();
        if let Some(name) = &patch.name {
            set(&mut task.name, name.clone(), Field::Name, &mut changed);
        }
        let is_milestone = patch.is_milestone.unwrap_or(task.is_milestone);
        set(&mut task.is_milestone, is_milestone, Field::Milestone, &mut changed);
        let duration = if is_milestone {
            0
        } else {
            patch.duration_days.unwrap_or(task.duration_days)
        };
        set(&mut task.duration_days, duration, Field::Duration, &mut changed);
        if let Some(percent) = patch.percent_complete {
            set(&mut task.percent_complete, percent, Field::PercentComplete, &mut changed);
        }
        if let Some(status) = patch.status {
            set(&mut task.status, status, Field::Status, &mut changed);
        }
        if let Some(constraint) = patch.constraint {
            set(&mut task.constraint, constraint, Field::Constraint, &mut changed);
        }
        if let Some(deadline) = patch.deadline {
            set(&mut task.deadline, deadline, Field::Deadline, &mut changed);
        }
        if let Some(metadata) = &patch.metadata {
            set(&mut task.metadata, metadata.clone(), Field::Metadata, &mut changed);
        }
        Ok(changed)
    }

    /// Copies a leaf's new progress into its computed fields and rolls it up.
    fn refresh_progress(&mut self, id: TaskId, mut delta: Delta) -> Delta {
        let fields = match (self.store.get(id), self.computed.get(&id)) {
            (Some(task), Some(old)) => ComputedFields {
                percent_complete: task.percent_complete,
                ..old.clone()
            },
            _ => return delta,
        };
        commit(&mut self.computed, &mut delta, id, fields);
        HierarchyRollup::new(&self.store).rollup([id], &mut self.computed, &mut delta);
        delta
    }

    /// `(parent, rank)` of every task in the given sibling lists.
    fn outline(&self, parents: &[Option<TaskId>]) -> BTreeMap<TaskId, (Option<TaskId>, u32)> {
        let mut out = BTreeMap::new();
        for parent in parents {
            let list = match parent {
                Some(p) => self.store.children_of(*p),
                None => self.store.roots(),
            };
            for &child in list {
                if let Some(task) = self.store.get(child) {
                    out.insert(child, (task.parent_id, task.order_key));
                }
            }
        }
        out
    }

    fn record_outline(
        &self,
        before: &BTreeMap<TaskId, (Option<TaskId>, u32)>,
        parents: &[Option<TaskId>],
        delta: &mut Delta,
    ) {
        for (id, (parent, rank)) in self.outline(parents) {
            let (old_parent, old_rank) = match before.get(&id) {
                Some(&old) => old,
                None => {
                    delta.record_all(id, [Field::Parent, Field::Order]);
                    continue;
                }
            };
            if old_parent != parent {
                delta.record(id, Field::Parent);
            }
            if old_rank != rank {
                delta.record(id, Field::Order);
            }
        }
    }

    /// Every task has computed fields, none are stale, and every summary
    /// spans its children.
    fn is_consistent(&self) -> bool {
        if self.computed.len() != self.store.len() {
            return false;
        }
        self.store.ids().all(|id| {
            let Some(c) = self.computed.get(&id) else {
                return false;
            };
            let ordered = c.early_start <= c.early_finish
                && c.early_start <= c.late_start
                && c.early_finish <= c.late_finish;
            let children = self.store.children_of(id);
            let spans = children.is_empty() || {
                let kids: Vec<&ComputedFields> =
                    children.iter().filter_map(|k| self.computed.get(k)).collect();
                kids.iter().map(|k| k.early_start).min() == Some(c.early_start)
                    && kids.iter().map(|k| k.early_finish).max() == Some(c.early_finish)
            };
            ordered && spans
        })
    }
}

/// Whether a change to `field` can move dates.
fn moves_dates(field: Field) -> bool {
    matches!(
        field,
        Field::Milestone | Field::Duration | Field::Constraint | Field::Deadline
    )
}

/// Rejects caller-supplied dates and lags too large to schedule.
fn check_day(day: Option<Day>) -> Result<()> {
    match day {
        Some(d) if !day_in_range(d) => Err(EngineError::DayOutOfRange(d)),
        _ => Ok(()),
    }
}

fn set<T: PartialEq>(slot: &mut T, value: T, field: Field, changed: &mut Vec<Field>) {
    if *slot != value {
        *slot = value;
        changed.push(field);
    }
}
