//! Critical path date propagation.
//!
//! [`DatePropagator`] recomputes early/late dates, slack and criticality of
//! leaf tasks. Summary tasks never take part; their dates are rolled up
//! afterwards by [`rollup`](crate::rollup).
//!
//! # Algorithm
//!
//! 1. **Closure**: starting from the dirty leaves, collect everything
//!    reachable forward (whose early dates may move), then everything
//!    reachable backward from that set (whose late dates may move).
//! 2. **Forward pass** in topological order:
//!    `ES = max(project_start, max over links of the implied start)`, then
//!    the constraint clamp, then `EF = ES + duration`.
//! 3. **Backward pass** in reverse topological order:
//!    `LF = min over links of the implied finish`, seeded at sinks with the
//!    project deadline (or the sink anchor), tightened by deadlines and
//!    constraints, then `LS = LF - duration`.
//! 4. `total slack = LS - ES`, critical iff zero; free slack over
//!    finish-to-start successors.
//!
//! The whole closure is recomputed from scratch on every call, so batching
//! independent edits in any order yields identical results.
//!
//! | Link | Forward: successor start ≥ | Backward: predecessor finish ≤ |
//! |------|----------------------------|--------------------------------|
//! | FS | `pred.EF + lag` | `succ.LS - lag` |
//! | SS | `pred.ES + lag` | `succ.LS - lag + dur(pred)` |
//! | FF | `pred.EF + lag - dur(succ)` | `succ.LF - lag` |
//! | SF | `pred.ES + lag - dur(succ)` | `succ.LF - lag + dur(pred)` |
//!
//! # Reference
//! Kelley & Walker (1959), "Critical-Path Planning and Scheduling";
//! Moder, Phillips & Davis (1983), "Project Management with CPM, PERT and
//! Precedence Diagramming", Ch. 4

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, trace, warn};

use crate::engine::ScheduleOptions;
use crate::graph::DependencyGraph;
use crate::models::{
    ComputedFields, Day, Delta, Dependency, DependencyKind, Field, TaskConstraint, TaskId,
    WorkCalendar,
};
use crate::store::TaskStore;

/// Leaf-level CPM solver over a borrowed store and graph.
pub struct DatePropagator<'a> {
    store: &'a TaskStore,
    graph: &'a DependencyGraph,
    calendar: &'a WorkCalendar,
    options: &'a ScheduleOptions,
}

impl<'a> DatePropagator<'a> {
    /// Creates a propagator.
    pub fn new(
        store: &'a TaskStore,
        graph: &'a DependencyGraph,
        calendar: &'a WorkCalendar,
        options: &'a ScheduleOptions,
    ) -> Self {
        Self {
            store,
            graph,
            calendar,
            options,
        }
    }

    /// Leaves whose computed fields may change when `dirty` changes.
    ///
    /// Summary ids in `dirty` stand for all of their leaves; unknown ids are
    /// ignored.
    pub fn closure(&self, dirty: &BTreeSet<TaskId>) -> BTreeSet<TaskId> {
        if self.options.anchors_globally() {
            return self.all_leaves();
        }

        let seeds: Vec<TaskId> = dirty
            .iter()
            .filter(|&&t| self.store.contains(t))
            .flat_map(|&t| self.store.leaves_of(t))
            .collect();

        let mut forward: BTreeSet<TaskId> = BTreeSet::new();
        let mut stack = seeds;
        while let Some(cur) = stack.pop() {
            if forward.insert(cur) {
                stack.extend(
                    self.graph
                        .leaf_successors(self.store, cur)
                        .into_iter()
                        .map(|(_, t)| t),
                );
            }
        }

        let mut closure = forward.clone();
        let mut stack: Vec<TaskId> = forward.into_iter().collect();
        while let Some(cur) = stack.pop() {
            for pred in self.graph.leaf_predecessor_leaves(self.store, cur) {
                if closure.insert(pred) {
                    stack.push(pred);
                }
            }
        }
        closure
    }

    /// Recomputes every leaf in the closure of `dirty`, writing results into
    /// `computed` and recording changed fields in `delta`.
    ///
    /// Returns the recomputed leaves.
    pub fn propagate(
        &self,
        dirty: &BTreeSet<TaskId>,
        computed: &mut BTreeMap<TaskId, ComputedFields>,
        delta: &mut Delta,
    ) -> BTreeSet<TaskId> {
        let closure = self.closure(dirty);
        let order = self.graph.topological_order_of(self.store, &closure);
        debug_assert_eq!(order.len(), closure.len(), "dependency cycle in closure");
        debug!(
            dirty = dirty.len(),
            closure = closure.len(),
            "propagating dates"
        );

        let mut fresh: BTreeMap<TaskId, ComputedFields> = BTreeMap::new();
        for &leaf in &order {
            let fields = self.forward(leaf, computed, &fresh);
            fresh.insert(leaf, fields);
        }

        let project_finish = self
            .options
            .anchors_globally()
            .then(|| self.project_finish(computed, &fresh));
        for &leaf in order.iter().rev() {
            let mut fields = fresh.remove(&leaf).unwrap_or_default();
            self.backward(leaf, &mut fields, project_finish, computed, &fresh);
            fresh.insert(leaf, fields);
        }

        for (leaf, fields) in fresh {
            check_invariants(leaf, &fields);
            commit(computed, delta, leaf, fields);
        }
        closure
    }

    fn all_leaves(&self) -> BTreeSet<TaskId> {
        self.store
            .ids()
            .filter(|&t| self.store.is_leaf(t))
            .collect()
    }

    /// Early window of a link endpoint: the leaf itself, or the aggregate
    /// over a summary task's leaves.
    fn early_window(
        &self,
        id: TaskId,
        computed: &BTreeMap<TaskId, ComputedFields>,
        fresh: &BTreeMap<TaskId, ComputedFields>,
    ) -> (Day, Day) {
        let mut window: Option<(Day, Day)> = None;
        for leaf in self.store.leaves_of(id) {
            if let Some(c) = fresh.get(&leaf).or_else(|| computed.get(&leaf)) {
                window = Some(match window {
                    None => (c.early_start, c.early_finish),
                    Some((s, f)) => (s.min(c.early_start), f.max(c.early_finish)),
                });
            }
        }
        window.unwrap_or((self.options.project_start, self.options.project_start))
    }

    fn forward(
        &self,
        leaf: TaskId,
        computed: &BTreeMap<TaskId, ComputedFields>,
        fresh: &BTreeMap<TaskId, ComputedFields>,
    ) -> ComputedFields {
        let cal = self.calendar;
        let Some(task) = self.store.get(leaf) else {
            return ComputedFields::default();
        };
        let dur = i64::from(task.effective_duration());

        let mut required = self.options.project_start;
        for dep in self.graph.leaf_predecessors(self.store, leaf) {
            let (p_es, p_ef) = self.early_window(dep.predecessor_id, computed, fresh);
            let implied = match dep.kind {
                DependencyKind::FinishToStart => cal.advance(p_ef, dep.lag_days),
                DependencyKind::StartToStart => cal.advance(p_es, dep.lag_days),
                DependencyKind::FinishToFinish => cal.advance(cal.advance(p_ef, dep.lag_days), -dur),
                DependencyKind::StartToFinish => cal.advance(cal.advance(p_es, dep.lag_days), -dur),
            };
            required = required.max(implied);
        }
        if dur > 0 {
            required = cal.next_working(required);
        }

        let mut violated = false;
        let (es, ef) = match task.constraint {
            TaskConstraint::MustStartOn(d) => {
                violated = d < required;
                (d, cal.advance(d, dur))
            }
            TaskConstraint::MustFinishOn(d) => {
                let es = cal.advance(d, -dur);
                violated = es < required;
                (es, d)
            }
            TaskConstraint::StartNoEarlierThan(d) => {
                let es = required.max(if dur > 0 { cal.next_working(d) } else { d });
                (es, cal.advance(es, dur))
            }
            _ => (required, cal.advance(required, dur)),
        };
        if let TaskConstraint::FinishNoLaterThan(d) = task.constraint {
            violated = ef > d;
        }
        if violated {
            warn!(
                task = %leaf,
                constraint = task.constraint.label(),
                required_start = required,
                "constraint date conflicts with dependencies"
            );
        }

        let deadline_missed = task.deadline.is_some_and(|d| ef > d);
        if deadline_missed {
            warn!(task = %leaf, finish = ef, "task finishes after its deadline");
        }
        trace!(task = %leaf, es, ef, "forward pass");

        ComputedFields {
            early_start: es,
            early_finish: ef,
            constraint_violated: violated,
            deadline_missed,
            percent_complete: task.percent_complete,
            ..ComputedFields::default()
        }
    }

    fn project_finish(
        &self,
        computed: &BTreeMap<TaskId, ComputedFields>,
        fresh: &BTreeMap<TaskId, ComputedFields>,
    ) -> Day {
        self.all_leaves()
            .into_iter()
            .filter_map(|l| fresh.get(&l).or_else(|| computed.get(&l)))
            .map(|c| c.early_finish)
            .max()
            .unwrap_or(self.options.project_start)
    }

    fn backward(
        &self,
        leaf: TaskId,
        fields: &mut ComputedFields,
        project_finish: Option<Day>,
        computed: &BTreeMap<TaskId, ComputedFields>,
        fresh: &BTreeMap<TaskId, ComputedFields>,
    ) {
        let cal = self.calendar;
        let Some(task) = self.store.get(leaf) else {
            return;
        };
        let dur = i64::from(task.effective_duration());
        let (es, ef) = (fields.early_start, fields.early_finish);
        let successors = self.graph.leaf_successors(self.store, leaf);
        let lookup = |t: TaskId| {
            fresh
                .get(&t)
                .or_else(|| computed.get(&t))
                .cloned()
                .unwrap_or_default()
        };

        let mut lf = match self.options.project_deadline {
            Some(deadline) => deadline,
            None if successors.is_empty() => project_finish.unwrap_or(ef),
            None => Day::MAX,
        };
        let mut free_slack: Option<i64> = None;
        let mut successor_bound: Option<Day> = None;
        for (dep, target) in &successors {
            let t = lookup(*target);
            lf = lf.min(self.latest_finish_for(dep, dur, t.late_start, t.late_finish));
            let early = self.latest_finish_for(dep, dur, t.early_start, t.early_finish);
            successor_bound = Some(successor_bound.map_or(early, |b: Day| b.min(early)));
            if dep.kind == DependencyKind::FinishToStart {
                let slack = t.early_start.saturating_sub(cal.advance(ef, dep.lag_days));
                free_slack = Some(free_slack.map_or(slack, |s: i64| s.min(slack)));
            }
        }

        if let Some(deadline) = task.deadline {
            lf = lf.min(deadline);
        }
        let mut ls = match task.constraint {
            TaskConstraint::MustStartOn(d) => {
                lf = cal.advance(d, dur);
                d
            }
            TaskConstraint::MustFinishOn(d) => {
                lf = d;
                cal.advance(d, -dur)
            }
            TaskConstraint::FinishNoLaterThan(d) => {
                lf = lf.min(d);
                cal.advance(lf, -dur)
            }
            _ => cal.advance(lf, -dur),
        };

        // Negative float is reported as zero slack on a critical task.
        let raw_slack = ls.saturating_sub(es);
        ls = ls.max(es);
        lf = lf.max(ef);
        let total_slack = raw_slack.max(0);

        let (start, finish) = match task.constraint {
            TaskConstraint::AsLateAsPossible => {
                let latest = successor_bound.unwrap_or(lf).min(lf).max(ef);
                let start = cal.advance(latest, -dur).max(es);
                (start, cal.advance(start, dur))
            }
            _ => (es, ef),
        };

        fields.late_start = ls;
        fields.late_finish = lf;
        fields.start = start;
        fields.finish = finish;
        fields.total_slack_days = Some(total_slack);
        fields.free_slack_days = Some(match free_slack {
            Some(s) => s.max(0),
            None => dur,
        });
        fields.is_critical = total_slack == 0;
        trace!(task = %leaf, ls, lf, total_slack, "backward pass");
    }

    /// Latest finish of the predecessor allowed by one link, given the
    /// successor's start and finish.
    fn latest_finish_for(&self, dep: &Dependency, pred_dur: i64, succ_start: Day, succ_finish: Day) -> Day {
        let cal = self.calendar;
        match dep.kind {
            DependencyKind::FinishToStart => cal.advance(succ_start, -dep.lag_days),
            DependencyKind::StartToStart => cal.advance(cal.advance(succ_start, -dep.lag_days), pred_dur),
            DependencyKind::FinishToFinish => cal.advance(succ_finish, -dep.lag_days),
            DependencyKind::StartToFinish => cal.advance(cal.advance(succ_finish, -dep.lag_days), pred_dur),
        }
    }
}

/// Stores `fields` for `id` and records which fields changed.
pub(crate) fn commit(
    computed: &mut BTreeMap<TaskId, ComputedFields>,
    delta: &mut Delta,
    id: TaskId,
    fields: ComputedFields,
) {
    match computed.get(&id) {
        Some(old) if *old == fields => {}
        Some(old) => {
            delta.record_all(id, old.diff(&fields));
            computed.insert(id, fields);
        }
        None => {
            delta.record_all(id, ComputedFields::default().diff(&fields));
            delta.record(id, Field::EarlyStart);
            computed.insert(id, fields);
        }
    }
}

fn check_invariants(id: TaskId, c: &ComputedFields) {
    debug_assert!(c.early_start <= c.early_finish, "{id}: early start after early finish");
    debug_assert!(c.early_start <= c.late_start, "{id}: early start after late start");
    debug_assert!(c.early_finish <= c.late_finish, "{id}: early finish after late finish");
    debug_assert!(c.start <= c.finish, "{id}: scheduled start after finish");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Dependency, Task};

    struct Fixture {
        store: TaskStore,
        graph: DependencyGraph,
        calendar: WorkCalendar,
        options: ScheduleOptions,
    }

    impl Fixture {
        fn new(tasks: Vec<Task>, deps: Vec<Dependency>) -> Self {
            let store = TaskStore::from_tasks(tasks).unwrap();
            let graph = DependencyGraph::from_edges(&store, deps).unwrap();
            Self {
                store,
                graph,
                calendar: WorkCalendar::continuous(),
                options: ScheduleOptions::default(),
            }
        }

        fn run(&self) -> BTreeMap<TaskId, ComputedFields> {
            let mut computed = BTreeMap::new();
            let mut delta = Delta::new();
            let all: BTreeSet<TaskId> = self.store.ids().collect();
            DatePropagator::new(&self.store, &self.graph, &self.calendar, &self.options)
                .propagate(&all, &mut computed, &mut delta);
            computed
        }
    }

    fn chain() -> Fixture {
        Fixture::new(
            vec![
                Task::new(1).with_name("A").with_duration(3),
                Task::new(2).with_name("B").with_duration(2),
                Task::new(3).with_name("C").with_duration(4),
            ],
            vec![Dependency::new(1, 2), Dependency::new(2, 3)],
        )
    }

    #[test]
    fn test_linear_chain_is_critical() {
        let c = chain().run();
        let dates: Vec<(Day, Day)> = (1..=3)
            .map(|i| (c[&TaskId(i)].early_start, c[&TaskId(i)].early_finish))
            .collect();
        assert_eq!(dates, vec![(0, 3), (3, 5), (5, 9)]);
        for i in 1..=3 {
            assert_eq!(c[&TaskId(i)].total_slack_days, Some(0));
            assert!(c[&TaskId(i)].is_critical);
        }
    }

    #[test]
    fn test_parallel_path_has_slack() {
        let mut f = chain();
        f.store.insert(Task::new(4).with_name("D").with_duration(1)).unwrap();
        f.graph.add_edge(&f.store, Dependency::new(1, 4)).unwrap();
        f.graph.add_edge(&f.store, Dependency::new(4, 3)).unwrap();
        let c = f.run();

        let d = &c[&TaskId(4)];
        assert_eq!((d.early_start, d.early_finish), (3, 4));
        assert_eq!((d.late_start, d.late_finish), (4, 5));
        assert_eq!(d.total_slack_days, Some(1));
        assert_eq!(d.free_slack_days, Some(1));
        assert!(!d.is_critical);
        assert!(c[&TaskId(1)].is_critical && c[&TaskId(2)].is_critical && c[&TaskId(3)].is_critical);
    }

    #[test]
    fn test_link_kinds_and_lag() {
        let f = Fixture::new(
            vec![
                Task::new(1).with_duration(4),
                Task::new(2).with_duration(2),
                Task::new(3).with_duration(3),
                Task::new(4).with_duration(5),
                Task::new(5).with_duration(2),
            ],
            vec![
                Dependency::new(1, 2).with_kind(DependencyKind::StartToStart).with_lag(1),
                Dependency::new(1, 3).with_kind(DependencyKind::FinishToFinish).with_lag(2),
                Dependency::new(1, 4).with_kind(DependencyKind::StartToFinish).with_lag(6),
                Dependency::new(1, 5).with_lag(-2),
            ],
        );
        let c = f.run();
        assert_eq!(c[&TaskId(2)].early_start, 1); // SS: 0 + 1
        assert_eq!(c[&TaskId(3)].early_finish, 6); // FF: 4 + 2
        assert_eq!(c[&TaskId(3)].early_start, 3);
        assert_eq!(c[&TaskId(4)].early_finish, 6); // SF: 0 + 6
        assert_eq!(c[&TaskId(4)].early_start, 1);
        assert_eq!(c[&TaskId(5)].early_start, 2); // FS with 2-day lead
    }

    #[test]
    fn test_negative_implied_start_clamps_to_project_start() {
        let mut f = Fixture::new(
            vec![Task::new(1).with_duration(1), Task::new(2).with_duration(3)],
            vec![Dependency::new(1, 2).with_lag(-5)],
        );
        f.options = ScheduleOptions::new().with_start(2);
        let c = f.run();
        assert_eq!(c[&TaskId(1)].early_start, 2);
        assert_eq!(c[&TaskId(2)].early_start, 2);
    }

    #[test]
    fn test_must_start_on_beats_dependencies() {
        let f = Fixture::new(
            vec![
                Task::new(1).with_duration(15),
                Task::new(2)
                    .with_duration(2)
                    .with_constraint(TaskConstraint::MustStartOn(10)),
            ],
            vec![Dependency::new(1, 2)],
        );
        let c = f.run();
        let t = &c[&TaskId(2)];
        assert_eq!(t.early_start, 10);
        assert_eq!(t.early_finish, 12);
        assert!(t.constraint_violated);
        assert!(!c[&TaskId(1)].constraint_violated);
    }

    #[test]
    fn test_must_finish_on() {
        let f = Fixture::new(
            vec![Task::new(1).with_duration(3).with_constraint(TaskConstraint::MustFinishOn(8))],
            vec![],
        );
        let c = f.run();
        assert_eq!((c[&TaskId(1)].early_start, c[&TaskId(1)].early_finish), (5, 8));
        assert_eq!(c[&TaskId(1)].late_finish, 8);
        assert!(!c[&TaskId(1)].constraint_violated);
    }

    #[test]
    fn test_start_no_earlier_than_only_raises() {
        let f = Fixture::new(
            vec![
                Task::new(1).with_duration(6),
                Task::new(2).with_duration(1).with_constraint(TaskConstraint::StartNoEarlierThan(4)),
                Task::new(3).with_duration(1).with_constraint(TaskConstraint::StartNoEarlierThan(9)),
            ],
            vec![Dependency::new(1, 2), Dependency::new(1, 3)],
        );
        let c = f.run();
        assert_eq!(c[&TaskId(2)].early_start, 6);
        assert_eq!(c[&TaskId(3)].early_start, 9);
        assert!(!c[&TaskId(2)].constraint_violated);
    }

    #[test]
    fn test_finish_no_later_than_flags_and_caps() {
        let f = Fixture::new(
            vec![
                Task::new(1).with_duration(5),
                Task::new(2).with_duration(2).with_constraint(TaskConstraint::FinishNoLaterThan(6)),
            ],
            vec![Dependency::new(1, 2)],
        );
        let c = f.run();
        assert_eq!(c[&TaskId(2)].early_finish, 7);
        assert!(c[&TaskId(2)].constraint_violated);
        assert!(c[&TaskId(2)].is_critical);
        assert_eq!(c[&TaskId(2)].late_finish, 7);
    }

    #[test]
    fn test_project_deadline_creates_slack() {
        let mut f = chain();
        f.options = ScheduleOptions::new().with_deadline(12);
        let c = f.run();
        for i in 1..=3 {
            assert_eq!(c[&TaskId(i)].total_slack_days, Some(3));
            assert!(!c[&TaskId(i)].is_critical);
        }
        assert_eq!(c[&TaskId(3)].late_finish, 12);
    }

    #[test]
    fn test_infeasible_deadline_floors_slack() {
        let mut f = chain();
        f.options = ScheduleOptions::new().with_deadline(7);
        let c = f.run();
        for i in 1..=3 {
            let t = &c[&TaskId(i)];
            assert_eq!(t.total_slack_days, Some(0));
            assert!(t.is_critical);
            assert!(t.early_start <= t.late_start);
            assert!(t.early_finish <= t.late_finish);
        }
    }

    #[test]
    fn test_task_deadline_missed() {
        let f = Fixture::new(
            vec![Task::new(1).with_duration(3), Task::new(2).with_duration(3).with_deadline(5)],
            vec![Dependency::new(1, 2)],
        );
        let c = f.run();
        assert!(c[&TaskId(2)].deadline_missed);
        assert!(!c[&TaskId(1)].deadline_missed);
    }

    #[test]
    fn test_milestone_has_zero_span() {
        let f = Fixture::new(
            vec![Task::new(1).with_duration(3), Task::new(2).with_duration(7).milestone()],
            vec![Dependency::new(1, 2)],
        );
        let c = f.run();
        assert_eq!((c[&TaskId(2)].early_start, c[&TaskId(2)].early_finish), (3, 3));
        assert_eq!(c[&TaskId(2)].free_slack_days, Some(0));
    }

    #[test]
    fn test_sink_without_successors_gets_duration_as_free_slack() {
        let c = chain().run();
        assert_eq!(c[&TaskId(3)].free_slack_days, Some(4));
        assert_eq!(c[&TaskId(1)].free_slack_days, Some(0));
    }

    #[test]
    fn test_project_finish_anchor() {
        let mut f = Fixture::new(
            vec![Task::new(1).with_duration(10), Task::new(2).with_duration(4)],
            vec![],
        );
        let own = f.run();
        assert!(own[&TaskId(2)].is_critical);

        f.options = ScheduleOptions::new().with_sink_anchor(crate::engine::SinkAnchor::ProjectFinish);
        let global = f.run();
        assert_eq!(global[&TaskId(2)].total_slack_days, Some(6));
        assert!(global[&TaskId(1)].is_critical);
    }

    #[test]
    fn test_as_late_as_possible_uses_successor_room() {
        let f = Fixture::new(
            vec![
                Task::new(1).with_duration(10),
                Task::new(2).with_duration(2).with_constraint(TaskConstraint::AsLateAsPossible),
                Task::new(3).with_duration(1),
            ],
            vec![Dependency::new(1, 3), Dependency::new(2, 3)],
        );
        let c = f.run();
        let alap = &c[&TaskId(2)];
        assert_eq!((alap.early_start, alap.early_finish), (0, 2));
        assert_eq!((alap.start, alap.finish), (8, 10));
        assert_eq!(c[&TaskId(1)].start, 0);
    }

    #[test]
    fn test_summary_predecessor_uses_aggregate_window() {
        // 1 (summary) = {2: 0..3, 3: SNET 2, 2..7}; 1 → 4 (FS), 1 → 5 (SS).
        let f = Fixture::new(
            vec![
                Task::new(1),
                Task::new(2).with_parent(1).with_duration(3),
                Task::new(3)
                    .with_parent(1)
                    .with_order(1)
                    .with_duration(5)
                    .with_constraint(TaskConstraint::StartNoEarlierThan(2)),
                Task::new(4).with_order(1).with_duration(1),
                Task::new(5).with_order(2).with_duration(1),
            ],
            vec![
                Dependency::new(1, 4),
                Dependency::new(1, 5).with_kind(DependencyKind::StartToStart),
            ],
        );
        let c = f.run();
        assert!(!c.contains_key(&TaskId(1)));
        assert_eq!(c[&TaskId(4)].early_start, 7);
        assert_eq!(c[&TaskId(5)].early_start, 0);
    }

    #[test]
    fn test_summary_successor_constrains_every_leaf() {
        let f = Fixture::new(
            vec![
                Task::new(1).with_duration(4),
                Task::new(2).with_order(1),
                Task::new(3).with_parent(2).with_duration(1),
                Task::new(4).with_parent(2).with_order(1).with_duration(2),
            ],
            vec![Dependency::new(1, 2)],
        );
        let c = f.run();
        assert_eq!(c[&TaskId(3)].early_start, 4);
        assert_eq!(c[&TaskId(4)].early_start, 4);
        // Task 1 must finish before the earliest-late-start leaf.
        assert_eq!(c[&TaskId(1)].late_finish, 4);
    }

    #[test]
    fn test_weekday_calendar() {
        let mut f = chain();
        let monday = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        f.calendar = WorkCalendar::weekdays(monday);
        let c = f.run();
        // A: Mon-Wed, B: Thu-Fri, C: Mon-Thu of week two.
        assert_eq!((c[&TaskId(1)].early_start, c[&TaskId(1)].early_finish), (0, 3));
        assert_eq!((c[&TaskId(2)].early_start, c[&TaskId(2)].early_finish), (3, 5));
        assert_eq!((c[&TaskId(3)].early_start, c[&TaskId(3)].early_finish), (7, 11));
        assert!(c[&TaskId(2)].is_critical);
    }

    #[test]
    fn test_closure_is_forward_then_backward() {
        // 1 → 2 → 3, 4 → 2, 5 isolated.
        let f = Fixture::new(
            (1..=5).map(|i| Task::new(i).with_order(i as u32).with_duration(1)).collect(),
            vec![Dependency::new(1, 2), Dependency::new(2, 3), Dependency::new(4, 2)],
        );
        let p = DatePropagator::new(&f.store, &f.graph, &f.calendar, &f.options);
        let dirty: BTreeSet<TaskId> = [TaskId(3)].into_iter().collect();
        let closure = p.closure(&dirty);
        assert_eq!(
            closure.into_iter().collect::<Vec<_>>(),
            vec![TaskId(1), TaskId(2), TaskId(3), TaskId(4)]
        );

        let dirty: BTreeSet<TaskId> = [TaskId(5)].into_iter().collect();
        assert_eq!(p.closure(&dirty).len(), 1);
    }

    #[test]
    fn test_propagate_records_delta() {
        let f = chain();
        let mut computed = BTreeMap::new();
        let mut delta = Delta::new();
        let all: BTreeSet<TaskId> = f.store.ids().collect();
        let p = DatePropagator::new(&f.store, &f.graph, &f.calendar, &f.options);
        p.propagate(&all, &mut computed, &mut delta);
        assert_eq!(delta.len(), 3);

        let mut again = Delta::new();
        p.propagate(&all, &mut computed, &mut again);
        assert!(again.is_empty());
    }
}
