//! Summary task rollup.
//!
//! A summary task is not scheduled on its own: it is the aggregate window of
//! its subtree.
//!
//! | Field | Rollup |
//! |-------|--------|
//! | early/late/scheduled start | min over children |
//! | early/late/scheduled finish | max over children |
//! | percent complete | duration-weighted mean, rounded |
//! | critical | any child critical |
//! | total/free slack | none |
//!
//! Leaf weight is its scheduling duration (milestones weigh 0); a summary
//! weighs the sum of its children. When every child weighs 0 the plain mean
//! is used instead.

use std::collections::{BTreeMap, BTreeSet};

use tracing::trace;

use crate::models::{ComputedFields, Delta, TaskId};
use crate::propagation::commit;
use crate::store::TaskStore;

/// Bottom-up rollup over a borrowed store.
pub struct HierarchyRollup<'a> {
    store: &'a TaskStore,
}

impl<'a> HierarchyRollup<'a> {
    /// Creates a rollup over `store`.
    pub fn new(store: &'a TaskStore) -> Self {
        Self { store }
    }

    /// Summary tasks among `ids` and their ancestors, deepest first, each
    /// listed once.
    pub fn targets(&self, ids: impl IntoIterator<Item = TaskId>) -> Vec<TaskId> {
        let mut seen: BTreeSet<TaskId> = BTreeSet::new();
        for id in ids {
            if !self.store.contains(id) {
                continue;
            }
            for t in std::iter::once(id).chain(self.store.ancestors(id)) {
                if !self.store.is_leaf(t) {
                    seen.insert(t);
                }
            }
        }
        let mut out: Vec<TaskId> = seen.into_iter().collect();
        out.sort_by_key(|&t| (std::cmp::Reverse(self.store.level(t)), t));
        out
    }

    /// Recomputes the summaries above `ids`, writing into `computed` and
    /// recording changes in `delta`. Returns the number of summaries visited.
    pub fn rollup(
        &self,
        ids: impl IntoIterator<Item = TaskId>,
        computed: &mut BTreeMap<TaskId, ComputedFields>,
        delta: &mut Delta,
    ) -> usize {
        let targets = self.targets(ids);
        for &id in &targets {
            if let Some(fields) = self.summarize(id, computed) {
                trace!(task = %id, es = fields.early_start, ef = fields.early_finish, "rollup");
                commit(computed, delta, id, fields);
            }
        }
        targets.len()
    }

    /// Aggregate fields of summary `id` from its children's current values.
    ///
    /// Returns `None` if no child has computed fields yet.
    pub fn summarize(
        &self,
        id: TaskId,
        computed: &BTreeMap<TaskId, ComputedFields>,
    ) -> Option<ComputedFields> {
        let children = self.store.children_of(id);
        let mut acc: Option<ComputedFields> = None;
        let mut weighted: u64 = 0;
        let mut total_weight: u64 = 0;
        let mut plain: u64 = 0;
        let mut counted: u64 = 0;

        for &child in children {
            let Some(c) = computed.get(&child) else {
                continue;
            };
            let weight = self.weight(child);
            weighted += weight * u64::from(c.percent_complete);
            total_weight += weight;
            plain += u64::from(c.percent_complete);
            counted += 1;

            acc = Some(match acc {
                None => ComputedFields {
                    total_slack_days: None,
                    free_slack_days: None,
                    constraint_violated: false,
                    deadline_missed: false,
                    ..c.clone()
                },
                Some(mut a) => {
                    a.early_start = a.early_start.min(c.early_start);
                    a.early_finish = a.early_finish.max(c.early_finish);
                    a.late_start = a.late_start.min(c.late_start);
                    a.late_finish = a.late_finish.max(c.late_finish);
                    a.start = a.start.min(c.start);
                    a.finish = a.finish.max(c.finish);
                    a.is_critical |= c.is_critical;
                    a
                }
            });
        }

        let mut fields = acc?;
        fields.percent_complete = if total_weight > 0 {
            rounded_ratio(weighted, total_weight)
        } else {
            rounded_ratio(plain, counted)
        };
        fields.deadline_missed = self
            .store
            .get(id)
            .and_then(|t| t.deadline)
            .is_some_and(|d| fields.early_finish > d);
        Some(fields)
    }

    /// Duration weight of `id`: its own scheduling duration for a leaf, the
    /// sum over its leaves otherwise.
    pub fn weight(&self, id: TaskId) -> u64 {
        self.store
            .leaves_of(id)
            .into_iter()
            .filter_map(|leaf| self.store.get(leaf))
            .map(|t| u64::from(t.effective_duration()))
            .sum()
    }
}

/// `round(num / den)` as a percentage, half rounding up.
fn rounded_ratio(num: u64, den: u64) -> u8 {
    if den == 0 {
        return 0;
    }
    let value = (num + den / 2) / den;
    value.min(100) as u8
}
