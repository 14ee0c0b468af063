//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::models::Day;

/// Where the backward pass anchors tasks without successors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkAnchor {
    /// Each sink's late finish is its own early finish.
    #[default]
    OwnFinish,
    /// Every sink's late finish is the latest early finish in the project.
    /// Any edit may move that date, so recomputes cover every task.
    ProjectFinish,
}

/// Project-level scheduling parameters.
///
/// # Examples
///
/// ```
/// use gantt_core::engine::{ScheduleOptions, SinkAnchor};
///
/// let opts = ScheduleOptions::new()
///     .with_start(5)
///     .with_deadline(60)
///     .with_sink_anchor(SinkAnchor::ProjectFinish);
/// assert_eq!(opts.project_deadline, Some(60));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleOptions {
    /// Earliest day any task without predecessors may start.
    pub project_start: Day,
    /// Latest finish for every task. `None` = anchor per `sink_anchor`.
    pub project_deadline: Option<Day>,
    /// Backward-pass anchor when no deadline is set.
    pub sink_anchor: SinkAnchor,
}

impl ScheduleOptions {
    /// Options starting on day 0 with no deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the project start day.
    pub fn with_start(mut self, project_start: Day) -> Self {
        self.project_start = project_start;
        self
    }

    /// Sets the project deadline.
    pub fn with_deadline(mut self, deadline: Day) -> Self {
        self.project_deadline = Some(deadline);
        self
    }

    /// Sets the sink anchor.
    pub fn with_sink_anchor(mut self, anchor: SinkAnchor) -> Self {
        self.sink_anchor = anchor;
        self
    }

    /// Whether every recompute must cover the whole project.
    pub fn anchors_globally(&self) -> bool {
        self.project_deadline.is_none() && self.sink_anchor == SinkAnchor::ProjectFinish
    }
}
