//! Task date constraints.
//!
//! A constraint is a caller-imposed date restriction that can override
//! dependency-derived dates.
//!
//! | Constraint | Forward pass | Backward pass | Violation when |
//! |------------|--------------|---------------|----------------|
//! | `AsSoonAsPossible` | - | - | never |
//! | `AsLateAsPossible` | - | - (shifts scheduled dates) | never |
//! | `StartNoEarlierThan(d)` | `ES ≥ d` | - | never |
//! | `FinishNoLaterThan(d)` | - | `LF ≤ d` | `EF > d` |
//! | `MustStartOn(d)` | `ES = d` | `LS = d` | predecessors need later |
//! | `MustFinishOn(d)` | `EF = d` | `LF = d` | predecessors need later |
//!
//! Hard constraints (`MustStartOn`, `MustFinishOn`) always win over
//! dependencies. A conflict sets `constraint_violated` on the task instead
//! of rejecting the edit.
//!
//! # Reference
//! Microsoft Project scheduling model; PMI (2017), "PMBOK Guide", §6.5

use serde::{Deserialize, Serialize};

use super::Day;

/// Date constraint on a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "date")]
pub enum TaskConstraint {
    /// Start as early as dependencies allow.
    #[default]
    AsSoonAsPossible,
    /// Start as late as successors allow.
    AsLateAsPossible,
    /// Start on or after the date.
    StartNoEarlierThan(Day),
    /// Finish on or before the date.
    FinishNoLaterThan(Day),
    /// Start exactly on the date.
    MustStartOn(Day),
    /// Finish exactly on the date.
    MustFinishOn(Day),
}

impl TaskConstraint {
    /// The constraint date, if the variant carries one.
    pub fn date(&self) -> Option<Day> {
        match *self {
            Self::AsSoonAsPossible | Self::AsLateAsPossible => None,
            Self::StartNoEarlierThan(d)
            | Self::FinishNoLaterThan(d)
            | Self::MustStartOn(d)
            | Self::MustFinishOn(d) => Some(d),
        }
    }

    /// Short display label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::AsSoonAsPossible => "ASAP",
            Self::AsLateAsPossible => "ALAP",
            Self::StartNoEarlierThan(_) => "SNET",
            Self::FinishNoLaterThan(_) => "FNLT",
            Self::MustStartOn(_) => "MSO",
            Self::MustFinishOn(_) => "MFO",
        }
    }
}
