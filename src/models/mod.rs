//! Scheduling domain models.
//!
//! Plain data types shared by the store, the dependency graph, the date
//! propagator and the engine facade. Editable task fields ([`Task`]) and
//! engine-derived fields ([`ComputedFields`]) are deliberately separate
//! types.
//!
//! # Domain Mappings
//!
//! | gantt-core | Construction plan | MS Project |
//! |------------|-------------------|------------|
//! | Task (leaf) | Activity | Task |
//! | Task (with children) | Phase / area | Summary task |
//! | Dependency | Sequencing logic | Link |
//! | TaskConstraint | Contract date | Constraint |

mod calendar;
mod constraint;
mod delta;
mod dependency;
mod schedule;
mod task;

pub use calendar::{day_in_range, Day, WorkCalendar, MAX_DAY_OFFSET};
pub use constraint::TaskConstraint;
pub use delta::{Delta, Field};
pub use dependency::{Dependency, DependencyKind};
pub use schedule::{ComputedFields, TaskView, Violation, ViolationType};
pub use task::{Task, TaskId, TaskPatch, TaskStatus};
