//! Incremental critical-path scheduling core for hierarchical project plans.
//!
//! Maintains a forest of tasks with precedence dependencies and keeps the
//! critical path method (CPM) results current as the plan is edited: early
//! and late dates, total and free slack, critical-path membership, and the
//! rolled-up dates and progress of summary tasks.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Task`, `TaskPatch`, `Dependency`,
//!   `TaskConstraint`, `ComputedFields`, `TaskView`, `Delta`, `WorkCalendar`
//! - **`store`**: Task tree with dense sibling ranks
//! - **`graph`**: Dependency edges, cycle detection, topological order
//! - **`propagation`**: CPM forward/backward passes over a dirty closure
//! - **`rollup`**: Summary task aggregation
//! - **`engine`**: `ScheduleEngine` facade and `ScheduleOptions`
//! - **`validation`**: Input integrity checks for persisted records
//! - **`summary`**: Project-level indicators
//!
//! # Architecture
//!
//! The crate is a pure in-memory library: no I/O, no threads, no global
//! state. Rendering, persistence and transport sit outside and talk to
//! [`ScheduleEngine`] through records in and deltas out.
//!
//! # References
//!
//! - Kelley & Walker (1959), "Critical-Path Planning and Scheduling"
//! - Moder, Phillips & Davis (1983), "Project Management with CPM, PERT and
//!   Precedence Diagramming"
//! - Cormen et al. (2009), "Introduction to Algorithms", Ch. 22

pub mod engine;
pub mod error;
pub mod graph;
pub mod models;
pub mod propagation;
pub mod rollup;
pub mod store;
pub mod summary;
pub mod validation;

pub use engine::{BulkUpdate, ScheduleEngine, ScheduleOptions, SinkAnchor};
pub use error::{EngineError, GraphError, Result, StructuralError};
pub use store::CascadePolicy;
