//! Track-and-field meet scheduling.
//!
//! Turns a meet's entries into a timetable: entries are grouped into
//! schedulable event groups, the groups become a constraint model on a
//! slot axis, and a lexicographic optimizer places them. An independent
//! validator re-checks any schedule, including hand-edited ones.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Category`, `EventKind`, `Event`,
//!   `Participant`, `EventGroup`, `VenueResource`, `SchedulingResult`
//! - **`grouping`**: Entry parsing, tier bucketing, capacity packing,
//!   smart unmerge and the duration policy
//! - **`cp`**: Solver-agnostic constraint model, the `CpSolver` backend
//!   trait with a branch-and-bound implementation, and the model builder
//! - **`scheduler`**: Multi-phase optimizer, KPIs and the `MeetScheduler`
//!   facade
//! - **`validation`**: Hard-constraint checks with structured diagnostics
//! - **`overview`**: Event overview CSV export and re-import
//! - **`config`**: `MeetConfig`, TOML loading
//!
//! # Pipeline
//!
//! ```text
//! EntryRecord ─▶ GroupingEngine ─▶ EventGroup ─▶ MeetModelBuilder ─▶ CpModel
//!                                                                      │
//!      ValidationReport ◀─ validate_schedule ◀─ SchedulingResult ◀─ MultiPhaseOptimizer
//! ```
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"
//! - Baptiste, Le Pape & Nuijten (2001), "Constraint-Based Scheduling"

pub mod config;
pub mod cp;
pub mod error;
pub mod grouping;
pub mod models;
pub mod overview;
pub mod scheduler;
pub mod validation;

pub use config::MeetConfig;
pub use error::{MeetError, MeetResult};
pub use models::{EventGroup, Participant, ScheduledGroup, SchedulingResult};
pub use scheduler::{MeetScheduler, ScheduleOutcome, ScheduleRequest};
pub use validation::{validate_schedule, Diagnostic, DiagnosticKind, ValidationReport};
