//! Multi-phase optimization and the meet scheduling facade.
//!
//! [`MultiPhaseOptimizer`] drives a constraint solver through the
//! lexicographic objective phases. [`MeetScheduler`] runs the whole
//! pipeline from entry records to a [`SchedulingResult`](crate::models::SchedulingResult).
//!
//! # KPI
//!
//! `ScheduleKpi` reports the optimized quantities for a finished result:
//! makespan, per-tier finish, minimum recovery gap and venue utilization.
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 4
//! - Ehrgott (2005), "Multicriteria Optimization", Ch. 5 (lexicographic order)

mod kpi;
mod meet;
mod optimizer;

pub use kpi::ScheduleKpi;
pub use meet::{MeetScheduler, ScheduleOutcome, ScheduleRequest};
pub use optimizer::{
    MultiPhaseOptimizer, OptimizationReport, OptimizedSchedule, Phase, PhaseReport, PhaseWarning,
};
