//! Constraint model and solver.
//!
//! [`CpModel`] is a solver-agnostic description: fixed-duration interval
//! variables on a slot axis with no-overlap, precedence and deadline
//! constraints. [`CpSolver`] is the capability to solve one
//! [`SolveRequest`] (model, frozen constraints, objective, hint, budget).
//! [`MeetModelBuilder`] turns event groups into a model.

mod builder;
mod model;
mod solver;

pub use builder::{changeover_slots, track_order, MeetModelBuilder, YOUNG_TRACK_AGE};
pub use model::{
    CpConstraint, CpModel, CpSolution, IntervalSolution, IntervalVar, Objective, SolveRequest,
    SolveStatus,
};
pub use solver::{BranchAndBoundSolver, CpSolver};
