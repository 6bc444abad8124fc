//! Declarative constraint model.
//!
//! A model is a set of fixed-duration interval variables over an integer
//! slot axis, plus constraints between them. It carries no search state;
//! any [`CpSolver`](super::CpSolver) can solve it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// A fixed-duration interval variable.
///
/// The solver picks `start` in `[start_min, start_max]`; the interval is
/// `[start, start + duration)` and must end by `end_max`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalVar {
    /// Unique name.
    pub name: String,
    /// Earliest start.
    pub start_min: i64,
    /// Latest start.
    pub start_max: i64,
    /// Fixed duration.
    pub duration: i64,
    /// Latest end.
    pub end_max: i64,
}

impl IntervalVar {
    /// Creates an interval variable.
    pub fn new(
        name: impl Into<String>,
        start_min: i64,
        start_max: i64,
        duration: i64,
        end_max: i64,
    ) -> Self {
        Self {
            name: name.into(),
            start_min,
            start_max,
            duration,
            end_max,
        }
    }

    /// Latest start honoring both `start_max` and `end_max`.
    pub fn latest_start(&self) -> i64 {
        self.start_max.min(self.end_max - self.duration)
    }
}

/// A hard constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpConstraint {
    /// No two members overlap; consecutive members are at least `min_gap` apart.
    NoOverlap { intervals: Vec<String>, min_gap: i64 },
    /// `start(after) >= end(before) + min_delay`.
    Precedence {
        before: String,
        after: String,
        min_delay: i64,
    },
    /// Every member ends by `end_max`.
    EndBefore { intervals: Vec<String>, end_max: i64 },
}

impl CpConstraint {
    /// Whether an assignment of start slots satisfies this constraint.
    ///
    /// Intervals missing from the assignment are not checked.
    pub fn is_satisfied(&self, model: &CpModel, starts: &HashMap<String, i64>) -> bool {
        let window = |name: &str| -> Option<(i64, i64)> {
            let var = model.interval(name)?;
            let start = *starts.get(name)?;
            Some((start, start + var.duration))
        };
        match self {
            CpConstraint::NoOverlap { intervals, min_gap } => {
                let windows: Vec<(i64, i64)> =
                    intervals.iter().filter_map(|n| window(n)).collect();
                windows.iter().enumerate().all(|(i, a)| {
                    windows[i + 1..]
                        .iter()
                        .all(|b| a.1 + min_gap <= b.0 || b.1 + min_gap <= a.0)
                })
            }
            CpConstraint::Precedence {
                before,
                after,
                min_delay,
            } => match (window(before), window(after)) {
                (Some(b), Some(a)) => b.1 + min_delay <= a.0,
                _ => true,
            },
            CpConstraint::EndBefore { intervals, end_max } => intervals
                .iter()
                .filter_map(|n| window(n))
                .all(|(_, end)| end <= *end_max),
        }
    }
}

/// Optimization objective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Objective {
    /// Any feasible assignment.
    Satisfy,
    /// Minimize the latest end among the named intervals (all if empty).
    MinimizeMaxEnd(Vec<String>),
    /// Maximize the smallest gap between any two intervals of a set,
    /// over all sets.
    MaximizeMinGap(Vec<Vec<String>>),
}

impl Objective {
    /// Objective value of an assignment. `None` for `Satisfy`.
    pub fn evaluate(&self, model: &CpModel, starts: &HashMap<String, i64>) -> Option<i64> {
        let end = |name: &str| -> Option<i64> {
            Some(starts.get(name)? + model.interval(name)?.duration)
        };
        match self {
            Objective::Satisfy => None,
            Objective::MinimizeMaxEnd(names) if names.is_empty() => {
                Some(model.intervals().iter().filter_map(|v| end(&v.name)).max().unwrap_or(0))
            }
            Objective::MinimizeMaxEnd(names) => {
                Some(names.iter().filter_map(|n| end(n)).max().unwrap_or(0))
            }
            Objective::MaximizeMinGap(sets) => {
                let mut best: Option<i64> = None;
                for set in sets {
                    let mut windows: Vec<(i64, i64)> = set
                        .iter()
                        .filter_map(|n| Some((*starts.get(n)?, end(n)?)))
                        .collect();
                    windows.sort_unstable();
                    for pair in windows.windows(2) {
                        let gap = pair[1].0 - pair[0].1;
                        best = Some(best.map_or(gap, |b| b.min(gap)));
                    }
                }
                best
            }
        }
    }

    /// Whether larger values are better.
    pub fn is_maximize(&self) -> bool {
        matches!(self, Objective::MaximizeMinGap(_))
    }
}

/// A constraint model over a slot horizon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CpModel {
    /// Model name.
    pub name: String,
    /// Exclusive upper bound of the slot axis.
    pub horizon: i64,
    intervals: Vec<IntervalVar>,
    index: HashMap<String, usize>,
    constraints: Vec<CpConstraint>,
    objective: Objective,
}

impl CpModel {
    /// Creates an empty model.
    pub fn new(name: impl Into<String>, horizon: i64) -> Self {
        Self {
            name: name.into(),
            horizon,
            intervals: Vec::new(),
            index: HashMap::new(),
            constraints: Vec::new(),
            objective: Objective::Satisfy,
        }
    }

    /// Adds an interval variable. A repeated name replaces the earlier one.
    pub fn add_interval(&mut self, var: IntervalVar) {
        match self.index.get(&var.name) {
            Some(&i) => self.intervals[i] = var,
            None => {
                self.index.insert(var.name.clone(), self.intervals.len());
                self.intervals.push(var);
            }
        }
    }

    /// Adds a no-overlap constraint without gap.
    pub fn add_no_overlap(&mut self, intervals: Vec<String>) {
        self.add_no_overlap_with_gap(intervals, 0);
    }

    /// Adds a no-overlap constraint with a minimum gap.
    pub fn add_no_overlap_with_gap(&mut self, intervals: Vec<String>, min_gap: i64) {
        self.constraints
            .push(CpConstraint::NoOverlap { intervals, min_gap });
    }

    /// Adds `start(after) >= end(before) + min_delay`.
    pub fn add_precedence(
        &mut self,
        before: impl Into<String>,
        after: impl Into<String>,
        min_delay: i64,
    ) {
        self.constraints.push(CpConstraint::Precedence {
            before: before.into(),
            after: after.into(),
            min_delay,
        });
    }

    /// Adds a shared deadline.
    pub fn add_end_before(&mut self, intervals: Vec<String>, end_max: i64) {
        self.constraints
            .push(CpConstraint::EndBefore { intervals, end_max });
    }

    /// Adds any constraint.
    pub fn add_constraint(&mut self, constraint: CpConstraint) {
        self.constraints.push(constraint);
    }

    /// Sets the default objective.
    pub fn set_objective(&mut self, objective: Objective) {
        self.objective = objective;
    }

    /// Interval variables, in insertion order.
    pub fn intervals(&self) -> &[IntervalVar] {
        &self.intervals
    }

    /// Interval by name.
    pub fn interval(&self, name: &str) -> Option<&IntervalVar> {
        self.index.get(name).map(|&i| &self.intervals[i])
    }

    /// Constraints.
    pub fn constraints(&self) -> &[CpConstraint] {
        &self.constraints
    }

    /// Default objective.
    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    /// Number of interval variables.
    pub fn interval_count(&self) -> usize {
        self.intervals.len()
    }

    /// Number of model constraints, excluding per-request frozen ones.
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }
}

/// One solve call: the model plus everything that varies per phase.
///
/// Frozen constraints are passed in explicitly, so a phase's call depends
/// only on its request.
#[derive(Debug, Clone)]
pub struct SolveRequest<'a> {
    /// Model to solve.
    pub model: &'a CpModel,
    /// Extra constraints, typically frozen objective values.
    pub frozen: Vec<CpConstraint>,
    /// Objective for this call.
    pub objective: Objective,
    /// Known assignment to warm-start from.
    pub hint: Option<HashMap<String, i64>>,
    /// Wall-clock budget.
    pub time_limit: Duration,
    /// Seed for randomized search.
    pub seed: u64,
}

impl<'a> SolveRequest<'a> {
    /// Creates a request with the model's objective and a 10 s budget.
    pub fn new(model: &'a CpModel) -> Self {
        Self {
            model,
            frozen: Vec::new(),
            objective: model.objective().clone(),
            hint: None,
            time_limit: Duration::from_secs(10),
            seed: 0,
        }
    }

    /// Replaces the frozen constraints.
    pub fn with_frozen(mut self, frozen: Vec<CpConstraint>) -> Self {
        self.frozen = frozen;
        self
    }

    /// Overrides the model's objective for this call.
    pub fn with_objective(mut self, objective: Objective) -> Self {
        self.objective = objective;
        self
    }

    /// Start slots by interval name to try first. An infeasible hint is
    /// ignored.
    pub fn with_hint(mut self, hint: HashMap<String, i64>) -> Self {
        self.hint = Some(hint);
        self
    }

    /// Wall-clock budget. An optimizing call that runs out of it returns
    /// its best assignment unproven.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = limit;
        self
    }

    /// Seed for tie-breaking in randomized search.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Model constraints followed by frozen ones.
    pub fn all_constraints(&self) -> impl Iterator<Item = &CpConstraint> {
        self.model.constraints().iter().chain(self.frozen.iter())
    }

    /// Whether an assignment places every interval inside its domain and
    /// satisfies every constraint.
    pub fn is_feasible(&self, starts: &HashMap<String, i64>) -> bool {
        let in_domain = self.model.intervals().iter().all(|v| match starts.get(&v.name) {
            Some(&s) => {
                s >= v.start_min && s <= v.latest_start() && s + v.duration <= self.model.horizon
            }
            None => false,
        });
        in_domain
            && self
                .all_constraints()
                .all(|c| c.is_satisfied(self.model, starts))
    }
}

/// Solver outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveStatus {
    /// Best possible value proven.
    Optimal,
    /// Feasible, not proven optimal (budget exhausted).
    Feasible,
    /// Proven to have no solution.
    Infeasible,
    /// No solution found, nothing proven.
    Unknown,
}

/// Placement of one interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalSolution {
    /// First occupied slot.
    pub start: i64,
    /// Slot after the last occupied one.
    pub end: i64,
}

/// Result of a solve call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CpSolution {
    /// Outcome.
    pub status: SolveStatus,
    /// Interval placements (empty without a solution).
    pub intervals: HashMap<String, IntervalSolution>,
    /// Objective value of the returned assignment.
    pub objective_value: Option<i64>,
    /// Search nodes explored.
    pub nodes: u64,
    /// Wall-clock time spent.
    pub elapsed: Duration,
}

impl CpSolution {
    /// A solution without placements.
    pub fn empty(status: SolveStatus, nodes: u64, elapsed: Duration) -> Self {
        Self {
            status,
            intervals: HashMap::new(),
            objective_value: None,
            nodes,
            elapsed,
        }
    }

    /// Whether an assignment is present.
    pub fn is_solution_found(&self) -> bool {
        matches!(self.status, SolveStatus::Optimal | SolveStatus::Feasible)
    }

    /// Start slots by interval name.
    pub fn starts(&self) -> HashMap<String, i64> {
        self.intervals
            .iter()
            .map(|(name, sol)| (name.clone(), sol.start))
            .collect()
    }
}
