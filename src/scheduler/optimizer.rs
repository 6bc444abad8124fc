//! Lexicographic multi-phase optimizer.
//!
//! Runs the solver through an ordered list of objectives. Each phase
//! solves under every hard constraint plus the values frozen by earlier
//! phases, then freezes its own value as a new hard constraint:
//!
//! 1. Makespan: latest end over all groups. The domain bound is widened
//!    until a feasible assignment exists or the cap is reached.
//! 2. Youngest tier finish: latest end over groups entirely in tier 0.
//! 3. Next tier finish: same for tier 1.
//! 4. Recovery gap: smallest gap between consecutive groups of any
//!    oldest-tier participant with several events, maximized.
//!
//! A phase that stops on its time budget keeps its best value and the run
//! ends `SolvedPartial`. Only a Phase 1 failure at the cap is an error.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::MeetConfig;
use crate::cp::{CpConstraint, CpModel, CpSolution, CpSolver, MeetModelBuilder, Objective, SolveRequest, SolveStatus};
use crate::error::{MeetError, MeetResult};
use crate::models::{ScheduleStatus, ScheduledGroup};

/// Optimization phases, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Makespan,
    YoungestFinish,
    NextTierFinish,
    RecoveryGap,
}

impl Phase {
    /// All phases in the order they run.
    pub const ALL: [Phase; 4] = [
        Phase::Makespan,
        Phase::YoungestFinish,
        Phase::NextTierFinish,
        Phase::RecoveryGap,
    ];

    /// Phase number, starting at 1.
    pub fn number(self) -> usize {
        match self {
            Phase::Makespan => 1,
            Phase::YoungestFinish => 2,
            Phase::NextTierFinish => 3,
            Phase::RecoveryGap => 4,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Makespan => "makespan",
            Phase::YoungestFinish => "youngest tier finish",
            Phase::NextTierFinish => "next tier finish",
            Phase::RecoveryGap => "recovery gap",
        };
        write!(f, "phase {} ({name})", self.number())
    }
}

/// Outcome of one executed phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseReport {
    pub phase: Phase,
    pub status: SolveStatus,
    /// Value frozen for later phases, in slots.
    pub value: Option<i64>,
    pub elapsed: Duration,
    pub nodes: u64,
}

/// A non-fatal phase problem, typically a time-out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseWarning {
    pub phase: Phase,
    pub message: String,
}

impl fmt::Display for PhaseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.phase, self.message)
    }
}

/// Summary of a full optimizer run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationReport {
    /// Executed phases, in order.
    pub phases: Vec<PhaseReport>,
    /// Phases with nothing to optimize.
    pub skipped: Vec<Phase>,
    pub warnings: Vec<PhaseWarning>,
    pub status: ScheduleStatus,
    /// Domain bound Phase 1 succeeded at.
    pub bound_slots: i64,
}

impl OptimizationReport {
    /// Report of a phase, if it ran.
    pub fn phase(&self, phase: Phase) -> Option<&PhaseReport> {
        self.phases.iter().find(|p| p.phase == phase)
    }

    /// Frozen value of a phase, if it ran and produced one.
    pub fn value(&self, phase: Phase) -> Option<i64> {
        self.phase(phase).and_then(|p| p.value)
    }
}

/// Placements plus the report that produced them.
#[derive(Debug, Clone)]
pub struct OptimizedSchedule {
    pub placements: Vec<ScheduledGroup>,
    pub report: OptimizationReport,
}

/// Drives a [`CpSolver`] through the objective phases.
pub struct MultiPhaseOptimizer<'a, S: CpSolver> {
    solver: &'a S,
    config: &'a MeetConfig,
}

/// Mutable run state threaded through the phases.
struct PhaseRun<'m> {
    model: &'m CpModel,
    frozen: Vec<CpConstraint>,
    best: CpSolution,
    phases: Vec<PhaseReport>,
    skipped: Vec<Phase>,
    warnings: Vec<PhaseWarning>,
}

impl<'a, S: CpSolver> MultiPhaseOptimizer<'a, S> {
    /// Creates an optimizer.
    pub fn new(solver: &'a S, config: &'a MeetConfig) -> Self {
        Self { solver, config }
    }

    /// Runs every phase over the builder's groups.
    ///
    /// # Errors
    ///
    /// `Infeasible` when Phase 1 finds no assignment even at
    /// `max_slots_cap`.
    pub fn optimize(&self, builder: &MeetModelBuilder<'_>) -> MeetResult<OptimizedSchedule> {
        let (model, first) = self.solve_makespan(builder)?;
        let bound_slots = model.horizon;

        let mut run = PhaseRun {
            model: &model,
            frozen: Vec::new(),
            best: first.clone(),
            phases: Vec::new(),
            skipped: Vec::new(),
            warnings: Vec::new(),
        };
        let all: Vec<String> = model.intervals().iter().map(|v| v.name.clone()).collect();
        let makespan = first.objective_value.unwrap_or(bound_slots);
        run.record(Phase::Makespan, &first, Some(makespan));
        run.frozen.push(CpConstraint::EndBefore {
            intervals: all,
            end_max: makespan,
        });

        let tiers = self.config.tier_count();
        for (phase, tier) in [(Phase::YoungestFinish, 0), (Phase::NextTierFinish, 1)] {
            let ids = builder.groups_in_tier(tier);
            if tiers < 2 || tier >= tiers || ids.is_empty() {
                run.skip(phase);
                continue;
            }
            let solution = self.solve_phase(&run, Objective::MinimizeMaxEnd(ids.clone()));
            if let Some(value) = run.accept(phase, solution) {
                run.frozen.push(CpConstraint::EndBefore {
                    intervals: ids,
                    end_max: value,
                });
            }
        }

        let sets = builder.recovery_sets();
        if sets.is_empty() {
            run.skip(Phase::RecoveryGap);
        } else {
            let solution = self.solve_phase(&run, Objective::MaximizeMinGap(sets.clone()));
            if let Some(gap) = run.accept(Phase::RecoveryGap, solution) {
                for intervals in sets {
                    run.frozen.push(CpConstraint::NoOverlap {
                        intervals,
                        min_gap: gap.max(0),
                    });
                }
            }
        }

        let status = if run.warnings.is_empty() {
            ScheduleStatus::Solved
        } else {
            ScheduleStatus::SolvedPartial
        };
        info!(
            ?status,
            bound_slots,
            makespan,
            frozen = run.frozen.len(),
            warnings = run.warnings.len(),
            "optimization finished"
        );

        let placements = builder.decode(&run.best);
        Ok(OptimizedSchedule {
            placements,
            report: OptimizationReport {
                phases: run.phases,
                skipped: run.skipped,
                warnings: run.warnings,
                status,
                bound_slots,
            },
        })
    }

    /// Phase 1 with bound widening.
    fn solve_makespan(&self, builder: &MeetModelBuilder<'_>) -> MeetResult<(CpModel, CpSolution)> {
        let cap = i64::from(self.config.max_slots_cap);
        let step = i64::from(self.config.widen_step_slots.max(1));
        let mut bound = i64::from(self.config.max_slots).min(cap);

        loop {
            let model = builder.build(bound);
            let request = SolveRequest::new(&model)
                .with_objective(Objective::MinimizeMaxEnd(Vec::new()))
                .with_time_limit(self.config.phase_time_limit())
                .with_seed(self.config.solver_seed);
            let solution = self.solver.solve(&request);
            if solution.is_solution_found() {
                return Ok((model, solution));
            }
            if bound >= cap {
                warn!(bound, status = ?solution.status, "no feasible schedule at the bound cap");
                return Err(MeetError::Infeasible {
                    bound_slots: u32::try_from(bound).unwrap_or(u32::MAX),
                    cap_slots: self.config.max_slots_cap,
                });
            }
            let next = (bound + step).min(cap);
            info!(from = bound, to = next, status = ?solution.status, "widening domain bound");
            bound = next;
        }
    }

    fn solve_phase(&self, run: &PhaseRun<'_>, objective: Objective) -> CpSolution {
        let request = SolveRequest::new(run.model)
            .with_frozen(run.frozen.clone())
            .with_objective(objective)
            .with_hint(run.best.starts())
            .with_time_limit(self.config.phase_time_limit())
            .with_seed(self.config.solver_seed);
        self.solver.solve(&request)
    }
}

impl PhaseRun<'_> {
    fn record(&mut self, phase: Phase, solution: &CpSolution, value: Option<i64>) {
        debug!(
            %phase,
            status = ?solution.status,
            ?value,
            nodes = solution.nodes,
            elapsed_ms = solution.elapsed.as_millis() as u64,
            "phase finished"
        );
        if solution.status != SolveStatus::Optimal {
            let message = match value {
                Some(v) => format!("stopped at time limit, keeping best value {v}"),
                None => "no assignment found, previous placements kept".to_string(),
            };
            warn!(%phase, %message, "phase degraded");
            self.warnings.push(PhaseWarning { phase, message });
        }
        self.phases.push(PhaseReport {
            phase,
            status: solution.status,
            value,
            elapsed: solution.elapsed,
            nodes: solution.nodes,
        });
    }

    /// Records a phase and adopts its assignment. Returns the value to freeze.
    fn accept(&mut self, phase: Phase, solution: CpSolution) -> Option<i64> {
        let value = if solution.is_solution_found() {
            solution.objective_value
        } else {
            None
        };
        self.record(phase, &solution, value);
        if solution.is_solution_found() {
            self.best = solution;
        }
        value
    }

    fn skip(&mut self, phase: Phase) {
        debug!(%phase, "phase skipped, nothing to optimize");
        self.skipped.push(phase);
    }
}
