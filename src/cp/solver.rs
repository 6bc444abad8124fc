//! Solver capability and the default branch-and-bound backend.
//!
//! # Algorithm
//!
//! Depth-first schedule generation: at every node each eligible interval
//! (all predecessors placed) gets its earliest feasible start, filling
//! holes between placed intervals. Only intervals that could start before
//! the earliest possible completion (plus the largest gap or delay) are
//! branched on; some optimal schedule always starts one of them next at
//! its earliest start.
//!
//! Nodes are pruned by deadlines and, when minimizing, by lower bounds:
//! placed ends, earliest start plus chain tails, and per-resource load.
//! Runs are node-limited; when a run hits its limit the search restarts
//! with randomized tie-breaking, a larger limit and the incumbent kept.
//! A run that finishes under its limit proves its result.
//!
//! Max-min objectives are solved by binary search on the gap, each probe
//! a feasibility search with the gap applied as a no-overlap separation.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

use super::model::{
    CpConstraint, CpModel, CpSolution, IntervalSolution, Objective, SolveRequest, SolveStatus,
};

/// A constraint solver backend.
pub trait CpSolver {
    /// Solves one request within its time budget.
    fn solve(&self, request: &SolveRequest<'_>) -> CpSolution;
}

/// Default backend: schedule-generation branch and bound.
#[derive(Debug, Clone)]
pub struct BranchAndBoundSolver {
    initial_node_limit: u64,
}

impl BranchAndBoundSolver {
    /// Creates a solver with default limits.
    pub fn new() -> Self {
        Self {
            initial_node_limit: 4_096,
        }
    }

    /// Sets the node limit of the first run; later runs double it.
    pub fn with_initial_node_limit(mut self, limit: u64) -> Self {
        self.initial_node_limit = limit.max(1);
        self
    }
}

impl Default for BranchAndBoundSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl CpSolver for BranchAndBoundSolver {
    fn solve(&self, request: &SolveRequest<'_>) -> CpSolution {
        let started = Instant::now();
        let deadline = started + request.time_limit;

        let solution = match &request.objective {
            Objective::MaximizeMinGap(sets) => self.maximize_min_gap(request, sets, deadline),
            objective => {
                let Some(problem) = Problem::compile(request.model, request.all_constraints())
                else {
                    return CpSolution::empty(SolveStatus::Infeasible, 0, started.elapsed());
                };
                let goal = match objective {
                    Objective::MinimizeMaxEnd(names) => {
                        Goal::Minimize(problem.membership(names))
                    }
                    _ => Goal::Satisfy,
                };
                let hint = request.hint.as_ref().and_then(|h| problem.assignment_from(h));
                let outcome = self.search(&problem, &goal, hint, deadline, request.seed);
                let status = match (&outcome.best, outcome.proven) {
                    (Some(_), true) => SolveStatus::Optimal,
                    (Some(_), false) => SolveStatus::Feasible,
                    (None, true) => SolveStatus::Infeasible,
                    (None, false) => SolveStatus::Unknown,
                };
                let status = match (&goal, status) {
                    (Goal::Satisfy, SolveStatus::Feasible) => SolveStatus::Optimal,
                    (_, s) => s,
                };
                problem.to_solution(status, outcome.best, outcome.nodes, objective)
            }
        };

        let solution = CpSolution {
            elapsed: started.elapsed(),
            ..solution
        };
        debug!(
            model = %request.model.name,
            status = ?solution.status,
            value = ?solution.objective_value,
            nodes = solution.nodes,
            elapsed_ms = solution.elapsed.as_millis() as u64,
            "solve finished"
        );
        solution
    }
}

impl BranchAndBoundSolver {
    fn search(
        &self,
        problem: &Problem,
        goal: &Goal,
        hint: Option<Vec<i64>>,
        deadline: Instant,
        seed: u64,
    ) -> SearchOutcome {
        let mut search = Search::new(problem, goal, deadline);
        if let Some(starts) = hint.filter(|s| problem.is_feasible(s)) {
            search.offer(starts);
            if matches!(goal, Goal::Satisfy) {
                return SearchOutcome {
                    best: search.best,
                    proven: true,
                    nodes: 0,
                };
            }
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut limit = self.initial_node_limit;
        let mut randomize = false;
        let proven = loop {
            let finished = search.run(limit, if randomize { Some(&mut rng) } else { None });
            if finished {
                break true;
            }
            if matches!(goal, Goal::Satisfy) && search.best.is_some() {
                break true;
            }
            if Instant::now() >= deadline {
                break false;
            }
            randomize = true;
            limit = limit.saturating_mul(2);
        };

        SearchOutcome {
            best: search.best,
            proven,
            nodes: search.total_nodes,
        }
    }

    fn maximize_min_gap(
        &self,
        request: &SolveRequest<'_>,
        sets: &[Vec<String>],
        deadline: Instant,
    ) -> CpSolution {
        let objective = Objective::MaximizeMinGap(sets.to_vec());
        let Some(base) = Problem::compile(request.model, request.all_constraints()) else {
            return CpSolution::empty(SolveStatus::Infeasible, 0, Duration::ZERO);
        };
        let mut nodes = 0;

        let mut incumbent = request
            .hint
            .as_ref()
            .and_then(|h| base.assignment_from(h))
            .filter(|s| base.is_feasible(s));
        if incumbent.is_none() {
            let outcome = self.search(&base, &Goal::Satisfy, None, deadline, request.seed);
            nodes += outcome.nodes;
            match outcome.best {
                Some(starts) => incumbent = Some(starts),
                None => {
                    let status = if outcome.proven {
                        SolveStatus::Infeasible
                    } else {
                        SolveStatus::Unknown
                    };
                    return CpSolution::empty(status, nodes, Duration::ZERO);
                }
            }
        }
        let Some(mut best) = incumbent else {
            return CpSolution::empty(SolveStatus::Unknown, nodes, Duration::ZERO);
        };

        let Some(mut low) = base.min_gap(sets, &best) else {
            return base.to_solution(SolveStatus::Optimal, Some(best), nodes, &objective);
        };
        let mut high = request.model.horizon;
        let mut proven = true;

        while low < high {
            let now = Instant::now();
            if now >= deadline {
                proven = false;
                break;
            }
            let mid = low + (high - low + 1) / 2;
            let probes_left = (64 - (high - low).leading_zeros()).max(1);
            let probe_deadline = now + (deadline - now) / probes_left;

            let separations: Vec<CpConstraint> = sets
                .iter()
                .filter(|s| s.len() > 1)
                .map(|s| CpConstraint::NoOverlap {
                    intervals: s.clone(),
                    min_gap: mid,
                })
                .collect();
            let Some(probe) = Problem::compile(
                request.model,
                request.all_constraints().chain(separations.iter()),
            ) else {
                high = mid - 1;
                continue;
            };
            let outcome = self.search(&probe, &Goal::Satisfy, None, probe_deadline, request.seed);
            nodes += outcome.nodes;
            match outcome.best {
                Some(starts) => {
                    low = base.min_gap(sets, &starts).unwrap_or(mid).max(mid);
                    best = starts;
                }
                None => {
                    if !outcome.proven {
                        proven = false;
                    }
                    high = mid - 1;
                }
            }
        }

        let status = if proven {
            SolveStatus::Optimal
        } else {
            SolveStatus::Feasible
        };
        base.to_solution(status, Some(best), nodes, &objective)
    }
}

/// What the search is after.
enum Goal {
    Satisfy,
    /// Minimize max end over flagged intervals.
    Minimize(Vec<bool>),
}

struct SearchOutcome {
    best: Option<Vec<i64>>,
    proven: bool,
    nodes: u64,
}

/// A no-overlap set in index form.
#[derive(Debug, Clone)]
struct Resource {
    members: Vec<usize>,
    gap: i64,
}

/// A model compiled to indices with propagated start windows.
#[derive(Debug, Clone)]
struct Problem {
    names: Vec<String>,
    index: HashMap<String, usize>,
    duration: Vec<i64>,
    earliest: Vec<i64>,
    latest: Vec<i64>,
    resources: Vec<Resource>,
    item_resources: Vec<Vec<usize>>,
    preds: Vec<Vec<(usize, i64)>>,
    succs: Vec<Vec<(usize, i64)>>,
    topo: Vec<usize>,
    /// Largest separation any constraint imposes.
    max_separation: i64,
}

impl Problem {
    /// Compiles a model. `None` when trivially infeasible.
    fn compile<'c>(
        model: &CpModel,
        constraints: impl Iterator<Item = &'c CpConstraint>,
    ) -> Option<Problem> {
        let n = model.interval_count();
        let names: Vec<String> = model.intervals().iter().map(|v| v.name.clone()).collect();
        let index: HashMap<String, usize> =
            names.iter().enumerate().map(|(i, n)| (n.clone(), i)).collect();
        let duration: Vec<i64> = model.intervals().iter().map(|v| v.duration).collect();
        let mut earliest: Vec<i64> = model.intervals().iter().map(|v| v.start_min.max(0)).collect();
        let mut latest: Vec<i64> = model
            .intervals()
            .iter()
            .map(|v| v.latest_start().min(model.horizon - v.duration))
            .collect();

        let mut resources = Vec::new();
        let mut item_resources = vec![Vec::new(); n];
        let mut preds = vec![Vec::new(); n];
        let mut succs = vec![Vec::new(); n];
        let mut max_separation = 0;
        let lookup = |names: &[String]| -> Vec<usize> {
            let mut ids: Vec<usize> = names.iter().filter_map(|n| index.get(n).copied()).collect();
            ids.sort_unstable();
            ids.dedup();
            ids
        };

        for constraint in constraints {
            match constraint {
                CpConstraint::NoOverlap { intervals, min_gap } => {
                    let members = lookup(intervals);
                    if members.len() < 2 {
                        continue;
                    }
                    let gap = (*min_gap).max(0);
                    max_separation = max_separation.max(gap);
                    for &m in &members {
                        item_resources[m].push(resources.len());
                    }
                    resources.push(Resource { members, gap });
                }
                CpConstraint::Precedence {
                    before,
                    after,
                    min_delay,
                } => {
                    let (Some(&b), Some(&a)) = (index.get(before), index.get(after)) else {
                        continue;
                    };
                    if a == b {
                        return None;
                    }
                    max_separation = max_separation.max(*min_delay);
                    succs[b].push((a, *min_delay));
                    preds[a].push((b, *min_delay));
                }
                CpConstraint::EndBefore { intervals, end_max } => {
                    for i in lookup(intervals) {
                        latest[i] = latest[i].min(end_max - duration[i]);
                    }
                }
            }
        }

        let topo = topological_order(&preds, &succs)?;
        for &b in &topo {
            for &(p, delay) in &preds[b] {
                earliest[b] = earliest[b].max(earliest[p] + duration[p] + delay);
            }
        }
        for &a in topo.iter().rev() {
            for &(s, delay) in &succs[a] {
                latest[a] = latest[a].min(latest[s] - duration[a] - delay);
            }
        }
        if (0..n).any(|i| earliest[i] > latest[i]) {
            return None;
        }

        Some(Problem {
            names,
            index,
            duration,
            earliest,
            latest,
            resources,
            item_resources,
            preds,
            succs,
            topo,
            max_separation,
        })
    }

    fn len(&self) -> usize {
        self.names.len()
    }

    /// Flags for the named intervals; all when `names` is empty.
    fn membership(&self, names: &[String]) -> Vec<bool> {
        if names.is_empty() {
            return vec![true; self.len()];
        }
        let mut flags = vec![false; self.len()];
        for name in names {
            if let Some(&i) = self.index.get(name) {
                flags[i] = true;
            }
        }
        flags
    }

    fn assignment_from(&self, starts: &HashMap<String, i64>) -> Option<Vec<i64>> {
        self.names.iter().map(|n| starts.get(n).copied()).collect()
    }

    fn is_feasible(&self, starts: &[i64]) -> bool {
        if starts.len() != self.len() {
            return false;
        }
        let in_window = (0..self.len())
            .all(|i| starts[i] >= self.earliest[i] && starts[i] <= self.latest[i]);
        let ordered = (0..self.len()).all(|b| {
            self.preds[b]
                .iter()
                .all(|&(p, delay)| starts[p] + self.duration[p] + delay <= starts[b])
        });
        let separated = self.resources.iter().all(|r| {
            r.members.iter().enumerate().all(|(k, &x)| {
                r.members[k + 1..].iter().all(|&y| {
                    starts[x] + self.duration[x] + r.gap <= starts[y]
                        || starts[y] + self.duration[y] + r.gap <= starts[x]
                })
            })
        });
        in_window && ordered && separated
    }

    fn max_end(&self, flags: &[bool], starts: &[i64]) -> i64 {
        (0..self.len())
            .filter(|&i| flags[i])
            .map(|i| starts[i] + self.duration[i])
            .max()
            .unwrap_or(0)
    }

    /// Smallest gap between consecutive members of any set.
    fn min_gap(&self, sets: &[Vec<String>], starts: &[i64]) -> Option<i64> {
        let mut best: Option<i64> = None;
        for set in sets {
            let mut windows: Vec<(i64, i64)> = set
                .iter()
                .filter_map(|n| self.index.get(n))
                .map(|&i| (starts[i], starts[i] + self.duration[i]))
                .collect();
            windows.sort_unstable();
            for pair in windows.windows(2) {
                let gap = pair[1].0 - pair[0].1;
                best = Some(best.map_or(gap, |b| b.min(gap)));
            }
        }
        best
    }

    /// Longest chain from each interval's end to the end of a flagged
    /// interval reachable through precedences.
    fn tails(&self, flags: &[bool]) -> Vec<Option<i64>> {
        let mut tail: Vec<Option<i64>> = vec![None; self.len()];
        for &a in self.topo.iter().rev() {
            let mut best = if flags[a] { Some(0) } else { None };
            for &(s, delay) in &self.succs[a] {
                if let Some(q) = tail[s] {
                    let via = delay + self.duration[s] + q;
                    best = Some(best.map_or(via, |b: i64| b.max(via)));
                }
            }
            tail[a] = best;
        }
        tail
    }

    fn to_solution(
        &self,
        status: SolveStatus,
        starts: Option<Vec<i64>>,
        nodes: u64,
        objective: &Objective,
    ) -> CpSolution {
        let Some(starts) = starts else {
            return CpSolution::empty(status, nodes, Duration::ZERO);
        };
        let intervals: HashMap<String, IntervalSolution> = self
            .names
            .iter()
            .enumerate()
            .map(|(i, n)| {
                let sol = IntervalSolution {
                    start: starts[i],
                    end: starts[i] + self.duration[i],
                };
                (n.clone(), sol)
            })
            .collect();
        let objective_value = match objective {
            Objective::Satisfy => None,
            Objective::MinimizeMaxEnd(names) => {
                Some(self.max_end(&self.membership(names), &starts))
            }
            Objective::MaximizeMinGap(sets) => self.min_gap(sets, &starts),
        };
        CpSolution {
            status,
            intervals,
            objective_value,
            nodes,
            elapsed: Duration::ZERO,
        }
    }
}

/// Kahn's algorithm. `None` on a cycle.
fn topological_order(preds: &[Vec<(usize, i64)>], succs: &[Vec<(usize, i64)>]) -> Option<Vec<usize>> {
    let mut pending: Vec<usize> = preds.iter().map(Vec::len).collect();
    let mut ready: Vec<usize> = (0..preds.len()).filter(|&i| pending[i] == 0).collect();
    let mut order = Vec::with_capacity(preds.len());
    while let Some(i) = ready.pop() {
        order.push(i);
        for &(s, _) in &succs[i] {
            pending[s] -= 1;
            if pending[s] == 0 {
                ready.push(s);
            }
        }
    }
    (order.len() == preds.len()).then_some(order)
}

/// Depth-first search state, reused across restarts.
struct Search<'p> {
    problem: &'p Problem,
    flags: Vec<bool>,
    tails: Vec<Option<i64>>,
    minimize: bool,
    start: Vec<Option<i64>>,
    pending_preds: Vec<usize>,
    placed: usize,
    best: Option<Vec<i64>>,
    best_value: i64,
    deadline: Instant,
    nodes: u64,
    total_nodes: u64,
    limit: u64,
    aborted: bool,
}

impl<'p> Search<'p> {
    fn new(problem: &'p Problem, goal: &Goal, deadline: Instant) -> Self {
        let (flags, minimize) = match goal {
            Goal::Satisfy => (vec![false; problem.len()], false),
            Goal::Minimize(flags) => (flags.clone(), true),
        };
        let tails = problem.tails(&flags);
        Self {
            problem,
            flags,
            tails,
            minimize,
            start: vec![None; problem.len()],
            pending_preds: problem.preds.iter().map(Vec::len).collect(),
            placed: 0,
            best: None,
            best_value: i64::MAX,
            deadline,
            nodes: 0,
            total_nodes: 0,
            limit: 0,
            aborted: false,
        }
    }

    fn offer(&mut self, starts: Vec<i64>) {
        let value = if self.minimize {
            self.problem.max_end(&self.flags, &starts)
        } else {
            0
        };
        if self.best.is_none() || value < self.best_value {
            self.best_value = value;
            self.best = Some(starts);
        }
    }

    /// One node-limited run. Returns whether it finished under the limit.
    fn run(&mut self, limit: u64, rng: Option<&mut StdRng>) -> bool {
        self.nodes = 0;
        self.limit = limit;
        self.aborted = false;
        self.dfs(rng);
        !self.aborted
    }

    fn done(&self) -> bool {
        self.aborted || (!self.minimize && self.best.is_some())
    }

    fn dfs(&mut self, mut rng: Option<&mut StdRng>) {
        self.nodes += 1;
        self.total_nodes += 1;
        if self.nodes > self.limit || (self.nodes % 128 == 0 && Instant::now() >= self.deadline) {
            self.aborted = true;
            return;
        }

        let p = self.problem;
        if self.placed == p.len() {
            let starts: Vec<i64> = self.start.iter().map(|s| s.unwrap_or(0)).collect();
            self.offer(starts);
            return;
        }

        let mut candidates: Vec<(usize, i64)> = Vec::new();
        for x in 0..p.len() {
            if self.start[x].is_none() && self.pending_preds[x] == 0 {
                let est = self.earliest_start(x);
                if est > p.latest[x] {
                    return;
                }
                candidates.push((x, est));
            }
        }

        if self.minimize && self.best.is_some() && self.lower_bound(&candidates) >= self.best_value {
            return;
        }

        let completion = candidates
            .iter()
            .map(|&(x, est)| est + p.duration[x])
            .min()
            .unwrap_or(0);
        candidates.retain(|&(_, est)| est < completion + p.max_separation);

        match rng.as_deref_mut() {
            Some(r) => {
                candidates.shuffle(r);
                candidates.sort_by_key(|&(_, est)| est);
            }
            None => candidates.sort_by_key(|&(x, est)| {
                (est, std::cmp::Reverse(self.tails[x].unwrap_or(-1)), x)
            }),
        }

        for (x, est) in candidates {
            self.place(x, est);
            self.dfs(rng.as_deref_mut());
            self.unplace(x);
            if self.done() {
                return;
            }
        }
    }

    fn place(&mut self, x: usize, start: i64) {
        self.start[x] = Some(start);
        self.placed += 1;
        for &(s, _) in &self.problem.succs[x] {
            self.pending_preds[s] -= 1;
        }
    }

    fn unplace(&mut self, x: usize) {
        self.start[x] = None;
        self.placed -= 1;
        for &(s, _) in &self.problem.succs[x] {
            self.pending_preds[s] += 1;
        }
    }

    /// Earliest start of `x` compatible with every placed interval.
    fn earliest_start(&self, x: usize) -> i64 {
        let p = self.problem;
        let mut t = p.earliest[x];
        for &(pred, delay) in &p.preds[x] {
            if let Some(s) = self.start[pred] {
                t = t.max(s + p.duration[pred] + delay);
            }
        }

        let mut forbidden: Vec<(i64, i64)> = Vec::new();
        for &r in &p.item_resources[x] {
            let gap = p.resources[r].gap;
            for &y in &p.resources[r].members {
                if y == x {
                    continue;
                }
                if let Some(sy) = self.start[y] {
                    forbidden.push((sy - gap - p.duration[x], sy + p.duration[y] + gap));
                }
            }
        }
        forbidden.sort_unstable();
        for (lo, hi) in forbidden {
            if lo < t && t < hi {
                t = hi;
            }
        }
        t
    }

    fn lower_bound(&self, candidates: &[(usize, i64)]) -> i64 {
        let p = self.problem;
        let mut release: Vec<i64> = p.earliest.clone();
        for &(x, est) in candidates {
            release[x] = est;
        }
        let floor = candidates.iter().map(|&(_, est)| est).min().unwrap_or(0);

        let mut lb = 0;
        for x in 0..p.len() {
            match self.start[x] {
                Some(s) if self.flags[x] => lb = lb.max(s + p.duration[x]),
                Some(_) => {}
                None => {
                    release[x] = release[x].max(floor);
                    if let Some(q) = self.tails[x] {
                        lb = lb.max(release[x] + p.duration[x] + q);
                    }
                }
            }
        }

        for r in &p.resources {
            let open: Vec<usize> = r
                .members
                .iter()
                .copied()
                .filter(|&x| self.start[x].is_none() && self.flags[x])
                .collect();
            if let Some(first) = open.iter().map(|&x| release[x]).min() {
                let work: i64 = open.iter().map(|&x| p.duration[x]).sum();
                let gaps = r.gap * (open.len() as i64 - 1);
                lb = lb.max(first + work + gaps);
            }
        }
        lb
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cp::IntervalVar;

    fn names(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn chain_model(horizon: i64) -> CpModel {
        // a, b share a venue; b, c share a participant; a → c in order.
        let mut m = CpModel::new("test", horizon);
        for (id, d) in [("a", 2), ("b", 3), ("c", 1)] {
            m.add_interval(IntervalVar::new(id, 0, horizon - d, d, horizon));
        }
        m.add_no_overlap(names(&["a", "b"]));
        m.add_no_overlap(names(&["b", "c"]));
        m.add_precedence("a", "c", 0);
        m.set_objective(Objective::MinimizeMaxEnd(Vec::new()));
        m
    }

    #[test]
    fn test_minimize_makespan_optimal() {
        let m = chain_model(20);
        let sol = BranchAndBoundSolver::new().solve(&SolveRequest::new(&m));
        assert_eq!(sol.status, SolveStatus::Optimal);
        // a and b serialize (5), c follows a and avoids b: b[0,3) a[3,5) c[5,6)
        // or a[0,2) c[2,3) b[3,6); both end at 6.
        assert_eq!(sol.objective_value, Some(6));
        let req = SolveRequest::new(&m);
        assert!(req.is_feasible(&sol.starts()));
    }

    #[test]
    fn test_infeasible_horizon() {
        let m = chain_model(5);
        let sol = BranchAndBoundSolver::new().solve(&SolveRequest::new(&m));
        assert_eq!(sol.status, SolveStatus::Infeasible);
        assert!(!sol.is_solution_found());
    }

    #[test]
    fn test_duration_exceeding_horizon_is_infeasible() {
        let mut m = CpModel::new("t", 4);
        m.add_interval(IntervalVar::new("x", 0, -1, 5, 4));
        let sol = BranchAndBoundSolver::new().solve(&SolveRequest::new(&m));
        assert_eq!(sol.status, SolveStatus::Infeasible);
    }

    #[test]
    fn test_precedence_cycle_is_infeasible() {
        let mut m = chain_model(20);
        m.add_precedence("c", "a", 0);
        let sol = BranchAndBoundSolver::new().solve(&SolveRequest::new(&m));
        assert_eq!(sol.status, SolveStatus::Infeasible);
    }

    #[test]
    fn test_subset_objective_with_frozen_bound() {
        let m = chain_model(20);
        let req = SolveRequest::new(&m)
            .with_objective(Objective::MinimizeMaxEnd(names(&["b"])))
            .with_frozen(vec![CpConstraint::EndBefore {
                intervals: names(&["a", "b", "c"]),
                end_max: 6,
            }]);
        let sol = BranchAndBoundSolver::new().solve(&req);
        assert_eq!(sol.status, SolveStatus::Optimal);
        assert_eq!(sol.objective_value, Some(3));
        assert!(sol.intervals.values().all(|i| i.end <= 6));
    }

    #[test]
    fn test_precedence_delay_and_deadline() {
        let mut m = CpModel::new("t", 20);
        m.add_interval(IntervalVar::new("x", 0, 18, 2, 20));
        m.add_interval(IntervalVar::new("y", 0, 18, 2, 20));
        m.add_precedence("x", "y", 2);
        m.add_end_before(names(&["y"]), 6);
        m.set_objective(Objective::MinimizeMaxEnd(Vec::new()));
        let sol = BranchAndBoundSolver::new().solve(&SolveRequest::new(&m));
        assert_eq!(sol.status, SolveStatus::Optimal);
        assert_eq!(sol.intervals["y"].start, 4);

        m.add_end_before(names(&["y"]), 5);
        let sol = BranchAndBoundSolver::new().solve(&SolveRequest::new(&m));
        assert_eq!(sol.status, SolveStatus::Infeasible);
    }

    #[test]
    fn test_hole_filling() {
        // p occupies [0,1); q must start at 4 by precedence; r fits in the hole.
        let mut m = CpModel::new("t", 10);
        m.add_interval(IntervalVar::new("p", 0, 9, 1, 10));
        m.add_interval(IntervalVar::new("q", 0, 8, 2, 10));
        m.add_interval(IntervalVar::new("r", 0, 7, 3, 10));
        m.add_precedence("p", "q", 3);
        m.add_no_overlap(names(&["p", "q", "r"]));
        m.set_objective(Objective::MinimizeMaxEnd(Vec::new()));
        let sol = BranchAndBoundSolver::new().solve(&SolveRequest::new(&m));
        assert_eq!(sol.status, SolveStatus::Optimal);
        assert_eq!(sol.objective_value, Some(6));
    }

    #[test]
    fn test_maximize_min_gap() {
        let mut m = CpModel::new("t", 10);
        for id in ["a", "b"] {
            m.add_interval(IntervalVar::new(id, 0, 8, 2, 10));
        }
        m.add_no_overlap(names(&["a", "b"]));
        let req = SolveRequest::new(&m)
            .with_objective(Objective::MaximizeMinGap(vec![names(&["a", "b"])]));
        let sol = BranchAndBoundSolver::new().solve(&req);
        assert_eq!(sol.status, SolveStatus::Optimal);
        assert_eq!(sol.objective_value, Some(6));
    }

    #[test]
    fn test_maximize_min_gap_respects_frozen_makespan() {
        let mut m = CpModel::new("t", 10);
        for id in ["a", "b", "c"] {
            m.add_interval(IntervalVar::new(id, 0, 8, 2, 10));
        }
        m.add_no_overlap(names(&["a", "b", "c"]));
        let req = SolveRequest::new(&m)
            .with_frozen(vec![CpConstraint::EndBefore {
                intervals: names(&["a", "b", "c"]),
                end_max: 8,
            }])
            .with_objective(Objective::MaximizeMinGap(vec![names(&["a", "c"])]));
        let sol = BranchAndBoundSolver::new().solve(&req);
        assert_eq!(sol.status, SolveStatus::Optimal);
        // a and c at the two ends, b anywhere between: 8 - 2 - 2 = 4.
        assert_eq!(sol.objective_value, Some(4));
    }

    #[test]
    fn test_hint_is_kept_when_feasible() {
        let m = chain_model(20);
        let hint: HashMap<String, i64> =
            [("a", 0), ("c", 2), ("b", 3)].iter().map(|(n, s)| (n.to_string(), *s)).collect();
        let req = SolveRequest::new(&m)
            .with_objective(Objective::Satisfy)
            .with_hint(hint.clone());
        let sol = BranchAndBoundSolver::new().solve(&req);
        assert_eq!(sol.status, SolveStatus::Optimal);
        assert_eq!(sol.starts(), hint);
    }

    #[test]
    fn test_restarts_reach_same_optimum() {
        let mut m = CpModel::new("t", 40);
        let ids: Vec<String> = (0..8).map(|i| format!("g{i}")).collect();
        for (i, id) in ids.iter().enumerate() {
            let d = 1 + (i as i64 % 3);
            m.add_interval(IntervalVar::new(id, 0, 40 - d, d, 40));
        }
        m.add_no_overlap(ids[..4].to_vec());
        m.add_no_overlap(ids[4..].to_vec());
        m.add_no_overlap(vec![ids[0].clone(), ids[5].clone()]);
        m.set_objective(Objective::MinimizeMaxEnd(Vec::new()));

        let tiny = BranchAndBoundSolver::new().with_initial_node_limit(2);
        let sol = tiny.solve(&SolveRequest::new(&m).with_seed(7));
        let reference = BranchAndBoundSolver::new().solve(&SolveRequest::new(&m));
        assert_eq!(reference.status, SolveStatus::Optimal);
        assert_eq!(sol.objective_value, reference.objective_value);
    }
}
