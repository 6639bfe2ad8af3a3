//! Best-improvement local search over 2-opt, relocate and swap moves.
//!
//! Each sweep scores every enabled candidate move, applies the single best
//! strictly-improving one and starts over. Moves that would overload a
//! vehicle are never generated, so every intermediate solution stays
//! feasible and the total cost never increases.

use std::cmp::Ordering;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span, trace};

use crate::evaluator::RouteEvaluator;
use crate::problem::Problem;
use crate::repository::SolutionRepository;
use crate::solution::Solution;
use crate::termination::{StopSignal, Termination};

/// A move must lower the total by more than this to count as improving.
pub const IMPROVEMENT_EPSILON: f64 = 1e-9;

pub const DEFAULT_MAX_ITERATIONS: usize = 1000;

/// Neighbourhoods the search is allowed to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoveSet {
    pub two_opt: bool,
    pub relocate: bool,
    pub swap: bool,
}

impl Default for MoveSet {
    fn default() -> Self {
        Self {
            two_opt: true,
            relocate: true,
            swap: true,
        }
    }
}

/// A route edit, addressed by route index and position.
///
/// The derived order (2-opt, then relocate, then swap, then indices) breaks
/// ties between equally good moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Move {
    /// Reverse `route[from..=to]`.
    TwoOpt { route: usize, from: usize, to: usize },
    /// Remove the customer at `from_position`, then insert it so it ends up
    /// at `to_position` of `to_route`.
    Relocate {
        from_route: usize,
        from_position: usize,
        to_route: usize,
        to_position: usize,
    },
    /// Exchange two customers on different routes.
    Swap {
        first_route: usize,
        first_position: usize,
        second_route: usize,
        second_position: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    /// Change in total cost; negative is better.
    pub delta: f64,
    pub action: Move,
}

impl Candidate {
    fn rank(&self, other: &Self) -> Ordering {
        self.delta
            .total_cmp(&other.delta)
            .then(self.action.cmp(&other.action))
    }
}

/// Outcome of one improvement run.
#[derive(Debug, Clone)]
pub struct SearchReport {
    pub solution: Solution,
    pub termination: Termination,
    /// Number of moves applied.
    pub iterations: usize,
}

enum Phase {
    Scanning,
    FoundImprovingMove(Candidate),
    Applied,
    Done(Termination),
}

#[derive(Debug, Clone)]
pub struct LocalSearch<'a> {
    problem: &'a Problem,
    moves: MoveSet,
    max_iterations: usize,
    parallel: bool,
}

impl<'a> LocalSearch<'a> {
    pub fn new(problem: &'a Problem) -> Self {
        Self {
            problem,
            moves: MoveSet::default(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            parallel: false,
        }
    }

    pub fn with_moves(mut self, moves: MoveSet) -> Self {
        self.moves = moves;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Scan source routes on the rayon pool. Picks the same move as the
    /// sequential scan.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Improve `solution` until convergence, the iteration cap, or `stop`.
    pub fn run(
        &self,
        solution: Solution,
        repository: &SolutionRepository,
        stop: &StopSignal,
    ) -> SearchReport {
        self.run_with_observer(solution, repository, stop, |_, _| {})
    }

    /// Like [`run`](Self::run), calling `observer` with the move count and
    /// the solution after every applied move.
    pub fn run_with_observer<F>(
        &self,
        mut solution: Solution,
        repository: &SolutionRepository,
        stop: &StopSignal,
        mut observer: F,
    ) -> SearchReport
    where
        F: FnMut(usize, &Solution),
    {
        let span = debug_span!("local_search", parallel = self.parallel);
        let _guard = span.enter();

        repository.record(&solution);

        let mut iterations = 0;
        let mut phase = Phase::Scanning;
        let termination = loop {
            phase = match phase {
                Phase::Scanning => {
                    if stop.should_stop() {
                        Phase::Done(Termination::Cancelled)
                    } else {
                        match self.best_move(&solution) {
                            None => Phase::Done(Termination::Converged),
                            Some(_) if iterations >= self.max_iterations => {
                                Phase::Done(Termination::CapReached)
                            }
                            Some(candidate) => Phase::FoundImprovingMove(candidate),
                        }
                    }
                }
                Phase::FoundImprovingMove(candidate) => {
                    let before = solution.total_cost();
                    self.apply(&mut solution, candidate.action);
                    iterations += 1;

                    debug!(
                        iteration = iterations,
                        action = ?candidate.action,
                        delta = candidate.delta,
                        cost = solution.total_cost(),
                        "move applied"
                    );
                    debug_assert!(solution.is_feasible());
                    debug_assert!(solution.total_cost() <= before + IMPROVEMENT_EPSILON);

                    Phase::Applied
                }
                Phase::Applied => {
                    repository.record(&solution);
                    observer(iterations, &solution);
                    Phase::Scanning
                }
                Phase::Done(termination) => break termination,
            };
        };

        debug!(?termination, iterations, cost = solution.total_cost(), "local search stopped");

        SearchReport {
            solution,
            termination,
            iterations,
        }
    }

    /// The best strictly-improving feasible move, if any.
    pub fn best_move(&self, solution: &Solution) -> Option<Candidate> {
        let routes = solution.routes().len();
        let best = if self.parallel {
            (0..routes)
                .into_par_iter()
                .filter_map(|source| self.scan_route(solution, source))
                .min_by(Candidate::rank)
        } else {
            (0..routes)
                .filter_map(|source| self.scan_route(solution, source))
                .min_by(Candidate::rank)
        };

        trace!(?best, "scan finished");
        best
    }

    /// Best improving move whose first (or only) route is `source`.
    fn scan_route(&self, solution: &Solution, source: usize) -> Option<Candidate> {
        let problem = self.problem;
        let evaluator = RouteEvaluator::new(problem.matrix());
        let routes = solution.routes();
        let route = &routes[source];
        let visits = route.visits();

        let mut best: Option<Candidate> = None;
        let mut consider = |delta: f64, action: Move| {
            if delta >= -IMPROVEMENT_EPSILON {
                return;
            }
            let candidate = Candidate { delta, action };
            if best
                .as_ref()
                .is_none_or(|current| candidate.rank(current) == Ordering::Less)
            {
                best = Some(candidate);
            }
        };

        if self.moves.two_opt {
            for from in 0..visits.len().saturating_sub(1) {
                for (to, delta) in evaluator.two_opt_deltas(visits, from) {
                    consider(delta, Move::TwoOpt { route: source, from, to });
                }
            }
        }

        if self.moves.relocate {
            for (from_position, &customer) in visits.iter().enumerate() {
                let demand = problem.demand(customer);
                let removal = evaluator.removal_delta(visits, from_position);

                let mut reduced = visits.to_vec();
                reduced.remove(from_position);
                for to_position in (0..=reduced.len()).filter(|&p| p != from_position) {
                    let delta = removal + evaluator.insertion_delta(&reduced, to_position, customer);
                    consider(
                        delta,
                        Move::Relocate {
                            from_route: source,
                            from_position,
                            to_route: source,
                            to_position,
                        },
                    );
                }

                for (target, other) in routes.iter().enumerate() {
                    if target == source {
                        continue;
                    }
                    let fits = other
                        .load()
                        .checked_add(demand)
                        .is_some_and(|load| load <= problem.capacity(target));
                    if !fits {
                        continue;
                    }
                    for to_position in 0..=other.len() {
                        let delta = removal
                            + evaluator.insertion_delta(other.visits(), to_position, customer);
                        consider(
                            delta,
                            Move::Relocate {
                                from_route: source,
                                from_position,
                                to_route: target,
                                to_position,
                            },
                        );
                    }
                }
            }
        }

        if self.moves.swap {
            for (target, other) in routes.iter().enumerate().skip(source + 1) {
                for (first_position, &first) in visits.iter().enumerate() {
                    for (second_position, &second) in other.visits().iter().enumerate() {
                        // Demands are non-negative, so the difference cannot overflow.
                        let shift = problem.demand(second) - problem.demand(first);
                        let source_fits = route
                            .load()
                            .checked_add(shift)
                            .is_some_and(|load| load <= problem.capacity(source));
                        let target_fits = other
                            .load()
                            .checked_sub(shift)
                            .is_some_and(|load| load <= problem.capacity(target));
                        if !source_fits || !target_fits {
                            continue;
                        }
                        let delta = evaluator.replacement_delta(visits, first_position, second)
                            + evaluator.replacement_delta(other.visits(), second_position, first);
                        consider(
                            delta,
                            Move::Swap {
                                first_route: source,
                                first_position,
                                second_route: target,
                                second_position,
                            },
                        );
                    }
                }
            }
        }

        best
    }

    /// Apply `action` and refresh the touched routes and the totals.
    pub fn apply(&self, solution: &mut Solution, action: Move) {
        let problem = self.problem;
        let routes = solution.routes_mut();

        match action {
            Move::TwoOpt { route, from, to } => {
                routes[route].visits_mut()[from..=to].reverse();
                routes[route].refresh(problem);
            }
            Move::Relocate {
                from_route,
                from_position,
                to_route,
                to_position,
            } => {
                let customer = routes[from_route].visits_mut().remove(from_position);
                routes[to_route].visits_mut().insert(to_position, customer);
                routes[from_route].refresh(problem);
                if to_route != from_route {
                    routes[to_route].refresh(problem);
                }
            }
            Move::Swap {
                first_route,
                first_position,
                second_route,
                second_position,
            } => {
                let first = routes[first_route].visits()[first_position];
                let second = routes[second_route].visits()[second_position];
                routes[first_route].visits_mut()[first_position] = second;
                routes[second_route].visits_mut()[second_position] = first;
                routes[first_route].refresh(problem);
                routes[second_route].refresh(problem);
            }
        }

        solution.refresh(problem);
    }
}
