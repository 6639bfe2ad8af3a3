//! Routing planner solver: construction followed by local search.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, warn};

use crate::construction::{CheapestInsertion, Construction, ConstructionStrategy, Savings};
use crate::error::SolveError;
use crate::instance::ProblemInstance;
use crate::local_search::{LocalSearch, MoveSet, DEFAULT_MAX_ITERATIONS};
use crate::problem::Problem;
use crate::repository::SolutionRepository;
use crate::solution::{Solution, SolutionResult};
use crate::termination::{CancellationToken, StopSignal, Termination};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolveOptions {
    /// Maximum improving moves applied by local search.
    pub max_iterations: usize,
    /// Wall-clock budget for the whole solve, checked before every sweep.
    pub time_limit_ms: Option<u64>,
    pub construction: ConstructionStrategy,
    pub moves: MoveSet,
    /// Use the rayon pool for the construction portfolio and move scans.
    pub parallel: bool,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            time_limit_ms: None,
            construction: ConstructionStrategy::default(),
            moves: MoveSet::default(),
            parallel: false,
        }
    }
}

impl SolveOptions {
    pub fn from_json(json: &str) -> Result<Self, SolveError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_ms.map(Duration::from_millis)
    }
}

/// Everything a solve produced.
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    pub solution: Solution,
    /// Cost of the constructed solution before local search.
    pub initial_cost: f64,
    pub termination: Termination,
    pub iterations: usize,
}

impl SolveOutcome {
    pub fn to_result(&self, problem: &Problem) -> SolutionResult {
        SolutionResult {
            routes: self.solution.assignment(problem),
            total_cost: self.solution.total_cost(),
            feasible: self.solution.is_feasible(),
            initial_cost: self.initial_cost,
            termination: self.termination,
            iterations: self.iterations,
        }
    }
}

pub struct Solver<'a> {
    problem: &'a Problem,
    options: SolveOptions,
    cancellation: CancellationToken,
}

impl<'a> Solver<'a> {
    pub fn new(problem: &'a Problem, options: SolveOptions) -> Self {
        Self {
            problem,
            options,
            cancellation: CancellationToken::new(),
        }
    }

    /// Stop the improvement loop when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn run(&self) -> Result<SolveOutcome, SolveError> {
        let problem = self.problem;
        let span = info_span!(
            "solve",
            customers = problem.customers().len(),
            vehicles = problem.vehicles().len()
        );
        let _guard = span.enter();

        let stop = StopSignal::new(self.cancellation.clone(), self.options.time_limit());
        problem.check_capacity()?;

        let repository = SolutionRepository::new();
        let initial = self.construct(&repository)?;
        let initial_cost = initial.total_cost();
        info!(cost = initial_cost, "initial solution constructed");

        let report = LocalSearch::new(problem)
            .with_moves(self.options.moves)
            .with_max_iterations(self.options.max_iterations)
            .with_parallel(self.options.parallel)
            .run(initial, &repository, &stop);

        let solution = repository.into_best()?;
        info!(
            cost = solution.total_cost(),
            termination = ?report.termination,
            iterations = report.iterations,
            "solve finished"
        );

        Ok(SolveOutcome {
            solution,
            initial_cost,
            termination: report.termination,
            iterations: report.iterations,
        })
    }

    /// Build the starting solution and record it.
    fn construct(&self, repository: &SolutionRepository) -> Result<Solution, SolveError> {
        let problem = self.problem;

        match self.options.construction {
            ConstructionStrategy::CheapestInsertion => Self::build(&CheapestInsertion, problem),
            ConstructionStrategy::Savings => Self::build(&Savings, problem),
            ConstructionStrategy::Portfolio => {
                let (insertion, savings) = if self.options.parallel {
                    rayon::join(
                        || Self::build(&CheapestInsertion, problem),
                        || Self::build(&Savings, problem),
                    )
                } else {
                    (
                        Self::build(&CheapestInsertion, problem),
                        Self::build(&Savings, problem),
                    )
                };

                // Fixed recording order keeps ties on the insertion result.
                let mut first_error = None;
                for result in [insertion, savings] {
                    match result {
                        Ok(solution) => {
                            repository.record(&solution);
                        }
                        Err(err) => {
                            warn!(error = %err, "construction heuristic failed");
                            first_error.get_or_insert(err);
                        }
                    }
                }

                match repository.current() {
                    Ok(best) => Ok(best),
                    Err(_) => Err(first_error.unwrap_or(SolveError::NoSolution)),
                }
            }
        }
    }

    fn build<C: Construction>(heuristic: &C, problem: &Problem) -> Result<Solution, SolveError> {
        let span = info_span!("construction", heuristic = heuristic.name());
        let _guard = span.enter();

        let solution = heuristic.build(problem)?;
        debug!(cost = solution.total_cost(), "constructed");
        Ok(solution)
    }
}

/// Solve `instance` end to end.
pub fn solve(instance: &ProblemInstance, options: SolveOptions) -> Result<SolutionResult, SolveError> {
    let problem = instance.to_problem()?;
    let outcome = Solver::new(&problem, options).run()?;
    Ok(outcome.to_result(&problem))
}

/// Like [`solve`], stopping local search early once `token` is cancelled.
pub fn solve_with_cancellation(
    instance: &ProblemInstance,
    options: SolveOptions,
    token: CancellationToken,
) -> Result<SolutionResult, SolveError> {
    let problem = instance.to_problem()?;
    let outcome = Solver::new(&problem, options)
        .with_cancellation(token)
        .run()?;
    Ok(outcome.to_result(&problem))
}
