//! Best-known solution store shared by construction and search.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::error::SolveError;
use crate::solution::Solution;

/// Holds the cheapest feasible solution seen so far.
///
/// `record` is a compare-and-replace under a mutex, so concurrent workers can
/// report candidates through a shared reference.
#[derive(Debug, Default)]
pub struct SolutionRepository {
    best: Mutex<Option<Solution>>,
}

impl SolutionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Solution>> {
        self.best.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `candidate` if it is feasible and strictly cheaper than the
    /// current best. Equal cost keeps the earlier solution.
    ///
    /// Returns whether the candidate replaced the stored solution.
    pub fn record(&self, candidate: &Solution) -> bool {
        if !candidate.is_feasible() {
            return false;
        }

        let mut best = self.lock();
        let improves = best
            .as_ref()
            .is_none_or(|current| candidate.total_cost() < current.total_cost());

        if improves {
            debug!(cost = candidate.total_cost(), "new best solution recorded");
            *best = Some(candidate.clone());
        }

        improves
    }

    /// Snapshot of the stored best.
    pub fn current(&self) -> Result<Solution, SolveError> {
        self.lock().clone().ok_or(SolveError::NoSolution)
    }

    pub fn cost(&self) -> Result<f64, SolveError> {
        self.lock()
            .as_ref()
            .map(Solution::total_cost)
            .ok_or(SolveError::NoSolution)
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_none()
    }

    pub fn into_best(self) -> Result<Solution, SolveError> {
        self.best
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .ok_or(SolveError::NoSolution)
    }
}
