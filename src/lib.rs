//! cvrp-planner
//!
//! Capacitated vehicle routing: assign customers with demand to a fleet of
//! capacity-limited vehicles and order each route to minimize travel cost.
//! A construction heuristic seeds a best-improvement local search; the
//! cheapest feasible solution found is returned.

pub mod construction;
pub mod error;
pub mod evaluator;
pub mod haversine;
pub mod instance;
pub mod local_search;
pub mod matrix;
pub mod model;
pub mod problem;
pub mod repository;
pub mod solution;
pub mod solver;
pub mod termination;
pub mod traits;

pub use error::{Infeasibility, Malformation, SolveError};
pub use instance::{DistanceTable, ProblemInstance};
pub use model::{Customer, CustomerId, Location, Vehicle, VehicleId};
pub use problem::Problem;
pub use solution::{Route, Solution, SolutionResult};
pub use solver::{solve, solve_with_cancellation, SolveOptions, Solver};
pub use termination::{CancellationToken, Termination};
pub use traits::DistanceProvider;
