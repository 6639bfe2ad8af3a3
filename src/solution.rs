//! Routes, solutions and their serializable result form.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Malformation, SolveError};
use crate::evaluator::{is_feasible, route_cost, route_load};
use crate::model::{CustomerId, VehicleId};
use crate::problem::Problem;
use crate::termination::Termination;

/// Ordered customer positions served by one vehicle, depot implied at both
/// ends. Load and cost are cached and refreshed after every edit.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    vehicle: usize,
    visits: Vec<usize>,
    load: i64,
    cost: f64,
}

impl Route {
    pub fn empty(vehicle: usize) -> Self {
        Self {
            vehicle,
            visits: Vec::new(),
            load: 0,
            cost: 0.0,
        }
    }

    pub fn with_visits(problem: &Problem, vehicle: usize, visits: Vec<usize>) -> Self {
        let mut route = Self {
            vehicle,
            visits,
            load: 0,
            cost: 0.0,
        };
        route.refresh(problem);
        route
    }

    /// Fleet position of the vehicle driving this route.
    pub fn vehicle(&self) -> usize {
        self.vehicle
    }

    pub fn visits(&self) -> &[usize] {
        &self.visits
    }

    pub fn load(&self) -> i64 {
        self.load
    }

    pub fn cost(&self) -> f64 {
        self.cost
    }

    pub fn len(&self) -> usize {
        self.visits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visits.is_empty()
    }

    pub fn is_feasible(&self, problem: &Problem) -> bool {
        is_feasible(&self.visits, problem.capacity(self.vehicle), problem.demands())
    }

    pub(crate) fn visits_mut(&mut self) -> &mut Vec<usize> {
        &mut self.visits
    }

    pub(crate) fn refresh(&mut self, problem: &Problem) {
        self.load = route_load(&self.visits, problem.demands());
        self.cost = route_cost(&self.visits, problem.matrix());
    }
}

/// One route per vehicle, in fleet order.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    routes: Vec<Route>,
    total_cost: f64,
    feasible: bool,
}

impl Solution {
    /// Wrap `routes` and evaluate cost and feasibility against `problem`.
    pub fn new(problem: &Problem, routes: Vec<Route>) -> Self {
        let mut solution = Self {
            routes,
            total_cost: 0.0,
            feasible: false,
        };
        solution.refresh(problem);
        solution
    }

    /// Build a solution from an id-level assignment.
    ///
    /// Vehicles missing from `assignment` get an empty route. The result may
    /// be infeasible; unknown ids are rejected.
    pub fn from_assignment(
        problem: &Problem,
        assignment: &BTreeMap<VehicleId, Vec<CustomerId>>,
    ) -> Result<Self, SolveError> {
        for vehicle in assignment.keys() {
            if !problem.vehicles().iter().any(|v| &v.id == vehicle) {
                return Err(Malformation::UnknownVehicle(vehicle.clone()).into());
            }
        }

        let mut routes = Vec::with_capacity(problem.vehicles().len());
        for (index, vehicle) in problem.vehicles().iter().enumerate() {
            let ids = assignment.get(&vehicle.id).map(Vec::as_slice).unwrap_or_default();
            let visits = ids
                .iter()
                .map(|id| {
                    problem
                        .position_of(*id)
                        .ok_or(SolveError::from(Malformation::UnknownCustomer(*id)))
                })
                .collect::<Result<Vec<_>, _>>()?;
            routes.push(Route::with_visits(problem, index, visits));
        }

        Ok(Self::new(problem, routes))
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    /// Coverage, uniqueness and capacity all hold.
    pub fn is_feasible(&self) -> bool {
        self.feasible
    }

    pub fn route_for(&self, vehicle: &VehicleId, problem: &Problem) -> Option<&Route> {
        self.routes
            .iter()
            .find(|route| &problem.vehicles()[route.vehicle].id == vehicle)
    }

    pub(crate) fn routes_mut(&mut self) -> &mut [Route] {
        &mut self.routes
    }

    /// Recompute the total and the feasibility flag after route edits.
    pub(crate) fn refresh(&mut self, problem: &Problem) {
        self.total_cost = self.routes.iter().map(Route::cost).sum();
        self.feasible = Self::check(problem, &self.routes);
    }

    fn check(problem: &Problem, routes: &[Route]) -> bool {
        if routes.len() != problem.vehicles().len() {
            return false;
        }

        let mut seen = vec![false; problem.customers().len()];
        for (index, route) in routes.iter().enumerate() {
            if route.vehicle != index || !route.is_feasible(problem) {
                return false;
            }
            for &customer in &route.visits {
                match seen.get_mut(customer) {
                    Some(slot) if !*slot => *slot = true,
                    _ => return false,
                }
            }
        }

        seen.into_iter().all(|covered| covered)
    }

    /// Id-level assignment of this solution.
    pub fn assignment(&self, problem: &Problem) -> BTreeMap<VehicleId, Vec<CustomerId>> {
        self.routes
            .iter()
            .map(|route| {
                let vehicle = problem.vehicles()[route.vehicle].id.clone();
                let customers = route
                    .visits
                    .iter()
                    .map(|&customer| problem.customers()[customer].id)
                    .collect();
                (vehicle, customers)
            })
            .collect()
    }
}

/// Serializable outcome of a solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionResult {
    pub routes: BTreeMap<VehicleId, Vec<CustomerId>>,
    pub total_cost: f64,
    pub feasible: bool,
    /// Cost of the constructed solution before local search.
    pub initial_cost: f64,
    pub termination: Termination,
    /// Improving moves applied by local search.
    pub iterations: usize,
}

impl SolutionResult {
    pub fn to_json(&self) -> Result<String, SolveError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
