//! Initial solution builders.
//!
//! Every builder either returns a solution covering all customers with
//! capacity-feasible routes, or fails with [`Infeasibility::Stranded`]. None
//! of them drops customers.

use std::cmp::{Ordering, Reverse};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{Infeasibility, SolveError};
use crate::evaluator::RouteEvaluator;
use crate::matrix::DEPOT;
use crate::problem::Problem;
use crate::solution::{Route, Solution};

/// Which construction heuristic(s) seed the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstructionStrategy {
    #[default]
    CheapestInsertion,
    Savings,
    /// Run every heuristic and keep the cheapest feasible result.
    Portfolio,
}

pub trait Construction: Sync {
    fn name(&self) -> &'static str;

    fn build(&self, problem: &Problem) -> Result<Solution, SolveError>;
}

/// Greedy cheapest feasible insertion.
///
/// Each step inserts the (customer, vehicle, position) with the smallest cost
/// increase among vehicles with enough remaining capacity. Ties go to the
/// lowest vehicle id, then the lowest position, then the lowest customer id.
#[derive(Debug, Clone, Copy, Default)]
pub struct CheapestInsertion;

#[derive(Debug, Clone, Copy)]
struct Insertion {
    delta: f64,
    customer: usize,
    vehicle: usize,
    position: usize,
}

impl Insertion {
    fn rank(&self, other: &Self, problem: &Problem) -> Ordering {
        self.delta
            .total_cmp(&other.delta)
            .then_with(|| {
                let vehicles = problem.vehicles();
                vehicles[self.vehicle].id.cmp(&vehicles[other.vehicle].id)
            })
            .then(self.position.cmp(&other.position))
            .then_with(|| {
                let customers = problem.customers();
                customers[self.customer].id.cmp(&customers[other.customer].id)
            })
    }
}

impl Construction for CheapestInsertion {
    fn name(&self) -> &'static str {
        "cheapest_insertion"
    }

    fn build(&self, problem: &Problem) -> Result<Solution, SolveError> {
        let evaluator = RouteEvaluator::new(problem.matrix());
        let mut routes: Vec<Route> = (0..problem.vehicles().len()).map(Route::empty).collect();
        let mut remaining: Vec<i64> = problem.vehicles().iter().map(|v| v.capacity).collect();
        let mut unassigned: Vec<usize> = (0..problem.customers().len()).collect();

        while !unassigned.is_empty() {
            // Remaining capacity only shrinks, so a customer that fits nowhere
            // now never will.
            let stranded = unassigned
                .iter()
                .copied()
                .filter(|&customer| remaining.iter().all(|&room| room < problem.demand(customer)))
                .min_by_key(|&customer| problem.customers()[customer].id);
            if let Some(customer) = stranded {
                return Err(Infeasibility::Stranded {
                    customer: problem.customers()[customer].id,
                }
                .into());
            }

            let mut best: Option<Insertion> = None;
            for &customer in &unassigned {
                for (vehicle, route) in routes.iter().enumerate() {
                    if remaining[vehicle] < problem.demand(customer) {
                        continue;
                    }
                    for position in 0..=route.len() {
                        let candidate = Insertion {
                            delta: evaluator.insertion_delta(route.visits(), position, customer),
                            customer,
                            vehicle,
                            position,
                        };
                        let better = best.as_ref().is_none_or(|current| {
                            candidate.rank(current, problem) == Ordering::Less
                        });
                        if better {
                            best = Some(candidate);
                        }
                    }
                }
            }

            let Some(insertion) = best else {
                break;
            };

            trace!(
                customer = %problem.customers()[insertion.customer].id,
                vehicle = %problem.vehicles()[insertion.vehicle].id,
                position = insertion.position,
                delta = insertion.delta,
                "insert"
            );

            let route = &mut routes[insertion.vehicle];
            route.visits_mut().insert(insertion.position, insertion.customer);
            route.refresh(problem);
            remaining[insertion.vehicle] -= problem.demand(insertion.customer);
            unassigned.retain(|&customer| customer != insertion.customer);
        }

        let solution = Solution::new(problem, routes);
        debug!(cost = solution.total_cost(), "cheapest insertion finished");
        Ok(solution)
    }
}

/// Clarke–Wright savings with directed merges.
///
/// Starts from one route per customer and appends route `j` to route `i`
/// when `i` ends where `j` starts, in decreasing order of
/// `d(i, depot) + d(depot, j) - d(i, j)`. Routes are never reversed, so
/// asymmetric costs stay exact. A merge is accepted only while the route
/// loads can still be packed onto the fleet, largest load to largest vehicle.
#[derive(Debug, Clone, Copy, Default)]
pub struct Savings;

#[derive(Debug, Clone, Copy)]
struct Saving {
    value: f64,
    tail: usize,
    head: usize,
}

impl Savings {
    fn savings(problem: &Problem) -> Vec<Saving> {
        let matrix = problem.matrix();
        let n = problem.customers().len();
        let mut savings = Vec::with_capacity(n * n.saturating_sub(1));

        for tail in 0..n {
            for head in 0..n {
                if tail == head {
                    continue;
                }
                let value = matrix.get(tail + 1, DEPOT) + matrix.get(DEPOT, head + 1)
                    - matrix.get(tail + 1, head + 1);
                savings.push(Saving { value, tail, head });
            }
        }

        let customers = problem.customers();
        savings.sort_by(|a, b| {
            b.value
                .total_cmp(&a.value)
                .then(customers[a.tail].id.cmp(&customers[b.tail].id))
                .then(customers[a.head].id.cmp(&customers[b.head].id))
        });
        savings
    }

    /// Whether the largest loads still fit the largest vehicles pairwise.
    fn packable(loads: &[i64], capacities: &[i64]) -> bool {
        let mut loads = loads.to_vec();
        loads.sort_unstable_by_key(|&load| Reverse(load));
        loads.iter().zip(capacities).all(|(load, capacity)| load <= capacity)
    }
}

impl Construction for Savings {
    fn name(&self) -> &'static str {
        "savings"
    }

    fn build(&self, problem: &Problem) -> Result<Solution, SolveError> {
        let n = problem.customers().len();
        let vehicle_count = problem.vehicles().len();

        let mut members: Vec<Vec<usize>> = (0..n).map(|customer| vec![customer]).collect();
        let mut loads: Vec<i64> = problem.demands().to_vec();
        let mut route_of: Vec<usize> = (0..n).collect();
        let mut route_count = n;

        let mut capacities: Vec<i64> = problem.vehicles().iter().map(|v| v.capacity).collect();
        capacities.sort_unstable_by_key(|&capacity| Reverse(capacity));

        for saving in Self::savings(problem) {
            // Non-positive savings only help when the fleet is short of routes.
            if saving.value <= 0.0 && route_count <= vehicle_count {
                break;
            }

            let (into, from) = (route_of[saving.tail], route_of[saving.head]);
            if into == from
                || members[into].last() != Some(&saving.tail)
                || members[from].first() != Some(&saving.head)
            {
                continue;
            }

            let Some(merged) = loads[into].checked_add(loads[from]) else {
                continue;
            };
            let merged_loads: Vec<i64> = loads
                .iter()
                .enumerate()
                .filter(|&(route, _)| route != from && !members[route].is_empty())
                .map(|(route, &load)| if route == into { merged } else { load })
                .collect();
            if !Self::packable(&merged_loads, &capacities) {
                continue;
            }

            let moved = std::mem::take(&mut members[from]);
            for &customer in &moved {
                route_of[customer] = into;
            }
            members[into].extend(moved);
            loads[into] = merged;
            loads[from] = 0;
            route_count -= 1;
        }

        let customers = problem.customers();
        let mut built: Vec<(i64, Vec<usize>)> = members
            .into_iter()
            .zip(loads)
            .filter(|(visits, _)| !visits.is_empty())
            .map(|(visits, load)| (load, visits))
            .collect();
        built.sort_by(|a, b| {
            b.0.cmp(&a.0)
                .then_with(|| customers[a.1[0]].id.cmp(&customers[b.1[0]].id))
        });

        let mut fleet: Vec<usize> = (0..vehicle_count).collect();
        fleet.sort_by(|&a, &b| {
            let (a, b) = (&problem.vehicles()[a], &problem.vehicles()[b]);
            b.capacity.cmp(&a.capacity).then(a.id.cmp(&b.id))
        });

        let mut routes: Vec<Route> = (0..vehicle_count).map(Route::empty).collect();
        for (slot, (load, visits)) in built.into_iter().enumerate() {
            let vehicle = fleet.get(slot).copied().filter(|&v| load <= problem.capacity(v));
            let Some(vehicle) = vehicle else {
                let customer = visits
                    .iter()
                    .map(|&customer| customers[customer].id)
                    .min()
                    .unwrap_or(customers[visits[0]].id);
                return Err(Infeasibility::Stranded { customer }.into());
            };
            routes[vehicle] = Route::with_visits(problem, vehicle, visits);
        }

        let solution = Solution::new(problem, routes);
        debug!(
            cost = solution.total_cost(),
            routes = route_count,
            "savings finished"
        );
        Ok(solution)
    }
}
