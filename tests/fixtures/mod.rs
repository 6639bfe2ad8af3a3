//! Test fixtures for cvrp-planner.
//!
//! Provides:
//! - An instance builder placing customers on an integer grid with
//!   Manhattan travel costs (exact in f64)
//! - Independent checks of coverage, capacity and cost for solve results

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};

use cvrp_planner::{
    Customer, CustomerId, DistanceProvider, DistanceTable, Location, ProblemInstance,
    SolutionResult, Vehicle, VehicleId,
};

/// Install a fmt subscriber honoring `RUST_LOG`. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Builder for grid instances with sensible defaults.
#[derive(Debug, Clone, Default)]
pub struct InstanceBuilder {
    depot: (i64, i64),
    customers: Vec<(Customer, (i64, i64))>,
    vehicles: Vec<Vehicle>,
    /// Extra cost for travelling towards larger x.
    uphill: i64,
}

impl InstanceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depot(mut self, x: i64, y: i64) -> Self {
        self.depot = (x, y);
        self
    }

    pub fn customer(mut self, id: u64, demand: i64, x: i64, y: i64) -> Self {
        self.customers.push((Customer::new(id, demand), (x, y)));
        self
    }

    pub fn vehicle(mut self, id: &str, capacity: i64) -> Self {
        self.vehicles.push(Vehicle::new(id, capacity));
        self
    }

    /// Make eastbound legs cost `penalty` more than westbound ones.
    pub fn uphill(mut self, penalty: i64) -> Self {
        self.uphill = penalty;
        self
    }

    pub fn build(self) -> ProblemInstance {
        let mut points = vec![(Location::Depot, self.depot)];
        points.extend(
            self.customers
                .iter()
                .map(|(customer, point)| (customer.location(), *point)),
        );

        let mut distances = DistanceTable::new();
        for &(from, (x1, y1)) in &points {
            for &(to, (x2, y2)) in &points {
                if from == to {
                    continue;
                }
                let mut cost = (x1 - x2).abs() + (y1 - y2).abs();
                if x2 > x1 {
                    cost += self.uphill;
                }
                distances.insert(from, to, cost as f64);
            }
        }

        ProblemInstance {
            customers: self.customers.into_iter().map(|(customer, _)| customer).collect(),
            vehicles: self.vehicles,
            distances,
        }
    }
}

/// The A:5 B:3 C:7 / V1:10 V2:15 instance.
pub fn three_customer_instance() -> ProblemInstance {
    InstanceBuilder::new()
        .customer(1, 5, 2, 0)
        .customer(2, 3, 3, 1)
        .customer(3, 7, -4, 0)
        .vehicle("V1", 10)
        .vehicle("V2", 15)
        .build()
}

/// Twelve customers in four clusters, four vehicles of mixed size.
///
/// Total demand is 42 against a fleet of 46, enough slack for the greedy
/// builders to place every customer.
pub fn clustered_instance() -> ProblemInstance {
    let mut builder = InstanceBuilder::new();
    let clusters = [(10, 10), (-10, 10), (-10, -10), (10, -10)];
    let mut id = 1;
    for (cx, cy) in clusters {
        for (dx, dy) in [(0, 0), (1, 2), (2, 1)] {
            builder = builder.customer(id, (id % 4 + 2) as i64, cx + dx, cy + dy);
            id += 1;
        }
    }
    builder
        .vehicle("V1", 12)
        .vehicle("V2", 12)
        .vehicle("V3", 10)
        .vehicle("V4", 12)
        .build()
}

pub fn route_ids(result: &SolutionResult, vehicle: &str) -> Vec<u64> {
    result
        .routes
        .get(&VehicleId::new(vehicle))
        .map(|ids| ids.iter().map(|id| id.0).collect())
        .unwrap_or_default()
}

/// Depot-bracketed cost of `ids`, recomputed straight from the instance table.
pub fn route_cost(instance: &ProblemInstance, ids: &[CustomerId]) -> f64 {
    let stops: Vec<Location> = std::iter::once(Location::Depot)
        .chain(ids.iter().map(|&id| Location::Customer(id)))
        .chain(std::iter::once(Location::Depot))
        .collect();

    if ids.is_empty() {
        return 0.0;
    }

    stops
        .windows(2)
        .map(|leg| instance.distances.cost(&leg[0], &leg[1]).unwrap_or(0.0))
        .sum()
}

/// Coverage, uniqueness, capacity and cost, checked independently of the
/// solver's own bookkeeping.
pub fn assert_valid(instance: &ProblemInstance, result: &SolutionResult) {
    assert!(result.feasible, "result should be flagged feasible");

    let demands: BTreeMap<CustomerId, i64> = instance
        .customers
        .iter()
        .map(|customer| (customer.id, customer.demand))
        .collect();
    let mut seen = HashSet::new();
    let mut total = 0.0;

    for vehicle in &instance.vehicles {
        let ids = result.routes.get(&vehicle.id).cloned().unwrap_or_default();
        let load: i128 = ids.iter().map(|id| i128::from(demands[id])).sum();
        assert!(
            load <= i128::from(vehicle.capacity),
            "{} carries {} over capacity {}",
            vehicle.id,
            load,
            vehicle.capacity
        );
        for id in &ids {
            assert!(seen.insert(*id), "customer {} served twice", id);
        }
        total += route_cost(instance, &ids);
    }

    assert_eq!(seen.len(), instance.customers.len(), "every customer is served");
    assert!(
        (total - result.total_cost).abs() < 1e-6,
        "reported cost {} differs from recomputed {}",
        result.total_cost,
        total
    );
}
