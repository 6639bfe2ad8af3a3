//! Validated, solver-ready view of a problem instance.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::error::{Infeasibility, Malformation, SolveError};
use crate::matrix::DistanceMatrix;
use crate::model::{Customer, CustomerId, Location, Vehicle};
use crate::traits::DistanceProvider;

/// A checked CVRP instance with its cost matrix materialized.
///
/// Customers and vehicles keep their input order; the solver refers to them
/// by position. Customer `i` is matrix index `i + 1`.
#[derive(Debug, Clone)]
pub struct Problem {
    customers: Vec<Customer>,
    vehicles: Vec<Vehicle>,
    demands: Vec<i64>,
    matrix: DistanceMatrix,
    index: HashMap<CustomerId, usize>,
}

impl Problem {
    /// Validate ids, demands and capacities, then materialize the matrix.
    pub fn new<P>(
        customers: Vec<Customer>,
        vehicles: Vec<Vehicle>,
        provider: &P,
    ) -> Result<Self, SolveError>
    where
        P: DistanceProvider + ?Sized,
    {
        let mut index = HashMap::with_capacity(customers.len());
        for (position, customer) in customers.iter().enumerate() {
            if index.insert(customer.id, position).is_some() {
                return Err(Malformation::DuplicateCustomer(customer.id).into());
            }
            if customer.demand < 0 {
                return Err(Malformation::NegativeDemand {
                    customer: customer.id,
                    demand: customer.demand,
                }
                .into());
            }
        }

        let mut vehicle_ids = HashSet::with_capacity(vehicles.len());
        for vehicle in &vehicles {
            if !vehicle_ids.insert(&vehicle.id) {
                return Err(Malformation::DuplicateVehicle(vehicle.id.clone()).into());
            }
            if vehicle.capacity <= 0 {
                return Err(Malformation::NonPositiveCapacity {
                    vehicle: vehicle.id.clone(),
                    capacity: vehicle.capacity,
                }
                .into());
            }
        }

        let locations: Vec<Location> = std::iter::once(Location::Depot)
            .chain(customers.iter().map(Customer::location))
            .collect();
        let matrix = DistanceMatrix::materialize(provider, &locations)?;

        debug!(
            customers = customers.len(),
            vehicles = vehicles.len(),
            symmetric = matrix.is_symmetric(),
            "problem materialized"
        );

        let demands = customers.iter().map(|customer| customer.demand).collect();

        Ok(Self {
            customers,
            vehicles,
            demands,
            matrix,
            index,
        })
    }

    pub fn customers(&self) -> &[Customer] {
        &self.customers
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    /// Demand per customer position.
    pub fn demands(&self) -> &[i64] {
        &self.demands
    }

    pub fn demand(&self, customer: usize) -> i64 {
        self.demands[customer]
    }

    pub fn capacity(&self, vehicle: usize) -> i64 {
        self.vehicles[vehicle].capacity
    }

    pub fn matrix(&self) -> &DistanceMatrix {
        &self.matrix
    }

    /// Position of a customer id in instance order.
    pub fn position_of(&self, id: CustomerId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    /// Summed demand, widened so that any number of `i64` demands fits.
    pub fn total_demand(&self) -> i128 {
        self.demands.iter().map(|&demand| i128::from(demand)).sum()
    }

    pub fn fleet_capacity(&self) -> i128 {
        self.vehicles
            .iter()
            .map(|vehicle| i128::from(vehicle.capacity))
            .sum()
    }

    pub fn max_capacity(&self) -> Option<i64> {
        self.vehicles.iter().map(|vehicle| vehicle.capacity).max()
    }

    /// Fast-fail capacity screening run before construction.
    ///
    /// Reports the first customer (instance order) that no vehicle can carry,
    /// then a fleet that is too small overall.
    pub fn check_capacity(&self) -> Result<(), SolveError> {
        let max_capacity = self.max_capacity().unwrap_or(0);
        if let Some(customer) = self
            .customers
            .iter()
            .find(|customer| customer.demand > max_capacity)
        {
            return Err(Infeasibility::DemandExceedsCapacity {
                customer: customer.id,
                demand: customer.demand,
                max_capacity,
            }
            .into());
        }

        let total_demand = self.total_demand();
        let fleet_capacity = self.fleet_capacity();
        if total_demand > fleet_capacity {
            return Err(Infeasibility::FleetCapacityExceeded {
                total_demand,
                fleet_capacity,
            }
            .into());
        }

        Ok(())
    }
}
