//! Error types reported by the planner.

use std::fmt;

use crate::model::{CustomerId, Location, VehicleId};

/// Why an instance cannot be served by the fleet.
#[derive(Debug, Clone, PartialEq)]
pub enum Infeasibility {
    /// A single customer needs more than the largest vehicle carries.
    DemandExceedsCapacity {
        customer: CustomerId,
        demand: i64,
        max_capacity: i64,
    },
    /// Summed demand is larger than summed fleet capacity.
    FleetCapacityExceeded { total_demand: i128, fleet_capacity: i128 },
    /// Construction ran out of room for this customer.
    Stranded { customer: CustomerId },
}

/// Structural problems in a problem instance.
#[derive(Debug, Clone, PartialEq)]
pub enum Malformation {
    DuplicateCustomer(CustomerId),
    DuplicateVehicle(VehicleId),
    NegativeDemand { customer: CustomerId, demand: i64 },
    NonPositiveCapacity { vehicle: VehicleId, capacity: i64 },
    MissingDistance { from: Location, to: Location },
    InvalidDistance { from: Location, to: Location, value: f64 },
    UnknownCustomer(CustomerId),
    UnknownVehicle(VehicleId),
}

#[derive(Debug)]
pub enum SolveError {
    Infeasible(Infeasibility),
    MalformedInstance(Malformation),
    /// The solution repository was queried before anything was recorded.
    NoSolution,
    Parse(serde_json::Error),
}

impl SolveError {
    pub fn is_infeasible(&self) -> bool {
        matches!(self, SolveError::Infeasible(_))
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, SolveError::MalformedInstance(_))
    }
}

impl From<Infeasibility> for SolveError {
    fn from(reason: Infeasibility) -> Self {
        SolveError::Infeasible(reason)
    }
}

impl From<Malformation> for SolveError {
    fn from(reason: Malformation) -> Self {
        SolveError::MalformedInstance(reason)
    }
}

impl From<serde_json::Error> for SolveError {
    fn from(err: serde_json::Error) -> Self {
        SolveError::Parse(err)
    }
}

impl fmt::Display for Infeasibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Infeasibility::DemandExceedsCapacity {
                customer,
                demand,
                max_capacity,
            } => write!(
                f,
                "customer {} demands {} but the largest vehicle holds {}",
                customer, demand, max_capacity
            ),
            Infeasibility::FleetCapacityExceeded {
                total_demand,
                fleet_capacity,
            } => write!(
                f,
                "total demand {} exceeds fleet capacity {}",
                total_demand, fleet_capacity
            ),
            Infeasibility::Stranded { customer } => {
                write!(f, "no vehicle has room left for customer {}", customer)
            }
        }
    }
}

impl fmt::Display for Malformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Malformation::DuplicateCustomer(id) => write!(f, "duplicate customer id {}", id),
            Malformation::DuplicateVehicle(id) => write!(f, "duplicate vehicle id {}", id),
            Malformation::NegativeDemand { customer, demand } => {
                write!(f, "customer {} has negative demand {}", customer, demand)
            }
            Malformation::NonPositiveCapacity { vehicle, capacity } => {
                write!(f, "vehicle {} has non-positive capacity {}", vehicle, capacity)
            }
            Malformation::MissingDistance { from, to } => {
                write!(f, "no distance from {} to {}", from, to)
            }
            Malformation::InvalidDistance { from, to, value } => {
                write!(f, "invalid distance {} from {} to {}", value, from, to)
            }
            Malformation::UnknownCustomer(id) => write!(f, "unknown customer id {}", id),
            Malformation::UnknownVehicle(id) => write!(f, "unknown vehicle id {}", id),
        }
    }
}

impl fmt::Display for SolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveError::Infeasible(reason) => write!(f, "infeasible instance: {}", reason),
            SolveError::MalformedInstance(reason) => write!(f, "malformed instance: {}", reason),
            SolveError::NoSolution => write!(f, "no solution has been recorded"),
            SolveError::Parse(err) => write!(f, "failed to parse instance: {}", err),
        }
    }
}

impl std::error::Error for SolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SolveError::Parse(err) => Some(err),
            _ => None,
        }
    }
}
