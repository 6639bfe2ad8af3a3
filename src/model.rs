//! Plain data types shared across the planner.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Customer identifier as it appears in instance documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(pub u64);

/// Vehicle identifier as it appears in instance documents.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehicleId(pub String);

impl VehicleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stop in the network: the shared depot or a customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    Depot,
    Customer(CustomerId),
}

impl Location {
    /// Key used for this location in nested distance tables.
    pub fn key(&self) -> String {
        match self {
            Location::Depot => "depot".to_string(),
            Location::Customer(id) => id.to_string(),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Depot => f.write_str("depot"),
            Location::Customer(id) => write!(f, "customer {}", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub demand: i64,
}

impl Customer {
    pub fn new(id: u64, demand: i64) -> Self {
        Self {
            id: CustomerId(id),
            demand,
        }
    }

    pub fn location(&self) -> Location {
        Location::Customer(self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    pub capacity: i64,
}

impl Vehicle {
    pub fn new(id: impl Into<String>, capacity: i64) -> Self {
        Self {
            id: VehicleId::new(id),
            capacity,
        }
    }
}
