//! JSON exchange form of a problem instance.
//!
//! ```json
//! {"customers": [{"id": 1, "demand": 5}],
//!  "vehicles": [{"id": "V1", "capacity": 10}],
//!  "distances": {"depot": {"1": 4}, "1": {"depot": 4}}}
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::SolveError;
use crate::model::{Customer, Location, Vehicle};
use crate::problem::Problem;
use crate::traits::DistanceProvider;

/// Nested `from → to → cost` table keyed by `"depot"` or customer id.
///
/// Entries for locations outside the instance are ignored. Self-to-self
/// entries may be omitted. The table is never mirrored: an asymmetric
/// instance lists both directions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DistanceTable {
    entries: BTreeMap<String, BTreeMap<String, f64>>,
}

impl DistanceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, from: Location, to: Location, cost: f64) {
        self.entries.entry(from.key()).or_default().insert(to.key(), cost);
    }

    /// Insert `cost` in both directions.
    pub fn insert_symmetric(&mut self, a: Location, b: Location, cost: f64) {
        self.insert(a, b, cost);
        self.insert(b, a, cost);
    }
}

impl DistanceProvider for DistanceTable {
    fn cost(&self, from: &Location, to: &Location) -> Option<f64> {
        self.entries.get(&from.key())?.get(&to.key()).copied()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProblemInstance {
    pub customers: Vec<Customer>,
    pub vehicles: Vec<Vehicle>,
    pub distances: DistanceTable,
}

impl ProblemInstance {
    pub fn from_json(json: &str) -> Result<Self, SolveError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, SolveError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate and materialize into a solver-ready [`Problem`].
    pub fn to_problem(&self) -> Result<Problem, SolveError> {
        Problem::new(self.customers.clone(), self.vehicles.clone(), &self.distances)
    }
}
