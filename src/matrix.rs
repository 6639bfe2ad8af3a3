//! Dense cost matrix materialized from a [`DistanceProvider`].

use crate::error::{Malformation, SolveError};
use crate::model::Location;
use crate::traits::DistanceProvider;

/// Matrix index of the depot. Customer `i` (instance order) lives at `i + 1`.
pub const DEPOT: usize = 0;

/// Immutable square cost matrix over the depot and every customer.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    rows: Vec<Vec<f64>>,
}

impl DistanceMatrix {
    /// Query `provider` once for every ordered pair of `locations`.
    ///
    /// The first location must be the depot. Self-to-self costs default to 0
    /// when the provider has no entry and must be 0 when it does.
    pub fn materialize<P>(provider: &P, locations: &[Location]) -> Result<Self, SolveError>
    where
        P: DistanceProvider + ?Sized,
    {
        debug_assert!(matches!(locations.first(), Some(Location::Depot) | None));

        let n = locations.len();
        let mut rows = vec![vec![0.0; n]; n];

        for (i, from) in locations.iter().enumerate() {
            for (j, to) in locations.iter().enumerate() {
                let value = match provider.cost(from, to) {
                    Some(value) => value,
                    None if i == j => 0.0,
                    None => {
                        return Err(Malformation::MissingDistance { from: *from, to: *to }.into());
                    }
                };

                let valid = value.is_finite() && value >= 0.0 && (i != j || value == 0.0);
                if !valid {
                    return Err(Malformation::InvalidDistance {
                        from: *from,
                        to: *to,
                        value,
                    }
                    .into());
                }

                rows[i][j] = value;
            }
        }

        Ok(Self { rows })
    }

    /// Number of locations, depot included.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[inline]
    pub fn get(&self, from: usize, to: usize) -> f64 {
        self.rows[from][to]
    }

    pub fn is_symmetric(&self) -> bool {
        let n = self.len();
        (0..n).all(|i| (i + 1..n).all(|j| self.rows[i][j] == self.rows[j][i]))
    }
}
