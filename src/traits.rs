//! Core traits for the routing planner.
//!
//! Hosts plug their own cost sources in by
//! implementing [`DistanceProvider`].

use crate::model::Location;

/// Supplies the travel cost between two locations.
///
/// Costs must be non-negative and finite. They need not be symmetric and need
/// not satisfy the triangle inequality. Returning `None` means the pair is
/// unknown; the planner treats a missing depot-to-depot or customer-to-self
/// entry as zero and any other missing entry as a malformed instance.
///
/// Providers are queried once per pair before solving starts, never during
/// search.
pub trait DistanceProvider {
    fn cost(&self, from: &Location, to: &Location) -> Option<f64>;
}

impl<F> DistanceProvider for F
where
    F: Fn(&Location, &Location) -> Option<f64>,
{
    fn cost(&self, from: &Location, to: &Location) -> Option<f64> {
        self(from, to)
    }
}
