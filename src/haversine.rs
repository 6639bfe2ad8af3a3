//! Haversine distance provider for hosts that hold coordinates.
//!
//! Uses great-circle distance, either as kilometres or as travel seconds at
//! an assumed speed. Ignores roads, so it suits rough planning and tests.

use std::collections::HashMap;

use crate::model::Location;
use crate::traits::DistanceProvider;

/// Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// What the provider reports as cost.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HaversineCost {
    Kilometers,
    /// Travel time in seconds at this average speed (km/h).
    Seconds { speed_kmh: f64 },
}

/// Great-circle provider over `(lat, lng)` coordinates per location.
#[derive(Debug, Clone)]
pub struct HaversineProvider {
    coordinates: HashMap<Location, (f64, f64)>,
    cost: HaversineCost,
}

impl HaversineProvider {
    pub fn new(depot: (f64, f64), cost: HaversineCost) -> Self {
        let mut coordinates = HashMap::new();
        coordinates.insert(Location::Depot, depot);
        Self { coordinates, cost }
    }

    pub fn with_location(mut self, location: Location, coordinate: (f64, f64)) -> Self {
        self.coordinates.insert(location, coordinate);
        self
    }

    /// Calculate haversine distance between two points in kilometers.
    pub fn haversine_km(from: (f64, f64), to: (f64, f64)) -> f64 {
        let (lat1, lng1) = from;
        let (lat2, lng2) = to;

        let lat1_rad = lat1.to_radians();
        let lat2_rad = lat2.to_radians();
        let delta_lat = (lat2 - lat1).to_radians();
        let delta_lng = (lng2 - lng1).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();

        EARTH_RADIUS_KM * c
    }
}

impl DistanceProvider for HaversineProvider {
    fn cost(&self, from: &Location, to: &Location) -> Option<f64> {
        if from == to {
            return Some(0.0);
        }

        let km = Self::haversine_km(*self.coordinates.get(from)?, *self.coordinates.get(to)?);
        Some(match self.cost {
            HaversineCost::Kilometers => km,
            HaversineCost::Seconds { speed_kmh } => (km / speed_kmh * 3600.0).round(),
        })
    }
}
