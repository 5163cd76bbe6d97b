//! Geographic coordinates.

use serde::{Deserialize, Serialize};

/// A `[latitude, longitude]` pair as written in route geometries.
pub type Coordinate = [f64; 2];

/// A WGS84 position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Build from a GeoJSON-style `[lon, lat]` position.
    pub fn from_lon_lat(position: &[f64]) -> Option<Self> {
        match position {
            [lon, lat, ..] => Some(Self::new(*lat, *lon)),
            _ => None,
        }
    }

    pub fn to_coordinate(self) -> Coordinate {
        [self.lat, self.lon]
    }
}
