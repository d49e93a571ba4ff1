//! Coordinate primitives shared by the booking, routing, and tracking crates.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters, per the IUGG spherical approximation.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A latitude-first coordinate pair in decimal degrees.
///
/// Every path and marker position in this workspace is latitude-first;
/// sources that deliver longitude-first positions (GeoJSON) are flipped at
/// the decoding boundary, never downstream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Great-circle (haversine) distance to `other`, in meters.
    #[must_use]
    pub fn distance_m(&self, other: &Self) -> f64 {
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lng = (other.lng - self.lng).to_radians();
        let a = (d_lat / 2.0).sin().powi(2)
            + self.lat.to_radians().cos() * other.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().asin()
    }

    /// Returns the point `fraction` of the way from `self` toward `target`,
    /// interpolated linearly in degree space.
    ///
    /// Linear interpolation is adequate here: callers only step across
    /// city-scale distances where the flat-earth error is negligible.
    #[must_use]
    pub fn step_toward(&self, target: &Self, fraction: f64) -> Self {
        Self {
            lat: self.lat + (target.lat - self.lat) * fraction,
            lng: self.lng + (target.lng - self.lng) * fraction,
        }
    }
}

impl std::fmt::Display for LatLng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6},{:.6}", self.lat, self.lng)
    }
}
