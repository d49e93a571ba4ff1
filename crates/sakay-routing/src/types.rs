//! Wire types for the OSRM-compatible routing service.

use serde::Deserialize;

/// Top-level OSRM response envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct OsrmResponse {
    pub code: String,
    #[serde(default)]
    pub routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OsrmRoute {
    pub geometry: OsrmGeometry,
}

/// GeoJSON LineString geometry. Positions are longitude-first on the wire
/// and flipped to latitude-first at the decode boundary.
#[derive(Debug, Deserialize)]
pub(crate) struct OsrmGeometry {
    #[serde(default)]
    pub coordinates: Vec<[f64; 2]>,
}
