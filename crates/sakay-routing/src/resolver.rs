//! Road-following route resolution with a straight-line fallback.
//!
//! [`RouteResolver::resolve`] is infallible by contract: a network failure,
//! a non-`Ok` routing code, or a malformed payload all degrade to the
//! two-point path `[origin, destination]`. Callers cannot distinguish the
//! fallback from a genuine two-point route; both are valid polylines to
//! render, and the tracking view treats them identically.

use std::time::Duration;

use reqwest::{Client, Url};

use crate::error::RoutingError;
use crate::types::OsrmResponse;
use sakay_core::LatLng;

/// Client for an OSRM-compatible `/route/v1/driving` endpoint.
#[derive(Debug, Clone)]
pub struct RouteResolver {
    client: Client,
    base_url: Url,
}

impl RouteResolver {
    /// Creates a resolver with the given base URL, timeout, and user agent.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`RoutingError::InvalidBaseUrl`] if
    /// `base_url` does not parse.
    pub fn new(base_url: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, RoutingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| RoutingError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self { client, base_url })
    }

    /// Resolves a road-following path from `origin` to `destination`.
    ///
    /// Always returns a polyline with at least two points; on any failure
    /// the result is exactly `[origin, destination]`.
    pub async fn resolve(&self, origin: LatLng, destination: LatLng) -> Vec<LatLng> {
        match self.fetch_route(origin, destination).await {
            Ok(path) => path,
            Err(err) => {
                tracing::debug!(
                    %origin,
                    %destination,
                    error = %err,
                    "route fetch failed; falling back to straight line"
                );
                vec![origin, destination]
            }
        }
    }

    /// Fetches and decodes one route, surfacing every failure mode.
    ///
    /// # Errors
    ///
    /// - [`RoutingError::Http`] on network failure or non-2xx status.
    /// - [`RoutingError::ServiceCode`] when the service answers with a
    ///   non-`Ok` routing code.
    /// - [`RoutingError::Deserialize`] on a malformed body.
    /// - [`RoutingError::EmptyRoute`] when no route has two or more points.
    pub(crate) async fn fetch_route(
        &self,
        origin: LatLng,
        destination: LatLng,
    ) -> Result<Vec<LatLng>, RoutingError> {
        // OSRM takes lng,lat pairs in the path segment.
        let url = self
            .base_url
            .join(&format!(
                "route/v1/driving/{},{};{},{}",
                origin.lng, origin.lat, destination.lng, destination.lat
            ))
            .map_err(|e| RoutingError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;

        let response = self
            .client
            .get(url)
            .query(&[("overview", "full"), ("geometries", "geojson")])
            .send()
            .await?
            .error_for_status()?;

        let text = response.text().await?;
        let parsed: OsrmResponse =
            serde_json::from_str(&text).map_err(|e| RoutingError::Deserialize {
                context: format!("route {origin} -> {destination}"),
                source: e,
            })?;

        if parsed.code != "Ok" {
            return Err(RoutingError::ServiceCode { code: parsed.code });
        }

        let path: Vec<LatLng> = parsed
            .routes
            .into_iter()
            .next()
            .map(|route| {
                route
                    .geometry
                    .coordinates
                    .into_iter()
                    // GeoJSON is [lng, lat]; everything downstream is lat-first.
                    .map(|[lng, lat]| LatLng::new(lat, lng))
                    .collect()
            })
            .unwrap_or_default();

        if path.len() < 2 {
            return Err(RoutingError::EmptyRoute);
        }
        Ok(path)
    }
}
