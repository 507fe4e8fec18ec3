//! Route resolution via an external directions service.
//!
//! A route goes from the user's current position to a chosen destination
//! place. At most one [`RouteState`] exists at a time: a new resolution fully
//! replaces the previous route, and a failed resolution leaves no partial
//! state behind.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use geojson::{FeatureCollection, GeoJson};
use serde_json::json;

use crate::catalog::Place;
use crate::error::DeccanError;
use crate::geo::{GeoBounds, GeoPoint};
use crate::location::Geolocator;

/// Default endpoint of the OpenRouteService directions API.
pub const ORS_ENDPOINT: &str = "https://api.openrouteservice.org/v2/directions/driving-car/geojson";

/// Travel summary of a resolved route.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteSummary {
    /// Travel distance in meters.
    pub distance_m: f64,
    /// Travel duration in seconds.
    pub duration_s: f64,
}

/// The endpoint of a route.
#[derive(Debug, Clone, PartialEq)]
pub struct Destination {
    /// Display name of the destination place.
    pub name: String,
    /// Destination coordinates.
    pub position: GeoPoint,
}

/// A successfully resolved route.
#[derive(Debug, Clone)]
pub struct RouteState {
    geometry: Vec<GeoPoint>,
    destination: Destination,
    summary: RouteSummary,
    arrival: SystemTime,
}

impl RouteState {
    /// Creates a route state from a resolved leg.
    ///
    /// The arrival time is captured here, at the moment the summary is
    /// received, and is never recomputed afterwards.
    pub fn new(geometry: Vec<GeoPoint>, destination: Destination, summary: RouteSummary) -> Self {
        let arrival = SystemTime::now() + Duration::from_secs_f64(summary.duration_s.max(0.0));
        Self {
            geometry,
            destination,
            summary,
            arrival,
        }
    }

    /// The route polyline, ordered from origin to destination.
    pub fn geometry(&self) -> &[GeoPoint] {
        &self.geometry
    }

    /// The destination of the route.
    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    /// Travel distance and duration.
    pub fn summary(&self) -> RouteSummary {
        self.summary
    }

    /// Travel distance in kilometers.
    pub fn distance_km(&self) -> f64 {
        self.summary.distance_m / 1000.0
    }

    /// Travel duration in whole minutes, rounded.
    pub fn duration_min(&self) -> u64 {
        (self.summary.duration_s / 60.0).round() as u64
    }

    /// Estimated arrival time, captured when the route was resolved.
    pub fn arrival_time(&self) -> SystemTime {
        self.arrival
    }

    /// Bounding box of the route polyline. `None` for an empty polyline.
    pub fn bounds(&self) -> Option<GeoBounds> {
        GeoBounds::from_points(self.geometry.iter().copied())
    }
}

/// A route polyline with its travel summary, as returned by a directions
/// service.
#[derive(Debug, Clone)]
pub struct RouteLeg {
    /// Polyline from origin to destination.
    pub geometry: Vec<GeoPoint>,
    /// Travel summary.
    pub summary: RouteSummary,
}

/// External directions service seam.
#[async_trait]
pub trait DirectionsService: Send + Sync {
    /// Resolves a single route from `origin` to `destination`.
    async fn route(&self, origin: GeoPoint, destination: GeoPoint)
        -> Result<RouteLeg, DeccanError>;
}

/// OpenRouteService-backed [`DirectionsService`].
pub struct OrsDirections {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl OrsDirections {
    /// Creates a client against the public OpenRouteService endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_endpoint(reqwest::Client::new(), ORS_ENDPOINT, api_key)
    }

    /// Creates a client against a custom endpoint (self-hosted instances,
    /// tests).
    pub fn with_endpoint(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl DirectionsService for OrsDirections {
    async fn route(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
    ) -> Result<RouteLeg, DeccanError> {
        let body = json!({
            "coordinates": [
                [origin.lon(), origin.lat()],
                [destination.lon(), destination.lat()],
            ],
        });

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", &self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        parse_directions_response(&response)
    }
}

/// Parses a directions response: a feature collection whose first feature
/// carries the route polyline and a `summary` property. Absence of any
/// feature is treated as "no route".
fn parse_directions_response(body: &str) -> Result<RouteLeg, DeccanError> {
    let geojson: GeoJson = body.parse()?;
    let collection = FeatureCollection::try_from(geojson)?;
    let feature = collection.features.first().ok_or(DeccanError::NoRoute)?;

    let geometry = match &feature.geometry {
        Some(geometry) => match &geometry.value {
            geojson::Value::LineString(positions) => positions
                .iter()
                .filter_map(|position| match position.as_slice() {
                    [lon, lat, ..] => Some(GeoPoint::latlon(*lat, *lon)),
                    _ => None,
                })
                .collect::<Vec<_>>(),
            _ => return Err(DeccanError::NoRoute),
        },
        None => return Err(DeccanError::NoRoute),
    };

    if geometry.is_empty() {
        return Err(DeccanError::NoRoute);
    }

    let summary = feature
        .properties
        .as_ref()
        .and_then(|properties| properties.get("summary"))
        .and_then(|summary| {
            Some(RouteSummary {
                distance_m: summary.get("distance")?.as_f64()?,
                duration_s: summary.get("duration")?.as_f64()?,
            })
        })
        .ok_or(DeccanError::NoRoute)?;

    Ok(RouteLeg { geometry, summary })
}

/// Resolves routes to destination places.
pub struct RouteController {
    directions: Arc<dyn DirectionsService>,
    geolocator: Arc<dyn Geolocator>,
}

impl RouteController {
    /// Creates a controller over the given service seams.
    pub fn new(directions: Arc<dyn DirectionsService>, geolocator: Arc<dyn Geolocator>) -> Self {
        Self {
            directions,
            geolocator,
        }
    }

    /// Resolves a route from the user's current position to `destination`.
    ///
    /// The position is acquired with a fresh one-shot query. If it cannot be
    /// acquired the resolution fails with
    /// [`DeccanError::LocationUnavailable`] and the routing service is never
    /// contacted.
    pub async fn resolve(&self, destination: &Place) -> Result<RouteState, DeccanError> {
        let Some(position) = destination.position else {
            return Err(DeccanError::NoDestination);
        };

        let origin = self
            .geolocator
            .current_position()
            .await
            .map_err(|_| DeccanError::LocationUnavailable)?;

        let leg = self.directions.route(origin, position).await?;

        Ok(RouteState::new(
            leg.geometry,
            Destination {
                name: destination.name.clone(),
                position,
            },
            leg.summary,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FixedGeolocator, StaticDirections};
    use assert_matches::assert_matches;

    fn place(name: &str, position: Option<GeoPoint>) -> Place {
        Place {
            name: name.into(),
            district: None,
            category: None,
            location: None,
            description: None,
            image_url: None,
            page_url: None,
            position,
        }
    }

    #[test]
    fn parses_a_directions_response() {
        let body = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {"summary": {"distance": 12345.6, "duration": 1800.0}},
                "geometry": {
                    "type": "LineString",
                    "coordinates": [[73.85, 18.52], [73.86, 18.53], [73.87, 18.55]]
                }
            }]
        }"#;

        let leg = parse_directions_response(body).expect("valid response");
        assert_eq!(leg.geometry.len(), 3);
        assert_eq!(leg.geometry[0], GeoPoint::latlon(18.52, 73.85));
        assert_eq!(leg.summary.distance_m, 12345.6);
        assert_eq!(leg.summary.duration_s, 1800.0);
    }

    #[test]
    fn empty_feature_list_is_no_route() {
        let body = r#"{"type": "FeatureCollection", "features": []}"#;
        assert_matches!(parse_directions_response(body), Err(DeccanError::NoRoute));
    }

    #[test]
    fn missing_summary_is_no_route() {
        let body = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {},
                "geometry": {"type": "LineString", "coordinates": [[73.85, 18.52], [73.86, 18.53]]}
            }]
        }"#;
        assert_matches!(parse_directions_response(body), Err(DeccanError::NoRoute));
    }

    #[tokio::test]
    async fn location_failure_never_contacts_the_service() {
        let directions = Arc::new(StaticDirections::no_route());
        let controller = RouteController::new(
            directions.clone(),
            Arc::new(FixedGeolocator::unavailable()),
        );

        let result = controller
            .resolve(&place("Fort", Some(GeoPoint::latlon(18.23, 73.44))))
            .await;

        assert_matches!(result, Err(DeccanError::LocationUnavailable));
        assert_eq!(directions.calls(), 0);
    }

    #[tokio::test]
    async fn destination_without_coordinates_fails_early() {
        let controller = RouteController::new(
            Arc::new(StaticDirections::no_route()),
            Arc::new(FixedGeolocator::at(GeoPoint::latlon(18.52, 73.85))),
        );

        let result = controller.resolve(&place("Nowhere", None)).await;
        assert_matches!(result, Err(DeccanError::NoDestination));
    }

    #[tokio::test]
    async fn resolves_a_route_and_captures_arrival() {
        let leg = RouteLeg {
            geometry: vec![GeoPoint::latlon(18.52, 73.85), GeoPoint::latlon(18.23, 73.44)],
            summary: RouteSummary {
                distance_m: 54000.0,
                duration_s: 3600.0,
            },
        };
        let controller = RouteController::new(
            Arc::new(StaticDirections::with_leg(leg)),
            Arc::new(FixedGeolocator::at(GeoPoint::latlon(18.52, 73.85))),
        );

        let before = SystemTime::now();
        let route = controller
            .resolve(&place("Fort", Some(GeoPoint::latlon(18.23, 73.44))))
            .await
            .expect("route resolves");

        assert_eq!(route.destination().name, "Fort");
        assert_eq!(route.duration_min(), 60);
        let expected = before + Duration::from_secs(3600);
        let drift = route
            .arrival_time()
            .duration_since(expected)
            .unwrap_or_default();
        assert!(drift < Duration::from_secs(5));
    }

    #[test]
    fn route_bounds_cover_the_polyline() {
        let route = RouteState::new(
            vec![
                GeoPoint::latlon(18.52, 73.85),
                GeoPoint::latlon(18.30, 73.60),
                GeoPoint::latlon(18.23, 73.44),
            ],
            Destination {
                name: "Fort".into(),
                position: GeoPoint::latlon(18.23, 73.44),
            },
            RouteSummary {
                distance_m: 54000.0,
                duration_s: 3600.0,
            },
        );

        assert_eq!(
            route.bounds().expect("non-empty polyline"),
            GeoBounds::new(73.44, 18.23, 73.85, 18.52)
        );
    }
}
