//! Test doubles for the external seams of the crate.
//!
//! Available behind the `_tests` feature (enabled by default). Used by the
//! crate's own unit tests and by the examples; real applications plug in
//! their map widget and service clients instead.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use geojson::FeatureCollection;

use crate::color::Color;
use crate::error::DeccanError;
use crate::geo::{GeoBounds, GeoPoint};
use crate::location::Geolocator;
use crate::map::{LayerSpec, MapSurface};
use crate::reviews::{Review, ReviewStore};
use crate::route::{DirectionsService, RouteLeg};
use crate::weather::{CurrentWeather, WeatherService};

/// A camera operation recorded by [`TestSurface`].
#[derive(Debug, Clone, PartialEq)]
pub enum CameraOp {
    /// A fit-to-bounds request.
    FitBounds {
        /// Requested bounds.
        bounds: GeoBounds,
        /// Requested padding in pixels.
        padding: f64,
        /// Requested animation duration in milliseconds.
        duration_ms: u64,
    },
    /// A fly-to request.
    FlyTo {
        /// Requested center.
        center: GeoPoint,
        /// Requested zoom.
        zoom: f64,
    },
}

/// An in-memory rendering surface that records every operation.
///
/// Mirrors the strictness of a real map widget: attaching a layer or source
/// under an id that is already attached is an error, and layers require
/// their source to exist.
#[derive(Default)]
pub struct TestSurface {
    sources: HashMap<String, FeatureCollection>,
    layers: Vec<LayerSpec>,
    markers: HashMap<String, (GeoPoint, Color, String)>,
    bindings: HashMap<String, usize>,
    attach_counts: HashMap<String, usize>,
    duplicate_attaches: Vec<String>,
    camera: Vec<CameraOp>,
}

impl TestSurface {
    /// Creates an empty surface.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a layer with the given id is attached.
    pub fn has_layer(&self, id: &str) -> bool {
        self.layers.iter().any(|layer| layer.id == id)
    }

    /// Whether a source with the given id is attached.
    pub fn has_source(&self, id: &str) -> bool {
        self.sources.contains_key(id)
    }

    /// The data of an attached source.
    pub fn source(&self, id: &str) -> Option<&FeatureCollection> {
        self.sources.get(id)
    }

    /// Ids of all attached layers, in attachment order.
    pub fn layer_ids(&self) -> Vec<String> {
        self.layers.iter().map(|layer| layer.id.clone()).collect()
    }

    /// Ids of all attached sources.
    pub fn source_ids(&self) -> Vec<String> {
        self.sources.keys().cloned().collect()
    }

    /// Position, color and label of a marker.
    pub fn marker(&self, id: &str) -> Option<(GeoPoint, Color, String)> {
        self.markers.get(id).cloned()
    }

    /// Count of markers currently placed.
    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    /// How many times a layer with the given id has ever been attached.
    pub fn attach_count(&self, id: &str) -> usize {
        self.attach_counts.get(id).copied().unwrap_or(0)
    }

    /// Layer ids that were attached while already present. Always empty when
    /// the layer manager does its job.
    pub fn duplicate_attaches(&self) -> &[String] {
        &self.duplicate_attaches
    }

    /// Count of currently bound event handlers for a layer. More than one
    /// means a stale handler was not unbound before re-binding.
    pub fn active_bindings(&self, layer_id: &str) -> usize {
        self.bindings.get(layer_id).copied().unwrap_or(0)
    }

    /// All camera operations, in request order.
    pub fn camera(&self) -> &[CameraOp] {
        &self.camera
    }

    /// The most recent camera operation.
    pub fn last_camera(&self) -> Option<&CameraOp> {
        self.camera.last()
    }
}

impl MapSurface for TestSurface {
    fn add_source(&mut self, id: &str, data: FeatureCollection) -> Result<(), DeccanError> {
        if self.sources.contains_key(id) {
            return Err(DeccanError::Generic(format!(
                "source {id:?} is already attached"
            )));
        }

        self.sources.insert(id.to_owned(), data);
        Ok(())
    }

    fn add_layer(&mut self, spec: &LayerSpec) -> Result<(), DeccanError> {
        if self.has_layer(&spec.id) {
            self.duplicate_attaches.push(spec.id.clone());
            return Err(DeccanError::DuplicateLayer(spec.id.clone()));
        }
        if !self.sources.contains_key(&spec.source) {
            return Err(DeccanError::Generic(format!(
                "layer {:?} references unknown source {:?}",
                spec.id, spec.source
            )));
        }

        *self.attach_counts.entry(spec.id.clone()).or_default() += 1;
        self.layers.push(spec.clone());
        Ok(())
    }

    fn remove_layer(&mut self, id: &str) {
        self.layers.retain(|layer| layer.id != id);
    }

    fn remove_source(&mut self, id: &str) {
        self.sources.remove(id);
    }

    fn bind_point_events(&mut self, layer_id: &str) {
        *self.bindings.entry(layer_id.to_owned()).or_default() += 1;
    }

    fn unbind_point_events(&mut self, layer_id: &str) {
        self.bindings.remove(layer_id);
    }

    fn place_marker(&mut self, id: &str, position: GeoPoint, color: Color, label: &str) {
        self.markers
            .insert(id.to_owned(), (position, color, label.to_owned()));
    }

    fn remove_marker(&mut self, id: &str) {
        self.markers.remove(id);
    }

    fn fit_bounds(&mut self, bounds: GeoBounds, padding: f64, duration_ms: u64) {
        self.camera.push(CameraOp::FitBounds {
            bounds,
            padding,
            duration_ms,
        });
    }

    fn fly_to(&mut self, center: GeoPoint, zoom: f64) {
        self.camera.push(CameraOp::FlyTo { center, zoom });
    }
}

/// A [`DirectionsService`] returning a configurable leg, counting its calls.
pub struct StaticDirections {
    leg: parking_lot::Mutex<Option<RouteLeg>>,
    calls: AtomicUsize,
}

impl StaticDirections {
    /// Resolves to the given leg until changed with
    /// [`StaticDirections::set_leg`].
    pub fn with_leg(leg: RouteLeg) -> Self {
        Self {
            leg: parking_lot::Mutex::new(Some(leg)),
            calls: AtomicUsize::new(0),
        }
    }

    /// Fails with [`DeccanError::NoRoute`] until a leg is set.
    pub fn no_route() -> Self {
        Self {
            leg: parking_lot::Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    /// Changes the response of subsequent requests. `None` makes them fail
    /// with [`DeccanError::NoRoute`].
    pub fn set_leg(&self, leg: Option<RouteLeg>) {
        *self.leg.lock() = leg;
    }

    /// How many route requests were issued.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DirectionsService for StaticDirections {
    async fn route(
        &self,
        _origin: GeoPoint,
        _destination: GeoPoint,
    ) -> Result<RouteLeg, DeccanError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.leg.lock().clone().ok_or(DeccanError::NoRoute)
    }
}

/// A [`Geolocator`] returning a fixed position, counting its calls.
pub struct FixedGeolocator {
    position: Option<GeoPoint>,
    calls: AtomicUsize,
}

impl FixedGeolocator {
    /// Always resolves to the given position.
    pub fn at(position: GeoPoint) -> Self {
        Self {
            position: Some(position),
            calls: AtomicUsize::new(0),
        }
    }

    /// Always fails with [`DeccanError::LocationUnavailable`].
    pub fn unavailable() -> Self {
        Self {
            position: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// How many position queries were issued.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Geolocator for FixedGeolocator {
    async fn current_position(&self) -> Result<GeoPoint, DeccanError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.position.ok_or(DeccanError::LocationUnavailable)
    }
}

/// A [`ReviewStore`] backed by an in-memory map.
#[derive(Default)]
pub struct StaticReviews {
    reviews: HashMap<String, Vec<Review>>,
    failing: Vec<String>,
}

impl StaticReviews {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one review per rating for the given place.
    pub fn with_ratings(mut self, place: &str, ratings: &[f64]) -> Self {
        let reviews = ratings
            .iter()
            .enumerate()
            .map(|(index, rating)| Review {
                place: place.to_owned(),
                rating: *rating,
                text: String::new(),
                author_name: format!("User {index}"),
                author_photo: None,
                author_id: format!("user-{index}"),
                date_ms: index as u64,
            })
            .collect();
        self.reviews.insert(place.to_owned(), reviews);
        self
    }

    /// Records full review records for the given place.
    pub fn with_reviews(mut self, place: &str, reviews: Vec<Review>) -> Self {
        self.reviews.insert(place.to_owned(), reviews);
        self
    }

    /// Makes fetches for the given place fail.
    pub fn failing_for(mut self, place: &str) -> Self {
        self.failing.push(place.to_owned());
        self
    }
}

#[async_trait]
impl ReviewStore for StaticReviews {
    async fn reviews_for(&self, place_name: &str) -> Result<Vec<Review>, DeccanError> {
        if self.failing.iter().any(|place| place == place_name) {
            return Err(DeccanError::Io);
        }

        Ok(self.reviews.get(place_name).cloned().unwrap_or_default())
    }
}

/// A [`WeatherService`] returning fixed conditions.
pub struct StaticWeather {
    weather: Option<CurrentWeather>,
}

impl StaticWeather {
    /// Always resolves to the given conditions.
    pub fn with(weather: CurrentWeather) -> Self {
        Self {
            weather: Some(weather),
        }
    }

    /// Always fails with [`DeccanError::WeatherUnavailable`].
    pub fn unavailable() -> Self {
        Self { weather: None }
    }
}

#[async_trait]
impl WeatherService for StaticWeather {
    async fn current(&self, _position: GeoPoint) -> Result<CurrentWeather, DeccanError> {
        self.weather.clone().ok_or(DeccanError::WeatherUnavailable)
    }
}
