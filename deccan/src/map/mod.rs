//! Map rendering surface abstraction and the components that drive it.
//!
//! The explorer core never talks to a concrete map widget. Everything it
//! needs from the rendering surface - attaching sources and layers, placing
//! markers, moving the camera - goes through the [`MapSurface`] trait, so the
//! same core runs against any backend that can draw styled geo-features.
//!
//! Two components own the surface handle:
//!
//! * [`LayerManager`] is the single owner of the layer/source set. No other
//!   component issues layer mutations.
//! * [`ViewportController`] issues camera transitions.

use std::sync::Arc;

use geojson::FeatureCollection;

use crate::color::Color;
use crate::error::DeccanError;
use crate::geo::{GeoBounds, GeoPoint};

mod layer_manager;
mod viewport;

pub use layer_manager::{
    LayerManager, BORDER_LAYER, BORDER_SOURCE, DESTINATION_MARKER, DIVISIONS_LAYER,
    DIVISIONS_SOURCE, PLACES_LAYER, PLACES_SOURCE, ROUTE_LAYER, ROUTE_SOURCE, USER_MARKER,
};
pub use viewport::{
    focus_place, reframe, CameraCommand, ViewportController, ViewportInputs, DEGENERATE_MARGIN_DEG,
    DETAIL_ZOOM,
};

/// The rendering surface handle shared between the layer manager and the
/// viewport controller.
pub type SharedSurface<S> = Arc<parking_lot::Mutex<S>>;

/// Paint properties of a line layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinePaint {
    /// Stroke color.
    pub color: Color,
    /// Stroke width in pixels.
    pub width: f64,
    /// Opacity in `0.0..=1.0`.
    pub opacity: f64,
}

/// Paint properties of a circle-marker layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CirclePaint {
    /// Fill color.
    pub color: Color,
    /// Circle radius in pixels.
    pub radius: f64,
    /// Outline color.
    pub stroke_color: Color,
    /// Outline width in pixels.
    pub stroke_width: f64,
}

/// How a layer draws the features of its source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LayerPaint {
    /// Line geometry rendering.
    Line(LinePaint),
    /// Point geometry rendering as filled circles.
    Circle(CirclePaint),
}

/// Declarative description of a single map layer bound to a source.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSpec {
    /// Unique layer id. Attaching two layers under the same id is a fatal
    /// condition against the rendering surface.
    pub id: String,
    /// Id of the source the layer draws.
    pub source: String,
    /// Paint properties.
    pub paint: LayerPaint,
}

/// The rendering surface seam.
///
/// Implementations are expected to be thin: every method maps to a single
/// operation of the underlying map widget. All ordering and lifecycle
/// guarantees (detach before re-attach, style-readiness gating, handler
/// unbinding) are provided by [`LayerManager`], not by the surface.
pub trait MapSurface: Send {
    /// Adds a geo-feature source under the given id.
    fn add_source(&mut self, id: &str, data: FeatureCollection) -> Result<(), DeccanError>;

    /// Adds a layer. Returns [`DeccanError::DuplicateLayer`] if a layer with
    /// the same id is already attached.
    fn add_layer(&mut self, spec: &LayerSpec) -> Result<(), DeccanError>;

    /// Removes a layer. Removing an unknown id is a no-op.
    fn remove_layer(&mut self, id: &str);

    /// Removes a source. Removing an unknown id is a no-op.
    fn remove_source(&mut self, id: &str);

    /// Subscribes the host to click/hover events of the given layer's
    /// features.
    fn bind_point_events(&mut self, layer_id: &str);

    /// Unsubscribes the host from the layer's feature events.
    fn unbind_point_events(&mut self, layer_id: &str);

    /// Creates a marker under the given id, or moves it if it already
    /// exists.
    fn place_marker(&mut self, id: &str, position: GeoPoint, color: Color, label: &str);

    /// Removes a marker. Removing an unknown id is a no-op.
    fn remove_marker(&mut self, id: &str);

    /// Animates the camera to frame the given bounds with the given padding
    /// (pixels) over the given duration (milliseconds).
    fn fit_bounds(&mut self, bounds: GeoBounds, padding: f64, duration_ms: u64);

    /// Animates the camera to center on a point at a fixed zoom level.
    fn fly_to(&mut self, center: GeoPoint, zoom: f64);
}
