//! Single owner of the map's layer/source set.

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue};

use super::{CirclePaint, LayerPaint, LayerSpec, LinePaint, MapSurface, SharedSurface};
use crate::catalog::Place;
use crate::color::Color;
use crate::geo::GeoPoint;
use crate::route::RouteState;

/// Source id of the outer administrative boundary.
pub const BORDER_SOURCE: &str = "border";
/// Layer id of the outer administrative boundary.
pub const BORDER_LAYER: &str = "border-line";
/// Source id of the internal divisions.
pub const DIVISIONS_SOURCE: &str = "divisions";
/// Layer id of the internal divisions.
pub const DIVISIONS_LAYER: &str = "divisions-line";
/// Source id of the place markers.
pub const PLACES_SOURCE: &str = "places";
/// Layer id of the place markers.
pub const PLACES_LAYER: &str = "places-points";
/// Source id of the active route overlay.
pub const ROUTE_SOURCE: &str = "route";
/// Layer id of the active route overlay.
pub const ROUTE_LAYER: &str = "route-line";
/// Marker id of the user location.
pub const USER_MARKER: &str = "user-location";
/// Marker id of the route destination.
pub const DESTINATION_MARKER: &str = "destination";

const BORDER_PAINT: LinePaint = LinePaint {
    color: Color::from_hex("#bc004c"),
    width: 3.0,
    opacity: 0.9,
};
const DIVISIONS_PAINT: LinePaint = LinePaint {
    color: Color::from_hex("#2095F3"),
    width: 2.0,
    opacity: 0.9,
};
const PLACES_PAINT: CirclePaint = CirclePaint {
    color: Color::from_hex("#ffb700"),
    radius: 7.0,
    stroke_color: Color::from_hex("#333333"),
    stroke_width: 2.0,
};
const ROUTE_PAINT: LinePaint = LinePaint {
    color: Color::from_hex("#e74c3c"),
    width: 7.0,
    opacity: 0.9,
};
const USER_MARKER_COLOR: Color = Color::from_hex("#317aff");
const DESTINATION_MARKER_COLOR: Color = Color::from_hex("#e74c3c");

#[derive(Default)]
struct DesiredState {
    border: Option<FeatureCollection>,
    divisions: Option<FeatureCollection>,
    places: Vec<Place>,
    route: Option<RouteState>,
    user_location: Option<GeoPoint>,
}

#[derive(Debug, Default, Clone, Copy)]
struct GroupMask {
    border: bool,
    divisions: bool,
    places: bool,
    route: bool,
    user_location: bool,
}

impl GroupMask {
    const ALL: GroupMask = GroupMask {
        border: true,
        divisions: true,
        places: true,
        route: true,
        user_location: true,
    };

    fn any(&self) -> bool {
        self.border || self.divisions || self.places || self.route || self.user_location
    }
}

/// Keeps the rendering surface's source/layer set consistent with the
/// filtered catalog and the route state.
///
/// The manager holds a declarative *desired state* per layer group and
/// reconciles the surface against it. Reconciliation always fully detaches a
/// group (events unbound, layer removed, then its source removed) before
/// re-attaching it, so a layer id is never attached twice.
///
/// All mutations are gated behind the style-readiness signal: requests
/// arriving before [`LayerManager::on_style_ready`] only update the desired
/// state, and the *latest* desired state is applied exactly once when
/// readiness is signaled. Requests arriving after readiness apply
/// immediately.
pub struct LayerManager<S: MapSurface> {
    surface: SharedSurface<S>,
    style_ready: bool,
    desired: DesiredState,
    dirty: GroupMask,
    attached: GroupMask,
}

impl<S: MapSurface> LayerManager<S> {
    /// Creates a manager over an unready surface. Nothing is attached until
    /// readiness is signaled.
    pub fn new(surface: SharedSurface<S>) -> Self {
        Self {
            surface,
            style_ready: false,
            desired: DesiredState::default(),
            dirty: GroupMask::default(),
            attached: GroupMask::default(),
        }
    }

    /// Whether the style-readiness gate is open.
    pub fn is_style_ready(&self) -> bool {
        self.style_ready
    }

    /// Opens the gate and applies the latest desired state once. Intermediate
    /// states requested while the gate was closed are never replayed.
    pub fn on_style_ready(&mut self) {
        if self.style_ready {
            return;
        }

        self.style_ready = true;
        self.dirty = GroupMask::ALL;
        self.sync();
    }

    /// Sets the outer boundary document, or detaches it with `None`.
    pub fn set_border(&mut self, border: Option<FeatureCollection>) {
        self.desired.border = border;
        self.dirty.border = true;
        self.sync();
    }

    /// Sets the internal divisions document, or detaches it with `None`.
    pub fn set_divisions(&mut self, divisions: Option<FeatureCollection>) {
        self.desired.divisions = divisions;
        self.dirty.divisions = true;
        self.sync();
    }

    /// Sets the point layer contents. The layer is fully rebuilt on every
    /// call; places without valid coordinates are skipped, and an empty set
    /// leaves the layer detached.
    pub fn set_places(&mut self, places: &[Place]) {
        self.desired.places = places.to_vec();
        self.dirty.places = true;
        self.sync();
    }

    /// Installs a route overlay (with its destination marker), replacing any
    /// previous one, or removes it with `None`. Two routes never coexist.
    pub fn set_route(&mut self, route: Option<RouteState>) {
        self.desired.route = route;
        self.dirty.route = true;
        self.sync();
    }

    /// Places or moves the user-location marker, or removes it with `None`.
    pub fn set_user_location(&mut self, location: Option<GeoPoint>) {
        self.desired.user_location = location;
        self.dirty.user_location = true;
        self.sync();
    }

    /// Detaches everything owned by the manager. After this call no layer,
    /// source, marker or event binding of the manager remains on the
    /// surface.
    pub fn clear(&mut self) {
        self.desired = DesiredState::default();
        if self.style_ready {
            self.dirty = GroupMask::ALL;
            self.sync();
        } else {
            // Gate closed: nothing was ever attached.
            self.dirty = GroupMask::default();
        }
    }

    fn sync(&mut self) {
        if !self.style_ready || !self.dirty.any() {
            return;
        }

        let surface = self.surface.clone();
        let mut surface = surface.lock();

        if self.dirty.border {
            self.dirty.border = false;
            if self.attached.border {
                surface.remove_layer(BORDER_LAYER);
                surface.remove_source(BORDER_SOURCE);
                self.attached.border = false;
            }
            if let Some(border) = self.desired.border.clone() {
                self.attached.border = attach_line(
                    &mut *surface,
                    BORDER_SOURCE,
                    BORDER_LAYER,
                    border,
                    BORDER_PAINT,
                );
            }
        }

        if self.dirty.divisions {
            self.dirty.divisions = false;
            if self.attached.divisions {
                surface.remove_layer(DIVISIONS_LAYER);
                surface.remove_source(DIVISIONS_SOURCE);
                self.attached.divisions = false;
            }
            if let Some(divisions) = self.desired.divisions.clone() {
                self.attached.divisions = attach_line(
                    &mut *surface,
                    DIVISIONS_SOURCE,
                    DIVISIONS_LAYER,
                    divisions,
                    DIVISIONS_PAINT,
                );
            }
        }

        if self.dirty.places {
            self.dirty.places = false;
            if self.attached.places {
                // Stale handlers must never survive a rebuild.
                surface.unbind_point_events(PLACES_LAYER);
                surface.remove_layer(PLACES_LAYER);
                surface.remove_source(PLACES_SOURCE);
                self.attached.places = false;
            }
            let collection = places_collection(&self.desired.places);
            if !collection.features.is_empty() {
                let spec = LayerSpec {
                    id: PLACES_LAYER.into(),
                    source: PLACES_SOURCE.into(),
                    paint: LayerPaint::Circle(PLACES_PAINT),
                };
                if attach(&mut *surface, PLACES_SOURCE, collection, spec) {
                    surface.bind_point_events(PLACES_LAYER);
                    self.attached.places = true;
                }
            }
        }

        if self.dirty.route {
            self.dirty.route = false;
            if self.attached.route {
                surface.remove_layer(ROUTE_LAYER);
                surface.remove_source(ROUTE_SOURCE);
                surface.remove_marker(DESTINATION_MARKER);
                self.attached.route = false;
            }
            if let Some(route) = &self.desired.route {
                let spec = LayerSpec {
                    id: ROUTE_LAYER.into(),
                    source: ROUTE_SOURCE.into(),
                    paint: LayerPaint::Line(ROUTE_PAINT),
                };
                if attach(&mut *surface, ROUTE_SOURCE, route_collection(route), spec) {
                    let destination = route.destination();
                    surface.place_marker(
                        DESTINATION_MARKER,
                        destination.position,
                        DESTINATION_MARKER_COLOR,
                        &destination.name,
                    );
                    self.attached.route = true;
                }
            }
        }

        if self.dirty.user_location {
            self.dirty.user_location = false;
            match self.desired.user_location {
                Some(position) => {
                    surface.place_marker(USER_MARKER, position, USER_MARKER_COLOR, "Your location");
                    self.attached.user_location = true;
                }
                None => {
                    if self.attached.user_location {
                        surface.remove_marker(USER_MARKER);
                        self.attached.user_location = false;
                    }
                }
            }
        }
    }
}

impl<S: MapSurface> Drop for LayerManager<S> {
    fn drop(&mut self) {
        self.clear();
    }
}

fn attach_line<S: MapSurface + ?Sized>(
    surface: &mut S,
    source: &str,
    layer: &str,
    data: FeatureCollection,
    paint: LinePaint,
) -> bool {
    let spec = LayerSpec {
        id: layer.into(),
        source: source.into(),
        paint: LayerPaint::Line(paint),
    };
    attach(surface, source, data, spec)
}

fn attach<S: MapSurface + ?Sized>(
    surface: &mut S,
    source: &str,
    data: FeatureCollection,
    spec: LayerSpec,
) -> bool {
    if let Err(error) = surface.add_source(source, data) {
        log::error!("failed to add source {source:?}: {error}");
        return false;
    }
    if let Err(error) = surface.add_layer(&spec) {
        log::error!("failed to add layer {:?}: {error}", spec.id);
        surface.remove_source(source);
        return false;
    }

    true
}

/// Builds the point-layer source from the filtered catalog. Places without
/// valid coordinates are excluded from the map (they stay in the catalog for
/// listings).
fn places_collection(places: &[Place]) -> FeatureCollection {
    let features = places
        .iter()
        .filter_map(|place| {
            let position = place.position?;
            let mut properties = JsonObject::new();
            properties.insert("Places".into(), JsonValue::String(place.name.clone()));
            for (key, value) in [
                ("Category", &place.category),
                ("District", &place.district),
                ("Location", &place.location),
            ] {
                if let Some(value) = value {
                    properties.insert(key.into(), JsonValue::String(value.clone()));
                }
            }

            Some(Feature {
                bbox: None,
                geometry: Some(Geometry::new(geojson::Value::Point(vec![
                    position.lon(),
                    position.lat(),
                ]))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            })
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

fn route_collection(route: &RouteState) -> FeatureCollection {
    let coordinates = route
        .geometry()
        .iter()
        .map(|point| vec![point.lon(), point.lat()])
        .collect();

    FeatureCollection {
        bbox: None,
        features: vec![Feature {
            bbox: None,
            geometry: Some(Geometry::new(geojson::Value::LineString(coordinates))),
            id: None,
            properties: None,
            foreign_members: None,
        }],
        foreign_members: None,
    }
}
