//! Camera control.
//!
//! Several independent triggers (route changes, filter changes, selection)
//! can each request a viewport change. Instead of letting them race against
//! the camera, the controller derives a single [`CameraCommand`] from the
//! current state through a strict priority list and applies that.

use super::{MapSurface, SharedSurface};
use crate::catalog::Place;
use crate::geo::{GeoBounds, GeoPoint};
use crate::route::RouteState;

/// Zoom level used when focusing a single place.
pub const DETAIL_ZOOM: f64 = 13.0;
/// Margin added to every edge of a degenerate bounding box, in degrees.
pub const DEGENERATE_MARGIN_DEG: f64 = 0.07;

const ROUTE_PADDING_PX: f64 = 100.0;
const ROUTE_FIT_MS: u64 = 900;
const FOCUS_PADDING_PX: f64 = 35.0;
const FOCUS_FIT_MS: u64 = 800;
const OVERVIEW_PADDING_PX: f64 = 30.0;
const OVERVIEW_FIT_MS: u64 = 700;

/// A single camera transition request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraCommand {
    /// Frame the given bounds with padding, animated over the given
    /// duration.
    FitBounds {
        /// Bounds to frame.
        bounds: GeoBounds,
        /// Padding around the bounds in pixels.
        padding: f64,
        /// Animation duration in milliseconds.
        duration_ms: u64,
    },
    /// Center on a point at a fixed zoom.
    FlyTo {
        /// New camera center.
        center: GeoPoint,
        /// New zoom level.
        zoom: f64,
    },
}

/// The state the reframing rules read.
#[derive(Debug, Clone, Copy)]
pub struct ViewportInputs<'a> {
    /// The active route, if any.
    pub route: Option<&'a RouteState>,
    /// The selected district, if any.
    pub selected_district: Option<&'a str>,
    /// The selected category, if any.
    pub selected_category: Option<&'a str>,
    /// The full place catalog (not the filtered subset - a district's frame
    /// covers all its places regardless of the category filter).
    pub catalog: &'a [Place],
    /// Bounding box of the outer administrative boundary, if loaded.
    pub boundary: Option<GeoBounds>,
}

/// Derives the camera transition for the current state. Rules, most specific
/// first; the first applicable rule wins:
///
/// 1. A route is present: frame the route geometry.
/// 2. A district is selected: frame that district's catalog points.
/// 3. A category is selected: frame that category's catalog points.
/// 4. Nothing is selected: frame the administrative boundary.
///
/// A rule whose bounding box is undefined (no matching points, boundary not
/// loaded) produces no transition; lower-priority rules do not take over a
/// selection that simply has no mappable places.
pub fn reframe(inputs: &ViewportInputs<'_>) -> Option<CameraCommand> {
    if let Some(route) = inputs.route {
        return Some(fit(route.bounds()?, ROUTE_PADDING_PX, ROUTE_FIT_MS));
    }

    if let Some(district) = inputs.selected_district {
        let bounds = points_bounds(inputs.catalog, |place| {
            place.district.as_deref() == Some(district)
        })?;
        return Some(fit(bounds, FOCUS_PADDING_PX, FOCUS_FIT_MS));
    }

    if let Some(category) = inputs.selected_category {
        let bounds = points_bounds(inputs.catalog, |place| {
            place.category.as_deref() == Some(category)
        })?;
        return Some(fit(bounds, FOCUS_PADDING_PX, FOCUS_FIT_MS));
    }

    Some(fit(inputs.boundary?, OVERVIEW_PADDING_PX, OVERVIEW_FIT_MS))
}

/// Selecting a single place (click, search, cross-component fly-to request)
/// overrides the reframing rules with a direct fly-to at detail zoom.
/// Returns `None` for a place without valid coordinates.
pub fn focus_place(place: &Place) -> Option<CameraCommand> {
    Some(CameraCommand::FlyTo {
        center: place.position?,
        zoom: DETAIL_ZOOM,
    })
}

fn points_bounds(catalog: &[Place], predicate: impl Fn(&Place) -> bool) -> Option<GeoBounds> {
    GeoBounds::from_points(
        catalog
            .iter()
            .filter(|place| predicate(place))
            .filter_map(|place| place.position),
    )
}

fn fit(bounds: GeoBounds, padding: f64, duration_ms: u64) -> CameraCommand {
    // A zero-area fit request would be rejected by the surface; pad it out.
    let bounds = if bounds.is_degenerate() {
        bounds.pad(DEGENERATE_MARGIN_DEG)
    } else {
        bounds
    };

    CameraCommand::FitBounds {
        bounds,
        padding,
        duration_ms,
    }
}

/// Applies camera commands to the rendering surface.
pub struct ViewportController<S: MapSurface> {
    surface: SharedSurface<S>,
}

impl<S: MapSurface> ViewportController<S> {
    /// Creates a controller over the shared surface handle.
    pub fn new(surface: SharedSurface<S>) -> Self {
        Self { surface }
    }

    /// Applies a single camera transition.
    pub fn apply(&self, command: CameraCommand) {
        let mut surface = self.surface.lock();
        match command {
            CameraCommand::FitBounds {
                bounds,
                padding,
                duration_ms,
            } => surface.fit_bounds(bounds, padding, duration_ms),
            CameraCommand::FlyTo { center, zoom } => surface.fly_to(center, zoom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::{Destination, RouteSummary};

    fn place(name: &str, district: &str, category: &str, lat: f64, lon: f64) -> Place {
        Place {
            name: name.into(),
            district: Some(district.into()),
            category: Some(category.into()),
            location: None,
            description: None,
            image_url: None,
            page_url: None,
            position: Some(GeoPoint::latlon(lat, lon)),
        }
    }

    fn catalog() -> Vec<Place> {
        vec![
            place("A", "Pune", "Fort", 18.50, 73.50),
            place("B", "Pune", "Lake", 18.60, 73.60),
            place("C", "Raigad", "Fort", 18.23, 73.44),
        ]
    }

    #[test]
    fn route_takes_priority_over_selection() {
        let catalog = catalog();
        let route = RouteState::new(
            vec![GeoPoint::latlon(18.52, 73.85), GeoPoint::latlon(18.23, 73.44)],
            Destination {
                name: "C".into(),
                position: GeoPoint::latlon(18.23, 73.44),
            },
            RouteSummary {
                distance_m: 1.0,
                duration_s: 1.0,
            },
        );

        let command = reframe(&ViewportInputs {
            route: Some(&route),
            selected_district: Some("Pune"),
            selected_category: None,
            catalog: &catalog,
            boundary: None,
        })
        .expect("route rule applies");

        assert_eq!(
            command,
            CameraCommand::FitBounds {
                bounds: GeoBounds::new(73.44, 18.23, 73.85, 18.52),
                padding: 100.0,
                duration_ms: 900,
            }
        );
    }

    #[test]
    fn district_selection_frames_its_points() {
        let catalog = catalog();
        let command = reframe(&ViewportInputs {
            route: None,
            selected_district: Some("Pune"),
            selected_category: None,
            catalog: &catalog,
            boundary: Some(GeoBounds::new(72.0, 15.0, 81.0, 22.0)),
        })
        .expect("district rule applies");

        assert_eq!(
            command,
            CameraCommand::FitBounds {
                bounds: GeoBounds::new(73.50, 18.50, 73.60, 18.60),
                padding: 35.0,
                duration_ms: 800,
            }
        );
    }

    #[test]
    fn single_place_district_is_padded_on_all_edges() {
        let catalog = catalog();
        let command = reframe(&ViewportInputs {
            route: None,
            selected_district: Some("Raigad"),
            selected_category: None,
            catalog: &catalog,
            boundary: None,
        })
        .expect("district rule applies");

        let CameraCommand::FitBounds { bounds, .. } = command else {
            panic!("expected a fit, got {command:?}");
        };
        approx::assert_relative_eq!(bounds.lon_min, 73.44 - 0.07);
        approx::assert_relative_eq!(bounds.lon_max, 73.44 + 0.07);
        approx::assert_relative_eq!(bounds.lat_min, 18.23 - 0.07);
        approx::assert_relative_eq!(bounds.lat_max, 18.23 + 0.07);
    }

    #[test]
    fn category_applies_when_no_district_is_selected() {
        let catalog = catalog();
        let command = reframe(&ViewportInputs {
            route: None,
            selected_district: None,
            selected_category: Some("Fort"),
            catalog: &catalog,
            boundary: None,
        })
        .expect("category rule applies");

        assert_eq!(
            command,
            CameraCommand::FitBounds {
                bounds: GeoBounds::new(73.44, 18.23, 73.50, 18.50),
                padding: 35.0,
                duration_ms: 800,
            }
        );
    }

    #[test]
    fn no_selection_frames_the_boundary() {
        let catalog = catalog();
        let boundary = GeoBounds::new(72.6, 15.6, 80.9, 22.0);
        let command = reframe(&ViewportInputs {
            route: None,
            selected_district: None,
            selected_category: None,
            catalog: &catalog,
            boundary: Some(boundary),
        })
        .expect("boundary rule applies");

        assert_eq!(
            command,
            CameraCommand::FitBounds {
                bounds: boundary,
                padding: 30.0,
                duration_ms: 700,
            }
        );
    }

    #[test]
    fn empty_selection_without_boundary_keeps_the_camera() {
        assert_eq!(
            reframe(&ViewportInputs {
                route: None,
                selected_district: None,
                selected_category: None,
                catalog: &[],
                boundary: None,
            }),
            None
        );
    }

    #[test]
    fn district_without_mappable_places_keeps_the_camera() {
        let mut catalog = catalog();
        for place in &mut catalog {
            place.position = None;
        }

        assert_eq!(
            reframe(&ViewportInputs {
                route: None,
                selected_district: Some("Pune"),
                selected_category: None,
                catalog: &catalog,
                boundary: Some(GeoBounds::new(72.0, 15.0, 81.0, 22.0)),
            }),
            None
        );
    }

    #[test]
    fn focusing_a_place_flies_to_detail_zoom() {
        let target = place("A", "Pune", "Fort", 18.52, 73.86);
        assert_eq!(
            focus_place(&target),
            Some(CameraCommand::FlyTo {
                center: GeoPoint::latlon(18.52, 73.86),
                zoom: DETAIL_ZOOM,
            })
        );

        let mut unmapped = target;
        unmapped.position = None;
        assert_eq!(focus_place(&unmapped), None);
    }
}
