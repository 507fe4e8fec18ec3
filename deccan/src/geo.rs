//! Geographic primitives used throughout the crate.
//!
//! All coordinates are in degrees on WGS84. Distances are computed with a
//! flat-earth approximation that is adequate at the sub-100 km scale the
//! rankers operate on; it is not a great-circle implementation.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// 2d point on the Earth surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct GeoPoint {
    lat: f64,
    lon: f64,
}

impl GeoPoint {
    /// Creates a new point from latitude and longitude values (in degrees).
    pub fn latlon(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Latitude in degrees.
    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude in degrees.
    pub fn lon(&self) -> f64 {
        self.lon
    }

    /// Returns true if both coordinates are finite numbers.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }

    /// Distance to `other` in kilometers.
    ///
    /// The latitude delta is projected directly and the longitude delta is
    /// scaled by the cosine of the mean latitude before scaling by the Earth
    /// radius.
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lon = (other.lon - self.lon).to_radians();
        let mean_lat = ((self.lat + other.lat) / 2.0).to_radians();
        let x = d_lon * mean_lat.cos();
        let y = d_lat;
        EARTH_RADIUS_KM * (x * x + y * y).sqrt()
    }
}

/// Axis-aligned geographic bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    /// Western edge in degrees of longitude.
    pub lon_min: f64,
    /// Southern edge in degrees of latitude.
    pub lat_min: f64,
    /// Eastern edge in degrees of longitude.
    pub lon_max: f64,
    /// Northern edge in degrees of latitude.
    pub lat_max: f64,
}

impl GeoBounds {
    /// Creates a bounding box from its edges.
    pub fn new(lon_min: f64, lat_min: f64, lon_max: f64, lat_max: f64) -> Self {
        Self {
            lon_min,
            lat_min,
            lon_max,
            lat_max,
        }
    }

    /// Creates a zero-area bounding box containing a single point.
    pub fn from_point(point: GeoPoint) -> Self {
        Self {
            lon_min: point.lon(),
            lat_min: point.lat(),
            lon_max: point.lon(),
            lat_max: point.lat(),
        }
    }

    /// Computes the bounding box of a set of points. Returns `None` for an
    /// empty input.
    pub fn from_points(points: impl IntoIterator<Item = GeoPoint>) -> Option<Self> {
        let mut points = points.into_iter();
        let mut bounds = Self::from_point(points.next()?);
        for point in points {
            bounds = bounds.merge(Self::from_point(point));
        }

        Some(bounds)
    }

    /// Returns the smallest bounding box containing both `self` and `other`.
    pub fn merge(&self, other: Self) -> Self {
        Self {
            lon_min: self.lon_min.min(other.lon_min),
            lat_min: self.lat_min.min(other.lat_min),
            lon_max: self.lon_max.max(other.lon_max),
            lat_max: self.lat_max.max(other.lat_max),
        }
    }

    /// Width of the box in degrees of longitude.
    pub fn width(&self) -> f64 {
        self.lon_max - self.lon_min
    }

    /// Height of the box in degrees of latitude.
    pub fn height(&self) -> f64 {
        self.lat_max - self.lat_min
    }

    /// Center point of the box.
    pub fn center(&self) -> GeoPoint {
        GeoPoint::latlon(
            (self.lat_min + self.lat_max) / 2.0,
            (self.lon_min + self.lon_max) / 2.0,
        )
    }

    /// A box collapses to a line or a point when its min and max coincide on
    /// either axis. Such boxes must not be used as fit targets.
    pub fn is_degenerate(&self) -> bool {
        self.lon_min == self.lon_max || self.lat_min == self.lat_max
    }

    /// Expands every edge outwards by `margin` degrees.
    pub fn pad(&self, margin: f64) -> Self {
        Self {
            lon_min: self.lon_min - margin,
            lat_min: self.lat_min - margin,
            lon_max: self.lon_max + margin,
            lat_max: self.lat_max + margin,
        }
    }

    /// Returns true if the point lies within the box (edges inclusive).
    pub fn contains(&self, point: &GeoPoint) -> bool {
        self.lon_min <= point.lon()
            && self.lon_max >= point.lon()
            && self.lat_min <= point.lat()
            && self.lat_max >= point.lat()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn distance_along_meridian() {
        let a = GeoPoint::latlon(18.0, 73.5);
        let b = GeoPoint::latlon(19.0, 73.5);
        // One degree of latitude is ~111.2 km everywhere.
        assert_relative_eq!(a.distance_km(&b), 111.2, epsilon = 0.5);
    }

    #[test]
    fn distance_shrinks_with_latitude() {
        let equator = GeoPoint::latlon(0.0, 0.0).distance_km(&GeoPoint::latlon(0.0, 1.0));
        let north = GeoPoint::latlon(60.0, 0.0).distance_km(&GeoPoint::latlon(60.0, 1.0));
        assert!(north < equator * 0.55);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = GeoPoint::latlon(18.52, 73.86);
        let b = GeoPoint::latlon(18.75, 73.41);
        assert_relative_eq!(a.distance_km(&b), b.distance_km(&a));
    }

    #[test]
    fn bounds_of_points() {
        let bounds = GeoBounds::from_points(vec![
            GeoPoint::latlon(18.5, 73.5),
            GeoPoint::latlon(18.6, 73.6),
            GeoPoint::latlon(18.55, 73.4),
        ])
        .expect("non-empty input");

        assert_eq!(bounds, GeoBounds::new(73.4, 18.5, 73.6, 18.6));
    }

    #[test]
    fn bounds_of_nothing() {
        assert!(GeoBounds::from_points(vec![]).is_none());
    }

    #[test]
    fn single_point_is_degenerate() {
        let bounds = GeoBounds::from_point(GeoPoint::latlon(18.5, 73.5));
        assert!(bounds.is_degenerate());

        let padded = bounds.pad(0.07);
        assert!(!padded.is_degenerate());
        assert_relative_eq!(padded.lon_min, 73.43, epsilon = 1e-9);
        assert_relative_eq!(padded.lon_max, 73.57, epsilon = 1e-9);
        assert_relative_eq!(padded.lat_min, 18.43, epsilon = 1e-9);
        assert_relative_eq!(padded.lat_max, 18.57, epsilon = 1e-9);
    }

    #[test]
    fn merge_covers_both() {
        let a = GeoBounds::new(73.0, 18.0, 74.0, 19.0);
        let b = GeoBounds::new(72.5, 18.5, 73.5, 19.5);
        assert_eq!(a.merge(b), GeoBounds::new(72.5, 18.0, 74.0, 19.5));
    }
}
