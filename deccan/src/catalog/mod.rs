//! Place catalog.
//!
//! The catalog normalizes raw geo-feature records (property bags from one or
//! more feature-collection documents) into a flat list of [`Place`] values.
//! A place without valid coordinates stays in the catalog - it is searchable
//! and listable - but is excluded from every map layer and from
//! distance-based ranking.

use geojson::{Feature, FeatureCollection, JsonValue};
use std::collections::BTreeSet;

use crate::geo::GeoPoint;

mod filter;
mod loader;

pub use filter::FilterState;
pub use loader::{load_boundary, load_catalog, BoundaryDocument};

/// A single place of the catalog.
///
/// Identity of a place is its name together with its location string; two
/// records may share a name as long as they are at different locations.
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    /// Display name. Unique per location within the catalog.
    pub name: String,
    /// Administrative district the place belongs to.
    pub district: Option<String>,
    /// Category of the place (fort, lake, temple, ...).
    pub category: Option<String>,
    /// Human-readable locality description.
    pub location: Option<String>,
    /// Free-form description text.
    pub description: Option<String>,
    /// URL of an illustrative image.
    pub image_url: Option<String>,
    /// URL of a reference page.
    pub page_url: Option<String>,
    /// Geographic position. `None` when the source record had missing or
    /// unparseable coordinates.
    pub position: Option<GeoPoint>,
}

impl Place {
    /// Builds a place from a raw feature record. Returns `None` when the
    /// record carries no name - such records cannot be identified and are
    /// dropped from the catalog.
    pub fn from_feature(feature: &Feature) -> Option<Self> {
        let properties = feature.properties.as_ref()?;
        let name = string_property(properties, "Places")?;

        let lat = numeric_property(properties, "Latitude");
        let lon = numeric_property(properties, "Longitude");
        let position = match (lat, lon) {
            (Some(lat), Some(lon)) => {
                let point = GeoPoint::latlon(lat, lon);
                point.is_valid().then_some(point)
            }
            _ => None,
        };

        Some(Self {
            name,
            district: string_property(properties, "District"),
            category: string_property(properties, "Category"),
            location: string_property(properties, "Location"),
            description: string_property(properties, "Description"),
            image_url: string_property(properties, "Image URL"),
            page_url: string_property(properties, "Link to Page"),
            position,
        })
    }

    /// Two records are the same place when both the name and the location
    /// match. Name alone is not enough: the catalog contains namesakes in
    /// different localities.
    pub fn same_identity(&self, other: &Place) -> bool {
        self.name == other.name && self.location == other.location
    }
}

fn string_property(properties: &geojson::JsonObject, key: &str) -> Option<String> {
    match properties.get(key)? {
        JsonValue::String(value) if !value.is_empty() && value != "null" => Some(value.clone()),
        _ => None,
    }
}

/// Reads a property that may be stored either as a JSON number or as a
/// numeric string. Non-finite values count as absent.
fn numeric_property(properties: &geojson::JsonObject, key: &str) -> Option<f64> {
    let value = match properties.get(key)? {
        JsonValue::Number(value) => value.as_f64()?,
        JsonValue::String(value) => value.trim().parse().ok()?,
        _ => return None,
    };

    value.is_finite().then_some(value)
}

/// Flat catalog of places built from raw feature-collection documents.
#[derive(Debug, Clone, Default)]
pub struct PlaceIndex {
    places: Vec<Place>,
}

impl PlaceIndex {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog from a set of documents. Features of all documents
    /// are concatenated in order.
    pub fn from_documents<'a>(documents: impl IntoIterator<Item = &'a FeatureCollection>) -> Self {
        let mut index = Self::new();
        for document in documents {
            index.append_document(document);
        }

        index
    }

    /// Appends all identifiable features of the document to the catalog.
    pub fn append_document(&mut self, document: &FeatureCollection) {
        for feature in &document.features {
            match Place::from_feature(feature) {
                Some(place) => self.places.push(place),
                None => log::debug!("skipped a catalog feature without a name"),
            }
        }
    }

    /// All places of the catalog in document order.
    pub fn places(&self) -> &[Place] {
        &self.places
    }

    /// Count of places in the catalog.
    pub fn len(&self) -> usize {
        self.places.len()
    }

    /// Returns true if the catalog contains no places.
    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    /// Finds a place by name.
    pub fn get(&self, name: &str) -> Option<&Place> {
        self.places.iter().find(|place| place.name == name)
    }

    /// Sorted list of distinct non-empty category values observed across the
    /// catalog. Recomputed on every call - the catalog is the single source
    /// of truth for the filter UI.
    pub fn categories(&self) -> Vec<String> {
        self.distinct_values(|place| place.category.as_deref())
    }

    /// Sorted list of distinct non-empty district values observed across the
    /// catalog.
    pub fn districts(&self) -> Vec<String> {
        self.distinct_values(|place| place.district.as_deref())
    }

    fn distinct_values(&self, value: impl Fn(&Place) -> Option<&str>) -> Vec<String> {
        self.places
            .iter()
            .filter_map(|place| value(place))
            .map(str::to_owned)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn feature(properties: serde_json::Value) -> Feature {
        Feature {
            bbox: None,
            geometry: None,
            id: None,
            properties: properties.as_object().cloned(),
            foreign_members: None,
        }
    }

    #[test]
    fn parses_numeric_and_string_coordinates() {
        let number = Place::from_feature(&feature(json!({
            "Places": "Shaniwar Wada",
            "Latitude": 18.5195,
            "Longitude": 73.8553,
        })))
        .expect("has a name");
        assert!(number.position.is_some());

        let string = Place::from_feature(&feature(json!({
            "Places": "Raigad Fort",
            "Latitude": "18.2336",
            "Longitude": " 73.4401 ",
        })))
        .expect("has a name");
        assert!(string.position.is_some());
    }

    #[test]
    fn keeps_places_with_bad_coordinates_out_of_the_map_but_in_the_catalog() {
        let document = FeatureCollection {
            bbox: None,
            foreign_members: None,
            features: vec![
                feature(json!({"Places": "A", "Latitude": 18.5, "Longitude": 73.5})),
                feature(json!({"Places": "B", "Latitude": "not a number", "Longitude": 73.5})),
                feature(json!({"Places": "C"})),
                feature(json!({"District": "Pune"})),
            ],
        };

        let index = PlaceIndex::from_documents([&document]);
        // The nameless record is dropped, the coordinate-less ones are kept.
        assert_eq!(index.len(), 3);
        assert!(index.get("B").expect("in catalog").position.is_none());
        assert!(index.get("C").expect("in catalog").position.is_none());
    }

    #[test]
    fn distinct_values_are_sorted_and_deduplicated() {
        let document = FeatureCollection {
            bbox: None,
            foreign_members: None,
            features: vec![
                feature(json!({"Places": "A", "Category": "Lake", "District": "Pune"})),
                feature(json!({"Places": "B", "Category": "Fort", "District": "Pune"})),
                feature(json!({"Places": "C", "Category": "Fort", "District": "Raigad"})),
                feature(json!({"Places": "D", "Category": ""})),
            ],
        };

        let index = PlaceIndex::from_documents([&document]);
        assert_eq!(index.categories(), vec!["Fort", "Lake"]);
        assert_eq!(index.districts(), vec!["Pune", "Raigad"]);
    }

    #[test]
    fn identity_is_name_and_location() {
        let a = Place::from_feature(&feature(
            json!({"Places": "Ganpati Mandir", "Location": "Pune"}),
        ))
        .expect("has a name");
        let b = Place::from_feature(&feature(
            json!({"Places": "Ganpati Mandir", "Location": "Wai"}),
        ))
        .expect("has a name");

        assert!(!a.same_identity(&b));
        assert!(a.same_identity(&a.clone()));
    }

    #[test]
    fn documents_concatenate() {
        let first = FeatureCollection {
            bbox: None,
            foreign_members: None,
            features: vec![feature(json!({"Places": "A"}))],
        };
        let second = FeatureCollection {
            bbox: None,
            foreign_members: None,
            features: vec![feature(json!({"Places": "B"}))],
        };

        let index = PlaceIndex::from_documents([&first, &second]);
        assert_eq!(index.len(), 2);
        assert_eq!(index.places()[0].name, "A");
        assert_eq!(index.places()[1].name, "B");
    }
}
