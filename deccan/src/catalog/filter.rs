//! Category/district filtering of the catalog.

use super::{Place, PlaceIndex};

/// The current category/district selection.
///
/// Both fields are single-valued by construction: selecting a new value
/// replaces the previous one, there is never more than one selected category
/// or district. An unset field matches every place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    category: Option<String>,
    district: Option<String>,
}

impl FilterState {
    /// Creates a filter that matches everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// The selected category, if any.
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// The selected district, if any.
    pub fn district(&self) -> Option<&str> {
        self.district.as_deref()
    }

    /// Selects a category, replacing any previously selected one. `None`
    /// clears the selection.
    pub fn select_category(&mut self, category: Option<String>) {
        self.category = category;
    }

    /// Selects a district, replacing any previously selected one. `None`
    /// clears the selection.
    pub fn select_district(&mut self, district: Option<String>) {
        self.district = district;
    }

    /// Clears both selections.
    pub fn clear(&mut self) {
        self.category = None;
        self.district = None;
    }

    /// Returns true when neither a category nor a district is selected.
    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.district.is_none()
    }

    /// The filter predicate: a place matches when each set field equals the
    /// corresponding place attribute. Unset fields match vacuously.
    pub fn matches(&self, place: &Place) -> bool {
        let category_matches = self
            .category
            .as_deref()
            .map(|category| place.category.as_deref() == Some(category))
            .unwrap_or(true);
        let district_matches = self
            .district
            .as_deref()
            .map(|district| place.district.as_deref() == Some(district))
            .unwrap_or(true);

        category_matches && district_matches
    }

    /// Derives the visible subset of the catalog. Pure and deterministic:
    /// the result depends only on the catalog contents and this filter.
    pub fn apply(&self, index: &PlaceIndex) -> Vec<Place> {
        index
            .places()
            .iter()
            .filter(|place| self.matches(place))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geojson::FeatureCollection;
    use serde_json::json;

    fn catalog() -> PlaceIndex {
        let features = [
            json!({"Places": "A", "Latitude": 18.50, "Longitude": 73.50, "Category": "Fort", "District": "Pune"}),
            json!({"Places": "B", "Latitude": 18.60, "Longitude": 73.60, "Category": "Lake", "District": "Pune"}),
            json!({"Places": "C", "Latitude": 19.10, "Longitude": 74.00, "Category": "Fort", "District": "Raigad"}),
        ]
        .into_iter()
        .map(|properties| geojson::Feature {
            bbox: None,
            geometry: None,
            id: None,
            properties: properties.as_object().cloned(),
            foreign_members: None,
        })
        .collect();

        PlaceIndex::from_documents([&FeatureCollection {
            bbox: None,
            foreign_members: None,
            features,
        }])
    }

    #[test]
    fn unset_filter_matches_all() {
        let index = catalog();
        let filter = FilterState::new();
        assert_eq!(filter.apply(&index).len(), index.len());
    }

    #[test]
    fn filtered_catalog_is_a_subset_matching_both_predicates() {
        let index = catalog();
        let mut filter = FilterState::new();
        filter.select_category(Some("Fort".into()));
        filter.select_district(Some("Pune".into()));

        let filtered = filter.apply(&index);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name, "A");
        assert!(filtered.iter().all(|place| filter.matches(place)));
    }

    #[test]
    fn selecting_a_second_value_replaces_the_first() {
        let mut filter = FilterState::new();
        filter.select_category(Some("Fort".into()));
        filter.select_category(Some("Lake".into()));

        // Never two selected values.
        assert_eq!(filter.category(), Some("Lake"));

        filter.select_category(None);
        assert_eq!(filter.category(), None);
    }

    #[test]
    fn district_selection_scenario() {
        let index = catalog();
        let mut filter = FilterState::new();
        filter.select_district(Some("Pune".into()));

        let filtered = filter.apply(&index);
        let names: Vec<_> = filtered.iter().map(|place| place.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn place_without_attribute_does_not_match_a_set_filter() {
        let mut index = PlaceIndex::new();
        index.append_document(&FeatureCollection {
            bbox: None,
            foreign_members: None,
            features: vec![geojson::Feature {
                bbox: None,
                geometry: None,
                id: None,
                properties: json!({"Places": "No district"}).as_object().cloned(),
                foreign_members: None,
            }],
        });

        let mut filter = FilterState::new();
        filter.select_district(Some("Pune".into()));
        assert!(filter.apply(&index).is_empty());
    }
}
