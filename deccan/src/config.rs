//! Runtime configuration of the explorer.

use serde::{Deserialize, Serialize};

use crate::error::DeccanError;
use crate::geo::GeoPoint;

/// Deployment configuration: data source URLs, API keys and the initial
/// camera. All fields have defaults for the shipped data set, so a config
/// file only needs to override what differs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    /// Basemap style URL (without the key query parameter).
    pub basemap_style_url: String,
    /// Key appended to the basemap style URL.
    pub maptiler_key: String,
    /// Catalog documents, concatenated into one catalog in order.
    pub catalog_urls: Vec<String>,
    /// Outer administrative boundary document.
    pub border_url: String,
    /// Internal divisions document.
    pub divisions_url: String,
    /// OpenRouteService API key.
    pub ors_api_key: String,
    /// OpenWeatherMap API key.
    pub owm_api_key: String,
    /// Initial camera center.
    pub initial_center: GeoPoint,
    /// Initial camera zoom level.
    pub initial_zoom: f64,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            basemap_style_url: "https://api.maptiler.com/maps/openstreetmap/style.json".into(),
            maptiler_key: String::new(),
            catalog_urls: vec!["/data/cultural_places.geojson".into()],
            border_url: "/data/mh_border.geojson".into(),
            divisions_url: "/data/divisions.geojson".into(),
            ors_api_key: String::new(),
            owm_api_key: String::new(),
            initial_center: GeoPoint::latlon(18.5, 73.5),
            initial_zoom: 7.0,
        }
    }
}

impl ExplorerConfig {
    /// Parses a configuration from a JSON document. Missing fields take
    /// their defaults.
    pub fn from_json(json: &str) -> Result<Self, DeccanError> {
        Ok(serde_json::from_str(json)?)
    }

    /// The basemap style URL with the key attached.
    pub fn styled_basemap_url(&self) -> String {
        if self.maptiler_key.is_empty() {
            self.basemap_style_url.clone()
        } else {
            format!("{}?key={}", self.basemap_style_url, self.maptiler_key)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let config =
            ExplorerConfig::from_json(r#"{"ors_api_key": "secret", "initial_zoom": 9.0}"#)
                .expect("valid json");

        assert_eq!(config.ors_api_key, "secret");
        assert_eq!(config.initial_zoom, 9.0);
        assert_eq!(config.initial_center, GeoPoint::latlon(18.5, 73.5));
        assert_eq!(config.catalog_urls, vec!["/data/cultural_places.geojson"]);
    }

    #[test]
    fn basemap_url_carries_the_key_only_when_set() {
        let mut config = ExplorerConfig::default();
        assert!(!config.styled_basemap_url().contains("key="));

        config.maptiler_key = "abc".into();
        assert!(config.styled_basemap_url().ends_with("?key=abc"));
    }

    #[test]
    fn malformed_config_is_rejected() {
        assert!(ExplorerConfig::from_json("{not json").is_err());
    }
}
