//! Loading of catalog and boundary documents over HTTP.

use futures::future::join_all;
use geojson::{FeatureCollection, GeoJson};

use super::PlaceIndex;
use crate::error::DeccanError;
use crate::geo::{GeoBounds, GeoPoint};

/// Fetches all catalog documents and concatenates their features into a
/// single catalog.
///
/// Any unreachable or malformed document fails the whole load; the caller is
/// expected to log the failure and keep the previous catalog (the affected
/// layer simply does not appear).
pub async fn load_catalog(
    client: &reqwest::Client,
    urls: &[String],
) -> Result<PlaceIndex, DeccanError> {
    let fetches = urls.iter().map(|url| fetch_collection(client, url));

    let mut index = PlaceIndex::new();
    for document in join_all(fetches).await {
        index.append_document(&document?);
    }

    Ok(index)
}

/// Fetches a line-geometry document used for viewport framing and visual
/// context (outer boundary or internal divisions).
pub async fn load_boundary(
    client: &reqwest::Client,
    url: &str,
) -> Result<BoundaryDocument, DeccanError> {
    Ok(BoundaryDocument::new(fetch_collection(client, url).await?))
}

async fn fetch_collection(
    client: &reqwest::Client,
    url: &str,
) -> Result<FeatureCollection, DeccanError> {
    let body = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    let geojson: GeoJson = body.parse()?;
    Ok(FeatureCollection::try_from(geojson)?)
}

/// A boundary document together with the bounding box of its geometries.
#[derive(Debug, Clone)]
pub struct BoundaryDocument {
    /// The raw document, attached verbatim as a line layer source.
    pub collection: FeatureCollection,
    /// Bounding box of all geometries in the document. `None` when the
    /// document contains no coordinates.
    pub bounds: Option<GeoBounds>,
}

impl BoundaryDocument {
    /// Wraps a parsed document, computing its bounding box.
    pub fn new(collection: FeatureCollection) -> Self {
        let bounds = collection_bounds(&collection);
        Self { collection, bounds }
    }
}

fn collection_bounds(collection: &FeatureCollection) -> Option<GeoBounds> {
    let mut bounds = None;
    for feature in &collection.features {
        if let Some(geometry) = &feature.geometry {
            extend_with_geometry(&mut bounds, &geometry.value);
        }
    }

    bounds
}

fn extend_with_geometry(bounds: &mut Option<GeoBounds>, value: &geojson::Value) {
    use geojson::Value;

    match value {
        Value::Point(position) => extend_with_position(bounds, position),
        Value::MultiPoint(positions) | Value::LineString(positions) => {
            for position in positions {
                extend_with_position(bounds, position);
            }
        }
        Value::MultiLineString(lines) | Value::Polygon(lines) => {
            for line in lines {
                for position in line {
                    extend_with_position(bounds, position);
                }
            }
        }
        Value::MultiPolygon(polygons) => {
            for polygon in polygons {
                for ring in polygon {
                    for position in ring {
                        extend_with_position(bounds, position);
                    }
                }
            }
        }
        Value::GeometryCollection(geometries) => {
            for geometry in geometries {
                extend_with_geometry(bounds, &geometry.value);
            }
        }
    }
}

fn extend_with_position(bounds: &mut Option<GeoBounds>, position: &[f64]) {
    // GeoJSON positions are [lon, lat, ...].
    let [lon, lat, ..] = position else {
        return;
    };

    let point = GeoPoint::latlon(*lat, *lon);
    if !point.is_valid() {
        return;
    }

    let point_bounds = GeoBounds::from_point(point);
    *bounds = Some(match bounds {
        Some(current) => current.merge(point_bounds),
        None => point_bounds,
    });
}
