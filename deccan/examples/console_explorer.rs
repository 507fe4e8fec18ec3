//! This example drives the explorer core against the in-memory test surface
//! and prints what a UI shell would render: the filtered catalog, the
//! popularity ranking, a selection with its nearby places, and a route.

use std::sync::Arc;

use deccan::geo::GeoPoint;
use deccan::route::{RouteLeg, RouteSummary};
use deccan::testing::{FixedGeolocator, StaticDirections, StaticReviews, TestSurface};
use deccan::{EventBus, MapExplorer};
use geojson::FeatureCollection;
use serde_json::json;

fn catalog_document() -> FeatureCollection {
    let features = [
        json!({"Places": "Shaniwar Wada", "Latitude": 18.5195, "Longitude": 73.8553, "Category": "Fort", "District": "Pune"}),
        json!({"Places": "Aga Khan Palace", "Latitude": 18.5524, "Longitude": 73.9013, "Category": "Palace", "District": "Pune"}),
        json!({"Places": "Sinhagad Fort", "Latitude": 18.3664, "Longitude": 73.7557, "Category": "Fort", "District": "Pune"}),
        json!({"Places": "Raigad Fort", "Latitude": 18.2336, "Longitude": 73.4401, "Category": "Fort", "District": "Raigad"}),
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

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let user_position = GeoPoint::latlon(18.5204, 73.8567);
    let reviews = StaticReviews::new()
        .with_ratings("Shaniwar Wada", &[4.5, 5.0, 4.0])
        .with_ratings("Aga Khan Palace", &[4.5, 4.5])
        .with_ratings("Sinhagad Fort", &[5.0]);
    let directions = StaticDirections::with_leg(RouteLeg {
        geometry: vec![user_position, GeoPoint::latlon(18.3664, 73.7557)],
        summary: RouteSummary {
            distance_m: 31200.0,
            duration_s: 3240.0,
        },
    });

    let bus = EventBus::new();
    let mut explorer = MapExplorer::builder(TestSurface::new())
        .with_event_bus(bus.clone())
        .with_reviews(Arc::new(reviews))
        .with_directions(Arc::new(directions))
        .with_geolocator(Arc::new(FixedGeolocator::at(user_position)))
        .build();

    // The network loaders are not used here; feed the catalog directly the
    // way a shell with bundled data would.
    explorer.load_catalog_documents([&catalog_document()]);
    explorer.on_style_ready();

    explorer.select_district(Some("Pune".into()));
    println!("Places in Pune:");
    for place in explorer.filtered_places() {
        println!("  - {}", place.name);
    }

    // Give the popularity poller its first tick.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    println!("\nPopular in Pune:");
    for ranked in explorer.popular_ranking() {
        println!(
            "  {:.1}* ({} reviews)  {}",
            ranked.summary.avg_rating, ranked.summary.review_count, ranked.place.name
        );
    }

    explorer.handle_point_click("Shaniwar Wada");
    println!("\nSelected: {:?}", explorer.selected().map(|p| &p.name));
    println!("Nearby places:");
    for nearby in explorer.nearby() {
        println!("  {:>5.2} km  {}", nearby.distance_km, nearby.place.name);
    }

    let destination = explorer
        .catalog()
        .get("Sinhagad Fort")
        .expect("in catalog")
        .clone();
    match explorer.show_route(&destination).await {
        Ok(()) => {
            let route = explorer.route().expect("route installed");
            println!(
                "\nRoute to {}: {:.1} km, {} min",
                route.destination().name,
                route.distance_km(),
                route.duration_min()
            );
        }
        Err(error) => println!("\nRouting failed: {error}"),
    }

    explorer.shutdown();
}
