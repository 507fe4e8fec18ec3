//! Proximity and popularity ranking of catalog places.
//!
//! Both rankers share the flat-earth distance primitive of
//! [`GeoPoint::distance_km`]. "Nearby places" is pure distance ordering for
//! the detail panel; "popular near you" weighs aggregate review quality and
//! is recomputed on a polling interval while the exploration view is active.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::task::JoinHandle;

use crate::catalog::Place;
use crate::geo::GeoPoint;
use crate::reviews::{summarize, ReviewStore, ReviewSummary};

/// Radius of the "nearby places" search around the focal place.
pub const NEARBY_RADIUS_KM: f64 = 20.0;
/// Maximum length of the "nearby places" list.
pub const NEARBY_LIMIT: usize = 5;
/// Radius of the "popular near you" search around the user location.
pub const POPULAR_RADIUS_KM: f64 = 30.0;
/// Maximum length of the "popular near you" list.
pub const POPULAR_LIMIT: usize = 5;
/// Recomputation interval of the popularity ranking.
pub const POPULAR_POLL_INTERVAL: Duration = Duration::from_secs(4);

/// A place ranked by distance from a focal place.
#[derive(Debug, Clone)]
pub struct NearbyPlace {
    /// The ranked place.
    pub place: Place,
    /// Distance from the focal place in kilometers.
    pub distance_km: f64,
}

/// Up to [`NEARBY_LIMIT`] places within [`NEARBY_RADIUS_KM`] of the focal
/// place, sorted ascending by distance.
///
/// The focal place itself is excluded by name+location identity, so a
/// namesake at a different location still ranks. Places without valid
/// coordinates never rank.
pub fn nearby_places(focal: &Place, catalog: &[Place]) -> Vec<NearbyPlace> {
    let Some(origin) = focal.position else {
        return Vec::new();
    };

    let mut nearby: Vec<NearbyPlace> = catalog
        .iter()
        .filter(|place| !place.same_identity(focal))
        .filter_map(|place| {
            let distance_km = origin.distance_km(&place.position?);
            (distance_km <= NEARBY_RADIUS_KM).then(|| NearbyPlace {
                place: place.clone(),
                distance_km,
            })
        })
        .collect();

    nearby.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    nearby.truncate(NEARBY_LIMIT);
    nearby
}

/// A place ranked by aggregate review quality.
#[derive(Debug, Clone)]
pub struct PopularPlace {
    /// The ranked place.
    pub place: Place,
    /// Distance from the user location in kilometers. Only defined for the
    /// radius-based candidate set; `None` for district candidates.
    pub distance_km: Option<f64>,
    /// Aggregate rating fetched from the review store.
    pub summary: ReviewSummary,
}

/// Computes the "popular near you" ranking.
///
/// The candidate set is the places of the selected district when exactly one
/// district is selected, otherwise all places within [`POPULAR_RADIUS_KM`] of
/// the user location when it is known. When neither holds the ranking is
/// empty.
///
/// Candidates are sorted by average rating descending, then review count
/// descending, then distance ascending (pairs without a defined distance
/// compare as equal), and truncated to [`POPULAR_LIMIT`].
pub async fn popular_near_you(
    catalog: &[Place],
    selected_district: Option<&str>,
    user_location: Option<GeoPoint>,
    reviews: &dyn ReviewStore,
) -> Vec<PopularPlace> {
    let candidates: Vec<(Place, Option<f64>)> = if let Some(district) = selected_district {
        catalog
            .iter()
            .filter(|place| place.district.as_deref() == Some(district))
            .map(|place| (place.clone(), None))
            .collect()
    } else if let Some(origin) = user_location {
        catalog
            .iter()
            .filter_map(|place| {
                let distance_km = origin.distance_km(&place.position?);
                (distance_km <= POPULAR_RADIUS_KM).then(|| (place.clone(), Some(distance_km)))
            })
            .collect()
    } else {
        return Vec::new();
    };

    let summaries = join_all(candidates.iter().map(|(place, _)| async {
        match reviews.reviews_for(&place.name).await {
            Ok(reviews) => summarize(&reviews),
            Err(error) => {
                // One bad fetch must not empty the whole ranking.
                log::debug!("review fetch failed for {:?}: {error}", place.name);
                ReviewSummary::default()
            }
        }
    }))
    .await;

    let mut ranked: Vec<PopularPlace> = candidates
        .into_iter()
        .zip(summaries)
        .map(|((place, distance_km), summary)| PopularPlace {
            place,
            distance_km,
            summary,
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.summary
            .avg_rating
            .total_cmp(&a.summary.avg_rating)
            .then_with(|| b.summary.review_count.cmp(&a.summary.review_count))
            .then_with(|| match (a.distance_km, b.distance_km) {
                (Some(a), Some(b)) => a.total_cmp(&b),
                _ => std::cmp::Ordering::Equal,
            })
    });
    ranked.truncate(POPULAR_LIMIT);
    ranked
}

/// A cancellable background task recomputing the popularity ranking on
/// [`POPULAR_POLL_INTERVAL`].
///
/// The poller is bound to the lifetime of the exploration view: it must be
/// cancelled (or dropped) on teardown and whenever its inputs - catalog,
/// selected district, user location - change identity, and restarted with
/// the new inputs. A recomputation that races with cancellation is discarded
/// rather than delivered.
pub struct PopularPoller {
    cancelled: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl PopularPoller {
    /// Starts polling. The first recomputation is delivered immediately, the
    /// following ones every [`POPULAR_POLL_INTERVAL`].
    pub fn spawn(
        catalog: Vec<Place>,
        selected_district: Option<String>,
        user_location: Option<GeoPoint>,
        reviews: Arc<dyn ReviewStore>,
        on_update: impl Fn(Vec<PopularPlace>) + Send + Sync + 'static,
    ) -> Self {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(POPULAR_POLL_INTERVAL);
            loop {
                interval.tick().await;
                if flag.load(Ordering::SeqCst) {
                    break;
                }

                let ranked = popular_near_you(
                    &catalog,
                    selected_district.as_deref(),
                    user_location,
                    reviews.as_ref(),
                )
                .await;

                // The flag is re-checked after the await: a result that
                // arrives after cancellation is stale and must not be
                // applied.
                if flag.load(Ordering::SeqCst) {
                    break;
                }

                on_update(ranked);
            }
        });

        Self { cancelled, task }
    }

    /// Stops the poller. No update is delivered after this call returns.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.task.abort();
    }
}

impl Drop for PopularPoller {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StaticReviews;

    fn place(name: &str, district: &str, lat: f64, lon: f64) -> Place {
        Place {
            name: name.into(),
            district: Some(district.into()),
            category: None,
            location: None,
            description: None,
            image_url: None,
            page_url: None,
            position: Some(GeoPoint::latlon(lat, lon)),
        }
    }

    #[test]
    fn nearby_is_sorted_ascending_and_excludes_the_focal_place() {
        let focal = place("Shaniwar Wada", "Pune", 18.5195, 73.8553);
        let catalog = vec![
            focal.clone(),
            place("Aga Khan Palace", "Pune", 18.5524, 73.9013),
            place("Sinhagad Fort", "Pune", 18.3664, 73.7557),
            place("Pataleshwar", "Pune", 18.5254, 73.8478),
            place("Raigad Fort", "Raigad", 18.2336, 73.4401),
        ];

        let nearby = nearby_places(&focal, &catalog);
        let names: Vec<_> = nearby
            .iter()
            .map(|ranked| ranked.place.name.as_str())
            .collect();

        // Raigad Fort is ~50 km away, outside the 20 km radius.
        assert_eq!(names, vec!["Pataleshwar", "Aga Khan Palace", "Sinhagad Fort"]);
        assert!(nearby
            .windows(2)
            .all(|pair| pair[0].distance_km < pair[1].distance_km));
    }

    #[test]
    fn nearby_keeps_namesakes_at_other_locations() {
        let mut focal = place("Ganpati Mandir", "Pune", 18.52, 73.85);
        focal.location = Some("Pune".into());
        let mut namesake = place("Ganpati Mandir", "Pune", 18.53, 73.86);
        namesake.location = Some("Wai".into());

        let nearby = nearby_places(&focal, &[focal.clone(), namesake]);
        assert_eq!(nearby.len(), 1);
    }

    #[test]
    fn nearby_without_focal_coordinates_is_empty() {
        let mut focal = place("A", "Pune", 18.5, 73.8);
        focal.position = None;
        assert!(nearby_places(&focal, &[place("B", "Pune", 18.5, 73.8)]).is_empty());
    }

    #[test]
    fn nearby_truncates_to_five() {
        let focal = place("Center", "Pune", 18.50, 73.80);
        let catalog: Vec<Place> = (0..8)
            .map(|i| place(&format!("P{i}"), "Pune", 18.50 + 0.01 * i as f64, 73.80))
            .collect();

        assert_eq!(nearby_places(&focal, &catalog).len(), NEARBY_LIMIT);
    }

    #[tokio::test]
    async fn popular_orders_by_rating_then_count_then_distance() {
        let catalog = vec![
            place("A", "Pune", 18.50, 73.80),
            place("B", "Pune", 18.51, 73.81),
            place("C", "Pune", 18.52, 73.82),
        ];
        let reviews = StaticReviews::new()
            .with_ratings("A", &[4.5, 4.5])
            .with_ratings("B", &[4.5, 4.5, 4.5, 4.5, 4.5])
            .with_ratings("C", &[3.0; 10]);

        let ranked = popular_near_you(&catalog, Some("Pune"), None, &reviews).await;
        let names: Vec<_> = ranked
            .iter()
            .map(|ranked| ranked.place.name.as_str())
            .collect();

        assert_eq!(names, vec!["B", "A", "C"]);
        // District candidates carry no distance.
        assert!(ranked.iter().all(|ranked| ranked.distance_km.is_none()));
    }

    #[tokio::test]
    async fn popular_falls_back_to_user_radius() {
        let catalog = vec![
            place("Near", "Pune", 18.52, 73.86),
            place("Far", "Nagpur", 21.15, 79.09),
        ];
        let reviews = StaticReviews::new().with_ratings("Near", &[4.0]);

        let ranked = popular_near_you(
            &catalog,
            None,
            Some(GeoPoint::latlon(18.52, 73.85)),
            &reviews,
        )
        .await;

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].place.name, "Near");
        assert!(ranked[0].distance_km.expect("radius candidate") < POPULAR_RADIUS_KM);
    }

    #[tokio::test]
    async fn popular_without_district_or_location_is_empty() {
        let catalog = vec![place("A", "Pune", 18.5, 73.8)];
        let reviews = StaticReviews::new();
        assert!(popular_near_you(&catalog, None, None, &reviews)
            .await
            .is_empty());
    }

    #[tokio::test]
    async fn review_fetch_failure_counts_as_zero_reviews() {
        let catalog = vec![
            place("Broken", "Pune", 18.50, 73.80),
            place("Rated", "Pune", 18.51, 73.81),
        ];
        let reviews = StaticReviews::new()
            .with_ratings("Rated", &[4.0])
            .failing_for("Broken");

        let ranked = popular_near_you(&catalog, Some("Pune"), None, &reviews).await;
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].place.name, "Rated");
        assert_eq!(ranked[1].summary.review_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn poller_delivers_updates_until_cancelled() {
        let updates = Arc::new(parking_lot::Mutex::new(0_usize));
        let counter = Arc::clone(&updates);

        let poller = PopularPoller::spawn(
            vec![place("A", "Pune", 18.5, 73.8)],
            Some("Pune".into()),
            None,
            Arc::new(StaticReviews::new().with_ratings("A", &[5.0])),
            move |_| *counter.lock() += 1,
        );

        tokio::time::sleep(POPULAR_POLL_INTERVAL * 2 + Duration::from_millis(100)).await;
        let delivered = *updates.lock();
        assert!(delivered >= 2, "expected at least 2 updates, got {delivered}");

        poller.cancel();
        tokio::time::sleep(POPULAR_POLL_INTERVAL * 3).await;
        assert_eq!(*updates.lock(), delivered);
    }
}
