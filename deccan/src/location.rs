//! One-shot user geolocation.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::DeccanError;
use crate::geo::GeoPoint;

/// Platform geolocation seam.
#[async_trait]
pub trait Geolocator: Send + Sync {
    /// One-shot position query. Fails with
    /// [`DeccanError::LocationUnavailable`] when positioning is denied or
    /// unavailable.
    async fn current_position(&self) -> Result<GeoPoint, DeccanError>;
}

/// A geolocator for platforms without positioning support. Every query
/// fails, so dependent features degrade the same way as a user denial.
pub struct DummyGeolocator;

#[async_trait]
impl Geolocator for DummyGeolocator {
    async fn current_position(&self) -> Result<GeoPoint, DeccanError> {
        Err(DeccanError::LocationUnavailable)
    }
}

/// Holds the user position acquired once per mount.
///
/// The stored location is a snapshot: it is never refreshed automatically,
/// and consumers (route origin excepted, which queries the platform afresh)
/// must treat it as possibly stale. A failed acquisition leaves the location
/// unset without raising a user-facing error - features depending on it
/// silently degrade.
pub struct UserLocationTracker {
    geolocator: Arc<dyn Geolocator>,
    location: Option<GeoPoint>,
    requested: bool,
}

impl UserLocationTracker {
    /// Creates a tracker over the given geolocation seam.
    pub fn new(geolocator: Arc<dyn Geolocator>) -> Self {
        Self {
            geolocator,
            location: None,
            requested: false,
        }
    }

    /// Acquires the position once. Subsequent calls return the stored
    /// snapshot without querying the platform again; use
    /// [`UserLocationTracker::invalidate`] to force a re-request.
    pub async fn acquire(&mut self) -> Option<GeoPoint> {
        if self.requested {
            return self.location;
        }

        self.requested = true;
        match self.geolocator.current_position().await {
            Ok(position) => self.location = Some(position),
            Err(error) => {
                log::debug!("geolocation unavailable: {error}");
                self.location = None;
            }
        }

        self.location
    }

    /// The stored position snapshot, if any.
    pub fn location(&self) -> Option<GeoPoint> {
        self.location
    }

    /// Drops the snapshot so that the next [`UserLocationTracker::acquire`]
    /// queries the platform again.
    pub fn invalidate(&mut self) {
        self.location = None;
        self.requested = false;
    }
}
