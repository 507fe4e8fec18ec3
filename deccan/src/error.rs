//! Error types used by the crate.

use thiserror::Error;

/// Deccan error type.
///
/// No failure in the explorer core is fatal to the process: every variant is
/// contained to the feature it affects and async failures resolve to an
/// explicit error value rather than unwinding past the task boundary.
#[derive(Debug, Error)]
pub enum DeccanError {
    /// I/O error (network or file).
    #[error("failed to load data")]
    Io,
    /// A document could not be parsed.
    #[error("malformed document: {0}")]
    Malformed(String),
    /// The routing service returned no usable route.
    #[error("no route found")]
    NoRoute,
    /// The selected destination has no valid coordinates.
    #[error("destination not available")]
    NoDestination,
    /// The user position could not be acquired (denied or unavailable).
    #[error("location unavailable")]
    LocationUnavailable,
    /// Weather for the requested position is not available.
    #[error("weather unavailable")]
    WeatherUnavailable,
    /// A layer with the same id is already attached to the rendering surface.
    #[error("layer {0:?} is already attached")]
    DuplicateLayer(String),
    /// Generic error - details are inside.
    #[error("{0}")]
    Generic(String),
}

impl From<reqwest::Error> for DeccanError {
    fn from(_value: reqwest::Error) -> Self {
        Self::Io
    }
}

impl From<geojson::Error> for DeccanError {
    fn from(value: geojson::Error) -> Self {
        Self::Malformed(value.to_string())
    }
}

impl From<serde_json::Error> for DeccanError {
    fn from(value: serde_json::Error) -> Self {
        Self::Malformed(value.to_string())
    }
}
