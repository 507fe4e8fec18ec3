//! Deccan is the core engine of an interactive places explorer: it plots a
//! catalog of geo-tagged places on a map, narrows the catalog by category and
//! district, resolves routes and weather for a selected place, ranks nearby
//! places, and keeps the map's layers and viewport synchronized with all of
//! that state.
//!
//! # Quick start
//!
//! ```no_run
//! use deccan::{ExplorerConfig, MapExplorer};
//! use deccan::testing::TestSurface;
//!
//! # tokio_test::block_on(async {
//! let mut explorer = MapExplorer::builder(TestSurface::new())
//!     .with_config(ExplorerConfig::default())
//!     .build();
//!
//! explorer.start().await;
//! explorer.on_style_ready();
//! explorer.select_district(Some("Pune".into()));
//! # });
//! ```
//!
//! This loads the configured catalog and boundary documents, attaches the
//! place markers once the surface signals style readiness, and frames the
//! selected district.
//!
//! # Main components
//!
//! * [`PlaceIndex`](catalog::PlaceIndex) normalizes raw feature-collection
//!   documents into a flat place catalog, and
//!   [`FilterState`](catalog::FilterState) derives its visible subset.
//! * [`LayerManager`](map::LayerManager) owns the rendering surface's
//!   layer/source set and reconciles it against the filtered catalog and the
//!   active route, gated behind the surface's style readiness.
//! * [`ViewportController`](map::ViewportController) turns state changes
//!   into a single camera transition through a strict priority list.
//! * [`RouteController`](route::RouteController) resolves a route from the
//!   user's position to a destination via an external directions service.
//! * [`ranking`] holds the two proximity rankers: plain distance for the
//!   detail panel and rating-weighted "popular near you", recomputed by a
//!   cancellable polling task.
//! * [`MapExplorer`] wires all of the above together behind one coordinator.
//!
//! The rendering surface, directions service, review store, geolocation and
//! weather provider are all seams ([`map::MapSurface`],
//! [`route::DirectionsService`], [`reviews::ReviewStore`],
//! [`location::Geolocator`], [`weather::WeatherService`]); plug in the map
//! widget and clients of your platform, or use the doubles from [`testing`].

#![warn(clippy::unwrap_used)]
#![warn(missing_docs)]

pub mod catalog;
mod color;
pub mod config;
pub mod error;
pub mod events;
mod explorer;
pub mod geo;
pub mod location;
pub mod map;
pub mod ranking;
pub mod reviews;
pub mod route;
pub mod weather;

#[cfg(any(test, feature = "_tests"))]
pub mod testing;

pub use color::Color;
pub use config::ExplorerConfig;
pub use error::DeccanError;
pub use events::{AppSignal, EventBus};
pub use explorer::{MapExplorer, MapExplorerBuilder};
