//! The explorer coordinator.
//!
//! [`MapExplorer`] owns the whole interactive state - catalog, filter,
//! selection, route - and keeps the rendering surface synchronized with it
//! through its [`LayerManager`] and [`ViewportController`].
//!
//! # Concurrency
//!
//! The explorer is designed for a single-threaded cooperative event loop:
//! every state mutation goes through a `&mut self` method, so mutations are
//! serialized by the borrow checker and no locking is needed for the
//! explorer state itself. Network calls and the geolocation query are the
//! suspension points. The only background task is the popularity poller,
//! which carries its own cancellation flag and is restarted whenever its
//! inputs change identity.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::catalog::{load_boundary, load_catalog, FilterState, Place, PlaceIndex};
use crate::config::ExplorerConfig;
use crate::error::DeccanError;
use crate::events::{AppSignal, EventBus};
use crate::geo::{GeoBounds, GeoPoint};
use crate::location::{DummyGeolocator, Geolocator, UserLocationTracker};
use crate::map::{
    focus_place, reframe, LayerManager, MapSurface, SharedSurface, ViewportController,
    ViewportInputs,
};
use crate::ranking::{nearby_places, NearbyPlace, PopularPlace, PopularPoller};
use crate::reviews::{sorted_for_display, DummyReviewStore, Review, ReviewStore};
use crate::route::{DirectionsService, OrsDirections, RouteController, RouteState};
use crate::weather::{CurrentWeather, OpenWeather, WeatherService};

type OpenLoginCallback = Box<dyn Fn() + Send + Sync>;

/// Builder for [`MapExplorer`].
///
/// Only the surface is required; every service seam has a default
/// (the public routing/weather clients configured from [`ExplorerConfig`],
/// an empty review store and an unavailable geolocator).
pub struct MapExplorerBuilder<S: MapSurface> {
    surface: S,
    config: ExplorerConfig,
    bus: EventBus,
    directions: Option<Arc<dyn DirectionsService>>,
    reviews: Option<Arc<dyn ReviewStore>>,
    geolocator: Option<Arc<dyn Geolocator>>,
    weather: Option<Arc<dyn WeatherService>>,
    on_open_login: Option<OpenLoginCallback>,
}

impl<S: MapSurface> MapExplorerBuilder<S> {
    /// Sets the deployment configuration.
    pub fn with_config(mut self, config: ExplorerConfig) -> Self {
        self.config = config;
        self
    }

    /// Attaches the cross-component signal bus the explorer listens on.
    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.bus = bus;
        self
    }

    /// Replaces the directions service.
    pub fn with_directions(mut self, directions: Arc<dyn DirectionsService>) -> Self {
        self.directions = Some(directions);
        self
    }

    /// Replaces the review store.
    pub fn with_reviews(mut self, reviews: Arc<dyn ReviewStore>) -> Self {
        self.reviews = Some(reviews);
        self
    }

    /// Replaces the geolocation source.
    pub fn with_geolocator(mut self, geolocator: Arc<dyn Geolocator>) -> Self {
        self.geolocator = Some(geolocator);
        self
    }

    /// Replaces the weather service.
    pub fn with_weather(mut self, weather: Arc<dyn WeatherService>) -> Self {
        self.weather = Some(weather);
        self
    }

    /// Registers the shell callback invoked when an "open login" signal
    /// arrives. Without a callback the signal is dropped.
    pub fn on_open_login(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_open_login = Some(Box::new(callback));
        self
    }

    /// Builds the explorer. Nothing is loaded or attached yet; call
    /// [`MapExplorer::start`] to load the data sources.
    pub fn build(self) -> MapExplorer<S> {
        let directions = self
            .directions
            .unwrap_or_else(|| Arc::new(OrsDirections::new(self.config.ors_api_key.clone())));
        let geolocator = self
            .geolocator
            .unwrap_or_else(|| Arc::new(DummyGeolocator));
        let reviews = self.reviews.unwrap_or_else(|| Arc::new(DummyReviewStore));
        let weather = self
            .weather
            .unwrap_or_else(|| Arc::new(OpenWeather::new(self.config.owm_api_key.clone())));

        let surface: SharedSurface<S> = Arc::new(Mutex::new(self.surface));
        let signals = self.bus.subscribe();

        MapExplorer {
            config: self.config,
            client: reqwest::Client::new(),
            index: PlaceIndex::new(),
            filter: FilterState::new(),
            filtered: Vec::new(),
            selected: None,
            route: None,
            boundary_bounds: None,
            layers: LayerManager::new(Arc::clone(&surface)),
            viewport: ViewportController::new(Arc::clone(&surface)),
            surface,
            routing: RouteController::new(directions, Arc::clone(&geolocator)),
            tracker: UserLocationTracker::new(geolocator),
            reviews,
            weather,
            signals,
            on_open_login: self.on_open_login,
            popular: None,
            popular_ranking: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

/// The interactive map explorer core.
pub struct MapExplorer<S: MapSurface> {
    config: ExplorerConfig,
    client: reqwest::Client,
    index: PlaceIndex,
    filter: FilterState,
    filtered: Vec<Place>,
    selected: Option<Place>,
    route: Option<RouteState>,
    boundary_bounds: Option<GeoBounds>,
    layers: LayerManager<S>,
    viewport: ViewportController<S>,
    surface: SharedSurface<S>,
    routing: RouteController,
    tracker: UserLocationTracker,
    reviews: Arc<dyn ReviewStore>,
    weather: Arc<dyn WeatherService>,
    signals: UnboundedReceiver<AppSignal>,
    on_open_login: Option<OpenLoginCallback>,
    popular: Option<PopularPoller>,
    popular_ranking: Arc<Mutex<Vec<PopularPlace>>>,
}

impl<S: MapSurface> MapExplorer<S> {
    /// Starts building an explorer over the given rendering surface.
    pub fn builder(surface: S) -> MapExplorerBuilder<S> {
        MapExplorerBuilder {
            surface,
            config: ExplorerConfig::default(),
            bus: EventBus::new(),
            directions: None,
            reviews: None,
            geolocator: None,
            weather: None,
            on_open_login: None,
        }
    }

    /// Loads the data sources and performs the initial framing.
    ///
    /// Each source failure is contained: the affected layer simply does not
    /// appear, everything else proceeds.
    pub async fn start(&mut self) {
        match load_catalog(&self.client, &self.config.catalog_urls).await {
            Ok(index) => self.index = index,
            Err(error) => log::warn!("failed to load the place catalog: {error}"),
        }
        self.refresh_filtered();

        match load_boundary(&self.client, &self.config.border_url).await {
            Ok(document) => {
                self.boundary_bounds = document.bounds;
                self.layers.set_border(Some(document.collection));
            }
            Err(error) => log::warn!("failed to load the boundary document: {error}"),
        }

        match load_boundary(&self.client, &self.config.divisions_url).await {
            Ok(document) => self.layers.set_divisions(Some(document.collection)),
            Err(error) => log::warn!("failed to load the divisions document: {error}"),
        }

        let location = self.tracker.acquire().await;
        self.layers.set_user_location(location);
        if location.is_some() {
            // The ranking anchor changed identity.
            self.restart_popular();
        }

        self.reframe();
    }

    /// Forwards the rendering surface's style-readiness signal. Deferred
    /// layer mutations are applied at this point.
    pub fn on_style_ready(&mut self) {
        self.layers.on_style_ready();
    }

    /// Replaces the catalog with the given documents directly, bypassing the
    /// network loader. For shells that bundle their data.
    pub fn load_catalog_documents<'a>(
        &mut self,
        documents: impl IntoIterator<Item = &'a geojson::FeatureCollection>,
    ) {
        self.index = PlaceIndex::from_documents(documents);
        self.refresh_filtered();
        self.reframe();
    }

    /// The shared surface handle, for the shell to drive the actual widget.
    pub fn surface(&self) -> SharedSurface<S> {
        Arc::clone(&self.surface)
    }

    /// Selects a category (or clears the selection with `None`), replacing
    /// any previously selected one. Clears the active selection and route.
    pub fn select_category(&mut self, category: Option<String>) {
        self.filter.select_category(category);
        self.on_filter_changed();
    }

    /// Selects a district (or clears the selection with `None`), replacing
    /// any previously selected one. Clears the active selection and route.
    pub fn select_district(&mut self, district: Option<String>) {
        self.filter.select_district(district);
        self.on_filter_changed();
    }

    /// Handles a click on a point feature of the places layer: clears any
    /// active route, selects the place and flies the camera to it.
    pub fn handle_point_click(&mut self, place_name: &str) {
        let Some(place) = self
            .filtered
            .iter()
            .find(|place| place.name == place_name)
            .cloned()
        else {
            log::debug!("click on unknown place {place_name:?} ignored");
            return;
        };

        self.apply_selection(place);
    }

    /// Selects a place directly (search result, nearby-places link).
    pub fn select_place(&mut self, place: &Place) {
        self.apply_selection(place.clone());
    }

    /// The currently selected place, if any.
    pub fn selected(&self) -> Option<&Place> {
        self.selected.as_ref()
    }

    /// Closes the detail panel: drops the selection and the route, then
    /// reframes.
    pub fn close_detail(&mut self) {
        self.selected = None;
        self.clear_route_state();
        self.reframe();
    }

    /// Clears the active route, if any, and reframes.
    pub fn clear_route(&mut self) {
        if self.clear_route_state() {
            self.reframe();
        }
    }

    /// The active route, if any.
    pub fn route(&self) -> Option<&RouteState> {
        self.route.as_ref()
    }

    /// Resolves and installs a route to the given destination, fully
    /// replacing any previous route.
    ///
    /// On failure no partial route is installed - the previous route is
    /// cleared as well - and the error is returned for the shell to surface
    /// as a blocking notice.
    pub async fn show_route(&mut self, destination: &Place) -> Result<(), DeccanError> {
        match self.routing.resolve(destination).await {
            Ok(route) => {
                self.layers.set_route(Some(route.clone()));
                self.route = Some(route);
                self.reframe();
                Ok(())
            }
            Err(error) => {
                if self.clear_route_state() {
                    self.reframe();
                }
                Err(error)
            }
        }
    }

    /// Drains and handles pending cross-component signals.
    pub fn process_signals(&mut self) {
        while let Ok(signal) = self.signals.try_recv() {
            match signal {
                AppSignal::FlyToPlace(place) => self.apply_selection(place),
                AppSignal::OpenLogin => {
                    if let Some(callback) = &self.on_open_login {
                        callback();
                    }
                }
            }
        }
    }

    /// Up to five other catalog places within 20 km of the selected place,
    /// nearest first. Empty without a selection.
    pub fn nearby(&self) -> Vec<NearbyPlace> {
        match &self.selected {
            Some(selected) => nearby_places(selected, self.index.places()),
            None => Vec::new(),
        }
    }

    /// The latest "popular near you" ranking.
    pub fn popular_ranking(&self) -> Vec<PopularPlace> {
        self.popular_ranking.lock().clone()
    }

    /// Current weather at the selected place.
    pub async fn selected_weather(&self) -> Result<CurrentWeather, DeccanError> {
        let position = self
            .selected
            .as_ref()
            .and_then(|place| place.position)
            .ok_or(DeccanError::WeatherUnavailable)?;

        self.weather.current(position).await
    }

    /// All reviews of the selected place, newest first.
    pub async fn selected_reviews(&self) -> Result<Vec<Review>, DeccanError> {
        let Some(selected) = &self.selected else {
            return Ok(Vec::new());
        };

        Ok(sorted_for_display(
            self.reviews.reviews_for(&selected.name).await?,
        ))
    }

    /// The place catalog.
    pub fn catalog(&self) -> &PlaceIndex {
        &self.index
    }

    /// The current filter state.
    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    /// The currently visible subset of the catalog.
    pub fn filtered_places(&self) -> &[Place] {
        &self.filtered
    }

    /// The user position snapshot, if one was acquired.
    pub fn user_location(&self) -> Option<GeoPoint> {
        self.tracker.location()
    }

    /// The deployment configuration.
    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    /// Tears the explorer down: stops the popularity poller and detaches
    /// everything from the rendering surface.
    pub fn shutdown(&mut self) {
        self.popular = None;
        self.signals.close();
        self.layers.clear();
    }

    fn on_filter_changed(&mut self) {
        self.selected = None;
        self.clear_route_state();
        self.refresh_filtered();
        self.reframe();
    }

    fn refresh_filtered(&mut self) {
        self.filtered = self.filter.apply(&self.index);
        self.layers.set_places(&self.filtered);
        self.restart_popular();
    }

    fn restart_popular(&mut self) {
        // Dropping the old poller cancels it before the new one starts.
        self.popular = None;

        let sink = Arc::clone(&self.popular_ranking);
        self.popular = Some(PopularPoller::spawn(
            self.index.places().to_vec(),
            self.filter.district().map(str::to_owned),
            self.tracker.location(),
            Arc::clone(&self.reviews),
            move |ranked| *sink.lock() = ranked,
        ));
    }

    fn apply_selection(&mut self, place: Place) {
        self.clear_route_state();
        self.selected = Some(place.clone());
        if let Some(command) = focus_place(&place) {
            self.viewport.apply(command);
        }
    }

    /// Clears the route state and overlay. Returns whether a route was
    /// actually cleared.
    fn clear_route_state(&mut self) -> bool {
        if self.route.take().is_some() {
            self.layers.set_route(None);
            true
        } else {
            false
        }
    }

    fn reframe(&self) {
        let inputs = ViewportInputs {
            route: self.route.as_ref(),
            selected_district: self.filter.district(),
            selected_category: self.filter.category(),
            catalog: self.index.places(),
            boundary: self.boundary_bounds,
        };

        if let Some(command) = reframe(&inputs) {
            self.viewport.apply(command);
        }
    }
}
