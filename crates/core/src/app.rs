//! The application state machine.
//!
//! [`App`] owns location, filters, the route session, panels and the current
//! café collection. Hosts feed it [`Event`]s (or call the matching methods)
//! and execute the [`Effect`]s it queues: geolocation requests, service calls,
//! map view changes, alerts and re-renders. Responses come back as events
//! carrying the [`Token`] they were issued with, so late answers are dropped.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::filter::{Filter, FilterState};
use crate::geo::{Coordinate, Place};
use crate::location::{FixOptions, FixPurpose, LocationManager};
use crate::panels::Panels;
use crate::poi::PointOfInterest;
use crate::route::{Route, RouteManager, RouteOutcome, RouteRequest, TravelMode};
use crate::token::{Sequencer, Token};

pub const ALERT_NOT_FOUND: &str = "Location not found.";
pub const ALERT_LOCATION_DENIED: &str = "Location access denied.";

/// Work for the host to carry out.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Effect {
    /// One-shot device fix; answer with `InitialFix` or `LocateFix`.
    RequestFix {
        purpose: FixPurpose,
        options: FixOptions,
    },
    /// Begin continuous tracking; answer with `WatchFix` events.
    StartWatch { options: FixOptions },
    /// Find cafés around `at`; answer with `CafesLoaded`.
    Discover {
        token: Token,
        at: Coordinate,
        radius_m: u32,
    },
    /// Free-text place search; answer with `GeocodeFinished`.
    Geocode { token: Token, query: String },
    /// Answer with `RouteFinished`.
    ComputeRoute { request: RouteRequest },
    /// Remove the drawn route, if any.
    ClearRoute,
    SetView { center: Coordinate, zoom: u8 },
    /// Answer with `ViewSettled` once the map finished moving, or after
    /// `fallback_ms` if the widget cannot tell.
    AwaitViewSettled { fallback_ms: u64 },
    /// Blocking user notification.
    Alert { message: String },
    /// State changed; rebuild the view model.
    Render,
}

/// Inputs from the host: device fixes, service answers and user actions.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    InitialFix(Result<Coordinate>),
    WatchFix(Result<Coordinate>),
    LocateFix(Result<Coordinate>),
    MapClicked(Coordinate),
    SearchSubmitted(String),
    GeocodeFinished {
        token: Token,
        result: Result<Vec<Place>>,
    },
    LocateRequested,
    FilterToggled(Filter),
    CafesLoaded {
        token: Token,
        result: Result<Vec<PointOfInterest>>,
    },
    CardClicked(Coordinate),
    MarkerRouteRequested(Coordinate),
    UnrouteRequested,
    RouteFinished {
        token: Token,
        result: Result<Route>,
    },
    TravelModeChanged(TravelMode),
    ViewSettled,
    DirectionsToggled,
    ListToggled,
    ViewportResized { width_px: u32 },
    DragStarted,
    DragEnded,
}

/// State of the café list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum ListStatus {
    /// Nothing requested yet.
    Idle,
    Loading,
    Ready,
    Failed(String),
}

/// Transient map interaction flags, for styling only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Interaction {
    pub pinning: bool,
    pub dragging: bool,
}

/// How a new position moves the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    /// Centre and zoom on it; re-route once the view settles.
    Zoom,
    /// Leave the view alone; re-route right away.
    Keep,
}

pub struct App {
    config: AppConfig,
    location: LocationManager,
    filters: FilterState,
    routes: RouteManager,
    panels: Panels,
    discovery: Sequencer,
    geocoding: Sequencer,
    pois: Vec<PointOfInterest>,
    list: ListStatus,
    reroute_pending: bool,
    loading_screen: bool,
    interaction: Interaction,
    view: Option<(Coordinate, u8)>,
    effects: Vec<Effect>,
}

impl Default for App {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        Self {
            location: LocationManager::new(config.fallback_center),
            routes: RouteManager::new(config.travel_mode),
            filters: FilterState::new(),
            panels: Panels::default(),
            discovery: Sequencer::new(),
            geocoding: Sequencer::new(),
            pois: Vec::new(),
            list: ListStatus::Idle,
            reroute_pending: false,
            loading_screen: true,
            interaction: Interaction::default(),
            view: None,
            effects: Vec::new(),
            config,
        }
    }

    // ── Accessors ───────────────────────────────────────────────────

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn location(&self) -> &LocationManager {
        &self.location
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn routes(&self) -> &RouteManager {
        &self.routes
    }

    pub fn panels(&self) -> &Panels {
        &self.panels
    }

    /// Unfiltered cafés of the latest applied discovery, in service order.
    pub fn pois(&self) -> &[PointOfInterest] {
        &self.pois
    }

    pub fn list_status(&self) -> &ListStatus {
        &self.list
    }

    pub fn loading_screen(&self) -> bool {
        self.loading_screen
    }

    pub fn interaction(&self) -> Interaction {
        self.interaction
    }

    /// Last view requested through [`Effect::SetView`].
    pub fn view(&self) -> Option<(Coordinate, u8)> {
        self.view
    }

    /// The selected café is the active route destination.
    pub fn selected(&self) -> Option<Coordinate> {
        self.routes.destination()
    }

    pub fn reroute_pending(&self) -> bool {
        self.reroute_pending
    }

    /// Take the queued effects, oldest first.
    pub fn drain_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    // ── Event dispatch ──────────────────────────────────────────────

    pub fn handle(&mut self, event: Event) {
        match event {
            Event::InitialFix(fix) => self.initial_fix(fix),
            Event::WatchFix(fix) => self.watch_fix(fix),
            Event::LocateFix(fix) => self.locate_fix(fix),
            Event::MapClicked(at) => self.pin(at),
            Event::SearchSubmitted(query) => self.search(&query),
            Event::GeocodeFinished { token, result } => self.geocode_finished(token, result),
            Event::LocateRequested => self.locate(),
            Event::FilterToggled(filter) => {
                self.toggle_filter(filter);
            }
            Event::CafesLoaded { token, result } => self.cafes_loaded(token, result),
            Event::CardClicked(at) => self.select_cafe(at),
            Event::MarkerRouteRequested(at) => self.route_from_marker(at),
            Event::UnrouteRequested => self.unroute(),
            Event::RouteFinished { token, result } => self.route_finished(token, result),
            Event::TravelModeChanged(mode) => self.set_travel_mode(mode),
            Event::ViewSettled => self.view_settled(),
            Event::DirectionsToggled => {
                self.toggle_directions_panel();
            }
            Event::ListToggled => {
                self.toggle_list_panel();
            }
            Event::ViewportResized { width_px } => self.viewport_resized(width_px),
            Event::DragStarted => self.set_dragging(true),
            Event::DragEnded => self.set_dragging(false),
        }
    }

    // ── Location ────────────────────────────────────────────────────

    /// Show the fallback view and ask for the startup fix.
    pub fn start(&mut self) {
        self.set_view(self.config.fallback_center, self.config.initial_zoom);
        self.effects.push(Effect::RequestFix {
            purpose: FixPurpose::Initial,
            options: self.config.initial_fix,
        });
        self.mark_dirty();
    }

    pub fn initial_fix(&mut self, fix: Result<Coordinate>) {
        let was_tracking = self.location.tracking_active();
        if let Some(at) = self.location.initial_fix(fix) {
            self.relocated(at, Focus::Zoom);
        }
        self.start_watch_if_needed(was_tracking);
    }

    pub fn watch_fix(&mut self, fix: Result<Coordinate>) {
        if let Some(at) = self.location.watch_fix(fix) {
            self.relocated(at, Focus::Keep);
        }
    }

    /// "Use my location": leave manual mode and request a precise fix.
    pub fn locate(&mut self) {
        self.location.request_locate();
        self.effects.push(Effect::RequestFix {
            purpose: FixPurpose::Locate,
            options: self.config.locate,
        });
    }

    pub fn locate_fix(&mut self, fix: Result<Coordinate>) {
        let was_tracking = self.location.tracking_active();
        match self.location.locate_fix(fix) {
            Ok(Some(at)) => {
                self.relocated(at, Focus::Zoom);
                self.start_watch_if_needed(was_tracking);
            }
            Ok(None) => debug!("locate answer no longer wanted"),
            Err(e) => {
                warn!("locate failed: {}", e);
                self.alert(ALERT_LOCATION_DENIED);
            }
        }
    }

    /// Map click: pin the position there.
    pub fn pin(&mut self, at: Coordinate) {
        self.interaction.pinning = true;
        self.pin_manual(at);
    }

    /// Submit a free-text place search.
    pub fn search(&mut self, query: &str) {
        let query = query.trim();
        if query.is_empty() {
            self.alert(&Error::EmptyQuery.to_string());
            return;
        }
        let token = self.geocoding.issue();
        info!("geocoding \"{}\" {}", query, token);
        self.effects.push(Effect::Geocode {
            token,
            query: query.to_string(),
        });
    }

    pub fn geocode_finished(&mut self, token: Token, result: Result<Vec<Place>>) {
        if !self.geocoding.is_current(token) {
            debug!("dropping stale geocode response {}", token);
            return;
        }
        match result {
            Ok(places) => match places.into_iter().next() {
                Some(place) => {
                    info!("search resolved to {} ({})", place.label, place.coordinate);
                    self.pin_manual(place.coordinate);
                }
                None => self.alert(ALERT_NOT_FOUND),
            },
            Err(Error::NoResultsFound(_)) => self.alert(ALERT_NOT_FOUND),
            Err(e) => {
                warn!("geocoding failed: {}", e);
                self.alert(&format!("Location search failed: {e}"));
            }
        }
    }

    fn pin_manual(&mut self, at: Coordinate) {
        if self.routes.detach() {
            self.effects.push(Effect::ClearRoute);
        }
        self.location.pin(at);
        self.relocated(at, Focus::Zoom);
    }

    fn start_watch_if_needed(&mut self, was_tracking: bool) {
        if !was_tracking && self.location.tracking_active() {
            self.effects.push(Effect::StartWatch {
                options: self.config.watch,
            });
        }
    }

    /// Every new position refreshes cafés and carries an active route along.
    fn relocated(&mut self, at: Coordinate, focus: Focus) {
        match focus {
            Focus::Zoom => {
                self.set_view(at, self.config.focus_zoom);
                if self.routes.destination().is_some() {
                    if self.routes.detach() {
                        self.effects.push(Effect::ClearRoute);
                    }
                    self.reroute_pending = true;
                    self.effects.push(Effect::AwaitViewSettled {
                        fallback_ms: self.config.view_settle_fallback_ms,
                    });
                }
            }
            Focus::Keep => {
                if let Some(request) = self.routes.reissue(at) {
                    self.reroute_pending = false;
                    self.effects.push(Effect::ComputeRoute { request });
                }
            }
        }
        self.refresh_cafes();
        self.mark_dirty();
    }

    /// The map finished moving: run the deferred re-route.
    pub fn view_settled(&mut self) {
        self.interaction.pinning = false;
        if self.reroute_pending {
            self.reroute_pending = false;
            let origin = self.location.current_or_fallback();
            if let Some(request) = self.routes.reissue(origin) {
                self.effects.push(Effect::ComputeRoute { request });
            }
        }
        self.mark_dirty();
    }

    fn set_view(&mut self, center: Coordinate, zoom: u8) {
        self.view = Some((center, zoom));
        self.effects.push(Effect::SetView { center, zoom });
    }

    // ── Discovery ───────────────────────────────────────────────────

    /// Re-query cafés around the current position.
    pub fn refresh_cafes(&mut self) {
        let Some(at) = self.location.current() else {
            return;
        };
        let token = self.discovery.issue();
        self.list = ListStatus::Loading;
        self.effects.push(Effect::Discover {
            token,
            at,
            radius_m: self.config.search_radius_m,
        });
    }

    pub fn cafes_loaded(&mut self, token: Token, result: Result<Vec<PointOfInterest>>) {
        if !self.discovery.is_current(token) {
            debug!("dropping stale discovery response {}", token);
            return;
        }
        self.loading_screen = false;
        match result {
            Ok(pois) => {
                info!("{} cafes loaded {}", pois.len(), token);
                self.pois = pois;
                self.list = ListStatus::Ready;
                self.panels.open_list();
            }
            Err(e) => {
                warn!("discovery failed: {}", e);
                let message = format!("Could not load cafes: {e}");
                self.list = ListStatus::Failed(message.clone());
                self.alert(&message);
            }
        }
        self.mark_dirty();
    }

    /// Flip a filter and re-render from the already loaded cafés.
    pub fn toggle_filter(&mut self, filter: Filter) -> bool {
        let on = self.filters.toggle(filter);
        debug!("filter {} {}", filter, if on { "on" } else { "off" });
        self.mark_dirty();
        on
    }

    // ── Routes ──────────────────────────────────────────────────────

    /// Route from the current position (or the fallback) to `destination`.
    pub fn route_to(&mut self, destination: Coordinate) {
        if self.routes.session().is_some_and(|s| s.is_displayed()) {
            self.effects.push(Effect::ClearRoute);
        }
        let origin = self.location.current_or_fallback();
        let request = self.routes.route_to(origin, destination);
        self.reroute_pending = false;
        self.effects.push(Effect::ComputeRoute { request });
        self.mark_dirty();
    }

    /// Card click: toggles the route to that café.
    pub fn select_cafe(&mut self, at: Coordinate) {
        if self.routes.is_routed_to(&at) {
            self.unroute();
        } else {
            self.route_to(at);
        }
    }

    /// "Get Route" in a marker popup.
    pub fn route_from_marker(&mut self, at: Coordinate) {
        self.route_to(at);
    }

    pub fn unroute(&mut self) {
        if let Some(previous) = self.routes.unroute() {
            if previous.is_displayed() {
                self.effects.push(Effect::ClearRoute);
            }
        }
        self.reroute_pending = false;
        self.mark_dirty();
    }

    pub fn route_finished(&mut self, token: Token, result: Result<Route>) {
        let result = result.map_err(|e| match e {
            Error::RouteUnreachable(_) => e,
            other => Error::RouteUnreachable(other.to_string()),
        });
        match self.routes.finish(token, result) {
            RouteOutcome::Stale => {}
            RouteOutcome::Ready => self.mark_dirty(),
            RouteOutcome::Failed(e) => {
                self.effects.push(Effect::ClearRoute);
                self.alert(&format!("Could not compute a route: {e}"));
                self.mark_dirty();
            }
        }
    }

    /// Switch between driving and walking; an active route is recomputed.
    pub fn set_travel_mode(&mut self, mode: TravelMode) {
        if !self.routes.set_mode(mode) {
            return;
        }
        if let Some(destination) = self.routes.destination() {
            self.route_to(destination);
        } else {
            self.mark_dirty();
        }
    }

    // ── Panels & interaction ────────────────────────────────────────

    pub fn toggle_directions_panel(&mut self) -> bool {
        let open = self.panels.toggle_directions();
        self.mark_dirty();
        open
    }

    pub fn toggle_list_panel(&mut self) -> bool {
        let open = self.panels.toggle_list();
        self.mark_dirty();
        open
    }

    pub fn viewport_resized(&mut self, width_px: u32) {
        let compact = width_px < self.config.compact_breakpoint_px;
        if compact != self.panels.compact() {
            self.panels.set_compact(compact);
            self.mark_dirty();
        }
    }

    fn set_dragging(&mut self, dragging: bool) {
        self.interaction.dragging = dragging;
        self.mark_dirty();
    }

    fn alert(&mut self, message: &str) {
        self.effects.push(Effect::Alert {
            message: message.to_string(),
        });
    }

    fn mark_dirty(&mut self) {
        if !self.effects.contains(&Effect::Render) {
            self.effects.push(Effect::Render);
        }
    }
}
