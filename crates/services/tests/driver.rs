//! Driver flows against in-process fake providers.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::time::Instant;

use async_trait::async_trait;
use cafemap_core::cache::MemoryStore;
use cafemap_core::{
    App, AppConfig, Coordinate, Error, Event, Filter, FixOptions, Place, PoiCache,
    PointOfInterest, Result, Route, TravelMode, DEFAULT_CENTER,
};
use cafemap_services::driver::DynStore;
use cafemap_services::{Driver, Geocoder, Geolocator, PoiDiscovery, PoiSource, Router};

// ── Fakes ───────────────────────────────────────────────────────────

const BREW_CO: Coordinate = Coordinate::new(14.6012, 120.9851);
const PLAIN: Coordinate = Coordinate::new(14.5981, 120.9830);

#[derive(Default)]
struct FakeCafes {
    calls: AtomicUsize,
    last: Mutex<Option<(Coordinate, u32)>>,
}

#[async_trait]
impl PoiSource for FakeCafes {
    async fn cafes_near(&self, at: Coordinate, radius_m: u32) -> Result<Vec<PointOfInterest>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some((at, radius_m));

        let tags = |pairs: &[(&str, &str)]| -> BTreeMap<String, String> {
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        };
        Ok(vec![
            PointOfInterest::new(BREW_CO, tags(&[("name", "Brew Co"), ("wheelchair", "yes")])),
            PointOfInterest::new(PLAIN, tags(&[("name", "X")])),
        ])
    }
}

/// Straight-line router that refuses anything more than ~100 km away.
#[derive(Default)]
struct FakeRouter {
    requests: Mutex<Vec<(Coordinate, Coordinate, TravelMode)>>,
}

#[async_trait]
impl Router for FakeRouter {
    async fn route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        mode: TravelMode,
    ) -> Result<Route> {
        self.requests.lock().unwrap().push((origin, destination, mode));
        let span = (origin.lat - destination.lat).abs() + (origin.lon - destination.lon).abs();
        if span > 1.0 {
            return Err(Error::RouteUnreachable("NoRoute: too far".into()));
        }
        Ok(Route {
            path: vec![origin, destination],
            distance_m: span * 111_000.0,
            duration_s: span * 8_000.0,
            instructions: vec![],
        })
    }
}

struct FakeGeocoder;

#[async_trait]
impl Geocoder for FakeGeocoder {
    async fn search(&self, query: &str) -> Result<Vec<Place>> {
        if query.eq_ignore_ascii_case("intramuros") {
            Ok(vec![Place {
                coordinate: Coordinate::new(14.5896, 120.9747),
                label: "Intramuros, Manila".into(),
            }])
        } else {
            Ok(vec![])
        }
    }
}

/// Hands out scripted fixes in order, then reports the position unavailable.
struct Scripted(Mutex<VecDeque<Result<Coordinate>>>);

impl Scripted {
    fn new(fixes: Vec<Result<Coordinate>>) -> Self {
        Self(Mutex::new(fixes.into()))
    }
}

#[async_trait]
impl Geolocator for Scripted {
    async fn fix(&self, _options: FixOptions) -> Result<Coordinate> {
        self.0
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(Error::GeolocationUnavailable))
    }
}

/// Answers the first fix, then never answers again.
struct Stalling {
    first: Mutex<Option<Coordinate>>,
}

#[async_trait]
impl Geolocator for Stalling {
    async fn fix(&self, _options: FixOptions) -> Result<Coordinate> {
        let first = self.first.lock().unwrap().take();
        match first {
            Some(at) => Ok(at),
            None => futures::future::pending().await,
        }
    }
}

struct Harness {
    driver: Driver,
    cafes: Arc<FakeCafes>,
    router: Arc<FakeRouter>,
}

fn harness(fixes: Vec<Result<Coordinate>>) -> Harness {
    harness_with(Arc::new(Scripted::new(fixes)))
}

fn harness_with(geolocator: Arc<dyn Geolocator>) -> Harness {
    let config = AppConfig {
        view_settle_fallback_ms: 0,
        ..AppConfig::default()
    };
    let cafes = Arc::new(FakeCafes::default());
    let router = Arc::new(FakeRouter::default());
    let store: DynStore = Box::new(MemoryStore::new());
    let discovery = PoiDiscovery::new(cafes.clone(), PoiCache::new(store));
    let driver = Driver::new(
        App::new(config),
        discovery,
        Arc::new(FakeGeocoder),
        router.clone(),
        geolocator,
    );
    Harness {
        driver,
        cafes,
        router,
    }
}

async fn started(fixes: Vec<Result<Coordinate>>) -> Harness {
    let mut h = harness(fixes);
    h.driver.start();
    h.driver.settle().await;
    h
}

fn card_names(driver: &Driver) -> Vec<String> {
    driver.view().list.cards.into_iter().map(|c| c.name).collect()
}

// ── Scenarios ───────────────────────────────────────────────────────

#[tokio::test]
async fn denied_geolocation_uses_fallback_centre() {
    let h = started(vec![Err(Error::GeolocationDenied)]).await;

    assert_eq!(*h.cafes.last.lock().unwrap(), Some((DEFAULT_CENTER, 3000)));
    let view = h.driver.view();
    let marker = view.location.unwrap();
    assert_eq!(marker.coordinate, DEFAULT_CENTER);
    assert!(marker.fallback);
    assert!(!view.loading_screen);
    assert!(view.panels.list_open());
    assert!(!h.driver.is_watching());
    assert_eq!(card_names(&h.driver), vec!["Brew Co", "X"]);
}

#[tokio::test]
async fn watch_fix_in_same_cell_is_served_from_cache() {
    let first = Coordinate::new(14.5995, 120.9842);
    let moved = Coordinate::new(14.5998, 120.9841);
    let mut h = started(vec![Ok(first), Ok(moved)]).await;
    assert!(h.driver.is_watching());
    assert_eq!(h.cafes.calls.load(Ordering::SeqCst), 1);

    assert!(h.driver.poll_watch());
    h.driver.settle().await;
    assert_eq!(h.driver.app().location().current(), Some(moved));
    assert_eq!(h.cafes.calls.load(Ordering::SeqCst), 1);
    assert_eq!(card_names(&h.driver).len(), 2);
}

#[tokio::test]
async fn wheelchair_filter_keeps_only_brew_co() {
    let mut h = started(vec![Err(Error::GeolocationDenied)]).await;

    h.driver.dispatch(Event::FilterToggled(Filter::Wheelchair));
    h.driver.settle().await;
    assert_eq!(card_names(&h.driver), vec!["Brew Co"]);
    assert_eq!(h.cafes.calls.load(Ordering::SeqCst), 1);

    h.driver.dispatch(Event::FilterToggled(Filter::Wheelchair));
    assert_eq!(card_names(&h.driver).len(), 2);
}

#[tokio::test]
async fn unreachable_route_alerts_and_clears_selection() {
    let mut h = started(vec![Err(Error::GeolocationDenied)]).await;
    let far_away = Coordinate::new(10.1, 122.5);

    h.driver.dispatch(Event::CardClicked(far_away));
    h.driver.settle().await;

    let alerts = h.driver.take_alerts();
    assert_eq!(alerts.len(), 1);
    assert!(alerts[0].starts_with("Could not compute a route"));
    assert_eq!(h.driver.app().selected(), None);
    let view = h.driver.view();
    assert!(view.route.is_none());
    assert!(view.markers.iter().all(|m| !m.routed));
    assert!(view.list.cards.iter().all(|c| !c.active));
}

#[tokio::test]
async fn pin_reroutes_from_pinned_position_once_view_settles() {
    let mut h = started(vec![Err(Error::GeolocationDenied)]).await;

    h.driver.dispatch(Event::CardClicked(BREW_CO));
    h.driver.settle().await;
    assert!(h.driver.app().routes().route().is_some());

    let pinned = Coordinate::new(14.5950, 120.9800);
    h.driver.dispatch(Event::MapClicked(pinned));
    assert!(h.driver.view().interaction.pinning);
    h.driver.settle().await;

    let requests = h.router.requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].0, pinned);
    assert_eq!(requests[1].1, BREW_CO);
    assert!(h.driver.app().location().is_manual());
    assert!(h.driver.app().routes().route().is_some());
    assert!(!h.driver.view().interaction.pinning);
}

#[tokio::test]
async fn latest_card_click_wins() {
    let mut h = started(vec![Err(Error::GeolocationDenied)]).await;

    h.driver.dispatch(Event::CardClicked(BREW_CO));
    h.driver.dispatch(Event::CardClicked(PLAIN));
    h.driver.settle().await;

    let route = h.driver.app().routes().route().cloned().unwrap();
    assert_eq!(route.path.last(), Some(&PLAIN));
    let active: Vec<_> = h
        .driver
        .view()
        .list
        .cards
        .into_iter()
        .filter(|c| c.active)
        .map(|c| c.name)
        .collect();
    assert_eq!(active, vec!["X"]);

    h.driver.dispatch(Event::CardClicked(PLAIN));
    assert!(h.driver.app().routes().session().is_none());
}

#[tokio::test]
async fn search_pins_or_alerts() {
    let mut h = started(vec![Err(Error::GeolocationDenied)]).await;

    h.driver.dispatch(Event::SearchSubmitted("Atlantis".into()));
    h.driver.settle().await;
    assert_eq!(h.driver.take_alerts(), vec!["Location not found."]);

    h.driver.dispatch(Event::SearchSubmitted("Intramuros".into()));
    h.driver.settle().await;
    assert_eq!(
        h.driver.app().location().current(),
        Some(Coordinate::new(14.5896, 120.9747))
    );
    assert!(h.driver.app().location().is_manual());
    assert_eq!(h.cafes.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn walking_mode_recomputes_active_route() {
    let mut h = started(vec![Err(Error::GeolocationDenied)]).await;
    h.driver.dispatch(Event::CardClicked(BREW_CO));
    h.driver.dispatch(Event::TravelModeChanged(TravelMode::Walking));
    h.driver.settle().await;

    let requests = h.router.requests.lock().unwrap().clone();
    assert_eq!(requests.last().map(|r| r.2), Some(TravelMode::Walking));
    assert_eq!(
        h.driver.view().route.map(|r| r.mode),
        Some(TravelMode::Walking)
    );
}

#[tokio::test(start_paused = true)]
async fn unanswered_locate_times_out() {
    let first = Coordinate::new(14.5995, 120.9842);
    let mut h = harness_with(Arc::new(Stalling {
        first: Mutex::new(Some(first)),
    }));
    h.driver.start();
    h.driver.settle().await;
    assert!(h.driver.is_watching());

    let asked = Instant::now();
    h.driver.dispatch(Event::LocateRequested);
    h.driver.settle().await;
    assert!(asked.elapsed() >= FixOptions::locate().timeout().unwrap());
    assert_eq!(h.driver.take_alerts(), vec!["Location access denied."]);
    assert_eq!(h.driver.app().location().current(), Some(first));

    // A stalled watch fix is dropped quietly.
    assert!(h.driver.poll_watch());
    h.driver.settle().await;
    assert!(h.driver.take_alerts().is_empty());
    assert_eq!(h.driver.app().location().current(), Some(first));
}

#[tokio::test(start_paused = true)]
async fn watch_polls_respect_the_interval() {
    let first = Coordinate::new(14.5995, 120.9842);
    let moved = Coordinate::new(14.5998, 120.9841);
    let later = Coordinate::new(14.6001, 120.9840);
    let mut h = started(vec![Ok(first), Ok(moved), Ok(later)]).await;

    assert!(h.driver.poll_watch());
    h.driver.settle().await;
    assert!(!h.driver.poll_watch());
    assert!(h.driver.is_idle());
    assert_eq!(h.driver.app().location().current(), Some(moved));

    tokio::time::advance(FixOptions::watch().watch_interval()).await;
    assert!(h.driver.poll_watch());
    h.driver.settle().await;
    assert_eq!(h.driver.app().location().current(), Some(later));
}
