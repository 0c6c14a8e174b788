//! Async host for the core state machine.
//!
//! The [`Driver`] owns an [`App`] and runs the effects it queues against the
//! providers. All requests run concurrently on the caller's task through a
//! [`FuturesUnordered`]; each completion is fed back as an [`Event`], which
//! may queue more effects. Nothing is spawned, so the driver works on a
//! current-thread runtime.

use std::sync::Arc;
use std::time::Duration;

use cafemap_core::cache::BlobStore;
use cafemap_core::location::FixPurpose;
use cafemap_core::{
    App, AppConfig, Coordinate, Effect, Error, Event, FixOptions, PoiCache, PointOfInterest,
    Result, Token, ViewModel,
};
use futures::future::{self, BoxFuture};
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::discovery::PoiDiscovery;
use crate::nominatim::NominatimClient;
use crate::options::ServiceOptions;
use crate::osrm::OsrmClient;
use crate::overpass::OverpassClient;
use crate::providers::{Geocoder, Geolocator, Router};

/// Boxed blob store the driver caches into.
pub type DynStore = Box<dyn BlobStore + Send>;

/// One device fix, bounded by the options' timeout when there is one.
async fn bounded_fix(geolocator: Arc<dyn Geolocator>, options: FixOptions) -> Result<Coordinate> {
    match options.timeout() {
        Some(limit) => match tokio::time::timeout(limit, geolocator.fix(options)).await {
            Ok(fix) => fix,
            Err(_) => {
                warn!("no position within {:?}", limit);
                Err(Error::GeolocationTimeout)
            }
        },
        None => geolocator.fix(options).await,
    }
}

enum Completion {
    Event(Event),
    /// Fresh source results, cached before the app sees them.
    Discovered {
        token: Token,
        at: Coordinate,
        result: Result<Vec<PointOfInterest>>,
    },
}

pub struct Driver {
    app: App,
    discovery: PoiDiscovery<DynStore>,
    geocoder: Arc<dyn Geocoder>,
    router: Arc<dyn Router>,
    geolocator: Arc<dyn Geolocator>,
    pending: FuturesUnordered<BoxFuture<'static, Completion>>,
    watch: Option<FixOptions>,
    last_watch_poll: Option<Instant>,
    alerts: Vec<String>,
    renders: u64,
}

impl Driver {
    pub fn new(
        app: App,
        discovery: PoiDiscovery<DynStore>,
        geocoder: Arc<dyn Geocoder>,
        router: Arc<dyn Router>,
        geolocator: Arc<dyn Geolocator>,
    ) -> Self {
        Self {
            app,
            discovery,
            geocoder,
            router,
            geolocator,
            pending: FuturesUnordered::new(),
            watch: None,
            last_watch_poll: None,
            alerts: Vec::new(),
            renders: 0,
        }
    }

    /// Driver wired to the public OpenStreetMap services.
    pub fn with_services(
        config: AppConfig,
        options: &ServiceOptions,
        store: DynStore,
        geolocator: Arc<dyn Geolocator>,
    ) -> crate::Result<Self> {
        let cache = PoiCache::with_precision(store, config.cache_precision);
        let discovery = PoiDiscovery::new(Arc::new(OverpassClient::new(options)?), cache);
        Ok(Self::new(
            App::new(config),
            discovery,
            Arc::new(NominatimClient::new(options)?),
            Arc::new(OsrmClient::new(options)?),
            geolocator,
        ))
    }

    // ── State ───────────────────────────────────────────────────────

    pub fn app(&self) -> &App {
        &self.app
    }

    pub fn view(&self) -> ViewModel {
        cafemap_core::render(&self.app)
    }

    pub fn discovery(&self) -> &PoiDiscovery<DynStore> {
        &self.discovery
    }

    /// Alerts raised since the last call, oldest first.
    pub fn take_alerts(&mut self) -> Vec<String> {
        std::mem::take(&mut self.alerts)
    }

    /// How many render requests the app has made.
    pub fn renders(&self) -> u64 {
        self.renders
    }

    pub fn is_watching(&self) -> bool {
        self.watch.is_some()
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }

    // ── Input ───────────────────────────────────────────────────────

    pub fn start(&mut self) {
        self.app.start();
        self.pump();
    }

    pub fn dispatch(&mut self, event: Event) {
        self.app.handle(event);
        self.pump();
    }

    /// Request one watch fix, as a device would deliver periodically.
    ///
    /// Returns `false` when tracking has not started, or when the previous
    /// poll was less than [`FixOptions::watch_interval`] ago.
    pub fn poll_watch(&mut self) -> bool {
        let Some(options) = self.watch else {
            return false;
        };
        let now = Instant::now();
        if let Some(last) = self.last_watch_poll {
            if now.duration_since(last) < options.watch_interval() {
                debug!("watch poll refused, last one {:?} ago", now.duration_since(last));
                return false;
            }
        }
        self.last_watch_poll = Some(now);
        let geolocator = Arc::clone(&self.geolocator);
        self.pending.push(Box::pin(async move {
            Completion::Event(Event::WatchFix(bounded_fix(geolocator, options).await))
        }));
        true
    }

    /// Apply the next completion. Returns `false` when nothing is in flight.
    pub async fn step(&mut self) -> bool {
        match self.pending.next().await {
            Some(completion) => {
                self.complete(completion);
                true
            }
            None => false,
        }
    }

    /// Run until every request, including follow-ups, has completed.
    pub async fn settle(&mut self) {
        while self.step().await {}
    }

    // ── Effects ─────────────────────────────────────────────────────

    fn complete(&mut self, completion: Completion) {
        match completion {
            Completion::Event(event) => self.dispatch(event),
            Completion::Discovered { token, at, result } => {
                if let Ok(pois) = &result {
                    self.discovery.store(&at, pois);
                }
                self.dispatch(Event::CafesLoaded { token, result });
            }
        }
    }

    fn pump(&mut self) {
        for effect in self.app.drain_effects() {
            self.run(effect);
        }
    }

    fn run(&mut self, effect: Effect) {
        match effect {
            Effect::RequestFix { purpose, options } => {
                let geolocator = Arc::clone(&self.geolocator);
                self.pending.push(Box::pin(async move {
                    let fix = bounded_fix(geolocator, options).await;
                    Completion::Event(match purpose {
                        FixPurpose::Initial => Event::InitialFix(fix),
                        FixPurpose::Locate => Event::LocateFix(fix),
                    })
                }));
            }
            Effect::StartWatch { options } => {
                info!("watching position every {:?}", options.watch_interval());
                self.watch = Some(options);
            }
            Effect::Discover { token, at, radius_m } => match self.discovery.cached(&at) {
                Some(pois) => self.pending.push(Box::pin(future::ready(Completion::Event(
                    Event::CafesLoaded {
                        token,
                        result: Ok(pois),
                    },
                )))),
                None => {
                    let fetch = self.discovery.fetch(at, radius_m);
                    self.pending.push(Box::pin(async move {
                        Completion::Discovered {
                            token,
                            at,
                            result: fetch.await,
                        }
                    }));
                }
            },
            Effect::Geocode { token, query } => {
                let geocoder = Arc::clone(&self.geocoder);
                self.pending.push(Box::pin(async move {
                    let result = geocoder.search(&query).await;
                    Completion::Event(Event::GeocodeFinished { token, result })
                }));
            }
            Effect::ComputeRoute { request } => {
                let router = Arc::clone(&self.router);
                self.pending.push(Box::pin(async move {
                    let result = router
                        .route(request.origin, request.destination, request.mode)
                        .await;
                    Completion::Event(Event::RouteFinished {
                        token: request.token,
                        result,
                    })
                }));
            }
            Effect::ClearRoute => debug!("route cleared"),
            Effect::SetView { center, zoom } => debug!("view -> {} @ z{}", center, zoom),
            Effect::AwaitViewSettled { fallback_ms } => {
                // No map widget here: the fallback delay is the only signal.
                self.pending.push(Box::pin(async move {
                    tokio::time::sleep(Duration::from_millis(fallback_ms)).await;
                    Completion::Event(Event::ViewSettled)
                }));
            }
            Effect::Alert { message } => {
                info!("alert: {}", message);
                self.alerts.push(message);
            }
            Effect::Render => self.renders += 1,
        }
    }
}
