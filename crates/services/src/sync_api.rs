//! Blocking (synchronous) API for native platforms.
//!
//! Wraps the async clients and the [`Driver`] with a Tokio runtime so callers
//! don't need to manage their own async runtime.

use cafemap_core::{App, Coordinate, Event, Place, PointOfInterest, Route, TravelMode, ViewModel};
use tokio::runtime::{Builder, Runtime};

use crate::driver::Driver;
use crate::error::{Result, ServiceError};
use crate::nominatim::NominatimClient;
use crate::options::ServiceOptions;
use crate::osrm::OsrmClient;
use crate::overpass::OverpassClient;

fn runtime() -> Result<Runtime> {
    Ok(Builder::new_current_thread().enable_all().build()?)
}

/// Blocking wrapper around the three service clients.
///
/// Uses an internal single-threaded Tokio runtime. Not available on WASM.
pub struct ServicesBlocking {
    rt: Runtime,
    overpass: OverpassClient,
    nominatim: NominatimClient,
    osrm: OsrmClient,
}

impl ServicesBlocking {
    pub fn new(options: &ServiceOptions) -> Result<Self> {
        Ok(Self {
            rt: runtime()?,
            overpass: OverpassClient::new(options)?,
            nominatim: NominatimClient::new(options)?,
            osrm: OsrmClient::new(options)?,
        })
    }

    /// Cafés within `radius_m` of `at` (blocking).
    pub fn cafes_near(&self, at: Coordinate, radius_m: u32) -> Result<Vec<PointOfInterest>> {
        self.rt.block_on(self.overpass.cafes_near(at, radius_m))
    }

    /// Place search (blocking).
    pub fn search(&self, query: &str) -> Result<Vec<Place>> {
        self.rt.block_on(self.nominatim.search(query))
    }

    /// First place matching `query`, or `NoResultsFound`.
    pub fn geocode(&self, query: &str) -> Result<Place> {
        self.search(query)?
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::Core(cafemap_core::Error::NoResultsFound(query.to_string())))
    }

    /// Route between two points (blocking).
    pub fn route(&self, origin: Coordinate, destination: Coordinate, mode: TravelMode) -> Result<Route> {
        self.rt.block_on(self.osrm.route(origin, destination, mode))
    }
}

/// Blocking wrapper around [`Driver`].
pub struct DriverBlocking {
    rt: Runtime,
    inner: Driver,
}

impl DriverBlocking {
    pub fn new(inner: Driver) -> Result<Self> {
        Ok(Self {
            rt: runtime()?,
            inner,
        })
    }

    /// Start the app and run until the startup flow has settled.
    pub fn start(&mut self) {
        self.inner.start();
        self.settle();
    }

    /// Feed one event and run until everything it caused has completed.
    pub fn dispatch(&mut self, event: Event) {
        self.inner.dispatch(event);
        self.settle();
    }

    /// One watch tick, settled. Returns `false` when not tracking.
    pub fn poll_watch(&mut self) -> bool {
        let polled = self.inner.poll_watch();
        self.settle();
        polled
    }

    pub fn settle(&mut self) {
        self.rt.block_on(self.inner.settle());
    }

    pub fn app(&self) -> &App {
        self.inner.app()
    }

    pub fn view(&self) -> ViewModel {
        self.inner.view()
    }

    pub fn take_alerts(&mut self) -> Vec<String> {
        self.inner.take_alerts()
    }

    pub fn driver(&self) -> &Driver {
        &self.inner
    }
}
