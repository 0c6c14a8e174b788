//! Provider traits the [`crate::Driver`] runs effects against.
//!
//! Implementations report failures in the core error taxonomy so results can
//! be fed straight back into the state machine.

use async_trait::async_trait;
use cafemap_core::{Coordinate, FixOptions, Place, PointOfInterest, Result, Route, TravelMode};

use crate::nominatim::NominatimClient;
use crate::osrm::OsrmClient;
use crate::overpass::OverpassClient;

/// Café lookup around a position.
#[async_trait]
pub trait PoiSource: Send + Sync {
    async fn cafes_near(&self, at: Coordinate, radius_m: u32) -> Result<Vec<PointOfInterest>>;
}

/// Free-text place search.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<Place>>;
}

/// Path computation between two points.
#[async_trait]
pub trait Router: Send + Sync {
    async fn route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        mode: TravelMode,
    ) -> Result<Route>;
}

/// Device position source.
#[async_trait]
pub trait Geolocator: Send + Sync {
    async fn fix(&self, options: FixOptions) -> Result<Coordinate>;
}

#[async_trait]
impl PoiSource for OverpassClient {
    async fn cafes_near(&self, at: Coordinate, radius_m: u32) -> Result<Vec<PointOfInterest>> {
        Ok(OverpassClient::cafes_near(self, at, radius_m).await?)
    }
}

#[async_trait]
impl Geocoder for NominatimClient {
    async fn search(&self, query: &str) -> Result<Vec<Place>> {
        Ok(NominatimClient::search(self, query).await?)
    }
}

#[async_trait]
impl Router for OsrmClient {
    async fn route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        mode: TravelMode,
    ) -> Result<Route> {
        Ok(OsrmClient::route(self, origin, destination, mode).await?)
    }
}

/// Answers every fix request with the same result.
///
/// Headless hosts have no device; they either know where they are or fail
/// over to the fallback centre.
#[derive(Debug, Clone)]
pub struct FixedGeolocator {
    fix: Result<Coordinate>,
}

impl FixedGeolocator {
    pub fn at(at: Coordinate) -> Self {
        Self { fix: Ok(at) }
    }

    pub fn unavailable() -> Self {
        Self {
            fix: Err(cafemap_core::Error::GeolocationUnavailable),
        }
    }
}

#[async_trait]
impl Geolocator for FixedGeolocator {
    async fn fix(&self, _options: FixOptions) -> Result<Coordinate> {
        self.fix.clone()
    }
}
