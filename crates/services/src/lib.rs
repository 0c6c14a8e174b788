//! # cafemap services
//!
//! Network side of cafemap: async clients for the Overpass (café discovery),
//! Nominatim (place search) and OSRM (routing) HTTP APIs, plus the native
//! [`Driver`] that runs a [`cafemap_core::App`] against them.
//!
//! ## Features
//!
//! - `native` (default): provider traits, cache-backed discovery, file blob
//!   store, the async driver and a blocking API via tokio `block_on`. Not
//!   available on WASM.
//!
//! Without `native` only the clients and wire models are built, which is what
//! the browser bindings use.

pub mod error;
pub mod http;
pub mod nominatim;
pub mod options;
pub mod osrm;
pub mod overpass;
pub mod overpass_models;

#[cfg(feature = "native")]
pub mod discovery;
#[cfg(feature = "native")]
pub mod driver;
#[cfg(feature = "native")]
pub mod providers;
#[cfg(feature = "native")]
pub mod store;
#[cfg(feature = "native")]
pub mod sync_api;

pub use error::{Result, ServiceError};
pub use nominatim::NominatimClient;
pub use options::{Endpoint, ServiceOptions};
pub use osrm::OsrmClient;
pub use overpass::OverpassClient;
pub use overpass_models::OverpassResponse;

#[cfg(feature = "native")]
pub use discovery::PoiDiscovery;
#[cfg(feature = "native")]
pub use driver::Driver;
#[cfg(feature = "native")]
pub use providers::{FixedGeolocator, Geocoder, Geolocator, PoiSource, Router};
#[cfg(feature = "native")]
pub use store::FileStore;

/// Blocking API re-exported as `blocking` module (native only).
#[cfg(feature = "native")]
pub mod blocking {
    pub use crate::sync_api::*;
}
