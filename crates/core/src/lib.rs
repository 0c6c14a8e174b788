//! # cafemap core
//!
//! State machine behind the cafemap café finder.
//!
//! This crate provides:
//! - `App`: location, discovery, filters, route session and panels, driven by
//!   [`Event`]s and emitting [`Effect`]s for the host to run
//! - `PoiCache`: coordinate-keyed café cache over a pluggable [`BlobStore`]
//! - `FilterState`: attribute filters applied to cached collections
//! - `view::render`: declarative projection for map and list widgets
//!
//! No I/O happens here. Network clients and the async driver live in
//! `cafemap-services`; browser bindings live in `cafemap-wasm`.

pub mod app;
pub mod cache;
pub mod config;
pub mod error;
pub mod filter;
pub mod geo;
pub mod location;
pub mod panels;
pub mod poi;
pub mod route;
pub mod token;
pub mod view;

pub use app::{App, Effect, Event, ListStatus};
pub use cache::{BlobStore, MemoryStore, PoiCache};
pub use config::AppConfig;
pub use error::{Error, Result};
pub use filter::{Filter, FilterState};
pub use geo::{Coordinate, Place, DEFAULT_CENTER};
pub use location::{FixOptions, FixPurpose, LocationManager};
pub use poi::{Amenity, PoiId, PointOfInterest};
pub use route::{Instruction, Route, RouteRequest, TravelMode};
pub use token::Token;
pub use view::{render, ViewModel};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::app::{App, Effect, Event};
    pub use crate::config::AppConfig;
    pub use crate::error::{Error, Result};
    pub use crate::filter::Filter;
    pub use crate::geo::Coordinate;
    pub use crate::poi::PointOfInterest;
    pub use crate::route::TravelMode;
}
