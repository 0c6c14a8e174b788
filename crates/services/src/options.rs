//! Endpoints and client options.
//!
//! Public OpenStreetMap services work out of the box; any compatible server
//! can be used through [`Endpoint::Custom`].

use std::time::Duration;

// ---------------------------------------------------------------------------
// Endpoint enum
// ---------------------------------------------------------------------------

/// Well-known public servers plus custom base URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// `overpass-api.de` main instance.
    OverpassDe,
    /// Kumi Systems Overpass mirror.
    OverpassKumi,
    /// OpenStreetMap Foundation Nominatim.
    Nominatim,
    /// Project OSRM demo server.
    OsrmDemo,
    /// Any compatible server (base URL, e.g. `"http://localhost:5000"`).
    Custom(String),
}

impl Endpoint {
    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> String {
        match self {
            Self::OverpassDe => "https://overpass-api.de/api/interpreter".to_string(),
            Self::OverpassKumi => "https://overpass.kumi.systems/api/interpreter".to_string(),
            Self::Nominatim => "https://nominatim.openstreetmap.org".to_string(),
            Self::OsrmDemo => "https://router.project-osrm.org".to_string(),
            Self::Custom(base) => base.trim_end_matches('/').to_string(),
        }
    }

    /// Parse a shorthand string into an endpoint.
    ///
    /// Recognized shorthands: `"overpass"`, `"kumi"`, `"nominatim"`,
    /// `"osrm"`. Anything else is treated as a custom URL.
    pub fn from_str_or_url(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "overpass" | "overpass-de" => Self::OverpassDe,
            "kumi" | "overpass-kumi" => Self::OverpassKumi,
            "nominatim" | "osm" => Self::Nominatim,
            "osrm" | "osrm-demo" => Self::OsrmDemo,
            _ => Self::Custom(s.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Configuration shared by the service clients.
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    pub overpass: Endpoint,
    pub nominatim: Endpoint,
    pub osrm: Endpoint,
    /// Per-request timeout (default 30 s). Ignored on WASM.
    pub request_timeout: Duration,
    /// Sent with every request; Nominatim's usage policy requires one.
    pub user_agent: String,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            overpass: Endpoint::OverpassDe,
            nominatim: Endpoint::Nominatim,
            osrm: Endpoint::OsrmDemo,
            request_timeout: Duration::from_secs(30),
            user_agent: concat!("cafemap/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}
