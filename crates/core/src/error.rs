//! Error types for cafemap

use thiserror::Error;

/// Main error type for cafemap operations.
///
/// Variants mirror what the user can be told: geolocation problems, service
/// failures, empty lookups and unreachable routes.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Location access denied")]
    GeolocationDenied,

    #[error("Location request timed out")]
    GeolocationTimeout,

    #[error("Position unavailable")]
    GeolocationUnavailable,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("No results found for \"{0}\"")]
    NoResultsFound(String),

    #[error("Route unreachable: {0}")]
    RouteUnreachable(String),

    #[error("Please enter a location.")]
    EmptyQuery,

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Cache store error: {0}")]
    Store(String),
}

/// Result type alias for cafemap operations
pub type Result<T> = std::result::Result<T, Error>;
