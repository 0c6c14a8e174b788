//! Error types for the service clients.

use thiserror::Error;

/// Errors produced while talking to Overpass, Nominatim or OSRM.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} returned HTTP {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("unexpected {service} response: {reason}")]
    Malformed {
        service: &'static str,
        reason: String,
    },

    #[error("no route ({code}): {message}")]
    Routing { code: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("core error: {0}")]
    Core(#[from] cafemap_core::Error),
}

impl From<ServiceError> for cafemap_core::Error {
    fn from(e: ServiceError) -> Self {
        use cafemap_core::Error;
        match e {
            ServiceError::Http(e) => Error::Network(e.to_string()),
            e @ ServiceError::Status { .. } => Error::Network(e.to_string()),
            e @ ServiceError::Malformed { .. } => Error::MalformedResponse(e.to_string()),
            ServiceError::Routing { code, message } if message.is_empty() => {
                Error::RouteUnreachable(code)
            }
            ServiceError::Routing { code, message } => {
                Error::RouteUnreachable(format!("{code}: {message}"))
            }
            ServiceError::Io(e) => Error::Store(e.to_string()),
            ServiceError::Core(e) => e,
        }
    }
}

/// Result alias for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_into_core_taxonomy() {
        let e: cafemap_core::Error = ServiceError::Routing {
            code: "NoRoute".into(),
            message: "Impossible route between points".into(),
        }
        .into();
        assert_eq!(
            e,
            cafemap_core::Error::RouteUnreachable(
                "NoRoute: Impossible route between points".into()
            )
        );

        let e: cafemap_core::Error = ServiceError::Status {
            service: "overpass",
            status: 429,
            body: "rate limited".into(),
        }
        .into();
        assert!(matches!(e, cafemap_core::Error::Network(m) if m.contains("429")));

        let e: cafemap_core::Error = ServiceError::Malformed {
            service: "nominatim",
            reason: "lat is not a number".into(),
        }
        .into();
        assert!(matches!(e, cafemap_core::Error::MalformedResponse(_)));
    }
}
