//! Shared HTTP plumbing: client construction and JSON body handling.
//!
//! Requests are not retried; a failure surfaces to the user, who retries by
//! acting again.

use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::error::{Result, ServiceError};
use crate::options::ServiceOptions;

/// Longest slice of an error body kept in messages.
const BODY_EXCERPT: usize = 500;

/// Build a client with the configured user agent and timeout.
///
/// Browsers own both on WASM, so the options are ignored there.
pub fn build_client(options: &ServiceOptions) -> Result<Client> {
    let builder = Client::builder();
    #[cfg(not(target_arch = "wasm32"))]
    let builder = builder
        .user_agent(options.user_agent.as_str())
        .timeout(options.request_timeout);
    #[cfg(target_arch = "wasm32")]
    let _ = options;
    Ok(builder.build()?)
}

/// Read a successful response body as JSON.
pub async fn read_json<T: DeserializeOwned>(
    service: &'static str,
    resp: reqwest::Response,
) -> Result<T> {
    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
        return Err(ServiceError::Status {
            service,
            status: status.as_u16(),
            body: excerpt(&body),
        });
    }
    parse_json(service, &body)
}

/// Parse a body, reporting failures as malformed responses of `service`.
pub fn parse_json<T: DeserializeOwned>(service: &'static str, body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| ServiceError::Malformed {
        service,
        reason: e.to_string(),
    })
}

pub(crate) fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT).collect()
}
