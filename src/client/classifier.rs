//! Maps every HTTP outcome to either a decoded value or a [`LatteError`].
//!
//! A response is classified by status class:
//!
//! * `2xx` decodes the body as the expected type. A body that does not decode
//!   is reported as [`LatteError::Unknown`] with the decode error as cause.
//! * `4xx` / `5xx` tries the proxy error shape first, then the upstream API
//!   shape, and finally wraps the last parse failure as
//!   [`LatteError::UnknownClientError`] / [`LatteError::UnknownServerError`].
//! * anything else is [`LatteError::Unknown`] without a cause.
//!
//! Failures before a response exists go through [`relocate`] exactly once.

use std::error::Error as StdError;
use std::io;

use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{ApiCallFailedBody, LatteError, ProxyErrorBody};

/// Sends `request` and classifies the outcome.
pub async fn execute_catching<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, LatteError> {
    let response = request.send().await.map_err(relocate)?;
    let status = response.status().as_u16();
    let body = response.bytes().await.map_err(relocate)?;
    classify(status, &body)
}

/// Classifies a completed exchange.
pub fn classify<T: DeserializeOwned>(status: u16, body: &[u8]) -> Result<T, LatteError> {
    match status {
        200..=299 => serde_json::from_slice(body).map_err(|cause| LatteError::Unknown {
            cause: Some(Box::new(cause)),
            status: Some(status),
        }),
        400..=499 => Err(classify_error_body(status, body, |cause, status| {
            LatteError::UnknownClientError { cause, status }
        })),
        500..=599 => Err(classify_error_body(status, body, |cause, status| {
            LatteError::UnknownServerError { cause, status }
        })),
        _ => Err(LatteError::unexpected_status(status)),
    }
}

fn classify_error_body(
    status: u16,
    body: &[u8],
    unmatched: fn(serde_json::Error, Option<u16>) -> LatteError,
) -> LatteError {
    // Proxy shape first: it is strict, so an upstream body never matches it.
    if let Ok(proxy) = serde_json::from_slice::<ProxyErrorBody>(body) {
        return proxy.into_error(status);
    }
    match serde_json::from_slice::<ApiCallFailedBody>(body) {
        Ok(api) => api.into_error(status),
        Err(cause) => {
            debug!(status, error = %cause, "error body matched no known shape");
            unmatched(cause, Some(status))
        }
    }
}

/// Maps a transport failure, raised before any response was obtained.
pub fn relocate(err: reqwest::Error) -> LatteError {
    if err.is_timeout() || io_kind_in_chain(&err, |kind| kind == io::ErrorKind::TimedOut) {
        return LatteError::NetworkTimeout;
    }
    if err.is_connect() || io_kind_in_chain(&err, |_| true) {
        return LatteError::NoInternetConnection;
    }
    LatteError::unknown(err)
}

fn io_kind_in_chain(err: &(dyn StdError + 'static), matches: impl Fn(io::ErrorKind) -> bool) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(io_err) = e.downcast_ref::<io::Error>() {
            if matches(io_err.kind()) {
                return true;
            }
        }
        current = e.source();
    }
    false
}
