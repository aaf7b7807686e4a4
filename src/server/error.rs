use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use tracing::warn;

use crate::error::{ApiCallFailedBody, LatteError, ProxyErrorBody};
use crate::utils::constants::{ERR_BAD_GATEWAY, ERR_GATEWAY_TIMEOUT, ERR_INTERNAL};

/// Proxy-shaped error response.
pub fn proxy_error(status: StatusCode, error_code: &str, message: &str) -> Response {
    (status, Json(ProxyErrorBody::new(error_code, message))).into_response()
}

pub fn internal_error() -> Response {
    proxy_error(StatusCode::INTERNAL_SERVER_ERROR, ERR_INTERNAL, "an unknown error occurred")
}

fn status_or_internal(status: Option<u16>) -> StatusCode {
    status
        .and_then(|s| StatusCode::from_u16(s).ok())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Relays a classified upstream failure to the proxy's caller with the
/// status code the upstream reported.
impl IntoResponse for LatteError {
    fn into_response(self) -> Response {
        match self {
            LatteError::ApiCallFailed {
                request_id,
                error_code,
                message,
                status,
            } => (
                status_or_internal(status),
                Json(ApiCallFailedBody {
                    request_id,
                    error_code,
                    message,
                }),
            )
                .into_response(),
            LatteError::ProxyError {
                error_code,
                message,
                status,
            } => (status_or_internal(status), Json(ProxyErrorBody { error_code, message })).into_response(),
            LatteError::NetworkTimeout => proxy_error(
                StatusCode::GATEWAY_TIMEOUT,
                ERR_GATEWAY_TIMEOUT,
                "the upstream API did not answer in time",
            ),
            LatteError::NoInternetConnection => proxy_error(
                StatusCode::BAD_GATEWAY,
                ERR_BAD_GATEWAY,
                "the upstream API is unreachable",
            ),
            other => {
                warn!(error = %other, status = ?other.status_code(), "unclassified upstream failure");
                proxy_error(
                    status_or_internal(other.status_code()),
                    ERR_INTERNAL,
                    "an unknown error occurred",
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use uuid::Uuid;

    use super::*;
    use crate::client::classify;

    async fn body_of(response: Response) -> Vec<u8> {
        to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()
    }

    #[tokio::test]
    async fn api_error_round_trips_through_relay() {
        let original = LatteError::ApiCallFailed {
            request_id: Uuid::new_v4(),
            error_code: "404-1001".into(),
            message: "no match".into(),
            status: Some(404),
        };
        let response = original.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let relayed = classify::<serde_json::Value>(404, &body_of(response).await).unwrap_err();
        assert!(matches!(relayed, LatteError::ApiCallFailed { status: Some(404), .. }));
        assert_eq!(relayed.error_code(), Some("404-1001"));
    }

    #[tokio::test]
    async fn proxy_error_keeps_status_and_code() {
        let response = ProxyErrorBody::new("429-0001", "slow down").into_error(429).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let relayed = classify::<serde_json::Value>(429, &body_of(response).await).unwrap_err();
        assert_eq!(relayed.error_code(), Some("429-0001"));
    }

    #[tokio::test]
    async fn transport_failures_map_to_gateway_statuses() {
        let response = LatteError::NetworkTimeout.into_response();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        let body: ProxyErrorBody = serde_json::from_slice(&body_of(response).await).unwrap();
        assert_eq!(body.error_code, "504-0001");

        let response = LatteError::NoInternetConnection.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body: ProxyErrorBody = serde_json::from_slice(&body_of(response).await).unwrap();
        assert_eq!(body.error_code, "502-0001");
    }

    #[tokio::test]
    async fn unknown_keeps_status_or_falls_back_to_500() {
        let response = LatteError::unexpected_status(302).into_response();
        assert_eq!(response.status(), StatusCode::FOUND);

        let response = LatteError::unknown("boom").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: ProxyErrorBody = serde_json::from_slice(&body_of(response).await).unwrap();
        assert_eq!(body.error_code, "500-0001");
    }
}
