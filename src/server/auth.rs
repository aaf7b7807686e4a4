//! Request gate checking a named header against an injected validator.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use http::{HeaderMap, HeaderName, StatusCode};
use tracing::debug;

use crate::observability::metrics::get_metrics;
use crate::server::error::proxy_error;
use crate::utils::constants::{ERR_AUTH_OTHER, ERR_HEADER_NOT_PROVIDED, ERR_VALIDATION_FAILED};

/// Decides whether a header value is acceptable.
#[async_trait]
pub trait HeaderValidator: Send + Sync {
    async fn validate(&self, value: &str) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    HeaderNotProvided,
    ValidationFailed,
    /// Header present but not valid UTF-8 text.
    Other,
}

impl AuthRejection {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::HeaderNotProvided => ERR_HEADER_NOT_PROVIDED,
            Self::ValidationFailed => ERR_VALIDATION_FAILED,
            Self::Other => ERR_AUTH_OTHER,
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            Self::HeaderNotProvided => "header_not_provided",
            Self::ValidationFailed => "validation_failed",
            Self::Other => "other",
        }
    }
}

pub type RejectHandler = Arc<dyn Fn(AuthRejection) -> Response + Send + Sync>;

/// 401 with a distinct error code per rejection.
pub fn default_reject(rejection: AuthRejection) -> Response {
    let message = match rejection {
        AuthRejection::HeaderNotProvided => "authentication token is not set",
        AuthRejection::ValidationFailed | AuthRejection::Other => "authentication failed",
    };
    proxy_error(StatusCode::UNAUTHORIZED, rejection.error_code(), message)
}

/// Stateless header gate. Rejections are rendered by the reject handler.
#[derive(Clone)]
pub struct HeaderAuthProvider {
    header_name: HeaderName,
    validator: Arc<dyn HeaderValidator>,
    when_reject: RejectHandler,
}

impl fmt::Debug for HeaderAuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeaderAuthProvider")
            .field("header_name", &self.header_name)
            .finish_non_exhaustive()
    }
}

impl HeaderAuthProvider {
    pub fn new(header_name: HeaderName, validator: Arc<dyn HeaderValidator>) -> Self {
        Self {
            header_name,
            validator,
            when_reject: Arc::new(default_reject),
        }
    }

    pub fn with_reject_handler(mut self, when_reject: RejectHandler) -> Self {
        self.when_reject = when_reject;
        self
    }

    pub fn header_name(&self) -> &HeaderName {
        &self.header_name
    }

    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<(), AuthRejection> {
        let value = headers
            .get(&self.header_name)
            .ok_or(AuthRejection::HeaderNotProvided)?
            .to_str()
            .map_err(|_| AuthRejection::Other)?;

        if self.validator.validate(value).await {
            Ok(())
        } else {
            Err(AuthRejection::ValidationFailed)
        }
    }

    pub fn reject(&self, rejection: AuthRejection) -> Response {
        (self.when_reject)(rejection)
    }
}

/// Middleware for `axum::middleware::from_fn_with_state`.
pub async fn require_header(State(provider): State<HeaderAuthProvider>, request: Request, next: Next) -> Response {
    match provider.authenticate(request.headers()).await {
        Ok(()) => next.run(request).await,
        Err(rejection) => {
            debug!(reason = rejection.reason(), path = %request.uri().path(), "request rejected");
            if let Ok(metrics) = get_metrics().await {
                metrics.auth_rejections.with_label_values(&[rejection.reason()]).inc();
            }
            provider.reject(rejection)
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use axum::middleware::from_fn_with_state;
    use axum::routing::get;
    use axum::Router;
    use http::HeaderValue;

    use super::*;
    use crate::error::ProxyErrorBody;
    use crate::tests::common::{build_reqwest_client, spawn_axum};
    use crate::token::{PrefixValidator, TokenGenerator};

    struct Fixed(bool);

    #[async_trait]
    impl HeaderValidator for Fixed {
        async fn validate(&self, _value: &str) -> bool {
            self.0
        }
    }

    fn provider(validator: impl HeaderValidator + 'static) -> HeaderAuthProvider {
        HeaderAuthProvider::new(HeaderName::from_static("x-api-key"), Arc::new(validator))
    }

    #[tokio::test]
    async fn rejections_are_distinguished() {
        let mut headers = HeaderMap::new();
        assert_eq!(
            provider(Fixed(true)).authenticate(&headers).await,
            Err(AuthRejection::HeaderNotProvided)
        );

        headers.insert("x-api-key", HeaderValue::from_static("value"));
        assert_eq!(provider(Fixed(true)).authenticate(&headers).await, Ok(()));
        assert_eq!(
            provider(Fixed(false)).authenticate(&headers).await,
            Err(AuthRejection::ValidationFailed)
        );

        headers.insert("x-api-key", HeaderValue::from_bytes(&[0xff, 0xfe]).unwrap());
        assert_eq!(provider(Fixed(true)).authenticate(&headers).await, Err(AuthRejection::Other));
    }

    #[tokio::test]
    async fn default_reject_uses_distinct_codes() {
        for (rejection, code) in [
            (AuthRejection::HeaderNotProvided, "401-0001"),
            (AuthRejection::ValidationFailed, "401-0002"),
            (AuthRejection::Other, "401-0003"),
        ] {
            let response = default_reject(rejection);
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let body: ProxyErrorBody = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(body.error_code, code);
        }
    }

    #[tokio::test]
    async fn middleware_gates_requests() {
        let generator = TokenGenerator::new();
        let gate = provider(PrefixValidator::new(generator));
        let router = Router::new()
            .route("/guarded", get(|| async { "ok" }))
            .route_layer(from_fn_with_state(gate, require_header));
        let (handle, addr) = spawn_axum(router).await;
        let client = build_reqwest_client();
        let url = format!("http://{}/guarded", addr);

        let missing = client.get(&url).send().await.unwrap();
        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

        let wrong = client.get(&url).header("X-API-KEY", "wrongprefix.xyz").send().await.unwrap();
        assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
        let body: ProxyErrorBody = wrong.json().await.unwrap();
        assert_eq!(body.error_code, "401-0002");

        let ok = client
            .get(&url)
            .header("X-API-KEY", generator.generate())
            .send()
            .await
            .unwrap();
        assert_eq!(ok.status(), StatusCode::OK);
        assert_eq!(ok.text().await.unwrap(), "ok");

        handle.abort();
    }

    #[tokio::test]
    async fn custom_reject_handler_decides_response() {
        let gate = provider(Fixed(false)).with_reject_handler(Arc::new(|_| {
            axum::response::IntoResponse::into_response(StatusCode::FORBIDDEN)
        }));
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_static("v"));
        let rejection = gate.authenticate(&headers).await.unwrap_err();
        assert_eq!(gate.reject(rejection).status(), StatusCode::FORBIDDEN);
    }
}
