use std::future::Future;

use axum::extract::{FromRequestParts, Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use http::header::AUTHORIZATION;
use http::request::Parts;
use http::StatusCode;
use serde::Serialize;
use tokio::time::Instant;
use tracing::info;

use crate::error::LatteError;
use crate::models::{AddressZipRequest, SearchCodeRequest};
use crate::server::error::proxy_error;
use crate::server::server::AppState;
use crate::utils::constants::{ADDRESS_ZIP_PATH, ERR_HEADER_NOT_PROVIDED, SEARCH_CODE_ROUTE, TOKEN_PATH};

/// Routes forwarded to the upstream API. Callers must pass the auth gate.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(TOKEN_PATH, post(issue_token))
        .route(ADDRESS_ZIP_PATH, post(address_zip))
        .route(SEARCH_CODE_ROUTE, get(search_code))
}

/// Upstream bearer token taken from `Authorization: Bearer <token>`.
pub struct UpstreamBearer(pub String);

impl<S: Send + Sync> FromRequestParts<S> for UpstreamBearer {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(|token| UpstreamBearer(token.to_owned()))
            .ok_or_else(|| {
                proxy_error(
                    StatusCode::UNAUTHORIZED,
                    ERR_HEADER_NOT_PROVIDED,
                    "authorization bearer token is not set",
                )
            })
    }
}

async fn issue_token(State(state): State<AppState>) -> Response {
    forward(&state, "token", state.latte.token()).await
}

async fn address_zip(
    State(state): State<AppState>,
    UpstreamBearer(token): UpstreamBearer,
    Json(request): Json<AddressZipRequest>,
) -> Response {
    forward(&state, "addresszip", state.latte.address_zip(&token, &request)).await
}

async fn search_code(
    State(state): State<AppState>,
    UpstreamBearer(token): UpstreamBearer,
    Path(code): Path<String>,
    Query(params): Query<SearchCodeRequest>,
) -> Response {
    forward(&state, "searchcode", state.latte.search(&token, &code, &params)).await
}

/// Awaits an upstream call, records it, and renders the outcome.
async fn forward<T, F>(state: &AppState, endpoint: &str, call: F) -> Response
where
    T: Serialize,
    F: Future<Output = Result<T, LatteError>>,
{
    let start = Instant::now();
    let result = call.await;
    state
        .metrics
        .observe_upstream(endpoint, result.is_ok(), start.elapsed().as_secs_f64());

    match result {
        Ok(body) => Json(body).into_response(),
        Err(e) => {
            info!(endpoint, error = %e, status = ?e.status_code(), "upstream call failed");
            e.into_response()
        }
    }
}
