use std::time::Duration;

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use rand::RngCore as _;
use tracing::{error, info};

use crate::models::{ProxyTokenRequest, ProxyTokenResponse};
use crate::server::error::internal_error;
use crate::server::server::AppState;
use crate::utils::constants::PROXY_TOKEN_PATH;

pub fn router() -> Router<AppState> {
    Router::new().route(PROXY_TOKEN_PATH, post(issue_proxy_token))
}

/// Issues a proxy token and records it in the issued-token cache.
async fn issue_proxy_token(State(state): State<AppState>, Json(_request): Json<ProxyTokenRequest>) -> Response {
    let token = state.generator.generate();
    let mut marker = vec![0u8; 16];
    rand::thread_rng().fill_bytes(&mut marker);

    let ttl = Duration::from_secs(state.proxy_token_ttl_seconds);
    let expires_at = match state.issued.write_with_ttl(&token, marker, ttl).await {
        Ok(expires_at) => expires_at,
        Err(e) => {
            error!("failed to record issued proxy token: {:#}", e);
            return internal_error();
        }
    };

    state.metrics.proxy_tokens_issued.inc();
    info!(expires_at = %expires_at, "proxy token issued");

    Json(ProxyTokenResponse {
        proxy_token: token,
        expires_at,
    })
    .into_response()
}
