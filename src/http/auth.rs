//! Bearer-token authentication with a loopback bypass.
//!
//! The trigger endpoint is meant to be hit by a cron-style scheduler on the
//! same host, so loopback callers are always accepted. Remote callers must
//! present the configured bearer token; with no token configured the API is
//! loopback-only.

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::Response,
};

use super::error::AppError;
use super::state::AppState;

/// Middleware guarding the `/v1` routes.
///
/// Requires `axum::serve` to run with
/// `into_make_service_with_connect_info::<SocketAddr>()` so the peer
/// address is available.
pub async fn require_api_auth(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    if addr.ip().is_loopback() {
        return Ok(next.run(request).await);
    }

    let expected = &state.config.api_token;
    if !expected.is_empty() {
        if let Some(token) = bearer_token(request.headers()) {
            if token == expected {
                return Ok(next.run(request).await);
            }
        }
    }

    Err(AppError::Unauthorized(
        "Provide a bearer token in the Authorization header or call from localhost".to_string(),
    ))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}
