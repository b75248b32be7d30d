//! Session and audit middleware for the signed-in routes

use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{info, warn};

use crate::auth::{token_from_headers, validate_token, Session};
use crate::error::ApiError;
use crate::state::AppState;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Turns the cookie or Bearer token into a `Session` extension
///
/// Only proves who the caller is. Each handler's extractor checks the role.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let claims = token_from_headers(request.headers())
        .ok_or_else(ApiError::unauthorized)
        .and_then(|token| validate_token(&token, &state.config.jwt_secret).map_err(ApiError::from));

    match claims {
        Ok(claims) => {
            request.extensions_mut().insert(Session::from(claims));
            next.run(request).await
        }
        Err(e) => {
            warn!(path = %request.uri().path(), "Session rejected: {}", e);
            e.into_response()
        }
    }
}

/// One line per signed-in request: who, what, outcome
///
/// Logs the path without its query string. Server errors log at `warn`.
pub async fn audit_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();
    let actor = request
        .extensions()
        .get::<Session>()
        .map(|s| format!("{}:{}", s.role, s.account_id));

    let started = Instant::now();
    let response = next.run(request).await;
    let elapsed_ms = started.elapsed().as_millis() as u64;
    let status = response.status().as_u16();
    let actor = actor.as_deref().unwrap_or("anonymous");

    if response.status().is_server_error() {
        warn!(%method, %path, %request_id, actor, status, elapsed_ms, "Request failed");
    } else {
        info!(%method, %path, %request_id, actor, status, elapsed_ms, "Request handled");
    }
    response
}
