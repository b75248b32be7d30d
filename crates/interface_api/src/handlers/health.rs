//! Health check handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use tracing::warn;

use core_kernel::{AdapterHealth, HealthCheckResult};

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub version: String,
    pub checks: Vec<HealthCheckResult>,
}

/// Liveness endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness endpoint
///
/// An unhealthy store fails readiness. An unhealthy hosted service (OTP or
/// gateway) only degrades it, since sign-in and checkout fail on their own.
pub async fn readiness_check(
    State(state): State<AppState>,
) -> (StatusCode, Json<ReadinessResponse>) {
    let mut checks = Vec::with_capacity(state.stores.len() + 2);
    for store in state.stores.iter() {
        checks.push(store.health_check().await);
    }
    let stores_down = checks.iter().any(|c| c.status == AdapterHealth::Unhealthy);

    let hosted = [
        state.otp.health_check().await,
        state.gateway.health_check().await,
    ];
    let hosted_down = hosted.iter().any(|c| c.status != AdapterHealth::Healthy);
    checks.extend(hosted);

    for check in checks.iter().filter(|c| c.status != AdapterHealth::Healthy) {
        warn!(
            adapter = %check.adapter_id,
            status = ?check.status,
            message = check.message.as_deref().unwrap_or(""),
            "Health check failed"
        );
    }

    let (code, status) = if stores_down {
        (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
    } else if hosted_down {
        (StatusCode::OK, "degraded")
    } else {
        (StatusCode::OK, "ready")
    };

    (
        code,
        Json(ReadinessResponse {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            checks,
        }),
    )
}
