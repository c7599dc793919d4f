//! Health Check Endpoint
//!
//! `GET /health` reports overall status plus a principal store ping.

use std::sync::Arc;
use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::store::PrincipalStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthStatus {
    Up,
    Down,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub duration_ms: u64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub checks: Vec<HealthCheck>,
}

#[derive(Clone)]
pub struct HealthState {
    pub store: Arc<dyn PrincipalStore>,
}

async fn check_store(store: &dyn PrincipalStore) -> HealthCheck {
    let start = Instant::now();
    let (status, message) = match store.ping().await {
        Ok(()) => (HealthStatus::Up, None),
        Err(e) => (HealthStatus::Down, Some(format!("Principal store unreachable: {}", e))),
    };
    HealthCheck {
        name: "principal-store".to_string(),
        status,
        message,
        duration_ms: start.elapsed().as_millis() as u64,
    }
}

/// Service health
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "A dependency is down", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<HealthState>) -> impl IntoResponse {
    let checks = vec![check_store(state.store.as_ref()).await];
    let status = if checks.iter().all(|c| c.status == HealthStatus::Up) {
        HealthStatus::Up
    } else {
        HealthStatus::Down
    };

    let code = match status {
        HealthStatus::Up => StatusCode::OK,
        HealthStatus::Down => StatusCode::SERVICE_UNAVAILABLE,
    };

    (
        code,
        Json(HealthResponse {
            status,
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            checks,
        }),
    )
}

pub fn health_router(state: HealthState) -> OpenApiRouter {
    OpenApiRouter::new().routes(routes!(health)).with_state(state)
}
