use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use herald_shared::{HealthCheck, HealthResponse, HealthStatus};

use crate::AppState;

/// Liveness plus a probe of the notification store.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Response {
    let store_check = match state.store.ping() {
        Ok(()) => HealthCheck {
            name: format!("store:{}", state.store.backend()),
            status: HealthStatus::Healthy,
            message: None,
        },
        Err(e) => HealthCheck {
            name: format!("store:{}", state.store.backend()),
            status: HealthStatus::Unhealthy,
            message: Some(e.to_string()),
        },
    };

    let response = HealthResponse::healthy("herald-notification", env!("CARGO_PKG_VERSION"))
        .with_checks(vec![store_check]);

    let status = match response.status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status, Json(response)).into_response()
}

/// Returns Prometheus metrics.
pub async fn metrics(State(state): State<Arc<AppState>>) -> String {
    state.metrics_handle.render()
}
