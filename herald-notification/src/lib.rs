pub mod config;
pub mod events;
pub mod models;
pub mod routes;
pub mod schema;
pub mod services;
pub mod store;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::services::NotificationResolver;
use crate::store::NotificationStore;

pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn NotificationStore>,
    pub resolver: NotificationResolver,
    pub metrics_handle: PrometheusHandle,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn NotificationStore>, metrics_handle: PrometheusHandle) -> Self {
        let resolver = NotificationResolver::new(store.clone());
        Self {
            config,
            store,
            resolver,
            metrics_handle,
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(routes::health::metrics))
        .route(
            "/notifications",
            get(routes::notifications::list_notifications).post(routes::notifications::create_notification),
        )
        .route("/notifications/next", get(routes::notifications::next_notification))
        .route("/notifications/pending-count", get(routes::notifications::pending_count))
        .route("/notifications/:id/viewed", post(routes::notifications::mark_viewed))
        .route("/notifications/:id/status", get(routes::notifications::viewed_status))
        .route_layer(axum::middleware::from_fn(herald_shared::middleware::metrics_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
