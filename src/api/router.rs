use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::ask;
use super::health;
use super::middleware::{logging_middleware, metrics_middleware};
use super::state::AppState;
use crate::infrastructure::observability::{create_metrics_router, PrometheusMetrics};

/// Options for the outer HTTP surface
#[derive(Clone, Default)]
pub struct RouterOptions {
    /// Allow any origin, method and header
    pub cors_permissive: bool,
    pub metrics: Option<(PrometheusMetrics, String)>,
}

/// Create the full router with application state
pub fn create_router(state: AppState, options: RouterOptions) -> Router {
    let mut router = Router::new()
        .route("/ask", post(ask::ask))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        .with_state(state);

    if let Some((metrics, path)) = options.metrics {
        router = router.merge(create_metrics_router(metrics, &path));
    }

    router = router
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http());

    if options.cors_permissive {
        router = router.layer(CorsLayer::permissive());
    }

    router
}
