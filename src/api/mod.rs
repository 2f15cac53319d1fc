pub(crate) mod crawl;
pub(crate) mod health;
pub(crate) mod metrics;

use axum::Router;
use axum::routing::{get, post};

use crate::app::AppState;

pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "diario-ingest" }))
        .route("/health/ready", get(health::ready))
        .route("/health/live", get(health::live))
        .route("/metrics", get(metrics::exporter))
        .route("/crawl", post(crawl::trigger))
        .with_state(state)
}
