use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::app::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) struct HealthReport {
    status: &'static str,
}

pub(crate) async fn ready(State(state): State<AppState>) -> Json<HealthReport> {
    state.telemetry().record_ready_probe();
    Json(HealthReport { status: "ready" })
}

pub(crate) async fn live(State(state): State<AppState>) -> Json<HealthReport> {
    state.telemetry().record_live_probe();
    Json(HealthReport { status: "live" })
}
