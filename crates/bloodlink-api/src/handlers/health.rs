//! Health check handler.

use axum::Json;
use axum::extract::State;
use chrono::Utc;

use bloodlink_core::traits::store::RecordStore;

use crate::dto::response::{ApiResponse, HealthResponse};
use crate::state::AppState;

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    let store = state.store.health_check().await.unwrap_or(false);

    Json(ApiResponse::ok(HealthResponse {
        status: if store { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        store,
        in_flight_sends: state.dispatcher.in_flight(),
        started_at: state.started_at,
        uptime_seconds: (Utc::now() - state.started_at).num_seconds(),
    }))
}
