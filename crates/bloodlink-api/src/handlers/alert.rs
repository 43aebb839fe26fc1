//! Alert lifecycle and dispatch handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use bloodlink_core::types::AlertId;
use bloodlink_engine::DispatchResult;
use bloodlink_engine::dispatch::AudienceEstimate;
use bloodlink_entity::alert::Alert;

use crate::dto::request::{CreateAlertRequest, EstimateAudienceRequest, validated};
use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::extractors::{CallerHospital, parse_uuid};
use crate::state::AppState;

fn alert_id(raw: &str) -> Result<AlertId, ApiError> {
    Ok(AlertId::from_uuid(parse_uuid(raw)?))
}

/// POST /api/alerts
pub async fn create_alert(
    State(state): State<AppState>,
    caller: CallerHospital,
    Json(req): Json<CreateAlertRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Alert>>), ApiError> {
    let definition = validated(req)?.into_definition()?;
    let alert = state.alert_service.create_alert(&caller, definition).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(alert))))
}

/// POST /api/audience/estimate
///
/// How many donors an alert with these settings would reach.
pub async fn estimate_audience(
    State(state): State<AppState>,
    caller: CallerHospital,
    Json(req): Json<EstimateAudienceRequest>,
) -> Result<Json<ApiResponse<AudienceEstimate>>, ApiError> {
    let criteria = validated(req)?.into_criteria()?;
    let estimate = state.dispatcher.estimate_audience(&caller, &criteria).await?;
    Ok(Json(ApiResponse::ok(estimate)))
}

/// GET /api/alerts
pub async fn list_alerts(
    State(state): State<AppState>,
    caller: CallerHospital,
) -> Result<Json<ApiResponse<Vec<Alert>>>, ApiError> {
    let alerts = state.alert_service.list_alerts(&caller).await?;
    Ok(Json(ApiResponse::ok(alerts)))
}

/// GET /api/alerts/{id}
pub async fn get_alert(
    State(state): State<AppState>,
    caller: CallerHospital,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Alert>>, ApiError> {
    let alert = state.alert_service.get_alert(&caller, alert_id(&id)?).await?;
    Ok(Json(ApiResponse::ok(alert)))
}

/// POST /api/alerts/{id}/activate
pub async fn activate_alert(
    State(state): State<AppState>,
    caller: CallerHospital,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Alert>>, ApiError> {
    let alert = state.alert_service.activate(&caller, alert_id(&id)?).await?;
    Ok(Json(ApiResponse::ok(alert)))
}

/// POST /api/alerts/{id}/cancel
pub async fn cancel_alert(
    State(state): State<AppState>,
    caller: CallerHospital,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Alert>>, ApiError> {
    let alert = state.alert_service.cancel(&caller, alert_id(&id)?).await?;
    Ok(Json(ApiResponse::ok(alert)))
}

/// POST /api/alerts/{id}/dispatch
pub async fn dispatch_alert(
    State(state): State<AppState>,
    caller: CallerHospital,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<ApiResponse<DispatchResult>>), ApiError> {
    let result = state.dispatcher.dispatch(&caller, alert_id(&id)?).await?;
    Ok((StatusCode::ACCEPTED, Json(ApiResponse::ok(result))))
}
