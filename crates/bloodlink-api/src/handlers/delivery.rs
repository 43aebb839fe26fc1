//! Delivery status, gateway callback and donor response handlers.

use axum::Json;
use axum::extract::{Path, State};

use bloodlink_core::types::AlertId;
use bloodlink_engine::dispatch::DeliveryReport;
use bloodlink_entity::delivery::{AlertDelivery, DeliverySummary};
use bloodlink_entity::response::DonorResponse;

use crate::dto::request::{DeliveryCallbackRequest, DonorResponseRequest};
use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::extractors::{CallerHospital, parse_uuid};
use crate::state::AppState;

/// GET /api/alerts/{id}/deliveries
pub async fn delivery_status(
    State(state): State<AppState>,
    caller: CallerHospital,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<DeliveryReport>>, ApiError> {
    let alert_id = AlertId::from_uuid(parse_uuid(&id)?);
    let report = state.dispatcher.delivery_status(&caller, alert_id).await?;
    Ok(Json(ApiResponse::ok(report)))
}

/// GET /api/alerts/{id}/summary
pub async fn delivery_summary(
    State(state): State<AppState>,
    caller: CallerHospital,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<DeliverySummary>>, ApiError> {
    let alert_id = AlertId::from_uuid(parse_uuid(&id)?);
    let summary = state.dispatcher.delivery_summary(&caller, alert_id).await?;
    Ok(Json(ApiResponse::ok(summary)))
}

/// POST /api/deliveries/callback
///
/// Called by the notification gateway, not by hospitals.
pub async fn delivery_callback(
    State(state): State<AppState>,
    Json(req): Json<DeliveryCallbackRequest>,
) -> Result<Json<ApiResponse<AlertDelivery>>, ApiError> {
    let (alert_id, donor_id, channel) = req.key()?;
    let delivery = state
        .dispatcher
        .on_delivery_result(alert_id, donor_id, channel, req.outcome)
        .await?;
    Ok(Json(ApiResponse::ok(delivery)))
}

/// POST /api/alerts/{id}/responses
///
/// Called on behalf of the donor, not by hospitals.
pub async fn record_response(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<DonorResponseRequest>,
) -> Result<Json<ApiResponse<DonorResponse>>, ApiError> {
    let alert_id = AlertId::from_uuid(parse_uuid(&id)?);
    let (donor_id, response) = req.parts()?;
    let recorded = state
        .dispatcher
        .record_response(alert_id, donor_id, response)
        .await?;
    Ok(Json(ApiResponse::ok(recorded)))
}
