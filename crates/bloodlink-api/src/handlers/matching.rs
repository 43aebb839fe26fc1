//! Donor matching handlers.

use axum::Json;
use axum::extract::{Path, State};

use bloodlink_core::types::RecipientId;
use bloodlink_entity::matching::Match;

use crate::dto::request::{FindMatchesRequest, validated};
use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::extractors::{CallerHospital, parse_uuid};
use crate::state::AppState;

/// POST /api/recipients/{id}/matches
pub async fn find_matches(
    State(state): State<AppState>,
    caller: CallerHospital,
    Path(id): Path<String>,
    Json(req): Json<FindMatchesRequest>,
) -> Result<Json<ApiResponse<Vec<Match>>>, ApiError> {
    let req = validated(req)?;
    let recipient_id = RecipientId::from_uuid(parse_uuid(&id)?);

    let matches = state
        .match_service
        .find_matches(&caller, recipient_id, req.max_distance_km)
        .await?;
    Ok(Json(ApiResponse::ok(matches)))
}

/// GET /api/recipients/{id}/matches
pub async fn recorded_matches(
    State(state): State<AppState>,
    caller: CallerHospital,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Vec<Match>>>, ApiError> {
    let recipient_id = RecipientId::from_uuid(parse_uuid(&id)?);
    let matches = state
        .match_service
        .recorded_matches(&caller, recipient_id)
        .await?;
    Ok(Json(ApiResponse::ok(matches)))
}
