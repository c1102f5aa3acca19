use axum::{
    extract::State,
    response::{IntoResponse, Json},
};
use validator::Validate;

use crate::{
    dto::threshold_dto::{ThresholdResponse, UpsertThresholdPayload},
    error::Result,
    AppState,
};

#[axum::debug_handler]
pub async fn list_thresholds(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let rows: Vec<ThresholdResponse> = state
        .threshold_service
        .list()
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(rows))
}

#[utoipa::path(
    post,
    path = "/api/thresholds",
    request_body = UpsertThresholdPayload,
    responses(
        (status = 200, description = "Threshold row created or updated"),
        (status = 400, description = "Scores out of range or bands overlap")
    )
)]
#[axum::debug_handler]
pub async fn upsert_threshold(
    State(state): State<AppState>,
    Json(payload): Json<UpsertThresholdPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let row = state.threshold_service.upsert(payload.into()).await?;
    Ok(Json(ThresholdResponse::from(row)))
}
