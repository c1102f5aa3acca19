use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::requisition_dto::{CreateRequisitionPayload, RequisitionResponse},
    error::{Error, Result},
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/requisitions",
    request_body = CreateRequisitionPayload,
    responses(
        (status = 201, description = "Requisition created"),
        (status = 400, description = "Invalid payload")
    )
)]
#[axum::debug_handler]
pub async fn create_requisition(
    State(state): State<AppState>,
    Json(payload): Json<CreateRequisitionPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    if payload.min_experience_years > payload.max_experience_years {
        return Err(Error::BadRequest(
            "min_experience_years cannot exceed max_experience_years".to_string(),
        ));
    }
    let requisition = state.store.create_requisition(payload.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(RequisitionResponse::from(requisition)),
    ))
}

#[axum::debug_handler]
pub async fn list_requisitions(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let rows: Vec<RequisitionResponse> = state
        .store
        .list_requisitions()
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(rows))
}

#[axum::debug_handler]
pub async fn get_requisition(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let requisition = state
        .store
        .get_requisition(id)
        .await?
        .ok_or_else(|| Error::NotFound("Requisition not found".to_string()))?;
    Ok(Json(RequisitionResponse::from(requisition)))
}
