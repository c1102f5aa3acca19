use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::candidate_dto::{
        CandidateDetailResponse, CandidateListResponse, CandidateResponse,
        RegisterCandidatePayload,
    },
    dto::workflow_dto::{AdvanceStagePayload, PausePayload},
    error::{Error, Result},
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/workflow/candidates",
    request_body = RegisterCandidatePayload,
    responses(
        (status = 201, description = "Candidate registered at the new_application stage"),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Candidate with this email already exists")
    )
)]
#[axum::debug_handler]
pub async fn register_candidate(
    State(state): State<AppState>,
    Json(payload): Json<RegisterCandidatePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    if let Some(requisition_id) = payload.requisition_id {
        if state.store.get_requisition(requisition_id).await?.is_none() {
            return Err(Error::BadRequest(format!(
                "unknown requisition {}",
                requisition_id
            )));
        }
    }
    let candidate = state.store.create_candidate(payload.into()).await?;
    Ok((StatusCode::CREATED, Json(CandidateResponse::from(candidate))))
}

#[axum::debug_handler]
pub async fn list_candidates(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let items: Vec<CandidateResponse> = state
        .store
        .list_candidates()
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    let total = items.len();
    Ok(Json(CandidateListResponse { items, total }))
}

#[utoipa::path(
    get,
    path = "/api/workflow/candidates/{id}",
    params(("id" = Uuid, Path, description = "Candidate ID")),
    responses(
        (status = 200, description = "Candidate with history and any open pending action"),
        (status = 404, description = "Candidate not found")
    )
)]
#[axum::debug_handler]
pub async fn get_candidate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let candidate = state
        .store
        .get_candidate(id)
        .await?
        .ok_or_else(|| Error::NotFound("Candidate not found".to_string()))?;
    let history = state.store.list_history(id).await?;
    let open_action = state.store.open_pending_for_candidate(id).await?;
    let screening_result = candidate.screening_result.clone();

    Ok(Json(CandidateDetailResponse {
        candidate: candidate.into(),
        screening_result,
        history,
        open_action,
    }))
}

#[utoipa::path(
    post,
    path = "/api/workflow/candidates/{id}/advance",
    params(("id" = Uuid, Path, description = "Candidate ID")),
    request_body = AdvanceStagePayload,
    responses(
        (status = 200, description = "Transition outcome"),
        (status = 404, description = "Candidate not found"),
        (status = 409, description = "Transition not allowed from the current stage")
    )
)]
#[axum::debug_handler]
pub async fn advance_candidate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AdvanceStagePayload>,
) -> Result<impl IntoResponse> {
    let actor = payload.actor();
    let outcome = state
        .transition_service
        .advance(id, payload.target_step, actor, payload.reason)
        .await?;
    Ok(Json(outcome))
}

#[axum::debug_handler]
pub async fn pause_candidate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PausePayload>,
) -> Result<impl IntoResponse> {
    let actor = payload.actor();
    state
        .transition_service
        .pause(id, actor, payload.reason)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn resume_candidate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PausePayload>,
) -> Result<impl IntoResponse> {
    let actor = payload.actor();
    state
        .transition_service
        .resume(id, actor, payload.reason)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/workflow/evaluate/{id}",
    params(("id" = Uuid, Path, description = "Candidate ID")),
    responses(
        (status = 200, description = "Screening result and the automatic decision taken"),
        (status = 400, description = "Candidate has no requisition or is past screening"),
        (status = 404, description = "Candidate not found")
    )
)]
#[axum::debug_handler]
pub async fn evaluate_candidate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let report = state.transition_service.evaluate(id).await?;
    Ok(Json(report))
}
