use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::workflow_dto::{
        CancelInterviewPayload, InterviewScorePayload, PendingListQuery, ResolveActionPayload,
        ScheduleBatchPayload,
    },
    error::Result,
    AppState,
};

#[axum::debug_handler]
pub async fn workflow_status(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let counts = state.store.workflow_counts().await?;
    Ok(Json(counts))
}

#[axum::debug_handler]
pub async fn list_pending_actions(
    State(state): State<AppState>,
    Query(query): Query<PendingListQuery>,
) -> Result<impl IntoResponse> {
    let actions = state
        .pending_service
        .list(query.limit.unwrap_or(50), query.offset.unwrap_or(0))
        .await?;
    Ok(Json(actions))
}

#[utoipa::path(
    post,
    path = "/api/workflow/pending-actions/{id}/resolve",
    params(("id" = Uuid, Path, description = "Pending action ID")),
    request_body = ResolveActionPayload,
    responses(
        (status = 200, description = "Action resolved and recorded in candidate history"),
        (status = 404, description = "Action unknown or already resolved")
    )
)]
#[axum::debug_handler]
pub async fn resolve_pending_action(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ResolveActionPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let actor = payload.actor();
    let action = state
        .pending_service
        .resolve(id, &payload.resolution, payload.notes, actor)
        .await?;
    Ok(Json(action))
}

#[utoipa::path(
    post,
    path = "/api/workflow/interviews/{id}/score",
    params(("id" = Uuid, Path, description = "Candidate ID")),
    request_body = InterviewScorePayload,
    responses(
        (status = 200, description = "Score recorded; candidate moved per threshold policy"),
        (status = 400, description = "Score out of range"),
        (status = 409, description = "Candidate is not at an interview stage")
    )
)]
#[axum::debug_handler]
pub async fn record_interview_score(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<InterviewScorePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let actor = payload.actor();
    let outcome = state
        .transition_service
        .record_interview_score(id, payload.score, payload.notes, actor)
        .await?;
    Ok(Json(outcome))
}

#[utoipa::path(
    post,
    path = "/api/workflow/interviews/schedule",
    request_body = ScheduleBatchPayload,
    responses(
        (status = 200, description = "Per-candidate scheduling outcomes"),
        (status = 400, description = "Invalid window or duration")
    )
)]
#[axum::debug_handler]
pub async fn schedule_interviews(
    State(state): State<AppState>,
    Json(payload): Json<ScheduleBatchPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let actor = payload.actor();
    let results = state
        .scheduler_service
        .schedule_batch(
            payload.requisition_id,
            payload.interviewer_id,
            &payload.candidate_ids,
            payload.start,
            payload.duration_minutes,
            actor,
        )
        .await?;
    Ok(Json(results))
}

#[axum::debug_handler]
pub async fn cancel_interview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CancelInterviewPayload>,
) -> Result<impl IntoResponse> {
    let actor = payload.actor();
    let outcome = state
        .scheduler_service
        .cancel_interview(id, actor, payload.reason)
        .await?;
    Ok(Json(outcome))
}
