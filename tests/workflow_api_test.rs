use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;
use workflow_backend::store::memory::MemoryWorkflowStore;
use workflow_backend::{app_router, AppState, StateSettings};

fn app() -> Router {
    let store = Arc::new(MemoryWorkflowStore::new());
    app_router(AppState::with_settings(store, StateSettings::default()))
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<JsonValue>,
) -> (StatusCode, JsonValue) {
    let request = match body {
        Some(body) => Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .expect("request"),
    };
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    let json = if bytes.is_empty() {
        JsonValue::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, json)
}

async fn seed_default_threshold(app: &Router) {
    let (status, _) = send(
        app,
        "POST",
        "/api/thresholds",
        Some(json!({
            "min_screening_score": 50.0,
            "min_interview_score": 60.0,
            "auto_shortlist_threshold": 70.0,
            "auto_reject_threshold": 40.0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

async fn seed_requisition(app: &Router) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/requisitions",
        Some(json!({
            "title": "Backend Engineer",
            "required_skills": ["rust", "sql"],
            "min_experience_years": 2.0,
            "max_experience_years": 6.0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().expect("requisition id").to_string()
}

async fn register_candidate(app: &Router, requisition_id: &str, skills: &str, years: f64) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/workflow/candidates",
        Some(json!({
            "name": "Asel Karimova",
            "email": format!("{}@example.com", uuid::Uuid::new_v4()),
            "skills": skills,
            "experience_years": years,
            "requisition_id": requisition_id
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["workflow_stage"], "new_application");
    body["id"].as_str().expect("candidate id").to_string()
}

#[tokio::test]
async fn health_endpoint_responds() {
    let app = app();
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn strong_candidate_is_auto_shortlisted() {
    let app = app();
    seed_default_threshold(&app).await;
    let requisition_id = seed_requisition(&app).await;
    let id = register_candidate(&app, &requisition_id, "rust, sql", 4.0).await;

    let (status, body) =
        send(&app, "POST", &format!("/api/workflow/evaluate/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"]["result"], "applied");
    assert_eq!(body["screening"]["overall_percentage"], 100.0);
    assert_eq!(body["outcome"]["entry"]["is_automated"], true);

    let (status, body) =
        send(&app, "GET", &format!("/api/workflow/candidates/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["workflow_stage"], "shortlisted");
    assert_eq!(body["status"], "shortlisted");
    assert_eq!(body["screening_score"], 100.0);
    // new_application -> ai_screening -> shortlisted
    assert_eq!(body["history"].as_array().expect("history").len(), 2);
}

#[tokio::test]
async fn weak_candidate_is_auto_rejected() {
    let app = app();
    seed_default_threshold(&app).await;
    let requisition_id = seed_requisition(&app).await;
    let id = register_candidate(&app, &requisition_id, "cobol", 15.0).await;

    let (status, body) =
        send(&app, "POST", &format!("/api/workflow/evaluate/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"]["result"], "applied");

    let (_, body) = send(&app, "GET", &format!("/api/workflow/candidates/{}", id), None).await;
    assert_eq!(body["workflow_stage"], "rejected");
}

#[tokio::test]
async fn mid_band_candidate_waits_for_hr_review() {
    let app = app();
    seed_default_threshold(&app).await;
    let requisition_id = seed_requisition(&app).await;
    // One of two skills matched, experience in range: 0.7*50 + 0.3*100 = 65.
    let id = register_candidate(&app, &requisition_id, "rust", 4.0).await;

    let (status, body) =
        send(&app, "POST", &format!("/api/workflow/evaluate/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"]["result"], "queued");
    let action_id = body["outcome"]["action"]["id"].as_str().expect("action id").to_string();

    // The stage did not move.
    let (_, detail) =
        send(&app, "GET", &format!("/api/workflow/candidates/{}", id), None).await;
    assert_eq!(detail["workflow_stage"], "ai_screening");

    // Exactly one open action, visible in the queue and on the status page.
    let (_, queue) = send(&app, "GET", "/api/workflow/pending-actions", None).await;
    assert_eq!(queue.as_array().expect("queue").len(), 1);
    let (_, counts) = send(&app, "GET", "/api/workflow/status", None).await;
    assert_eq!(counts["open_pending_actions"], 1);

    // Re-evaluating refreshes the same action instead of adding one.
    send(&app, "POST", &format!("/api/workflow/evaluate/{}", id), None).await;
    let (_, queue) = send(&app, "GET", "/api/workflow/pending-actions", None).await;
    assert_eq!(queue.as_array().expect("queue").len(), 1);

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/workflow/pending-actions/{}/resolve", action_id),
        Some(json!({"resolution": "shortlist", "resolved_by": "hr@corp"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Second resolve of the same action fails loudly.
    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/workflow/pending-actions/{}/resolve", action_id),
        Some(json!({"resolution": "shortlist"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn resolving_unknown_action_is_not_found() {
    let app = app();
    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/workflow/pending-actions/{}/resolve", uuid::Uuid::new_v4()),
        Some(json!({"resolution": "approved"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn illegal_and_idempotent_advances() {
    let app = app();
    seed_default_threshold(&app).await;
    let requisition_id = seed_requisition(&app).await;
    let id = register_candidate(&app, &requisition_id, "rust", 4.0).await;

    // Skipping stages is a conflict.
    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/workflow/candidates/{}/advance", id),
        Some(json!({"target_step": "selected", "actor": "hr@corp"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());

    // Re-requesting the current stage succeeds without history noise.
    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/workflow/candidates/{}/advance", id),
        Some(json!({"target_step": "new_application", "actor": "hr@corp"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], "already_in_stage");

    let (_, detail) =
        send(&app, "GET", &format!("/api/workflow/candidates/{}", id), None).await;
    assert_eq!(detail["history"].as_array().expect("history").len(), 0);
}

#[tokio::test]
async fn pause_suppresses_automation_until_resume() {
    let app = app();
    seed_default_threshold(&app).await;
    let requisition_id = seed_requisition(&app).await;
    let id = register_candidate(&app, &requisition_id, "rust, sql", 4.0).await;

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/workflow/candidates/{}/pause", id),
        Some(json!({"reason": "position on hold", "actor": "hr@corp"})),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) =
        send(&app, "POST", &format!("/api/workflow/evaluate/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"]["result"], "suppressed");

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/workflow/candidates/{}/resume", id),
        Some(json!({"actor": "hr@corp"})),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) =
        send(&app, "POST", &format!("/api/workflow/evaluate/{}", id), None).await;
    assert_eq!(body["outcome"]["result"], "applied");
}

#[tokio::test]
async fn threshold_validation_rejects_overlapping_bands() {
    let app = app();
    let (status, body) = send(
        &app,
        "POST",
        "/api/thresholds",
        Some(json!({
            "min_screening_score": 50.0,
            "min_interview_score": 60.0,
            "auto_shortlist_threshold": 40.0,
            "auto_reject_threshold": 70.0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn evaluate_without_threshold_row_is_a_config_error() {
    let app = app();
    let requisition_id = seed_requisition(&app).await;
    let id = register_candidate(&app, &requisition_id, "rust", 4.0).await;

    let (status, body) =
        send(&app, "POST", &format!("/api/workflow/evaluate/{}", id), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn registering_against_unknown_requisition_fails() {
    let app = app();
    let (status, _) = send(
        &app,
        "POST",
        "/api/workflow/candidates",
        Some(json!({
            "name": "Asel Karimova",
            "email": "asel@example.com",
            "skills": "rust",
            "experience_years": 3.0,
            "requisition_id": uuid::Uuid::new_v4()
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_email_conflicts() {
    let app = app();
    let payload = json!({
        "name": "Asel Karimova",
        "email": "asel@example.com",
        "skills": "rust",
        "experience_years": 3.0
    });
    let (status, _) = send(&app, "POST", "/api/workflow/candidates", Some(payload.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(&app, "POST", "/api/workflow/candidates", Some(payload)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}
