use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::candidate::{Candidate, NewCandidate};
use crate::models::workflow::{PendingAction, WorkflowHistoryEntry};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterCandidatePayload {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    pub phone: Option<String>,
    /// Free-text skills, comma separated or prose.
    #[validate(length(min = 1))]
    pub skills: String,
    #[validate(range(min = 0.0, max = 60.0))]
    pub experience_years: f64,
    pub resume_text: Option<String>,
    pub requisition_id: Option<Uuid>,
}

impl From<RegisterCandidatePayload> for NewCandidate {
    fn from(value: RegisterCandidatePayload) -> Self {
        Self {
            name: value.name,
            email: value.email,
            phone: value.phone,
            skills: value.skills,
            experience_years: value.experience_years,
            resume_text: value.resume_text,
            requisition_id: value.requisition_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub skills: String,
    pub experience_years: f64,
    pub requisition_id: Option<Uuid>,
    pub workflow_stage: String,
    pub status: String,
    pub screening_score: Option<f64>,
    pub interview_score: Option<f64>,
    pub paused: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Candidate> for CandidateResponse {
    fn from(value: Candidate) -> Self {
        Self {
            id: value.id,
            name: value.name,
            email: value.email,
            phone: value.phone,
            skills: value.skills,
            experience_years: value.experience_years,
            requisition_id: value.requisition_id,
            workflow_stage: value.workflow_stage.as_str().to_string(),
            status: value.status,
            screening_score: value.screening_score,
            interview_score: value.interview_score,
            paused: value.paused,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateListResponse {
    pub items: Vec<CandidateResponse>,
    pub total: usize,
}

/// Candidate plus its full audit trail and whatever HR still owes it.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateDetailResponse {
    #[serde(flatten)]
    pub candidate: CandidateResponse,
    pub screening_result: Option<serde_json::Value>,
    pub history: Vec<WorkflowHistoryEntry>,
    pub open_action: Option<PendingAction>,
}
