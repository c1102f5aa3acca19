use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::models::workflow::WorkflowStep;

/// Owned exclusively by the workflow store; mutated only through the
/// transition controller, never written directly by routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    /// Free-text skill list as declared by the candidate.
    pub skills: String,
    pub experience_years: f64,
    pub resume_text: Option<String>,
    pub requisition_id: Option<Uuid>,
    pub workflow_stage: WorkflowStep,
    pub status: String,
    pub screening_score: Option<f64>,
    pub interview_score: Option<f64>,
    /// Last screening breakdown, kept for later inspection.
    pub screening_result: Option<JsonValue>,
    pub paused: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Ingestion payload for a new application.
#[derive(Debug, Clone)]
pub struct NewCandidate {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub skills: String,
    pub experience_years: f64,
    pub resume_text: Option<String>,
    pub requisition_id: Option<Uuid>,
}
