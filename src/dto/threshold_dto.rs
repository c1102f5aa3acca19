use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::threshold::SelectionThreshold;
use crate::store::NewThreshold;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpsertThresholdPayload {
    /// `None` updates the default policy row.
    pub requisition_id: Option<Uuid>,
    #[validate(range(min = 0.0, max = 100.0))]
    pub min_screening_score: f64,
    #[validate(range(min = 0.0, max = 100.0))]
    pub min_interview_score: f64,
    #[validate(range(min = 0.0, max = 100.0))]
    pub auto_shortlist_threshold: f64,
    #[validate(range(min = 0.0, max = 100.0))]
    pub auto_reject_threshold: f64,
}

impl From<UpsertThresholdPayload> for NewThreshold {
    fn from(value: UpsertThresholdPayload) -> Self {
        Self {
            requisition_id: value.requisition_id,
            min_screening_score: value.min_screening_score,
            min_interview_score: value.min_interview_score,
            auto_shortlist_threshold: value.auto_shortlist_threshold,
            auto_reject_threshold: value.auto_reject_threshold,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdResponse {
    pub id: Uuid,
    pub requisition_id: Option<Uuid>,
    pub min_screening_score: f64,
    pub min_interview_score: f64,
    pub auto_shortlist_threshold: f64,
    pub auto_reject_threshold: f64,
    pub updated_at: DateTime<Utc>,
}

impl From<SelectionThreshold> for ThresholdResponse {
    fn from(value: SelectionThreshold) -> Self {
        Self {
            id: value.id,
            requisition_id: value.requisition_id,
            min_screening_score: value.min_screening_score,
            min_interview_score: value.min_interview_score,
            auto_shortlist_threshold: value.auto_shortlist_threshold,
            auto_reject_threshold: value.auto_reject_threshold,
            updated_at: value.updated_at,
        }
    }
}
