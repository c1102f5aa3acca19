use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Score-range configuration. One requisition-less default row must
/// exist; per-requisition rows override it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionThreshold {
    pub id: Uuid,
    pub requisition_id: Option<Uuid>,
    pub min_screening_score: f64,
    pub min_interview_score: f64,
    pub auto_shortlist_threshold: f64,
    pub auto_reject_threshold: f64,
    pub updated_at: DateTime<Utc>,
}

/// Automatic outcome of classifying a screening score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreeningOutcome {
    AutoShortlist,
    AutoReject,
    NeedsReview,
}
