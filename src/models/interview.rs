use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A bounded interval assigned to one interviewer. No two non-blocked
/// slots for the same interviewer may overlap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewSlot {
    pub id: Uuid,
    pub interviewer_id: Uuid,
    pub candidate_id: Option<Uuid>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    /// Blocked slots hold calendar busy time; they exclude scheduling but
    /// carry no candidate.
    pub blocked: bool,
    pub created_at: DateTime<Utc>,
}

impl InterviewSlot {
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start_at < end && start < self.end_at
    }
}
