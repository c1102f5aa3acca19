pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::candidate::{Candidate, NewCandidate};
use crate::models::interview::InterviewSlot;
use crate::models::requisition::Requisition;
use crate::models::screening::ScreeningResult;
use crate::models::threshold::SelectionThreshold;
use crate::models::workflow::{
    HistoryDetails, PendingAction, WorkflowHistoryEntry, WorkflowStageRecord, WorkflowStep,
};

/// One applied stage change. The store executes it atomically:
/// compare-and-swap on the current stage, close the open stage record,
/// open the next one, append the history entry, refresh the cached
/// status. A stale `expected_stage` yields `Error::Conflict`.
#[derive(Debug, Clone)]
pub struct TransitionRecord {
    pub candidate_id: Uuid,
    pub expected_stage: WorkflowStep,
    pub to_stage: WorkflowStep,
    pub changed_by: String,
    pub is_automated: bool,
    pub reason: Option<String>,
    pub details: Option<HistoryDetails>,
}

/// History entry that does not move the stage (pause/resume, HR
/// decisions recorded against the current stage).
#[derive(Debug, Clone)]
pub struct SideChannelEntry {
    pub candidate_id: Uuid,
    pub stage: WorkflowStep,
    pub changed_by: String,
    pub reason: Option<String>,
    pub details: Option<HistoryDetails>,
}

#[derive(Debug, Clone)]
pub struct NewThreshold {
    pub requisition_id: Option<Uuid>,
    pub min_screening_score: f64,
    pub min_interview_score: f64,
    pub auto_shortlist_threshold: f64,
    pub auto_reject_threshold: f64,
}

#[derive(Debug, Clone)]
pub struct NewRequisition {
    pub title: String,
    pub required_skills: Vec<String>,
    pub min_experience_years: f64,
    pub max_experience_years: f64,
}

#[derive(Debug, Clone)]
pub struct NewSlot {
    pub interviewer_id: Uuid,
    pub candidate_id: Option<Uuid>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub blocked: bool,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct WorkflowCounts {
    pub total_candidates: i64,
    pub open_pending_actions: i64,
    pub automated_transitions: i64,
    pub manual_transitions: i64,
    /// Stage label to number of entries recorded today.
    pub todays_funnel: Vec<(String, i64)>,
}

/// Persistence boundary for all workflow state. Implemented for
/// Postgres and for an in-memory map so the engine can be exercised
/// without a database.
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    async fn create_candidate(&self, new: NewCandidate) -> Result<Candidate>;
    async fn get_candidate(&self, id: Uuid) -> Result<Option<Candidate>>;
    async fn list_candidates(&self) -> Result<Vec<Candidate>>;
    async fn set_paused(&self, id: Uuid, paused: bool) -> Result<()>;
    async fn save_screening(&self, id: Uuid, result: &ScreeningResult) -> Result<()>;
    async fn save_interview_score(&self, id: Uuid, score: f64) -> Result<()>;

    async fn apply_transition(&self, record: TransitionRecord) -> Result<WorkflowHistoryEntry>;
    async fn append_side_channel(&self, entry: SideChannelEntry) -> Result<WorkflowHistoryEntry>;
    async fn list_history(&self, candidate_id: Uuid) -> Result<Vec<WorkflowHistoryEntry>>;
    async fn open_stage_record(&self, candidate_id: Uuid) -> Result<Option<WorkflowStageRecord>>;

    /// Creates the open action for the candidate, or refreshes its
    /// prompt if one is already open. Never yields a second open action.
    async fn upsert_pending_action(
        &self,
        candidate_id: Uuid,
        stage: WorkflowStep,
        prompt: &str,
    ) -> Result<PendingAction>;
    async fn list_pending_actions(&self, limit: i64, offset: i64) -> Result<Vec<PendingAction>>;
    async fn open_pending_for_candidate(&self, candidate_id: Uuid)
        -> Result<Option<PendingAction>>;
    /// Fails with `NotFound` when the action is unknown or already
    /// resolved; never silently succeeds.
    async fn resolve_pending_action(
        &self,
        id: Uuid,
        resolution: &str,
        notes: Option<String>,
        resolved_by: &str,
    ) -> Result<PendingAction>;

    async fn upsert_threshold(&self, threshold: NewThreshold) -> Result<SelectionThreshold>;
    /// Requisition-scoped row if present, else the default row.
    async fn resolve_threshold(
        &self,
        requisition_id: Option<Uuid>,
    ) -> Result<Option<SelectionThreshold>>;
    async fn list_thresholds(&self) -> Result<Vec<SelectionThreshold>>;

    async fn create_requisition(&self, new: NewRequisition) -> Result<Requisition>;
    async fn get_requisition(&self, id: Uuid) -> Result<Option<Requisition>>;
    async fn list_requisitions(&self) -> Result<Vec<Requisition>>;

    /// Transactional "insert if no overlap" per interviewer. Returns
    /// `None` when the interval collides with an existing non-blocked or
    /// blocked slot.
    async fn insert_slot_if_free(&self, slot: NewSlot) -> Result<Option<InterviewSlot>>;
    async fn list_slots(
        &self,
        interviewer_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<InterviewSlot>>;
    async fn slot_for_candidate(&self, candidate_id: Uuid) -> Result<Option<InterviewSlot>>;
    async fn release_slot(&self, slot_id: Uuid) -> Result<()>;

    async fn workflow_counts(&self) -> Result<WorkflowCounts>;
}
