use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::candidate::{Candidate, NewCandidate};
use crate::models::interview::InterviewSlot;
use crate::models::requisition::Requisition;
use crate::models::screening::ScreeningResult;
use crate::models::threshold::SelectionThreshold;
use crate::models::workflow::{
    PendingAction, WorkflowHistoryEntry, WorkflowStageRecord, WorkflowStep,
};
use crate::store::{
    NewRequisition, NewSlot, NewThreshold, SideChannelEntry, TransitionRecord, WorkflowCounts,
    WorkflowStore,
};

#[derive(Default)]
struct Inner {
    candidates: HashMap<Uuid, Candidate>,
    stage_records: Vec<WorkflowStageRecord>,
    history: Vec<WorkflowHistoryEntry>,
    pending: Vec<PendingAction>,
    thresholds: Vec<SelectionThreshold>,
    requisitions: HashMap<Uuid, Requisition>,
    slots: Vec<InterviewSlot>,
}

/// Map-backed store with the same semantics as the Postgres
/// implementation. Backs tests and runs without `DATABASE_URL`.
#[derive(Default)]
pub struct MemoryWorkflowStore {
    inner: Mutex<Inner>,
}

impl MemoryWorkflowStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorkflowStore for MemoryWorkflowStore {
    async fn create_candidate(&self, new: NewCandidate) -> Result<Candidate> {
        let mut inner = self.inner.lock().unwrap();
        if inner.candidates.values().any(|c| c.email == new.email) {
            return Err(Error::Conflict(
                "A candidate with this email address already exists".to_string(),
            ));
        }

        let now = Utc::now();
        let stage = WorkflowStep::NewApplication;
        let candidate = Candidate {
            id: Uuid::new_v4(),
            name: new.name,
            email: new.email,
            phone: new.phone,
            skills: new.skills,
            experience_years: new.experience_years,
            resume_text: new.resume_text,
            requisition_id: new.requisition_id,
            workflow_stage: stage,
            status: stage.status_label().to_string(),
            screening_score: None,
            interview_score: None,
            screening_result: None,
            paused: false,
            created_at: now,
            updated_at: now,
        };

        inner.stage_records.push(WorkflowStageRecord {
            id: Uuid::new_v4(),
            candidate_id: candidate.id,
            current_stage: stage,
            previous_stage: None,
            started_at: now,
            completed_at: None,
            notes: None,
            updated_by: "system".to_string(),
        });
        inner.candidates.insert(candidate.id, candidate.clone());
        Ok(candidate)
    }

    async fn get_candidate(&self, id: Uuid) -> Result<Option<Candidate>> {
        Ok(self.inner.lock().unwrap().candidates.get(&id).cloned())
    }

    async fn list_candidates(&self) -> Result<Vec<Candidate>> {
        let inner = self.inner.lock().unwrap();
        let mut all: Vec<_> = inner.candidates.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn set_paused(&self, id: Uuid, paused: bool) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let candidate = inner
            .candidates
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound("Candidate not found".to_string()))?;
        candidate.paused = paused;
        candidate.updated_at = Utc::now();
        Ok(())
    }

    async fn save_screening(&self, id: Uuid, result: &ScreeningResult) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let candidate = inner
            .candidates
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound("Candidate not found".to_string()))?;
        candidate.screening_score = Some(result.overall_percentage);
        candidate.screening_result = Some(serde_json::to_value(result)?);
        candidate.updated_at = Utc::now();
        Ok(())
    }

    async fn save_interview_score(&self, id: Uuid, score: f64) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let candidate = inner
            .candidates
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound("Candidate not found".to_string()))?;
        candidate.interview_score = Some(score);
        candidate.updated_at = Utc::now();
        Ok(())
    }

    async fn apply_transition(&self, record: TransitionRecord) -> Result<WorkflowHistoryEntry> {
        let mut inner = self.inner.lock().unwrap();
        let now = Utc::now();

        let candidate = inner
            .candidates
            .get_mut(&record.candidate_id)
            .ok_or_else(|| Error::NotFound("Candidate not found".to_string()))?;
        if candidate.workflow_stage != record.expected_stage {
            return Err(Error::Conflict(format!(
                "Candidate stage changed concurrently: expected {}, found {}",
                record.expected_stage, candidate.workflow_stage
            )));
        }
        candidate.workflow_stage = record.to_stage;
        candidate.status = record.to_stage.status_label().to_string();
        candidate.updated_at = now;

        for stage_record in inner
            .stage_records
            .iter_mut()
            .filter(|r| r.candidate_id == record.candidate_id && r.completed_at.is_none())
        {
            stage_record.completed_at = Some(now);
        }
        inner.stage_records.push(WorkflowStageRecord {
            id: Uuid::new_v4(),
            candidate_id: record.candidate_id,
            current_stage: record.to_stage,
            previous_stage: Some(record.expected_stage),
            started_at: now,
            completed_at: None,
            notes: record.reason.clone(),
            updated_by: record.changed_by.clone(),
        });

        let entry = WorkflowHistoryEntry {
            id: Uuid::new_v4(),
            candidate_id: record.candidate_id,
            from_stage: Some(record.expected_stage),
            to_stage: record.to_stage,
            changed_by: record.changed_by,
            is_automated: record.is_automated,
            reason: record.reason,
            details: record.details,
            created_at: now,
        };
        inner.history.push(entry.clone());
        Ok(entry)
    }

    async fn append_side_channel(&self, entry: SideChannelEntry) -> Result<WorkflowHistoryEntry> {
        let mut inner = self.inner.lock().unwrap();
        let record = WorkflowHistoryEntry {
            id: Uuid::new_v4(),
            candidate_id: entry.candidate_id,
            from_stage: None,
            to_stage: entry.stage,
            changed_by: entry.changed_by,
            is_automated: false,
            reason: entry.reason,
            details: entry.details,
            created_at: Utc::now(),
        };
        inner.history.push(record.clone());
        Ok(record)
    }

    async fn list_history(&self, candidate_id: Uuid) -> Result<Vec<WorkflowHistoryEntry>> {
        let inner = self.inner.lock().unwrap();
        let mut entries: Vec<_> = inner
            .history
            .iter()
            .filter(|e| e.candidate_id == candidate_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }

    async fn open_stage_record(&self, candidate_id: Uuid) -> Result<Option<WorkflowStageRecord>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .stage_records
            .iter()
            .find(|r| r.candidate_id == candidate_id && r.completed_at.is_none())
            .cloned())
    }

    async fn upsert_pending_action(
        &self,
        candidate_id: Uuid,
        stage: WorkflowStep,
        prompt: &str,
    ) -> Result<PendingAction> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(open) = inner
            .pending
            .iter_mut()
            .find(|a| a.candidate_id == candidate_id && a.is_open())
        {
            open.stage = stage;
            open.prompt = prompt.to_string();
            return Ok(open.clone());
        }

        let action = PendingAction {
            id: Uuid::new_v4(),
            candidate_id,
            stage,
            prompt: prompt.to_string(),
            created_at: Utc::now(),
            resolved_at: None,
            resolution: None,
            resolution_notes: None,
            resolved_by: None,
        };
        inner.pending.push(action.clone());
        Ok(action)
    }

    async fn list_pending_actions(&self, limit: i64, offset: i64) -> Result<Vec<PendingAction>> {
        let inner = self.inner.lock().unwrap();
        let mut open: Vec<_> = inner.pending.iter().filter(|a| a.is_open()).cloned().collect();
        open.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(open
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn open_pending_for_candidate(
        &self,
        candidate_id: Uuid,
    ) -> Result<Option<PendingAction>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .pending
            .iter()
            .find(|a| a.candidate_id == candidate_id && a.is_open())
            .cloned())
    }

    async fn resolve_pending_action(
        &self,
        id: Uuid,
        resolution: &str,
        notes: Option<String>,
        resolved_by: &str,
    ) -> Result<PendingAction> {
        let mut inner = self.inner.lock().unwrap();
        let action = inner
            .pending
            .iter_mut()
            .find(|a| a.id == id && a.is_open())
            .ok_or_else(|| Error::NotFound("Pending action not found".to_string()))?;
        action.resolved_at = Some(Utc::now());
        action.resolution = Some(resolution.to_string());
        action.resolution_notes = notes;
        action.resolved_by = Some(resolved_by.to_string());
        Ok(action.clone())
    }

    async fn upsert_threshold(&self, threshold: NewThreshold) -> Result<SelectionThreshold> {
        let mut inner = self.inner.lock().unwrap();
        let now = Utc::now();
        if let Some(existing) = inner
            .thresholds
            .iter_mut()
            .find(|t| t.requisition_id == threshold.requisition_id)
        {
            existing.min_screening_score = threshold.min_screening_score;
            existing.min_interview_score = threshold.min_interview_score;
            existing.auto_shortlist_threshold = threshold.auto_shortlist_threshold;
            existing.auto_reject_threshold = threshold.auto_reject_threshold;
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let row = SelectionThreshold {
            id: Uuid::new_v4(),
            requisition_id: threshold.requisition_id,
            min_screening_score: threshold.min_screening_score,
            min_interview_score: threshold.min_interview_score,
            auto_shortlist_threshold: threshold.auto_shortlist_threshold,
            auto_reject_threshold: threshold.auto_reject_threshold,
            updated_at: now,
        };
        inner.thresholds.push(row.clone());
        Ok(row)
    }

    async fn resolve_threshold(
        &self,
        requisition_id: Option<Uuid>,
    ) -> Result<Option<SelectionThreshold>> {
        let inner = self.inner.lock().unwrap();
        if let Some(rid) = requisition_id {
            if let Some(row) = inner
                .thresholds
                .iter()
                .find(|t| t.requisition_id == Some(rid))
            {
                return Ok(Some(row.clone()));
            }
        }
        Ok(inner
            .thresholds
            .iter()
            .find(|t| t.requisition_id.is_none())
            .cloned())
    }

    async fn list_thresholds(&self) -> Result<Vec<SelectionThreshold>> {
        Ok(self.inner.lock().unwrap().thresholds.clone())
    }

    async fn create_requisition(&self, new: NewRequisition) -> Result<Requisition> {
        let mut inner = self.inner.lock().unwrap();
        let requisition = Requisition {
            id: Uuid::new_v4(),
            title: new.title,
            required_skills: new.required_skills,
            min_experience_years: new.min_experience_years,
            max_experience_years: new.max_experience_years,
            created_at: Utc::now(),
        };
        inner.requisitions.insert(requisition.id, requisition.clone());
        Ok(requisition)
    }

    async fn get_requisition(&self, id: Uuid) -> Result<Option<Requisition>> {
        Ok(self.inner.lock().unwrap().requisitions.get(&id).cloned())
    }

    async fn list_requisitions(&self) -> Result<Vec<Requisition>> {
        let inner = self.inner.lock().unwrap();
        let mut all: Vec<_> = inner.requisitions.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn insert_slot_if_free(&self, slot: NewSlot) -> Result<Option<InterviewSlot>> {
        let mut inner = self.inner.lock().unwrap();
        let collides = inner.slots.iter().any(|existing| {
            existing.interviewer_id == slot.interviewer_id
                && existing.overlaps(slot.start_at, slot.end_at)
        });
        if collides {
            return Ok(None);
        }

        let row = InterviewSlot {
            id: Uuid::new_v4(),
            interviewer_id: slot.interviewer_id,
            candidate_id: slot.candidate_id,
            start_at: slot.start_at,
            end_at: slot.end_at,
            blocked: slot.blocked,
            created_at: Utc::now(),
        };
        inner.slots.push(row.clone());
        Ok(Some(row))
    }

    async fn list_slots(
        &self,
        interviewer_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<InterviewSlot>> {
        let inner = self.inner.lock().unwrap();
        let mut slots: Vec<_> = inner
            .slots
            .iter()
            .filter(|s| s.interviewer_id == interviewer_id && s.overlaps(from, to))
            .cloned()
            .collect();
        slots.sort_by(|a, b| a.start_at.cmp(&b.start_at));
        Ok(slots)
    }

    async fn slot_for_candidate(&self, candidate_id: Uuid) -> Result<Option<InterviewSlot>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .slots
            .iter()
            .find(|s| s.candidate_id == Some(candidate_id) && !s.blocked)
            .cloned())
    }

    async fn release_slot(&self, slot_id: Uuid) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.slots.len();
        inner.slots.retain(|s| s.id != slot_id);
        if inner.slots.len() == before {
            return Err(Error::NotFound("Interview slot not found".to_string()));
        }
        Ok(())
    }

    async fn workflow_counts(&self) -> Result<WorkflowCounts> {
        let inner = self.inner.lock().unwrap();
        let today = Utc::now().date_naive();
        let mut todays: HashMap<String, i64> = HashMap::new();
        for entry in inner
            .history
            .iter()
            .filter(|e| e.created_at.date_naive() == today && e.from_stage.is_some())
        {
            *todays.entry(entry.to_stage.as_str().to_string()).or_default() += 1;
        }
        let mut todays_funnel: Vec<_> = todays.into_iter().collect();
        todays_funnel.sort();

        Ok(WorkflowCounts {
            total_candidates: inner.candidates.len() as i64,
            open_pending_actions: inner.pending.iter().filter(|a| a.is_open()).count() as i64,
            automated_transitions: inner
                .history
                .iter()
                .filter(|e| e.is_automated && e.from_stage.is_some())
                .count() as i64,
            manual_transitions: inner
                .history
                .iter()
                .filter(|e| !e.is_automated && e.from_stage.is_some())
                .count() as i64,
            todays_funnel,
        })
    }
}
