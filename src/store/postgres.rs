use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
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

/// Postgres-backed store. Every mutating call runs in one transaction;
/// stage changes are guarded by a compare-and-swap on `workflow_stage`
/// and slot inserts by a per-interviewer advisory lock.
#[derive(Clone)]
pub struct PgWorkflowStore {
    pool: PgPool,
}

impl PgWorkflowStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn parse_step(raw: &str) -> Result<WorkflowStep> {
    raw.parse()
        .map_err(|e: String| Error::Internal(format!("corrupt workflow stage in store: {}", e)))
}

fn parse_step_opt(raw: Option<String>) -> Result<Option<WorkflowStep>> {
    raw.as_deref().map(parse_step).transpose()
}

fn map_candidate(row: &PgRow) -> Result<Candidate> {
    Ok(Candidate {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        skills: row.try_get("skills")?,
        experience_years: row.try_get("experience_years")?,
        resume_text: row.try_get("resume_text")?,
        requisition_id: row.try_get("requisition_id")?,
        workflow_stage: parse_step(row.try_get::<String, _>("workflow_stage")?.as_str())?,
        status: row.try_get("status")?,
        screening_score: row.try_get("screening_score")?,
        interview_score: row.try_get("interview_score")?,
        screening_result: row.try_get("screening_result")?,
        paused: row.try_get("paused")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn map_history(row: &PgRow) -> Result<WorkflowHistoryEntry> {
    let details: Option<serde_json::Value> = row.try_get("details")?;
    Ok(WorkflowHistoryEntry {
        id: row.try_get("id")?,
        candidate_id: row.try_get("candidate_id")?,
        from_stage: parse_step_opt(row.try_get("from_stage")?)?,
        to_stage: parse_step(row.try_get::<String, _>("to_stage")?.as_str())?,
        changed_by: row.try_get("changed_by")?,
        is_automated: row.try_get("is_automated")?,
        reason: row.try_get("reason")?,
        details: details.map(serde_json::from_value).transpose()?,
        created_at: row.try_get("created_at")?,
    })
}

fn map_pending(row: &PgRow) -> Result<PendingAction> {
    Ok(PendingAction {
        id: row.try_get("id")?,
        candidate_id: row.try_get("candidate_id")?,
        stage: parse_step(row.try_get::<String, _>("stage")?.as_str())?,
        prompt: row.try_get("prompt")?,
        created_at: row.try_get("created_at")?,
        resolved_at: row.try_get("resolved_at")?,
        resolution: row.try_get("resolution")?,
        resolution_notes: row.try_get("resolution_notes")?,
        resolved_by: row.try_get("resolved_by")?,
    })
}

fn map_threshold(row: &PgRow) -> Result<SelectionThreshold> {
    Ok(SelectionThreshold {
        id: row.try_get("id")?,
        requisition_id: row.try_get("requisition_id")?,
        min_screening_score: row.try_get("min_screening_score")?,
        min_interview_score: row.try_get("min_interview_score")?,
        auto_shortlist_threshold: row.try_get("auto_shortlist_threshold")?,
        auto_reject_threshold: row.try_get("auto_reject_threshold")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn map_requisition(row: &PgRow) -> Result<Requisition> {
    let skills: serde_json::Value = row.try_get("required_skills")?;
    Ok(Requisition {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        required_skills: serde_json::from_value(skills)?,
        min_experience_years: row.try_get("min_experience_years")?,
        max_experience_years: row.try_get("max_experience_years")?,
        created_at: row.try_get("created_at")?,
    })
}

fn map_slot(row: &PgRow) -> Result<InterviewSlot> {
    Ok(InterviewSlot {
        id: row.try_get("id")?,
        interviewer_id: row.try_get("interviewer_id")?,
        candidate_id: row.try_get("candidate_id")?,
        start_at: row.try_get("start_at")?,
        end_at: row.try_get("end_at")?,
        blocked: row.try_get("blocked")?,
        created_at: row.try_get("created_at")?,
    })
}

const CANDIDATE_COLUMNS: &str = "id, name, email, phone, skills, experience_years, resume_text, \
     requisition_id, workflow_stage, status, screening_score, interview_score, screening_result, \
     paused, created_at, updated_at";

#[async_trait]
impl WorkflowStore for PgWorkflowStore {
    async fn create_candidate(&self, new: NewCandidate) -> Result<Candidate> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query("SELECT id FROM candidates WHERE email = $1")
            .bind(&new.email)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_some() {
            return Err(Error::Conflict(
                "A candidate with this email address already exists".to_string(),
            ));
        }

        let stage = WorkflowStep::NewApplication;
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO candidates
                (id, name, email, phone, skills, experience_years, resume_text, requisition_id,
                 workflow_stage, status, paused)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, false)
            RETURNING {}
            "#,
            CANDIDATE_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.phone)
        .bind(&new.skills)
        .bind(new.experience_years)
        .bind(&new.resume_text)
        .bind(new.requisition_id)
        .bind(stage.as_str())
        .bind(stage.status_label())
        .fetch_one(&mut *tx)
        .await?;
        let candidate = map_candidate(&row)?;

        sqlx::query(
            r#"
            INSERT INTO workflow_stage_records
                (id, candidate_id, current_stage, previous_stage, started_at, updated_by)
            VALUES ($1, $2, $3, NULL, NOW(), 'system')
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(candidate.id)
        .bind(stage.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(candidate)
    }

    async fn get_candidate(&self, id: Uuid) -> Result<Option<Candidate>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM candidates WHERE id = $1",
            CANDIDATE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(map_candidate).transpose()
    }

    async fn list_candidates(&self) -> Result<Vec<Candidate>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM candidates ORDER BY created_at DESC",
            CANDIDATE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(map_candidate).collect()
    }

    async fn set_paused(&self, id: Uuid, paused: bool) -> Result<()> {
        let result = sqlx::query(
            "UPDATE candidates SET paused = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(paused)
        .bind(id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound("Candidate not found".to_string()));
        }
        Ok(())
    }

    async fn save_screening(&self, id: Uuid, result: &ScreeningResult) -> Result<()> {
        let updated = sqlx::query(
            r#"
            UPDATE candidates
            SET screening_score = $1, screening_result = $2, updated_at = NOW()
            WHERE id = $3
            "#,
        )
        .bind(result.overall_percentage)
        .bind(serde_json::to_value(result)?)
        .bind(id)
        .execute(&self.pool)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(Error::NotFound("Candidate not found".to_string()));
        }
        Ok(())
    }

    async fn save_interview_score(&self, id: Uuid, score: f64) -> Result<()> {
        let updated = sqlx::query(
            "UPDATE candidates SET interview_score = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(score)
        .bind(id)
        .execute(&self.pool)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(Error::NotFound("Candidate not found".to_string()));
        }
        Ok(())
    }

    async fn apply_transition(&self, record: TransitionRecord) -> Result<WorkflowHistoryEntry> {
        let mut tx = self.pool.begin().await?;

        let swapped = sqlx::query(
            r#"
            UPDATE candidates
            SET workflow_stage = $1, status = $2, updated_at = NOW()
            WHERE id = $3 AND workflow_stage = $4
            RETURNING id
            "#,
        )
        .bind(record.to_stage.as_str())
        .bind(record.to_stage.status_label())
        .bind(record.candidate_id)
        .bind(record.expected_stage.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        if swapped.is_none() {
            let exists = sqlx::query("SELECT workflow_stage FROM candidates WHERE id = $1")
                .bind(record.candidate_id)
                .fetch_optional(&mut *tx)
                .await?;
            return match exists {
                None => Err(Error::NotFound("Candidate not found".to_string())),
                Some(row) => Err(Error::Conflict(format!(
                    "Candidate stage changed concurrently: expected {}, found {}",
                    record.expected_stage,
                    row.try_get::<String, _>("workflow_stage")?
                ))),
            };
        }

        sqlx::query(
            r#"
            UPDATE workflow_stage_records
            SET completed_at = NOW()
            WHERE candidate_id = $1 AND completed_at IS NULL
            "#,
        )
        .bind(record.candidate_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO workflow_stage_records
                (id, candidate_id, current_stage, previous_stage, started_at, notes, updated_by)
            VALUES ($1, $2, $3, $4, NOW(), $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(record.candidate_id)
        .bind(record.to_stage.as_str())
        .bind(record.expected_stage.as_str())
        .bind(&record.reason)
        .bind(&record.changed_by)
        .execute(&mut *tx)
        .await?;

        let details = record
            .details
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;
        let row = sqlx::query(
            r#"
            INSERT INTO workflow_history
                (id, candidate_id, from_stage, to_stage, changed_by, is_automated, reason, details)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, candidate_id, from_stage, to_stage, changed_by, is_automated, reason,
                      details, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(record.candidate_id)
        .bind(record.expected_stage.as_str())
        .bind(record.to_stage.as_str())
        .bind(&record.changed_by)
        .bind(record.is_automated)
        .bind(&record.reason)
        .bind(details)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        map_history(&row)
    }

    async fn append_side_channel(&self, entry: SideChannelEntry) -> Result<WorkflowHistoryEntry> {
        let details = entry.details.as_ref().map(serde_json::to_value).transpose()?;
        let row = sqlx::query(
            r#"
            INSERT INTO workflow_history
                (id, candidate_id, from_stage, to_stage, changed_by, is_automated, reason, details)
            VALUES ($1, $2, NULL, $3, $4, false, $5, $6)
            RETURNING id, candidate_id, from_stage, to_stage, changed_by, is_automated, reason,
                      details, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(entry.candidate_id)
        .bind(entry.stage.as_str())
        .bind(&entry.changed_by)
        .bind(&entry.reason)
        .bind(details)
        .fetch_one(&self.pool)
        .await?;
        map_history(&row)
    }

    async fn list_history(&self, candidate_id: Uuid) -> Result<Vec<WorkflowHistoryEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, candidate_id, from_stage, to_stage, changed_by, is_automated, reason,
                   details, created_at
            FROM workflow_history
            WHERE candidate_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(candidate_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(map_history).collect()
    }

    async fn open_stage_record(&self, candidate_id: Uuid) -> Result<Option<WorkflowStageRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, candidate_id, current_stage, previous_stage, started_at, completed_at,
                   notes, updated_by
            FROM workflow_stage_records
            WHERE candidate_id = $1 AND completed_at IS NULL
            "#,
        )
        .bind(candidate_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(WorkflowStageRecord {
                id: row.try_get("id")?,
                candidate_id: row.try_get("candidate_id")?,
                current_stage: parse_step(row.try_get::<String, _>("current_stage")?.as_str())?,
                previous_stage: parse_step_opt(row.try_get("previous_stage")?)?,
                started_at: row.try_get("started_at")?,
                completed_at: row.try_get("completed_at")?,
                notes: row.try_get("notes")?,
                updated_by: row.try_get("updated_by")?,
            })
        })
        .transpose()
    }

    async fn upsert_pending_action(
        &self,
        candidate_id: Uuid,
        stage: WorkflowStep,
        prompt: &str,
    ) -> Result<PendingAction> {
        // The partial unique index on (candidate_id) WHERE resolved_at IS
        // NULL backs the one-open-action invariant.
        let row = sqlx::query(
            r#"
            INSERT INTO pending_actions (id, candidate_id, stage, prompt)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (candidate_id) WHERE resolved_at IS NULL
            DO UPDATE SET stage = EXCLUDED.stage, prompt = EXCLUDED.prompt
            RETURNING id, candidate_id, stage, prompt, created_at, resolved_at, resolution,
                      resolution_notes, resolved_by
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(candidate_id)
        .bind(stage.as_str())
        .bind(prompt)
        .fetch_one(&self.pool)
        .await?;
        map_pending(&row)
    }

    async fn list_pending_actions(&self, limit: i64, offset: i64) -> Result<Vec<PendingAction>> {
        let rows = sqlx::query(
            r#"
            SELECT id, candidate_id, stage, prompt, created_at, resolved_at, resolution,
                   resolution_notes, resolved_by
            FROM pending_actions
            WHERE resolved_at IS NULL
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(map_pending).collect()
    }

    async fn open_pending_for_candidate(
        &self,
        candidate_id: Uuid,
    ) -> Result<Option<PendingAction>> {
        let row = sqlx::query(
            r#"
            SELECT id, candidate_id, stage, prompt, created_at, resolved_at, resolution,
                   resolution_notes, resolved_by
            FROM pending_actions
            WHERE candidate_id = $1 AND resolved_at IS NULL
            "#,
        )
        .bind(candidate_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(map_pending).transpose()
    }

    async fn resolve_pending_action(
        &self,
        id: Uuid,
        resolution: &str,
        notes: Option<String>,
        resolved_by: &str,
    ) -> Result<PendingAction> {
        let row = sqlx::query(
            r#"
            UPDATE pending_actions
            SET resolved_at = NOW(), resolution = $1, resolution_notes = $2, resolved_by = $3
            WHERE id = $4 AND resolved_at IS NULL
            RETURNING id, candidate_id, stage, prompt, created_at, resolved_at, resolution,
                      resolution_notes, resolved_by
            "#,
        )
        .bind(resolution)
        .bind(notes)
        .bind(resolved_by)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Pending action not found".to_string()))?;
        map_pending(&row)
    }

    async fn upsert_threshold(&self, threshold: NewThreshold) -> Result<SelectionThreshold> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE selection_thresholds
            SET min_screening_score = $1, min_interview_score = $2,
                auto_shortlist_threshold = $3, auto_reject_threshold = $4, updated_at = NOW()
            WHERE requisition_id IS NOT DISTINCT FROM $5
            RETURNING id, requisition_id, min_screening_score, min_interview_score,
                      auto_shortlist_threshold, auto_reject_threshold, updated_at
            "#,
        )
        .bind(threshold.min_screening_score)
        .bind(threshold.min_interview_score)
        .bind(threshold.auto_shortlist_threshold)
        .bind(threshold.auto_reject_threshold)
        .bind(threshold.requisition_id)
        .fetch_optional(&mut *tx)
        .await?;

        let row = match updated {
            Some(row) => row,
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO selection_thresholds
                        (id, requisition_id, min_screening_score, min_interview_score,
                         auto_shortlist_threshold, auto_reject_threshold)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    RETURNING id, requisition_id, min_screening_score, min_interview_score,
                              auto_shortlist_threshold, auto_reject_threshold, updated_at
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(threshold.requisition_id)
                .bind(threshold.min_screening_score)
                .bind(threshold.min_interview_score)
                .bind(threshold.auto_shortlist_threshold)
                .bind(threshold.auto_reject_threshold)
                .fetch_one(&mut *tx)
                .await?
            }
        };

        tx.commit().await?;
        map_threshold(&row)
    }

    async fn resolve_threshold(
        &self,
        requisition_id: Option<Uuid>,
    ) -> Result<Option<SelectionThreshold>> {
        let row = sqlx::query(
            r#"
            SELECT id, requisition_id, min_screening_score, min_interview_score,
                   auto_shortlist_threshold, auto_reject_threshold, updated_at
            FROM selection_thresholds
            WHERE requisition_id = $1 OR requisition_id IS NULL
            ORDER BY requisition_id NULLS LAST
            LIMIT 1
            "#,
        )
        .bind(requisition_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(map_threshold).transpose()
    }

    async fn list_thresholds(&self) -> Result<Vec<SelectionThreshold>> {
        let rows = sqlx::query(
            r#"
            SELECT id, requisition_id, min_screening_score, min_interview_score,
                   auto_shortlist_threshold, auto_reject_threshold, updated_at
            FROM selection_thresholds
            ORDER BY requisition_id NULLS FIRST
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(map_threshold).collect()
    }

    async fn create_requisition(&self, new: NewRequisition) -> Result<Requisition> {
        let row = sqlx::query(
            r#"
            INSERT INTO requisitions
                (id, title, required_skills, min_experience_years, max_experience_years)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, required_skills, min_experience_years, max_experience_years,
                      created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.title)
        .bind(serde_json::to_value(&new.required_skills)?)
        .bind(new.min_experience_years)
        .bind(new.max_experience_years)
        .fetch_one(&self.pool)
        .await?;
        map_requisition(&row)
    }

    async fn get_requisition(&self, id: Uuid) -> Result<Option<Requisition>> {
        let row = sqlx::query(
            r#"
            SELECT id, title, required_skills, min_experience_years, max_experience_years,
                   created_at
            FROM requisitions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(map_requisition).transpose()
    }

    async fn list_requisitions(&self) -> Result<Vec<Requisition>> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, required_skills, min_experience_years, max_experience_years,
                   created_at
            FROM requisitions
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(map_requisition).collect()
    }

    async fn insert_slot_if_free(&self, slot: NewSlot) -> Result<Option<InterviewSlot>> {
        let mut tx = self.pool.begin().await?;

        // Serialize slot writes per interviewer so two batches cannot both
        // pass the overlap check.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1::text))")
            .bind(slot.interviewer_id)
            .execute(&mut *tx)
            .await?;

        let collision = sqlx::query(
            r#"
            SELECT id FROM interview_slots
            WHERE interviewer_id = $1 AND start_at < $3 AND $2 < end_at
            LIMIT 1
            "#,
        )
        .bind(slot.interviewer_id)
        .bind(slot.start_at)
        .bind(slot.end_at)
        .fetch_optional(&mut *tx)
        .await?;
        if collision.is_some() {
            return Ok(None);
        }

        let row = sqlx::query(
            r#"
            INSERT INTO interview_slots (id, interviewer_id, candidate_id, start_at, end_at, blocked)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, interviewer_id, candidate_id, start_at, end_at, blocked, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(slot.interviewer_id)
        .bind(slot.candidate_id)
        .bind(slot.start_at)
        .bind(slot.end_at)
        .bind(slot.blocked)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(map_slot(&row)?))
    }

    async fn list_slots(
        &self,
        interviewer_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<InterviewSlot>> {
        let rows = sqlx::query(
            r#"
            SELECT id, interviewer_id, candidate_id, start_at, end_at, blocked, created_at
            FROM interview_slots
            WHERE interviewer_id = $1 AND start_at < $3 AND $2 < end_at
            ORDER BY start_at ASC
            "#,
        )
        .bind(interviewer_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(map_slot).collect()
    }

    async fn slot_for_candidate(&self, candidate_id: Uuid) -> Result<Option<InterviewSlot>> {
        let row = sqlx::query(
            r#"
            SELECT id, interviewer_id, candidate_id, start_at, end_at, blocked, created_at
            FROM interview_slots
            WHERE candidate_id = $1 AND blocked = false
            LIMIT 1
            "#,
        )
        .bind(candidate_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(map_slot).transpose()
    }

    async fn release_slot(&self, slot_id: Uuid) -> Result<()> {
        let deleted = sqlx::query("DELETE FROM interview_slots WHERE id = $1")
            .bind(slot_id)
            .execute(&self.pool)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(Error::NotFound("Interview slot not found".to_string()));
        }
        Ok(())
    }

    async fn workflow_counts(&self) -> Result<WorkflowCounts> {
        let totals = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM candidates) AS total_candidates,
                (SELECT COUNT(*) FROM pending_actions WHERE resolved_at IS NULL) AS open_pending,
                (SELECT COUNT(*) FROM workflow_history
                    WHERE is_automated AND from_stage IS NOT NULL) AS automated,
                (SELECT COUNT(*) FROM workflow_history
                    WHERE NOT is_automated AND from_stage IS NOT NULL) AS manual
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let funnel_rows = sqlx::query(
            r#"
            SELECT to_stage, COUNT(*) AS count
            FROM workflow_history
            WHERE from_stage IS NOT NULL AND created_at >= date_trunc('day', NOW())
            GROUP BY to_stage
            ORDER BY to_stage
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let todays_funnel = funnel_rows
            .iter()
            .map(|row| {
                Ok((
                    row.try_get::<String, _>("to_stage")?,
                    row.try_get::<i64, _>("count")?,
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(WorkflowCounts {
            total_candidates: totals.try_get("total_candidates")?,
            open_pending_actions: totals.try_get("open_pending")?,
            automated_transitions: totals.try_get("automated")?,
            manual_transitions: totals.try_get("manual")?,
            todays_funnel,
        })
    }
}
