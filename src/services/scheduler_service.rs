use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike, Utc, Weekday};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::interview::InterviewSlot;
use crate::models::workflow::{Actor, HistoryDetails, PendingAction, WorkflowStep};
use crate::services::calendar_service::CalendarService;
use crate::services::transition_service::{TransitionOutcome, TransitionService};
use crate::store::{NewSlot, WorkflowStore};
use crate::utils::lock::LockRegistry;

const WORK_START_HOUR: u32 = 9;
const WORK_END_HOUR: u32 = 18;
const BUFFER_MINUTES: i64 = 30;
const MIN_DURATION_MINUTES: i64 = 15;
const MAX_DURATION_MINUTES: i64 = 240;

/// Per-candidate result of a batch scheduling run. One candidate failing
/// never aborts the rest of the batch.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScheduleItemOutcome {
    Scheduled {
        candidate_id: Uuid,
        slot: InterviewSlot,
    },
    /// The search window was exhausted; HR holds a pending action.
    Queued {
        candidate_id: Uuid,
        action: PendingAction,
    },
    Failed {
        candidate_id: Uuid,
        error: String,
    },
}

/// Books interview slots against working hours (Mon-Fri, 09:00-18:00 UTC)
/// with a fixed buffer between interviews. Runs are serialized per
/// interviewer; the slot store is the authority on overlaps.
#[derive(Clone)]
pub struct SchedulerService {
    store: Arc<dyn WorkflowStore>,
    calendar: CalendarService,
    transitions: TransitionService,
    interviewer_locks: LockRegistry,
    lookahead_days: i64,
}

impl SchedulerService {
    pub fn new(
        store: Arc<dyn WorkflowStore>,
        calendar: CalendarService,
        transitions: TransitionService,
        lookahead_days: i64,
    ) -> Self {
        Self {
            store,
            calendar,
            transitions,
            interviewer_locks: LockRegistry::new(),
            lookahead_days,
        }
    }

    pub async fn schedule_batch(
        &self,
        requisition_id: Uuid,
        interviewer_id: Uuid,
        candidate_ids: &[Uuid],
        start: Option<DateTime<Utc>>,
        duration_minutes: i64,
        actor: Actor,
    ) -> Result<Vec<ScheduleItemOutcome>> {
        if !(MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&duration_minutes) {
            return Err(Error::BadRequest(format!(
                "interview duration must be between {} and {} minutes, got {}",
                MIN_DURATION_MINUTES, MAX_DURATION_MINUTES, duration_minutes
            )));
        }
        if candidate_ids.is_empty() {
            return Err(Error::BadRequest(
                "at least one candidate is required".to_string(),
            ));
        }
        if self.store.get_requisition(requisition_id).await?.is_none() {
            return Err(Error::NotFound("Requisition not found".to_string()));
        }

        let _guard = self.interviewer_locks.acquire(interviewer_id).await;

        let duration = Duration::minutes(duration_minutes);
        let window_start = start.unwrap_or_else(|| Utc::now() + Duration::hours(24));
        let deadline = window_start + Duration::days(self.lookahead_days);

        self.import_busy_intervals(interviewer_id, window_start, deadline)
            .await?;

        let mut cursor = next_working_start(window_start, duration);
        let mut results = Vec::with_capacity(candidate_ids.len());

        for &candidate_id in candidate_ids {
            match self
                .schedule_one(
                    requisition_id,
                    interviewer_id,
                    candidate_id,
                    &mut cursor,
                    duration,
                    deadline,
                    &actor,
                )
                .await
            {
                Ok(outcome) => results.push(outcome),
                Err(e) => {
                    tracing::warn!(candidate_id = %candidate_id, error = %e,
                        "scheduling failed for candidate");
                    results.push(ScheduleItemOutcome::Failed {
                        candidate_id,
                        error: e.to_string(),
                    });
                }
            }
        }

        Ok(results)
    }

    /// Undoes a booked interview: frees the slot and steps the candidate
    /// back to the scheduling stage.
    pub async fn cancel_interview(
        &self,
        candidate_id: Uuid,
        actor: Actor,
        reason: Option<String>,
    ) -> Result<TransitionOutcome> {
        let candidate = self
            .store
            .get_candidate(candidate_id)
            .await?
            .ok_or_else(|| Error::NotFound("Candidate not found".to_string()))?;
        if candidate.workflow_stage != WorkflowStep::InterviewScheduled {
            return Err(Error::IllegalTransition(format!(
                "no interview to cancel at stage {}",
                candidate.workflow_stage
            )));
        }

        if let Some(slot) = self.store.slot_for_candidate(candidate_id).await? {
            self.store.release_slot(slot.id).await?;
        }

        self.transitions
            .advance(
                candidate_id,
                WorkflowStep::ScheduleInterview,
                actor,
                reason.or_else(|| Some("interview cancelled".to_string())),
            )
            .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn schedule_one(
        &self,
        requisition_id: Uuid,
        interviewer_id: Uuid,
        candidate_id: Uuid,
        cursor: &mut DateTime<Utc>,
        duration: Duration,
        deadline: DateTime<Utc>,
        actor: &Actor,
    ) -> Result<ScheduleItemOutcome> {
        let candidate = self
            .store
            .get_candidate(candidate_id)
            .await?
            .ok_or_else(|| Error::NotFound("Candidate not found".to_string()))?;
        if candidate.requisition_id != Some(requisition_id) {
            return Err(Error::BadRequest(
                "candidate does not belong to this requisition".to_string(),
            ));
        }

        // Shortlisted candidates are pulled into the scheduling stage on
        // the way in; anything else must already be there.
        match candidate.workflow_stage {
            WorkflowStep::Shortlisted => {
                self.transitions
                    .advance(
                        candidate_id,
                        WorkflowStep::ScheduleInterview,
                        actor.clone(),
                        Some("picked up for interview scheduling".to_string()),
                    )
                    .await?;
            }
            WorkflowStep::ScheduleInterview => {}
            other => {
                return Err(Error::IllegalTransition(format!(
                    "candidate at stage {} cannot be scheduled",
                    other
                )));
            }
        }

        let slot = loop {
            let slot_start = next_working_start(*cursor, duration);
            if slot_start + duration > deadline {
                let action = self
                    .store
                    .upsert_pending_action(
                        candidate_id,
                        WorkflowStep::ScheduleInterview,
                        &format!(
                            "No interview slot available for {} within {} days; free up the interviewer's calendar or extend the window",
                            candidate.name, self.lookahead_days
                        ),
                    )
                    .await?;
                return Ok(ScheduleItemOutcome::Queued {
                    candidate_id,
                    action,
                });
            }

            match self
                .store
                .insert_slot_if_free(NewSlot {
                    interviewer_id,
                    candidate_id: Some(candidate_id),
                    start_at: slot_start,
                    end_at: slot_start + duration,
                    blocked: false,
                })
                .await?
            {
                Some(slot) => break slot,
                None => {
                    *cursor = slot_start + duration + Duration::minutes(BUFFER_MINUTES);
                }
            }
        };

        let details = HistoryDetails::Scheduling {
            interviewer_id,
            slot_start: slot.start_at,
            slot_end: slot.end_at,
        };
        match self
            .transitions
            .advance_with_details(
                candidate_id,
                WorkflowStep::InterviewScheduled,
                actor.clone(),
                Some("interview slot booked".to_string()),
                Some(details),
            )
            .await
        {
            Ok(TransitionOutcome::Applied { .. })
            | Ok(TransitionOutcome::AlreadyInStage { .. }) => {
                *cursor = slot.end_at + Duration::minutes(BUFFER_MINUTES);
                Ok(ScheduleItemOutcome::Scheduled { candidate_id, slot })
            }
            Ok(other) => {
                // Paused or queued mid-batch: the booked slot must not
                // leak.
                self.store.release_slot(slot.id).await?;
                match other {
                    TransitionOutcome::Queued { action } => Ok(ScheduleItemOutcome::Queued {
                        candidate_id,
                        action,
                    }),
                    _ => Ok(ScheduleItemOutcome::Failed {
                        candidate_id,
                        error: "candidate is paused".to_string(),
                    }),
                }
            }
            Err(e) => {
                self.store.release_slot(slot.id).await?;
                Err(e)
            }
        }
    }

    /// Mirrors the interviewer's external calendar into blocked slots so
    /// the overlap check sees them. Collisions with already-imported
    /// intervals are expected and skipped.
    async fn import_busy_intervals(
        &self,
        interviewer_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<()> {
        let busy = self.calendar.busy_intervals(interviewer_id, from, to).await;
        for interval in busy {
            if interval.end <= interval.start {
                continue;
            }
            self.store
                .insert_slot_if_free(NewSlot {
                    interviewer_id,
                    candidate_id: None,
                    start_at: interval.start,
                    end_at: interval.end,
                    blocked: true,
                })
                .await?;
        }
        Ok(())
    }
}

/// Earliest start at or after `cursor` where `duration` fits entirely
/// inside working hours on a weekday.
pub fn next_working_start(cursor: DateTime<Utc>, duration: Duration) -> DateTime<Utc> {
    let mut cursor = cursor;
    loop {
        if matches!(cursor.weekday(), Weekday::Sat | Weekday::Sun) {
            cursor = at_hour(cursor + Duration::days(1), WORK_START_HOUR);
            continue;
        }
        let day_open = at_hour(cursor, WORK_START_HOUR);
        let day_close = at_hour(cursor, WORK_END_HOUR);
        if cursor < day_open {
            cursor = day_open;
            continue;
        }
        if cursor + duration > day_close {
            cursor = at_hour(cursor + Duration::days(1), WORK_START_HOUR);
            continue;
        }
        return cursor;
    }
}

fn at_hour(moment: DateTime<Utc>, hour: u32) -> DateTime<Utc> {
    let day = moment.date_naive();
    // Hour constants are always valid wall-clock times in UTC.
    match day.and_hms_opt(hour, 0, 0) {
        Some(naive) => Utc.from_utc_datetime(&naive),
        None => moment.with_minute(0).unwrap_or(moment),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn friday_evening_rolls_to_monday_morning() {
        // 2026-08-21 is a Friday.
        let cursor = utc(2026, 8, 21, 17, 30);
        let start = next_working_start(cursor, Duration::minutes(60));
        assert_eq!(start, utc(2026, 8, 24, 9, 0));
        assert_eq!(start.weekday(), Weekday::Mon);
    }

    #[test]
    fn weekend_cursor_snaps_to_monday() {
        // 2026-08-22 is a Saturday.
        let start = next_working_start(utc(2026, 8, 22, 11, 0), Duration::minutes(45));
        assert_eq!(start, utc(2026, 8, 24, 9, 0));
    }

    #[test]
    fn early_morning_snaps_to_work_start() {
        let start = next_working_start(utc(2026, 8, 19, 6, 15), Duration::minutes(60));
        assert_eq!(start, utc(2026, 8, 19, 9, 0));
    }

    #[test]
    fn slot_ending_exactly_at_close_is_allowed() {
        let start = next_working_start(utc(2026, 8, 19, 17, 0), Duration::minutes(60));
        assert_eq!(start, utc(2026, 8, 19, 17, 0));
    }

    #[test]
    fn slot_overrunning_close_moves_to_next_day() {
        let start = next_working_start(utc(2026, 8, 19, 17, 1), Duration::minutes(60));
        assert_eq!(start, utc(2026, 8, 20, 9, 0));
    }

    #[test]
    fn midday_weekday_cursor_is_unchanged() {
        let cursor = utc(2026, 8, 19, 13, 30);
        assert_eq!(next_working_start(cursor, Duration::minutes(30)), cursor);
    }
}
