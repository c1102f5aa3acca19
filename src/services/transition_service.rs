use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::candidate::Candidate;
use crate::models::screening::ScreeningResult;
use crate::models::threshold::ScreeningOutcome;
use crate::models::workflow::{
    Actor, HistoryDetails, PendingAction, WorkflowHistoryEntry, WorkflowStep,
};
use crate::services::mail_service::MailService;
use crate::services::scoring_service::ScoringService;
use crate::services::threshold_service::{self, ThresholdService};
use crate::store::{SideChannelEntry, TransitionRecord, WorkflowStore};
use crate::utils::lock::LockRegistry;

/// What a requested transition turned into.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum TransitionOutcome {
    /// The stage moved and a history entry was appended.
    Applied { entry: WorkflowHistoryEntry },
    /// Re-advancing to the current stage; success, no duplicate history.
    AlreadyInStage { stage: WorkflowStep },
    /// A human decision is required; a pending action holds the move.
    Queued { action: PendingAction },
    /// The candidate is paused; the automated move was not applied.
    Suppressed { stage: WorkflowStep },
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub screening: Option<ScreeningResult>,
    pub outcome: TransitionOutcome,
}

/// The state machine core. All candidate mutations funnel through here,
/// serialized per candidate id on top of the store's stage CAS.
#[derive(Clone)]
pub struct TransitionService {
    store: Arc<dyn WorkflowStore>,
    scoring: ScoringService,
    thresholds: ThresholdService,
    mail: MailService,
    locks: LockRegistry,
}

impl TransitionService {
    pub fn new(
        store: Arc<dyn WorkflowStore>,
        scoring: ScoringService,
        thresholds: ThresholdService,
        mail: MailService,
        locks: LockRegistry,
    ) -> Self {
        Self {
            store,
            scoring,
            thresholds,
            mail,
            locks,
        }
    }

    pub async fn advance(
        &self,
        candidate_id: Uuid,
        target: WorkflowStep,
        actor: Actor,
        reason: Option<String>,
    ) -> Result<TransitionOutcome> {
        let _guard = self.locks.acquire(candidate_id).await;
        self.advance_locked(candidate_id, target, actor, reason, None)
            .await
    }

    pub(crate) async fn advance_with_details(
        &self,
        candidate_id: Uuid,
        target: WorkflowStep,
        actor: Actor,
        reason: Option<String>,
        details: Option<HistoryDetails>,
    ) -> Result<TransitionOutcome> {
        let _guard = self.locks.acquire(candidate_id).await;
        self.advance_locked(candidate_id, target, actor, reason, details)
            .await
    }

    /// Core transition logic; the caller must hold the candidate lock.
    pub(crate) async fn advance_locked(
        &self,
        candidate_id: Uuid,
        target: WorkflowStep,
        actor: Actor,
        reason: Option<String>,
        details: Option<HistoryDetails>,
    ) -> Result<TransitionOutcome> {
        let candidate = self.require_candidate(candidate_id).await?;
        let current = candidate.workflow_stage;

        if current == target {
            return Ok(TransitionOutcome::AlreadyInStage { stage: current });
        }
        if !current.can_advance_to(target) {
            return Err(Error::IllegalTransition(format!(
                "cannot move candidate from {} to {}",
                current, target
            )));
        }
        if actor.is_system() && candidate.paused {
            tracing::info!(candidate_id = %candidate_id, target = %target,
                "automated transition suppressed while paused");
            return Ok(TransitionOutcome::Suppressed { stage: current });
        }

        // The mail connector is invoked before the stage moves, and only
        // for a human actor: offer drafts are never sent unattended.
        let mut details = details;
        if target == WorkflowStep::OfferSent {
            if actor.is_system() {
                return Err(Error::IllegalTransition(
                    "sending an offer requires explicit human approval".to_string(),
                ));
            }
            match self.send_offer_mail(&candidate).await {
                Ok(sent) => details = Some(sent),
                Err(e) => {
                    tracing::error!(candidate_id = %candidate_id, error = %e,
                        "offer mail failed, queueing for HR");
                    let action = self
                        .store
                        .upsert_pending_action(
                            candidate_id,
                            current,
                            &format!("Offer email to {} failed: {}. Retry once the mail connector recovers.", candidate.email, e),
                        )
                        .await?;
                    return Ok(TransitionOutcome::Queued { action });
                }
            }
        }

        let entry = self
            .store
            .apply_transition(TransitionRecord {
                candidate_id,
                expected_stage: current,
                to_stage: target,
                changed_by: actor.name().to_string(),
                is_automated: actor.is_system(),
                reason,
                details,
            })
            .await?;

        tracing::info!(candidate_id = %candidate_id, from = %current, to = %target,
            changed_by = actor.name(), "workflow stage advanced");

        // A pending action that pointed at the stage just left is stale.
        if let Some(open) = self.store.open_pending_for_candidate(candidate_id).await? {
            let _ = self
                .store
                .resolve_pending_action(
                    open.id,
                    "superseded",
                    Some(format!("stage moved to {}", target)),
                    actor.name(),
                )
                .await;
        }

        // The offer email itself is gated on HR approval.
        if target == WorkflowStep::GenerateOfferLetter {
            self.store
                .upsert_pending_action(
                    candidate_id,
                    target,
                    &format!("Approve the offer letter email for {}", candidate.name),
                )
                .await?;
        }

        Ok(TransitionOutcome::Applied { entry })
    }

    /// Scoring + threshold policy + controller in one pass.
    pub async fn evaluate(&self, candidate_id: Uuid) -> Result<EvaluationReport> {
        let _guard = self.locks.acquire(candidate_id).await;

        let mut candidate = self.require_candidate(candidate_id).await?;
        if candidate.paused {
            return Ok(EvaluationReport {
                screening: None,
                outcome: TransitionOutcome::Suppressed {
                    stage: candidate.workflow_stage,
                },
            });
        }

        let requisition_id = candidate.requisition_id.ok_or_else(|| {
            Error::BadRequest("candidate has no requisition to evaluate against".to_string())
        })?;
        let requisition = self
            .store
            .get_requisition(requisition_id)
            .await?
            .ok_or_else(|| Error::NotFound("Requisition not found".to_string()))?;
        let threshold = self.thresholds.resolve(Some(requisition_id)).await?;

        if candidate.workflow_stage == WorkflowStep::NewApplication {
            self.advance_locked(
                candidate_id,
                WorkflowStep::AiScreening,
                Actor::System,
                Some("application picked up for screening".to_string()),
                None,
            )
            .await?;
            candidate = self.require_candidate(candidate_id).await?;
        }
        if candidate.workflow_stage != WorkflowStep::AiScreening {
            return Err(Error::BadRequest(format!(
                "evaluate is only valid during screening, candidate is at {}",
                candidate.workflow_stage
            )));
        }

        let screening = self.scoring.score(&candidate, &requisition, &threshold).await?;
        self.store.save_screening(candidate_id, &screening).await?;

        let details = HistoryDetails::Screening {
            overall_percentage: screening.overall_percentage,
            recommendation: screening.recommendation.as_str().to_string(),
            used_ai: screening.used_ai,
        };

        let outcome = match threshold_service::classify(screening.overall_percentage, &threshold) {
            ScreeningOutcome::AutoShortlist => {
                self.advance_locked(
                    candidate_id,
                    WorkflowStep::Shortlisted,
                    Actor::System,
                    Some(format!(
                        "screening score {:.1} at or above auto-shortlist threshold {:.1}",
                        screening.overall_percentage, threshold.auto_shortlist_threshold
                    )),
                    Some(details),
                )
                .await?
            }
            ScreeningOutcome::AutoReject => {
                self.advance_locked(
                    candidate_id,
                    WorkflowStep::Rejected,
                    Actor::System,
                    Some(format!(
                        "screening score {:.1} below auto-reject threshold {:.1}",
                        screening.overall_percentage, threshold.auto_reject_threshold
                    )),
                    Some(details),
                )
                .await?
            }
            ScreeningOutcome::NeedsReview => {
                let action = self
                    .store
                    .upsert_pending_action(
                        candidate_id,
                        candidate.workflow_stage,
                        &format!(
                            "Screening score {:.1} falls between thresholds; review {} manually",
                            screening.overall_percentage, candidate.name
                        ),
                    )
                    .await?;
                tracing::info!(candidate_id = %candidate_id,
                    score = screening.overall_percentage, "screening queued for HR review");
                TransitionOutcome::Queued { action }
            }
        };

        Ok(EvaluationReport {
            screening: Some(screening),
            outcome,
        })
    }

    /// Interview feedback feeding back into the pipeline: records the
    /// score, closes the interview stage, then applies pass/fail against
    /// the configured minimum.
    pub async fn record_interview_score(
        &self,
        candidate_id: Uuid,
        score: f64,
        notes: Option<String>,
        actor: Actor,
    ) -> Result<TransitionOutcome> {
        if !(0.0..=100.0).contains(&score) {
            return Err(Error::BadRequest(format!(
                "interview score must be within [0, 100], got {}",
                score
            )));
        }

        let _guard = self.locks.acquire(candidate_id).await;
        let candidate = self.require_candidate(candidate_id).await?;

        if !matches!(
            candidate.workflow_stage,
            WorkflowStep::InterviewScheduled | WorkflowStep::InterviewCompleted
        ) {
            return Err(Error::IllegalTransition(format!(
                "interview feedback is not applicable at stage {}",
                candidate.workflow_stage
            )));
        }

        self.store.save_interview_score(candidate_id, score).await?;
        let threshold = self.thresholds.resolve(candidate.requisition_id).await?;
        let passed = score >= threshold.min_interview_score;
        let details = HistoryDetails::InterviewFeedback {
            score,
            passed,
            notes: notes.clone(),
        };

        if candidate.workflow_stage == WorkflowStep::InterviewScheduled {
            self.advance_locked(
                candidate_id,
                WorkflowStep::InterviewCompleted,
                actor.clone(),
                Some("interview feedback submitted".to_string()),
                Some(details.clone()),
            )
            .await?;
        }

        let target = if passed {
            WorkflowStep::Selected
        } else {
            WorkflowStep::Rejected
        };
        self.advance_locked(
            candidate_id,
            target,
            Actor::System,
            Some(format!(
                "interview score {:.1} {} minimum {:.1}",
                score,
                if passed { "meets" } else { "misses" },
                threshold.min_interview_score
            )),
            Some(details),
        )
        .await
    }

    /// Side channel: freezes automated transitions without touching the
    /// stage. Pausing an already-paused candidate is a no-op.
    pub async fn pause(
        &self,
        candidate_id: Uuid,
        actor: Actor,
        reason: Option<String>,
    ) -> Result<()> {
        let _guard = self.locks.acquire(candidate_id).await;
        let candidate = self.require_candidate(candidate_id).await?;
        if candidate.paused {
            return Ok(());
        }
        self.store.set_paused(candidate_id, true).await?;
        self.store
            .append_side_channel(SideChannelEntry {
                candidate_id,
                stage: candidate.workflow_stage,
                changed_by: actor.name().to_string(),
                reason,
                details: Some(HistoryDetails::Pause { paused: true }),
            })
            .await?;
        Ok(())
    }

    /// Resuming an active candidate is a no-op with no history entry.
    pub async fn resume(
        &self,
        candidate_id: Uuid,
        actor: Actor,
        reason: Option<String>,
    ) -> Result<()> {
        let _guard = self.locks.acquire(candidate_id).await;
        let candidate = self.require_candidate(candidate_id).await?;
        if !candidate.paused {
            return Ok(());
        }
        self.store.set_paused(candidate_id, false).await?;
        self.store
            .append_side_channel(SideChannelEntry {
                candidate_id,
                stage: candidate.workflow_stage,
                changed_by: actor.name().to_string(),
                reason,
                details: Some(HistoryDetails::Pause { paused: false }),
            })
            .await?;
        Ok(())
    }

    async fn send_offer_mail(&self, candidate: &Candidate) -> Result<HistoryDetails> {
        let subject = format!("Your offer letter, {}", candidate.name);
        let body = format!(
            "Dear {},\n\nPlease find your offer attached. We look forward to hearing from you.",
            candidate.name
        );
        self.mail.send(&candidate.email, &subject, &body).await?;
        Ok(HistoryDetails::OfferMail {
            recipient: candidate.email.clone(),
            delivered: true,
        })
    }

    async fn require_candidate(&self, candidate_id: Uuid) -> Result<Candidate> {
        self.store
            .get_candidate(candidate_id)
            .await?
            .ok_or_else(|| Error::NotFound("Candidate not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use reqwest::Client;

    use crate::models::candidate::NewCandidate;
    use crate::services::ai_client::AiScoringClient;
    use crate::store::memory::MemoryWorkflowStore;
    use crate::store::{NewRequisition, NewThreshold};

    fn service(store: Arc<dyn WorkflowStore>) -> TransitionService {
        let client = Client::new();
        let ai = AiScoringClient::new(client.clone(), None, None, Duration::from_secs(1));
        TransitionService::new(
            store.clone(),
            ScoringService::new(ai),
            ThresholdService::new(store),
            MailService::new(client, None),
            LockRegistry::new(),
        )
    }

    async fn seeded() -> (Arc<dyn WorkflowStore>, TransitionService, Uuid) {
        let store: Arc<dyn WorkflowStore> = Arc::new(MemoryWorkflowStore::new());
        store
            .upsert_threshold(NewThreshold {
                requisition_id: None,
                min_screening_score: 50.0,
                min_interview_score: 60.0,
                auto_shortlist_threshold: 70.0,
                auto_reject_threshold: 40.0,
            })
            .await
            .unwrap();
        let requisition = store
            .create_requisition(NewRequisition {
                title: "Backend Engineer".to_string(),
                required_skills: vec!["rust".to_string(), "sql".to_string()],
                min_experience_years: 2.0,
                max_experience_years: 6.0,
            })
            .await
            .unwrap();
        let svc = service(store.clone());
        (store, svc, requisition.id)
    }

    async fn new_candidate(
        store: &Arc<dyn WorkflowStore>,
        requisition_id: Uuid,
        skills: &str,
        years: f64,
    ) -> Uuid {
        store
            .create_candidate(NewCandidate {
                name: "Asel Karimova".to_string(),
                email: format!("{}@example.com", Uuid::new_v4()),
                phone: None,
                skills: skills.to_string(),
                experience_years: years,
                resume_text: None,
                requisition_id: Some(requisition_id),
            })
            .await
            .unwrap()
            .id
    }

    async fn walk(svc: &TransitionService, id: Uuid, steps: &[WorkflowStep]) {
        for &step in steps {
            let outcome = svc
                .advance(id, step, Actor::Human("hr@corp".to_string()), None)
                .await
                .unwrap();
            assert!(matches!(outcome, TransitionOutcome::Applied { .. }));
        }
    }

    #[tokio::test]
    async fn evaluate_auto_shortlists_a_strong_match() {
        let (store, svc, requisition_id) = seeded().await;
        let id = new_candidate(&store, requisition_id, "rust, sql", 4.0).await;

        let report = svc.evaluate(id).await.unwrap();
        let screening = report.screening.unwrap();
        assert_eq!(screening.overall_percentage, 100.0);
        assert!(matches!(report.outcome, TransitionOutcome::Applied { .. }));

        let candidate = store.get_candidate(id).await.unwrap().unwrap();
        assert_eq!(candidate.workflow_stage, WorkflowStep::Shortlisted);
        assert_eq!(candidate.screening_score, Some(100.0));

        let history = store.list_history(id).await.unwrap();
        // new_application -> ai_screening -> shortlisted, both automated.
        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|e| e.is_automated));
    }

    #[tokio::test]
    async fn evaluate_auto_rejects_a_poor_match() {
        let (store, svc, requisition_id) = seeded().await;
        let id = new_candidate(&store, requisition_id, "cobol", 15.0).await;

        let report = svc.evaluate(id).await.unwrap();
        assert!(matches!(report.outcome, TransitionOutcome::Applied { .. }));
        let candidate = store.get_candidate(id).await.unwrap().unwrap();
        assert_eq!(candidate.workflow_stage, WorkflowStep::Rejected);
        assert_eq!(candidate.status, "rejected");
    }

    #[tokio::test]
    async fn mid_band_score_queues_review_without_moving_the_stage() {
        let (store, svc, requisition_id) = seeded().await;
        // One of two skills matched, experience in range: 0.7*50 + 0.3*100 = 65.
        let id = new_candidate(&store, requisition_id, "rust", 4.0).await;

        let report = svc.evaluate(id).await.unwrap();
        assert_eq!(report.screening.unwrap().overall_percentage, 65.0);
        assert!(matches!(report.outcome, TransitionOutcome::Queued { .. }));

        let candidate = store.get_candidate(id).await.unwrap().unwrap();
        assert_eq!(candidate.workflow_stage, WorkflowStep::AiScreening);

        // Re-running the evaluation refreshes the same open action.
        svc.evaluate(id).await.unwrap();
        assert_eq!(store.list_pending_actions(10, 0).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn re_advancing_to_the_current_stage_is_a_no_op() {
        let (store, svc, requisition_id) = seeded().await;
        let id = new_candidate(&store, requisition_id, "rust", 4.0).await;

        let outcome = svc
            .advance(
                id,
                WorkflowStep::NewApplication,
                Actor::Human("hr@corp".to_string()),
                None,
            )
            .await
            .unwrap();
        assert!(matches!(outcome, TransitionOutcome::AlreadyInStage { .. }));
        assert!(store.list_history(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn skipping_stages_is_rejected() {
        let (store, svc, requisition_id) = seeded().await;
        let id = new_candidate(&store, requisition_id, "rust", 4.0).await;

        let result = svc
            .advance(
                id,
                WorkflowStep::Selected,
                Actor::Human("hr@corp".to_string()),
                None,
            )
            .await;
        assert!(matches!(result, Err(Error::IllegalTransition(_))));
    }

    #[tokio::test]
    async fn pause_suppresses_automation_but_not_humans() {
        let (store, svc, requisition_id) = seeded().await;
        let id = new_candidate(&store, requisition_id, "rust, sql", 4.0).await;

        svc.pause(id, Actor::Human("hr@corp".to_string()), Some("on hold".to_string()))
            .await
            .unwrap();

        let report = svc.evaluate(id).await.unwrap();
        assert!(report.screening.is_none());
        assert!(matches!(report.outcome, TransitionOutcome::Suppressed { .. }));
        let candidate = store.get_candidate(id).await.unwrap().unwrap();
        assert_eq!(candidate.workflow_stage, WorkflowStep::NewApplication);

        // A human can still move a paused candidate.
        let outcome = svc
            .advance(
                id,
                WorkflowStep::AiScreening,
                Actor::Human("hr@corp".to_string()),
                None,
            )
            .await
            .unwrap();
        assert!(matches!(outcome, TransitionOutcome::Applied { .. }));
    }

    #[tokio::test]
    async fn resume_and_pause_are_idempotent() {
        let (store, svc, requisition_id) = seeded().await;
        let id = new_candidate(&store, requisition_id, "rust", 4.0).await;
        let actor = Actor::Human("hr@corp".to_string());

        svc.resume(id, actor.clone(), None).await.unwrap();
        svc.pause(id, actor.clone(), None).await.unwrap();
        svc.pause(id, actor.clone(), None).await.unwrap();
        svc.resume(id, actor.clone(), None).await.unwrap();
        svc.resume(id, actor, None).await.unwrap();

        // Only the two effective toggles left a trace.
        let history = store.list_history(id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|e| e.from_stage.is_none()));
    }

    #[tokio::test]
    async fn interview_score_drives_selection_and_rejection() {
        let (store, svc, requisition_id) = seeded().await;
        let path = [
            WorkflowStep::AiScreening,
            WorkflowStep::Shortlisted,
            WorkflowStep::ScheduleInterview,
            WorkflowStep::InterviewScheduled,
        ];

        let passed = new_candidate(&store, requisition_id, "rust", 4.0).await;
        walk(&svc, passed, &path).await;
        let outcome = svc
            .record_interview_score(
                passed,
                82.0,
                Some("strong systems answers".to_string()),
                Actor::Human("hr@corp".to_string()),
            )
            .await
            .unwrap();
        assert!(matches!(outcome, TransitionOutcome::Applied { .. }));
        let candidate = store.get_candidate(passed).await.unwrap().unwrap();
        assert_eq!(candidate.workflow_stage, WorkflowStep::Selected);
        assert_eq!(candidate.interview_score, Some(82.0));

        let failed = new_candidate(&store, requisition_id, "rust", 4.0).await;
        walk(&svc, failed, &path).await;
        svc.record_interview_score(failed, 41.0, None, Actor::Human("hr@corp".to_string()))
            .await
            .unwrap();
        let candidate = store.get_candidate(failed).await.unwrap().unwrap();
        assert_eq!(candidate.workflow_stage, WorkflowStep::Rejected);
    }

    #[tokio::test]
    async fn interview_score_outside_range_or_stage_is_rejected() {
        let (store, svc, requisition_id) = seeded().await;
        let id = new_candidate(&store, requisition_id, "rust", 4.0).await;

        assert!(matches!(
            svc.record_interview_score(id, 104.0, None, Actor::Human("hr@corp".to_string()))
                .await,
            Err(Error::BadRequest(_))
        ));
        assert!(matches!(
            svc.record_interview_score(id, 80.0, None, Actor::Human("hr@corp".to_string()))
                .await,
            Err(Error::IllegalTransition(_))
        ));
    }

    #[tokio::test]
    async fn offer_mail_is_gated_on_a_human_actor() {
        let (store, svc, requisition_id) = seeded().await;
        let id = new_candidate(&store, requisition_id, "rust", 4.0).await;
        walk(
            &svc,
            id,
            &[
                WorkflowStep::AiScreening,
                WorkflowStep::Shortlisted,
                WorkflowStep::ScheduleInterview,
                WorkflowStep::InterviewScheduled,
                WorkflowStep::InterviewCompleted,
                WorkflowStep::Selected,
                WorkflowStep::CtcDiscussion,
                WorkflowStep::CtcFinalized,
                WorkflowStep::GenerateOfferLetter,
            ],
        )
        .await;

        // Entering the offer-letter stage opens an approval action.
        assert!(store.open_pending_for_candidate(id).await.unwrap().is_some());

        assert!(matches!(
            svc.advance(id, WorkflowStep::OfferSent, Actor::System, None)
                .await,
            Err(Error::IllegalTransition(_))
        ));

        let outcome = svc
            .advance(
                id,
                WorkflowStep::OfferSent,
                Actor::Human("hr@corp".to_string()),
                None,
            )
            .await
            .unwrap();
        let TransitionOutcome::Applied { entry } = outcome else {
            panic!("expected an applied transition");
        };
        assert!(matches!(
            entry.details,
            Some(HistoryDetails::OfferMail { delivered: true, .. })
        ));
        // The approval action was superseded by the move.
        assert!(store.open_pending_for_candidate(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn withdrawal_is_allowed_from_any_active_stage() {
        let (store, svc, requisition_id) = seeded().await;
        let id = new_candidate(&store, requisition_id, "rust", 4.0).await;
        walk(&svc, id, &[WorkflowStep::AiScreening, WorkflowStep::Shortlisted]).await;

        let outcome = svc
            .advance(
                id,
                WorkflowStep::Withdrawn,
                Actor::Human("hr@corp".to_string()),
                Some("candidate accepted another offer".to_string()),
            )
            .await
            .unwrap();
        assert!(matches!(outcome, TransitionOutcome::Applied { .. }));

        // Terminal stages accept no further moves.
        assert!(svc
            .advance(
                id,
                WorkflowStep::ScheduleInterview,
                Actor::Human("hr@corp".to_string()),
                None,
            )
            .await
            .is_err());
    }
}
