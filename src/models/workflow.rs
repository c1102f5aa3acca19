use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Pipeline stages. The adjacency table in `successors` is the single
/// source of truth for legal transitions; routes never branch on stage
/// names themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStep {
    NewApplication,
    AiScreening,
    HrReviewRequired,
    Shortlisted,
    Rejected,
    ScheduleInterview,
    InterviewScheduled,
    InterviewCompleted,
    Selected,
    CtcDiscussion,
    CtcFinalized,
    GenerateOfferLetter,
    OfferSent,
    OfferAccepted,
    OfferRejected,
    Joined,
    Withdrawn,
}

impl WorkflowStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStep::NewApplication => "new_application",
            WorkflowStep::AiScreening => "ai_screening",
            WorkflowStep::HrReviewRequired => "hr_review_required",
            WorkflowStep::Shortlisted => "shortlisted",
            WorkflowStep::Rejected => "rejected",
            WorkflowStep::ScheduleInterview => "schedule_interview",
            WorkflowStep::InterviewScheduled => "interview_scheduled",
            WorkflowStep::InterviewCompleted => "interview_completed",
            WorkflowStep::Selected => "selected",
            WorkflowStep::CtcDiscussion => "ctc_discussion",
            WorkflowStep::CtcFinalized => "ctc_finalized",
            WorkflowStep::GenerateOfferLetter => "generate_offer_letter",
            WorkflowStep::OfferSent => "offer_sent",
            WorkflowStep::OfferAccepted => "offer_accepted",
            WorkflowStep::OfferRejected => "offer_rejected",
            WorkflowStep::Joined => "joined",
            WorkflowStep::Withdrawn => "withdrawn",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WorkflowStep::Rejected
                | WorkflowStep::OfferRejected
                | WorkflowStep::Joined
                | WorkflowStep::Withdrawn
        )
    }

    /// Legal forward edges. Withdrawal is handled separately in
    /// `can_advance_to` since it is reachable from every non-terminal stage.
    pub fn successors(&self) -> &'static [WorkflowStep] {
        use WorkflowStep::*;
        match self {
            NewApplication => &[AiScreening],
            AiScreening => &[Shortlisted, HrReviewRequired, Rejected],
            HrReviewRequired => &[Shortlisted, Rejected],
            Shortlisted => &[ScheduleInterview],
            ScheduleInterview => &[InterviewScheduled],
            // Rescheduling steps back to schedule_interview.
            InterviewScheduled => &[InterviewCompleted, ScheduleInterview],
            InterviewCompleted => &[Selected, Rejected, HrReviewRequired],
            Selected => &[CtcDiscussion],
            CtcDiscussion => &[CtcFinalized],
            CtcFinalized => &[GenerateOfferLetter],
            GenerateOfferLetter => &[OfferSent],
            OfferSent => &[OfferAccepted, OfferRejected],
            OfferAccepted => &[Joined],
            Rejected | OfferRejected | Joined | Withdrawn => &[],
        }
    }

    pub fn can_advance_to(&self, target: WorkflowStep) -> bool {
        if target == WorkflowStep::Withdrawn {
            return !self.is_terminal();
        }
        self.successors().contains(&target)
    }

    /// Cached candidate status family mirrored from the stage.
    pub fn status_label(&self) -> &'static str {
        use WorkflowStep::*;
        match self {
            NewApplication | AiScreening | HrReviewRequired => "new",
            Shortlisted | ScheduleInterview | InterviewScheduled | InterviewCompleted => {
                "shortlisted"
            }
            Rejected => "rejected",
            Selected | CtcDiscussion | CtcFinalized => "selected",
            GenerateOfferLetter | OfferSent => "offer_pending",
            OfferAccepted => "offer_accepted",
            OfferRejected => "offer_rejected",
            Joined => "joined",
            Withdrawn => "withdrawn",
        }
    }
}

impl std::str::FromStr for WorkflowStep {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use WorkflowStep::*;
        Ok(match s {
            "new_application" => NewApplication,
            "ai_screening" => AiScreening,
            "hr_review_required" => HrReviewRequired,
            "shortlisted" => Shortlisted,
            "rejected" => Rejected,
            "schedule_interview" => ScheduleInterview,
            "interview_scheduled" => InterviewScheduled,
            "interview_completed" => InterviewCompleted,
            "selected" => Selected,
            "ctc_discussion" => CtcDiscussion,
            "ctc_finalized" => CtcFinalized,
            "generate_offer_letter" => GenerateOfferLetter,
            "offer_sent" => OfferSent,
            "offer_accepted" => OfferAccepted,
            "offer_rejected" => OfferRejected,
            "joined" => Joined,
            "withdrawn" => Withdrawn,
            other => return Err(format!("unknown workflow step: {}", other)),
        })
    }
}

impl std::fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who requested a transition. Automated transitions carry `System`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "name")]
pub enum Actor {
    System,
    Human(String),
}

impl Actor {
    pub fn name(&self) -> &str {
        match self {
            Actor::System => "system",
            Actor::Human(name) => name,
        }
    }

    pub fn is_system(&self) -> bool {
        matches!(self, Actor::System)
    }
}

/// One open record per candidate; `completed_at` is set when the stage
/// is left. At most one record per candidate has `completed_at = NULL`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowStageRecord {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub current_stage: WorkflowStep,
    pub previous_stage: Option<WorkflowStep>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub updated_by: String,
}

/// Structured per-event metadata, persisted as JSONB for audit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HistoryDetails {
    Screening {
        overall_percentage: f64,
        recommendation: String,
        used_ai: bool,
    },
    InterviewFeedback {
        score: f64,
        passed: bool,
        notes: Option<String>,
    },
    Scheduling {
        interviewer_id: Uuid,
        slot_start: DateTime<Utc>,
        slot_end: DateTime<Utc>,
    },
    HrDecision {
        action_id: Uuid,
        resolution: String,
        notes: Option<String>,
    },
    Pause {
        paused: bool,
    },
    OfferMail {
        recipient: String,
        delivered: bool,
    },
}

/// Append-only audit log entry. Never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowHistoryEntry {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub from_stage: Option<WorkflowStep>,
    pub to_stage: WorkflowStep,
    pub changed_by: String,
    pub is_automated: bool,
    pub reason: Option<String>,
    pub details: Option<HistoryDetails>,
    pub created_at: DateTime<Utc>,
}

/// A stage transition blocked on a human decision. A candidate has at
/// most one open action at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingAction {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub stage: WorkflowStep,
    pub prompt: String,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolution: Option<String>,
    pub resolution_notes: Option<String>,
    pub resolved_by: Option<String>,
}

impl PendingAction {
    pub fn is_open(&self) -> bool {
        self.resolved_at.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn round_trips_step_names() {
        let steps = [
            WorkflowStep::NewApplication,
            WorkflowStep::HrReviewRequired,
            WorkflowStep::CtcFinalized,
            WorkflowStep::OfferSent,
            WorkflowStep::Withdrawn,
        ];
        for step in steps {
            assert_eq!(WorkflowStep::from_str(step.as_str()).unwrap(), step);
        }
        assert!(WorkflowStep::from_str("escaped").is_err());
    }

    #[test]
    fn terminal_stages_have_no_successors() {
        for step in [
            WorkflowStep::Rejected,
            WorkflowStep::OfferRejected,
            WorkflowStep::Joined,
            WorkflowStep::Withdrawn,
        ] {
            assert!(step.is_terminal());
            assert!(step.successors().is_empty());
            assert!(!step.can_advance_to(WorkflowStep::Withdrawn));
        }
    }

    #[test]
    fn withdrawal_is_reachable_from_any_open_stage() {
        assert!(WorkflowStep::NewApplication.can_advance_to(WorkflowStep::Withdrawn));
        assert!(WorkflowStep::OfferSent.can_advance_to(WorkflowStep::Withdrawn));
        assert!(!WorkflowStep::Joined.can_advance_to(WorkflowStep::Withdrawn));
    }

    #[test]
    fn review_feeds_into_shortlist_or_reject() {
        let next = WorkflowStep::HrReviewRequired.successors();
        assert_eq!(next, &[WorkflowStep::Shortlisted, WorkflowStep::Rejected]);
        assert!(!WorkflowStep::HrReviewRequired.can_advance_to(WorkflowStep::Joined));
    }
}
