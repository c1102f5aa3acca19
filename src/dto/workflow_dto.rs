use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::workflow::{Actor, WorkflowStep};

fn actor_or_console(name: Option<String>) -> Actor {
    match name {
        Some(name) if !name.trim().is_empty() => Actor::Human(name),
        _ => Actor::Human("hr-console".to_string()),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvanceStagePayload {
    pub target_step: WorkflowStep,
    pub reason: Option<String>,
    /// Who is making the call; defaults to the shared HR console
    /// identity. Transitions through this endpoint are never automated.
    pub actor: Option<String>,
}

impl AdvanceStagePayload {
    pub fn actor(&self) -> Actor {
        actor_or_console(self.actor.clone())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PausePayload {
    pub reason: Option<String>,
    pub actor: Option<String>,
}

impl PausePayload {
    pub fn actor(&self) -> Actor {
        actor_or_console(self.actor.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ResolveActionPayload {
    #[validate(length(min = 1))]
    pub resolution: String,
    pub notes: Option<String>,
    pub resolved_by: Option<String>,
}

impl ResolveActionPayload {
    pub fn actor(&self) -> Actor {
        actor_or_console(self.resolved_by.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct InterviewScorePayload {
    #[validate(range(min = 0.0, max = 100.0))]
    pub score: f64,
    pub notes: Option<String>,
    pub recorded_by: Option<String>,
}

impl InterviewScorePayload {
    pub fn actor(&self) -> Actor {
        actor_or_console(self.recorded_by.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ScheduleBatchPayload {
    pub requisition_id: Uuid,
    pub interviewer_id: Uuid,
    #[validate(length(min = 1))]
    pub candidate_ids: Vec<Uuid>,
    /// Earliest acceptable start; defaults to 24 hours from now.
    pub start: Option<DateTime<Utc>>,
    #[validate(range(min = 15, max = 240))]
    pub duration_minutes: i64,
    pub scheduled_by: Option<String>,
}

impl ScheduleBatchPayload {
    pub fn actor(&self) -> Actor {
        actor_or_console(self.scheduled_by.clone())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CancelInterviewPayload {
    pub reason: Option<String>,
    pub actor: Option<String>,
}

impl CancelInterviewPayload {
    pub fn actor(&self) -> Actor {
        actor_or_console(self.actor.clone())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PendingListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
