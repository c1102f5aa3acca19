use std::sync::Arc;

use uuid::Uuid;

use crate::error::Result;
use crate::models::workflow::{Actor, HistoryDetails, PendingAction};
use crate::store::{SideChannelEntry, WorkflowStore};

/// HR work queue: everything the automated pipeline could not decide on
/// its own ends up here.
#[derive(Clone)]
pub struct PendingService {
    store: Arc<dyn WorkflowStore>,
}

impl PendingService {
    pub fn new(store: Arc<dyn WorkflowStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<PendingAction>> {
        let limit = limit.clamp(1, 200);
        let offset = offset.max(0);
        self.store.list_pending_actions(limit, offset).await
    }

    /// Marks the action resolved and records the decision in the
    /// candidate's history. Resolving an unknown or already-resolved
    /// action fails with `NotFound`.
    pub async fn resolve(
        &self,
        action_id: Uuid,
        resolution: &str,
        notes: Option<String>,
        actor: Actor,
    ) -> Result<PendingAction> {
        let action = self
            .store
            .resolve_pending_action(action_id, resolution, notes.clone(), actor.name())
            .await?;

        self.store
            .append_side_channel(SideChannelEntry {
                candidate_id: action.candidate_id,
                stage: action.stage,
                changed_by: actor.name().to_string(),
                reason: Some(format!("pending action resolved: {}", resolution)),
                details: Some(HistoryDetails::HrDecision {
                    action_id,
                    resolution: resolution.to_string(),
                    notes,
                }),
            })
            .await?;

        tracing::info!(action_id = %action_id, candidate_id = %action.candidate_id,
            resolution, "pending action resolved");
        Ok(action)
    }
}
