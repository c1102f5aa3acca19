use std::sync::Arc;

use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::threshold::{ScreeningOutcome, SelectionThreshold};
use crate::store::{NewThreshold, WorkflowStore};

/// Maps a score to an automatic outcome. Pure function of
/// `(score, thresholds)`.
pub fn classify(score: f64, threshold: &SelectionThreshold) -> ScreeningOutcome {
    if score >= threshold.auto_shortlist_threshold {
        ScreeningOutcome::AutoShortlist
    } else if score < threshold.auto_reject_threshold {
        ScreeningOutcome::AutoReject
    } else {
        ScreeningOutcome::NeedsReview
    }
}

#[derive(Clone)]
pub struct ThresholdService {
    store: Arc<dyn WorkflowStore>,
}

impl ThresholdService {
    pub fn new(store: Arc<dyn WorkflowStore>) -> Self {
        Self { store }
    }

    /// Requisition-scoped row, else the default. Missing both is an
    /// administrator problem, not something to auto-recover from.
    pub async fn resolve(&self, requisition_id: Option<Uuid>) -> Result<SelectionThreshold> {
        self.store
            .resolve_threshold(requisition_id)
            .await?
            .ok_or_else(|| {
                Error::Config("No selection threshold configured (default row missing)".to_string())
            })
    }

    pub async fn upsert(&self, threshold: NewThreshold) -> Result<SelectionThreshold> {
        validate(&threshold)?;
        self.store.upsert_threshold(threshold).await
    }

    pub async fn list(&self) -> Result<Vec<SelectionThreshold>> {
        self.store.list_thresholds().await
    }
}

fn validate(threshold: &NewThreshold) -> Result<()> {
    for (name, value) in [
        ("min_screening_score", threshold.min_screening_score),
        ("min_interview_score", threshold.min_interview_score),
        (
            "auto_shortlist_threshold",
            threshold.auto_shortlist_threshold,
        ),
        ("auto_reject_threshold", threshold.auto_reject_threshold),
    ] {
        if !(0.0..=100.0).contains(&value) {
            return Err(Error::BadRequest(format!(
                "{} must be within [0, 100], got {}",
                name, value
            )));
        }
    }
    if threshold.auto_reject_threshold >= threshold.auto_shortlist_threshold {
        return Err(Error::BadRequest(format!(
            "auto_reject_threshold ({}) must be below auto_shortlist_threshold ({})",
            threshold.auto_reject_threshold, threshold.auto_shortlist_threshold
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn threshold(reject: f64, shortlist: f64) -> SelectionThreshold {
        SelectionThreshold {
            id: Uuid::new_v4(),
            requisition_id: None,
            min_screening_score: 50.0,
            min_interview_score: 60.0,
            auto_shortlist_threshold: shortlist,
            auto_reject_threshold: reject,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn classify_boundaries_are_inclusive_exclusive_as_specified() {
        let t = threshold(40.0, 70.0);
        // score >= shortlist threshold
        assert_eq!(classify(70.0, &t), ScreeningOutcome::AutoShortlist);
        assert_eq!(classify(75.0, &t), ScreeningOutcome::AutoShortlist);
        // score < reject threshold
        assert_eq!(classify(39.9, &t), ScreeningOutcome::AutoReject);
        assert_eq!(classify(35.0, &t), ScreeningOutcome::AutoReject);
        // everything in between
        assert_eq!(classify(40.0, &t), ScreeningOutcome::NeedsReview);
        assert_eq!(classify(55.0, &t), ScreeningOutcome::NeedsReview);
        assert_eq!(classify(69.9, &t), ScreeningOutcome::NeedsReview);
    }

    #[test]
    fn classify_is_pure_over_the_whole_range() {
        let t = threshold(40.0, 70.0);
        for score in 0..=100 {
            let first = classify(score as f64, &t);
            let second = classify(score as f64, &t);
            assert_eq!(first, second);
        }
    }

    #[test]
    fn rejects_overlapping_thresholds_at_write_time() {
        let bad = NewThreshold {
            requisition_id: None,
            min_screening_score: 50.0,
            min_interview_score: 60.0,
            auto_shortlist_threshold: 40.0,
            auto_reject_threshold: 70.0,
        };
        assert!(matches!(validate(&bad), Err(Error::BadRequest(_))));

        let equal = NewThreshold {
            auto_shortlist_threshold: 50.0,
            auto_reject_threshold: 50.0,
            ..bad.clone()
        };
        assert!(validate(&equal).is_err());

        let out_of_range = NewThreshold {
            auto_shortlist_threshold: 120.0,
            auto_reject_threshold: 40.0,
            ..bad
        };
        assert!(validate(&out_of_range).is_err());
    }
}
