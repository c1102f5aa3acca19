use crate::error::Result;
use crate::models::candidate::Candidate;
use crate::models::requisition::Requisition;
use crate::models::screening::{MatchStatus, Recommendation, ScreeningResult, SkillMatch};
use crate::models::threshold::{ScreeningOutcome, SelectionThreshold};
use crate::services::ai_client::{AiScoringClient, SkillEstimate};
use crate::services::threshold_service;

// Composite weighting: skill coverage vs experience-range fit. The same
// split is applied on both the AI and the heuristic path.
const SKILL_COVERAGE_WEIGHT: f64 = 0.7;
const EXPERIENCE_FIT_WEIGHT: f64 = 0.3;

/// Computes a match score for a candidate against requisition criteria.
/// The AI path supplies per-skill years; on failure the engine degrades
/// to deterministic substring matching and never blocks progression.
#[derive(Clone)]
pub struct ScoringService {
    ai_client: AiScoringClient,
}

impl ScoringService {
    pub fn new(ai_client: AiScoringClient) -> Self {
        Self { ai_client }
    }

    pub async fn score(
        &self,
        candidate: &Candidate,
        requisition: &Requisition,
        threshold: &SelectionThreshold,
    ) -> Result<ScreeningResult> {
        let (estimates, used_ai) = if self.ai_client.is_configured() {
            let text = candidate_text(candidate);
            match self
                .ai_client
                .extract_skill_years(&text, &requisition.required_skills)
                .await
            {
                Ok(estimates) => (estimates, true),
                Err(e) => {
                    tracing::warn!(
                        candidate_id = %candidate.id,
                        error = %e,
                        "AI scoring unavailable, using heuristic fallback"
                    );
                    (heuristic_estimates(candidate, requisition), false)
                }
            }
        } else {
            (heuristic_estimates(candidate, requisition), false)
        };

        let mut result = compose(candidate, requisition, &estimates, used_ai);
        result.recommendation =
            recommendation_for(threshold_service::classify(result.overall_percentage, threshold));
        Ok(result)
    }
}

fn candidate_text(candidate: &Candidate) -> String {
    match candidate.resume_text.as_deref() {
        Some(resume) => format!("{}\n{}", candidate.skills, resume),
        None => candidate.skills.clone(),
    }
}

/// Literal substring matching: a required skill found in the candidate's
/// skill/resume text gets the declared total years attributed, anything
/// else gets zero. Deterministic by construction.
fn heuristic_estimates(candidate: &Candidate, requisition: &Requisition) -> Vec<SkillEstimate> {
    let haystack = candidate_text(candidate).to_lowercase();
    requisition
        .required_skills
        .iter()
        .map(|skill| {
            let matched = haystack.contains(&skill.to_lowercase());
            SkillEstimate {
                skill: skill.clone(),
                years: if matched { candidate.experience_years } else { 0.0 },
                confidence: if matched { 0.5 } else { 0.0 },
            }
        })
        .collect()
}

fn compose(
    candidate: &Candidate,
    requisition: &Requisition,
    estimates: &[SkillEstimate],
    used_ai: bool,
) -> ScreeningResult {
    let mut matches = Vec::with_capacity(requisition.required_skills.len());
    let mut credit_sum = 0.0;

    for skill in &requisition.required_skills {
        let years = estimates
            .iter()
            .find(|e| e.skill.eq_ignore_ascii_case(skill))
            .map(|e| e.years)
            .unwrap_or(0.0);

        let status = if years >= requisition.min_experience_years && years > 0.0 {
            MatchStatus::Match
        } else if years > 0.0 {
            MatchStatus::Partial
        } else {
            MatchStatus::NoMatch
        };
        credit_sum += match status {
            MatchStatus::Match => 1.0,
            MatchStatus::Partial => 0.5,
            MatchStatus::NoMatch => 0.0,
        };
        matches.push(SkillMatch {
            skill: skill.clone(),
            required: true,
            candidate_years: years,
            status,
        });
    }

    let coverage = if requisition.required_skills.is_empty() {
        100.0
    } else {
        credit_sum / requisition.required_skills.len() as f64 * 100.0
    };

    let fit = experience_fit(
        candidate.experience_years,
        requisition.min_experience_years,
        requisition.max_experience_years,
    );

    let overall = (SKILL_COVERAGE_WEIGHT * coverage + EXPERIENCE_FIT_WEIGHT * fit * 100.0)
        .clamp(0.0, 100.0);

    ScreeningResult {
        matches,
        overall_percentage: (overall * 10.0).round() / 10.0,
        // Placeholder until the caller applies the threshold policy.
        recommendation: Recommendation::Review,
        used_ai,
    }
}

/// Full credit inside [min, max], half credit within one year of the
/// range, low credit otherwise.
fn experience_fit(years: f64, min: f64, max: f64) -> f64 {
    if years >= min && years <= max {
        1.0
    } else if years >= min - 1.0 && years <= max + 1.0 {
        0.5
    } else {
        0.2
    }
}

fn recommendation_for(outcome: ScreeningOutcome) -> Recommendation {
    match outcome {
        ScreeningOutcome::AutoShortlist => Recommendation::Shortlist,
        ScreeningOutcome::AutoReject => Recommendation::Reject,
        ScreeningOutcome::NeedsReview => Recommendation::Review,
    }
}
