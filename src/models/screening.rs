use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Match,
    Partial,
    NoMatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Shortlist,
    Review,
    Reject,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::Shortlist => "shortlist",
            Recommendation::Review => "review",
            Recommendation::Reject => "reject",
        }
    }
}

/// Per-skill comparison between requisition criteria and what the
/// candidate (or the AI extraction) reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillMatch {
    pub skill: String,
    pub required: bool,
    pub candidate_years: f64,
    pub status: MatchStatus,
}

/// Output of one screening pass. Persisted on the candidate for later
/// inspection; not an independently owned entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningResult {
    pub matches: Vec<SkillMatch>,
    pub overall_percentage: f64,
    pub recommendation: Recommendation,
    /// False when the heuristic fallback produced the attribution.
    pub used_ai: bool,
}
