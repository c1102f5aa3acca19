use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An open position with the criteria the scoring engine matches against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Requisition {
    pub id: Uuid,
    pub title: String,
    pub required_skills: Vec<String>,
    pub min_experience_years: f64,
    pub max_experience_years: f64,
    pub created_at: DateTime<Utc>,
}
