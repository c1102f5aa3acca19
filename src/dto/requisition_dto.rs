use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::requisition::Requisition;
use crate::store::NewRequisition;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateRequisitionPayload {
    #[validate(length(min = 1))]
    pub title: String,
    #[validate(length(min = 1))]
    pub required_skills: Vec<String>,
    #[validate(range(min = 0.0, max = 60.0))]
    pub min_experience_years: f64,
    #[validate(range(min = 0.0, max = 60.0))]
    pub max_experience_years: f64,
}

impl From<CreateRequisitionPayload> for NewRequisition {
    fn from(value: CreateRequisitionPayload) -> Self {
        Self {
            title: value.title,
            required_skills: value.required_skills,
            min_experience_years: value.min_experience_years,
            max_experience_years: value.max_experience_years,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequisitionResponse {
    pub id: Uuid,
    pub title: String,
    pub required_skills: Vec<String>,
    pub min_experience_years: f64,
    pub max_experience_years: f64,
    pub created_at: DateTime<Utc>,
}

impl From<Requisition> for RequisitionResponse {
    fn from(value: Requisition) -> Self {
        Self {
            id: value.id,
            title: value.title,
            required_skills: value.required_skills,
            min_experience_years: value.min_experience_years,
            max_experience_years: value.max_experience_years,
            created_at: value.created_at,
        }
    }
}
