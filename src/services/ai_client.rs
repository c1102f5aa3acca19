use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};

/// Request contract of the external scoring/extraction service:
/// candidate free text plus the requisition skill list.
#[derive(Debug, Serialize)]
pub struct ExtractionRequest<'a> {
    pub candidate_text: &'a str,
    pub skills: &'a [String],
}

/// Per-skill estimated years with a confidence figure.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SkillEstimate {
    pub skill: String,
    pub years: f64,
    pub confidence: f64,
}

#[derive(Debug, Deserialize)]
struct ExtractionResponse {
    estimates: Vec<SkillEstimate>,
}

/// Thin client for the AI scoring service. Bounded timeout, one retry;
/// every failure is surfaced as `ExternalService` so the caller can
/// degrade to the heuristic path.
#[derive(Clone)]
pub struct AiScoringClient {
    client: Client,
    base_url: Option<String>,
    api_key: Option<String>,
}

impl AiScoringClient {
    pub fn new(
        client: Client,
        base_url: Option<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Self {
        // A dedicated client keeps the timeout bound even if the shared
        // one is configured differently.
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or(client);
        Self {
            client,
            base_url,
            api_key,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }

    pub async fn extract_skill_years(
        &self,
        candidate_text: &str,
        skills: &[String],
    ) -> Result<Vec<SkillEstimate>> {
        let base_url = self
            .base_url
            .as_deref()
            .ok_or_else(|| Error::ExternalService("AI scoring service not configured".into()))?;
        let url = format!("{}/v1/extract", base_url.trim_end_matches('/'));
        let request = ExtractionRequest {
            candidate_text,
            skills,
        };

        let mut last_error = None;
        for attempt in 0..2 {
            match self.post_once(&url, &request).await {
                Ok(estimates) => return Ok(estimates),
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "AI extraction call failed");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| Error::ExternalService("AI extraction failed".into())))
    }

    async fn post_once(
        &self,
        url: &str,
        request: &ExtractionRequest<'_>,
    ) -> Result<Vec<SkillEstimate>> {
        let mut builder = self.client.post(url).json(request);
        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::ExternalService(format!("AI extraction request failed: {}", e)))?;
        if !response.status().is_success() {
            return Err(Error::ExternalService(format!(
                "AI extraction returned {}",
                response.status()
            )));
        }

        let body: ExtractionResponse = response
            .json()
            .await
            .map_err(|e| Error::ExternalService(format!("AI extraction bad payload: {}", e)))?;
        Ok(body.estimates)
    }
}
