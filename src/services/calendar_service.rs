use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct BusyInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct BusyResponse {
    busy: Vec<BusyInterval>,
}

/// Calendar connector. Its data is advisory input to the scheduler; the
/// interview-slot store remains the authority on overlaps.
#[derive(Clone)]
pub struct CalendarService {
    client: Client,
    base_url: Option<String>,
}

impl CalendarService {
    pub fn new(client: Client, base_url: Option<String>) -> Self {
        Self { client, base_url }
    }

    /// Busy intervals for an interviewer. Degrades to an empty list when
    /// the connector is unconfigured or fails after retry, since the
    /// scheduler re-checks its own store anyway.
    pub async fn busy_intervals(
        &self,
        interviewer_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Vec<BusyInterval> {
        let Some(ref base_url) = self.base_url else {
            return Vec::new();
        };
        let url = format!(
            "{}/v1/busy?interviewer={}&from={}&to={}",
            base_url.trim_end_matches('/'),
            interviewer_id,
            from.to_rfc3339(),
            to.to_rfc3339()
        );

        for attempt in 0..2 {
            match self.fetch_once(&url).await {
                Ok(busy) => return busy,
                Err(e) => {
                    tracing::warn!(attempt, interviewer_id = %interviewer_id, error = %e,
                        "calendar busy lookup failed");
                }
            }
        }
        tracing::warn!(interviewer_id = %interviewer_id,
            "calendar connector unavailable, scheduling from slot store only");
        Vec::new()
    }

    async fn fetch_once(&self, url: &str) -> Result<Vec<BusyInterval>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::ExternalService(format!("calendar request failed: {}", e)))?;
        if !response.status().is_success() {
            return Err(Error::ExternalService(format!(
                "calendar connector returned {}",
                response.status()
            )));
        }
        let body: BusyResponse = response
            .json()
            .await
            .map_err(|e| Error::ExternalService(format!("calendar bad payload: {}", e)))?;
        Ok(body.busy)
    }
}
