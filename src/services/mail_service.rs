use reqwest::Client;
use serde::Serialize;

use crate::error::{Error, Result};

#[derive(Debug, Serialize)]
struct SendMailRequest<'a> {
    to: &'a str,
    subject: &'a str,
    body: &'a str,
}

/// Outbound mail connector. Only invoked behind the human offer gate;
/// the engine never sends mail on a purely automated path.
#[derive(Clone)]
pub struct MailService {
    client: Client,
    base_url: Option<String>,
}

impl MailService {
    pub fn new(client: Client, base_url: Option<String>) -> Self {
        Self { client, base_url }
    }

    pub async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let Some(ref base_url) = self.base_url else {
            tracing::info!(recipient = to, "mail connector not configured, skipping delivery");
            return Ok(());
        };
        let url = format!("{}/v1/send", base_url.trim_end_matches('/'));
        let request = SendMailRequest { to, subject, body };

        let mut last_error = None;
        for attempt in 0..2 {
            match self.send_once(&url, &request).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::warn!(attempt, recipient = to, error = %e, "mail send failed");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error
            .unwrap_or_else(|| Error::ExternalService("mail connector unavailable".into())))
    }

    async fn send_once(&self, url: &str, request: &SendMailRequest<'_>) -> Result<()> {
        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| Error::ExternalService(format!("mail send request failed: {}", e)))?;
        if !response.status().is_success() {
            return Err(Error::ExternalService(format!(
                "mail connector returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}
