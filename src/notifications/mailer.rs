use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::{EmailMessage, MailError};
use crate::ports::Mailer;

/// Client for the transactional email API (`POST {base}/emails`).
#[derive(Clone)]
pub struct MailClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl MailClient {
    pub fn new(base_url: String, api_key: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url,
            api_key,
        }
    }
}

#[async_trait]
impl Mailer for MailClient {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        let url = format!("{}/emails", self.base_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(message)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}
