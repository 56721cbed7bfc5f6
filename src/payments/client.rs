use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::{CheckoutSessionRequest, PaymentError};
use crate::ports::PaymentGateway;

#[derive(Debug, Deserialize)]
struct SessionResponse {
    id: Option<String>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Creates hosted checkout sessions. Holds no per-order state.
#[derive(Clone)]
pub struct PaymentClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl PaymentClient {
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
impl PaymentGateway for PaymentClient {
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<String, PaymentError> {
        let url = format!("{}/v1/checkout/sessions", self.base_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .form(&request.form_fields())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorEnvelope>()
                .await
                .ok()
                .and_then(|envelope| envelope.error.message)
                .unwrap_or_else(|| format!("provider responded with {}", status));
            return Err(PaymentError::Upstream(message));
        }

        let session: SessionResponse = response.json().await?;
        let checkout_url = session.url.ok_or(PaymentError::MissingUrl)?;

        tracing::info!(
            order_id = %request.order_id,
            session_id = session.id.as_deref().unwrap_or_default(),
            "Checkout session created"
        );

        Ok(checkout_url)
    }
}
