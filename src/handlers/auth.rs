use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
};

use crate::error::AppError;

pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Raw webhook body plus the provider signature header. The body is kept
/// byte-exact because the signature covers it.
pub struct SignedWebhook {
    pub body: Bytes,
    pub signature: String,
}

#[async_trait]
impl<S> FromRequest<S> for SignedWebhook
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let signature = req
            .headers()
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                tracing::warn!("Webhook request without signature header");
                AppError::InvalidSignature("No signatures found with expected scheme".to_string())
            })?;

        let body = Bytes::from_request(req, state)
            .await
            .map_err(|_| AppError::BadRequest("Failed to read request body".to_string()))?;

        Ok(SignedWebhook { body, signature })
    }
}
