use axum::{extract::State, http::StatusCode};

use super::auth::SignedWebhook;
use crate::error::AppError;
use crate::AppState;

/// Payment provider callback. Any 2xx tells the provider to stop redelivering.
pub async fn payment_callback(
    State(state): State<AppState>,
    webhook: SignedWebhook,
) -> Result<StatusCode, AppError> {
    let outcome = state.webhooks.handle(&webhook.body, &webhook.signature).await?;
    tracing::debug!(?outcome, "Payment event processed");
    Ok(StatusCode::OK)
}
