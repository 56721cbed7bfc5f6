//! Applies verified payment-completed events to orders.

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::AppError;
use crate::notifications::{Confirmation, OutboxMessage};
use crate::payments::{verify_signature, PaymentEvent};
use crate::ports::{OrderRepository, PaymentTransition, RepositoryError, StoreRepository};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Verified, but not an event this service acts on.
    Ignored,
    Paid(Uuid),
    AlreadyPaid(Uuid),
    OrderMissing(Uuid),
}

#[derive(Clone)]
pub struct PaymentWebhookService {
    orders: Arc<dyn OrderRepository>,
    stores: Arc<dyn StoreRepository>,
    signing_secret: String,
}

impl PaymentWebhookService {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        stores: Arc<dyn StoreRepository>,
        signing_secret: String,
    ) -> Self {
        Self {
            orders,
            stores,
            signing_secret,
        }
    }

    /// Nothing in the payload is trusted before the signature checks out.
    pub async fn handle(&self, payload: &[u8], signature: &str) -> Result<WebhookOutcome, AppError> {
        verify_signature(payload, signature, &self.signing_secret, Utc::now().timestamp()).map_err(|e| {
            tracing::warn!(error = %e, "Rejected payment event");
            AppError::from(e)
        })?;

        let event = PaymentEvent::parse(payload)?;
        let Some(order_id) = event.completed_order_id()? else {
            tracing::debug!(event_type = %event.event_type, "Ignoring payment event");
            return Ok(WebhookOutcome::Ignored);
        };

        let notification = self.payment_confirmation(order_id).await?;
        let transition = self.orders.mark_paid(order_id, notification.as_ref()).await?;

        let outcome = match transition {
            PaymentTransition::Applied => {
                tracing::info!(order_id = %order_id, notify = notification.is_some(), "Order paid");
                WebhookOutcome::Paid(order_id)
            }
            PaymentTransition::AlreadyPaid => {
                tracing::info!(order_id = %order_id, "Payment event replayed for a paid order");
                WebhookOutcome::AlreadyPaid(order_id)
            }
            PaymentTransition::Missing => {
                tracing::warn!(order_id = %order_id, "Payment event references an unknown order");
                WebhookOutcome::OrderMissing(order_id)
            }
        };

        Ok(outcome)
    }

    /// Builds the email enqueued together with the paid transition, if the store can send one.
    async fn payment_confirmation(&self, order_id: Uuid) -> Result<Option<OutboxMessage>, AppError> {
        let Some(order) = self.orders.find(order_id).await? else {
            return Ok(None);
        };

        let branding = match self.stores.branding(order.store_id).await {
            Ok(branding) => branding,
            Err(RepositoryError::NotFound(_)) => {
                tracing::warn!(order_id = %order_id, store_id = %order.store_id, "Order store not found");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let message = OutboxMessage::confirmation(Confirmation::PaymentReceived, &order, &branding);
        if message.is_none() {
            tracing::warn!(
                order_id = %order_id,
                store_id = %order.store_id,
                "Store has no email settings, payment confirmation not sent"
            );
        }
        Ok(message)
    }
}
