//! Transactional email: rendering, the outbox payload and the mail API client.

pub mod mailer;
pub mod templates;

pub use mailer::MailClient;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{EmailCopy, EmailSettings, Order, StoreBranding};

#[derive(Error, Debug)]
pub enum MailError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Mail API rejected the message ({status}): {message}")]
    Rejected { status: u16, message: String },
}

/// One email as the mail API accepts it. Also the persisted outbox payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub reply_to: String,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    OrderPlaced,
    PaymentReceived,
}

impl Confirmation {
    fn key_prefix(&self) -> &'static str {
        match self {
            Confirmation::OrderPlaced => "order-confirmation",
            Confirmation::PaymentReceived => "payment-confirmation",
        }
    }

    fn copy<'a>(&self, settings: &'a EmailSettings) -> &'a EmailCopy {
        match self {
            Confirmation::OrderPlaced => &settings.order_confirmation,
            Confirmation::PaymentReceived => &settings.payment_confirmation,
        }
    }

    pub fn idempotency_key(&self, order_id: Uuid) -> String {
        format!("{}:{}", self.key_prefix(), order_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboxMessage {
    pub idempotency_key: String,
    pub email: EmailMessage,
}

impl OutboxMessage {
    /// `None` when the store has no email configuration.
    pub fn confirmation(kind: Confirmation, order: &Order, branding: &StoreBranding) -> Option<Self> {
        let settings = branding.email.settings()?;
        let copy = kind.copy(settings);

        Some(Self {
            idempotency_key: kind.idempotency_key(order.id),
            email: EmailMessage {
                from: settings.from.clone(),
                to: order.buyer.email.clone(),
                reply_to: settings.reply_to.clone(),
                subject: copy.subject.clone(),
                html: templates::render_confirmation(copy, settings, branding, order),
            },
        })
    }
}

/// A claimed outbox row.
#[derive(Debug, Clone)]
pub struct OutboxEntry {
    pub id: Uuid,
    pub attempts: i32,
    pub message: OutboxMessage,
}
