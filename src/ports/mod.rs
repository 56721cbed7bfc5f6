//! Seams between the order lifecycle services and the outside world.
//! Postgres and HTTP adapters implement these; tests substitute in-memory fakes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::carrier::CarrierError;
use crate::domain::{NewOrder, Order, Product, RateRequest, ShippingQuote, Store, StoreBranding};
use crate::notifications::{EmailMessage, MailError, OutboxEntry, OutboxMessage};
use crate::payments::{CheckoutSessionRequest, PaymentError};

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Outcome of flipping an order to paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentTransition {
    Applied,
    AlreadyPaid,
    Missing,
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Assigns the next store-scoped code and persists the order with its items atomically.
    async fn create(&self, order: &NewOrder) -> RepositoryResult<Order>;

    async fn find(&self, order_id: Uuid) -> RepositoryResult<Option<Order>>;

    async fn list_for_store(&self, store_id: Uuid) -> RepositoryResult<Vec<Order>>;

    /// Sets `is_paid` once. `notification` is enqueued in the same transaction,
    /// and only when the transition is applied.
    async fn mark_paid(
        &self,
        order_id: Uuid,
        notification: Option<&OutboxMessage>,
    ) -> RepositoryResult<PaymentTransition>;

    /// Archives every paid, unarchived order last updated at or before `cutoff`.
    async fn archive_settled(&self, cutoff: DateTime<Utc>) -> RepositoryResult<u64>;
}

#[async_trait]
pub trait StoreRepository: Send + Sync {
    async fn find_store(&self, store_id: Uuid) -> RepositoryResult<Option<Store>>;

    async fn branding(&self, store_id: Uuid) -> RepositoryResult<StoreBranding>;

    /// Catalog entries of `store_id` among `product_ids`. Unknown ids are simply absent.
    async fn products(&self, store_id: Uuid, product_ids: &[Uuid]) -> RepositoryResult<Vec<Product>>;

    async fn active_product_count(&self, store_id: Uuid) -> RepositoryResult<i64>;
}

#[async_trait]
pub trait OutboxRepository: Send + Sync {
    /// Returns `false` when a message with the same idempotency key already exists.
    async fn enqueue(&self, message: &OutboxMessage) -> RepositoryResult<bool>;

    /// Leases up to `limit` due entries so concurrent dispatchers skip them.
    async fn claim_due(&self, now: DateTime<Utc>, limit: i64) -> RepositoryResult<Vec<OutboxEntry>>;

    async fn mark_delivered(&self, id: Uuid, at: DateTime<Utc>) -> RepositoryResult<()>;

    /// `retry_at = None` gives up on the entry.
    async fn mark_failed(
        &self,
        id: Uuid,
        error: &str,
        retry_at: Option<DateTime<Utc>>,
    ) -> RepositoryResult<()>;
}

#[async_trait]
pub trait CarrierGateway: Send + Sync {
    async fn quote(&self, request: &RateRequest) -> Result<ShippingQuote, CarrierError>;

    /// `None` when the carrier does not know the postal code.
    async fn lookup_postal_code(
        &self,
        postal_code: &str,
    ) -> Result<Option<serde_json::Value>, CarrierError>;
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Returns the hosted checkout URL.
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<String, PaymentError>;
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError>;
}
