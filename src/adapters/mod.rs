//! Postgres implementations of the repository ports.

pub mod postgres_order_repository;
pub mod postgres_outbox_repository;
pub mod postgres_store_repository;

pub use postgres_order_repository::PostgresOrderRepository;
pub use postgres_outbox_repository::PostgresOutboxRepository;
pub use postgres_store_repository::PostgresStoreRepository;

use crate::domain::Currency;

pub(crate) fn decode_currency(value: &str) -> Result<Currency, sqlx::Error> {
    value.parse::<Currency>().map_err(|e| sqlx::Error::Decode(e.into()))
}
