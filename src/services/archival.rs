use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use crate::error::AppError;
use crate::ports::OrderRepository;

/// Paid orders stay publicly visible for this long after their last update.
pub const ARCHIVAL_WINDOW_DAYS: i64 = 2;

/// Hides settled orders from the public status lookup. Stateless and idempotent,
/// so overlapping runs are harmless.
#[derive(Clone)]
pub struct ArchivalService {
    orders: Arc<dyn OrderRepository>,
}

impl ArchivalService {
    pub fn new(orders: Arc<dyn OrderRepository>) -> Self {
        Self { orders }
    }

    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let cutoff = now - Duration::days(ARCHIVAL_WINDOW_DAYS);
        let archived = self.orders.archive_settled(cutoff).await?;

        if archived > 0 {
            tracing::info!(archived, cutoff = %cutoff, "Archived settled orders");
        } else {
            tracing::debug!(cutoff = %cutoff, "No orders to archive");
        }

        Ok(archived)
    }
}
