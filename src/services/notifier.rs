use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{debug, error, info, warn};

use crate::notifications::OutboxEntry;
use crate::ports::{Mailer, OutboxRepository, RepositoryResult};

pub const MAX_ATTEMPTS: i32 = 10;
pub const RETRY_STEP_SECS: i64 = 30;
const BATCH_SIZE: i64 = 10;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrainReport {
    pub delivered: usize,
    pub retried: usize,
    pub abandoned: usize,
}

/// Linear backoff. `None` once the entry has used up its attempts.
pub fn next_attempt_at(now: DateTime<Utc>, attempts_after_failure: i32) -> Option<DateTime<Utc>> {
    if attempts_after_failure >= MAX_ATTEMPTS {
        return None;
    }
    Some(now + ChronoDuration::seconds(RETRY_STEP_SECS * i64::from(attempts_after_failure)))
}

/// Delivers queued emails at least once. Rows are leased while claimed, so
/// several dispatchers can share one outbox table.
#[derive(Clone)]
pub struct NotificationDispatcher {
    outbox: Arc<dyn OutboxRepository>,
    mailer: Arc<dyn Mailer>,
}

impl NotificationDispatcher {
    pub fn new(outbox: Arc<dyn OutboxRepository>, mailer: Arc<dyn Mailer>) -> Self {
        Self { outbox, mailer }
    }

    pub async fn run(self, poll_interval: Duration) {
        info!(poll_secs = poll_interval.as_secs(), "Notification dispatcher started");

        loop {
            if let Err(e) = self.drain_once(Utc::now()).await {
                error!("Notification dispatch error: {}", e);
            }

            sleep(poll_interval).await;
        }
    }

    /// One pass over the due entries.
    pub async fn drain_once(&self, now: DateTime<Utc>) -> RepositoryResult<DrainReport> {
        let due = self.outbox.claim_due(now, BATCH_SIZE).await?;
        let mut report = DrainReport::default();

        if due.is_empty() {
            return Ok(report);
        }
        debug!("Dispatching {} notification(s)", due.len());

        for entry in due {
            self.dispatch(entry, now, &mut report).await?;
        }

        Ok(report)
    }

    async fn dispatch(
        &self,
        entry: OutboxEntry,
        now: DateTime<Utc>,
        report: &mut DrainReport,
    ) -> RepositoryResult<()> {
        match self.mailer.send(&entry.message.email).await {
            Ok(()) => {
                self.outbox.mark_delivered(entry.id, Utc::now()).await?;
                debug!(key = %entry.message.idempotency_key, "Notification delivered");
                report.delivered += 1;
            }
            Err(e) => {
                let attempts = entry.attempts + 1;
                let retry_at = next_attempt_at(now, attempts);
                self.outbox.mark_failed(entry.id, &e.to_string(), retry_at).await?;

                match retry_at {
                    Some(at) => {
                        warn!(
                            key = %entry.message.idempotency_key,
                            attempts,
                            retry_at = %at,
                            error = %e,
                            "Notification delivery failed, will retry"
                        );
                        report.retried += 1;
                    }
                    None => {
                        error!(
                            key = %entry.message.idempotency_key,
                            attempts,
                            error = %e,
                            "Notification delivery abandoned"
                        );
                        report.abandoned += 1;
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_linearly() {
        let now = Utc::now();
        assert_eq!(next_attempt_at(now, 1), Some(now + ChronoDuration::seconds(30)));
        assert_eq!(next_attempt_at(now, 4), Some(now + ChronoDuration::seconds(120)));
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let now = Utc::now();
        assert!(next_attempt_at(now, MAX_ATTEMPTS - 1).is_some());
        assert!(next_attempt_at(now, MAX_ATTEMPTS).is_none());
    }
}
