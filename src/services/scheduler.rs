use chrono::Utc;
use cron::Schedule;
use tracing::{error, info, warn};

use super::ArchivalService;

/// Runs the archival sweep on a cron schedule, for deployments without an
/// external trigger calling `GET /cron`.
pub async fn run_archival_schedule(service: ArchivalService, schedule: Schedule) {
    info!(schedule = %schedule, "Archival schedule started");

    loop {
        let Some(next) = schedule.upcoming(Utc).next() else {
            warn!("Archival schedule has no upcoming runs, stopping");
            return;
        };

        let wait = (next - Utc::now()).to_std().unwrap_or_default();
        tokio::time::sleep(wait).await;

        if let Err(e) = service.sweep(Utc::now()).await {
            error!("Scheduled archival sweep failed: {}", e);
        }
    }
}
