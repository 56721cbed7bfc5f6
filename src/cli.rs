use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand};
use sqlx::PgPool;

use crate::adapters::{PostgresOrderRepository, PostgresOutboxRepository};
use crate::config::Config;
use crate::notifications::MailClient;
use crate::services::{ArchivalService, NotificationDispatcher};

#[derive(Parser)]
#[command(name = "storefront-core")]
#[command(about = "Storefront Core - checkout, payment and order lifecycle backend", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Database management commands
    #[command(subcommand)]
    Db(DbCommands),

    /// Archive paid orders that have been settled for the archival window
    Sweep,

    /// Notification outbox commands
    #[command(subcommand)]
    Outbox(OutboxCommands),

    /// Configuration validation
    Config,
}

#[derive(Subcommand)]
pub enum DbCommands {
    /// Run database migrations
    Migrate,
}

#[derive(Subcommand)]
pub enum OutboxCommands {
    /// Deliver every due confirmation email once and exit
    Drain,
}

pub async fn handle_db_migrate(config: &Config) -> anyhow::Result<()> {
    let pool = crate::db::create_pool(config).await?;

    tracing::info!("Running database migrations...");
    crate::db::migrate(&pool).await?;

    println!("✓ Database migrations completed");
    Ok(())
}

pub async fn handle_sweep(pool: PgPool) -> anyhow::Result<()> {
    let service = ArchivalService::new(Arc::new(PostgresOrderRepository::new(pool)));
    let archived = service.sweep(Utc::now()).await?;

    println!("✓ Archived {} orders", archived);
    Ok(())
}

pub async fn handle_outbox_drain(config: &Config, pool: PgPool) -> anyhow::Result<()> {
    let dispatcher = NotificationDispatcher::new(
        Arc::new(PostgresOutboxRepository::new(pool)),
        Arc::new(MailClient::new(
            config.mail_api_url.clone(),
            config.mail_api_key.clone(),
        )),
    );

    let report = dispatcher.drain_once(Utc::now()).await?;

    println!(
        "✓ Outbox drained: {} delivered, {} scheduled for retry, {} abandoned",
        report.delivered, report.retried, report.abandoned
    );
    Ok(())
}

pub fn handle_config_validate(config: &Config) -> anyhow::Result<()> {
    tracing::info!("Validating configuration...");
    config.validate()?;

    println!("Configuration:");
    println!("  Server Port: {}", config.server_port);
    println!("  Database URL: {}", mask_password(&config.database_url));
    println!("  Carrier API URL: {}", config.carrier_api_url);
    println!("  Postal Lookup URL: {}", config.postal_lookup_url);
    println!("  Payment API URL: {}", config.payment_api_url);
    println!("  Mail API URL: {}", config.mail_api_url);
    println!(
        "  Archival Schedule: {}",
        config.archival_schedule.as_deref().unwrap_or("external trigger")
    );
    println!("  Outbox Poll Interval: {}s", config.outbox_poll_secs);

    println!("✓ Configuration is valid");
    Ok(())
}

fn mask_password(url: &str) -> String {
    if let Some(at_pos) = url.rfind('@') {
        if let Some(colon_pos) = url[..at_pos].rfind(':') {
            if let Some(slash_pos) = url[..colon_pos].rfind("//") {
                let prefix = &url[..slash_pos + 2];
                let user = &url[slash_pos + 2..colon_pos];
                let suffix = &url[at_pos..];
                return format!("{}{}:****{}", prefix, user, suffix);
            }
        }
    }
    url.to_string()
}
