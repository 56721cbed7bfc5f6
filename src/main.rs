use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront_core::adapters::{
    PostgresOrderRepository, PostgresOutboxRepository, PostgresStoreRepository,
};
use storefront_core::carrier::CarrierClient;
use storefront_core::cli::{self, Cli, Commands, DbCommands, OutboxCommands};
use storefront_core::config::Config;
use storefront_core::health::{CarrierChecker, DependencyChecker, PostgresChecker};
use storefront_core::notifications::MailClient;
use storefront_core::payments::PaymentClient;
use storefront_core::services::{run_archival_schedule, ArchivalService, NotificationDispatcher};
use storefront_core::{create_app, db, AppState, Ports};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::Db(DbCommands::Migrate) => cli::handle_db_migrate(&config).await,
        Commands::Sweep => cli::handle_sweep(db::create_pool(&config).await?).await,
        Commands::Outbox(OutboxCommands::Drain) => {
            let pool = db::create_pool(&config).await?;
            cli::handle_outbox_drain(&config, pool).await
        }
        Commands::Config => cli::handle_config_validate(&config),
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    config.validate()?;

    let pool = db::create_pool(&config).await?;
    db::migrate(&pool).await?;

    let carrier = CarrierClient::new(
        config.carrier_api_url.clone(),
        config.postal_lookup_url.clone(),
    );
    tracing::info!("Carrier client initialized with URL: {}", config.carrier_api_url);

    let orders = Arc::new(PostgresOrderRepository::new(pool.clone()));
    let outbox = Arc::new(PostgresOutboxRepository::new(pool.clone()));

    let ports = Ports {
        orders: orders.clone(),
        stores: Arc::new(PostgresStoreRepository::new(pool.clone())),
        outbox: outbox.clone(),
        carrier: Arc::new(carrier.clone()),
        payments: Arc::new(PaymentClient::new(
            config.payment_api_url.clone(),
            config.payment_api_key.clone(),
        )),
    };

    let health_checks: Vec<Arc<dyn DependencyChecker>> = vec![
        Arc::new(PostgresChecker::new(pool.clone())),
        Arc::new(CarrierChecker::new(carrier)),
    ];

    let dispatcher = NotificationDispatcher::new(
        outbox,
        Arc::new(MailClient::new(
            config.mail_api_url.clone(),
            config.mail_api_key.clone(),
        )),
    );
    tokio::spawn(dispatcher.run(tokio::time::Duration::from_secs(config.outbox_poll_secs)));

    if let Some(expression) = config.archival_schedule.as_deref() {
        let schedule = cron::Schedule::from_str(expression)
            .map_err(|e| anyhow::anyhow!("Invalid ARCHIVAL_SCHEDULE '{}': {}", expression, e))?;
        tokio::spawn(run_archival_schedule(ArchivalService::new(orders), schedule));
    }

    let state = AppState::new(
        ports,
        config.payment_webhook_secret.clone(),
        &config.admin_api_key,
        health_checks,
    )
    .with_request_body_logging(config.log_request_body);
    let app = create_app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
