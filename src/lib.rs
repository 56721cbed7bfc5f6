pub mod adapters;
pub mod carrier;
pub mod cli;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod health;
pub mod middleware;
pub mod notifications;
pub mod payments;
pub mod ports;
pub mod services;
pub mod utils;
pub mod validation;

use std::sync::Arc;
use std::time::Instant;

use axum::{
    http::{header, Method},
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::health::DependencyChecker;
use crate::ports::{CarrierGateway, OrderRepository, OutboxRepository, PaymentGateway, StoreRepository};
use crate::services::{
    ArchivalService, CheckoutService, DashboardService, OrderStatusService, PaymentWebhookService,
    ShippingService,
};

/// Every outside-world dependency the HTTP surface needs.
#[derive(Clone)]
pub struct Ports {
    pub orders: Arc<dyn OrderRepository>,
    pub stores: Arc<dyn StoreRepository>,
    pub outbox: Arc<dyn OutboxRepository>,
    pub carrier: Arc<dyn CarrierGateway>,
    pub payments: Arc<dyn PaymentGateway>,
}

#[derive(Clone)]
pub struct AppState {
    pub checkout: CheckoutService,
    pub webhooks: PaymentWebhookService,
    pub archival: ArchivalService,
    pub order_status: OrderStatusService,
    pub shipping: ShippingService,
    pub dashboard: DashboardService,
    pub health_checks: Arc<[Arc<dyn DependencyChecker>]>,
    pub admin_api_key: Arc<str>,
    pub log_request_body: bool,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        ports: Ports,
        webhook_secret: String,
        admin_api_key: &str,
        health_checks: Vec<Arc<dyn DependencyChecker>>,
    ) -> Self {
        let Ports {
            orders,
            stores,
            outbox,
            carrier,
            payments,
        } = ports;

        Self {
            checkout: CheckoutService::new(
                stores.clone(),
                orders.clone(),
                outbox,
                carrier.clone(),
                payments,
            ),
            webhooks: PaymentWebhookService::new(orders.clone(), stores.clone(), webhook_secret),
            archival: ArchivalService::new(orders.clone()),
            order_status: OrderStatusService::new(orders.clone()),
            shipping: ShippingService::new(stores.clone(), carrier),
            dashboard: DashboardService::new(orders, stores),
            health_checks: health_checks.into(),
            admin_api_key: Arc::from(admin_api_key),
            log_request_body: false,
            started_at: Instant::now(),
        }
    }

    pub fn with_request_body_logging(mut self, enabled: bool) -> Self {
        self.log_request_body = enabled;
        self
    }
}

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let storefront = Router::new()
        .route(
            "/:store_id/checkout",
            post(handlers::checkout::checkout).options(handlers::checkout::checkout_options),
        )
        .route("/:store_id/orders/:order_id", get(handlers::orders::order_status))
        .route(
            "/:store_id/calculate-shipping",
            get(handlers::shipping::calculate_shipping),
        )
        .layer(cors);

    let admin = Router::new()
        .route("/admin/:store_id/dashboard", get(handlers::admin::dashboard))
        .route("/admin/:store_id/revenue-graph", get(handlers::admin::revenue_graph))
        .route("/admin/:store_id/orders", get(handlers::admin::list_orders))
        .route_layer(axum_middleware::from_fn_with_state(
            state.admin_api_key.clone(),
            middleware::admin_auth,
        ));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/webhook", post(handlers::webhook::payment_callback))
        .route("/cron", get(handlers::cron::archival_sweep))
        .merge(storefront)
        .merge(admin)
        .layer(axum_middleware::from_fn_with_state(
            state.log_request_body,
            middleware::request_logger_middleware,
        ))
        .with_state(state)
}
