pub mod archival;
pub mod checkout;
pub mod dashboard;
pub mod notifier;
pub mod order_status;
pub mod payment_webhook;
pub mod scheduler;
pub mod shipping;

pub use archival::ArchivalService;
pub use checkout::{CheckoutRequest, CheckoutService, CheckoutSession};
pub use dashboard::DashboardService;
pub use notifier::NotificationDispatcher;
pub use order_status::OrderStatusService;
pub use payment_webhook::{PaymentWebhookService, WebhookOutcome};
pub use scheduler::run_archival_schedule;
pub use shipping::{ShippingQuery, ShippingService};
