pub mod admin;
pub mod auth;
pub mod checkout;
pub mod cron;
pub mod orders;
pub mod shipping;
pub mod webhook;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::health::check_health;
use crate::AppState;

/// 503 when a critical dependency is down, 200 otherwise (also when degraded).
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let response = check_health(&state.health_checks, state.started_at).await;

    let status_code = if response.is_unhealthy() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (status_code, Json(response))
}
