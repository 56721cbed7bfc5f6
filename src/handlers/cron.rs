use axum::{extract::State, http::StatusCode};
use chrono::Utc;

use crate::error::AppError;
use crate::AppState;

/// Triggered by an external scheduler. The archived count only goes to the log.
pub async fn archival_sweep(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.archival.sweep(Utc::now()).await?;
    Ok(StatusCode::OK)
}
