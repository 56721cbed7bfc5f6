use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::AppError;
use crate::services::{CheckoutRequest, CheckoutSession};
use crate::AppState;

pub async fn checkout(
    State(state): State<AppState>,
    Path(store_id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<CheckoutSession>, AppError> {
    let request: CheckoutRequest = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid request body: {}", e)))?;

    let session = state.checkout.checkout(store_id, request).await?;
    Ok(Json(session))
}

/// Plain `OPTIONS` without preflight headers; CORS headers come from the layer.
pub async fn checkout_options() -> Json<Value> {
    Json(json!({}))
}
