use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppError;
use crate::services::shipping::ShippingEstimate;
use crate::services::ShippingQuery;
use crate::AppState;

pub async fn calculate_shipping(
    State(state): State<AppState>,
    Path(store_id): Path<Uuid>,
    Query(query): Query<ShippingQuery>,
) -> Result<Json<ShippingEstimate>, AppError> {
    let estimate = state.shipping.calculate(store_id, query).await?;
    Ok(Json(estimate))
}
