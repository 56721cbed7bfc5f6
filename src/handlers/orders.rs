use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppError;
use crate::services::order_status::OrderStatusView;
use crate::AppState;

pub async fn order_status(
    State(state): State<AppState>,
    Path((store_id, order_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<OrderStatusView>, AppError> {
    let view = state.order_status.lookup(store_id, order_id).await?;
    Ok(Json(view))
}
