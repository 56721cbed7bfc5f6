use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{Datelike, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::revenue::GraphPoint;
use crate::error::AppError;
use crate::services::dashboard::{DashboardSummary, OrderSummary};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct GraphParams {
    pub year: Option<i32>,
}

pub async fn dashboard(
    State(state): State<AppState>,
    Path(store_id): Path<Uuid>,
) -> Result<Json<DashboardSummary>, AppError> {
    Ok(Json(state.dashboard.summary(store_id).await?))
}

pub async fn revenue_graph(
    State(state): State<AppState>,
    Path(store_id): Path<Uuid>,
    Query(params): Query<GraphParams>,
) -> Result<Json<Vec<GraphPoint>>, AppError> {
    let year = params.year.unwrap_or_else(|| Utc::now().year());
    Ok(Json(state.dashboard.revenue_graph(store_id, year).await?))
}

pub async fn list_orders(
    State(state): State<AppState>,
    Path(store_id): Path<Uuid>,
) -> Result<Json<Vec<OrderSummary>>, AppError> {
    Ok(Json(state.dashboard.orders(store_id).await?))
}
