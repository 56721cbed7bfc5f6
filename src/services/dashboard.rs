//! Back-office read models for a store owner.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::revenue::{monthly_revenue, sales_count, total_revenue, GraphPoint, RevenueByCurrency};
use crate::domain::{Currency, Order};
use crate::error::AppError;
use crate::ports::{OrderRepository, StoreRepository};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_revenue: RevenueByCurrency,
    pub sales_count: usize,
    pub active_products: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub id: Uuid,
    pub code: i32,
    pub customer: String,
    pub phone: String,
    pub address: String,
    pub products: String,
    pub total: i64,
    pub currency: Currency,
    pub is_paid: bool,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Order> for OrderSummary {
    fn from(order: &Order) -> Self {
        let buyer = &order.buyer;
        let address = [
            buyer.street.as_str(),
            buyer.number.as_str(),
            buyer.complement.as_str(),
            buyer.neighborhood.as_str(),
            buyer.city.as_str(),
            buyer.state.as_str(),
            buyer.destination.as_str(),
        ]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(", ");

        Self {
            id: order.id,
            code: order.code,
            customer: buyer.full_name(),
            phone: buyer.phone.clone(),
            address,
            products: order
                .items
                .iter()
                .map(|item| item.product.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            total: order.total(),
            currency: order.currency,
            is_paid: order.is_paid,
            archived: order.archived,
            created_at: order.created_at,
        }
    }
}

#[derive(Clone)]
pub struct DashboardService {
    orders: Arc<dyn OrderRepository>,
    stores: Arc<dyn StoreRepository>,
}

impl DashboardService {
    pub fn new(orders: Arc<dyn OrderRepository>, stores: Arc<dyn StoreRepository>) -> Self {
        Self { orders, stores }
    }

    async fn store_orders(&self, store_id: Uuid) -> Result<Vec<Order>, AppError> {
        self.stores
            .find_store(store_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Store not found".to_string()))?;

        Ok(self.orders.list_for_store(store_id).await?)
    }

    pub async fn summary(&self, store_id: Uuid) -> Result<DashboardSummary, AppError> {
        let orders = self.store_orders(store_id).await?;
        let active_products = self.stores.active_product_count(store_id).await?;

        Ok(DashboardSummary {
            total_revenue: total_revenue(&orders),
            sales_count: sales_count(&orders),
            active_products,
        })
    }

    pub async fn revenue_graph(&self, store_id: Uuid, year: i32) -> Result<Vec<GraphPoint>, AppError> {
        let orders = self.store_orders(store_id).await?;
        Ok(monthly_revenue(&orders, year))
    }

    pub async fn orders(&self, store_id: Uuid) -> Result<Vec<OrderSummary>, AppError> {
        let orders = self.store_orders(store_id).await?;
        Ok(orders.iter().map(OrderSummary::from).collect())
    }
}
