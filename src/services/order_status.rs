use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{Order, OrderStatus};
use crate::error::AppError;
use crate::ports::OrderRepository;

/// What a buyer may see about their order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusView {
    pub customer_name: String,
    pub delivery_deadline: DateTime<Utc>,
    pub is_paid: bool,
    pub products: Vec<OrderedProduct>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderedProduct {
    pub name: String,
    pub quantity: i32,
    pub image: String,
}

impl From<&Order> for OrderStatusView {
    fn from(order: &Order) -> Self {
        Self {
            customer_name: order.buyer.name.clone(),
            delivery_deadline: order.delivery_deadline,
            is_paid: order.is_paid,
            products: order
                .items
                .iter()
                .map(|item| OrderedProduct {
                    name: item.product.name.clone(),
                    quantity: item.quantity,
                    image: item.product.thumbnail().to_string(),
                })
                .collect(),
        }
    }
}

#[derive(Clone)]
pub struct OrderStatusService {
    orders: Arc<dyn OrderRepository>,
}

impl OrderStatusService {
    pub fn new(orders: Arc<dyn OrderRepository>) -> Self {
        Self { orders }
    }

    pub async fn lookup(&self, store_id: Uuid, order_id: Uuid) -> Result<OrderStatusView, AppError> {
        let order = self
            .orders
            .find(order_id)
            .await?
            .filter(|order| order.store_id == store_id)
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

        if order.status() == OrderStatus::Archived {
            return Err(AppError::Unauthorized("Order not available".to_string()));
        }

        Ok(OrderStatusView::from(&order))
    }
}
