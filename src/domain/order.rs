//! Order domain entity.
//! Framework-agnostic representation of one buyer transaction for one store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::store::Currency;

/// Validated buyer and destination fields captured at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Buyer {
    pub name: String,
    pub surname: String,
    pub tax_id: String,
    pub email: String,
    pub phone: String,
    pub destination: String,
    pub street: String,
    pub number: String,
    pub complement: String,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
}

impl Buyer {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.surname)
    }
}

/// Catalog data joined onto an order item when it is read back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: Uuid,
    pub name: String,
    pub size: String,
    pub images: Vec<String>,
}

impl ProductSummary {
    pub fn thumbnail(&self) -> &str {
        self.images.first().map(String::as_str).unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: Uuid,
    pub product: ProductSummary,
    /// Unit price captured from the catalog when the order was built.
    pub price: i64,
    pub quantity: i32,
}

impl OrderItem {
    pub fn subtotal(&self) -> i64 {
        self.price * i64::from(self.quantity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Unpaid,
    Paid,
    Archived,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub store_id: Uuid,
    pub code: i32,
    pub buyer: Buyer,
    pub shipping_cost: i64,
    pub currency: Currency,
    pub is_paid: bool,
    pub archived: bool,
    pub delivery_deadline: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

impl Order {
    pub fn items_total(&self) -> i64 {
        self.items.iter().map(OrderItem::subtotal).sum()
    }

    pub fn total(&self) -> i64 {
        self.items_total() + self.shipping_cost
    }

    pub fn status(&self) -> OrderStatus {
        match (self.is_paid, self.archived) {
            (_, true) => OrderStatus::Archived,
            (true, false) => OrderStatus::Paid,
            (false, false) => OrderStatus::Unpaid,
        }
    }

    /// Paid orders untouched since `cutoff` are eligible for archival.
    pub fn is_archivable(&self, cutoff: DateTime<Utc>) -> bool {
        self.is_paid && !self.archived && self.updated_at <= cutoff
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    pub product_id: Uuid,
    pub price: i64,
    pub quantity: i32,
}

/// An order ready to be persisted. The store-scoped `code` is assigned by the
/// repository inside the insert transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub id: Uuid,
    pub store_id: Uuid,
    pub buyer: Buyer,
    pub shipping_cost: i64,
    pub currency: Currency,
    pub delivery_deadline: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<NewOrderItem>,
}

impl NewOrder {
    pub fn total(&self) -> i64 {
        self.items
            .iter()
            .map(|item| item.price * i64::from(item.quantity))
            .sum::<i64>()
            + self.shipping_cost
    }
}
