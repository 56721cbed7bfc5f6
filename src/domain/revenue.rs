//! Dashboard aggregates over paid orders.
//! Amounts in different currencies are never converted; each currency keeps its own sum.

use chrono::{Datelike, Month};
use serde::Serialize;
use std::collections::BTreeMap;

use super::order::Order;
use super::store::Currency;

pub type RevenueByCurrency = BTreeMap<Currency, i64>;

/// Item revenue of paid orders, grouped by currency. Shipping is not revenue.
pub fn total_revenue(orders: &[Order]) -> RevenueByCurrency {
    let mut totals = RevenueByCurrency::new();
    for order in orders.iter().filter(|order| order.is_paid) {
        *totals.entry(order.currency).or_insert(0) += order.items_total();
    }
    totals
}

pub fn sales_count(orders: &[Order]) -> usize {
    orders.iter().filter(|order| order.is_paid).count()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphPoint {
    pub name: String,
    pub total: RevenueByCurrency,
}

/// Twelve monthly buckets for `year`, January first, months without sales included.
pub fn monthly_revenue(orders: &[Order], year: i32) -> Vec<GraphPoint> {
    let mut buckets: Vec<RevenueByCurrency> = vec![RevenueByCurrency::new(); 12];

    for order in orders
        .iter()
        .filter(|order| order.is_paid && order.created_at.year() == year)
    {
        let month = order.created_at.month0() as usize;
        *buckets[month].entry(order.currency).or_insert(0) += order.items_total();
    }

    buckets
        .into_iter()
        .enumerate()
        .map(|(index, total)| GraphPoint {
            name: month_label(index as u8 + 1),
            total,
        })
        .collect()
}

fn month_label(month: u8) -> String {
    Month::try_from(month)
        .map(|m| m.name()[..3].to_string())
        .unwrap_or_default()
}
