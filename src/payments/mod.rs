//! Hosted checkout sessions and signed payment events.

pub mod client;
pub mod event;
pub mod signature;

pub use client::PaymentClient;
pub use event::PaymentEvent;
pub use signature::{sign_payload, verify_signature, SIGNATURE_TOLERANCE_SECS};

use thiserror::Error;
use uuid::Uuid;

use crate::domain::Currency;

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("{0}")]
    InvalidSignature(String),
    #[error("Invalid payment event: {0}")]
    InvalidEvent(String),
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Payment provider error: {0}")]
    Upstream(String),
    #[error("Payment provider returned a session without a checkout URL")]
    MissingUrl,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutLineItem {
    pub name: String,
    pub images: Vec<String>,
    pub unit_amount: i64,
    pub quantity: i32,
}

/// Everything the provider needs to host the payment page for one order.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSessionRequest {
    pub order_id: Uuid,
    pub currency: Currency,
    pub line_items: Vec<CheckoutLineItem>,
    pub shipping_cost: i64,
    pub shipping_lead_days: u32,
    pub success_url: String,
    pub cancel_url: String,
    pub customer_email: String,
}

impl CheckoutSessionRequest {
    /// Provider form fields, nested keys in bracket notation.
    pub fn form_fields(&self) -> Vec<(String, String)> {
        let currency = self.currency.iso_lower();
        let mut fields = vec![("mode".to_string(), "payment".to_string())];

        for (index, item) in self.line_items.iter().enumerate() {
            let prefix = format!("line_items[{}]", index);
            fields.push((format!("{}[quantity]", prefix), item.quantity.to_string()));
            fields.push((format!("{}[price_data][currency]", prefix), currency.clone()));
            fields.push((
                format!("{}[price_data][unit_amount]", prefix),
                item.unit_amount.to_string(),
            ));
            fields.push((
                format!("{}[price_data][product_data][name]", prefix),
                item.name.clone(),
            ));
            for (image_index, image) in item.images.iter().enumerate() {
                fields.push((
                    format!("{}[price_data][product_data][images][{}]", prefix, image_index),
                    image.clone(),
                ));
            }
        }

        let rate = "shipping_options[0][shipping_rate_data]";
        fields.push((format!("{}[type]", rate), "fixed_amount".to_string()));
        fields.push((format!("{}[display_name]", rate), "Standard delivery".to_string()));
        fields.push((
            format!("{}[fixed_amount][amount]", rate),
            self.shipping_cost.to_string(),
        ));
        fields.push((format!("{}[fixed_amount][currency]", rate), currency));
        fields.push((
            format!("{}[delivery_estimate][maximum][unit]", rate),
            "business_day".to_string(),
        ));
        fields.push((
            format!("{}[delivery_estimate][maximum][value]", rate),
            self.shipping_lead_days.to_string(),
        ));

        fields.push(("success_url".to_string(), self.success_url.clone()));
        fields.push(("cancel_url".to_string(), self.cancel_url.clone()));
        fields.push(("customer_email".to_string(), self.customer_email.clone()));
        fields.push(("metadata[orderId]".to_string(), self.order_id.to_string()));

        fields
    }
}
