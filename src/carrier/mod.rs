//! Shipping rate resolution against the external carrier service.

pub mod client;

pub use client::CarrierClient;

use serde::Deserialize;
use thiserror::Error;

use crate::domain::shipping::{HANDLING_BUFFER_DAYS, MAX_CARRIER_LEAD_DAYS};
use crate::domain::ShippingQuote;

#[derive(Error, Debug)]
pub enum CarrierError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Shipping option not found")]
    ShippingUnavailable,
    #[error("Invalid shipping response: {0}")]
    InvalidShippingResponse(String),
    #[error("Carrier error: {0}")]
    Upstream(String),
    #[error("Carrier circuit breaker is open")]
    CircuitOpen,
}

/// One option as the carrier reports it. Money uses a decimal comma (`"23,50"`).
#[derive(Debug, Clone, Deserialize)]
pub struct RawShippingOption {
    #[serde(rename = "Codigo")]
    pub code: String,
    #[serde(rename = "Valor")]
    pub value: String,
    #[serde(rename = "PrazoEntrega")]
    pub lead_days: String,
}

fn is_digits(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|ch| ch.is_ascii_digit())
}

/// `"23,50"` becomes 2350. Anything but `digits,two-digits` is rejected.
pub fn parse_money(value: &str) -> Result<i64, CarrierError> {
    let invalid = || CarrierError::InvalidShippingResponse(format!("Valor '{}' is not a price", value));

    let (units, cents) = value.split_once(',').ok_or_else(invalid)?;
    if !is_digits(units) || !is_digits(cents) || cents.len() != 2 {
        return Err(invalid());
    }

    format!("{}{}", units, cents).parse::<i64>().map_err(|_| invalid())
}

pub fn parse_lead_days(value: &str) -> Result<u32, CarrierError> {
    if !is_digits(value) {
        return Err(CarrierError::InvalidShippingResponse(format!(
            "PrazoEntrega '{}' is not a day count",
            value
        )));
    }

    value
        .parse::<u32>()
        .ok()
        .filter(|days| *days <= MAX_CARRIER_LEAD_DAYS)
        .and_then(|days| days.checked_add(HANDLING_BUFFER_DAYS))
        .ok_or_else(|| CarrierError::InvalidShippingResponse(format!("PrazoEntrega '{}' is too large", value)))
}

pub fn parse_shipping_option(raw: &RawShippingOption) -> Result<ShippingQuote, CarrierError> {
    if !is_digits(&raw.code) {
        return Err(CarrierError::InvalidShippingResponse(format!(
            "Codigo '{}' is not a service code",
            raw.code
        )));
    }

    Ok(ShippingQuote {
        value_cents: parse_money(&raw.value)?,
        lead_days: parse_lead_days(&raw.lead_days)?,
        service_code: raw.code.clone(),
    })
}

/// Picks the first option of a carrier response body.
pub fn select_option(body: serde_json::Value) -> Result<ShippingQuote, CarrierError> {
    let first = match body {
        serde_json::Value::Array(options) => options.into_iter().next(),
        serde_json::Value::Object(_) => Some(body),
        _ => {
            return Err(CarrierError::InvalidShippingResponse(
                "expected a list of options".to_string(),
            ))
        }
    };

    let first = first.ok_or(CarrierError::ShippingUnavailable)?;
    let raw: RawShippingOption = serde_json::from_value(first)
        .map_err(|e| CarrierError::InvalidShippingResponse(e.to_string()))?;

    parse_shipping_option(&raw)
}
