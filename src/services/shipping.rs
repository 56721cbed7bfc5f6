//! Public shipping estimate for arbitrary packages.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::shipping::DEFAULT_SERVICE_CODE;
use crate::domain::{PackageProfile, RateRequest};
use crate::error::AppError;
use crate::ports::{CarrierGateway, StoreRepository};
use crate::validation::digits_only;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShippingQuery {
    pub destination: Option<String>,
    pub weight: Option<String>,
    pub length: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,
    /// Comma separated carrier service codes.
    pub codes: Option<String>,
    /// Declared value.
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShippingEstimate {
    pub shipping: EstimateLine,
    pub destination: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EstimateLine {
    /// Carrier lead time without the handling buffer added at checkout.
    pub deadline: String,
    pub price: i64,
}

fn required<'a>(value: &'a Option<String>, label: &str) -> Result<&'a str, AppError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("{} is required", label)))
}

fn measure(value: &str, label: &str) -> Result<f64, AppError> {
    value
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
        .ok_or_else(|| AppError::BadRequest(format!("{} must be a positive number", label)))
}

impl ShippingQuery {
    fn into_request(self, origin: String) -> Result<RateRequest, AppError> {
        let destination = digits_only(required(&self.destination, "Destination")?);
        let weight = required(&self.weight, "Weight")?;
        let length = required(&self.length, "Length")?;
        let width = required(&self.width, "Width")?;
        let height = required(&self.height, "Height")?;

        let package = PackageProfile {
            weight_kg: measure(weight, "Weight")?,
            length_cm: measure(length, "Length")?,
            width_cm: measure(width, "Width")?,
            height_cm: measure(height, "Height")?,
        };

        let service_codes = match self.codes.as_deref().map(str::trim) {
            Some(codes) if !codes.is_empty() => codes
                .split(',')
                .map(|code| code.trim().to_string())
                .filter(|code| !code.is_empty())
                .collect(),
            _ => vec![DEFAULT_SERVICE_CODE.to_string()],
        };

        Ok(RateRequest {
            origin,
            destination,
            package,
            service_codes,
            declared_value: self.value.unwrap_or_else(|| "0".to_string()),
        })
    }

    /// Checks presence of the required fields before any lookup happens.
    fn ensure_complete(&self) -> Result<(), AppError> {
        required(&self.destination, "Destination")?;
        required(&self.weight, "Weight")?;
        required(&self.length, "Length")?;
        required(&self.width, "Width")?;
        required(&self.height, "Height")?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct ShippingService {
    stores: Arc<dyn StoreRepository>,
    carrier: Arc<dyn CarrierGateway>,
}

impl ShippingService {
    pub fn new(stores: Arc<dyn StoreRepository>, carrier: Arc<dyn CarrierGateway>) -> Self {
        Self { stores, carrier }
    }

    pub async fn calculate(&self, store_id: Uuid, query: ShippingQuery) -> Result<ShippingEstimate, AppError> {
        query.ensure_complete()?;

        let origin = self
            .stores
            .find_store(store_id)
            .await?
            .and_then(|store| store.zip_code)
            .ok_or_else(|| AppError::Unauthenticated("Origin zip code is missing".to_string()))?;

        let request = query.into_request(origin)?;
        let (quote, destination) = tokio::join!(
            self.carrier.quote(&request),
            self.carrier.lookup_postal_code(&request.destination)
        );

        let destination = destination?
            .ok_or_else(|| AppError::BadRequest("Destination zip code is invalid".to_string()))?;
        let quote = quote?;

        Ok(ShippingEstimate {
            shipping: EstimateLine {
                deadline: format!("{} business days", quote.carrier_days()),
                price: quote.value_cents,
            },
            destination,
        })
    }
}
