//! Order builder: validates a storefront checkout, prices it, persists the
//! unpaid order and hands the buyer over to the payment provider.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::carrier::CarrierError;
use crate::domain::shipping::DEFAULT_SERVICE_CODE;
use crate::domain::{Buyer, NewOrder, NewOrderItem, Order, PackageProfile, RateRequest};
use crate::error::AppError;
use crate::notifications::{Confirmation, OutboxMessage};
use crate::payments::{CheckoutLineItem, CheckoutSessionRequest};
use crate::ports::{CarrierGateway, OrderRepository, OutboxRepository, PaymentGateway, StoreRepository};
use crate::validation::{
    required_text, sanitize_string, validate_email, validate_max_len, validate_phone,
    validate_postal_code, validate_state_code, validate_tax_id, ValidationError,
    ValidationResult, TEXT_MAX_LEN,
};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub products: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub shipping: Option<ShippingPayload>,
}

/// Buyer address as posted by the storefront. Field names of the legacy
/// storefront are accepted as aliases.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ShippingPayload {
    pub destination: String,
    #[serde(alias = "localidade")]
    pub city: String,
    #[serde(alias = "logradouro")]
    pub street: String,
    #[serde(alias = "bairro")]
    pub neighborhood: String,
    #[serde(alias = "complemento")]
    pub complement: String,
    #[serde(alias = "numero")]
    pub number: String,
    #[serde(alias = "uf")]
    pub state: String,
    pub name: String,
    pub surname: String,
    #[serde(alias = "cpf")]
    pub tax_id: String,
    pub email: String,
    pub phone: String,
}

impl ShippingPayload {
    /// Normalises every field, stopping at the first violation.
    pub fn validate(&self) -> ValidationResult<Buyer> {
        let destination = validate_postal_code("destination", &self.destination)?;
        let city = required_text("city", &self.city)?;
        let street = required_text("street", &self.street)?;
        let neighborhood = required_text("neighborhood", &self.neighborhood)?;
        let complement = sanitize_string(&self.complement);
        validate_max_len("complement", &complement, TEXT_MAX_LEN)?;
        let number = required_text("number", &self.number)?;
        let state = validate_state_code("state", &self.state)?;
        let name = required_text("name", &self.name)?;
        let surname = required_text("surname", &self.surname)?;
        let tax_id = validate_tax_id("taxId", &self.tax_id)?;
        let email = validate_email("email", &self.email)?;
        let phone = validate_phone("phone", &self.phone)?;

        Ok(Buyer {
            name,
            surname,
            tax_id,
            email,
            phone,
            destination,
            street,
            number,
            complement,
            neighborhood,
            city,
            state,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestedProduct {
    pub id: Uuid,
    pub quantity: i32,
}

pub fn validate_products(products: &[serde_json::Value]) -> ValidationResult<Vec<RequestedProduct>> {
    products
        .iter()
        .enumerate()
        .map(|(index, product)| {
            let id = product
                .get("id")
                .and_then(|id| id.as_str())
                .and_then(|id| Uuid::parse_str(id).ok())
                .ok_or_else(|| ValidationError::new(format!("products[{}].id", index), "must be a valid id"))?;

            let quantity = product
                .get("quantity")
                .and_then(|quantity| quantity.as_i64())
                .filter(|quantity| *quantity > 0 && *quantity <= i64::from(i32::MAX))
                .ok_or_else(|| {
                    ValidationError::new(
                        format!("products[{}].quantity", index),
                        "must be a positive integer",
                    )
                })?;

            Ok(RequestedProduct {
                id,
                quantity: quantity as i32,
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutSession {
    pub url: String,
    #[serde(skip)]
    pub order_id: Uuid,
}

/// Deadline promised to the buyer. Day counts beyond the calendar are a bad carrier answer.
fn delivery_deadline(now: DateTime<Utc>, lead_days: u32) -> Result<DateTime<Utc>, CarrierError> {
    now.checked_add_signed(Duration::days(i64::from(lead_days)))
        .ok_or_else(|| {
            CarrierError::InvalidShippingResponse(format!("lead time of {} days is out of range", lead_days))
        })
}

#[derive(Clone)]
pub struct CheckoutService {
    stores: Arc<dyn StoreRepository>,
    orders: Arc<dyn OrderRepository>,
    outbox: Arc<dyn OutboxRepository>,
    carrier: Arc<dyn CarrierGateway>,
    payments: Arc<dyn PaymentGateway>,
}

impl CheckoutService {
    pub fn new(
        stores: Arc<dyn StoreRepository>,
        orders: Arc<dyn OrderRepository>,
        outbox: Arc<dyn OutboxRepository>,
        carrier: Arc<dyn CarrierGateway>,
        payments: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            stores,
            orders,
            outbox,
            carrier,
            payments,
        }
    }

    pub async fn checkout(&self, store_id: Uuid, request: CheckoutRequest) -> Result<CheckoutSession, AppError> {
        let requested = match request.products.as_deref() {
            Some(products) if !products.is_empty() => validate_products(products)?,
            _ => return Err(AppError::BadRequest("Product ids are required".to_string())),
        };
        let buyer = request
            .shipping
            .as_ref()
            .ok_or_else(|| AppError::BadRequest("Shipping is required".to_string()))?
            .validate()?;

        let store = self
            .stores
            .find_store(store_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Store not found".to_string()))?;
        let origin = store
            .zip_code
            .clone()
            .ok_or_else(|| AppError::Unauthenticated("Origin zip code is missing".to_string()))?;

        let quote = self
            .carrier
            .quote(&RateRequest {
                origin,
                destination: buyer.destination.clone(),
                package: PackageProfile::checkout(),
                service_codes: vec![DEFAULT_SERVICE_CODE.to_string()],
                declared_value: "0".to_string(),
            })
            .await?;

        let product_ids: Vec<Uuid> = requested.iter().map(|product| product.id).collect();
        let catalog = self.stores.products(store_id, &product_ids).await?;
        let items = requested
            .iter()
            .map(|wanted| {
                catalog
                    .iter()
                    .find(|product| product.id == wanted.id)
                    .map(|product| NewOrderItem {
                        product_id: product.id,
                        price: product.price,
                        quantity: wanted.quantity,
                    })
                    .ok_or_else(|| {
                        tracing::warn!(store_id = %store_id, product_id = %wanted.id, "Checkout references unknown product");
                        AppError::NotFound("Product not found".to_string())
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let now = Utc::now();
        let deadline = delivery_deadline(now, quote.lead_days)?;
        let new_order = NewOrder {
            id: Uuid::new_v4(),
            store_id,
            buyer,
            shipping_cost: quote.value_cents,
            currency: store.currency,
            delivery_deadline: deadline,
            created_at: now,
            items,
        };
        let order = self.orders.create(&new_order).await?;

        tracing::info!(
            order_id = %order.id,
            store_id = %store_id,
            code = order.code,
            total = order.total(),
            "Order created"
        );

        let session = CheckoutSessionRequest {
            order_id: order.id,
            currency: order.currency,
            line_items: order
                .items
                .iter()
                .map(|item| CheckoutLineItem {
                    name: item.product.name.clone(),
                    images: item.product.images.clone(),
                    unit_amount: item.price,
                    quantity: item.quantity,
                })
                .collect(),
            shipping_cost: order.shipping_cost,
            shipping_lead_days: quote.lead_days,
            success_url: store.success_url_for(order.id),
            cancel_url: store.cancel_url.clone(),
            customer_email: order.buyer.email.clone(),
        };

        let url = self
            .payments
            .create_checkout_session(&session)
            .await
            .map_err(|e| {
                tracing::warn!(order_id = %order.id, error = %e, "Checkout session failed, order stays unpaid");
                AppError::from(e)
            })?;

        self.enqueue_confirmation(&order).await;

        Ok(CheckoutSession {
            url,
            order_id: order.id,
        })
    }

    async fn enqueue_confirmation(&self, order: &Order) {
        let branding = match self.stores.branding(order.store_id).await {
            Ok(branding) => branding,
            Err(e) => {
                tracing::error!(order_id = %order.id, error = %e, "Failed to load store branding");
                return;
            }
        };

        let Some(message) = OutboxMessage::confirmation(Confirmation::OrderPlaced, order, &branding) else {
            tracing::warn!(
                order_id = %order.id,
                store_id = %order.store_id,
                "Store has no email settings, order confirmation not sent"
            );
            return;
        };

        match self.outbox.enqueue(&message).await {
            Ok(true) => tracing::debug!(key = %message.idempotency_key, "Order confirmation queued"),
            Ok(false) => tracing::debug!(key = %message.idempotency_key, "Order confirmation already queued"),
            Err(e) => tracing::error!(order_id = %order.id, error = %e, "Failed to queue order confirmation"),
        }
    }
}
