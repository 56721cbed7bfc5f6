//! In-memory ports and an app builder shared by the router tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use storefront_core::carrier::CarrierError;
use storefront_core::domain::{
    CategoryLink, Currency, EmailCapability, EmailCopy, EmailSettings, NewOrder, Order, OrderItem,
    Product, ProductSummary, RateRequest, ShippingQuote, Store, StoreBranding,
};
use storefront_core::health::{DependencyChecker, DependencyStatus};
use storefront_core::notifications::{EmailMessage, MailError, OutboxEntry, OutboxMessage};
use storefront_core::payments::{CheckoutSessionRequest, PaymentError};
use storefront_core::ports::{
    CarrierGateway, Mailer, OrderRepository, OutboxRepository, PaymentGateway, PaymentTransition,
    RepositoryError, RepositoryResult, StoreRepository,
};
use storefront_core::{create_app, AppState, Ports};

pub const WEBHOOK_SECRET: &str = "whsec_test_secret";
pub const ADMIN_KEY: &str = "admin-test-key";
pub const CHECKOUT_URL: &str = "https://pay.test/session/cs_test_1";

#[derive(Default)]
pub struct InMemoryStores {
    pub stores: Mutex<HashMap<Uuid, Store>>,
    pub brandings: Mutex<HashMap<Uuid, StoreBranding>>,
    /// (store id, product, archived)
    pub products: Mutex<Vec<(Uuid, Product, bool)>>,
}

impl InMemoryStores {
    pub fn summary(&self, product_id: Uuid) -> ProductSummary {
        let products = self.products.lock().unwrap();
        let (_, product, _) = products
            .iter()
            .find(|(_, product, _)| product.id == product_id)
            .expect("product seeded");
        ProductSummary {
            id: product.id,
            name: product.name.clone(),
            size: product.size_label(),
            images: product.images.clone(),
        }
    }
}

#[async_trait]
impl StoreRepository for InMemoryStores {
    async fn find_store(&self, store_id: Uuid) -> RepositoryResult<Option<Store>> {
        Ok(self.stores.lock().unwrap().get(&store_id).cloned())
    }

    async fn branding(&self, store_id: Uuid) -> RepositoryResult<StoreBranding> {
        self.brandings
            .lock()
            .unwrap()
            .get(&store_id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound("Store not found".to_string()))
    }

    async fn products(&self, store_id: Uuid, product_ids: &[Uuid]) -> RepositoryResult<Vec<Product>> {
        Ok(self
            .products
            .lock()
            .unwrap()
            .iter()
            .filter(|(owner, product, _)| *owner == store_id && product_ids.contains(&product.id))
            .map(|(_, product, _)| product.clone())
            .collect())
    }

    async fn active_product_count(&self, store_id: Uuid) -> RepositoryResult<i64> {
        Ok(self
            .products
            .lock()
            .unwrap()
            .iter()
            .filter(|(owner, _, archived)| *owner == store_id && !archived)
            .count() as i64)
    }
}

#[derive(Debug, Clone)]
pub struct StoredOutboxEntry {
    pub id: Uuid,
    pub message: OutboxMessage,
    pub attempts: i32,
    pub next_attempt_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub failed: bool,
    pub last_error: Option<String>,
}

#[derive(Default)]
pub struct InMemoryOutbox {
    pub entries: Mutex<Vec<StoredOutboxEntry>>,
}

impl InMemoryOutbox {
    pub fn insert(&self, message: &OutboxMessage) -> bool {
        let mut entries = self.entries.lock().unwrap();
        if entries
            .iter()
            .any(|entry| entry.message.idempotency_key == message.idempotency_key)
        {
            return false;
        }
        entries.push(StoredOutboxEntry {
            id: Uuid::new_v4(),
            message: message.clone(),
            attempts: 0,
            next_attempt_at: Utc::now(),
            delivered_at: None,
            failed: false,
            last_error: None,
        });
        true
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .map(|entry| entry.message.idempotency_key.clone())
            .collect()
    }
}

#[async_trait]
impl OutboxRepository for InMemoryOutbox {
    async fn enqueue(&self, message: &OutboxMessage) -> RepositoryResult<bool> {
        Ok(self.insert(message))
    }

    async fn claim_due(&self, now: DateTime<Utc>, limit: i64) -> RepositoryResult<Vec<OutboxEntry>> {
        let mut entries = self.entries.lock().unwrap();
        let mut claimed = Vec::new();
        for entry in entries.iter_mut() {
            if claimed.len() as i64 >= limit {
                break;
            }
            if entry.delivered_at.is_none() && !entry.failed && entry.next_attempt_at <= now {
                entry.next_attempt_at = now + Duration::seconds(300);
                claimed.push(OutboxEntry {
                    id: entry.id,
                    attempts: entry.attempts,
                    message: entry.message.clone(),
                });
            }
        }
        Ok(claimed)
    }

    async fn mark_delivered(&self, id: Uuid, at: DateTime<Utc>) -> RepositoryResult<()> {
        if let Some(entry) = self.entries.lock().unwrap().iter_mut().find(|e| e.id == id) {
            entry.delivered_at = Some(at);
            entry.last_error = None;
        }
        Ok(())
    }

    async fn mark_failed(
        &self,
        id: Uuid,
        error: &str,
        retry_at: Option<DateTime<Utc>>,
    ) -> RepositoryResult<()> {
        if let Some(entry) = self.entries.lock().unwrap().iter_mut().find(|e| e.id == id) {
            entry.attempts += 1;
            entry.last_error = Some(error.to_string());
            match retry_at {
                Some(at) => entry.next_attempt_at = at,
                None => entry.failed = true,
            }
        }
        Ok(())
    }
}

/// Orders kept in memory. Item catalog data is joined from `stores`, and
/// paid transitions enqueue into `outbox`, mirroring the Postgres adapter.
pub struct InMemoryOrders {
    pub orders: Mutex<Vec<Order>>,
    stores: Arc<InMemoryStores>,
    outbox: Arc<InMemoryOutbox>,
}

impl InMemoryOrders {
    pub fn new(stores: Arc<InMemoryStores>, outbox: Arc<InMemoryOutbox>) -> Self {
        Self {
            orders: Mutex::new(Vec::new()),
            stores,
            outbox,
        }
    }

    pub fn get(&self, order_id: Uuid) -> Option<Order> {
        self.orders
            .lock()
            .unwrap()
            .iter()
            .find(|order| order.id == order_id)
            .cloned()
    }

    pub fn update(&self, order_id: Uuid, change: impl FnOnce(&mut Order)) {
        if let Some(order) = self
            .orders
            .lock()
            .unwrap()
            .iter_mut()
            .find(|order| order.id == order_id)
        {
            change(order);
        }
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrders {
    async fn create(&self, order: &NewOrder) -> RepositoryResult<Order> {
        let items = order
            .items
            .iter()
            .map(|item| OrderItem {
                id: Uuid::new_v4(),
                product: self.stores.summary(item.product_id),
                price: item.price,
                quantity: item.quantity,
            })
            .collect();

        let mut orders = self.orders.lock().unwrap();
        let code = orders
            .iter()
            .filter(|existing| existing.store_id == order.store_id)
            .map(|existing| existing.code)
            .max()
            .unwrap_or(0)
            + 1;

        let created = Order {
            id: order.id,
            store_id: order.store_id,
            code,
            buyer: order.buyer.clone(),
            shipping_cost: order.shipping_cost,
            currency: order.currency,
            is_paid: false,
            archived: false,
            delivery_deadline: order.delivery_deadline,
            created_at: order.created_at,
            updated_at: order.created_at,
            items,
        };
        orders.push(created.clone());
        Ok(created)
    }

    async fn find(&self, order_id: Uuid) -> RepositoryResult<Option<Order>> {
        Ok(self.get(order_id))
    }

    async fn list_for_store(&self, store_id: Uuid) -> RepositoryResult<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .orders
            .lock()
            .unwrap()
            .iter()
            .filter(|order| order.store_id == store_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn mark_paid(
        &self,
        order_id: Uuid,
        notification: Option<&OutboxMessage>,
    ) -> RepositoryResult<PaymentTransition> {
        let mut orders = self.orders.lock().unwrap();
        let Some(order) = orders.iter_mut().find(|order| order.id == order_id) else {
            return Ok(PaymentTransition::Missing);
        };
        if order.is_paid {
            return Ok(PaymentTransition::AlreadyPaid);
        }
        order.is_paid = true;
        order.updated_at = Utc::now();
        if let Some(message) = notification {
            self.outbox.insert(message);
        }
        Ok(PaymentTransition::Applied)
    }

    async fn archive_settled(&self, cutoff: DateTime<Utc>) -> RepositoryResult<u64> {
        let now = Utc::now();
        let mut archived = 0;
        for order in self.orders.lock().unwrap().iter_mut() {
            if order.is_archivable(cutoff) {
                order.archived = true;
                order.updated_at = now;
                archived += 1;
            }
        }
        Ok(archived)
    }
}

pub struct FakeCarrier {
    pub quote: Mutex<Result<ShippingQuote, CarrierError>>,
    pub lookup: Mutex<Option<Value>>,
    pub requests: Mutex<Vec<RateRequest>>,
}

impl Default for FakeCarrier {
    fn default() -> Self {
        Self {
            quote: Mutex::new(Ok(ShippingQuote {
                value_cents: 1500,
                lead_days: 7,
                service_code: "41106".to_string(),
            })),
            lookup: Mutex::new(Some(json!({
                "cep": "01310-100",
                "logradouro": "Avenida Paulista",
                "localidade": "São Paulo",
                "uf": "SP"
            }))),
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl CarrierGateway for FakeCarrier {
    async fn quote(&self, request: &RateRequest) -> Result<ShippingQuote, CarrierError> {
        self.requests.lock().unwrap().push(request.clone());
        match &*self.quote.lock().unwrap() {
            Ok(quote) => Ok(quote.clone()),
            Err(CarrierError::InvalidShippingResponse(reason)) => {
                Err(CarrierError::InvalidShippingResponse(reason.clone()))
            }
            Err(CarrierError::Upstream(reason)) => Err(CarrierError::Upstream(reason.clone())),
            Err(CarrierError::CircuitOpen) => Err(CarrierError::CircuitOpen),
            Err(_) => Err(CarrierError::ShippingUnavailable),
        }
    }

    async fn lookup_postal_code(&self, _postal_code: &str) -> Result<Option<Value>, CarrierError> {
        Ok(self.lookup.lock().unwrap().clone())
    }
}

#[derive(Default)]
pub struct FakePayments {
    pub sessions: Mutex<Vec<CheckoutSessionRequest>>,
    pub fail: Mutex<bool>,
}

#[async_trait]
impl PaymentGateway for FakePayments {
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<String, PaymentError> {
        if *self.fail.lock().unwrap() {
            return Err(PaymentError::Upstream("card_declined".to_string()));
        }
        self.sessions.lock().unwrap().push(request.clone());
        Ok(CHECKOUT_URL.to_string())
    }
}

#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<EmailMessage>>,
    pub failures_left: Mutex<u32>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        let mut failures_left = self.failures_left.lock().unwrap();
        if *failures_left > 0 {
            *failures_left -= 1;
            return Err(MailError::Rejected {
                status: 503,
                message: "temporarily unavailable".to_string(),
            });
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

pub struct StaticChecker {
    pub name: &'static str,
    pub critical: bool,
    pub healthy: bool,
}

#[async_trait]
impl DependencyChecker for StaticChecker {
    fn name(&self) -> &'static str {
        self.name
    }

    fn critical(&self) -> bool {
        self.critical
    }

    async fn check(&self) -> DependencyStatus {
        if self.healthy {
            DependencyStatus::Healthy {
                status: "healthy".to_string(),
                latency_ms: 1,
            }
        } else {
            DependencyStatus::Unhealthy {
                status: "unhealthy".to_string(),
                error: "connection refused".to_string(),
            }
        }
    }
}

pub fn email_settings() -> EmailSettings {
    let copy = |subject: &str| EmailCopy {
        subject: subject.to_string(),
        title: "Thanks!".to_string(),
        subtitle: "Order update".to_string(),
        description: "We will let you know when it ships.".to_string(),
    };
    EmailSettings {
        from: "Loja <orders@loja.test>".to_string(),
        reply_to: "help@loja.test".to_string(),
        name: "Loja".to_string(),
        official_name: "Loja Ltda".to_string(),
        address: "Rua A, 1".to_string(),
        logo_url: "https://loja.test/logo.png".to_string(),
        order_confirmation: copy("We got your order"),
        payment_confirmation: copy("Payment received"),
    }
}

pub struct TestApp {
    pub router: Router,
    pub store_id: Uuid,
    pub product_ids: Vec<Uuid>,
    pub stores: Arc<InMemoryStores>,
    pub orders: Arc<InMemoryOrders>,
    pub outbox: Arc<InMemoryOutbox>,
    pub carrier: Arc<FakeCarrier>,
    pub payments: Arc<FakePayments>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_checkers(vec![Arc::new(StaticChecker {
            name: "postgres",
            critical: true,
            healthy: true,
        })])
    }

    /// One BRL store with email configured, two products priced 20.00 and 35.00
    /// and one archived product.
    pub fn with_checkers(checkers: Vec<Arc<dyn DependencyChecker>>) -> Self {
        let stores = Arc::new(InMemoryStores::default());
        let outbox = Arc::new(InMemoryOutbox::default());
        let orders = Arc::new(InMemoryOrders::new(stores.clone(), outbox.clone()));
        let carrier = Arc::new(FakeCarrier::default());
        let payments = Arc::new(FakePayments::default());

        let store_id = Uuid::new_v4();
        stores.stores.lock().unwrap().insert(
            store_id,
            Store {
                id: store_id,
                name: "Loja".to_string(),
                zip_code: Some("01001000".to_string()),
                store_url: "https://loja.test".to_string(),
                success_url: "https://loja.test/success".to_string(),
                cancel_url: "https://loja.test/cart".to_string(),
                currency: Currency::Brl,
            },
        );
        stores.brandings.lock().unwrap().insert(
            store_id,
            StoreBranding {
                store_url: "https://loja.test".to_string(),
                email: EmailCapability::Configured(email_settings()),
                categories: vec![CategoryLink {
                    id: Uuid::new_v4(),
                    name: "Shirts".to_string(),
                }],
            },
        );

        let product_ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        {
            let mut products = stores.products.lock().unwrap();
            for (index, (id, price)) in product_ids.iter().zip([2000, 3500, 900]).enumerate() {
                products.push((
                    store_id,
                    Product {
                        id: *id,
                        name: format!("Product {}", index + 1),
                        price,
                        size_name: "Medium".to_string(),
                        size_value: "M".to_string(),
                        images: vec![format!("https://cdn.loja.test/{}.png", index + 1)],
                    },
                    index == 2,
                ));
            }
        }

        let ports = Ports {
            orders: orders.clone(),
            stores: stores.clone(),
            outbox: outbox.clone(),
            carrier: carrier.clone(),
            payments: payments.clone(),
        };
        let state = AppState::new(ports, WEBHOOK_SECRET.to_string(), ADMIN_KEY, checkers);

        Self {
            router: create_app(state),
            store_id,
            product_ids,
            stores,
            orders,
            outbox,
            carrier,
            payments,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    pub async fn send_json(&self, request: Request<Body>) -> (StatusCode, Value) {
        let (status, body) = self.send(request).await;
        let value = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned()))
        };
        (status, value)
    }

    pub async fn checkout(&self, body: Value) -> (StatusCode, Value) {
        self.send_json(
            Request::builder()
                .method("POST")
                .uri(format!("/{}/checkout", self.store_id))
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    /// Places an order for `quantity` of the first product and returns its id.
    pub async fn place_order(&self, quantity: i64) -> Uuid {
        let (status, _) = self
            .checkout(checkout_body(&[(self.product_ids[0], quantity)]))
            .await;
        assert_eq!(status, StatusCode::OK);
        self.payments
            .sessions
            .lock()
            .unwrap()
            .last()
            .map(|session| session.order_id)
            .expect("checkout session recorded")
    }
}

pub fn shipping_payload() -> Value {
    json!({
        "destination": "01310-100",
        "city": "Sao Paulo",
        "street": "Avenida Paulista",
        "neighborhood": "Bela Vista",
        "complement": "Apto 12",
        "number": "1000",
        "state": "SP",
        "name": "Ana",
        "surname": "Souza",
        "taxId": "12345678901",
        "email": "ana@example.com",
        "phone": "(11) 98765-4321"
    })
}

pub fn checkout_body(products: &[(Uuid, i64)]) -> Value {
    json!({
        "products": products
            .iter()
            .map(|(id, quantity)| json!({ "id": id.to_string(), "quantity": quantity }))
            .collect::<Vec<_>>(),
        "shipping": shipping_payload(),
    })
}
