use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use super::decode_currency;
use super::postgres_outbox_repository::insert_outbox;
use crate::domain::{Buyer, NewOrder, Order, OrderItem, ProductSummary};
use crate::notifications::OutboxMessage;
use crate::ports::{OrderRepository, PaymentTransition, RepositoryError, RepositoryResult};

const ORDER_COLUMNS: &str = "id, store_id, code, name, surname, tax_id, email, phone, destination, \
     street, number, complement, neighborhood, city, state, shipping_cost, currency, is_paid, \
     archived, delivery_deadline, created_at, updated_at";

#[derive(Clone)]
pub struct PostgresOrderRepository {
    pool: PgPool,
}

impl PostgresOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_items(&self, order_ids: &[Uuid]) -> RepositoryResult<HashMap<Uuid, Vec<OrderItem>>> {
        let rows = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT oi.id, oi.order_id, oi.price, oi.quantity,
                   p.id AS product_id, p.name AS product_name,
                   s.name AS size_name, s.value AS size_value,
                   ARRAY(
                       SELECT pi.url FROM product_images pi
                       WHERE pi.product_id = p.id
                       ORDER BY pi.position
                   ) AS images
            FROM order_items oi
            JOIN products p ON p.id = oi.product_id
            JOIN sizes s ON s.id = p.size_id
            WHERE oi.order_id = ANY($1)
            ORDER BY oi.order_id, oi.position
            "#,
        )
        .bind(order_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut items: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
        for row in rows {
            let order_id = row.order_id;
            items.entry(order_id).or_default().push(row.into_domain());
        }
        Ok(items)
    }

    async fn assemble(&self, rows: Vec<OrderRow>) -> RepositoryResult<Vec<Order>> {
        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let mut items = self.load_items(&ids).await?;

        rows.into_iter()
            .map(|row| {
                let order_items = items.remove(&row.id).unwrap_or_default();
                row.into_domain(order_items).map_err(RepositoryError::from)
            })
            .collect()
    }
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    async fn create(&self, order: &NewOrder) -> RepositoryResult<Order> {
        let mut tx = self.pool.begin().await?;

        // The upsert row lock serialises concurrent checkouts of one store.
        let code: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO store_order_counters (store_id, last_code)
            VALUES ($1, COALESCE((SELECT MAX(code) FROM orders WHERE store_id = $1), 0) + 1)
            ON CONFLICT (store_id)
            DO UPDATE SET last_code = store_order_counters.last_code + 1
            RETURNING last_code
            "#,
        )
        .bind(order.store_id)
        .fetch_one(&mut *tx)
        .await?;

        let buyer = &order.buyer;
        sqlx::query(
            r#"
            INSERT INTO orders (
                id, store_id, code, name, surname, tax_id, email, phone, destination,
                street, number, complement, neighborhood, city, state,
                shipping_cost, currency, is_paid, archived, delivery_deadline, created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
                $16, $17, false, false, $18, $19, $19
            )
            "#,
        )
        .bind(order.id)
        .bind(order.store_id)
        .bind(code)
        .bind(&buyer.name)
        .bind(&buyer.surname)
        .bind(&buyer.tax_id)
        .bind(&buyer.email)
        .bind(&buyer.phone)
        .bind(&buyer.destination)
        .bind(&buyer.street)
        .bind(&buyer.number)
        .bind(&buyer.complement)
        .bind(&buyer.neighborhood)
        .bind(&buyer.city)
        .bind(&buyer.state)
        .bind(order.shipping_cost)
        .bind(order.currency.as_str())
        .bind(order.delivery_deadline)
        .bind(order.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => RepositoryError::Conflict(
                format!("order code {} already taken for store {}", code, order.store_id),
            ),
            other => RepositoryError::Database(other),
        })?;

        for (position, item) in order.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_items (id, order_id, product_id, price, quantity, position)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(order.id)
            .bind(item.product_id)
            .bind(item.price)
            .bind(item.quantity)
            .bind(position as i32)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::debug!(order_id = %order.id, store_id = %order.store_id, code, "Order persisted");

        self.find(order.id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("order {}", order.id)))
    }

    async fn find(&self, order_id: Uuid) -> RepositoryResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders WHERE id = $1",
            ORDER_COLUMNS
        ))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.assemble(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_for_store(&self, store_id: Uuid) -> RepositoryResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders WHERE store_id = $1 ORDER BY created_at DESC",
            ORDER_COLUMNS
        ))
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;

        self.assemble(rows).await
    }

    async fn mark_paid(
        &self,
        order_id: Uuid,
        notification: Option<&OutboxMessage>,
    ) -> RepositoryResult<PaymentTransition> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_scalar::<_, Uuid>(
            "UPDATE orders SET is_paid = true, updated_at = NOW() WHERE id = $1 AND is_paid = false RETURNING id",
        )
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await?;

        if updated.is_none() {
            let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM orders WHERE id = $1)")
                .bind(order_id)
                .fetch_one(&mut *tx)
                .await?;
            tx.rollback().await?;

            return Ok(if exists {
                PaymentTransition::AlreadyPaid
            } else {
                PaymentTransition::Missing
            });
        }

        if let Some(message) = notification {
            insert_outbox(&mut *tx, message).await?;
        }

        tx.commit().await?;
        Ok(PaymentTransition::Applied)
    }

    async fn archive_settled(&self, cutoff: DateTime<Utc>) -> RepositoryResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET archived = true, updated_at = NOW()
            WHERE archived = false AND is_paid = true AND updated_at <= $1
            "#,
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    store_id: Uuid,
    code: i32,
    name: String,
    surname: String,
    tax_id: String,
    email: String,
    phone: String,
    destination: String,
    street: String,
    number: String,
    complement: String,
    neighborhood: String,
    city: String,
    state: String,
    shipping_cost: i64,
    currency: String,
    is_paid: bool,
    archived: bool,
    delivery_deadline: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_domain(self, items: Vec<OrderItem>) -> Result<Order, sqlx::Error> {
        Ok(Order {
            id: self.id,
            store_id: self.store_id,
            code: self.code,
            buyer: Buyer {
                name: self.name,
                surname: self.surname,
                tax_id: self.tax_id,
                email: self.email,
                phone: self.phone,
                destination: self.destination,
                street: self.street,
                number: self.number,
                complement: self.complement,
                neighborhood: self.neighborhood,
                city: self.city,
                state: self.state,
            },
            shipping_cost: self.shipping_cost,
            currency: decode_currency(&self.currency)?,
            is_paid: self.is_paid,
            archived: self.archived,
            delivery_deadline: self.delivery_deadline,
            created_at: self.created_at,
            updated_at: self.updated_at,
            items,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    id: Uuid,
    order_id: Uuid,
    price: i64,
    quantity: i32,
    product_id: Uuid,
    product_name: String,
    size_name: String,
    size_value: String,
    images: Vec<String>,
}

impl ItemRow {
    fn into_domain(self) -> OrderItem {
        OrderItem {
            id: self.id,
            product: ProductSummary {
                id: self.product_id,
                name: self.product_name,
                size: format!("{} ({})", self.size_name, self.size_value),
                images: self.images,
            },
            price: self.price,
            quantity: self.quantity,
        }
    }
}
