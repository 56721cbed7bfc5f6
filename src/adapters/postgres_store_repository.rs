use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::decode_currency;
use crate::domain::{CategoryLink, EmailCapability, EmailCopy, EmailSettings, Product, Store, StoreBranding};
use crate::ports::{RepositoryError, RepositoryResult, StoreRepository};

/// Footer links shown in emails.
const BRANDING_CATEGORY_LIMIT: i64 = 4;

#[derive(Clone)]
pub struct PostgresStoreRepository {
    pool: PgPool,
}

impl PostgresStoreRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StoreRepository for PostgresStoreRepository {
    async fn find_store(&self, store_id: Uuid) -> RepositoryResult<Option<Store>> {
        let row = sqlx::query_as::<_, StoreRow>(
            r#"
            SELECT id, name, zip_code, store_url, success_url, cancel_url, currency
            FROM stores WHERE id = $1
            "#,
        )
        .bind(store_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(StoreRow::into_domain)
            .transpose()
            .map_err(RepositoryError::from)
    }

    async fn branding(&self, store_id: Uuid) -> RepositoryResult<StoreBranding> {
        let store_url: String = sqlx::query_scalar("SELECT store_url FROM stores WHERE id = $1")
            .bind(store_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RepositoryError::NotFound("Store not found".to_string()))?;

        let settings = sqlx::query_as::<_, EmailSettingsRow>(
            r#"
            SELECT sender, reply_to, name, official_name, address, logo_url,
                   order_confirmation_subject, order_confirmation_title,
                   order_confirmation_subtitle, order_confirmation_description,
                   payment_confirmation_subject, payment_confirmation_title,
                   payment_confirmation_subtitle, payment_confirmation_description
            FROM email_settings WHERE store_id = $1
            "#,
        )
        .bind(store_id)
        .fetch_optional(&self.pool)
        .await?;

        let categories = sqlx::query_as::<_, (Uuid, String)>(
            "SELECT id, name FROM categories WHERE store_id = $1 ORDER BY created_at LIMIT $2",
        )
        .bind(store_id)
        .bind(BRANDING_CATEGORY_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        Ok(StoreBranding {
            store_url,
            email: EmailCapability::from(settings.map(EmailSettingsRow::into_domain)),
            categories: categories
                .into_iter()
                .map(|(id, name)| CategoryLink { id, name })
                .collect(),
        })
    }

    async fn products(&self, store_id: Uuid, product_ids: &[Uuid]) -> RepositoryResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT p.id, p.name, p.price, s.name AS size_name, s.value AS size_value,
                   ARRAY(
                       SELECT pi.url FROM product_images pi
                       WHERE pi.product_id = p.id
                       ORDER BY pi.position
                   ) AS images
            FROM products p
            JOIN sizes s ON s.id = p.size_id
            WHERE p.store_id = $1 AND p.id = ANY($2)
            "#,
        )
        .bind(store_id)
        .bind(product_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ProductRow::into_domain).collect())
    }

    async fn active_product_count(&self, store_id: Uuid) -> RepositoryResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products WHERE store_id = $1 AND is_archived = false",
        )
        .bind(store_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StoreRow {
    id: Uuid,
    name: String,
    zip_code: Option<String>,
    store_url: String,
    success_url: String,
    cancel_url: String,
    currency: String,
}

impl StoreRow {
    fn into_domain(self) -> Result<Store, sqlx::Error> {
        Ok(Store {
            id: self.id,
            name: self.name,
            zip_code: self.zip_code.filter(|zip| !zip.trim().is_empty()),
            store_url: self.store_url,
            success_url: self.success_url,
            cancel_url: self.cancel_url,
            currency: decode_currency(&self.currency)?,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct EmailSettingsRow {
    sender: String,
    reply_to: String,
    name: String,
    official_name: String,
    address: String,
    logo_url: String,
    order_confirmation_subject: String,
    order_confirmation_title: String,
    order_confirmation_subtitle: String,
    order_confirmation_description: String,
    payment_confirmation_subject: String,
    payment_confirmation_title: String,
    payment_confirmation_subtitle: String,
    payment_confirmation_description: String,
}

impl EmailSettingsRow {
    fn into_domain(self) -> EmailSettings {
        EmailSettings {
            from: self.sender,
            reply_to: self.reply_to,
            name: self.name,
            official_name: self.official_name,
            address: self.address,
            logo_url: self.logo_url,
            order_confirmation: EmailCopy {
                subject: self.order_confirmation_subject,
                title: self.order_confirmation_title,
                subtitle: self.order_confirmation_subtitle,
                description: self.order_confirmation_description,
            },
            payment_confirmation: EmailCopy {
                subject: self.payment_confirmation_subject,
                title: self.payment_confirmation_title,
                subtitle: self.payment_confirmation_subtitle,
                description: self.payment_confirmation_description,
            },
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    price: i64,
    size_name: String,
    size_value: String,
    images: Vec<String>,
}

impl ProductRow {
    fn into_domain(self) -> Product {
        Product {
            id: self.id,
            name: self.name,
            price: self.price,
            size_name: self.size_name,
            size_value: self.size_value,
            images: self.images,
        }
    }
}
