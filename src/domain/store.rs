//! Store (tenant) configuration consumed by the order lifecycle.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Brl,
    Usd,
    Eur,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Brl => "BRL",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
        }
    }

    /// Lower-case ISO code, as payment providers expect it.
    pub fn iso_lower(&self) -> String {
        self.as_str().to_ascii_lowercase()
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_uppercase().as_str() {
            "BRL" => Ok(Currency::Brl),
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            other => Err(format!("unsupported currency '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Store {
    pub id: Uuid,
    pub name: String,
    /// Origin postal code for shipping quotes.
    pub zip_code: Option<String>,
    pub store_url: String,
    pub success_url: String,
    pub cancel_url: String,
    pub currency: Currency,
}

impl Store {
    pub fn success_url_for(&self, order_id: Uuid) -> String {
        format!("{}?order={}", self.success_url, order_id)
    }
}

/// Copy for one kind of transactional email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailCopy {
    pub subject: String,
    pub title: String,
    pub subtitle: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailSettings {
    pub from: String,
    pub reply_to: String,
    pub name: String,
    pub official_name: String,
    pub address: String,
    pub logo_url: String,
    pub order_confirmation: EmailCopy,
    pub payment_confirmation: EmailCopy,
}

/// Whether a store can send transactional email at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailCapability {
    Configured(EmailSettings),
    Unconfigured,
}

impl EmailCapability {
    pub fn settings(&self) -> Option<&EmailSettings> {
        match self {
            EmailCapability::Configured(settings) => Some(settings),
            EmailCapability::Unconfigured => None,
        }
    }
}

impl From<Option<EmailSettings>> for EmailCapability {
    fn from(settings: Option<EmailSettings>) -> Self {
        settings.map_or(EmailCapability::Unconfigured, EmailCapability::Configured)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryLink {
    pub id: Uuid,
    pub name: String,
}

/// Everything needed to brand an email on behalf of a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreBranding {
    pub store_url: String,
    pub email: EmailCapability,
    pub categories: Vec<CategoryLink>,
}

/// Catalog entry as priced at checkout time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub price: i64,
    pub size_name: String,
    pub size_value: String,
    pub images: Vec<String>,
}

impl Product {
    pub fn size_label(&self) -> String {
        format!("{} ({})", self.size_name, self.size_value)
    }
}
