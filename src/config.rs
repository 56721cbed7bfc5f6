use anyhow::{Context, Result};
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;
use std::str::FromStr;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server_port: u16,
    pub database_url: String,
    pub carrier_api_url: String,
    pub postal_lookup_url: String,
    pub payment_api_url: String,
    pub payment_api_key: String,
    pub payment_webhook_secret: String,
    pub mail_api_url: String,
    pub mail_api_key: String,
    pub admin_api_key: String,
    pub archival_schedule: Option<String>,
    pub outbox_poll_secs: u64,
    pub log_request_body: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok(); // Load .env file if present

        Ok(Config {
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("SERVER_PORT must be a port number")?,
            database_url: env::var("DATABASE_URL").context("DATABASE_URL is not set")?,
            carrier_api_url: env::var("CARRIER_API_URL")
                .unwrap_or_else(|_| "https://carrier.invalid".to_string()),
            postal_lookup_url: env::var("POSTAL_LOOKUP_URL")
                .unwrap_or_else(|_| "https://viacep.com.br".to_string()),
            payment_api_url: env::var("PAYMENT_API_URL")
                .unwrap_or_else(|_| "https://api.stripe.com".to_string()),
            payment_api_key: env::var("PAYMENT_API_KEY").context("PAYMENT_API_KEY is not set")?,
            payment_webhook_secret: env::var("PAYMENT_WEBHOOK_SECRET")
                .context("PAYMENT_WEBHOOK_SECRET is not set")?,
            mail_api_url: env::var("MAIL_API_URL")
                .unwrap_or_else(|_| "https://api.resend.com".to_string()),
            mail_api_key: env::var("MAIL_API_KEY").context("MAIL_API_KEY is not set")?,
            admin_api_key: env::var("ADMIN_API_KEY").context("ADMIN_API_KEY is not set")?,
            archival_schedule: env::var("ARCHIVAL_SCHEDULE")
                .ok()
                .filter(|value| !value.trim().is_empty()),
            outbox_poll_secs: env::var("OUTBOX_POLL_SECS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .context("OUTBOX_POLL_SECS must be a number of seconds")?,
            log_request_body: env::var("LOG_REQUEST_BODY")
                .map(|value| value.parse().unwrap_or(false))
                .unwrap_or(false),
        })
    }

    /// Checks everything that can be checked without touching the network.
    pub fn validate(&self) -> Result<()> {
        if self.server_port == 0 {
            anyhow::bail!("SERVER_PORT must be greater than 0");
        }

        for (name, value) in [
            ("CARRIER_API_URL", &self.carrier_api_url),
            ("POSTAL_LOOKUP_URL", &self.postal_lookup_url),
            ("PAYMENT_API_URL", &self.payment_api_url),
            ("MAIL_API_URL", &self.mail_api_url),
        ] {
            url::Url::parse(value).with_context(|| format!("{} is not a valid URL", name))?;
        }

        for (name, value) in [
            ("PAYMENT_API_KEY", &self.payment_api_key),
            ("PAYMENT_WEBHOOK_SECRET", &self.payment_webhook_secret),
            ("MAIL_API_KEY", &self.mail_api_key),
            ("ADMIN_API_KEY", &self.admin_api_key),
        ] {
            if value.trim().is_empty() {
                anyhow::bail!("{} is empty", name);
            }
        }

        if let Some(expression) = &self.archival_schedule {
            cron::Schedule::from_str(expression)
                .with_context(|| format!("ARCHIVAL_SCHEDULE '{}' is not a cron expression", expression))?;
        }

        Ok(())
    }
}
