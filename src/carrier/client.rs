use async_trait::async_trait;
use failsafe::futures::CircuitBreaker as FuturesCircuitBreaker;
use failsafe::{backoff, failure_policy, Config, Error as FailsafeError, StateMachine};
use reqwest::{Client, StatusCode};
use std::time::Duration;

use super::{select_option, CarrierError};
use crate::domain::{RateRequest, ShippingQuote};
use crate::ports::CarrierGateway;

/// HTTP client for the carrier rate-quote API and the postal-code lookup service.
///
/// Calls are never retried. The circuit breaker only short-circuits while the
/// carrier keeps failing, so a checkout fails fast instead of hanging.
#[derive(Clone)]
pub struct CarrierClient {
    client: Client,
    rates_url: String,
    lookup_url: String,
    circuit_breaker: StateMachine<failure_policy::ConsecutiveFailures<backoff::EqualJittered>, ()>,
}

impl CarrierClient {
    pub fn new(rates_url: String, lookup_url: String) -> Self {
        Self::with_circuit_breaker(rates_url, lookup_url, 3, 60)
    }

    pub fn with_circuit_breaker(
        rates_url: String,
        lookup_url: String,
        failure_threshold: u32,
        reset_timeout_secs: u64,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        let backoff = backoff::equal_jittered(
            Duration::from_secs(reset_timeout_secs),
            Duration::from_secs(reset_timeout_secs * 2),
        );
        let policy = failure_policy::consecutive_failures(failure_threshold, backoff);
        let circuit_breaker = Config::new().failure_policy(policy).build();

        CarrierClient {
            client,
            rates_url,
            lookup_url,
            circuit_breaker,
        }
    }

    pub fn circuit_state(&self) -> &'static str {
        if self.circuit_breaker.is_call_permitted() {
            "closed"
        } else {
            "open"
        }
    }

    fn rate_query(request: &RateRequest) -> Vec<(&'static str, String)> {
        let package = &request.package;
        vec![
            ("sCepOrigem", request.origin.clone()),
            ("sCepDestino", request.destination.clone()),
            ("nVlPeso", package.weight_kg.to_string()),
            ("nCdFormato", "1".to_string()),
            ("nVlComprimento", package.length_cm.to_string()),
            ("nVlAltura", package.height_cm.to_string()),
            ("nVlLargura", package.width_cm.to_string()),
            ("nCdServico", request.service_codes.join(",")),
            ("nVlDiametro", "0".to_string()),
            ("nVlValorDeclarado", request.declared_value.clone()),
        ]
    }
}

#[async_trait]
impl CarrierGateway for CarrierClient {
    async fn quote(&self, request: &RateRequest) -> Result<ShippingQuote, CarrierError> {
        let url = format!("{}/rates", self.rates_url.trim_end_matches('/'));
        let query = Self::rate_query(request);
        let client = self.client.clone();

        tracing::debug!(
            origin = %request.origin,
            destination = %request.destination,
            services = %request.service_codes.join(","),
            "Requesting carrier rate quote"
        );

        let result = self
            .circuit_breaker
            .call(async move {
                let response = client.get(&url).query(&query).send().await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(CarrierError::Upstream(format!("carrier responded with {}", status)));
                }
                let body = response.json::<serde_json::Value>().await?;
                Ok(body)
            })
            .await;

        let body = match result {
            Ok(body) => body,
            Err(FailsafeError::Rejected) => return Err(CarrierError::CircuitOpen),
            Err(FailsafeError::Inner(e)) => return Err(e),
        };

        let quote = select_option(body)?;
        tracing::debug!(
            value_cents = quote.value_cents,
            lead_days = quote.lead_days,
            "Carrier quote resolved"
        );
        Ok(quote)
    }

    async fn lookup_postal_code(
        &self,
        postal_code: &str,
    ) -> Result<Option<serde_json::Value>, CarrierError> {
        let url = format!(
            "{}/ws/{}/json/",
            self.lookup_url.trim_end_matches('/'),
            postal_code
        );

        let response = self.client.get(&url).send().await?;
        match response.status() {
            StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND => return Ok(None),
            status if !status.is_success() => {
                return Err(CarrierError::Upstream(format!("postal lookup responded with {}", status)))
            }
            _ => {}
        }

        let body = response.json::<serde_json::Value>().await?;
        if body.get("erro").is_some() {
            return Ok(None);
        }

        Ok(Some(body))
    }
}
