use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;

use crate::carrier::CarrierClient;

const CHECK_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub dependencies: BTreeMap<String, DependencyStatus>,
}

impl HealthResponse {
    pub fn is_unhealthy(&self) -> bool {
        self.status == "unhealthy"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DependencyStatus {
    Healthy { status: String, latency_ms: u64 },
    Unhealthy { status: String, error: String },
}

impl DependencyStatus {
    fn unhealthy(error: impl Into<String>) -> Self {
        DependencyStatus::Unhealthy {
            status: "unhealthy".to_string(),
            error: error.into(),
        }
    }
}

#[async_trait]
pub trait DependencyChecker: Send + Sync {
    fn name(&self) -> &'static str;

    /// A failing critical dependency makes the whole service unhealthy.
    fn critical(&self) -> bool {
        false
    }

    async fn check(&self) -> DependencyStatus;
}

pub struct PostgresChecker {
    pool: sqlx::PgPool,
}

impl PostgresChecker {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DependencyChecker for PostgresChecker {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn critical(&self) -> bool {
        true
    }

    async fn check(&self) -> DependencyStatus {
        let start = Instant::now();
        match sqlx::query("SELECT 1").execute(&self.pool).await {
            Ok(_) => DependencyStatus::Healthy {
                status: "healthy".to_string(),
                latency_ms: start.elapsed().as_millis() as u64,
            },
            Err(e) => DependencyStatus::unhealthy(e.to_string()),
        }
    }
}

/// Reports the carrier circuit breaker without calling the carrier.
pub struct CarrierChecker {
    client: CarrierClient,
}

impl CarrierChecker {
    pub fn new(client: CarrierClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DependencyChecker for CarrierChecker {
    fn name(&self) -> &'static str {
        "carrier"
    }

    async fn check(&self) -> DependencyStatus {
        match self.client.circuit_state() {
            "closed" => DependencyStatus::Healthy {
                status: "healthy".to_string(),
                latency_ms: 0,
            },
            state => DependencyStatus::unhealthy(format!("circuit breaker {}", state)),
        }
    }
}

pub async fn check_health(
    checkers: &[Arc<dyn DependencyChecker>],
    start_time: Instant,
) -> HealthResponse {
    let timeout_duration = Duration::from_secs(CHECK_TIMEOUT_SECS);

    let results = futures::future::join_all(
        checkers
            .iter()
            .map(|checker| timeout(timeout_duration, checker.check())),
    )
    .await;

    let mut dependencies = BTreeMap::new();
    let mut critical_failure = false;
    let mut degraded = false;

    for (checker, result) in checkers.iter().zip(results) {
        let status = result.unwrap_or_else(|_| DependencyStatus::unhealthy("timeout"));
        if matches!(status, DependencyStatus::Unhealthy { .. }) {
            if checker.critical() {
                critical_failure = true;
            } else {
                degraded = true;
            }
        }
        dependencies.insert(checker.name().to_string(), status);
    }

    let status = if critical_failure {
        "unhealthy"
    } else if degraded {
        "degraded"
    } else {
        "healthy"
    };

    HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: start_time.elapsed().as_secs(),
        dependencies,
    }
}
