use serde::Deserialize;
use uuid::Uuid;

use super::PaymentError;

pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentEvent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: EventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    pub object: serde_json::Value,
}

impl PaymentEvent {
    pub fn parse(payload: &[u8]) -> Result<Self, PaymentError> {
        serde_json::from_slice(payload).map_err(|e| PaymentError::InvalidEvent(e.to_string()))
    }

    /// The order a completed checkout refers to. `None` for any other event type.
    pub fn completed_order_id(&self) -> Result<Option<Uuid>, PaymentError> {
        if self.event_type != CHECKOUT_COMPLETED {
            return Ok(None);
        }

        let raw = self
            .data
            .object
            .get("metadata")
            .and_then(|metadata| metadata.get("orderId"))
            .and_then(|order_id| order_id.as_str())
            .ok_or_else(|| PaymentError::InvalidEvent("metadata.orderId is missing".to_string()))?;

        Uuid::parse_str(raw)
            .map(Some)
            .map_err(|_| PaymentError::InvalidEvent(format!("metadata.orderId '{}' is not an id", raw)))
    }
}
