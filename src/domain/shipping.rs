use serde::Serialize;

/// Days added to every carrier-quoted lead time for order handling.
pub const HANDLING_BUFFER_DAYS: u32 = 2;

/// Longest carrier lead time accepted in a quote.
pub const MAX_CARRIER_LEAD_DAYS: u32 = 365;

/// Default carrier service when a caller asks for none.
pub const DEFAULT_SERVICE_CODE: &str = "41106";

/// Box dimensions sent to the carrier. Weight in kilograms, sides in centimetres.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageProfile {
    pub weight_kg: f64,
    pub length_cm: f64,
    pub width_cm: f64,
    pub height_cm: f64,
}

impl PackageProfile {
    /// Every checkout ships in the same box regardless of contents.
    pub fn checkout() -> Self {
        Self {
            weight_kg: 0.3 * 5.0,
            length_cm: 32.0,
            width_cm: 25.0,
            height_cm: 5.0 + 5.0 * 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RateRequest {
    pub origin: String,
    pub destination: String,
    pub package: PackageProfile,
    pub service_codes: Vec<String>,
    /// Declared value in currency units, `"0"` when not declared.
    pub declared_value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingQuote {
    pub value_cents: i64,
    /// Carrier days plus the handling buffer.
    pub lead_days: u32,
    pub service_code: String,
}

impl ShippingQuote {
    /// Lead time as the carrier quoted it, without the handling buffer.
    pub fn carrier_days(&self) -> u32 {
        self.lead_days.saturating_sub(HANDLING_BUFFER_DAYS)
    }
}
