use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::PaymentError;

type HmacSha256 = Hmac<Sha256>;

/// Events signed longer ago than this are rejected as replays.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Verifies a `t=<unix>,v1=<hex>[,v1=<hex>...]` header against the raw payload.
///
/// The signed content is `"{t}.{payload}"`. Any matching `v1` entry is accepted.
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    now: i64,
) -> Result<(), PaymentError> {
    let mut timestamp: Option<i64> = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => {
                timestamp = Some(value.parse().map_err(|_| {
                    PaymentError::InvalidSignature("Unable to extract timestamp from header".to_string())
                })?);
            }
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or_else(|| {
        PaymentError::InvalidSignature("Unable to extract timestamp from header".to_string())
    })?;
    if signatures.is_empty() {
        return Err(PaymentError::InvalidSignature(
            "No signatures found with expected scheme".to_string(),
        ));
    }

    let matched = signatures.iter().any(|candidate| {
        let Ok(expected) = hex::decode(candidate) else {
            return false;
        };
        match signed_mac(payload, timestamp, secret) {
            Ok(mac) => mac.verify_slice(&expected).is_ok(),
            Err(_) => false,
        }
    });

    if !matched {
        return Err(PaymentError::InvalidSignature(
            "No signatures found matching the expected signature for payload".to_string(),
        ));
    }

    if timestamp < now - SIGNATURE_TOLERANCE_SECS {
        return Err(PaymentError::InvalidSignature(
            "Timestamp outside the tolerance zone".to_string(),
        ));
    }

    Ok(())
}

/// Builds a header value for `payload`, as the provider would send it.
pub fn sign_payload(payload: &[u8], secret: &str, timestamp: i64) -> Result<String, PaymentError> {
    let mac = signed_mac(payload, timestamp, secret)?;
    Ok(format!(
        "t={},v1={}",
        timestamp,
        hex::encode(mac.finalize().into_bytes())
    ))
}

fn signed_mac(payload: &[u8], timestamp: i64, secret: &str) -> Result<HmacSha256, PaymentError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| PaymentError::InvalidSignature("Invalid webhook secret".to_string()))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac)
}
