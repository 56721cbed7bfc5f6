use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;

type HmacSha256 = Hmac<Sha256>;

/// Compares both keys through an HMAC tag so the check takes the same time
/// whatever prefix of the key matches.
fn keys_match(presented: &str, expected: &str) -> bool {
    let tag = |key: &str| {
        HmacSha256::new_from_slice(expected.as_bytes()).map(|mut mac| {
            mac.update(key.as_bytes());
            mac
        })
    };

    match (tag(expected), tag(presented)) {
        (Ok(expected_mac), Ok(presented_mac)) => {
            presented_mac.verify_slice(&expected_mac.finalize().into_bytes()).is_ok()
        }
        _ => false,
    }
}

/// Back-office guard. Accepts `Authorization: Bearer <key>` or the bare key.
pub async fn admin_auth(State(admin_api_key): State<Arc<str>>, req: Request, next: Next) -> Response {
    let auth_header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let authorized = auth_header
        .map(|auth| auth.strip_prefix("Bearer ").unwrap_or(auth).trim())
        .is_some_and(|key| !key.is_empty() && keys_match(key, &admin_api_key));

    if !authorized {
        tracing::warn!(uri = %req.uri(), "Rejected back-office request");
        return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    }

    next.run(req).await
}
