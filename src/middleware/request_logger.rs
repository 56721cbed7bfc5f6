use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use crate::utils::sanitize::sanitize_json;

const MAX_BODY_LOG_SIZE: usize = 64 * 1024;
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Logs every request and response under a span carrying the request id,
/// which is also echoed in the response headers. With `log_body` set, JSON
/// bodies are logged too, buyer personal data masked.
pub async fn request_logger_middleware(
    State(log_body): State<bool>,
    mut req: Request,
    next: Next,
) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let header_value = HeaderValue::from_str(&request_id).ok();
    if let Some(value) = &header_value {
        req.headers_mut().insert(REQUEST_ID_HEADER, value.clone());
    }

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %req.method(),
        uri = %req.uri(),
    );

    async move {
        let start = Instant::now();

        if log_body {
            let (parts, body) = req.into_parts();
            let Ok(bytes) = axum::body::to_bytes(body, MAX_BODY_LOG_SIZE).await else {
                tracing::warn!("Request body too large or failed to read");
                return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
            };
            tracing::info!(body_size = bytes.len(), body = %describe_body(&bytes), "Incoming request");
            req = Request::from_parts(parts, Body::from(bytes));
        } else {
            tracing::info!("Incoming request");
        }

        let mut response = next.run(req).await;
        tracing::info!(
            status = response.status().as_u16(),
            latency_ms = start.elapsed().as_millis() as u64,
            "Outgoing response"
        );

        if let Some(value) = header_value {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        response
    }
    .instrument(span)
    .await
}

fn describe_body(bytes: &Bytes) -> String {
    if bytes.is_empty() {
        return "[empty]".to_string();
    }
    match serde_json::from_slice::<serde_json::Value>(bytes) {
        Ok(json) => serde_json::to_string(&sanitize_json(&json))
            .unwrap_or_else(|_| "[invalid json]".to_string()),
        Err(_) => format!("[non-json, {} bytes]", bytes.len()),
    }
}
