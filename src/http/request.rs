//! Request handling and transformation.
//!
//! # Responsibilities
//! - Expose the request ID assigned by the request-id layer
//! - Read the request body within the configured size limit
//! - Decode the body into a generic JSON payload for the dispatcher
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing (outermost layer)
//! - Malformed or non-object bodies decode to an empty payload, so they
//!   surface as missing fields rather than as a separate error
//! - Content-Type is not inspected; every body is tried as JSON

use axum::body::Body;
use axum::http::HeaderMap;
use serde_json::Value;
use thiserror::Error;

use crate::routing::Payload;

pub const X_REQUEST_ID: &str = "x-request-id";

/// The body exceeded the configured limit or could not be read.
#[derive(Debug, Error)]
#[error("request body rejected: {0}")]
pub struct BodyError(#[from] axum::Error);

/// The request ID header value, or `"unknown"`.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Buffer the body (at most `limit` bytes) and decode it.
pub async fn read_payload(body: Body, limit: usize) -> Result<Payload, BodyError> {
    let bytes = axum::body::to_bytes(body, limit).await?;
    Ok(decode_payload(&bytes))
}

/// Decode a JSON object body. Anything else yields an empty payload.
pub fn decode_payload(bytes: &[u8]) -> Payload {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Payload::new();
    }

    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            tracing::debug!(kind = json_kind(&other), "Ignoring non-object request body");
            Payload::new()
        }
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring malformed request body");
            Payload::new()
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_decode_object() {
        let payload = decode_payload(br#"{"title":"A","description":"B"}"#);
        assert_eq!(payload["title"], "A");
        assert_eq!(payload["description"], "B");
    }

    #[test]
    fn test_decode_rejects_non_objects() {
        assert!(decode_payload(b"").is_empty());
        assert!(decode_payload(b"  \n").is_empty());
        assert!(decode_payload(b"[1,2]").is_empty());
        assert!(decode_payload(b"\"text\"").is_empty());
        assert!(decode_payload(b"{not json").is_empty());
    }

    #[test]
    fn test_request_id() {
        let mut headers = HeaderMap::new();
        assert_eq!(request_id(&headers), "unknown");

        headers.insert(X_REQUEST_ID, HeaderValue::from_static("abc"));
        assert_eq!(request_id(&headers), "abc");
    }

    #[tokio::test]
    async fn test_read_payload_limit() {
        let body = Body::from(r#"{"title":"A"}"#);
        let payload = read_payload(body, 1024).await.unwrap();
        assert_eq!(payload["title"], "A");

        let body = Body::from(vec![b' '; 64]);
        assert!(read_payload(body, 16).await.is_err());
    }
}
