use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;

use crate::core::models::ParseRequest;
use crate::errors::LedgerError;

pub fn get_header_value<'a>(payload: &'a Value, name: &str) -> Option<&'a str> {
    let headers = payload.get("headers")?;
    if let Some(v) = headers.get(name).and_then(|s| s.as_str()) {
        return Some(v);
    }
    headers.as_object().and_then(|map| {
        map.iter().find_map(|(k, v)| {
            if k.eq_ignore_ascii_case(name) {
                v.as_str()
            } else {
                None
            }
        })
    })
}

/// HTTP method of a REST API (`httpMethod`) or HTTP API / Function URL
/// (`requestContext.http.method`) event.
pub fn request_method(payload: &Value) -> Option<&str> {
    payload
        .get("httpMethod")
        .and_then(|v| v.as_str())
        .or_else(|| {
            payload
                .get("requestContext")
                .and_then(|c| c.get("http"))
                .and_then(|h| h.get("method"))
                .and_then(|m| m.as_str())
        })
}

pub fn is_preflight(payload: &Value) -> bool {
    request_method(payload).is_some_and(|m| m.eq_ignore_ascii_case("OPTIONS"))
}

/// Token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(payload: &Value) -> Option<&str> {
    let value = get_header_value(payload, "Authorization")?.trim();
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Extracts the request body as JSON.
///
/// Proxy events carry it as a (possibly base64-encoded) string under `body`;
/// a direct invocation passes the body object itself as the payload.
pub fn extract_body(payload: &Value) -> Result<Value, LedgerError> {
    let Some(body) = payload.get("body") else {
        if payload.is_object() && payload.get("headers").is_none() {
            return Ok(payload.clone());
        }
        return Err(LedgerError::InvalidRequest("Missing body".to_string()));
    };

    let Some(body_str) = body.as_str() else {
        return match body {
            Value::Object(_) => Ok(body.clone()),
            _ => Err(LedgerError::InvalidRequest(
                "Invalid body format".to_string(),
            )),
        };
    };

    let is_base64 = payload
        .get("isBase64Encoded")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let decoded = if is_base64 {
        let bytes = STANDARD
            .decode(body_str)
            .map_err(|e| LedgerError::InvalidRequest(format!("Invalid base64 body: {e}")))?;
        String::from_utf8(bytes)
            .map_err(|e| LedgerError::InvalidRequest(format!("Body is not UTF-8: {e}")))?
    } else {
        body_str.to_string()
    };

    serde_json::from_str(&decoded)
        .map_err(|e| LedgerError::InvalidRequest(format!("Body is not valid JSON: {e}")))
}

pub fn parse_request(payload: &Value) -> Result<ParseRequest, LedgerError> {
    let body = extract_body(payload)?;
    serde_json::from_value(body)
        .map_err(|e| LedgerError::InvalidRequest(format!("Unexpected request body: {e}")))
}
