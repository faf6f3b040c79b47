//! Response builders for API Gateway proxy responses.

use serde_json::{Map, Value, json};

pub const CORS_ALLOW_ORIGIN: &str = "*";
pub const CORS_ALLOW_HEADERS: &str = "authorization, x-client-info, apikey, content-type";
pub const CORS_ALLOW_METHODS: &str = "POST, OPTIONS";

/// Returns a 200 OK response with a JSON body.
#[must_use]
pub fn ok_json(body: &Value) -> Value {
    json!({
        "statusCode": 200,
        "headers": { "Content-Type": "application/json" },
        "body": body.to_string()
    })
}

/// Returns an error response with the given status code and message.
#[must_use]
pub fn err_response(status_code: u16, message: &str) -> Value {
    json!({
        "statusCode": status_code,
        "headers": { "Content-Type": "application/json" },
        "body": json!({ "error": message }).to_string()
    })
}

/// Answers a CORS preflight request.
#[must_use]
pub fn preflight() -> Value {
    with_cors(json!({ "statusCode": 200, "body": "ok" }))
}

/// Adds the permissive CORS headers to a response, keeping existing headers.
#[must_use]
pub fn with_cors(mut response: Value) -> Value {
    let mut headers = response
        .get("headers")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_else(Map::new);

    headers.insert(
        "Access-Control-Allow-Origin".to_string(),
        json!(CORS_ALLOW_ORIGIN),
    );
    headers.insert(
        "Access-Control-Allow-Headers".to_string(),
        json!(CORS_ALLOW_HEADERS),
    );
    headers.insert(
        "Access-Control-Allow-Methods".to_string(),
        json!(CORS_ALLOW_METHODS),
    );

    response["headers"] = Value::Object(headers);
    response
}
