use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// HTTP response as seen by the adaptation engine.
///
/// Transports construct one of these from whatever wire client they use.
/// The engine inspects the status code, the headers, and the parsed body;
/// everything else stays the transport's business.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status_code: u16,

    /// Status text (e.g., "OK", "Not Found")
    pub status_text: String,

    /// Response headers
    pub headers: HashMap<String, String>,

    /// Response body as JSON value
    ///
    /// Transports put non-JSON bodies here as `Value::String`.
    pub body: Value,
}

impl HttpResponse {
    /// Create a response with the given status line and no headers or body.
    pub fn new(status_code: u16, status_text: impl Into<String>) -> Self {
        Self {
            status_code,
            status_text: status_text.into(),
            headers: HashMap::new(),
            body: Value::Null,
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Check if the response status indicates success (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Structural form of the full response.
    ///
    /// Used as the settled value when a request is configured to resolve
    /// with the full response instead of the body.
    pub fn to_value(&self) -> Value {
        let mut object = serde_json::Map::new();
        object.insert("status_code".to_string(), Value::from(self.status_code));
        object.insert(
            "status_text".to_string(),
            Value::String(self.status_text.clone()),
        );
        object.insert("headers".to_string(), self.headers_value());
        object.insert("body".to_string(), self.body.clone());
        Value::Object(object)
    }

    /// Headers as a JSON object, the default resolved value for HEAD
    /// requests.
    pub fn headers_value(&self) -> Value {
        let mut headers = serde_json::Map::new();
        for (name, value) in &self.headers {
            headers.insert(name.clone(), Value::String(value.clone()));
        }
        Value::Object(headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_is_the_2xx_range() {
        assert!(!HttpResponse::new(199, "").is_success());
        assert!(HttpResponse::new(200, "OK").is_success());
        assert!(HttpResponse::new(299, "").is_success());
        assert!(!HttpResponse::new(300, "Multiple Choices").is_success());
        assert!(!HttpResponse::new(404, "Not Found").is_success());
    }

    #[test]
    fn to_value_carries_the_whole_response() {
        let response = HttpResponse::new(200, "OK")
            .with_header("content-type", "application/json")
            .with_body(json!({"ok": true}));

        assert_eq!(
            response.to_value(),
            json!({
                "status_code": 200,
                "status_text": "OK",
                "headers": {"content-type": "application/json"},
                "body": {"ok": true},
            })
        );
    }

    #[test]
    fn headers_value_is_a_json_object() {
        let response = HttpResponse::new(204, "No Content")
            .with_header("etag", "abc")
            .with_header("server", "settle");

        assert_eq!(
            response.headers_value(),
            json!({"etag": "abc", "server": "settle"})
        );
    }
}
