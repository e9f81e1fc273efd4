//! HTTP dispatch abstraction and the reqwest-backed implementation.
//!
//! The engine never performs I/O; a [`Transport`] does, and its result is
//! wired into the engine as the request's completion signal.
//! Implementations can use real HTTP clients or scripted responses for
//! testing.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use tracing::debug;

use settle_core::{Cause, HttpResponse};

use crate::types::HttpRequest;

/// Errors building or executing a wire request.
#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Invalid header name: {0}")]
    InvalidHeaderName(#[from] http::header::InvalidHeaderName),

    #[error("Invalid header value: {0}")]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),
}

/// Trait for dispatching HTTP requests.
///
/// A dispatch produces either a response or the cause the engine wraps
/// into a transport failure.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute an HTTP request and return the response.
    async fn dispatch(&self, request: &HttpRequest) -> Result<HttpResponse, Cause>;
}

/// Production transport using reqwest.
pub struct ReqwestTransport {
    client: Client,
    base_url: Option<url::Url>,
}

impl ReqwestTransport {
    /// Create a transport with the given request timeout.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: None,
        })
    }

    /// Create with default timeout of 30 seconds.
    pub fn with_default_timeout() -> Result<Self, TransportError> {
        Self::new(Duration::from_secs(30))
    }

    /// Resolve relative request URLs against a base URL.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, TransportError> {
        self.base_url = Some(url::Url::parse(base_url)?);
        Ok(self)
    }

    fn resolve_url(&self, request: &HttpRequest) -> Result<url::Url, TransportError> {
        if request.url.starts_with("http://") || request.url.starts_with("https://") {
            return Ok(url::Url::parse(&request.url)?);
        }
        match &self.base_url {
            Some(base) => Ok(base.join(&request.url)?),
            None => Ok(url::Url::parse(&request.url)?),
        }
    }

    /// Execute an HTTP request and return the response.
    async fn execute_request(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = self.resolve_url(request)?;
        let method: http::Method = request.method.clone().into();

        let mut headers = HeaderMap::new();
        for (name, value) in &request.headers {
            let header_name = HeaderName::try_from(name.as_str())?;
            let header_value = HeaderValue::try_from(value.as_str())?;
            headers.insert(header_name, header_value);
        }

        let mut req_builder = self.client.request(method, url);
        req_builder = req_builder.headers(headers);

        if !request.query.is_empty() {
            req_builder = req_builder.query(&request.query);
        }

        if let Some(body) = &request.body {
            req_builder = req_builder.json(body);
        }

        let response = req_builder.send().await?;

        let status_code = response.status().as_u16();
        let status_text = response
            .status()
            .canonical_reason()
            .unwrap_or("Unknown")
            .to_string();

        let mut resp_headers = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                resp_headers.insert(name.to_string(), v.to_string());
            }
        }

        let body_text = response.text().await?;
        let body = serde_json::from_str(&body_text)
            .unwrap_or(serde_json::Value::String(body_text));

        Ok(HttpResponse {
            status_code,
            status_text,
            headers: resp_headers,
            body,
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn dispatch(&self, request: &HttpRequest) -> Result<HttpResponse, Cause> {
        debug!(method = %request.method, url = %request.url, "dispatching request");
        self.execute_request(request)
            .await
            .map_err(|error| Arc::new(error) as Cause)
    }
}

/// Scripted transport for tests.
///
/// Returns predefined responses keyed by request URL, or a configured
/// failure.
#[cfg(test)]
pub(crate) mod scripted {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct ScriptedTransport {
        responses: Mutex<HashMap<String, HttpResponse>>,
        failure: Mutex<Option<String>>,
        dispatched: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Respond to `url` with `response`.
        pub fn with_response(self, url: impl Into<String>, response: HttpResponse) -> Self {
            self.responses
                .lock()
                .expect("responses lock")
                .insert(url.into(), response);
            self
        }

        /// Fail every dispatch with `message`.
        pub fn fail_with(self, message: impl Into<String>) -> Self {
            *self.failure.lock().expect("failure lock") = Some(message.into());
            self
        }

        /// Requests seen so far.
        pub fn dispatched(&self) -> Vec<HttpRequest> {
            self.dispatched.lock().expect("dispatched lock").clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn dispatch(&self, request: &HttpRequest) -> Result<HttpResponse, Cause> {
            self.dispatched
                .lock()
                .expect("dispatched lock")
                .push(request.clone());

            if let Some(message) = self.failure.lock().expect("failure lock").clone() {
                return Err(settle_core::message_cause(message));
            }

            let responses = self.responses.lock().expect("responses lock");
            match responses.get(&request.url) {
                Some(response) => Ok(response.clone()),
                None => Ok(HttpResponse::new(404, "Not Found")),
            }
        }
    }
}
