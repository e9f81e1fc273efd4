//! Request options and their per-request normalized form.
//!
//! Callers describe how a request's completion should be interpreted with
//! [`RequestOptions`]; [`init`](crate::engine::Engine::init) resolves them
//! once per request into [`NormalizedOptions`], applying defaults, case
//! normalization, and the default HEAD transform.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

use crate::errors::Cause;
use crate::types::HttpResponse;

/// Boxed future returned by transforms.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Response transform.
///
/// Receives the parsed body, the response, and the
/// `resolve_with_full_response` flag; produces the value the request
/// future settles with. The engine awaits the returned future uniformly,
/// so plain values and asynchronous results look the same to it.
pub type Transform =
    Arc<dyn Fn(Value, &HttpResponse, bool) -> BoxFuture<Result<Value, Cause>> + Send + Sync>;

/// Legacy completion hook.
///
/// Invoked with the untransformed `(error, response, body)` triple in
/// addition to settling the request future, after the settlement has been
/// determined. The body slot is `Value::Null` on the transport-error path.
pub type CompletionCallback =
    Arc<dyn Fn(Option<&Cause>, Option<&HttpResponse>, &Value) + Send + Sync>;

/// Wrap a synchronous transform function.
pub fn sync_transform<F>(transform: F) -> Transform
where
    F: Fn(Value, &HttpResponse, bool) -> Result<Value, Cause> + Send + Sync + 'static,
{
    Arc::new(move |body, response, resolve_with_full_response| {
        let result = transform(body, response, resolve_with_full_response);
        Box::pin(std::future::ready(result))
    })
}

/// Caller-supplied request options.
///
/// Unset fields take the defaults documented on [`NormalizedOptions`].
#[derive(Clone, Default)]
pub struct RequestOptions {
    /// HTTP method name, any case.
    pub method: Option<String>,
    /// See [`NormalizedOptions::simple`].
    pub simple: Option<bool>,
    /// See [`NormalizedOptions::resolve_with_full_response`].
    pub resolve_with_full_response: Option<bool>,
    /// See [`NormalizedOptions::transform`].
    pub transform: Option<Transform>,
    /// See [`NormalizedOptions::transform_2xx_only`].
    pub transform_2xx_only: Option<bool>,
    /// Legacy completion hook, invoked in addition to settling the future.
    pub callback: Option<CompletionCallback>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn with_simple(mut self, simple: bool) -> Self {
        self.simple = Some(simple);
        self
    }

    pub fn with_full_response(mut self, resolve_with_full_response: bool) -> Self {
        self.resolve_with_full_response = Some(resolve_with_full_response);
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn with_transform_2xx_only(mut self, transform_2xx_only: bool) -> Self {
        self.transform_2xx_only = Some(transform_2xx_only);
        self
    }

    pub fn with_callback(mut self, callback: CompletionCallback) -> Self {
        self.callback = Some(callback);
        self
    }
}

/// Options resolved once per request, with defaults applied.
#[derive(Clone)]
pub struct NormalizedOptions {
    /// HTTP method name, uppercased.
    pub method: Option<String>,
    /// When `true` (the default), non-2xx statuses reject the request
    /// future; when `false`, all statuses resolve it.
    pub simple: bool,
    /// When `true`, the settled value is the structural form of the full
    /// response instead of the body. Defaults to `false`.
    pub resolve_with_full_response: bool,
    /// Response transform, if any.
    pub transform: Option<Transform>,
    /// When `true`, the transform applies only to 2xx responses. Defaults
    /// to `false`.
    pub transform_2xx_only: bool,
    /// The caller's original completion callback, moved here so it cannot
    /// be double-registered when the completion hook is installed.
    pub(crate) completion_callback: Option<CompletionCallback>,
}

impl NormalizedOptions {
    /// Apply defaults and case normalization to caller-supplied options.
    pub(crate) fn resolve(options: RequestOptions) -> Self {
        let method = options.method.map(|method| method.to_uppercase());

        let mut normalized = Self {
            simple: options.simple.unwrap_or(true),
            resolve_with_full_response: options.resolve_with_full_response.unwrap_or(false),
            transform: options.transform,
            transform_2xx_only: options.transform_2xx_only.unwrap_or(false),
            completion_callback: options.callback,
            method,
        };

        // HEAD responses carry no meaningful body; unless the caller
        // supplied their own transform, resolve with the headers instead.
        if normalized.transform.is_none() && normalized.method.as_deref() == Some("HEAD") {
            normalized.transform = Some(default_head_transform());
        }

        normalized
    }
}

impl Default for NormalizedOptions {
    fn default() -> Self {
        Self::resolve(RequestOptions::default())
    }
}

impl fmt::Debug for NormalizedOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NormalizedOptions")
            .field("method", &self.method)
            .field("simple", &self.simple)
            .field(
                "resolve_with_full_response",
                &self.resolve_with_full_response,
            )
            .field("transform", &self.transform.as_ref().map(|_| ".."))
            .field("transform_2xx_only", &self.transform_2xx_only)
            .field(
                "completion_callback",
                &self.completion_callback.as_ref().map(|_| ".."),
            )
            .finish()
    }
}

/// Default transform for HEAD requests.
///
/// Resolves with the response headers, or the full response when
/// `resolve_with_full_response` is set. Installed only when no caller
/// transform exists yet, so a caller-supplied transform always wins.
pub fn default_head_transform() -> Transform {
    Arc::new(|_body, response, resolve_with_full_response| {
        let value = if resolve_with_full_response {
            response.to_value()
        } else {
            response.headers_value()
        };
        Box::pin(std::future::ready(Ok(value)))
    })
}
