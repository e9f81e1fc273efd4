//! The callback-to-future adaptation engine.
//!
//! [`Engine::init`] installs a deferred value and the per-request option
//! policy on a fresh [`RequestContext`] before dispatch. When the
//! transport finishes, it hands its completion signal to
//! [`Engine::complete`], which interprets it exactly once: transport
//! errors reject outright, transforms run and are awaited uniformly, and
//! the status code classifies the outcome under simple mode.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, trace};

use crate::deferred::{deferred, SettledFuture, Settler};
use crate::errors::{Cause, Failure, StatusResponse};
use crate::options::{NormalizedOptions, RequestOptions};
use crate::types::HttpResponse;

/// Hook invoked during [`Engine::init`] with the fresh request's settler,
/// letting integration code observe or chain the settlement without the
/// engine knowing the integration's shape.
pub type InitHook = Arc<dyn Fn(&Settler) + Send + Sync>;

/// The single completion signal a transport produces when a request
/// finishes or fails.
#[derive(Debug)]
pub enum Completion {
    /// The transport could not complete the request at all.
    Error {
        /// The transport-level error.
        cause: Cause,
        /// Partial response, when the transport produced one before
        /// failing.
        response: Option<HttpResponse>,
    },
    /// The transport completed the request.
    Response(HttpResponse),
}

/// Per-request state installed by [`Engine::init`].
///
/// One per logical request, never reused: the deferred value it carries
/// is settled by exactly one [`Engine::complete`] invocation.
#[derive(Default)]
pub struct RequestContext {
    settler: Option<Settler>,
    future: Option<SettledFuture>,
    options: Option<NormalizedOptions>,
}

impl RequestContext {
    /// Create an empty context, ready for [`Engine::init`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the request future installed by `init`, for exposure to the
    /// caller. Yields the future exactly once.
    pub fn take_future(&mut self) -> Option<SettledFuture> {
        self.future.take()
    }

    /// The settler installed by `init`, if it ran and no completion has
    /// been interpreted yet.
    pub fn settler(&self) -> Option<&Settler> {
        self.settler.as_ref()
    }

    /// Options resolved by `init`, if it ran.
    pub fn options(&self) -> Option<&NormalizedOptions> {
        self.options.as_ref()
    }
}

/// The adaptation engine.
///
/// Holds the configuration-time hooks; all per-request state lives on the
/// [`RequestContext`].
#[derive(Clone, Default)]
pub struct Engine {
    init_hook: Option<InitHook>,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a hook invoked on every [`Engine::init`] with the request's
    /// settler.
    pub fn with_init_hook(mut self, hook: InitHook) -> Self {
        self.init_hook = Some(hook);
        self
    }

    /// Install a fresh deferred value and the resolved option policy on
    /// `context`. Called once per request, before dispatch.
    pub fn init(&self, context: &mut RequestContext, options: RequestOptions) {
        let (settler, future) = deferred();

        if let Some(hook) = &self.init_hook {
            hook(&settler);
        }

        context.settler = Some(settler);
        context.future = Some(future);
        context.options = Some(NormalizedOptions::resolve(options));
    }

    /// Interpret a completion signal and settle the context's deferred
    /// value.
    ///
    /// Invoked by the transport at most once per context; a second
    /// invocation is a no-op, and a context that never sees one leaves its
    /// future pending forever.
    pub async fn complete(&self, context: &mut RequestContext, completion: Completion) {
        let (Some(settler), Some(options)) = (context.settler.take(), context.options.clone())
        else {
            debug!("completion for an uninitialized or already completed context");
            return;
        };

        match completion {
            Completion::Error { cause, response } => {
                debug!(error = %cause, "transport failed before completing the request");
                settler.reject(Failure::transport(
                    cause.clone(),
                    options.clone(),
                    response.clone(),
                ));
                invoke_callback(&options, Some(&cause), response.as_ref(), &Value::Null);
            }
            Completion::Response(response) => {
                Self::settle_response(&settler, &options, &response).await;
                invoke_callback(&options, None, Some(&response), &response.body);
            }
        }
    }

    async fn settle_response(
        settler: &Settler,
        options: &NormalizedOptions,
        response: &HttpResponse,
    ) {
        let is_success = response.is_success();
        let applicable_transform = options
            .transform
            .as_ref()
            .filter(|_| !options.transform_2xx_only || is_success);

        let transformed = if let Some(transform) = applicable_transform {
            match transform(
                response.body.clone(),
                response,
                options.resolve_with_full_response,
            )
            .await
            {
                Ok(value) => Some(value),
                Err(cause) => {
                    // A transform error always wins over status
                    // classification.
                    debug!(error = %cause, "transform failed");
                    settler.reject(Failure::transform(
                        cause,
                        options.clone(),
                        Some(response.clone()),
                    ));
                    return;
                }
            }
        } else {
            None
        };

        if is_success || !options.simple {
            let value = match transformed {
                Some(value) => value,
                None if options.resolve_with_full_response => response.to_value(),
                None => response.body.clone(),
            };
            trace!(status = response.status_code, "resolving request future");
            settler.resolve(value);
        } else {
            // Callers who transformed an error body see the transformed
            // value in the failure's response slot; the body stays raw.
            let status_response = match transformed {
                Some(value) => StatusResponse::Transformed(value),
                None => StatusResponse::Raw(response.clone()),
            };
            trace!(status = response.status_code, "rejecting request future");
            settler.reject(Failure::status(
                response.status_code,
                response.body.clone(),
                options.clone(),
                status_response,
            ));
        }
    }
}

fn invoke_callback(
    options: &NormalizedOptions,
    error: Option<&Cause>,
    response: Option<&HttpResponse>,
    body: &Value,
) {
    if let Some(callback) = &options.completion_callback {
        callback(error, response, body);
    }
}
