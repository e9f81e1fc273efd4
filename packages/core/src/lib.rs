//! # settle-core
//!
//! Callback-to-future adaptation for HTTP transports.
//!
//! A transport produces a single completion signal when a request finishes
//! or fails. This crate converts that signal into a settled future: the
//! [`Engine`] installs a deferred value per request, interprets the
//! completion (transform pipeline, status-code policy, failure taxonomy),
//! and settles the future exactly once. The crate performs no I/O of its
//! own; transports live elsewhere and only drive the engine.
//!
//! ## Flow
//!
//! ```ignore
//! use settle_core::{Completion, Engine, RequestContext, RequestOptions};
//!
//! let engine = Engine::new();
//! let mut context = RequestContext::new();
//!
//! // Before dispatch: install the deferred value and the option policy.
//! engine.init(&mut context, RequestOptions::new().with_method("get"));
//! let future = context.take_future().unwrap();
//!
//! // When the transport finishes: interpret the completion once.
//! engine.complete(&mut context, Completion::Response(response)).await;
//!
//! // The future settles with the body, the full response, or a Failure.
//! let body = future.await?;
//! ```
//!
//! ## Modules
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`engine`] | `Engine`, `RequestContext`, `Completion` |
//! | [`deferred`] | Externally settled futures |
//! | [`options`] | Request options, transforms, normalization |
//! | [`errors`] | The `Failure` taxonomy |
//! | [`message`] | Status-code summaries |
//! | [`expose`] | Capability surfaces over host values |

pub mod deferred;
pub mod engine;
pub mod errors;
pub mod expose;
pub mod message;
pub mod options;
pub mod types;

// Re-export main types
pub use deferred::{deferred, SettleResult, SettledFuture, Settler};
pub use engine::{Completion, Engine, InitHook, RequestContext};
pub use errors::{message_cause, Cause, Failure, FailureCause, StatusResponse};
pub use expose::{Capability, ExposeError, PromiseSurface, PROMISE_CAPABILITY};
pub use message::status_message;
pub use options::{
    default_head_transform, sync_transform, BoxFuture, CompletionCallback, NormalizedOptions,
    RequestOptions, Transform,
};
pub use types::HttpResponse;
