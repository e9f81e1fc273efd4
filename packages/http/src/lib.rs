//! # settle-http
//!
//! Reqwest transport and request factory for the settle engine.
//!
//! `settle-core` turns a transport's completion signal into a settled
//! future but performs no I/O. This crate supplies the transport side: a
//! [`Transport`] trait with a reqwest implementation, a request
//! description type, and a [`Client`] factory that validates its
//! configuration up front and wires each dispatched request into the
//! engine.
//!
//! ## Example
//!
//! ```ignore
//! use settle_http::{Client, ClientConfig, HttpRequest, ReqwestTransport, RequestOptions};
//!
//! let transport = ReqwestTransport::with_default_timeout()?;
//! let client = Client::new(
//!     transport,
//!     ClientConfig::new().expose("then").expose("catch").expose("promise"),
//! )?;
//!
//! let mut surface = client.request(
//!     HttpRequest::get("https://api.example.com/users/123"),
//!     RequestOptions::new(),
//! );
//! let body = surface.claim("then")?.await?;
//! ```

pub mod client;
pub mod transport;
pub mod types;

// Re-export main types
pub use client::{Client, ClientConfig, ConfigError, Dispatched};
pub use transport::{ReqwestTransport, Transport, TransportError};
pub use types::{HttpRequest, InvalidMethod, Method};

// Re-export engine types for convenience
pub use settle_core::{
    message_cause, sync_transform, Cause, Completion, CompletionCallback, Engine, Failure,
    FailureCause, HttpResponse, PromiseSurface, RequestContext, RequestOptions, SettledFuture,
    Settler, StatusResponse, Transform,
};
