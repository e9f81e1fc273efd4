//! Request factory wiring the adaptation engine to a transport.
//!
//! A [`Client`] is configured once (which capabilities to expose, an
//! optional init hook) and validated before any request can be made.
//! Every [`Client::request`] call then produces an independently wired
//! dispatch: fresh context, fresh deferred value, one completion. There is
//! no process-global state; two clients with different configurations
//! coexist freely.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use settle_core::{
    deferred, Completion, Engine, InitHook, PromiseSurface, RequestContext, RequestOptions,
    PROMISE_CAPABILITY,
};

use crate::transport::Transport;
use crate::types::HttpRequest;

/// Capability every client must expose.
const THEN_CAPABILITY: &str = "then";

/// Configuration for a [`Client`].
#[derive(Default)]
pub struct ClientConfig {
    /// Capability names exposed on every dispatched request's surface.
    /// Must be non-empty and contain `"then"`.
    pub expose: Vec<String>,

    /// Hook invoked with each request's settler during initialization.
    pub init_hook: Option<InitHook>,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expose(mut self, name: impl Into<String>) -> Self {
        self.expose.push(name.into());
        self
    }

    pub fn with_init_hook(mut self, hook: InitHook) -> Self {
        self.init_hook = Some(hook);
        self
    }
}

/// Configuration error, reported before any request is dispatched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The exposed capability set is empty.
    #[error("please verify the exposed capability set: it must not be empty")]
    NoCapabilities,

    /// `then` is missing from the exposed capability set.
    #[error("please expose \"then\"")]
    ThenNotExposed,

    /// A capability name appears twice in the set.
    #[error("please verify the exposed capability set: \"{name}\" appears more than once")]
    DuplicateCapability {
        /// The repeated name.
        name: String,
    },
}

/// Echo of a dispatched request, used as the host of its exposed surface.
#[derive(Debug, Clone)]
pub struct Dispatched {
    /// The request handed to the transport.
    pub request: HttpRequest,
}

/// Factory producing independently configured request dispatches.
pub struct Client<T: Transport + 'static> {
    transport: Arc<T>,
    engine: Engine,
    expose: Vec<String>,
}

impl<T: Transport + 'static> Client<T> {
    /// Build a client, validating `config` before any request can be made.
    pub fn new(transport: T, config: ClientConfig) -> Result<Self, ConfigError> {
        if config.expose.is_empty() {
            return Err(ConfigError::NoCapabilities);
        }
        if !config.expose.iter().any(|name| name == THEN_CAPABILITY) {
            return Err(ConfigError::ThenNotExposed);
        }
        for (index, name) in config.expose.iter().enumerate() {
            if config.expose[..index].contains(name) {
                return Err(ConfigError::DuplicateCapability { name: name.clone() });
            }
        }

        let mut engine = Engine::new();
        if let Some(hook) = config.init_hook {
            engine = engine.with_init_hook(hook);
        }

        Ok(Self {
            transport: Arc::new(transport),
            engine,
            expose: config.expose,
        })
    }

    /// Dispatch `request` under `options`, returning its capability
    /// surface.
    ///
    /// The transport runs on a background task; the surface's future
    /// settles when the transport's completion signal is interpreted.
    /// Must be called within a tokio runtime.
    pub fn request(
        &self,
        request: HttpRequest,
        options: RequestOptions,
    ) -> PromiseSurface<Dispatched> {
        // The wire request is the source of truth for the method-sensitive
        // option policy (HEAD handling).
        let options = options.with_method(request.method.as_str());

        let mut context = RequestContext::new();
        self.engine.init(&mut context, options);

        let future = context.take_future().unwrap_or_else(|| {
            // Unreachable after init; an unsettleable future mirrors an
            // uninitialized context.
            let (_, future) = deferred();
            future
        });

        let mut surface = PromiseSurface::new(
            Dispatched {
                request: request.clone(),
            },
            future,
        );
        for name in &self.expose {
            let exposed = if name == PROMISE_CAPABILITY {
                surface.expose_promise()
            } else {
                surface.expose_promise_method(name)
            };
            if let Err(error) = exposed {
                // Duplicates were rejected at construction time.
                debug!(%error, "skipping capability");
            }
        }

        let transport = Arc::clone(&self.transport);
        let engine = self.engine.clone();
        tokio::spawn(async move {
            let completion = match transport.dispatch(&request).await {
                Ok(response) => Completion::Response(response),
                Err(cause) => Completion::Error {
                    cause,
                    response: None,
                },
            };
            engine.complete(&mut context, completion).await;
        });

        surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::scripted::ScriptedTransport;
    use serde_json::json;
    use settle_core::{Failure, HttpResponse};
    use std::sync::atomic::{AtomicBool, Ordering};

    fn config() -> ClientConfig {
        ClientConfig::new()
            .expose("then")
            .expose("catch")
            .expose("promise")
    }

    #[test]
    fn rejects_an_empty_capability_set() {
        let result = Client::new(ScriptedTransport::new(), ClientConfig::new());
        assert!(matches!(result, Err(ConfigError::NoCapabilities)));
    }

    #[test]
    fn requires_then_to_be_exposed() {
        let result = Client::new(
            ScriptedTransport::new(),
            ClientConfig::new().expose("promise"),
        );
        let error = match result {
            Err(error) => error,
            Ok(_) => panic!("configuration accepted"),
        };
        assert_eq!(error, ConfigError::ThenNotExposed);
        assert_eq!(error.to_string(), "please expose \"then\"");
    }

    #[test]
    fn rejects_duplicate_capability_names() {
        let result = Client::new(
            ScriptedTransport::new(),
            ClientConfig::new().expose("then").expose("then"),
        );
        assert!(matches!(
            result,
            Err(ConfigError::DuplicateCapability { .. })
        ));
    }

    #[tokio::test]
    async fn dispatch_resolves_through_the_exposed_surface() {
        let transport = ScriptedTransport::new().with_response(
            "/200",
            HttpResponse::new(200, "OK").with_body(json!("GET /200")),
        );
        let client = Client::new(transport, config()).expect("valid config");

        let mut surface = client.request(HttpRequest::get("/200"), RequestOptions::new());
        assert!(surface.is_exposed("then"));
        assert!(surface.is_exposed("catch"));
        assert!(surface.is_exposed("promise"));
        assert_eq!(surface.host().request.url, "/200");

        let future = surface.claim("then").expect("claimed");
        assert_eq!(future.await.expect("resolved"), json!("GET /200"));
    }

    #[tokio::test]
    async fn dispatch_failure_surfaces_as_a_transport_failure() {
        let transport = ScriptedTransport::new().fail_with("connection refused");
        let client = Client::new(transport, config()).expect("valid config");

        let mut surface = client.request(HttpRequest::get("/any"), RequestOptions::new());
        let future = surface.claim("catch").expect("claimed");

        let failure = future.await.expect_err("rejected");
        assert!(matches!(failure, Failure::Transport { .. }));
        assert_eq!(failure.to_string(), "connection refused");
    }

    #[tokio::test]
    async fn init_hook_fires_even_when_the_transport_fails() {
        let fired = Arc::new(AtomicBool::new(false));
        let observed = Arc::clone(&fired);
        let transport = ScriptedTransport::new().fail_with("unreachable");
        let client = Client::new(
            transport,
            config().with_init_hook(Arc::new(move |_| {
                observed.store(true, Ordering::SeqCst);
            })),
        )
        .expect("valid config");

        let mut surface = client.request(HttpRequest::get("/any"), RequestOptions::new());
        let future = surface.claim("then").expect("claimed");
        let _ = future.await;

        assert!(fired.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn head_requests_resolve_with_headers_by_default() {
        let transport = ScriptedTransport::new().with_response(
            "/resource",
            HttpResponse::new(200, "OK").with_header("content-length", "42"),
        );
        let client = Client::new(transport, config()).expect("valid config");

        let mut surface = client.request(HttpRequest::head("/resource"), RequestOptions::new());
        let future = surface.claim("then").expect("claimed");

        assert_eq!(
            future.await.expect("resolved"),
            json!({"content-length": "42"})
        );
    }
}
