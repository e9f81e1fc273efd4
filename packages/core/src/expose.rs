//! Capability exposure: composing a request future's surface onto a host.
//!
//! Integration code often wants to hand callers a transport-native handle
//! that also carries the request future. [`PromiseSurface`] wraps the host
//! value instead of mutating it: exposed capability names live in a table
//! owned by the surface, and every exposed name forwards to the one
//! deferred value behind the request.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::deferred::SettledFuture;

/// Name under which [`PromiseSurface::expose_promise`] installs the
/// accessor by default.
pub const PROMISE_CAPABILITY: &str = "promise";

/// What an exposed name maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capability {
    /// Forwards the named combinator of the deferred value (`then`,
    /// `catch`, ...). Awaiting the claimed future is the combinator.
    Method(String),
    /// Zero-argument accessor yielding the deferred value itself.
    Promise,
}

/// Error attaching or claiming a capability.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExposeError {
    /// The surface already owns a capability under this name.
    #[error("unable to expose method \"{name}\"")]
    AlreadyExposed {
        /// The colliding name.
        name: String,
    },

    /// No capability was exposed under this name.
    #[error("capability \"{name}\" is not exposed")]
    NotExposed {
        /// The requested name.
        name: String,
    },

    /// The deferred value was already handed out.
    #[error("the request future was already claimed")]
    AlreadyClaimed,
}

/// Composition wrapper exposing a request future's capabilities on an
/// arbitrary host value.
pub struct PromiseSurface<H> {
    host: H,
    future: Option<SettledFuture>,
    exposed: BTreeMap<String, Capability>,
}

impl<H> PromiseSurface<H> {
    /// Wrap `host` with the capability surface of `future`.
    pub fn new(host: H, future: SettledFuture) -> Self {
        Self {
            host,
            future: Some(future),
            exposed: BTreeMap::new(),
        }
    }

    /// Expose a promise method (e.g. `then`, `catch`) under its own name.
    pub fn expose_promise_method(&mut self, method: &str) -> Result<(), ExposeError> {
        self.expose_promise_method_as(method, method)
    }

    /// Expose a promise method under a different name.
    pub fn expose_promise_method_as(
        &mut self,
        method: &str,
        exposed_as: &str,
    ) -> Result<(), ExposeError> {
        self.install(exposed_as, Capability::Method(method.to_string()))
    }

    /// Expose the deferred value itself as a `promise` accessor.
    pub fn expose_promise(&mut self) -> Result<(), ExposeError> {
        self.install(PROMISE_CAPABILITY, Capability::Promise)
    }

    /// Expose the deferred value accessor under a different name.
    pub fn expose_promise_as(&mut self, exposed_as: &str) -> Result<(), ExposeError> {
        self.install(exposed_as, Capability::Promise)
    }

    fn install(&mut self, exposed_as: &str, capability: Capability) -> Result<(), ExposeError> {
        if self.exposed.contains_key(exposed_as) {
            return Err(ExposeError::AlreadyExposed {
                name: exposed_as.to_string(),
            });
        }
        self.exposed.insert(exposed_as.to_string(), capability);
        Ok(())
    }

    /// Whether a capability is exposed under `name`.
    pub fn is_exposed(&self, name: &str) -> bool {
        self.exposed.contains_key(name)
    }

    /// The capability exposed under `name`.
    pub fn capability(&self, name: &str) -> Option<&Capability> {
        self.exposed.get(name)
    }

    /// Names exposed on this surface.
    pub fn exposed_names(&self) -> impl Iterator<Item = &str> {
        self.exposed.keys().map(String::as_str)
    }

    /// Claim the request future through the capability exposed as `name`.
    ///
    /// Every exposed capability forwards to the same single future, so it
    /// can be claimed exactly once, through any exposed name.
    pub fn claim(&mut self, name: &str) -> Result<SettledFuture, ExposeError> {
        if !self.exposed.contains_key(name) {
            return Err(ExposeError::NotExposed {
                name: name.to_string(),
            });
        }
        self.future.take().ok_or(ExposeError::AlreadyClaimed)
    }

    /// The wrapped host.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// The wrapped host, mutably.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Unwrap the host.
    pub fn into_host(self) -> H {
        self.host
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deferred::deferred;
    use serde_json::json;

    fn surface() -> PromiseSurface<&'static str> {
        let (settler, future) = deferred();
        settler.resolve(json!(5));
        PromiseSurface::new("host", future)
    }

    #[test]
    fn exposes_a_method_under_its_own_name() {
        let mut surface = surface();
        surface.expose_promise_method("then").expect("exposed");

        assert!(surface.is_exposed("then"));
        assert_eq!(
            surface.capability("then"),
            Some(&Capability::Method("then".to_string()))
        );
    }

    #[test]
    fn exposes_a_method_under_a_different_name() {
        let mut surface = surface();
        surface
            .expose_promise_method_as("then", "next")
            .expect("exposed");

        assert!(surface.is_exposed("next"));
        assert!(!surface.is_exposed("then"));
    }

    #[test]
    fn exposes_the_promise_accessor() {
        let mut surface = surface();
        surface.expose_promise().expect("exposed");

        assert_eq!(surface.capability("promise"), Some(&Capability::Promise));
    }

    #[test]
    fn exposes_the_promise_accessor_under_a_different_name() {
        let mut surface = surface();
        surface.expose_promise_as("promise2").expect("exposed");

        assert!(surface.is_exposed("promise2"));
        assert!(!surface.is_exposed("promise"));
    }

    #[test]
    fn does_not_overwrite_an_existing_capability() {
        let mut surface = surface();
        surface.expose_promise_method("then").expect("exposed");

        let error = surface
            .expose_promise_as("then")
            .expect_err("collision refused");

        assert_eq!(error.to_string(), "unable to expose method \"then\"");
        // The original capability is untouched.
        assert_eq!(
            surface.capability("then"),
            Some(&Capability::Method("then".to_string()))
        );
        assert_eq!(surface.exposed_names().count(), 1);
    }

    #[tokio::test]
    async fn claims_the_future_through_an_exposed_name() {
        let mut surface = surface();
        surface.expose_promise_method("then").expect("exposed");

        let future = surface.claim("then").expect("claimed");
        assert_eq!(future.await.expect("resolved"), json!(5));
    }

    #[test]
    fn refuses_to_claim_a_name_that_is_not_exposed() {
        let mut surface = surface();

        let error = surface.claim("then").expect_err("not exposed");
        assert_eq!(
            error,
            ExposeError::NotExposed {
                name: "then".to_string()
            }
        );
    }

    #[test]
    fn refuses_a_second_claim() {
        let mut surface = surface();
        surface.expose_promise().expect("exposed");
        surface.expose_promise_method("then").expect("exposed");

        surface.claim("promise").expect("first claim");
        let error = surface.claim("then").expect_err("second claim refused");
        assert_eq!(error, ExposeError::AlreadyClaimed);
    }

    #[test]
    fn keeps_the_host_reachable() {
        let mut surface = surface();
        assert_eq!(*surface.host(), "host");
        assert_eq!(*surface.host_mut(), "host");
        assert_eq!(surface.into_host(), "host");
    }
}
