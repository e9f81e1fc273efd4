//! Failure taxonomy for settled requests.
//!
//! Every rejected request future carries one of the three [`Failure`]
//! kinds: the transport failed outright, the status code fell outside the
//! accepted range, or a transform failed. The kinds are matchable variants
//! so callers can branch on them instead of inspecting message strings.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::message::status_message;
use crate::options::NormalizedOptions;
use crate::types::HttpResponse;

/// Underlying cause of a transport or transform failure.
///
/// Shared so the same cause can be carried by the failure and handed to a
/// legacy completion callback.
pub type Cause = Arc<dyn std::error::Error + Send + Sync>;

/// Build a [`Cause`] from a bare message, for failures that have no richer
/// source error.
pub fn message_cause(message: impl Into<String>) -> Cause {
    Arc::new(MessageError(message.into()))
}

#[derive(Debug)]
struct MessageError(String);

impl fmt::Display for MessageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for MessageError {}

/// Response recorded on a status failure.
///
/// When a transform ran on an error-path body, the transformed value is
/// kept here while [`Failure::Status`]'s `body` field stays untransformed:
/// callers who transform error bodies see their transformed value through
/// the response accessors, and the raw body through `cause`/`error`.
#[derive(Debug)]
pub enum StatusResponse {
    /// No transform ran; the raw response.
    Raw(HttpResponse),
    /// A transform ran; its output.
    Transformed(Value),
}

/// A failed request, as carried by a rejected request future.
#[derive(Debug, Error)]
pub enum Failure {
    /// The transport could not complete the request at all.
    #[error("{cause}")]
    Transport {
        /// The transport-level error.
        cause: Cause,
        /// Options in effect when the request failed.
        options: NormalizedOptions,
        /// Partial response, when the transport produced one before
        /// failing.
        response: Option<HttpResponse>,
    },

    /// The transport completed, but the status code fell outside the
    /// accepted range under simple mode.
    #[error("{} - {}", status_message(*.status_code), .body)]
    Status {
        /// The response's status code.
        status_code: u16,
        /// The untransformed response body.
        body: Value,
        /// Options in effect when the request failed.
        options: NormalizedOptions,
        /// The raw response, or the transform's output when one ran.
        response: StatusResponse,
    },

    /// A transform threw or produced a rejected result.
    #[error("{cause}")]
    Transform {
        /// The error produced by the transform.
        cause: Cause,
        /// Options in effect when the request failed.
        options: NormalizedOptions,
        /// The response whose body was being transformed.
        response: Option<HttpResponse>,
    },
}

/// The underlying value behind a failure, reachable through both
/// [`Failure::cause`] and the backward-compatible [`Failure::error`].
#[derive(Debug)]
pub enum FailureCause<'a> {
    /// A transport or transform error.
    Error(&'a (dyn std::error::Error + Send + Sync + 'static)),
    /// The untransformed body of a status failure.
    Body(&'a Value),
}

impl fmt::Display for FailureCause<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureCause::Error(error) => write!(f, "{}", error),
            FailureCause::Body(body) => write!(f, "{}", body),
        }
    }
}

impl Failure {
    /// Transport failure wrapping a transport-level error.
    pub fn transport(
        cause: Cause,
        options: NormalizedOptions,
        response: Option<HttpResponse>,
    ) -> Self {
        Failure::Transport {
            cause,
            options,
            response,
        }
    }

    /// Status failure for a response outside the accepted range.
    pub fn status(
        status_code: u16,
        body: Value,
        options: NormalizedOptions,
        response: StatusResponse,
    ) -> Self {
        Failure::Status {
            status_code,
            body,
            options,
            response,
        }
    }

    /// Transform failure wrapping the error produced by a transform.
    pub fn transform(
        cause: Cause,
        options: NormalizedOptions,
        response: Option<HttpResponse>,
    ) -> Self {
        Failure::Transform {
            cause,
            options,
            response,
        }
    }

    /// The underlying value: the transport error, the untransformed body,
    /// or the transform error.
    pub fn cause(&self) -> FailureCause<'_> {
        match self {
            Failure::Transport { cause, .. } | Failure::Transform { cause, .. } => {
                FailureCause::Error(cause.as_ref())
            }
            Failure::Status { body, .. } => FailureCause::Body(body),
        }
    }

    /// Backward-compatible alias for [`Failure::cause`]; both names reach
    /// the identical value.
    pub fn error(&self) -> FailureCause<'_> {
        self.cause()
    }

    /// Options in effect when the failure was constructed.
    pub fn options(&self) -> &NormalizedOptions {
        match self {
            Failure::Transport { options, .. }
            | Failure::Status { options, .. }
            | Failure::Transform { options, .. } => options,
        }
    }

    /// The raw response, if one was received and not replaced by a
    /// transform (see [`StatusResponse`]).
    pub fn response(&self) -> Option<&HttpResponse> {
        match self {
            Failure::Transport { response, .. } | Failure::Transform { response, .. } => {
                response.as_ref()
            }
            Failure::Status {
                response: StatusResponse::Raw(response),
                ..
            } => Some(response),
            Failure::Status { .. } => None,
        }
    }

    /// The transform output recorded when a transform ran on an error-path
    /// body.
    pub fn transformed_response(&self) -> Option<&Value> {
        match self {
            Failure::Status {
                response: StatusResponse::Transformed(value),
                ..
            } => Some(value),
            _ => None,
        }
    }

    /// The status code, for status failures.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Failure::Status { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }
}
