//! Human-readable summaries for HTTP status codes.

use http::StatusCode;

/// Build a human-readable summary for a status code.
///
/// Codes with a registered reason phrase use it (`"302 - Found"`). Codes
/// inside `[100, 600)` without one fall back to the generic class label
/// from RFC 2616 Section 10 (`"260 - OK"`). Anything else is rendered as
/// the bare code (`"600"`).
pub fn status_message(status_code: u16) -> String {
    let reason = StatusCode::from_u16(status_code)
        .ok()
        .and_then(|status| status.canonical_reason());

    let suffix = match reason {
        Some(phrase) => phrase,
        None => match status_code {
            100..=199 => "Informational",
            200..=299 => "OK",
            300..=399 => "Redirection",
            400..=499 => "Client Error",
            500..=599 => "Server Error",
            _ => return status_code.to_string(),
        },
    };

    format!("{} - {}", status_code, suffix)
}
