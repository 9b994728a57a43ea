//! Error types for the todo API client.
//!
//! # Design
//! `Request` is the normalized application failure every view renders: its
//! `Display` is exactly the extracted message, nothing prepended. Transport
//! failures are carried as-is so callers see what the transport raised.

use serde_json::Value;
use thiserror::Error;

use crate::http::TransportError;

/// Message used when a failed response carries no body at all.
pub const GENERIC_FAILURE: &str = "Request failed";

/// Errors returned by `RequestClient` and the typed API on top of it.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a non-2xx status.
    #[error("{message}")]
    Request { status: u16, message: String },

    /// The HTTP round-trip itself failed.
    #[error(transparent)]
    Transport(TransportError),

    /// A success body was not the JSON the caller expected.
    #[error("invalid response body: {0}")]
    Decode(#[source] serde_json::Error),

    /// The request payload could not be serialized to JSON.
    #[error("failed to serialize request body: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl ApiError {
    /// User-facing text for this error.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// HTTP status of a normalized failure, `None` for everything else.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Request { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        ApiError::Transport(err)
    }
}

/// Best-effort human-readable message for a failed response body.
///
/// A string `detail` wins. Other `detail` shapes (validation error lists) and
/// detail-less JSON fall back to the compact JSON text of the whole body, keys
/// in the order the server sent them. A body that is not JSON (whitespace
/// included) is returned verbatim, and an empty body becomes
/// [`GENERIC_FAILURE`].
pub fn failure_message(body: &str) -> String {
    if body.is_empty() {
        return GENERIC_FAILURE.to_string();
    }
    match serde_json::from_str::<Value>(body) {
        Ok(value) => match value.get("detail") {
            Some(Value::String(detail)) if !detail.is_empty() => detail.clone(),
            _ => value.to_string(),
        },
        Err(_) => body.to_string(),
    }
}
