//! The request envelope shared by every view.
//!
//! # Design
//! `RequestClient` owns the base URL, a `Transport` and a read-only handle on
//! the `CredentialStore`. A call is split in two deterministic halves around
//! the transport: `build_request` injects headers, `parse_response` turns the
//! status and body into a JSON value or a normalized `ApiError`. `request`
//! composes them. Nothing is cached or retried.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::credentials::CredentialStore;
use crate::error::{failure_message, ApiError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};

/// Per-call options: method, pre-serialized JSON body and extra headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub method: HttpMethod,
    pub body: Option<String>,
    pub headers: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn new(method: HttpMethod) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_json<T: Serialize>(self, payload: &T) -> Result<Self, ApiError> {
        let body = serde_json::to_string(payload).map_err(ApiError::Serialize)?;
        Ok(self.with_body(body))
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

/// Issues requests against one API origin.
pub struct RequestClient {
    base_url: String,
    transport: Box<dyn Transport>,
    credentials: Arc<dyn CredentialStore>,
}

impl RequestClient {
    /// `base_url` is used verbatim; paths are appended to it without any
    /// normalization.
    pub fn new(
        base_url: &str,
        transport: impl Transport + 'static,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            base_url: base_url.to_string(),
            transport: Box::new(transport),
            credentials,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> &dyn CredentialStore {
        self.credentials.as_ref()
    }

    /// Build the outgoing request. Caller headers are applied first, then
    /// `Content-Type` and (when a token is stored) `Authorization` overwrite
    /// any same-named caller header.
    pub fn build_request(&self, path: &str, options: &RequestOptions) -> HttpRequest {
        let mut headers = options.headers.clone();
        set_header(&mut headers, "Content-Type", "application/json");
        if let Some(token) = self.credentials.token() {
            set_header(&mut headers, "Authorization", &format!("Bearer {token}"));
        }

        HttpRequest {
            method: options.method,
            url: format!("{}{}", self.base_url, path),
            headers,
            body: options.body.clone(),
        }
    }

    /// Interpret a response: non-2xx becomes `ApiError::Request`, 204 and
    /// empty bodies become `None`, anything else must be JSON.
    pub fn parse_response(&self, response: HttpResponse) -> Result<Option<Value>, ApiError> {
        if !response.is_success() {
            let message = failure_message(&response.body);
            warn!(status = response.status, %message, "request failed");
            return Err(ApiError::Request {
                status: response.status,
                message,
            });
        }
        if response.status == 204 || response.body.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&response.body)
            .map(Some)
            .map_err(ApiError::Decode)
    }

    /// Build, execute and parse a single request.
    pub fn request(&self, path: &str, options: RequestOptions) -> Result<Option<Value>, ApiError> {
        let request = self.build_request(path, &options);
        debug!(
            method = %request.method,
            url = %request.url,
            authorized = request.header("Authorization").is_some(),
            "sending request"
        );
        let response = self.transport.execute(&request)?;
        debug!(status = response.status, url = %request.url, "received response");
        self.parse_response(response)
    }
}

/// Replace every header named `name` (ignoring case) with a single value.
fn set_header(headers: &mut Vec<(String, String)>, name: &str, value: &str) {
    headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
    headers.push((name.to_string(), value.to_string()));
}
