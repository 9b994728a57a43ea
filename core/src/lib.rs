//! Blocking API client core for the todo service.
//!
//! # Overview
//! `RequestClient` is the envelope every screen goes through: it appends the
//! path to the configured base URL, injects `Content-Type` and, when a token
//! is stored, `Authorization: Bearer <token>`, and normalizes failed
//! responses into `ApiError::Request` carrying one human-readable message.
//!
//! # Design
//! - Requests and responses are plain data; a `Transport` does the I/O
//!   (`UreqTransport` in production, scripted fakes in tests).
//! - The token lives behind `CredentialStore` so storage is swappable.
//! - `TodoApi` adds one typed method per endpoint.
//! - `views` holds the per-screen state (signup, dashboard, chat). Server
//!   data is re-fetched after every mutation rather than patched locally.

pub mod api;
pub mod client;
pub mod credentials;
pub mod error;
pub mod hints;
pub mod http;
pub mod types;
pub mod views;

#[cfg(test)]
pub(crate) mod testing;

pub use api::TodoApi;
pub use client::{RequestClient, RequestOptions};
pub use credentials::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use error::{failure_message, ApiError};
pub use hints::friendly_hint;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError, UreqTransport};
pub use types::{ChatMessage, ChatReply, Credentials, NewTodo, Role, Todo, TodoPatch, TokenResponse};
pub use views::{AlwaysConfirm, ChatView, Confirm, DashboardView, Outcome, SignupView};
