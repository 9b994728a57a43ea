//! Friendly hints derived from error text.
//!
//! Keyword matching on backend prose is fragile. Hints are presentation only
//! and never change control flow.
// TODO: switch to structured error codes once the backend exposes them in
// the error body alongside `detail`.

pub const DUPLICATE_ACCOUNT: &str =
    "An account with this email already exists. Try logging in instead.";
pub const BAD_CREDENTIALS: &str = "Check your email and password and try again.";
pub const SESSION_EXPIRED: &str = "Your session is no longer valid. Please sign in again.";
pub const SERVER_UNREACHABLE: &str =
    "Could not reach the server. Check that the API is running and the URL is correct.";

/// Map an error message to a user-facing hint, if one applies.
pub fn friendly_hint(message: &str) -> Option<&'static str> {
    let text = message.to_ascii_lowercase();
    let has = |needle: &str| text.contains(needle);

    if has("already") || has("exists") || has("409") {
        Some(DUPLICATE_ACCOUNT)
    } else if has("token") && (has("invalid") || has("revoked") || has("expired")) {
        Some(SESSION_EXPIRED)
    } else if has("not authenticated") {
        Some(SESSION_EXPIRED)
    } else if has("invalid credentials") || has("unauthorized") || has("401") {
        Some(BAD_CREDENTIALS)
    } else if has("connection") || has("dns") || has("timed out") || has("refused") {
        Some(SERVER_UNREACHABLE)
    } else {
        None
    }
}
