//! Signup and login form.
//!
//! # Design
//! Both actions end by storing the issued token in the client's
//! `CredentialStore`. Failures keep the server's message verbatim in `error`
//! and may add a friendly `hint` next to it.

use tracing::{info, warn};

use crate::api::TodoApi;
use crate::error::ApiError;
use crate::hints::friendly_hint;
use crate::types::{Credentials, TokenResponse};

use super::Outcome;

/// Signup/login form.
#[derive(Debug, Clone, Default)]
pub struct SignupView {
    pub email: String,
    pub password: String,
    pub error: Option<String>,
    pub hint: Option<String>,
}

impl SignupView {
    pub fn new(email: &str, password: &str) -> Self {
        Self {
            email: email.to_string(),
            password: password.to_string(),
            ..Self::default()
        }
    }

    /// Create the account and store the returned token.
    pub fn submit(&mut self, api: &TodoApi) -> Outcome {
        let result = api.signup(&self.credentials());
        self.finish(api, result)
    }

    /// Sign in to an existing account and store the returned token.
    pub fn login(&mut self, api: &TodoApi) -> Outcome {
        let result = api.login(&self.credentials());
        self.finish(api, result)
    }

    fn credentials(&self) -> Credentials {
        Credentials {
            email: self.email.trim().to_string(),
            password: self.password.clone(),
        }
    }

    fn finish(&mut self, api: &TodoApi, result: Result<TokenResponse, ApiError>) -> Outcome {
        self.error = None;
        self.hint = None;

        let token = match result {
            Ok(token) => token,
            Err(e) => {
                let message = e.to_string();
                self.hint = friendly_hint(&message).map(str::to_string);
                self.error = Some(message);
                return Outcome::Failed;
            }
        };

        if let Err(e) = api.credentials().set_token(&token.access_token) {
            warn!(error = %e, "failed to store token");
            self.error = Some(format!("Could not save session: {e}"));
            return Outcome::Failed;
        }
        info!(email = %self.email.trim(), "signed in");
        Outcome::Completed
    }
}
