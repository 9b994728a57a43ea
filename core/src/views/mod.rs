//! Headless view state for the signup, dashboard and chat screens.
//!
//! # Design
//! Each view owns its local state (form fields, selection, drafts, inline
//! error text) and talks to the server only through `TodoApi`. Server data is
//! never patched locally after a mutation; views re-fetch instead.
//! Destructive actions go through a `Confirm` prompt first.

mod chat;
mod dashboard;
mod signup;

pub use chat::{ChatEntry, ChatView};
pub use dashboard::{DashboardView, EditDraft};
pub use signup::SignupView;

/// Yes/no prompt shown before destructive actions.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F: Fn(&str) -> bool> Confirm for F {
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Confirms everything without asking.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

/// Result of a view action. Failures leave their text in the view's `error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    /// The user declined the confirmation; nothing was sent.
    Declined,
    /// Nothing to do (blank input, empty selection); nothing was sent.
    Skipped,
    Failed,
}
