//! Chat screen.
//!
//! # Design
//! `ChatView` shows the user's line right away and appends the assistant's
//! reply when it arrives. A failed send re-fetches the history once so the
//! transcript matches what the server actually stored.

use tracing::warn;

use crate::api::TodoApi;
use crate::types::{ChatMessage, Role};

use super::{Confirm, Outcome};

/// A line in the chat transcript. `id` is `None` for messages added locally
/// and not yet re-fetched from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEntry {
    pub id: Option<i64>,
    pub role: Role,
    pub content: String,
}

impl From<ChatMessage> for ChatEntry {
    fn from(message: ChatMessage) -> Self {
        Self {
            id: Some(message.id),
            role: message.role,
            content: message.content,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChatView {
    pub messages: Vec<ChatEntry>,
    pub error: Option<String>,
}

impl ChatView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_history(&mut self, api: &TodoApi) -> Outcome {
        match api.chat_history() {
            Ok(history) => {
                self.messages = history.into_iter().map(ChatEntry::from).collect();
                Outcome::Completed
            }
            Err(e) => {
                self.error = Some(e.to_string());
                Outcome::Failed
            }
        }
    }

    /// Send a message. The user's line is shown immediately; on success one
    /// assistant line follows. On failure the history is reloaded once, since
    /// the server may have stored the message without answering.
    pub fn send(&mut self, api: &TodoApi, text: &str) -> Outcome {
        let text = text.trim();
        if text.is_empty() {
            return Outcome::Skipped;
        }
        self.error = None;
        self.messages.push(ChatEntry {
            id: None,
            role: Role::User,
            content: text.to_string(),
        });

        match api.send_chat(text) {
            Ok(reply) => {
                self.messages.push(ChatEntry {
                    id: None,
                    role: Role::Assistant,
                    content: reply.message,
                });
                Outcome::Completed
            }
            Err(e) => {
                let message = e.to_string();
                warn!(error = %message, "chat send failed, reloading history");
                self.load_history(api);
                self.error = Some(message);
                Outcome::Failed
            }
        }
    }

    pub fn clear(&mut self, api: &TodoApi, confirm: &dyn Confirm) -> Outcome {
        if !confirm.confirm("Clear the whole chat history?") {
            return Outcome::Declined;
        }
        match api.clear_chat() {
            Ok(()) => {
                self.messages.clear();
                self.error = None;
                Outcome::Completed
            }
            Err(e) => {
                self.error = Some(e.to_string());
                Outcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::credentials::MemoryCredentialStore;
    use crate::http::{HttpMethod, HttpResponse};
    use crate::testing::path_of;
    use crate::views::fixtures::{api_with, decline};
    use crate::views::AlwaysConfirm;

    const HISTORY: &str = r#"[{"id":1,"role":"user","content":"hi"},{"id":2,"role":"assistant","content":"hello"}]"#;

    fn chat_backend(send_status: u16, send_body: &'static str) -> (TodoApi, crate::testing::RequestLog) {
        api_with(Arc::new(MemoryCredentialStore::with_token("t")), move |req| {
            match (req.method, path_of(req)) {
                (HttpMethod::Get, "/chat/history") => Ok(HttpResponse::new(200, HISTORY)),
                (HttpMethod::Post, "/chat/message") => Ok(HttpResponse::new(send_status, send_body)),
                (HttpMethod::Delete, "/chat/clear") => Ok(HttpResponse::new(204, "")),
                other => panic!("unexpected request {other:?}"),
            }
        })
    }

    #[test]
    fn successful_send_appends_one_assistant_message() {
        let (api, log) = chat_backend(200, r#"{"message":"Added todo 3"}"#);
        let mut view = ChatView::new();
        view.load_history(&api);
        assert_eq!(view.send(&api, "add buy milk"), Outcome::Completed);

        let assistants: Vec<_> = view.messages[2..]
            .iter()
            .filter(|e| e.role == Role::Assistant)
            .collect();
        assert_eq!(assistants.len(), 1);
        assert_eq!(assistants[0].content, "Added todo 3");
        assert_eq!(view.messages.len(), 4);
        assert_eq!(log.count(HttpMethod::Get, "/chat/history"), 1);
    }

    #[test]
    fn failed_send_reloads_history_exactly_once() {
        let (api, log) = chat_backend(502, r#"{"detail":"Model unavailable"}"#);
        let mut view = ChatView::new();
        assert_eq!(view.send(&api, "hello?"), Outcome::Failed);

        assert_eq!(view.error.as_deref(), Some("Model unavailable"));
        assert_eq!(log.count(HttpMethod::Get, "/chat/history"), 1);
        let expected: Vec<ChatMessage> = serde_json::from_str(HISTORY).unwrap();
        let expected: Vec<ChatEntry> = expected.into_iter().map(ChatEntry::from).collect();
        assert_eq!(view.messages, expected);
    }

    #[test]
    fn blank_message_is_not_sent() {
        let (api, log) = chat_backend(200, r#"{"message":"x"}"#);
        let mut view = ChatView::new();
        assert_eq!(view.send(&api, "   "), Outcome::Skipped);
        assert!(log.all().is_empty());
        assert!(view.messages.is_empty());
    }

    #[test]
    fn clear_respects_confirmation() {
        let (api, log) = chat_backend(200, r#"{"message":"x"}"#);
        let mut view = ChatView::new();
        view.load_history(&api);

        assert_eq!(view.clear(&api, &decline), Outcome::Declined);
        assert_eq!(view.messages.len(), 2);
        assert_eq!(log.count(HttpMethod::Delete, "/chat/clear"), 0);

        assert_eq!(view.clear(&api, &AlwaysConfirm), Outcome::Completed);
        assert!(view.messages.is_empty());
        assert_eq!(log.count(HttpMethod::Delete, "/chat/clear"), 1);
    }
}
