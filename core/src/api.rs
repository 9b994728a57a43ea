//! Typed endpoints on top of `RequestClient`.

use serde::de::{DeserializeOwned, Error as _};
use serde::Serialize;

use crate::client::{RequestClient, RequestOptions};
use crate::credentials::CredentialStore;
use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::types::{
    ChatMessage, ChatReply, ChatRequest, Credentials, NewTodo, Todo, TodoPatch, TokenResponse,
};

/// One method per backend endpoint.
pub struct TodoApi {
    client: RequestClient,
}

impl TodoApi {
    pub fn new(client: RequestClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &RequestClient {
        &self.client
    }

    pub fn credentials(&self) -> &dyn CredentialStore {
        self.client.credentials()
    }

    pub fn signup(&self, credentials: &Credentials) -> Result<TokenResponse, ApiError> {
        self.send_json(HttpMethod::Post, "/auth/signup", credentials)
    }

    pub fn login(&self, credentials: &Credentials) -> Result<TokenResponse, ApiError> {
        self.send_json(HttpMethod::Post, "/auth/", credentials)
    }

    pub fn logout(&self) -> Result<(), ApiError> {
        self.client
            .request("/auth/logout", RequestOptions::new(HttpMethod::Post))?;
        Ok(())
    }

    pub fn list_todos(&self) -> Result<Vec<Todo>, ApiError> {
        self.fetch("/todos")
    }

    pub fn create_todo(&self, input: &NewTodo) -> Result<Todo, ApiError> {
        self.send_json(HttpMethod::Post, "/todos", input)
    }

    pub fn update_todo(&self, id: i64, patch: &TodoPatch) -> Result<Todo, ApiError> {
        self.send_json(HttpMethod::Patch, &format!("/todos/{id}"), patch)
    }

    pub fn delete_todo(&self, id: i64) -> Result<(), ApiError> {
        self.client
            .request(&format!("/todos/{id}"), RequestOptions::new(HttpMethod::Delete))?;
        Ok(())
    }

    pub fn chat_history(&self) -> Result<Vec<ChatMessage>, ApiError> {
        self.fetch("/chat/history")
    }

    pub fn send_chat(&self, message: &str) -> Result<ChatReply, ApiError> {
        let payload = ChatRequest {
            message: message.to_string(),
        };
        self.send_json(HttpMethod::Post, "/chat/message", &payload)
    }

    pub fn clear_chat(&self) -> Result<(), ApiError> {
        self.client
            .request("/chat/clear", RequestOptions::new(HttpMethod::Delete))?;
        Ok(())
    }

    fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let value = self.client.request(path, RequestOptions::default())?;
        decode(value)
    }

    fn send_json<B, T>(&self, method: HttpMethod, path: &str, payload: &B) -> Result<T, ApiError>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let options = RequestOptions::new(method).with_json(payload)?;
        let value = self.client.request(path, options)?;
        decode(value)
    }
}

fn decode<T: DeserializeOwned>(value: Option<serde_json::Value>) -> Result<T, ApiError> {
    let value = value
        .ok_or_else(|| ApiError::Decode(serde_json::Error::custom("empty response body")))?;
    serde_json::from_value(value).map_err(ApiError::Decode)
}
