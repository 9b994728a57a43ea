//! In-memory stand-in for the todo backend.
//!
//! Implements the auth, todo and chat endpoints with the same statuses and
//! `{"detail": ...}` error bodies as the real service, so client tests can run
//! end to end without a database or language model.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Todo {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: i64,
    pub role: String,
    pub content: String,
}

#[derive(Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenOut {
    pub access_token: String,
    pub token_type: String,
}

#[derive(Deserialize)]
pub struct CreateTodo {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateTodo {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
}

#[derive(Deserialize)]
pub struct ChatIn {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatOut {
    pub message: String,
}

struct User {
    id: i64,
    password: String,
}

struct StoredMessage {
    id: i64,
    user_id: i64,
    role: &'static str,
    content: String,
}

#[derive(Default)]
pub struct Store {
    users: HashMap<String, User>,
    sessions: HashMap<String, i64>,
    revoked: HashSet<String>,
    todos: Vec<Todo>,
    messages: Vec<StoredMessage>,
    last_id: i64,
}

impl Store {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn issue_token(&mut self, user_id: i64) -> TokenOut {
        let token = Uuid::new_v4().simple().to_string();
        self.sessions.insert(token.clone(), user_id);
        TokenOut {
            access_token: token,
            token_type: "bearer".to_string(),
        }
    }

    fn todo_mut(&mut self, user_id: i64, id: i64) -> Result<&mut Todo, ServerError> {
        self.todos
            .iter_mut()
            .find(|t| t.id == id && t.user_id == user_id)
            .ok_or_else(|| ServerError::new(StatusCode::NOT_FOUND, "Todo not found"))
    }
}

pub type Db = Arc<RwLock<Store>>;

/// Error response in the backend's `{"detail": ...}` shape. Validation
/// failures name the offending body field and are sent as a one-item list,
/// everything else as a plain string.
#[derive(Debug)]
pub struct ServerError {
    status: StatusCode,
    detail: String,
    field: Option<&'static str>,
}

impl ServerError {
    fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
            field: None,
        }
    }

    fn unauthorized(detail: &str) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, detail)
    }

    fn invalid(field: &'static str, detail: &str) -> Self {
        Self {
            field: Some(field),
            ..Self::new(StatusCode::UNPROCESSABLE_ENTITY, detail)
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let body = match self.field {
            Some(field) => serde_json::json!({
                "detail": [{
                    "loc": ["body", field],
                    "msg": self.detail,
                    "type": "value_error",
                }]
            }),
            None => serde_json::json!({ "detail": self.detail }),
        };
        (self.status, Json(body)).into_response()
    }
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/", post(login))
        .route("/auth/logout", post(logout))
        .route("/todos", get(list_todos).post(create_todo))
        .route(
            "/todos/{id}",
            get(get_todo).patch(update_todo).delete(delete_todo),
        )
        .route("/chat/history", get(chat_history))
        .route("/chat/message", post(send_message))
        .route("/chat/clear", delete(clear_chat))
        .layer(TraceLayer::new_for_http())
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, ServerError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ServerError::unauthorized("Not authenticated"))
}

fn current_user(store: &Store, headers: &HeaderMap) -> Result<i64, ServerError> {
    let token = bearer_token(headers)?;
    if store.revoked.contains(token) {
        return Err(ServerError::unauthorized("Token revoked"));
    }
    store
        .sessions
        .get(token)
        .copied()
        .ok_or_else(|| ServerError::unauthorized("Invalid token"))
}

fn validate_credentials(input: &Credentials) -> Result<(), ServerError> {
    if !input.email.contains('@') {
        return Err(ServerError::invalid("email", "Invalid email address"));
    }
    let len = input.password.chars().count();
    if !(6..=72).contains(&len) {
        return Err(ServerError::invalid("password", "Password must be 6 to 72 characters"));
    }
    Ok(())
}

fn validate_title(title: &str) -> Result<(), ServerError> {
    let len = title.chars().count();
    if !(1..=120).contains(&len) {
        return Err(ServerError::invalid("title", "Title must be 1 to 120 characters"));
    }
    Ok(())
}

fn validate_description(description: Option<&str>) -> Result<(), ServerError> {
    if description.is_some_and(|d| d.chars().count() > 500) {
        return Err(ServerError::invalid(
            "description",
            "Description must be at most 500 characters",
        ));
    }
    Ok(())
}

async fn signup(
    State(db): State<Db>,
    Json(input): Json<Credentials>,
) -> Result<(StatusCode, Json<TokenOut>), ServerError> {
    validate_credentials(&input)?;
    let mut store = db.write().await;
    if store.users.contains_key(&input.email) {
        return Err(ServerError::new(StatusCode::BAD_REQUEST, "Email already registered"));
    }
    let id = store.next_id();
    store.users.insert(
        input.email.clone(),
        User {
            id,
            password: input.password,
        },
    );
    tracing::info!(user_id = id, "user signed up");
    Ok((StatusCode::CREATED, Json(store.issue_token(id))))
}

async fn login(
    State(db): State<Db>,
    Json(input): Json<Credentials>,
) -> Result<Json<TokenOut>, ServerError> {
    validate_credentials(&input)?;
    let mut store = db.write().await;
    let user_id = match store.users.get(&input.email) {
        Some(user) if user.password == input.password => user.id,
        _ => return Err(ServerError::unauthorized("Invalid credentials")),
    };
    Ok(Json(store.issue_token(user_id)))
}

async fn logout(
    State(db): State<Db>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ServerError> {
    let mut store = db.write().await;
    current_user(&store, &headers)?;
    let token = bearer_token(&headers)?.to_string();
    store.revoked.insert(token);
    Ok(Json(serde_json::json!({ "message": "Logged out" })))
}

async fn list_todos(
    State(db): State<Db>,
    headers: HeaderMap,
) -> Result<Json<Vec<Todo>>, ServerError> {
    let store = db.read().await;
    let user_id = current_user(&store, &headers)?;
    let mut todos: Vec<Todo> = store
        .todos
        .iter()
        .filter(|t| t.user_id == user_id)
        .cloned()
        .collect();
    todos.sort_by(|a, b| b.id.cmp(&a.id));
    Ok(Json(todos))
}

async fn create_todo(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<CreateTodo>,
) -> Result<(StatusCode, Json<Todo>), ServerError> {
    let mut store = db.write().await;
    let user_id = current_user(&store, &headers)?;
    validate_title(&input.title)?;
    validate_description(input.description.as_deref())?;
    let todo = Todo {
        id: store.next_id(),
        user_id,
        title: input.title,
        description: input.description,
        completed: false,
    };
    store.todos.push(todo.clone());
    Ok((StatusCode::CREATED, Json(todo)))
}

async fn get_todo(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Todo>, ServerError> {
    let mut store = db.write().await;
    let user_id = current_user(&store, &headers)?;
    Ok(Json(store.todo_mut(user_id, id)?.clone()))
}

async fn update_todo(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(input): Json<UpdateTodo>,
) -> Result<Json<Todo>, ServerError> {
    let mut store = db.write().await;
    let user_id = current_user(&store, &headers)?;
    if let Some(title) = input.title.as_deref() {
        validate_title(title)?;
    }
    validate_description(input.description.as_deref())?;

    let todo = store.todo_mut(user_id, id)?;
    if let Some(title) = input.title {
        todo.title = title;
    }
    if let Some(description) = input.description {
        todo.description = Some(description);
    }
    if let Some(completed) = input.completed {
        todo.completed = completed;
    }
    Ok(Json(todo.clone()))
}

async fn delete_todo(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode, ServerError> {
    let mut store = db.write().await;
    let user_id = current_user(&store, &headers)?;
    store.todo_mut(user_id, id)?;
    store.todos.retain(|t| t.id != id);
    Ok(StatusCode::NO_CONTENT)
}

async fn chat_history(
    State(db): State<Db>,
    headers: HeaderMap,
) -> Result<Json<Vec<ChatMessage>>, ServerError> {
    let store = db.read().await;
    let user_id = current_user(&store, &headers)?;
    let history = store
        .messages
        .iter()
        .filter(|m| m.user_id == user_id)
        .map(|m| ChatMessage {
            id: m.id,
            role: m.role.to_string(),
            content: m.content.clone(),
        })
        .collect();
    Ok(Json(history))
}

async fn send_message(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<ChatIn>,
) -> Result<Json<ChatOut>, ServerError> {
    let mut store = db.write().await;
    let user_id = current_user(&store, &headers)?;
    let len = input.message.chars().count();
    if !(1..=2000).contains(&len) {
        return Err(ServerError::invalid("message", "Message must be 1 to 2000 characters"));
    }

    let id = store.next_id();
    store.messages.push(StoredMessage {
        id,
        user_id,
        role: "user",
        content: input.message,
    });

    let open = store
        .todos
        .iter()
        .filter(|t| t.user_id == user_id && !t.completed)
        .count();
    let reply = format!("You have {open} open todo(s).");
    let id = store.next_id();
    store.messages.push(StoredMessage {
        id,
        user_id,
        role: "assistant",
        content: reply.clone(),
    });
    Ok(Json(ChatOut { message: reply }))
}

async fn clear_chat(
    State(db): State<Db>,
    headers: HeaderMap,
) -> Result<StatusCode, ServerError> {
    let mut store = db.write().await;
    let user_id = current_user(&store, &headers)?;
    store.messages.retain(|m| m.user_id != user_id);
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn todo_serializes_with_null_description() {
        let todo = Todo {
            id: 1,
            user_id: 1,
            title: "Test".to_string(),
            description: None,
            completed: false,
        };
        let json = serde_json::to_value(&todo).unwrap();
        assert_eq!(json["id"], 1);
        assert!(json["description"].is_null());
        assert_eq!(json["completed"], false);
    }

    #[test]
    fn create_todo_description_is_optional() {
        let input: CreateTodo = serde_json::from_str(r#"{"title":"No description"}"#).unwrap();
        assert_eq!(input.title, "No description");
        assert!(input.description.is_none());
    }

    #[test]
    fn create_todo_rejects_missing_title() {
        let result: Result<CreateTodo, _> = serde_json::from_str(r#"{"description":"x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn update_todo_all_fields_optional() {
        let input: UpdateTodo = serde_json::from_str(r#"{}"#).unwrap();
        assert!(input.title.is_none());
        assert!(input.description.is_none());
        assert!(input.completed.is_none());
    }

    #[test]
    fn credential_validation() {
        let ok = Credentials {
            email: "a@b.c".to_string(),
            password: "secret1".to_string(),
        };
        assert!(validate_credentials(&ok).is_ok());
        let short = Credentials {
            email: "a@b.c".to_string(),
            password: "123".to_string(),
        };
        let err = validate_credentials(&short).unwrap_err();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.field, Some("password"));
    }

    #[test]
    fn revoked_token_is_rejected() {
        let mut store = Store::default();
        let token = store.issue_token(1).access_token;
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            format!("Bearer {token}").parse().unwrap(),
        );
        assert_eq!(current_user(&store, &headers).unwrap(), 1);

        store.revoked.insert(token);
        assert_eq!(current_user(&store, &headers).unwrap_err().detail, "Token revoked");
    }
}
