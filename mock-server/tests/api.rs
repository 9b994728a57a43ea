use axum::http::{self, Request, StatusCode};
use axum::response::Response;
use axum::routing::RouterIntoService;
use http_body_util::BodyExt;
use mock_server::{app, ChatMessage, ChatOut, Todo, TokenOut};
use tower::{Service, ServiceExt};

async fn body_json<T: serde::de::DeserializeOwned>(response: Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

/// The first entry of a validation error's `detail` list.
async fn validation_error(response: Response) -> serde_json::Value {
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = body_json(response).await;
    let errors = body["detail"].as_array().expect("validation detail is a list");
    assert_eq!(errors.len(), 1);
    errors[0].clone()
}

async fn detail(response: Response) -> String {
    let body: serde_json::Value = body_json(response).await;
    body["detail"].as_str().unwrap().to_string()
}

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<&str>) -> Request<String> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {token}"));
    }
    if body.is_some() {
        builder = builder.header(http::header::CONTENT_TYPE, "application/json");
    }
    builder.body(body.unwrap_or_default().to_string()).unwrap()
}

async fn send(app: &mut RouterIntoService<String>, req: Request<String>) -> Response {
    ServiceExt::ready(app).await.unwrap().call(req).await.unwrap()
}

async fn signup(app: &mut RouterIntoService<String>, email: &str) -> String {
    let body = format!(r#"{{"email":"{email}","password":"secret1"}}"#);
    let resp = send(app, request("POST", "/auth/signup", None, Some(&body))).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let token: TokenOut = body_json(resp).await;
    assert_eq!(token.token_type, "bearer");
    token.access_token
}

// --- auth ---

#[tokio::test]
async fn todos_require_bearer_token() {
    let resp = app()
        .oneshot(request("GET", "/todos", None, None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(detail(resp).await, "Not authenticated");
}

#[tokio::test]
async fn unknown_token_is_invalid() {
    let resp = app()
        .oneshot(request("GET", "/todos", Some("nope"), None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(detail(resp).await, "Invalid token");
}

#[tokio::test]
async fn duplicate_signup_is_rejected() {
    let mut app = app().into_service();
    signup(&mut app, "a@example.com").await;

    let body = r#"{"email":"a@example.com","password":"secret1"}"#;
    let resp = send(&mut app, request("POST", "/auth/signup", None, Some(body))).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(detail(resp).await, "Email already registered");
}

#[tokio::test]
async fn short_password_returns_422() {
    let body = r#"{"email":"a@example.com","password":"123"}"#;
    let resp = app()
        .oneshot(request("POST", "/auth/signup", None, Some(body)))
        .await
        .unwrap();
    let error = validation_error(resp).await;
    assert_eq!(error["loc"], serde_json::json!(["body", "password"]));
    assert_eq!(error["msg"], "Password must be 6 to 72 characters");
    assert_eq!(error["type"], "value_error");
}

#[tokio::test]
async fn login_and_logout_revokes_token() {
    let mut app = app().into_service();
    signup(&mut app, "a@example.com").await;

    let bad = r#"{"email":"a@example.com","password":"wrong-pass"}"#;
    let resp = send(&mut app, request("POST", "/auth/", None, Some(bad))).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(detail(resp).await, "Invalid credentials");

    let good = r#"{"email":"a@example.com","password":"secret1"}"#;
    let resp = send(&mut app, request("POST", "/auth/", None, Some(good))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let token: TokenOut = body_json(resp).await;

    let resp = send(&mut app, request("POST", "/auth/logout", Some(&token.access_token), None)).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(&mut app, request("GET", "/todos", Some(&token.access_token), None)).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(detail(resp).await, "Token revoked");
}

// --- todos ---

#[tokio::test]
async fn malformed_json_is_rejected_with_plain_text() {
    let mut app = app().into_service();
    let token = signup(&mut app, "a@example.com").await;

    let resp = send(&mut app, request("POST", "/todos", Some(&token), Some("{not json"))).await;
    assert!(resp.status().is_client_error());
    let body = body_bytes(resp).await;
    assert!(serde_json::from_slice::<serde_json::Value>(&body).is_err());
}

#[tokio::test]
async fn todos_are_scoped_per_user() {
    let mut app = app().into_service();
    let alice = signup(&mut app, "alice@example.com").await;
    let bob = signup(&mut app, "bob@example.com").await;

    let resp = send(&mut app, request("POST", "/todos", Some(&alice), Some(r#"{"title":"mine"}"#))).await;
    let created: Todo = body_json(resp).await;

    let resp = send(&mut app, request("GET", "/todos", Some(&bob), None)).await;
    let todos: Vec<Todo> = body_json(resp).await;
    assert!(todos.is_empty());

    let resp = send(&mut app, request("DELETE", &format!("/todos/{}", created.id), Some(&bob), None)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(detail(resp).await, "Todo not found");
}

#[tokio::test]
async fn crud_lifecycle() {
    let mut app = app().into_service();
    let token = signup(&mut app, "a@example.com").await;
    let auth = Some(token.as_str());

    // create
    let resp = send(&mut app, request("POST", "/todos", auth, Some(r#"{"title":"Walk dog","description":null}"#))).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let first: Todo = body_json(resp).await;
    assert_eq!(first.title, "Walk dog");
    assert!(first.description.is_none());
    assert!(!first.completed);

    let resp = send(&mut app, request("POST", "/todos", auth, Some(r#"{"title":"Feed cat","description":"tuna"}"#))).await;
    let second: Todo = body_json(resp).await;

    // list is newest first
    let resp = send(&mut app, request("GET", "/todos", auth, None)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let todos: Vec<Todo> = body_json(resp).await;
    assert_eq!(todos.iter().map(|t| t.id).collect::<Vec<_>>(), vec![second.id, first.id]);

    // patch only completed
    let uri = format!("/todos/{}", first.id);
    let resp = send(&mut app, request("PATCH", &uri, auth, Some(r#"{"completed":true}"#))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Todo = body_json(resp).await;
    assert_eq!(updated.title, "Walk dog");
    assert!(updated.completed);

    // empty title rejected
    let resp = send(&mut app, request("PATCH", &uri, auth, Some(r#"{"title":""}"#))).await;
    let error = validation_error(resp).await;
    assert_eq!(error["loc"], serde_json::json!(["body", "title"]));

    // get
    let resp = send(&mut app, request("GET", &uri, auth, None)).await;
    let fetched: Todo = body_json(resp).await;
    assert!(fetched.completed);

    // delete
    let resp = send(&mut app, request("DELETE", &uri, auth, None)).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    // get after delete
    let resp = send(&mut app, request("GET", &uri, auth, None)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- chat ---

#[tokio::test]
async fn chat_round_trip_and_clear() {
    let mut app = app().into_service();
    let token = signup(&mut app, "a@example.com").await;
    let auth = Some(token.as_str());

    let resp = send(&mut app, request("POST", "/chat/message", auth, Some(r#"{"message":"how many?"}"#))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let reply: ChatOut = body_json(resp).await;
    assert_eq!(reply.message, "You have 0 open todo(s).");

    let resp = send(&mut app, request("GET", "/chat/history", auth, None)).await;
    let history: Vec<ChatMessage> = body_json(resp).await;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role, "user");
    assert_eq!(history[0].content, "how many?");
    assert_eq!(history[1].role, "assistant");

    let resp = send(&mut app, request("POST", "/chat/message", auth, Some(r#"{"message":""}"#))).await;
    let error = validation_error(resp).await;
    assert_eq!(error["msg"], "Message must be 1 to 2000 characters");

    let resp = send(&mut app, request("DELETE", "/chat/clear", auth, None)).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = send(&mut app, request("GET", "/chat/history", auth, None)).await;
    let history: Vec<ChatMessage> = body_json(resp).await;
    assert!(history.is_empty());
}
