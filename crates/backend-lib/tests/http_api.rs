//! REST round trips through the full router.
mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use backend_lib::create_router;
use common::{test_state, PASSWORD};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

async fn call(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, token);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

fn app() -> (Router, TempDir) {
    let (state, temp_dir) = test_state();
    (create_router(state), temp_dir)
}

/// Sign up and log in; returns the bearer-prefixed access and refresh tokens
async fn signed_in(app: &Router, email: &str) -> (String, String) {
    let (status, _) = call(
        app,
        Method::POST,
        "/api/v1/auth/signup",
        None,
        Some(json!({ "email": email, "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = call(
        app,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({ "email": email, "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let tokens = &body["data"]["tokens"];
    (
        tokens["accessToken"].as_str().unwrap().to_string(),
        tokens["refreshToken"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn test_signup_response_shape() {
    let (app, _temp_dir) = app();

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/auth/signup",
        None,
        Some(json!({ "email": "A@X.com", "name": "Ada", "password": PASSWORD })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], true);
    assert_eq!(body["message"], "Welcome aboard! Your registration was successful.");
    assert_eq!(body["data"]["email"], "a@x.com");
    assert!(body["data"].get("password").is_none());

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/auth/signup",
        None,
        Some(json!({ "email": "a@x.com", "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], false);
    assert_eq!(body["error"]["message"], "User already exist");
}

#[tokio::test]
async fn test_signup_validation() {
    let (app, _temp_dir) = app();

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/auth/signup",
        None,
        Some(json!({ "email": "a@x.com", "password": "weak" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VAL_001");
}

#[tokio::test]
async fn test_login_and_me() {
    let (app, _temp_dir) = app();
    let (access, refresh) = signed_in(&app, "a@x.com").await;
    assert!(access.starts_with("Bearer "));
    assert!(refresh.starts_with("Bearer "));

    let (status, body) = call(&app, Method::GET, "/api/v1/user", Some(&access), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "a@x.com");

    // refresh token is not an access token
    let (status, _) = call(&app, Method::GET, "/api/v1/user", Some(&refresh), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call(&app, Method::GET, "/api/v1/user", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized() {
    let (app, _temp_dir) = app();
    signed_in(&app, "a@x.com").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({ "email": "a@x.com", "password": "Wrong123!" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["message"], "Invalid credentials");
}

#[tokio::test]
async fn test_refresh_rotates() {
    let (app, _temp_dir) = app();
    let (access, refresh) = signed_in(&app, "a@x.com").await;

    // an access token is not accepted for refresh
    let (status, _) = call(&app, Method::GET, "/api/v1/auth/refresh", Some(&access), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = call(&app, Method::GET, "/api/v1/auth/refresh", Some(&refresh), None).await;
    assert_eq!(status, StatusCode::OK);
    let rotated = body["data"]["refreshToken"].as_str().unwrap().to_string();
    assert!(rotated.starts_with("Bearer "));
    assert_ne!(rotated, refresh);

    let (status, body) = call(&app, Method::GET, "/api/v1/auth/refresh", Some(&refresh), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["message"], "Refresh Token is Wrong");
}

#[tokio::test]
async fn test_task_crud() {
    let (app, _temp_dir) = app();
    let (access, _) = signed_in(&app, "a@x.com").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/task",
        Some(&access),
        Some(json!({ "title": "Buy milk", "description": "2 litres" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Task created");
    assert_eq!(body["data"]["status"], "PENDING");
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = call(&app, Method::GET, "/api/v1/task", Some(&access), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = call(
        &app,
        Method::PATCH,
        &format!("/api/v1/task/{id}"),
        Some(&access),
        Some(json!({ "status": "COMPLETED" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "COMPLETED");
    assert_eq!(body["data"]["title"], "Buy milk");

    let (status, body) = call(&app, Method::DELETE, &format!("/api/v1/task/{id}"), Some(&access), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Task deleted");

    let (status, body) = call(&app, Method::GET, &format!("/api/v1/task/{id}"), Some(&access), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "TASK does not exist");
}

#[tokio::test]
async fn test_task_owner_guard() {
    let (app, _temp_dir) = app();
    let (owner, _) = signed_in(&app, "a@x.com").await;
    let (intruder, _) = signed_in(&app, "b@x.com").await;

    let (_, body) = call(
        &app,
        Method::POST,
        "/api/v1/task",
        Some(&owner),
        Some(json!({ "title": "mine", "description": "d" })),
    )
    .await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = call(&app, Method::GET, &format!("/api/v1/task/{id}"), Some(&intruder), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["message"], "Forbidden resource");

    let (status, _) = call(&app, Method::DELETE, &format!("/api/v1/task/{id}"), Some(&intruder), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = call(&app, Method::GET, "/api/v1/task", Some(&intruder), None).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_task_validation() {
    let (app, _temp_dir) = app();
    let (access, _) = signed_in(&app, "a@x.com").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/task",
        Some(&access),
        Some(json!({ "title": "", "description": "d" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VAL_001");
}
