//! Task mutations pushed to bound live connections.
mod common;

use backend_lib::handlers::live;
use backend_lib::models::User;
use backend_lib::AppState;
use axum::extract::ws::Message;
use common::{test_state, PASSWORD};
use std::sync::Arc;
use std::time::Duration;
use tasklive_common::{CreateTaskRequest, SignupRequest};
use tokio::sync::mpsc;
use tokio::time::timeout;
use uuid::Uuid;

async fn register(state: &AppState, email: &str) -> User {
    state
        .auth
        .register(SignupRequest {
            email: email.to_string(),
            name: None,
            password: PASSWORD.to_string(),
        })
        .await
        .unwrap()
}

fn task(title: &str) -> CreateTaskRequest {
    CreateTaskRequest {
        title: title.to_string(),
        description: "desc".to_string(),
        status: None,
    }
}

async fn next_push(rx: &mut mpsc::Receiver<Message>) -> serde_json::Value {
    let message = timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("push did not arrive")
        .expect("queue closed");
    let Message::Text(text) = message else {
        panic!("expected text frame");
    };
    serde_json::from_str(text.as_str()).unwrap()
}

async fn assert_quiet(rx: &mut mpsc::Receiver<Message>) {
    assert!(timeout(Duration::from_millis(200), rx.recv()).await.is_err());
}

/// Register a hub queue for a fresh connection and bind it to `user`,
/// consuming the snapshot pushed on bind.
async fn connect(state: &Arc<AppState>, user: &User) -> (Uuid, mpsc::Receiver<Message>) {
    let connection_id = Uuid::new_v4();
    let (_tx, mut rx) = state.hub.register(connection_id);
    assert!(live::bind_user(state, connection_id, user.id).await.unwrap());
    next_push(&mut rx).await;
    (connection_id, rx)
}

#[tokio::test]
async fn test_create_pushes_full_list_once() {
    let (state, _temp_dir) = test_state();
    let user = register(&state, "a@x.com").await;
    state.tasks.create(&user, task("first")).await.unwrap();

    let (_conn, mut rx) = connect(&state, &user).await;
    state.tasks.create(&user, task("second")).await.unwrap();

    let push = next_push(&mut rx).await;
    assert_eq!(push["event"], "task_event");
    let titles: Vec<&str> = push["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["first", "second"]);

    assert_quiet(&mut rx).await;
}

#[tokio::test]
async fn test_unbound_user_still_mutates() {
    let (state, _temp_dir) = test_state();
    let user = register(&state, "a@x.com").await;
    let other = register(&state, "b@x.com").await;
    let (_conn, mut other_rx) = connect(&state, &other).await;

    let created = state.tasks.create(&user, task("t")).await.unwrap();
    assert_eq!(created.user_id, user.id);

    // nobody else hears about it
    assert_quiet(&mut other_rx).await;
}

#[tokio::test]
async fn test_bind_persists_connection_and_pushes_snapshot() {
    let (state, _temp_dir) = test_state();
    let user = register(&state, "a@x.com").await;
    state.tasks.create(&user, task("t")).await.unwrap();

    let connection_id = Uuid::new_v4();
    let (_tx, mut rx) = state.hub.register(connection_id);
    live::bind_user(&state, connection_id, user.id).await.unwrap();

    let push = next_push(&mut rx).await;
    assert_eq!(push["data"].as_array().unwrap().len(), 1);
    assert_eq!(state.registry.resolve(user.id), Some(connection_id));

    let stored = state.users.find_identity_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(stored.connection_id, Some(connection_id));
}

#[tokio::test]
async fn test_bind_unknown_user_is_ignored() {
    let (state, _temp_dir) = test_state();
    let connection_id = Uuid::new_v4();
    let (_tx, mut rx) = state.hub.register(connection_id);

    let ghost = Uuid::new_v4();
    assert!(!live::bind_user(&state, connection_id, ghost).await.unwrap());
    assert_eq!(state.registry.resolve(ghost), None);
    assert_quiet(&mut rx).await;
}

#[tokio::test]
async fn test_rebind_moves_pushes_to_newest_connection() {
    let (state, _temp_dir) = test_state();
    let user = register(&state, "a@x.com").await;

    let (_old, mut old_rx) = connect(&state, &user).await;
    let (_new, mut new_rx) = connect(&state, &user).await;

    state.tasks.create(&user, task("t")).await.unwrap();

    next_push(&mut new_rx).await;
    assert_quiet(&mut old_rx).await;
}

#[tokio::test]
async fn test_push_to_closed_connection_is_dropped() {
    let (state, _temp_dir) = test_state();
    let user = register(&state, "a@x.com").await;
    let (conn, rx) = connect(&state, &user).await;

    drop(rx);
    state.hub.unregister(&conn);

    // mutation succeeds even though the push fails
    assert!(state.tasks.create(&user, task("t")).await.is_ok());
    assert!(state.tasks.create(&user, task("u")).await.is_ok());
    assert_eq!(state.tasks.list(&user).await.unwrap().len(), 2);
}
