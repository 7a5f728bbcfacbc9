// ============================
// crates/backend-lib/src/lib.rs
// ============================
//! Core backend-lib functionality for the `tasklive` server: REST endpoints
//! for auth and tasks plus a websocket that pushes each signed-in client its
//! task list whenever one of its tasks changes.

pub mod auth;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod handlers;
pub mod messages;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod registry;
pub mod storage;
pub mod tasks;
pub mod validation;
pub mod ws_router;

use crate::auth::{AuthService, DefaultAuth, SessionStore, TokenIssuer};
use crate::config::Settings;
use crate::dispatcher::NotificationDispatcher;
use crate::events::EventBus;
use crate::registry::ConnectionRegistry;
use crate::storage::{IdentityStore, TaskStore};
use crate::tasks::TaskService;
use crate::ws_router::WsHub;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across all handlers
pub struct AppState {
    /// Settings the server was started with
    pub settings: Arc<Settings>,
    /// Identity persistence
    pub users: Arc<dyn IdentityStore>,
    /// Authentication service
    pub auth: Arc<dyn AuthService>,
    /// Token signing and verification
    pub tokens: Arc<TokenIssuer>,
    /// userId to live connection
    pub registry: Arc<ConnectionRegistry>,
    /// Live connections
    pub hub: Arc<WsHub>,
    pub events: EventBus,
    pub dispatcher: Arc<NotificationDispatcher>,
    pub tasks: TaskService,
}

impl AppState {
    /// Wire every component over `storage` and start the notification
    /// dispatcher. Must be called inside a tokio runtime.
    pub fn new<S>(storage: S, settings: Settings) -> anyhow::Result<Self>
    where
        S: IdentityStore + TaskStore + 'static,
    {
        settings.validate()?;

        let storage = Arc::new(storage);
        let users: Arc<dyn IdentityStore> = storage.clone();
        let task_store: Arc<dyn TaskStore> = storage;

        let tokens = Arc::new(TokenIssuer::new(&settings.auth));
        let sessions = SessionStore::new(users.clone());
        let auth: Arc<dyn AuthService> =
            Arc::new(DefaultAuth::new(users.clone(), sessions, tokens.clone()));

        let registry = Arc::new(ConnectionRegistry::new());
        let hub = Arc::new(WsHub::new());
        let events = EventBus::new(settings.events.capacity);
        let dispatcher = Arc::new(NotificationDispatcher::new(
            registry.clone(),
            task_store.clone(),
            hub.clone(),
        ));
        dispatcher.clone().spawn(events.subscribe());

        let tasks = TaskService::new(task_store, events.clone());

        Ok(Self {
            settings: Arc::new(settings),
            users,
            auth,
            tokens,
            registry,
            hub,
            events,
            dispatcher,
            tasks,
        })
    }
}

/// REST routes, mounted under `/api/v1`
fn api_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let public = Router::new()
        .route("/auth/signup", post(handlers::auth::signup))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/refresh", get(handlers::auth::refresh));

    let protected = Router::new()
        .route("/user", get(handlers::user::me))
        .route(
            "/task",
            post(handlers::tasks::create).get(handlers::tasks::list),
        )
        .route(
            "/task/{id}",
            get(handlers::tasks::find)
                .patch(handlers::tasks::update)
                .delete(handlers::tasks::delete),
        )
        .layer(axum::middleware::from_fn_with_state(
            state,
            middleware::require_auth,
        ));

    Router::new().merge(public).merge(protected)
}

/// Create the full application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api/v1", api_router(state.clone()))
        .route("/ws", get(ws_router::ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
