// ============================
// crates/backend-lib/src/dispatcher.rs
// ============================
//! Notification dispatcher.
//!
//! Consumes `DomainEvent`s from the bus and pushes the affected user's full
//! task list to their live connection, if they have one. Nothing here ever
//! propagates back to the mutation that emitted the event: failures are
//! logged and dropped.
use crate::error::AppError;
use crate::events::DomainEvent;
use crate::metrics::{NOTIFY_DROPPED, NOTIFY_PUSHED};
use crate::models::User;
use crate::registry::ConnectionRegistry;
use crate::storage::TaskStore;
use async_trait::async_trait;
use futures_util::FutureExt;
use metrics::counter;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tasklive_common::{ConnectionId, ServerToClient};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

/// Delivers a server message to one live connection
#[async_trait]
pub trait Transport: Send + Sync {
    async fn push(&self, connection_id: &ConnectionId, message: ServerToClient) -> Result<(), AppError>;
}

pub struct NotificationDispatcher {
    registry: Arc<ConnectionRegistry>,
    tasks: Arc<dyn TaskStore>,
    transport: Arc<dyn Transport>,
}

impl NotificationDispatcher {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        tasks: Arc<dyn TaskStore>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            registry,
            tasks,
            transport,
        }
    }

    /// Push `user`'s current task list to their bound connection.
    ///
    /// Returns `Ok(false)` when the user has no live connection.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn notify(&self, user: &User) -> Result<bool, AppError> {
        let Some(connection_id) = self.registry.resolve(user.id) else {
            debug!("no live connection, notification dropped");
            return Ok(false);
        };

        let data = self.tasks.current_tasks_for_user(user.id).await?;
        self.transport
            .push(&connection_id, ServerToClient::TaskEvent { data })
            .await?;
        Ok(true)
    }

    /// Handle one event, swallowing any failure
    pub async fn handle(&self, event: DomainEvent) {
        match event {
            DomainEvent::TaskMutated { user } => match self.notify(&user).await {
                Ok(true) => {
                    counter!(NOTIFY_PUSHED).increment(1);
                },
                Ok(false) => {
                    counter!(NOTIFY_DROPPED).increment(1);
                },
                Err(e) => {
                    counter!(NOTIFY_DROPPED).increment(1);
                    warn!(user_id = %user.id, error = %e, "task notification failed");
                },
            },
        }
    }

    /// Event loop. Runs until the bus is dropped.
    pub async fn run(self: Arc<Self>, mut rx: broadcast::Receiver<DomainEvent>) {
        info!("notification dispatcher started");
        loop {
            match rx.recv().await {
                Ok(event) => {
                    // a panicking push must not take the loop down with it
                    if AssertUnwindSafe(self.handle(event)).catch_unwind().await.is_err() {
                        error!("notification handler panicked");
                    }
                },
                Err(RecvError::Lagged(skipped)) => {
                    counter!(NOTIFY_DROPPED).increment(skipped);
                    warn!(skipped, "dispatcher lagged behind the event bus");
                },
                Err(RecvError::Closed) => break,
            }
        }
        info!("notification dispatcher stopped");
    }

    /// Subscribe and run on a background task
    pub fn spawn(self: Arc<Self>, rx: broadcast::Receiver<DomainEvent>) -> JoinHandle<()> {
        tokio::spawn(self.run(rx))
    }
}
