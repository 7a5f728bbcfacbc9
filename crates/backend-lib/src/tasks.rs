// ============================
// crates/backend-lib/src/tasks.rs
// ============================
//! Task use cases. Every successful mutation emits one `TaskMutated` event
//! for the owner; publishing is not awaited by the caller.
use crate::error::AppError;
use crate::events::{DomainEvent, EventBus};
use crate::messages;
use crate::models::User;
use crate::storage::TaskStore;
use std::sync::Arc;
use tasklive_common::{CreateTaskRequest, Task, UpdateTaskRequest};
use tracing::{debug, instrument};
use uuid::Uuid;

#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn TaskStore>,
    events: EventBus,
}

impl TaskService {
    pub fn new(store: Arc<dyn TaskStore>, events: EventBus) -> Self {
        Self { store, events }
    }

    #[instrument(skip(self, user, request), fields(user_id = %user.id))]
    pub async fn create(&self, user: &User, request: CreateTaskRequest) -> Result<Task, AppError> {
        let task = self.store.create_task(user.id, request).await?;
        debug!(task_id = %task.id, "task created");
        self.events.publish(DomainEvent::task_mutated(user.clone()));
        Ok(task)
    }

    pub async fn list(&self, user: &User) -> Result<Vec<Task>, AppError> {
        self.store.current_tasks_for_user(user.id).await
    }

    /// Fetch a task the caller owns
    pub async fn find(&self, user: &User, id: Uuid) -> Result<Task, AppError> {
        let task = self.store.find_task_by_id_or_fail(id).await?;
        Self::ensure_owner(user, &task)?;
        Ok(task)
    }

    pub fn ensure_owner(user: &User, task: &Task) -> Result<(), AppError> {
        if task.user_id == user.id {
            Ok(())
        } else {
            Err(AppError::Forbidden(messages::NOT_TASK_OWNER.to_string()))
        }
    }

    #[instrument(skip(self, user, request), fields(user_id = %user.id))]
    pub async fn update(&self, user: &User, id: Uuid, request: UpdateTaskRequest) -> Result<Task, AppError> {
        self.find(user, id).await?;
        let task = self.store.update_task(id, request).await?;
        self.events.publish(DomainEvent::task_mutated(user.clone()));
        Ok(task)
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn delete(&self, user: &User, id: Uuid) -> Result<(), AppError> {
        self.find(user, id).await?;
        self.store.delete_task(id).await?;
        self.events.publish(DomainEvent::task_mutated(user.clone()));
        Ok(())
    }
}
