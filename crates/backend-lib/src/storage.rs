// ============================
// crates/backend-lib/src/storage.rs
// ============================
//! Storage abstraction with flat-file implementation.
//!
//! Identities and tasks live as one JSON document each under
//! `<root>/users/<id>.json` and `<root>/tasks/<id>.json`. Writes go through a
//! single async lock so read-modify-write updates never lose a concurrent
//! change, and every file is replaced atomically via a temp file + rename.
use crate::auth::password;
use crate::error::AppError;
use crate::messages;
use crate::models::{IdentityPatch, NewIdentity, User};
use async_trait::async_trait;
use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};
use tasklive_common::{CreateTaskRequest, Task, UpdateTaskRequest};
use tokio::{fs as tokio_fs, sync::Mutex};
use uuid::Uuid;

/// Persistence of identities
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Look up by (case-insensitive) email
    async fn find_identity_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn find_identity_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// Like [`IdentityStore::find_identity_by_id`] but absence is `NotFound`
    async fn find_identity_by_id_or_fail(&self, id: Uuid) -> Result<User, AppError> {
        self.find_identity_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(messages::resource_not_found("USER")))
    }

    /// Create an identity. The password is hashed before the record is
    /// written; a duplicate email is a `Conflict`.
    async fn persist_identity(&self, identity: NewIdentity) -> Result<User, AppError>;

    async fn update_identity(&self, id: Uuid, patch: IdentityPatch) -> Result<User, AppError>;
}

/// Persistence of tasks
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn create_task(&self, owner: Uuid, request: CreateTaskRequest)
        -> Result<Task, AppError>;

    async fn find_task_by_id(&self, id: Uuid) -> Result<Option<Task>, AppError>;

    async fn find_task_by_id_or_fail(&self, id: Uuid) -> Result<Task, AppError> {
        self.find_task_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(messages::resource_not_found("TASK")))
    }

    /// All tasks owned by `user_id`, oldest first
    async fn current_tasks_for_user(&self, user_id: Uuid) -> Result<Vec<Task>, AppError>;

    async fn update_task(&self, id: Uuid, request: UpdateTaskRequest) -> Result<Task, AppError>;

    async fn delete_task(&self, id: Uuid) -> Result<(), AppError>;
}

/// Flat-file implementation of the storage traits
#[derive(Clone)]
pub struct FlatFileStorage {
    root: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl FlatFileStorage {
    pub fn new<P: AsRef<Path>>(root: P) -> anyhow::Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join("users"))?;
        fs::create_dir_all(root.join("tasks"))?;
        Ok(Self {
            root,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn user_path(&self, id: Uuid) -> PathBuf {
        self.root.join("users").join(format!("{id}.json"))
    }

    fn task_path(&self, id: Uuid) -> PathBuf {
        self.root.join("tasks").join(format!("{id}.json"))
    }

    async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, AppError> {
        match tokio_fs::read_to_string(path).await {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), AppError> {
        let json = serde_json::to_string_pretty(value)?;
        let tmp = path.with_extension("json.tmp");
        tokio_fs::write(&tmp, json).await?;
        tokio_fs::rename(&tmp, path).await?;
        Ok(())
    }

    async fn read_all<T: DeserializeOwned>(dir: &Path) -> Result<Vec<T>, AppError> {
        let mut entries = tokio_fs::read_dir(dir).await?;
        let mut items = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            if let Some(item) = Self::read_json(&path).await? {
                items.push(item);
            }
        }
        Ok(items)
    }
}

#[async_trait]
impl IdentityStore for FlatFileStorage {
    async fn find_identity_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let email = email.trim().to_lowercase();
        let users: Vec<User> = Self::read_all(&self.root.join("users")).await?;
        Ok(users.into_iter().find(|user| user.email == email))
    }

    async fn find_identity_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Self::read_json(&self.user_path(id)).await
    }

    async fn persist_identity(&self, identity: NewIdentity) -> Result<User, AppError> {
        let email = identity.email.trim().to_lowercase();
        let password_hash = password::hash_password_async(identity.password).await?;

        let _guard = self.write_lock.lock().await;
        if self.find_identity_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict(messages::existing_resource("User")));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email,
            name: identity.name,
            password: password_hash,
            refresh_token_hash: None,
            last_login: None,
            connection_id: None,
            created_at: now,
            updated_at: now,
        };
        Self::write_json(&self.user_path(user.id), &user).await?;
        Ok(user)
    }

    async fn update_identity(&self, id: Uuid, patch: IdentityPatch) -> Result<User, AppError> {
        // hash outside the lock; a stored hash passes through unchanged
        let password_hash = match patch.password {
            Some(password) => Some(password::hash_password_async(password).await?),
            None => None,
        };

        let _guard = self.write_lock.lock().await;
        let mut user = self.find_identity_by_id_or_fail(id).await?;
        if let Some(name) = patch.name {
            user.name = Some(name);
        }
        if let Some(hash) = password_hash {
            user.password = hash;
        }
        if let Some(hash) = patch.refresh_token_hash {
            user.refresh_token_hash = Some(hash);
        }
        if let Some(last_login) = patch.last_login {
            user.last_login = Some(last_login);
        }
        if let Some(connection_id) = patch.connection_id {
            user.connection_id = Some(connection_id);
        }
        user.updated_at = Utc::now();

        Self::write_json(&self.user_path(id), &user).await?;
        Ok(user)
    }
}

#[async_trait]
impl TaskStore for FlatFileStorage {
    async fn create_task(
        &self,
        owner: Uuid,
        request: CreateTaskRequest,
    ) -> Result<Task, AppError> {
        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            title: request.title,
            description: Some(request.description),
            status: request.status.unwrap_or_default(),
            date_completed: None,
            user_id: owner,
            created_at: now,
            updated_at: now,
        };

        let _guard = self.write_lock.lock().await;
        Self::write_json(&self.task_path(task.id), &task).await?;
        Ok(task)
    }

    async fn find_task_by_id(&self, id: Uuid) -> Result<Option<Task>, AppError> {
        Self::read_json(&self.task_path(id)).await
    }

    async fn current_tasks_for_user(&self, user_id: Uuid) -> Result<Vec<Task>, AppError> {
        let tasks: Vec<Task> = Self::read_all(&self.root.join("tasks")).await?;
        let mut tasks: Vec<Task> = tasks
            .into_iter()
            .filter(|task| task.user_id == user_id)
            .collect();
        tasks.sort_by_key(|task| task.created_at);
        Ok(tasks)
    }

    async fn update_task(&self, id: Uuid, request: UpdateTaskRequest) -> Result<Task, AppError> {
        let _guard = self.write_lock.lock().await;
        let mut task = self.find_task_by_id_or_fail(id).await?;
        if let Some(title) = request.title {
            task.title = title;
        }
        if let Some(description) = request.description {
            task.description = Some(description);
        }
        if let Some(status) = request.status {
            task.status = status;
        }
        if let Some(date_completed) = request.date_completed {
            task.date_completed = Some(date_completed);
        }
        task.updated_at = Utc::now();

        Self::write_json(&self.task_path(id), &task).await?;
        Ok(task)
    }

    async fn delete_task(&self, id: Uuid) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        match tokio_fs::remove_file(self.task_path(id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(AppError::NotFound(messages::resource_not_found("TASK")))
            },
            Err(e) => Err(e.into()),
        }
    }
}
