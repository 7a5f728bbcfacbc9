// ============================
// crates/backend-lib/src/handlers/tasks.rs
// ============================
//! `/task` handlers. All run behind the access guard; the `{id}` routes
//! also require the caller to own the task.
use crate::error::AppError;
use crate::messages;
use crate::middleware::CurrentUser;
use crate::validation;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use std::sync::Arc;
use tasklive_common::{ApiResponse, CreateTaskRequest, Task, UpdateTaskRequest};
use uuid::Uuid;

/// `POST /task`
pub async fn create(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(body): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Task>>), AppError> {
    validation::validate_create_task(&body)?;
    let task = state.tasks.create(&user, body).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(messages::TASK_CREATED, task)),
    ))
}

/// `GET /task`
pub async fn list(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<Task>>>, AppError> {
    let tasks = state.tasks.list(&user).await?;
    Ok(Json(ApiResponse::data(tasks)))
}

/// `GET /task/{id}`
pub async fn find(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Task>>, AppError> {
    let task = state.tasks.find(&user, id).await?;
    Ok(Json(ApiResponse::data(task)))
}

/// `PATCH /task/{id}`
pub async fn update(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateTaskRequest>,
) -> Result<Json<ApiResponse<Task>>, AppError> {
    validation::validate_update_task(&body)?;
    let task = state.tasks.update(&user, id, body).await?;
    Ok(Json(ApiResponse::with_message(messages::TASK_UPDATED, task)))
}

/// `DELETE /task/{id}`
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state.tasks.delete(&user, id).await?;
    Ok(Json(ApiResponse::message(messages::TASK_DELETED)))
}
