//! Task CRUD Handlers
//!
//! Every handler reads the authenticated principal from the AuthUser
//! extension and scopes all store access to it. Absent and not-owned tasks
//! produce the same 404.

use axum::{
    extract::{Path, Query, State},
    response::Json,
    Extension,
};
use tracing::info;

use super::state::AppManager;
use super::types::{
    CreateTaskRequest, DeleteTaskResponse, ListTasksQuery, TaskListResponse, UpdateTaskRequest,
};
use crate::auth::AuthUser;
use crate::errors::{AppError, Result, ValidationErrorExt};
use crate::store::types::{NewTask, Task, TaskPatch};
use crate::validation;

/// Application state type alias
pub type AppState = std::sync::Arc<AppManager>;

/// List the caller's tasks, newest first
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Query(query): Query<ListTasksQuery>,
) -> Result<Json<TaskListResponse>> {
    let tasks = state.task_store().list(&user_id, query.filter)?;
    let count = tasks.len();

    Ok(Json(TaskListResponse { tasks, count }))
}

/// Create a task for the caller
pub async fn create_task(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(req): Json<CreateTaskRequest>,
) -> Result<Json<Task>> {
    validation::validate_title(&req.title).map_validation_err("title")?;
    if let Some(ref description) = req.description {
        validation::validate_description(description).map_validation_err("description")?;
    }

    let task = state.task_store().insert(
        &user_id,
        NewTask {
            title: req.title,
            description: req.description,
            is_completed: req.is_completed,
        },
    )?;

    info!(user_id = %user_id, task_id = task.id, "Task created via API");

    Ok(Json(task))
}

/// Fetch a single task by id
pub async fn get_task(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(task_id): Path<u64>,
) -> Result<Json<Task>> {
    state
        .task_store()
        .get(&user_id, task_id)?
        .map(Json)
        .ok_or(AppError::TaskNotFound(task_id))
}

/// Partially update a task
pub async fn update_task(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(task_id): Path<u64>,
    Json(req): Json<UpdateTaskRequest>,
) -> Result<Json<Task>> {
    if let Some(ref title) = req.title {
        validation::validate_title(title).map_validation_err("title")?;
    }
    if let Some(Some(ref description)) = req.description {
        validation::validate_description(description).map_validation_err("description")?;
    }

    let patch = TaskPatch {
        title: req.title,
        description: req.description,
        is_completed: req.is_completed,
    };

    state
        .task_store()
        .update(&user_id, task_id, patch)?
        .map(Json)
        .ok_or(AppError::TaskNotFound(task_id))
}

/// Delete a task
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(task_id): Path<u64>,
) -> Result<Json<DeleteTaskResponse>> {
    if !state.task_store().delete(&user_id, task_id)? {
        return Err(AppError::TaskNotFound(task_id));
    }

    info!(user_id = %user_id, task_id, "Task deleted via API");

    Ok(Json(DeleteTaskResponse {
        success: true,
        id: task_id,
    }))
}

/// Flip a task's completion flag
pub async fn toggle_task(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(task_id): Path<u64>,
) -> Result<Json<Task>> {
    state
        .task_store()
        .toggle(&user_id, task_id)?
        .map(Json)
        .ok_or(AppError::TaskNotFound(task_id))
}
