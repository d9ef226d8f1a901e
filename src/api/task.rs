use axum::{
    Json,
    extract::{Extension, Path, State},
};
use serde::{Deserialize, Serialize};

use crate::{
    AppState,
    middleware::auth::AuthUser,
    models::task::Task,
    errors::ApiError,
};

#[derive(Deserialize)]
pub struct CreateTaskRequest {
    title: String,
}

#[derive(Deserialize)]
pub struct UpdateTaskRequest {
    title: Option<String>,
    completed: Option<bool>,
}

#[derive(Serialize)]
pub struct MessageResponse {
    message: String,
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let tasks = Task::list_for_user(&state.pool, user_id).await?;
    Ok(Json(tasks))
}

pub async fn create_task(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(payload): Json<CreateTaskRequest>,
) -> Result<Json<Task>, ApiError> {
    let title = payload.title.trim();
    if title.is_empty() {
        return Err(ApiError::Validation("title is required".to_string()));
    }

    let task = Task::create(&state.pool, user_id, title).await?;
    Ok(Json(task))
}

pub async fn update_task(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateTaskRequest>,
) -> Result<Json<Task>, ApiError> {
    let task = Task::update(
        &state.pool,
        user_id,
        id,
        payload.title.as_deref(),
        payload.completed,
    )
    .await?
    .ok_or(ApiError::TaskNotFound)?;

    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    let deleted = Task::delete(&state.pool, user_id, id).await?;
    if !deleted {
        return Err(ApiError::TaskNotFound);
    }

    Ok(Json(MessageResponse {
        message: "Task deleted".to_string(),
    }))
}
