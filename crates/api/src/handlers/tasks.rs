use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use talio_core::error::CoreError;
use talio_core::model::Task;
use talio_core::types::DbId;

use crate::error::{AppError, AppResult};
use crate::handlers::announce_removals;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/tasks/{id}
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let task = state
        .store
        .get_task(id)
        .await
        .ok_or(AppError::Core(CoreError::not_found("Task", id)))?;
    Ok(Json(DataResponse { data: task }))
}

/// POST /api/v1/tasks
///
/// Create or replace a task in the list named by `taskListId`. A task that
/// currently sits in another list is moved.
pub async fn save_task(
    State(state): State<AppState>,
    Json(input): Json<Task>,
) -> AppResult<impl IntoResponse> {
    if input.title.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Task title must not be empty".into(),
        )));
    }
    let (task, saved) = state.store.save_task(input).await?;
    announce_removals(&state, &saved);

    tracing::info!(task_id = task.id, task_list_id = task.task_list_id, "Task saved");
    Ok(Json(DataResponse { data: task }))
}

/// DELETE /api/v1/tasks/{id}
pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let (task, saved) = state
        .store
        .delete_task(id)
        .await
        .ok_or(AppError::Core(CoreError::not_found("Task", id)))?;
    announce_removals(&state, &saved);

    tracing::info!(task_id = id, "Task deleted");
    Ok(Json(DataResponse { data: task }))
}
