use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use talio_core::error::CoreError;
use talio_core::model::TaskList;
use talio_core::types::DbId;

use crate::error::{AppError, AppResult};
use crate::handlers::announce_removals;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/task-lists
pub async fn save_task_list(
    State(state): State<AppState>,
    Json(input): Json<TaskList>,
) -> AppResult<impl IntoResponse> {
    let (list, saved) = state.store.save_task_list(input).await?;
    announce_removals(&state, &saved);

    tracing::info!(task_list_id = list.id, board_id = list.board_id, "Task list saved");
    Ok(Json(DataResponse { data: list }))
}

/// DELETE /api/v1/task-lists/{id}
pub async fn delete_task_list(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let (list, saved) = state
        .store
        .delete_task_list(id)
        .await
        .ok_or(AppError::Core(CoreError::not_found("TaskList", id)))?;
    announce_removals(&state, &saved);

    tracing::info!(task_list_id = id, "Task list deleted");
    Ok(Json(DataResponse { data: list }))
}
