use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use talio_core::error::CoreError;
use talio_core::model::SubTask;
use talio_core::types::DbId;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/subtasks
pub async fn save_subtask(
    State(state): State<AppState>,
    Json(input): Json<SubTask>,
) -> AppResult<impl IntoResponse> {
    let (subtask, _) = state.store.save_subtask(input).await?;
    tracing::debug!(subtask_id = subtask.id, task_id = subtask.task_id, "Subtask saved");
    Ok(Json(DataResponse { data: subtask }))
}

/// DELETE /api/v1/subtasks/{id}
pub async fn delete_subtask(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let (subtask, _) = state
        .store
        .delete_subtask(id)
        .await
        .ok_or(AppError::Core(CoreError::not_found("SubTask", id)))?;
    Ok(Json(DataResponse { data: subtask }))
}
