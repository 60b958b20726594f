//! Tag handlers.
//!
//! Tags are board-scoped labels copied into tasks. Renames and purges match
//! copies by label (description and colours) on the tag's board.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use talio_core::error::CoreError;
use talio_core::model::Tag;
use talio_core::types::DbId;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of `POST /tags/rename`.
#[derive(Debug, Deserialize)]
pub struct RenameTagRequest {
    pub old: Tag,
    pub new: Tag,
}

/// GET /api/v1/tags/board/{board_id}
///
/// Distinct tags used on a board.
pub async fn board_tags(
    State(state): State<AppState>,
    Path(board_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let tags = state.store.board_tags(board_id).await?;
    Ok(Json(DataResponse { data: tags }))
}

/// POST /api/v1/tags
pub async fn save_tag(
    State(state): State<AppState>,
    Json(input): Json<Tag>,
) -> AppResult<impl IntoResponse> {
    if input.description.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Tag description must not be empty".into(),
        )));
    }
    let (tag, _) = state.store.save_tag(input).await?;
    tracing::info!(tag_id = tag.id, board_id = tag.board_id, "Tag saved");
    Ok(Json(DataResponse { data: tag }))
}

/// POST /api/v1/tags/rename
///
/// Relabel every copy of `old` on its board. Returns the updated board.
pub async fn rename_tag(
    State(state): State<AppState>,
    Json(input): Json<RenameTagRequest>,
) -> AppResult<impl IntoResponse> {
    if input.old.board_id != input.new.board_id {
        return Err(AppError::MixedBoards(input.old.board_id, input.new.board_id));
    }
    let (renamed, saved) = state.store.rename_tag(&input.old, &input.new).await?;
    tracing::info!(board_id = saved.board.id, renamed, "Tag renamed");
    Ok(Json(DataResponse { data: saved.board }))
}

/// POST /api/v1/tags/purge
///
/// Remove every copy of a tag from its board. Returns the updated board.
pub async fn purge_tag(
    State(state): State<AppState>,
    Json(input): Json<Tag>,
) -> AppResult<impl IntoResponse> {
    let (removed, saved) = state.store.purge_tag(&input).await?;
    tracing::info!(board_id = saved.board.id, removed, "Tag purged");
    Ok(Json(DataResponse { data: saved.board }))
}

/// DELETE /api/v1/tags/{task_id}/{tag_id}
pub async fn remove_tag(
    State(state): State<AppState>,
    Path((task_id, tag_id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    let (tag, _) = state
        .store
        .remove_tag(task_id, tag_id)
        .await
        .ok_or(AppError::Core(CoreError::not_found("Tag", tag_id)))?;
    Ok(Json(DataResponse { data: tag }))
}
