//! Board handlers.
//!
//! Saving a board replaces the whole tree it owns. Anything the new version
//! no longer contains is announced on the event bus so status long-polls
//! for those entities return.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use talio_core::error::CoreError;
use talio_core::model::Board;
use talio_core::types::DbId;
use talio_events::{EntityEvent, EntityKind};

use crate::error::{AppError, AppResult};
use crate::handlers::{announce_removals, PasswordRequest};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/boards
pub async fn list_boards(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let boards = state.store.list_boards().await;
    Ok(Json(DataResponse { data: boards }))
}

/// GET /api/v1/boards/{id}
pub async fn get_board(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let board = state
        .store
        .get_board(id)
        .await
        .ok_or(AppError::Core(CoreError::not_found("Board", id)))?;
    Ok(Json(DataResponse { data: board }))
}

/// GET /api/v1/boards/join/{code}
pub async fn get_board_by_join_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<impl IntoResponse> {
    let code = code.trim().to_ascii_uppercase();
    let board = state
        .store
        .board_by_join_code(&code)
        .await
        .ok_or_else(|| AppError::UnknownJoinCode(code.clone()))?;
    Ok(Json(DataResponse { data: board }))
}

/// POST /api/v1/boards
///
/// Create or replace a board. Returns the stored copy with ids assigned.
pub async fn save_board(
    State(state): State<AppState>,
    Json(input): Json<Board>,
) -> AppResult<impl IntoResponse> {
    if input.title.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Board title must not be empty".into(),
        )));
    }
    let saved = state.store.save_board(input).await;
    announce_removals(&state, &saved);

    tracing::info!(board_id = saved.board.id, "Board saved");
    Ok(Json(DataResponse { data: saved.board }))
}

/// DELETE /api/v1/boards/{id}
pub async fn delete_board(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let board = state
        .store
        .delete_board(id)
        .await
        .ok_or(AppError::Core(CoreError::not_found("Board", id)))?;

    for task in board.task_lists.iter().flat_map(|l| l.tasks.iter()) {
        state
            .event_bus
            .publish(EntityEvent::deleted(EntityKind::Task, task.id).with_board(id));
    }
    state
        .event_bus
        .publish(EntityEvent::deleted(EntityKind::Board, id));

    tracing::info!(board_id = id, "Board deleted");
    Ok(Json(DataResponse { data: board }))
}

/// POST /api/v1/boards/{id}/password/check
///
/// Returns the board when the password hash matches, 403 otherwise.
pub async fn check_password(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<PasswordRequest>,
) -> AppResult<impl IntoResponse> {
    let board = state
        .store
        .check_password(id, &input.password)
        .await?
        .ok_or(AppError::PasswordDenied(id))?;
    Ok(Json(DataResponse { data: board }))
}

/// POST /api/v1/boards/{id}/password/remove
pub async fn remove_password(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<PasswordRequest>,
) -> AppResult<impl IntoResponse> {
    let board = state
        .store
        .remove_password(id, &input.password)
        .await?
        .ok_or(AppError::PasswordDenied(id))?;

    tracing::info!(board_id = id, "Board password removed");
    Ok(Json(DataResponse { data: board }))
}
