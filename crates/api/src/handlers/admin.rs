//! Admin endpoints guarded by the shared admin password.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use talio_core::types::DbId;

use crate::error::{AppError, AppResult};
use crate::handlers::PasswordRequest;
use crate::response::DataResponse;
use crate::state::AppState;

fn require_admin(state: &AppState, password: &str) -> AppResult<()> {
    if password == state.config.admin_password {
        Ok(())
    } else {
        Err(AppError::AdminDenied)
    }
}

/// POST /api/v1/admin/check
pub async fn check_admin(
    State(state): State<AppState>,
    Json(input): Json<PasswordRequest>,
) -> AppResult<impl IntoResponse> {
    require_admin(&state, &input.password)?;
    Ok(Json(DataResponse { data: true }))
}

/// POST /api/v1/admin/boards/{id}/password/remove
///
/// Clears a board password without knowing it.
pub async fn remove_board_password(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<PasswordRequest>,
) -> AppResult<impl IntoResponse> {
    require_admin(&state, &input.password)?;
    let board = state.store.remove_password_admin(id).await?;

    tracing::info!(board_id = id, "Board password removed by admin");
    Ok(Json(DataResponse { data: board }))
}
