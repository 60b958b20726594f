//! Long-poll deletion status.
//!
//! A status request blocks until the entity is deleted or the configured
//! timeout passes. Deletion answers `200 {"data": id}`; timeout answers
//! `304 Not Modified` and the client simply asks again. An entity that is
//! already gone answers immediately.

use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use talio_core::types::DbId;
use talio_events::EntityKind;
use tokio::sync::broadcast::error::RecvError;

use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/tasks/{id}/status
pub async fn task_status(State(state): State<AppState>, Path(id): Path<DbId>) -> Response {
    wait_for_deletion(&state, EntityKind::Task, id).await
}

/// GET /api/v1/boards/{id}/status
pub async fn board_status(State(state): State<AppState>, Path(id): Path<DbId>) -> Response {
    wait_for_deletion(&state, EntityKind::Board, id).await
}

async fn exists(state: &AppState, kind: EntityKind, id: DbId) -> bool {
    match kind {
        EntityKind::Board => state.store.board_exists(id).await,
        EntityKind::Task => state.store.task_exists(id).await,
        EntityKind::TaskList => state
            .store
            .list_boards()
            .await
            .iter()
            .any(|b| b.task_list(id).is_some()),
    }
}

async fn wait_for_deletion(state: &AppState, kind: EntityKind, id: DbId) -> Response {
    // Subscribe before the existence check so a deletion in between is not lost.
    let mut events = state.event_bus.subscribe();
    if !exists(state, kind, id).await {
        return Json(DataResponse { data: id }).into_response();
    }

    let wait = async {
        loop {
            match events.recv().await {
                Ok(event) if event.is_deletion_of(kind, id) => return true,
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Status waiter lagged behind event bus");
                    if !exists(state, kind, id).await {
                        return true;
                    }
                }
                Err(RecvError::Closed) => return false,
            }
        }
    };

    let timeout = Duration::from_secs(state.config.long_poll_timeout_secs);
    match tokio::time::timeout(timeout, wait).await {
        Ok(true) => {
            tracing::debug!(?kind, id, "Status waiter notified of deletion");
            Json(DataResponse { data: id }).into_response()
        }
        _ => StatusCode::NOT_MODIFIED.into_response(),
    }
}
