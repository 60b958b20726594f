use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{status, tasks};
use crate::state::AppState;

/// Task routes mounted at `/tasks`.
///
/// ```text
/// POST   /                -> save_task
/// GET    /{id}            -> get_task
/// DELETE /{id}            -> delete_task
/// GET    /{id}/status     -> task_status (long-poll)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(tasks::save_task))
        .route("/{id}", get(tasks::get_task).delete(tasks::delete_task))
        .route("/{id}/status", get(status::task_status))
}
