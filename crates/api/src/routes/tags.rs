use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::tags;
use crate::state::AppState;

/// Tag routes mounted at `/tags`.
///
/// ```text
/// POST   /                        -> save_tag
/// GET    /board/{board_id}        -> board_tags
/// POST   /rename                  -> rename_tag
/// POST   /purge                   -> purge_tag
/// DELETE /{task_id}/{tag_id}      -> remove_tag
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(tags::save_tag))
        .route("/board/{board_id}", get(tags::board_tags))
        .route("/rename", post(tags::rename_tag))
        .route("/purge", post(tags::purge_tag))
        .route("/{task_id}/{tag_id}", delete(tags::remove_tag))
}
