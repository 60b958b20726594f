use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{boards, status};
use crate::state::AppState;

/// Board routes mounted at `/boards`.
///
/// ```text
/// GET    /                        -> list_boards
/// POST   /                        -> save_board
/// GET    /{id}                    -> get_board
/// DELETE /{id}                    -> delete_board
/// GET    /join/{code}             -> get_board_by_join_code
/// GET    /{id}/status             -> board_status (long-poll)
/// POST   /{id}/password/check     -> check_password
/// POST   /{id}/password/remove    -> remove_password
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(boards::list_boards).post(boards::save_board))
        .route("/{id}", get(boards::get_board).delete(boards::delete_board))
        .route("/join/{code}", get(boards::get_board_by_join_code))
        .route("/{id}/status", get(status::board_status))
        .route("/{id}/password/check", post(boards::check_password))
        .route("/{id}/password/remove", post(boards::remove_password))
}
