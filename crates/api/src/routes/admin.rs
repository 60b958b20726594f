use axum::routing::post;
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Admin routes mounted at `/admin`.
///
/// ```text
/// POST   /check                          -> check_admin
/// POST   /boards/{id}/password/remove    -> remove_board_password
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/check", post(admin::check_admin))
        .route(
            "/boards/{id}/password/remove",
            post(admin::remove_board_password),
        )
}
