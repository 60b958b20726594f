pub mod admin;
pub mod boards;
pub mod health;
pub mod tags;
pub mod tasks;

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::{connection, subtasks, task_lists};
use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws                                   push relay (WebSocket)
/// /connection                           connectivity check
///
/// /boards                               list, save
/// /boards/{id}                          get, delete
/// /boards/join/{code}                   get by join code
/// /boards/{id}/status                   deletion long-poll
/// /boards/{id}/password/check           password check (POST)
/// /boards/{id}/password/remove          password removal (POST)
///
/// /admin/check                          admin password check (POST)
/// /admin/boards/{id}/password/remove    forced password removal (POST)
///
/// /task-lists                           save
/// /task-lists/{id}                      delete
///
/// /tasks                                save
/// /tasks/{id}                           get, delete
/// /tasks/{id}/status                    deletion long-poll
///
/// /subtasks                             save
/// /subtasks/{id}                        delete
///
/// /tags                                 save
/// /tags/board/{board_id}                distinct tags of a board
/// /tags/rename                          board-wide rename (POST)
/// /tags/purge                           board-wide removal (POST)
/// /tags/{task_id}/{tag_id}              remove from one task
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .route("/connection", get(connection::test_connection))
        .nest("/boards", boards::router())
        .nest("/admin", admin::router())
        .route("/task-lists", post(task_lists::save_task_list))
        .route("/task-lists/{id}", delete(task_lists::delete_task_list))
        .nest("/tasks", tasks::router())
        .route("/subtasks", post(subtasks::save_subtask))
        .route("/subtasks/{id}", delete(subtasks::delete_subtask))
        .nest("/tags", tags::router())
}
