#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use talio_core::model::{Board, Task, TaskList};
use tower::ServiceExt;

use talio_api::config::ServerConfig;
use talio_api::router::build_app_router;
use talio_api::state::AppState;

pub const ADMIN_PASSWORD: &str = "letmein";

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default)
/// and a one-second long-poll so status tests stay fast.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        long_poll_timeout_secs: 1,
        admin_password: ADMIN_PASSWORD.to_string(),
        admin_password_generated: false,
    }
}

/// Fresh state backed by an empty store.
pub fn test_state() -> AppState {
    AppState::new(test_config())
}

/// Build the full application router over `state`.
///
/// Goes through the same `build_app_router` as `main.rs`, so tests exercise
/// the production middleware stack. Clone `state` to share one store across
/// several requests.
pub fn build_test_app(state: AppState) -> Router {
    build_app_router(state, &test_config())
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, Method::GET, uri, Body::empty()).await
}

pub async fn delete(app: Router, uri: &str) -> Response {
    send(app, Method::DELETE, uri, Body::empty()).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send(app, Method::POST, uri, Body::from(body.to_string())).await
}

async fn send(app: Router, method: Method, uri: &str, body: Body) -> Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body)
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Board with one "Todo" list holding one "Ship it" task, all unsaved.
pub fn sample_board() -> Board {
    let mut board = Board::new("Release");
    let mut list = TaskList::new("Todo", 0);
    list.tasks.push(Task::new("Ship it", 0));
    board.task_lists.push(list);
    board
}

/// Store [`sample_board`] through the API; returns the saved copy.
pub async fn seed_board(state: &AppState) -> Board {
    let body = serde_json::to_value(sample_board()).unwrap();
    let response = post_json(build_test_app(state.clone()), "/api/v1/boards", body).await;
    serde_json::from_value(body_json(response).await["data"].clone()).unwrap()
}
