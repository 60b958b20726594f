//! Remote gateway over the REST API.
//!
//! [`RemoteGateway`] is the seam session code talks to; [`HttpGateway`]
//! implements it with [`reqwest`] against the server routes. Every response
//! body is the `{"data": ...}` envelope.
//!
//! Password mismatches are ordinary negative results (`Ok(None)` /
//! `Ok(false)`), not errors.

use std::fmt;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use talio_core::model::{Board, SubTask, Tag, Task, TaskList};
use talio_core::types::DbId;

use crate::error::GatewayError;

/// Entity a deletion watch observes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchTarget {
    Board(DbId),
    Task(DbId),
}

impl WatchTarget {
    pub fn id(&self) -> DbId {
        match *self {
            Self::Board(id) | Self::Task(id) => id,
        }
    }

    fn status_path(&self) -> String {
        match self {
            Self::Board(id) => format!("/boards/{id}/status"),
            Self::Task(id) => format!("/tasks/{id}/status"),
        }
    }
}

impl fmt::Display for WatchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Board(id) => write!(f, "board {id}"),
            Self::Task(id) => write!(f, "task {id}"),
        }
    }
}

/// Answer to one long-poll round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The server timed out without a change; ask again.
    Unchanged,
    /// The entity is gone.
    Deleted,
}

/// Request/response collaborator for all CRUD traffic.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    async fn test_connection(&self) -> Result<(), GatewayError>;

    async fn get_board(&self, id: DbId) -> Result<Board, GatewayError>;
    async fn get_board_by_join_code(&self, code: &str) -> Result<Board, GatewayError>;
    /// Every board on the server (admin overview).
    async fn list_boards(&self) -> Result<Vec<Board>, GatewayError>;
    async fn save_board(&self, board: &Board) -> Result<Board, GatewayError>;
    async fn delete_board(&self, id: DbId) -> Result<(), GatewayError>;

    async fn save_task_list(&self, list: &TaskList) -> Result<TaskList, GatewayError>;
    async fn delete_task_list(&self, id: DbId) -> Result<(), GatewayError>;

    async fn get_task(&self, id: DbId) -> Result<Task, GatewayError>;
    async fn save_task(&self, task: &Task) -> Result<Task, GatewayError>;
    async fn delete_task(&self, id: DbId) -> Result<(), GatewayError>;

    async fn save_subtask(&self, subtask: &SubTask) -> Result<SubTask, GatewayError>;
    async fn delete_subtask(&self, id: DbId) -> Result<(), GatewayError>;

    async fn board_tags(&self, board_id: DbId) -> Result<Vec<Tag>, GatewayError>;
    async fn save_tag(&self, tag: &Tag) -> Result<Tag, GatewayError>;
    /// Relabel every copy of `old` on its board; returns the updated board.
    async fn rename_tag(&self, old: &Tag, new: &Tag) -> Result<Board, GatewayError>;
    async fn remove_tag(&self, task_id: DbId, tag_id: DbId) -> Result<(), GatewayError>;
    /// Drop every copy of `tag` from its board; returns the updated board.
    async fn purge_tag(&self, tag: &Tag) -> Result<Board, GatewayError>;

    /// Returns the board when `password_hash` matches.
    async fn check_board_password(
        &self,
        id: DbId,
        password_hash: &str,
    ) -> Result<Option<Board>, GatewayError>;
    /// Clears the password when `password_hash` matches.
    async fn remove_board_password(
        &self,
        id: DbId,
        password_hash: &str,
    ) -> Result<Option<Board>, GatewayError>;
    async fn admin_remove_board_password(
        &self,
        id: DbId,
        admin_password: &str,
    ) -> Result<Board, GatewayError>;
    async fn check_admin_password(&self, password: &str) -> Result<bool, GatewayError>;

    /// One long-poll round against the deletion status of `target`.
    async fn poll_status(&self, target: WatchTarget) -> Result<PollOutcome, GatewayError>;
}

#[derive(Deserialize)]
struct DataResponse<T> {
    data: T,
}

/// [`RemoteGateway`] over HTTP.
pub struct HttpGateway {
    client: reqwest::Client,
    api_url: String,
}

impl HttpGateway {
    /// * `api_url` - REST base URL, e.g. `http://host:8080/api/v1`.
    pub fn new(api_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url,
        }
    }

    /// Create a gateway reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: String) -> Self {
        Self { client, api_url }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.api_url)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        let response = self.client.get(self.url(path)).send().await?;
        Self::parse_response(response).await
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, GatewayError>
    where
        B: serde::Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let response = self.client.post(self.url(path)).json(body).send().await?;
        Self::parse_response(response).await
    }

    async fn delete(&self, path: &str) -> Result<(), GatewayError> {
        let response = self.client.delete(self.url(path)).send().await?;
        Self::check_status(response).await
    }

    /// POST that treats 403 as a negative answer.
    async fn post_guarded<B, T>(&self, path: &str, body: &B) -> Result<Option<T>, GatewayError>
    where
        B: serde::Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        match self.post(path, body).await {
            Ok(value) => Ok(Some(value)),
            Err(GatewayError::Denied) => Ok(None),
            Err(e) => Err(e),
        }
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Maps 404 to
    /// [`GatewayError::NotFound`] and 403 to [`GatewayError::Denied`];
    /// other failures keep their status and body.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, GatewayError> {
        let status = response.status();
        match status {
            s if s.is_success() => Ok(response),
            StatusCode::NOT_FOUND => Err(GatewayError::NotFound),
            StatusCode::FORBIDDEN => Err(GatewayError::Denied),
            _ => {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "<unreadable body>".to_string());
                Err(GatewayError::Api {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }

    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, GatewayError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<DataResponse<T>>().await?.data)
    }

    async fn check_status(response: reqwest::Response) -> Result<(), GatewayError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}

#[derive(serde::Serialize)]
struct PasswordBody<'a> {
    password: &'a str,
}

#[derive(serde::Serialize)]
struct RenameBody<'a> {
    old: &'a Tag,
    new: &'a Tag,
}

#[async_trait]
impl RemoteGateway for HttpGateway {
    async fn test_connection(&self) -> Result<(), GatewayError> {
        let _: String = self.get("/connection").await?;
        Ok(())
    }

    async fn get_board(&self, id: DbId) -> Result<Board, GatewayError> {
        self.get(&format!("/boards/{id}")).await
    }

    async fn get_board_by_join_code(&self, code: &str) -> Result<Board, GatewayError> {
        match self.get(&format!("/boards/join/{}", code.trim())).await {
            Err(GatewayError::Api { status: 400, .. }) => Err(GatewayError::NotFound),
            other => other,
        }
    }

    async fn list_boards(&self) -> Result<Vec<Board>, GatewayError> {
        self.get("/boards").await
    }

    async fn save_board(&self, board: &Board) -> Result<Board, GatewayError> {
        self.post("/boards", board).await
    }

    async fn delete_board(&self, id: DbId) -> Result<(), GatewayError> {
        self.delete(&format!("/boards/{id}")).await
    }

    async fn save_task_list(&self, list: &TaskList) -> Result<TaskList, GatewayError> {
        self.post("/task-lists", list).await
    }

    async fn delete_task_list(&self, id: DbId) -> Result<(), GatewayError> {
        self.delete(&format!("/task-lists/{id}")).await
    }

    async fn get_task(&self, id: DbId) -> Result<Task, GatewayError> {
        self.get(&format!("/tasks/{id}")).await
    }

    async fn save_task(&self, task: &Task) -> Result<Task, GatewayError> {
        self.post("/tasks", task).await
    }

    async fn delete_task(&self, id: DbId) -> Result<(), GatewayError> {
        self.delete(&format!("/tasks/{id}")).await
    }

    async fn save_subtask(&self, subtask: &SubTask) -> Result<SubTask, GatewayError> {
        self.post("/subtasks", subtask).await
    }

    async fn delete_subtask(&self, id: DbId) -> Result<(), GatewayError> {
        self.delete(&format!("/subtasks/{id}")).await
    }

    async fn board_tags(&self, board_id: DbId) -> Result<Vec<Tag>, GatewayError> {
        self.get(&format!("/tags/board/{board_id}")).await
    }

    async fn save_tag(&self, tag: &Tag) -> Result<Tag, GatewayError> {
        self.post("/tags", tag).await
    }

    async fn rename_tag(&self, old: &Tag, new: &Tag) -> Result<Board, GatewayError> {
        self.post("/tags/rename", &RenameBody { old, new }).await
    }

    async fn remove_tag(&self, task_id: DbId, tag_id: DbId) -> Result<(), GatewayError> {
        self.delete(&format!("/tags/{task_id}/{tag_id}")).await
    }

    async fn purge_tag(&self, tag: &Tag) -> Result<Board, GatewayError> {
        self.post("/tags/purge", tag).await
    }

    async fn check_board_password(
        &self,
        id: DbId,
        password_hash: &str,
    ) -> Result<Option<Board>, GatewayError> {
        let body = PasswordBody { password: password_hash };
        self.post_guarded(&format!("/boards/{id}/password/check"), &body).await
    }

    async fn remove_board_password(
        &self,
        id: DbId,
        password_hash: &str,
    ) -> Result<Option<Board>, GatewayError> {
        let body = PasswordBody { password: password_hash };
        self.post_guarded(&format!("/boards/{id}/password/remove"), &body).await
    }

    async fn admin_remove_board_password(
        &self,
        id: DbId,
        admin_password: &str,
    ) -> Result<Board, GatewayError> {
        let body = PasswordBody { password: admin_password };
        self.post(&format!("/admin/boards/{id}/password/remove"), &body).await
    }

    async fn check_admin_password(&self, password: &str) -> Result<bool, GatewayError> {
        let answer: Option<bool> = self
            .post_guarded("/admin/check", &PasswordBody { password })
            .await?;
        Ok(answer.unwrap_or(false))
    }

    async fn poll_status(&self, target: WatchTarget) -> Result<PollOutcome, GatewayError> {
        let response = self
            .client
            .get(self.url(&target.status_path()))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_MODIFIED {
            return Ok(PollOutcome::Unchanged);
        }
        let _: DbId = Self::parse_response(response).await?;
        Ok(PollOutcome::Deleted)
    }
}
