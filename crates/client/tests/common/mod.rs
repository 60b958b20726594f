#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use talio_api::config::ServerConfig;
use talio_api::router::build_app_router;
use talio_api::state::AppState;
use talio_api::store::BoardStore;
use talio_client::error::GatewayError;
use talio_client::gateway::{PollOutcome, RemoteGateway, WatchTarget};
use talio_client::push::ReconnectConfig;
use talio_client::session::Session;
use talio_client::storage::LocalStore;
use talio_client::ui_loop::UiEvent;
use talio_core::error::CoreError;
use talio_core::hashing::hash_password;
use talio_core::model::{Board, SubTask, Tag, Task, TaskList};
use talio_core::types::DbId;

pub const ADMIN_PASSWORD: &str = "letmein";
pub const SERVER: &str = "http://test.invalid";

// ---------------------------------------------------------------------------
// In-process gateway
// ---------------------------------------------------------------------------

/// [`RemoteGateway`] straight over a server-side [`BoardStore`].
///
/// Long-poll rounds answer `Unchanged` after a short sleep so watch tests
/// run fast; every round is counted.
pub struct FakeGateway {
    pub store: BoardStore,
    polls: AtomicUsize,
    failing_polls: AtomicUsize,
    poll_delay: Duration,
}

impl FakeGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            store: BoardStore::new(),
            polls: AtomicUsize::new(0),
            failing_polls: AtomicUsize::new(0),
            poll_delay: Duration::from_millis(20),
        })
    }

    pub fn poll_count(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    /// Make the next `n` poll rounds fail with a 502.
    pub fn fail_next_polls(&self, n: usize) {
        self.failing_polls.store(n, Ordering::SeqCst);
    }
}

fn map_core(e: CoreError) -> GatewayError {
    match e {
        CoreError::NotFound { .. } => GatewayError::NotFound,
        other => GatewayError::Api {
            status: 400,
            body: other.to_string(),
        },
    }
}

#[async_trait]
impl RemoteGateway for FakeGateway {
    async fn test_connection(&self) -> Result<(), GatewayError> {
        Ok(())
    }

    async fn get_board(&self, id: DbId) -> Result<Board, GatewayError> {
        self.store.get_board(id).await.ok_or(GatewayError::NotFound)
    }

    async fn get_board_by_join_code(&self, code: &str) -> Result<Board, GatewayError> {
        self.store
            .board_by_join_code(&code.trim().to_ascii_uppercase())
            .await
            .ok_or(GatewayError::NotFound)
    }

    async fn list_boards(&self) -> Result<Vec<Board>, GatewayError> {
        Ok(self.store.list_boards().await)
    }

    async fn save_board(&self, board: &Board) -> Result<Board, GatewayError> {
        Ok(self.store.save_board(board.clone()).await.board)
    }

    async fn delete_board(&self, id: DbId) -> Result<(), GatewayError> {
        self.store.delete_board(id).await.map(|_| ()).ok_or(GatewayError::NotFound)
    }

    async fn save_task_list(&self, list: &TaskList) -> Result<TaskList, GatewayError> {
        let (list, _) = self.store.save_task_list(list.clone()).await.map_err(map_core)?;
        Ok(list)
    }

    async fn delete_task_list(&self, id: DbId) -> Result<(), GatewayError> {
        self.store.delete_task_list(id).await.map(|_| ()).ok_or(GatewayError::NotFound)
    }

    async fn get_task(&self, id: DbId) -> Result<Task, GatewayError> {
        self.store.get_task(id).await.ok_or(GatewayError::NotFound)
    }

    async fn save_task(&self, task: &Task) -> Result<Task, GatewayError> {
        let (task, _) = self.store.save_task(task.clone()).await.map_err(map_core)?;
        Ok(task)
    }

    async fn delete_task(&self, id: DbId) -> Result<(), GatewayError> {
        self.store.delete_task(id).await.map(|_| ()).ok_or(GatewayError::NotFound)
    }

    async fn save_subtask(&self, subtask: &SubTask) -> Result<SubTask, GatewayError> {
        let (subtask, _) = self.store.save_subtask(subtask.clone()).await.map_err(map_core)?;
        Ok(subtask)
    }

    async fn delete_subtask(&self, id: DbId) -> Result<(), GatewayError> {
        self.store.delete_subtask(id).await.map(|_| ()).ok_or(GatewayError::NotFound)
    }

    async fn board_tags(&self, board_id: DbId) -> Result<Vec<Tag>, GatewayError> {
        self.store.board_tags(board_id).await.map_err(map_core)
    }

    async fn save_tag(&self, tag: &Tag) -> Result<Tag, GatewayError> {
        let (tag, _) = self.store.save_tag(tag.clone()).await.map_err(map_core)?;
        Ok(tag)
    }

    async fn rename_tag(&self, old: &Tag, new: &Tag) -> Result<Board, GatewayError> {
        let (_, saved) = self.store.rename_tag(old, new).await.map_err(map_core)?;
        Ok(saved.board)
    }

    async fn remove_tag(&self, task_id: DbId, tag_id: DbId) -> Result<(), GatewayError> {
        self.store
            .remove_tag(task_id, tag_id)
            .await
            .map(|_| ())
            .ok_or(GatewayError::NotFound)
    }

    async fn purge_tag(&self, tag: &Tag) -> Result<Board, GatewayError> {
        let (_, saved) = self.store.purge_tag(tag).await.map_err(map_core)?;
        Ok(saved.board)
    }

    async fn check_board_password(
        &self,
        id: DbId,
        password_hash: &str,
    ) -> Result<Option<Board>, GatewayError> {
        self.store.check_password(id, password_hash).await.map_err(map_core)
    }

    async fn remove_board_password(
        &self,
        id: DbId,
        password_hash: &str,
    ) -> Result<Option<Board>, GatewayError> {
        self.store.remove_password(id, password_hash).await.map_err(map_core)
    }

    async fn admin_remove_board_password(
        &self,
        id: DbId,
        admin_password: &str,
    ) -> Result<Board, GatewayError> {
        if admin_password != ADMIN_PASSWORD {
            return Err(GatewayError::Denied);
        }
        self.store.remove_password_admin(id).await.map_err(map_core)
    }

    async fn check_admin_password(&self, password: &str) -> Result<bool, GatewayError> {
        Ok(password == ADMIN_PASSWORD)
    }

    async fn poll_status(&self, target: WatchTarget) -> Result<PollOutcome, GatewayError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failing_polls
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if failing.is_ok() {
            return Err(GatewayError::Api {
                status: 502,
                body: "bad gateway".into(),
            });
        }
        let exists = match target {
            WatchTarget::Board(id) => self.store.board_exists(id).await,
            WatchTarget::Task(id) => self.store.task_exists(id).await,
        };
        if !exists {
            return Ok(PollOutcome::Deleted);
        }
        tokio::time::sleep(self.poll_delay).await;
        Ok(PollOutcome::Unchanged)
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// "Sprint" with `Todo: [Write spec {urgent}, Review]` and an empty `Done`.
pub fn sample_board() -> Board {
    let mut board = Board::new("Sprint");

    let mut todo = TaskList::new("Todo", 0);
    let mut write = Task::new("Write spec", 0);
    let mut urgent = Tag::new("urgent", 0);
    urgent.tag_color = "#ff0000".into();
    write.tags.push(urgent);
    write.sub_tasks.push(SubTask::new("Outline", 0));
    todo.tasks.push(write);
    todo.tasks.push(Task::new("Review", 0));

    board.task_lists.push(todo);
    board.task_lists.push(TaskList::new("Done", 0));
    board
}

/// Save [`sample_board`], optionally protected by `password`.
pub async fn seed_board(fake: &FakeGateway, password: Option<&str>) -> Board {
    let mut board = sample_board();
    if let Some(password) = password {
        board.password = hash_password(password);
    }
    fake.store.save_board(board).await.board
}

pub fn task_id(board: &Board, title: &str) -> DbId {
    board
        .task_lists
        .iter()
        .flat_map(|l| l.tasks.iter())
        .find(|t| t.title == title)
        .map(|t| t.id)
        .expect("no task with that title")
}

pub fn list_id(board: &Board, title: &str) -> DbId {
    board
        .task_lists
        .iter()
        .find(|l| l.title == title)
        .map(|l| l.id)
        .expect("no list with that title")
}

/// Backoff short enough for tests.
pub fn fast_backoff() -> ReconnectConfig {
    ReconnectConfig {
        initial_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(50),
        ..Default::default()
    }
}

pub struct TestSession {
    pub session: Session,
    pub events: mpsc::UnboundedReceiver<UiEvent>,
    pub dir: TempDir,
}

/// A session over `fake` with its local store in a temp dir.
pub fn test_session(fake: &Arc<FakeGateway>) -> TestSession {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::load(dir.path().join("state.json")).unwrap();
    let (ui_tx, events) = mpsc::unbounded_channel();
    let gateway: Arc<dyn RemoteGateway> = fake.clone();
    let session = Session::new(gateway, SERVER, store, ui_tx).with_watch_backoff(fast_backoff());
    TestSession { session, events, dir }
}

/// Wait for the next event on the UI channel.
pub async fn next_event(events: &mut mpsc::UnboundedReceiver<UiEvent>) -> UiEvent {
    tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("timed out waiting for a UI event")
        .expect("UI channel closed")
}

// ---------------------------------------------------------------------------
// Real server
// ---------------------------------------------------------------------------

pub fn server_config() -> ServerConfig {
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

/// A served API that a test can take down.
pub struct TestServer {
    pub base_url: String,
    pub state: AppState,
    serve: JoinHandle<()>,
}

impl TestServer {
    /// Stop accepting connections and close every relay socket.
    pub async fn stop(self) {
        self.serve.abort();
        let _ = self.serve.await;
        self.state.ws_manager.shutdown_all().await;
    }
}

/// Serve the full API on an ephemeral port.
pub async fn start_server() -> TestServer {
    let config = server_config();
    let state = AppState::new(config.clone());
    let app = build_app_router(state.clone(), &config);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let serve = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    TestServer {
        base_url: format!("http://{addr}"),
        state,
        serve,
    }
}

/// [`start_server`] for tests that never stop it. Returns the base URL and
/// state.
pub async fn spawn_server() -> (String, AppState) {
    let server = start_server().await;
    (server.base_url, server.state)
}
