//! Session and navigation controller.
//!
//! [`Session`] is owned by the UI loop and is the only writer of the view
//! registry. Mutations follow one discipline: copy the current model, send
//! it through the gateway, apply the server's canonical copy locally, then
//! publish it so other clients converge.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;

use tokio::sync::mpsc;

use talio_core::hashing::hash_password;
use talio_core::model::{Board, ColorEntity, Placement, SubTask, Tag, Task, TaskList};
use talio_core::types::DbId;
use talio_events::push::{OriginTag, PushPayload};

use crate::dispatcher::{DispatchContext, DispatchOutcome, DispatchStats, LiveUpdateDispatcher};
use crate::error::{ClientError, ClientResult, GatewayError};
use crate::gateway::{RemoteGateway, WatchTarget};
use crate::push::{PushHandle, ReconnectConfig};
use crate::registry::ViewRegistry;
use crate::storage::LocalStore;
use crate::ui_loop::UiEvent;
use crate::view::{Component, NodeRef, TaskDetailView, ViewOp};
use crate::watch::{DeletionWatch, WatchHandle};

/// Something the user should be told about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Error(String),
    TaskDeleted(DbId),
    BoardDeleted(DbId),
    LiveSyncUnavailable,
    AccessChanged { board_id: DbId, write_access: bool },
}

/// Field edits for [`Session::edit_task`]. `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct TaskEdit {
    pub title: Option<String>,
    pub description: Option<String>,
    pub background_color: Option<String>,
    pub font_color: Option<String>,
}

/// Board colour scheme for [`Session::update_board_colors`].
#[derive(Debug, Clone)]
pub struct BoardColors {
    pub board_bg_color: String,
    pub board_font_color: String,
    pub task_lists_bg_color: String,
    pub task_lists_font_color: String,
    pub task_default_color: ColorEntity,
}

impl BoardColors {
    pub fn of(board: &Board) -> Self {
        Self {
            board_bg_color: board.board_bg_color.clone(),
            board_font_color: board.board_font_color.clone(),
            task_lists_bg_color: board.task_lists_bg_color.clone(),
            task_lists_font_color: board.task_lists_font_color.clone(),
            task_default_color: board.task_default_color.clone(),
        }
    }
}

struct OpenDetail {
    view: TaskDetailView,
    watch: WatchHandle,
}

pub struct Session {
    gateway: Arc<dyn RemoteGateway>,
    /// Key of this server in the recent-boards store.
    server: String,
    registry: ViewRegistry,
    store: LocalStore,
    push: Option<PushHandle>,
    origin: OriginTag,
    ui_tx: mpsc::UnboundedSender<UiEvent>,
    tabs: Vec<DbId>,
    selected: Option<DbId>,
    /// Set while in admin mode.
    admin_password: Option<String>,
    detail: Option<OpenDetail>,
    board_watches: HashMap<DbId, WatchHandle>,
    watch_backoff: ReconnectConfig,
    notices: Vec<Notice>,
    dispatcher: LiveUpdateDispatcher,
}

impl Session {
    pub fn new(
        gateway: Arc<dyn RemoteGateway>,
        server: impl Into<String>,
        store: LocalStore,
        ui_tx: mpsc::UnboundedSender<UiEvent>,
    ) -> Self {
        Self {
            gateway,
            server: server.into(),
            registry: ViewRegistry::new(),
            store,
            push: None,
            origin: OriginTag::generate(),
            ui_tx,
            tabs: Vec::new(),
            selected: None,
            admin_password: None,
            detail: None,
            board_watches: HashMap::new(),
            watch_backoff: ReconnectConfig::default(),
            notices: Vec::new(),
            dispatcher: LiveUpdateDispatcher::new(),
        }
    }

    /// Publish through `push`; the session adopts its origin tag.
    pub fn with_push(mut self, push: PushHandle) -> Self {
        self.origin = push.origin();
        self.push = Some(push);
        self
    }

    /// Backoff used by deletion watches after transport errors.
    pub fn with_watch_backoff(mut self, backoff: ReconnectConfig) -> Self {
        self.watch_backoff = backoff;
        self
    }

    // ---- accessors ----

    pub fn registry(&self) -> &ViewRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ViewRegistry {
        &mut self.registry
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    pub fn origin(&self) -> OriginTag {
        self.origin
    }

    pub fn tabs(&self) -> &[DbId] {
        &self.tabs
    }

    pub fn selected_board(&self) -> Option<DbId> {
        self.selected
    }

    pub fn select_board(&mut self, id: DbId) -> ClientResult<()> {
        if !self.tabs.contains(&id) {
            return Err(ClientError::BoardNotOpen(id));
        }
        self.selected = Some(id);
        Ok(())
    }

    pub fn is_admin(&self) -> bool {
        self.admin_password.is_some()
    }

    pub fn write_access(&self, board_id: DbId) -> bool {
        self.registry
            .board_view(board_id)
            .is_some_and(|view| view.write_access)
    }

    pub fn detail(&self) -> Option<&TaskDetailView> {
        self.detail.as_ref().map(|open| &open.view)
    }

    pub fn detail_watch(&self) -> Option<&WatchHandle> {
        self.detail.as_ref().map(|open| &open.watch)
    }

    pub fn board_watch(&self, board_id: DbId) -> Option<&WatchHandle> {
        self.board_watches.get(&board_id)
    }

    pub fn dispatch_stats(&self) -> DispatchStats {
        self.dispatcher.stats()
    }

    pub fn recent_boards(&self) -> &[DbId] {
        self.store.boards_for(&self.server)
    }

    /// Drain pending notices, oldest first.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn notify(&mut self, notice: Notice) {
        tracing::info!(?notice, "Notice");
        self.notices.push(notice);
    }

    // ---- events ----

    /// Apply one UI-loop event. Returns `false` on shutdown.
    pub async fn handle_event(&mut self, event: UiEvent) -> bool {
        match event {
            UiEvent::Push(envelope) => {
                let outcome = {
                    let (dispatcher, mut cx) = self.dispatch_parts();
                    dispatcher.on_push(&envelope, &mut cx)
                };
                self.after_dispatch(outcome);
            }
            UiEvent::PushRaw(text) => {
                self.dispatch(&text);
            }
            UiEvent::PushDisconnected => self.notify(Notice::LiveSyncUnavailable),
            UiEvent::Deleted(target) => self.handle_deleted(target),
            UiEvent::Action(action) => {
                if let Err(e) = action.execute(self).await {
                    tracing::warn!(error = %e, "Action failed");
                    self.notify(Notice::Error(e.to_string()));
                }
            }
            UiEvent::Shutdown => return false,
        }
        true
    }

    /// Run one raw push frame through the dispatcher.
    pub fn dispatch(&mut self, text: &str) -> DispatchOutcome {
        let outcome = {
            let (dispatcher, mut cx) = self.dispatch_parts();
            dispatcher.on_raw(text, &mut cx)
        };
        self.after_dispatch(outcome);
        outcome
    }

    fn dispatch_parts(&mut self) -> (&mut LiveUpdateDispatcher, DispatchContext<'_>) {
        let cx = DispatchContext {
            registry: &mut self.registry,
            detail: self.detail.as_mut().map(|open| &mut open.view),
            store: &mut self.store,
            origin: self.origin,
            admin: self.admin_password.is_some(),
        };
        (&mut self.dispatcher, cx)
    }

    fn after_dispatch(&mut self, outcome: DispatchOutcome) {
        if let DispatchOutcome::AccessChanged { board_id, write_access } = outcome {
            self.notify(Notice::AccessChanged { board_id, write_access });
        }
    }

    /// React to a deletion watch firing.
    pub fn handle_deleted(&mut self, target: WatchTarget) {
        match target {
            WatchTarget::Task(id) => {
                if self.detail().is_some_and(|d| d.task_id() == id) {
                    self.close_task_detail();
                    self.notify(Notice::TaskDeleted(id));
                }
            }
            WatchTarget::Board(id) => {
                if !self.tabs.contains(&id) {
                    return;
                }
                self.close_board(id);
                if let Err(e) = self.store.forget_board(&self.server, id) {
                    tracing::warn!(board_id = id, error = %e, "Failed to forget deleted board");
                }
                self.notify(Notice::BoardDeleted(id));
            }
        }
    }

    // ---- boards ----

    /// Create a board, optionally protected, and open it.
    pub async fn create_board(
        &mut self,
        title: &str,
        password: Option<&str>,
    ) -> ClientResult<DbId> {
        let mut board = Board::new(non_empty(title, "Board title")?);
        let hash = password.filter(|p| !p.is_empty()).map(hash_password);
        if let Some(hash) = &hash {
            board.password = hash.clone();
        }
        let saved = self.gateway.save_board(&board).await?;
        let id = saved.id;
        if let Some(hash) = &hash {
            self.store.remember_password(id, hash)?;
        }
        self.store.remember_board(&self.server, id)?;
        tracing::info!(board_id = id, join_code = %saved.join_code, "Board created");
        self.open_loaded(saved).await?;
        Ok(id)
    }

    /// Join a board by its share code and remember it for this server.
    pub async fn join_board(&mut self, code: &str) -> ClientResult<DbId> {
        let code = non_empty(code, "Join code")?;
        let board = self.gateway.get_board_by_join_code(&code).await?;
        let id = board.id;
        self.store.remember_board(&self.server, id)?;
        self.open_loaded(board).await?;
        Ok(id)
    }

    /// Open a board tab (or reselect it).
    pub async fn open_board(&mut self, id: DbId) -> ClientResult<()> {
        match self.gateway.get_board(id).await {
            Ok(board) => self.open_loaded(board).await,
            Err(GatewayError::NotFound) => {
                self.store.forget_board(&self.server, id)?;
                Err(GatewayError::NotFound.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn open_loaded(&mut self, board: Board) -> ClientResult<()> {
        let id = board.id;
        let write_access = self.resolve_write_access(&board).await?;

        if self.registry.board_view(id).is_some() {
            self.registry.set_write_access(id, board.is_protected(), write_access);
            self.apply_board(&board);
        } else {
            self.registry.open_board(&board, write_access);
        }
        if !self.tabs.contains(&id) {
            self.tabs.push(id);
        }
        self.selected = Some(id);

        if !self.board_watches.contains_key(&id) {
            let watch = self.spawn_watch(WatchTarget::Board(id));
            self.board_watches.insert(id, watch);
        }
        tracing::info!(board_id = id, write_access, "Board opened");
        Ok(())
    }

    /// Admin mode grants everything; otherwise an unprotected board is
    /// writable and a protected one only with a remembered password that
    /// still checks out.
    async fn resolve_write_access(&mut self, board: &Board) -> ClientResult<bool> {
        if self.is_admin() || !board.is_protected() {
            return Ok(true);
        }
        let Some(hash) = self.store.password_for(board.id).map(str::to_owned) else {
            return Ok(false);
        };
        match self.gateway.check_board_password(board.id, &hash).await? {
            Some(_) => Ok(true),
            None => {
                self.store.forget_password(board.id)?;
                Ok(false)
            }
        }
    }

    /// Close a board tab and everything hanging off it.
    pub fn close_board(&mut self, id: DbId) -> bool {
        if self.detail().is_some_and(|d| d.board_id() == id) {
            self.close_task_detail();
        }
        self.board_watches.remove(&id);
        self.tabs.retain(|tab| *tab != id);
        if self.selected == Some(id) {
            self.selected = self.tabs.last().copied();
        }
        self.registry.close_board(id)
    }

    /// Drop a board from this server's recent list.
    pub fn forget_recent_board(&mut self, id: DbId) -> ClientResult<()> {
        self.store.forget_board(&self.server, id)?;
        Ok(())
    }

    // ---- access ----

    /// Enter admin mode. A wrong password is `Ok(false)` and changes nothing.
    pub async fn enter_admin(&mut self, password: &str) -> ClientResult<bool> {
        if !self.gateway.check_admin_password(password).await? {
            tracing::info!("Admin password rejected");
            return Ok(false);
        }
        self.admin_password = Some(password.to_owned());
        for id in self.registry.board_ids() {
            let protected = self.registry.board_model(id).is_some_and(Board::is_protected);
            self.grant_write_access(id, protected, true);
        }
        tracing::info!("Entered admin mode");
        Ok(true)
    }

    /// Leave admin mode and re-evaluate access to every open board.
    pub async fn leave_admin(&mut self) -> ClientResult<()> {
        if self.admin_password.take().is_none() {
            return Ok(());
        }
        for id in self.registry.board_ids() {
            let Some(board) = self.registry.board_model(id).cloned() else {
                continue;
            };
            let write_access = self.resolve_write_access(&board).await?;
            self.grant_write_access(id, board.is_protected(), write_access);
        }
        tracing::info!("Left admin mode");
        Ok(())
    }

    /// Every board on the server.
    pub async fn admin_boards(&self) -> ClientResult<Vec<Board>> {
        if !self.is_admin() {
            return Err(ClientError::AdminRequired);
        }
        Ok(self.gateway.list_boards().await?)
    }

    /// Delete a board for everyone.
    pub async fn admin_delete_board(&mut self, id: DbId) -> ClientResult<()> {
        if !self.is_admin() {
            return Err(ClientError::AdminRequired);
        }
        self.gateway.delete_board(id).await?;
        self.close_board(id);
        self.store.forget_board(&self.server, id)?;
        tracing::info!(board_id = id, "Board deleted");
        Ok(())
    }

    /// Try a board password. A match is remembered and grants write access;
    /// a mismatch is `Ok(false)` and leaves access as it was.
    pub async fn unlock_board(&mut self, id: DbId, password: &str) -> ClientResult<bool> {
        let hash = hash_password(password);
        let Some(board) = self.gateway.check_board_password(id, &hash).await? else {
            tracing::info!(board_id = id, "Board password rejected");
            return Ok(false);
        };
        self.store.remember_password(id, &hash)?;
        self.grant_write_access(id, board.is_protected(), true);
        self.apply_board(&board);
        Ok(true)
    }

    pub async fn set_board_password(&mut self, id: DbId, password: &str) -> ClientResult<()> {
        let hash = hash_password(&non_empty(password, "Password")?);
        self.commit_board(id, |board| board.password = hash.clone()).await?;
        self.store.remember_password(id, &hash)?;
        Ok(())
    }

    /// Clear a board's password. Admins need no password; otherwise a
    /// mismatch is `Ok(false)`.
    pub async fn remove_board_password(&mut self, id: DbId, password: &str) -> ClientResult<bool> {
        let board = match &self.admin_password {
            Some(admin_password) => {
                self.gateway
                    .admin_remove_board_password(id, admin_password)
                    .await?
            }
            None => {
                let hash = hash_password(password);
                match self.gateway.remove_board_password(id, &hash).await? {
                    Some(board) => board,
                    None => return Ok(false),
                }
            }
        };
        self.store.forget_password(id)?;
        self.grant_write_access(id, board.is_protected(), true);
        self.apply_board(&board);
        self.publish(PushPayload::Board(board));
        Ok(true)
    }

    fn grant_write_access(&mut self, board_id: DbId, protected: bool, write_access: bool) {
        self.registry.set_write_access(board_id, protected, write_access);
        if let Some(open) = self.detail.as_mut().filter(|o| o.view.board_id() == board_id) {
            self.registry
                .render(|cx| open.view.set_editable(write_access, cx));
        }
    }

    // ---- task lists ----

    pub async fn add_task_list(&mut self, board_id: DbId, title: &str) -> ClientResult<DbId> {
        self.ensure_write(board_id)?;
        let list = TaskList::new(non_empty(title, "Task list title")?, board_id);
        let saved = self.gateway.save_task_list(&list).await?;
        self.refresh_board(board_id).await?;
        Ok(saved.id)
    }

    pub async fn rename_task_list(&mut self, list_id: DbId, title: &str) -> ClientResult<()> {
        let title = non_empty(title, "Task list title")?;
        let (board_id, mut list) = self.list_copy(list_id)?;
        self.ensure_write(board_id)?;
        list.title = title;
        let saved = self.gateway.save_task_list(&list).await?;
        self.registry.reconcile_task_list(&saved);
        self.refresh_detail();
        self.publish(PushPayload::TaskList(saved));
        Ok(())
    }

    pub async fn delete_task_list(&mut self, list_id: DbId) -> ClientResult<()> {
        let (board_id, list) = self.list_copy(list_id)?;
        self.ensure_write(board_id)?;
        self.gateway.delete_task_list(list_id).await?;
        if self
            .detail()
            .is_some_and(|d| list.contains_task(d.task_id()))
        {
            self.close_task_detail();
        }
        self.refresh_board(board_id).await
    }

    // ---- tasks ----

    /// Append a task to a list in the board's default colours.
    pub async fn add_task(&mut self, list_id: DbId, title: &str) -> ClientResult<DbId> {
        let title = non_empty(title, "Task title")?;
        let (board_id, _) = self.list_copy(list_id)?;
        self.ensure_write(board_id)?;
        let mut task = Task::new(title, list_id);
        if let Some(board) = self.registry.board_model(board_id) {
            task.background_color = board.task_default_color.background_color.clone();
            task.font_color = board.task_default_color.font_color.clone();
        }
        let saved = self.gateway.save_task(&task).await?;
        let id = saved.id;
        self.apply_task(board_id, saved.clone())?;
        self.publish(PushPayload::Task(saved));
        Ok(id)
    }

    pub async fn delete_task(&mut self, task_id: DbId) -> ClientResult<()> {
        let (board_id, task) = self.task_copy(task_id)?;
        self.ensure_write(board_id)?;
        self.gateway.delete_task(task_id).await?;

        let mut board = self.board_copy(board_id)?;
        board.remove_task(task_id);
        self.apply_board(&board);
        if self.detail().is_some_and(|d| d.task_id() == task_id) {
            self.close_task_detail();
        }
        if let Some(list) = board.task_list(task.task_list_id) {
            self.publish(PushPayload::TaskList(list.clone()));
        }
        Ok(())
    }

    /// Move a task into `target_list`, next to `anchor` when given or at the
    /// end otherwise.
    pub async fn move_task(
        &mut self,
        task_id: DbId,
        target_list: DbId,
        anchor: Option<(DbId, Placement)>,
    ) -> ClientResult<()> {
        let (board_id, _) = self.task_copy(task_id)?;
        self.try_commit_board(board_id, |board| {
            if board.task_list(target_list).is_none() {
                return Err(ClientError::TaskListNotFound(target_list));
            }
            let mut task = board
                .remove_task(task_id)
                .ok_or(ClientError::TaskNotFound(task_id))?;
            task.task_list_id = target_list;
            let task = match anchor {
                Some((anchor, placement)) if anchor != task_id => {
                    match insert_or_return(board, task, anchor, placement) {
                        Ok(()) => return Ok(()),
                        Err(task) => task,
                    }
                }
                _ => task,
            };
            if board.insert_or_replace_task(task) {
                Ok(())
            } else {
                Err(ClientError::TaskListNotFound(target_list))
            }
        })
        .await?;
        Ok(())
    }

    /// Edit a task's own fields.
    pub async fn edit_task(&mut self, task_id: DbId, edit: TaskEdit) -> ClientResult<()> {
        let (board_id, mut task) = self.task_copy(task_id)?;
        self.ensure_write(board_id)?;
        if let Some(title) = edit.title {
            task.title = non_empty(&title, "Task title")?;
        }
        if let Some(description) = edit.description {
            task.description = description;
        }
        if let Some(color) = edit.background_color {
            task.background_color = color;
        }
        if let Some(color) = edit.font_color {
            task.font_color = color;
        }
        let saved = self.gateway.save_task(&task).await?;
        self.apply_task(board_id, saved.clone())?;
        self.publish(PushPayload::Task(saved));
        Ok(())
    }

    // ---- subtasks ----

    pub async fn add_subtask(&mut self, task_id: DbId, description: &str) -> ClientResult<DbId> {
        let (board_id, _) = self.task_copy(task_id)?;
        self.ensure_write(board_id)?;
        let subtask = SubTask::new(non_empty(description, "Subtask description")?, task_id);
        let saved = self.gateway.save_subtask(&subtask).await?;
        let id = saved.id;
        self.apply_subtask(board_id, saved)?;
        Ok(id)
    }

    pub async fn toggle_subtask(&mut self, task_id: DbId, subtask_id: DbId) -> ClientResult<bool> {
        let (board_id, task) = self.task_copy(task_id)?;
        self.ensure_write(board_id)?;
        let mut subtask = task
            .subtask(subtask_id)
            .cloned()
            .ok_or_else(|| missing_subtask(subtask_id))?;
        subtask.checked = !subtask.checked;
        let saved = self.gateway.save_subtask(&subtask).await?;
        let checked = saved.checked;
        self.apply_subtask(board_id, saved)?;
        Ok(checked)
    }

    pub async fn edit_subtask(
        &mut self,
        task_id: DbId,
        subtask_id: DbId,
        description: &str,
    ) -> ClientResult<()> {
        let (board_id, task) = self.task_copy(task_id)?;
        self.ensure_write(board_id)?;
        let mut subtask = task
            .subtask(subtask_id)
            .cloned()
            .ok_or_else(|| missing_subtask(subtask_id))?;
        subtask.description = non_empty(description, "Subtask description")?;
        let saved = self.gateway.save_subtask(&subtask).await?;
        self.apply_subtask(board_id, saved)
    }

    /// Reorder a task's checklist: put `subtask_id` before or after `anchor`.
    pub async fn move_subtask(
        &mut self,
        task_id: DbId,
        subtask_id: DbId,
        anchor: DbId,
        placement: Placement,
    ) -> ClientResult<()> {
        let (board_id, mut task) = self.task_copy(task_id)?;
        self.ensure_write(board_id)?;
        if anchor == subtask_id {
            return Ok(());
        }
        let subtask = task.remove_subtask(subtask_id).ok_or_else(|| missing_subtask(subtask_id))?;
        if !task.insert_subtask_relative(subtask, anchor, placement) {
            return Err(missing_subtask(anchor));
        }
        let saved = self.gateway.save_task(&task).await?;
        self.apply_task(board_id, saved.clone())?;
        self.publish(PushPayload::Task(saved));
        Ok(())
    }

    pub async fn delete_subtask(&mut self, task_id: DbId, subtask_id: DbId) -> ClientResult<()> {
        let (board_id, mut task) = self.task_copy(task_id)?;
        self.ensure_write(board_id)?;
        self.gateway.delete_subtask(subtask_id).await?;
        task.remove_subtask(subtask_id);
        self.apply_task(board_id, task.clone())?;
        self.publish(PushPayload::Task(task));
        Ok(())
    }

    fn apply_subtask(&mut self, board_id: DbId, subtask: SubTask) -> ClientResult<()> {
        let mut board = self.board_copy(board_id)?;
        let task = board
            .find_task_mut(subtask.task_id)
            .ok_or(ClientError::TaskNotFound(subtask.task_id))?;
        task.upsert_subtask(subtask.clone());
        self.apply_board(&board);
        self.publish(PushPayload::Subtask(subtask));
        Ok(())
    }

    // ---- tags ----

    /// Add a tag to a task, or edit a tag the task already carries.
    ///
    /// Editing a saved tag changes it everywhere on the board.
    pub async fn edit_tag_on_task(&mut self, task_id: DbId, mut tag: Tag) -> ClientResult<Tag> {
        let (board_id, mut task) = self.task_copy(task_id)?;
        self.ensure_write(board_id)?;
        tag.description = non_empty(&tag.description, "Tag description")?;
        tag.board_id = board_id;

        if tag.id > 0 && task.tags.iter().any(|t| t.id == tag.id) {
            let saved = self.gateway.save_tag(&tag).await?;
            let board = self.gateway.get_board(board_id).await?;
            self.apply_board(&board);
            self.publish(PushPayload::Tag(saved.clone()));
            return Ok(saved);
        }

        task.upsert_tag(tag.clone());
        let saved = self.gateway.save_task(&task).await?;
        let added = saved
            .tags
            .iter()
            .rev()
            .find(|t| t.same_label(&tag))
            .cloned()
            .unwrap_or(tag);
        self.apply_task(board_id, saved.clone())?;
        self.publish(PushPayload::Task(saved));
        Ok(added)
    }

    pub async fn remove_tag_from_task(&mut self, task_id: DbId, tag_id: DbId) -> ClientResult<()> {
        let (board_id, mut task) = self.task_copy(task_id)?;
        self.ensure_write(board_id)?;
        self.gateway.remove_tag(task_id, tag_id).await?;
        task.remove_tag(tag_id);
        self.apply_task(board_id, task.clone())?;
        self.publish(PushPayload::Task(task));
        Ok(())
    }

    /// Relabel every copy of `old` on its board.
    pub async fn rename_tag_on_board(&mut self, old: &Tag, mut new: Tag) -> ClientResult<()> {
        self.ensure_write(old.board_id)?;
        new.description = non_empty(&new.description, "Tag description")?;
        new.board_id = old.board_id;
        let board = self.gateway.rename_tag(old, &new).await?;
        self.apply_board(&board);
        self.publish(PushPayload::Board(board));
        Ok(())
    }

    /// Remove every copy of `tag` from its board.
    pub async fn purge_tag_from_board(&mut self, tag: &Tag) -> ClientResult<()> {
        self.ensure_write(tag.board_id)?;
        let board = self.gateway.purge_tag(tag).await?;
        self.apply_board(&board);
        self.publish(PushPayload::Board(board));
        Ok(())
    }

    // ---- colours ----

    pub async fn update_board_colors(
        &mut self,
        board_id: DbId,
        colors: BoardColors,
    ) -> ClientResult<()> {
        self.commit_board(board_id, move |board| {
            board.board_bg_color = colors.board_bg_color;
            board.board_font_color = colors.board_font_color;
            board.task_lists_bg_color = colors.task_lists_bg_color;
            board.task_lists_font_color = colors.task_lists_font_color;
            board.task_default_color = colors.task_default_color;
        })
        .await?;
        Ok(())
    }

    pub async fn add_color_preset(
        &mut self,
        board_id: DbId,
        preset: ColorEntity,
    ) -> ClientResult<DbId> {
        let saved = self
            .commit_board(board_id, |board| board.upsert_color_preset(preset))
            .await?;
        Ok(saved
            .task_color_presets
            .last()
            .map(|p| p.id)
            .unwrap_or_default())
    }

    pub async fn remove_color_preset(
        &mut self,
        board_id: DbId,
        preset_id: DbId,
    ) -> ClientResult<()> {
        self.commit_board(board_id, |board| {
            board.remove_color_preset(preset_id);
        })
        .await?;
        Ok(())
    }

    // ---- task detail ----

    /// Open the popup for a task and start watching it for deletion.
    pub fn open_task_detail(&mut self, task_id: DbId) -> ClientResult<()> {
        let (board_id, task) = self.task_copy(task_id)?;
        self.close_task_detail();

        let editable = self.is_admin() || self.write_access(board_id);
        let mut view = TaskDetailView::new(task_id, board_id, editable);
        self.registry.render(|cx| view.create_overview(&task, cx));
        let watch = self.spawn_watch(WatchTarget::Task(task_id));
        self.detail = Some(OpenDetail { view, watch });
        Ok(())
    }

    /// Close the popup; its watch is cancelled.
    pub fn close_task_detail(&mut self) {
        if let Some(open) = self.detail.take() {
            open.watch.cancel();
            self.registry
                .render(|cx| cx.record(ViewOp::Removed(NodeRef::detail(open.view.task_id()))));
        }
    }

    // ---- rendering ----

    /// Plain-text rendering of every open tab.
    pub fn render_summary(&self) -> String {
        let mut out = String::new();
        if self.is_admin() {
            out.push_str("[admin]\n");
        }
        for id in &self.tabs {
            let Some(board) = self.registry.board_view(*id) else {
                continue;
            };
            let marker = if self.selected == Some(*id) { '*' } else { ' ' };
            let _ = writeln!(
                out,
                "{marker} #{id} {} [{}] {:?}{}",
                board.title,
                board.join_code,
                board.lock_state,
                if board.write_access { "" } else { " (read-only)" },
            );
            if board.placeholder_shown() {
                out.push_str("    (no task lists)\n");
            }
            for list_id in board.list_ids() {
                let Some(list) = self.registry.task_list_view(*list_id) else {
                    continue;
                };
                let _ = writeln!(out, "    #{list_id} {}", list.title);
                if list.placeholder_shown() {
                    out.push_str("        (no tasks)\n");
                }
                for card_id in list.card_ids() {
                    let Some(card) = self.registry.task_card(*card_id) else {
                        continue;
                    };
                    let (done, total) = card.progress;
                    let _ = write!(out, "        #{card_id} {}", card.title);
                    if total > 0 {
                        let _ = write!(out, " [{done}/{total}]");
                    }
                    let labels = card.tags.labels();
                    if !labels.is_empty() {
                        let _ = write!(out, " {{{}}}", labels.join(", "));
                    }
                    out.push('\n');
                }
            }
        }
        if let Some(detail) = self.detail() {
            let _ = writeln!(
                out,
                "> task #{} {}{}",
                detail.task_id(),
                detail.title,
                if detail.editable { "" } else { " (read-only)" },
            );
            if !detail.description.is_empty() {
                let _ = writeln!(out, ">   {}", detail.description);
            }
            for row in detail.subtasks.rows() {
                let _ = writeln!(
                    out,
                    ">   [{}] #{} {}",
                    if row.checked { 'x' } else { ' ' },
                    row.id(),
                    row.description,
                );
            }
        }
        out
    }

    // ---- helpers ----

    fn ensure_write(&self, board_id: DbId) -> ClientResult<()> {
        if self.registry.board_view(board_id).is_none() {
            return Err(ClientError::BoardNotOpen(board_id));
        }
        if self.is_admin() || self.write_access(board_id) {
            Ok(())
        } else {
            Err(ClientError::WriteAccessDenied(board_id))
        }
    }

    fn board_copy(&self, board_id: DbId) -> ClientResult<Board> {
        self.registry
            .board_model(board_id)
            .cloned()
            .ok_or(ClientError::BoardNotOpen(board_id))
    }

    fn list_copy(&self, list_id: DbId) -> ClientResult<(DbId, TaskList)> {
        let board_id = self
            .registry
            .board_of_task_list(list_id)
            .ok_or(ClientError::TaskListNotFound(list_id))?;
        let list = self
            .registry
            .board_model(board_id)
            .and_then(|board| board.task_list(list_id))
            .cloned()
            .ok_or(ClientError::TaskListNotFound(list_id))?;
        Ok((board_id, list))
    }

    fn task_copy(&self, task_id: DbId) -> ClientResult<(DbId, Task)> {
        let board_id = self
            .registry
            .board_of_task(task_id)
            .ok_or(ClientError::TaskNotFound(task_id))?;
        let task = self
            .registry
            .task_model(task_id)
            .cloned()
            .ok_or(ClientError::TaskNotFound(task_id))?;
        Ok((board_id, task))
    }

    /// Fetch, edit and save a whole board, then apply and publish the
    /// server's copy.
    async fn commit_board(
        &mut self,
        board_id: DbId,
        mutate: impl FnOnce(&mut Board),
    ) -> ClientResult<Board> {
        self.try_commit_board(board_id, |board| {
            mutate(board);
            Ok(())
        })
        .await
    }

    /// Like `commit_board`, but nothing is saved when `mutate` fails.
    async fn try_commit_board(
        &mut self,
        board_id: DbId,
        mutate: impl FnOnce(&mut Board) -> ClientResult<()>,
    ) -> ClientResult<Board> {
        self.ensure_write(board_id)?;
        let mut board = self.gateway.get_board(board_id).await?;
        mutate(&mut board)?;
        let saved = self.gateway.save_board(&board).await?;
        self.apply_board(&saved);
        self.publish(PushPayload::Board(saved.clone()));
        Ok(saved)
    }

    /// Re-read a board from the server, apply and publish it.
    async fn refresh_board(&mut self, board_id: DbId) -> ClientResult<()> {
        let board = self.gateway.get_board(board_id).await?;
        self.apply_board(&board);
        self.publish(PushPayload::Board(board));
        Ok(())
    }

    fn apply_task(&mut self, board_id: DbId, task: Task) -> ClientResult<()> {
        let mut board = self.board_copy(board_id)?;
        if !board.insert_or_replace_task(task) {
            return Err(ClientError::BoardNotOpen(board_id));
        }
        self.apply_board(&board);
        Ok(())
    }

    fn apply_board(&mut self, board: &Board) {
        self.registry.reconcile_board(board);
        self.refresh_detail();
    }

    fn refresh_detail(&mut self) {
        let Some(open) = self.detail.as_mut() else {
            return;
        };
        let Some(task) = self.registry.task_model(open.view.task_id()).cloned() else {
            return;
        };
        if open.view.is_stale(&task) {
            self.registry.render(|cx| open.view.reconcile(&task, cx));
        }
    }

    fn publish(&self, payload: PushPayload) {
        let Some(push) = &self.push else {
            return;
        };
        if let Err(e) = push.publish(&payload) {
            tracing::debug!(topic = %payload.topic(), error = %e, "Push not sent");
        }
    }

    fn spawn_watch(&self, target: WatchTarget) -> WatchHandle {
        let ui_tx = self.ui_tx.clone();
        DeletionWatch::spawn_with(
            Arc::clone(&self.gateway),
            target,
            self.watch_backoff.clone(),
            move |target| {
                let _ = ui_tx.send(UiEvent::Deleted(target));
            },
        )
    }
}

fn missing_subtask(id: DbId) -> ClientError {
    ClientError::Validation(format!("Subtask {id} not found"))
}

/// Place `task` next to `anchor`, handing the task back when the anchor is
/// not on the board.
fn insert_or_return(
    board: &mut Board,
    task: Task,
    anchor: DbId,
    placement: Placement,
) -> Result<(), Task> {
    if board.find_task(anchor).is_none() {
        return Err(task);
    }
    board.insert_task_relative(task, anchor, placement);
    Ok(())
}

fn non_empty(value: &str, what: &str) -> ClientResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ClientError::Validation(format!("{what} must not be empty")));
    }
    Ok(value.to_owned())
}
