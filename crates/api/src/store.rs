//! In-memory board store.
//!
//! Boards are kept as whole trees keyed by id. Every write clones the owning
//! board, applies the change and commits the result through
//! [`StoreInner::commit`], which assigns ids to new nested entities, fixes
//! back-references and reports which tasks disappeared so deletion watchers
//! can be woken up.

use std::collections::{BTreeMap, HashSet};

use talio_core::error::CoreError;
use talio_core::join_code::generate_join_code;
use talio_core::model::{Board, SubTask, Tag, Task, TaskList};
use talio_core::types::DbId;
use tokio::sync::RwLock;

/// Result of committing a board.
#[derive(Debug, Clone)]
pub struct SavedBoard {
    pub board: Board,
    /// Ids of task lists that were part of the previous version only.
    pub removed_lists: Vec<DbId>,
    /// Ids of tasks that were part of the previous version only.
    pub removed_tasks: Vec<DbId>,
}

/// Thread-safe board store shared through `AppState`.
#[derive(Default)]
pub struct BoardStore {
    inner: RwLock<StoreInner>,
}

#[derive(Default)]
struct StoreInner {
    boards: BTreeMap<DbId, Board>,
    last_id: DbId,
}

impl StoreInner {
    fn allocate(&mut self) -> DbId {
        self.last_id += 1;
        self.last_id
    }

    fn unique_join_code(&self) -> String {
        let mut rng = rand::rng();
        loop {
            let code = generate_join_code(&mut rng);
            if !self.boards.values().any(|b| b.join_code == code) {
                return code;
            }
        }
    }

    fn board_of_list(&self, list_id: DbId) -> Option<&Board> {
        self.boards.values().find(|b| b.task_list(list_id).is_some())
    }

    fn board_of_task(&self, task_id: DbId) -> Option<&Board> {
        self.boards.values().find(|b| b.find_task(task_id).is_some())
    }

    /// Give every unsaved entity in `board` an id and point back-references
    /// at their owners. New tags reuse the id of an identical label already
    /// on the board.
    fn assign_ids(&mut self, board: &mut Board) {
        if board.id <= 0 {
            board.id = self.allocate();
        }
        let mut known_tags: Vec<Tag> = board
            .distinct_tags()
            .into_iter()
            .filter(|t| t.id > 0)
            .collect();

        for list in board.task_lists.iter_mut() {
            if list.id <= 0 {
                list.id = self.allocate();
            }
            list.board_id = board.id;
            for task in list.tasks.iter_mut() {
                if task.id <= 0 {
                    task.id = self.allocate();
                }
                task.task_list_id = list.id;
                for subtask in task.sub_tasks.iter_mut() {
                    if subtask.id <= 0 {
                        subtask.id = self.allocate();
                    }
                    subtask.task_id = task.id;
                }
                for tag in task.tags.iter_mut() {
                    tag.board_id = board.id;
                    if tag.id > 0 {
                        continue;
                    }
                    match known_tags.iter().find(|k| k.same_label(tag)) {
                        Some(existing) => tag.id = existing.id,
                        None => {
                            tag.id = self.allocate();
                            known_tags.push(tag.clone());
                        }
                    }
                }
            }
        }
        for preset in board.task_color_presets.iter_mut() {
            if preset.id <= 0 {
                preset.id = self.allocate();
            }
        }
        if board.task_default_color.id <= 0 {
            board.task_default_color.id = self.allocate();
        }
    }

    /// Replace the stored copy of `board` (cascading to everything it owns).
    fn commit(&mut self, mut board: Board) -> SavedBoard {
        self.assign_ids(&mut board);
        let previous = self.boards.get(&board.id);

        // The join code is fixed once assigned.
        match previous {
            Some(prev) if !prev.join_code.is_empty() => board.join_code = prev.join_code.clone(),
            _ if board.join_code.is_empty() => board.join_code = self.unique_join_code(),
            _ => {}
        }

        let (removed_lists, removed_tasks) = match self.boards.get(&board.id) {
            Some(prev) => {
                let lists: HashSet<DbId> = board.task_lists.iter().map(|l| l.id).collect();
                let tasks: HashSet<DbId> = board
                    .task_lists
                    .iter()
                    .flat_map(|l| l.tasks.iter().map(|t| t.id))
                    .collect();
                (
                    prev.task_lists
                        .iter()
                        .map(|l| l.id)
                        .filter(|id| !lists.contains(id))
                        .collect(),
                    prev.task_lists
                        .iter()
                        .flat_map(|l| l.tasks.iter().map(|t| t.id))
                        .filter(|id| !tasks.contains(id))
                        .collect(),
                )
            }
            None => (Vec::new(), Vec::new()),
        };

        self.boards.insert(board.id, board.clone());
        SavedBoard {
            board,
            removed_lists,
            removed_tasks,
        }
    }

    fn board(&self, id: DbId) -> Result<&Board, CoreError> {
        self.boards.get(&id).ok_or(CoreError::not_found("Board", id))
    }
}

impl BoardStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- boards ----

    pub async fn list_boards(&self) -> Vec<Board> {
        self.inner.read().await.boards.values().cloned().collect()
    }

    pub async fn get_board(&self, id: DbId) -> Option<Board> {
        self.inner.read().await.boards.get(&id).cloned()
    }

    pub async fn board_by_join_code(&self, code: &str) -> Option<Board> {
        self.inner
            .read()
            .await
            .boards
            .values()
            .find(|b| b.join_code == code)
            .cloned()
    }

    pub async fn board_exists(&self, id: DbId) -> bool {
        self.inner.read().await.boards.contains_key(&id)
    }

    /// Create or replace a board together with everything it owns.
    pub async fn save_board(&self, board: Board) -> SavedBoard {
        self.inner.write().await.commit(board)
    }

    pub async fn delete_board(&self, id: DbId) -> Option<Board> {
        self.inner.write().await.boards.remove(&id)
    }

    /// Returns the board when `password_hash` matches its stored hash.
    pub async fn check_password(
        &self,
        id: DbId,
        password_hash: &str,
    ) -> Result<Option<Board>, CoreError> {
        let inner = self.inner.read().await;
        let board = inner.board(id)?;
        Ok((board.password == password_hash).then(|| board.clone()))
    }

    /// Clear the password when `password_hash` matches.
    pub async fn remove_password(
        &self,
        id: DbId,
        password_hash: &str,
    ) -> Result<Option<Board>, CoreError> {
        let mut inner = self.inner.write().await;
        let mut board = inner.board(id)?.clone();
        if board.password != password_hash {
            return Ok(None);
        }
        board.password.clear();
        Ok(Some(inner.commit(board).board))
    }

    /// Clear the password unconditionally.
    pub async fn remove_password_admin(&self, id: DbId) -> Result<Board, CoreError> {
        let mut inner = self.inner.write().await;
        let mut board = inner.board(id)?.clone();
        board.password.clear();
        Ok(inner.commit(board).board)
    }

    // ---- task lists ----

    pub async fn save_task_list(
        &self,
        mut list: TaskList) -> Result<(TaskList,
        SavedBoard,
    ), CoreError> {
        let mut inner = self.inner.write().await;
        let mut board = inner.board(list.board_id)?.clone();
        if list.id <= 0 {
            list.id = inner.allocate();
        }
        let id = list.id;
        board.upsert_task_list(list);
        let saved = inner.commit(board);
        let list = saved
            .board
            .task_list(id)
            .cloned()
            .ok_or(CoreError::Internal(format!("task list {id} lost on commit")))?;
        Ok((list, saved))
    }

    pub async fn delete_task_list(&self, id: DbId) -> Option<(TaskList, SavedBoard)> {
        let mut inner = self.inner.write().await;
        let mut board = inner.board_of_list(id)?.clone();
        let list = board.remove_task_list(id)?;
        Some((list, inner.commit(board)))
    }

    // ---- tasks ----

    pub async fn get_task(&self, id: DbId) -> Option<Task> {
        let inner = self.inner.read().await;
        inner.board_of_task(id).and_then(|b| b.find_task(id)).cloned()
    }

    pub async fn task_exists(&self, id: DbId) -> bool {
        self.inner.read().await.board_of_task(id).is_some()
    }

    /// Create or replace a task inside the list named by `task_list_id`.
    pub async fn save_task(&self, mut task: Task) -> Result<(Task, SavedBoard), CoreError> {
        let mut inner = self.inner.write().await;
        let mut board = inner
            .board_of_list(task.task_list_id)
            .cloned()
            .ok_or(CoreError::not_found("TaskList", task.task_list_id))?;
        if task.id <= 0 {
            task.id = inner.allocate();
        }
        let id = task.id;
        board.insert_or_replace_task(task);
        let saved = inner.commit(board);
        let task = saved
            .board
            .find_task(id)
            .cloned()
            .ok_or(CoreError::Internal(format!("task {id} lost on commit")))?;
        Ok((task, saved))
    }

    pub async fn delete_task(&self, id: DbId) -> Option<(Task, SavedBoard)> {
        let mut inner = self.inner.write().await;
        let mut board = inner.board_of_task(id)?.clone();
        let task = board.remove_task(id)?;
        Some((task, inner.commit(board)))
    }

    // ---- subtasks ----

    pub async fn save_subtask(
        &self,
        mut subtask: SubTask) -> Result<(SubTask,
        SavedBoard,
    ), CoreError> {
        let mut inner = self.inner.write().await;
        let mut board = inner
            .board_of_task(subtask.task_id)
            .cloned()
            .ok_or(CoreError::not_found("Task", subtask.task_id))?;
        if subtask.id <= 0 {
            subtask.id = inner.allocate();
        }
        let (id, task_id) = (subtask.id, subtask.task_id);
        if let Some(task) = board.find_task_mut(task_id) {
            task.upsert_subtask(subtask);
        }
        let saved = inner.commit(board);
        let subtask = saved
            .board
            .find_task(task_id)
            .and_then(|t| t.subtask(id))
            .cloned()
            .ok_or(CoreError::Internal(format!("subtask {id} lost on commit")))?;
        Ok((subtask, saved))
    }

    pub async fn delete_subtask(&self, id: DbId) -> Option<(SubTask, SavedBoard)> {
        let mut inner = self.inner.write().await;
        let mut board = inner
            .boards
            .values()
            .find(|b| {
                b.task_lists
                    .iter()
                    .flat_map(|l| l.tasks.iter())
                    .any(|t| t.subtask(id).is_some())
            })?
            .clone();
        let removed = board
            .task_lists
            .iter_mut()
            .flat_map(|l| l.tasks.iter_mut())
            .find_map(|t| t.remove_subtask(id))?;
        Some((removed, inner.commit(board)))
    }

    // ---- tags ----

    pub async fn board_tags(&self, board_id: DbId) -> Result<Vec<Tag>, CoreError> {
        Ok(self.inner.read().await.board(board_id)?.distinct_tags())
    }

    /// Save a tag definition and write it into every task copy.
    pub async fn save_tag(&self, mut tag: Tag) -> Result<(Tag, SavedBoard), CoreError> {
        let mut inner = self.inner.write().await;
        let mut board = inner.board(tag.board_id)?.clone();
        if tag.id <= 0 {
            tag.id = match board.distinct_tags().iter().find(|t| t.same_label(&tag)) {
                Some(existing) => existing.id,
                None => inner.allocate(),
            };
        }
        board.replace_tag_everywhere(&tag);
        Ok((tag, inner.commit(board)))
    }

    /// Relabel every copy that looks like `old` on `old`'s board.
    pub async fn rename_tag(&self, old: &Tag, new: &Tag) -> Result<(usize, SavedBoard), CoreError> {
        let mut inner = self.inner.write().await;
        let mut board = inner.board(old.board_id)?.clone();
        let mut renamed = 0;
        for task in board.task_lists.iter_mut().flat_map(|l| l.tasks.iter_mut()) {
            for copy in task.tags.iter_mut().filter(|t| t.same_label(old)) {
                copy.description = new.description.clone();
                copy.tag_color = new.tag_color.clone();
                copy.tag_font_color = new.tag_font_color.clone();
                renamed += 1;
            }
        }
        Ok((renamed, inner.commit(board)))
    }

    /// Remove one tag copy from one task.
    pub async fn remove_tag(&self, task_id: DbId, tag_id: DbId) -> Option<(Tag, SavedBoard)> {
        let mut inner = self.inner.write().await;
        let mut board = inner.board_of_task(task_id)?.clone();
        let tag = board.find_task_mut(task_id)?.remove_tag(tag_id)?;
        Some((tag, inner.commit(board)))
    }

    /// Remove every copy that looks like `tag` from its board.
    pub async fn purge_tag(&self, tag: &Tag) -> Result<(usize, SavedBoard), CoreError> {
        let mut inner = self.inner.write().await;
        let mut board = inner.board(tag.board_id)?.clone();
        let mut removed = 0;
        for task in board.task_lists.iter_mut().flat_map(|l| l.tasks.iter_mut()) {
            let before = task.tags.len();
            task.tags.retain(|t| !t.same_label(tag));
            removed += before - task.tags.len();
        }
        Ok((removed, inner.commit(board)))
    }
}
