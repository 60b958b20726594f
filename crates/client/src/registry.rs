//! ID→view registry.
//!
//! The registry is the single owner of board, task-list and card views.
//! Everything else refers to views by id. Reconciliation runs through here
//! so cards detached during a pass can be picked up by another list before
//! the pass ends; whatever is still parked afterwards is unregistered.

use std::collections::HashMap;

use talio_core::model::{Board, Task, TaskList};
use talio_core::types::DbId;

use crate::view::{
    BoardView, Component, NodeRef, RenderCx, RenderJournal, TaskCard, TaskListView, ViewArena,
    ViewOp,
};

#[derive(Debug, Default)]
pub struct ViewRegistry {
    boards: HashMap<DbId, BoardView>,
    arena: ViewArena,
    journal: RenderJournal,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build and register a view for `board`.
    ///
    /// An already open board is reconciled instead and keeps its write
    /// access.
    pub fn open_board(&mut self, board: &Board, write_access: bool) {
        if self.boards.contains_key(&board.id) {
            self.reconcile_board(board);
            return;
        }
        self.boards
            .insert(board.id, BoardView::new(board.id, write_access));
        self.reconcile_board(board);
        tracing::debug!(board_id = board.id, write_access, "Board view opened");
    }

    /// Reconcile the open view of `board.id` against `board`.
    ///
    /// Returns `false` when the board is not open.
    pub fn reconcile_board(&mut self, board: &Board) -> bool {
        let Some(mut view) = self.boards.remove(&board.id) else {
            return false;
        };
        view.reconcile(board, &mut RenderCx::new(&mut self.journal, &mut self.arena));
        self.boards.insert(board.id, view);
        self.sweep_parked();
        true
    }

    /// Reconcile one list subtree from a fresh copy of the list.
    ///
    /// Tasks the list now holds are dropped from the board's other lists
    /// first, so a move never shows a card twice. Returns `false` when the
    /// list is not open.
    pub fn reconcile_task_list(&mut self, list: &TaskList) -> bool {
        let Some(board_id) = self.board_of_task_list(list.id) else {
            return false;
        };
        let Some(mut board) = self.board_model(board_id).cloned() else {
            return false;
        };
        for other in board.task_lists.iter_mut().filter(|l| l.id != list.id) {
            other.tasks.retain(|t| !list.contains_task(t.id));
        }
        board.upsert_task_list(list.clone());
        self.reconcile_board(&board)
    }

    /// Unregister a board together with its lists and cards.
    pub fn close_board(&mut self, id: DbId) -> bool {
        let Some(view) = self.boards.remove(&id) else {
            return false;
        };
        for list_id in view.list_ids() {
            if let Some(list) = self.arena.task_lists.remove(list_id) {
                for card_id in list.card_ids() {
                    self.arena.task_cards.remove(card_id);
                }
            }
        }
        self.journal.record(ViewOp::Removed(NodeRef::board(id)));
        tracing::debug!(board_id = id, "Board view closed");
        true
    }

    /// Grant or revoke write access on an open board.
    pub fn set_write_access(
        &mut self,
        board_id: DbId,
        protected: bool,
        write_access: bool,
    ) -> bool {
        let Some(view) = self.boards.get_mut(&board_id) else {
            return false;
        };
        let mut cx = RenderCx::new(&mut self.journal, &mut self.arena);
        view.set_write_access(protected, write_access, &mut cx);
        true
    }

    /// Run `f` with a render context over this registry's arena and
    /// journal, for views owned elsewhere (the task popup).
    pub fn render<R>(&mut self, f: impl FnOnce(&mut RenderCx<'_>) -> R) -> R {
        f(&mut RenderCx::new(&mut self.journal, &mut self.arena))
    }

    // ---- lookups ----

    pub fn board_view(&self, id: DbId) -> Option<&BoardView> {
        self.boards.get(&id)
    }

    /// The board model currently displayed.
    pub fn board_model(&self, id: DbId) -> Option<&Board> {
        self.boards.get(&id).and_then(|v| v.associated())
    }

    pub fn task_list_view(&self, id: DbId) -> Option<&TaskListView> {
        self.arena.task_lists.get(&id)
    }

    pub fn task_card(&self, id: DbId) -> Option<&TaskCard> {
        self.arena.task_cards.get(&id)
    }

    pub fn task_card_mut(&mut self, id: DbId) -> Option<&mut TaskCard> {
        self.arena.task_cards.get_mut(&id)
    }

    pub fn board_of_task_list(&self, list_id: DbId) -> Option<DbId> {
        self.arena.task_lists.get(&list_id).map(TaskListView::board_id)
    }

    pub fn board_of_task(&self, task_id: DbId) -> Option<DbId> {
        let card = self.arena.task_cards.get(&task_id)?;
        self.board_of_task_list(card.list_id())
    }

    /// The displayed copy of a task.
    pub fn task_model(&self, task_id: DbId) -> Option<&Task> {
        self.board_of_task(task_id)
            .and_then(|board_id| self.board_model(board_id))
            .and_then(|board| board.find_task(task_id))
    }

    /// Ids of every open board.
    pub fn board_ids(&self) -> Vec<DbId> {
        let mut ids: Vec<DbId> = self.boards.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn task_list_count(&self) -> usize {
        self.arena.task_lists.len()
    }

    pub fn task_card_count(&self) -> usize {
        self.arena.task_cards.len()
    }

    // ---- journal ----

    pub fn journal(&self) -> &RenderJournal {
        &self.journal
    }

    pub fn take_journal(&mut self) -> Vec<ViewOp> {
        self.journal.take()
    }

    /// Unregister cards that were detached and not adopted again.
    fn sweep_parked(&mut self) {
        for id in std::mem::take(&mut self.arena.parked) {
            if self.arena.task_cards.remove(&id).is_some() {
                self.journal.record(ViewOp::Removed(NodeRef::card(id)));
            }
        }
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    fn board() -> Board {
        let mut board = Board::new("Sprint");
        board.id = 1;
        let mut todo = TaskList::new("Todo", 1);
        todo.id = 10;
        let mut task = Task::new("Write", 10);
        task.id = 100;
        todo.tasks.push(task);
        let mut done = TaskList::new("Done", 1);
        done.id = 11;
        board.task_lists = vec![todo, done];
        board
    }

    #[test]
    fn open_registers_every_view() {
        let mut registry = ViewRegistry::new();
        registry.open_board(&board(), true);

        assert_eq!(registry.board_ids(), vec![1]);
        assert_eq!(registry.task_list_count(), 2);
        assert_eq!(registry.board_of_task_list(11), Some(1));
        assert_eq!(registry.board_of_task(100), Some(1));
        assert_eq!(registry.task_model(100).map(|t| t.title.as_str()), Some("Write"));
    }

    #[test]
    fn close_leaves_no_stale_entries() {
        let mut registry = ViewRegistry::new();
        registry.open_board(&board(), true);

        assert!(registry.close_board(1));
        assert!(registry.board_view(1).is_none());
        assert_eq!(registry.task_list_count(), 0);
        assert_eq!(registry.task_card_count(), 0);
        assert!(!registry.close_board(1));
    }

    #[test]
    fn reconcile_of_closed_board_is_refused() {
        let mut registry = ViewRegistry::new();
        assert!(!registry.reconcile_board(&board()));
        assert!(registry.journal().is_empty());
    }

    #[test]
    fn list_reconcile_strips_moved_tasks_from_other_lists() {
        let mut registry = ViewRegistry::new();
        let original = board();
        registry.open_board(&original, true);

        let mut done = original.task_lists[1].clone();
        let mut task = original.task_lists[0].tasks[0].clone();
        task.task_list_id = 11;
        done.tasks.push(task);
        assert!(registry.reconcile_task_list(&done));

        assert_eq!(registry.task_list_view(10).unwrap().card_ids(), &[] as &[DbId]);
        assert_eq!(registry.task_list_view(11).unwrap().card_ids(), &[100]);
        assert_eq!(registry.task_card_count(), 1);
    }

    #[test]
    fn removed_list_unregisters_its_cards() {
        let mut registry = ViewRegistry::new();
        let original = board();
        registry.open_board(&original, true);
        registry.take_journal();

        let mut edited = original.clone();
        edited.task_lists.remove(0);
        registry.reconcile_board(&edited);

        assert!(registry.task_list_view(10).is_none());
        assert!(registry.task_card(100).is_none());
        let ops = registry.take_journal();
        assert!(ops.contains(&ViewOp::Removed(NodeRef::task_list(10))));
        assert!(ops.contains(&ViewOp::Removed(NodeRef::card(100))));
    }
}
