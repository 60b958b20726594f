use talio_core::delta::{compute_delta, plan_positional, PositionalOp};
use talio_core::model::{Board, Tag, TaskList};
use talio_core::types::DbId;

use super::{Component, LockState, NodeRef, RenderCx, TaskListView, ViewOp};

/// An open board tab.
///
/// Task-list views live in the arena; the board keeps their ids in display
/// order. `write_access` is decided by the session and only mirrored into
/// the lock indicator here.
#[derive(Debug, Clone)]
pub struct BoardView {
    id: DbId,
    model: Option<Board>,
    pub title: String,
    pub join_code: String,
    pub style: String,
    pub write_access: bool,
    pub lock_state: LockState,
    /// Distinct tags used anywhere on the board.
    pub tag_overview: Vec<Tag>,
    list_ids: Vec<DbId>,
    placeholder_shown: bool,
}

impl BoardView {
    pub fn new(id: DbId, write_access: bool) -> Self {
        Self {
            id,
            model: None,
            title: String::new(),
            join_code: String::new(),
            style: String::new(),
            write_access,
            lock_state: LockState::Unprotected,
            tag_overview: Vec::new(),
            list_ids: Vec::new(),
            placeholder_shown: false,
        }
    }

    pub fn id(&self) -> DbId {
        self.id
    }

    /// Task-list ids in display order.
    pub fn list_ids(&self) -> &[DbId] {
        &self.list_ids
    }

    pub fn placeholder_shown(&self) -> bool {
        self.placeholder_shown
    }

    /// Grant or revoke write access and refresh the padlock. `protected`
    /// belongs to the board model about to be shown, not the current one.
    pub fn set_write_access(&mut self, protected: bool, write_access: bool, cx: &mut RenderCx<'_>) {
        let node = self.node();
        cx.patch(&mut self.write_access, write_access, node, "write_access");
        cx.patch(
            &mut self.lock_state,
            LockState::derive(protected, write_access),
            node,
            "lock_state",
        );
    }

    fn build_list(&self, list: &TaskList, cx: &mut RenderCx<'_>, style: &str) {
        let mut view = cx
            .arena
            .task_lists
            .remove(&list.id)
            .unwrap_or_else(|| TaskListView::new(list.id, self.id));
        view.create_overview(list, &mut cx.child(style.to_string()));
        cx.arena.task_lists.insert(list.id, view);
    }

    fn update_scalars(&mut self, model: &Board, cx: &mut RenderCx<'_>) {
        let node = self.node();
        cx.patch(&mut self.title, model.title.clone(), node, "title");
        cx.patch(&mut self.join_code, model.join_code.clone(), node, "join_code");
        cx.restyle(&mut self.style, model.style(), node);
        cx.patch(
            &mut self.lock_state,
            LockState::derive(model.is_protected(), self.write_access),
            node,
            "lock_state",
        );
        cx.patch(&mut self.tag_overview, model.distinct_tags(), node, "tags");
        cx.placeholder(&mut self.placeholder_shown, model.task_lists.is_empty(), node);
    }
}

impl Component for BoardView {
    type Model = Board;

    fn node(&self) -> NodeRef {
        NodeRef::board(self.id)
    }

    fn create_overview(&mut self, model: &Board, cx: &mut RenderCx<'_>) {
        cx.record(ViewOp::Created(self.node()));
        let list_style = model.task_list_style();
        self.list_ids = model.task_lists.iter().map(|l| l.id).collect();
        for list in &model.task_lists {
            self.build_list(list, cx, &list_style);
        }

        self.title = model.title.clone();
        self.join_code = model.join_code.clone();
        self.style = model.style();
        self.lock_state = LockState::derive(model.is_protected(), self.write_access);
        self.tag_overview = model.distinct_tags();
        let node = self.node();
        cx.placeholder(&mut self.placeholder_shown, model.task_lists.is_empty(), node);
        self.model = Some(model.clone());
    }

    fn update_overview(&mut self, model: &Board, cx: &mut RenderCx<'_>) {
        let old = self
            .model
            .as_ref()
            .map(|b| b.task_lists.clone())
            .unwrap_or_default();
        let delta = compute_delta(&old, &model.task_lists);
        let list_style = model.task_list_style();

        for gone in &delta.removed {
            self.list_ids.retain(|&id| id != gone.id);
            match cx.arena.task_lists.remove(&gone.id) {
                Some(mut view) => {
                    view.park_cards(cx);
                    cx.record(ViewOp::Removed(view.node()));
                }
                None => tracing::warn!(
                    board_id = self.id,
                    task_list_id = gone.id,
                    "Removed list had no view",
                ),
            }
        }

        for op in plan_positional(&old, &model.task_lists) {
            match op {
                PositionalOp::Keep { .. } | PositionalOp::Patch { .. } => {}
                PositionalOp::Move { from, to, id, .. } => {
                    let moved = self.list_ids.remove(from);
                    self.list_ids.insert(to, moved);
                    cx.record(ViewOp::Moved { node: NodeRef::task_list(id), to });
                }
                PositionalOp::Insert { index, id } => {
                    if let Some(list) = model.task_lists.iter().find(|l| l.id == id) {
                        self.list_ids.insert(index.min(self.list_ids.len()), id);
                        self.build_list(list, cx, &list_style);
                    }
                }
            }
        }

        for list in &delta.modified {
            let Some(mut view) = cx.arena.task_lists.remove(&list.id) else {
                tracing::warn!(
                    board_id = self.id,
                    task_list_id = list.id,
                    "No view registered for modified list, skipping",
                );
                continue;
            };
            view.update_overview(list, &mut cx.child(list_style.clone()));
            cx.arena.task_lists.insert(list.id, view);
        }

        self.update_scalars(model, cx);
        self.model = Some(model.clone());
    }

    fn associated(&self) -> Option<&Board> {
        self.model.as_ref()
    }
}
