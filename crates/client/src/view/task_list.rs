use talio_core::delta::{compute_delta, plan_positional, PositionalOp};
use talio_core::model::{Task, TaskList};
use talio_core::types::DbId;

use super::{Component, NodeRef, RenderCx, TaskCard, ViewOp};

/// A column of cards.
///
/// Cards live in the arena; the list keeps their ids in display order.
/// Its style comes from the owning board, passed down through
/// [`RenderCx::inherited_style`].
#[derive(Debug, Clone)]
pub struct TaskListView {
    id: DbId,
    board_id: DbId,
    model: Option<TaskList>,
    pub title: String,
    pub style: String,
    card_ids: Vec<DbId>,
    placeholder_shown: bool,
}

impl TaskListView {
    pub fn new(id: DbId, board_id: DbId) -> Self {
        Self {
            id,
            board_id,
            model: None,
            title: String::new(),
            style: String::new(),
            card_ids: Vec::new(),
            placeholder_shown: false,
        }
    }

    pub fn id(&self) -> DbId {
        self.id
    }

    pub fn board_id(&self) -> DbId {
        self.board_id
    }

    /// Card ids in display order.
    pub fn card_ids(&self) -> &[DbId] {
        &self.card_ids
    }

    pub fn placeholder_shown(&self) -> bool {
        self.placeholder_shown
    }

    /// Park every card of this list; used when the list itself goes away.
    pub(crate) fn park_cards(&mut self, cx: &mut RenderCx<'_>) {
        for id in self.card_ids.drain(..) {
            cx.arena.parked.insert(id);
        }
    }

    /// Put the card for `task` at `index`, reusing an existing card from
    /// anywhere in the arena.
    fn adopt_or_create_card(&mut self, task: &Task, index: usize, cx: &mut RenderCx<'_>) {
        let index = index.min(self.card_ids.len());
        match cx.arena.task_cards.remove(&task.id) {
            Some(mut card) => {
                let from = card.list_id;
                if from != self.id {
                    if let Some(previous) = cx.arena.task_lists.get_mut(&from) {
                        previous.card_ids.retain(|&id| id != task.id);
                        let empty = previous.card_ids.is_empty();
                        if previous.placeholder_shown != empty {
                            previous.placeholder_shown = empty;
                            cx.journal.record(ViewOp::Placeholder {
                                parent: NodeRef::task_list(from),
                                shown: empty,
                            });
                        }
                    }
                    card.list_id = self.id;
                    cx.record(ViewOp::Reattached {
                        node: card.node(),
                        from_list: from,
                        to_list: self.id,
                    });
                }
                cx.arena.parked.remove(&task.id);
                card.update_overview(task, cx);
                cx.arena.task_cards.insert(task.id, card);
            }
            None => {
                let mut card = TaskCard::new(task.id, self.id);
                card.create_overview(task, cx);
                cx.arena.task_cards.insert(task.id, card);
            }
        }
        self.card_ids.insert(index, task.id);
    }
}

impl Component for TaskListView {
    type Model = TaskList;

    fn node(&self) -> NodeRef {
        NodeRef::task_list(self.id)
    }

    fn create_overview(&mut self, model: &TaskList, cx: &mut RenderCx<'_>) {
        cx.record(ViewOp::Created(self.node()));
        self.title = model.title.clone();
        self.style = cx.inherited_style.clone();
        self.card_ids.clear();
        for (index, task) in model.tasks.iter().enumerate() {
            self.adopt_or_create_card(task, index, cx);
        }
        let node = self.node();
        cx.placeholder(&mut self.placeholder_shown, model.tasks.is_empty(), node);
        self.model = Some(model.clone());
    }

    fn update_overview(&mut self, model: &TaskList, cx: &mut RenderCx<'_>) {
        let node = self.node();
        let old = self.model.take().map(|l| l.tasks).unwrap_or_default();
        let delta = compute_delta(&old, &model.tasks);

        for gone in &delta.removed {
            let Some(pos) = self.card_ids.iter().position(|&id| id == gone.id) else {
                // Already adopted by another list in this pass.
                continue;
            };
            self.card_ids.remove(pos);
            cx.arena.parked.insert(gone.id);
        }

        for op in plan_positional(&old, &model.tasks) {
            match op {
                PositionalOp::Keep { .. } | PositionalOp::Patch { .. } => {}
                PositionalOp::Move { from, to, id, .. } => {
                    let moved = self.card_ids.remove(from);
                    self.card_ids.insert(to, moved);
                    cx.record(ViewOp::Moved { node: NodeRef::card(id), to });
                }
                PositionalOp::Insert { index, id } => {
                    if let Some(task) = model.tasks.iter().find(|t| t.id == id) {
                        self.adopt_or_create_card(task, index, cx);
                    }
                }
            }
        }

        for task in &delta.modified {
            let Some(mut card) = cx.arena.task_cards.remove(&task.id) else {
                tracing::warn!(
                    task_list_id = self.id,
                    task_id = task.id,
                    "No card registered for modified task, skipping",
                );
                continue;
            };
            card.update_overview(task, cx);
            cx.arena.task_cards.insert(task.id, card);
        }

        cx.patch(&mut self.title, model.title.clone(), node, "title");
        let style = cx.inherited_style.clone();
        cx.restyle(&mut self.style, style, node);
        cx.placeholder(&mut self.placeholder_shown, model.tasks.is_empty(), node);
        self.model = Some(model.clone());
    }

    fn associated(&self) -> Option<&TaskList> {
        self.model.as_ref()
    }
}
