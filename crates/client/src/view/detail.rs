use talio_core::model::Task;
use talio_core::types::DbId;

use super::{Component, InteractionState, NodeRef, RenderCx, SubtaskBar, TagBar, ViewOp};

/// The open task popup.
///
/// Read-only unless the board it belongs to grants write access.
#[derive(Debug, Clone)]
pub struct TaskDetailView {
    task_id: DbId,
    board_id: DbId,
    model: Option<Task>,
    pub title: String,
    pub description: String,
    pub style: String,
    pub tags: TagBar,
    pub subtasks: SubtaskBar,
    pub editable: bool,
    pub interaction: InteractionState,
}

impl TaskDetailView {
    pub fn new(task_id: DbId, board_id: DbId, editable: bool) -> Self {
        let node = NodeRef::detail(task_id);
        Self {
            task_id,
            board_id,
            model: None,
            title: String::new(),
            description: String::new(),
            style: String::new(),
            tags: TagBar::new(node),
            subtasks: SubtaskBar::new(node),
            editable,
            interaction: InteractionState {
                popup_open: true,
                ..Default::default()
            },
        }
    }

    pub fn task_id(&self) -> DbId {
        self.task_id
    }

    pub fn board_id(&self) -> DbId {
        self.board_id
    }

    pub fn set_editable(&mut self, editable: bool, cx: &mut RenderCx<'_>) {
        let node = self.node();
        cx.patch(&mut self.editable, editable, node, "editable");
    }

    /// Whether `task` would change what the popup shows.
    pub fn is_stale(&self, task: &Task) -> bool {
        self.task_id == task.id && self.model.as_ref() != Some(task)
    }
}

impl Component for TaskDetailView {
    type Model = Task;

    fn node(&self) -> NodeRef {
        NodeRef::detail(self.task_id)
    }

    fn create_overview(&mut self, model: &Task, cx: &mut RenderCx<'_>) {
        cx.record(ViewOp::Created(self.node()));
        self.title = model.title.clone();
        self.description = model.description.clone();
        self.style = model.style();
        self.tags.create_overview(&model.tags, cx);
        self.subtasks.create_overview(&model.sub_tasks, cx);
        self.model = Some(model.clone());
    }

    fn update_overview(&mut self, model: &Task, cx: &mut RenderCx<'_>) {
        let node = self.node();
        cx.patch(&mut self.title, model.title.clone(), node, "title");
        cx.patch(&mut self.description, model.description.clone(), node, "description");
        cx.restyle(&mut self.style, model.style(), node);
        self.tags.update_overview(&model.tags, cx);
        self.subtasks.update_overview(&model.sub_tasks, cx);
        self.model = Some(model.clone());
    }

    fn associated(&self) -> Option<&Task> {
        self.model.as_ref()
    }
}
