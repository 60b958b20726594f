use talio_core::model::Task;
use talio_core::types::DbId;

use super::{Component, InteractionState, NodeRef, RenderCx, TagBar, ViewOp};

/// The card shown for a task inside its list.
///
/// Shows the title, a description marker, checklist progress and the tag
/// row. `list_id` is the list view currently holding the card; it changes
/// when the card is reattached.
#[derive(Debug, Clone)]
pub struct TaskCard {
    id: DbId,
    pub(crate) list_id: DbId,
    model: Option<Task>,
    pub title: String,
    pub has_description: bool,
    /// `(checked, total)` subtasks.
    pub progress: (usize, usize),
    pub style: String,
    pub title_style: String,
    pub tags: TagBar,
    pub interaction: InteractionState,
}

impl TaskCard {
    pub fn new(id: DbId, list_id: DbId) -> Self {
        Self {
            id,
            list_id,
            model: None,
            title: String::new(),
            has_description: false,
            progress: (0, 0),
            style: String::new(),
            title_style: String::new(),
            tags: TagBar::new(NodeRef::card(id)),
            interaction: InteractionState::default(),
        }
    }

    pub fn id(&self) -> DbId {
        self.id
    }

    pub fn list_id(&self) -> DbId {
        self.list_id
    }
}

impl Component for TaskCard {
    type Model = Task;

    fn node(&self) -> NodeRef {
        NodeRef::card(self.id)
    }

    fn create_overview(&mut self, model: &Task, cx: &mut RenderCx<'_>) {
        cx.record(ViewOp::Created(self.node()));
        self.title = model.title.clone();
        self.has_description = model.has_description();
        self.progress = (model.checked_count(), model.sub_tasks.len());
        self.style = model.style();
        self.title_style = model.title_style();
        self.tags.create_overview(&model.tags, cx);
        self.model = Some(model.clone());
    }

    fn update_overview(&mut self, model: &Task, cx: &mut RenderCx<'_>) {
        let node = self.node();
        cx.patch(&mut self.title, model.title.clone(), node, "title");
        cx.patch(&mut self.has_description, model.has_description(), node, "has_description");
        cx.patch(
            &mut self.progress,
            (model.checked_count(), model.sub_tasks.len()),
            node,
            "progress",
        );
        cx.restyle(&mut self.style, model.style(), node);
        cx.patch(&mut self.title_style, model.title_style(), node, "title_style");
        self.tags.update_overview(&model.tags, cx);
        self.model = Some(model.clone());
    }

    fn associated(&self) -> Option<&Task> {
        self.model.as_ref()
    }
}
