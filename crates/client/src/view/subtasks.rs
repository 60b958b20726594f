use talio_core::model::SubTask;
use talio_core::types::DbId;

use super::{sync_keyed, Component, NodeKind, NodeRef, RenderCx, ViewOp};

/// One checklist row.
#[derive(Debug, Clone)]
pub struct SubtaskRow {
    id: DbId,
    owner: NodeRef,
    model: Option<SubTask>,
    pub description: String,
    pub checked: bool,
}

impl SubtaskRow {
    pub fn new(id: DbId, owner: NodeRef) -> Self {
        Self {
            id,
            owner,
            model: None,
            description: String::new(),
            checked: false,
        }
    }

    pub fn id(&self) -> DbId {
        self.id
    }
}

impl Component for SubtaskRow {
    type Model = SubTask;

    fn node(&self) -> NodeRef {
        NodeRef::child(NodeKind::SubtaskRow, self.id, self.owner)
    }

    fn create_overview(&mut self, model: &SubTask, cx: &mut RenderCx<'_>) {
        self.description = model.description.clone();
        self.checked = model.checked;
        self.model = Some(model.clone());
        cx.record(ViewOp::Created(self.node()));
    }

    fn update_overview(&mut self, model: &SubTask, cx: &mut RenderCx<'_>) {
        let node = self.node();
        cx.patch(&mut self.description, model.description.clone(), node, "description");
        cx.patch(&mut self.checked, model.checked, node, "checked");
        self.model = Some(model.clone());
    }

    fn associated(&self) -> Option<&SubTask> {
        self.model.as_ref()
    }
}

/// Checklist of a task, in user order.
#[derive(Debug, Clone)]
pub struct SubtaskBar {
    owner: NodeRef,
    model: Option<Vec<SubTask>>,
    rows: Vec<SubtaskRow>,
    placeholder_shown: bool,
}

impl SubtaskBar {
    pub fn new(owner: NodeRef) -> Self {
        Self {
            owner,
            model: None,
            rows: Vec::new(),
            placeholder_shown: false,
        }
    }

    pub fn rows(&self) -> &[SubtaskRow] {
        &self.rows
    }

    pub fn placeholder_shown(&self) -> bool {
        self.placeholder_shown
    }
}

impl Component for SubtaskBar {
    type Model = Vec<SubTask>;

    fn node(&self) -> NodeRef {
        self.owner
    }

    fn create_overview(&mut self, model: &Vec<SubTask>, cx: &mut RenderCx<'_>) {
        let owner = self.owner;
        self.rows = model
            .iter()
            .map(|subtask| {
                let mut row = SubtaskRow::new(subtask.id, owner);
                row.create_overview(subtask, cx);
                row
            })
            .collect();
        cx.placeholder(&mut self.placeholder_shown, model.is_empty(), owner);
        self.model = Some(model.clone());
    }

    fn update_overview(&mut self, model: &Vec<SubTask>, cx: &mut RenderCx<'_>) {
        let owner = self.owner;
        let old = self.model.take().unwrap_or_default();
        sync_keyed(&mut self.rows, &old, model, cx, |id| SubtaskRow::new(id, owner));
        cx.placeholder(&mut self.placeholder_shown, model.is_empty(), owner);
        self.model = Some(model.clone());
    }

    fn associated(&self) -> Option<&Vec<SubTask>> {
        self.model.as_ref()
    }
}
