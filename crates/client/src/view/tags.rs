use talio_core::model::Tag;
use talio_core::types::DbId;

use super::{sync_keyed, Component, NodeKind, NodeRef, RenderCx, ViewOp};

/// One tag label.
#[derive(Debug, Clone)]
pub struct TagChip {
    id: DbId,
    owner: NodeRef,
    model: Option<Tag>,
    pub label: String,
    pub style: String,
}

impl TagChip {
    pub fn new(id: DbId, owner: NodeRef) -> Self {
        Self {
            id,
            owner,
            model: None,
            label: String::new(),
            style: String::new(),
        }
    }

    pub fn id(&self) -> DbId {
        self.id
    }
}

impl Component for TagChip {
    type Model = Tag;

    fn node(&self) -> NodeRef {
        NodeRef::child(NodeKind::TagChip, self.id, self.owner)
    }

    fn create_overview(&mut self, model: &Tag, cx: &mut RenderCx<'_>) {
        self.label = model.description.clone();
        self.style = model.style();
        self.model = Some(model.clone());
        cx.record(ViewOp::Created(self.node()));
    }

    fn update_overview(&mut self, model: &Tag, cx: &mut RenderCx<'_>) {
        let node = self.node();
        cx.patch(&mut self.label, model.description.clone(), node, "label");
        cx.restyle(&mut self.style, model.style(), node);
        self.model = Some(model.clone());
    }

    fn associated(&self) -> Option<&Tag> {
        self.model.as_ref()
    }
}

/// The row of tag chips on a card or in the task popup.
///
/// Shows a "No tags" placeholder while empty.
#[derive(Debug, Clone)]
pub struct TagBar {
    owner: NodeRef,
    model: Option<Vec<Tag>>,
    chips: Vec<TagChip>,
    placeholder_shown: bool,
}

impl TagBar {
    pub fn new(owner: NodeRef) -> Self {
        Self {
            owner,
            model: None,
            chips: Vec::new(),
            placeholder_shown: false,
        }
    }

    pub fn chips(&self) -> &[TagChip] {
        &self.chips
    }

    pub fn labels(&self) -> Vec<&str> {
        self.chips.iter().map(|c| c.label.as_str()).collect()
    }

    pub fn placeholder_shown(&self) -> bool {
        self.placeholder_shown
    }
}

impl Component for TagBar {
    type Model = Vec<Tag>;

    fn node(&self) -> NodeRef {
        self.owner
    }

    fn create_overview(&mut self, model: &Vec<Tag>, cx: &mut RenderCx<'_>) {
        let owner = self.owner;
        self.chips = model
            .iter()
            .map(|tag| {
                let mut chip = TagChip::new(tag.id, owner);
                chip.create_overview(tag, cx);
                chip
            })
            .collect();
        cx.placeholder(&mut self.placeholder_shown, model.is_empty(), owner);
        self.model = Some(model.clone());
    }

    fn update_overview(&mut self, model: &Vec<Tag>, cx: &mut RenderCx<'_>) {
        let owner = self.owner;
        let old = self.model.take().unwrap_or_default();
        sync_keyed(&mut self.chips, &old, model, cx, |id| TagChip::new(id, owner));
        cx.placeholder(&mut self.placeholder_shown, model.is_empty(), owner);
        self.model = Some(model.clone());
    }

    fn associated(&self) -> Option<&Vec<Tag>> {
        self.model.as_ref()
    }
}
