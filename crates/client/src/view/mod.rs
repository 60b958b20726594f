//! Headless view tree.
//!
//! Each view mirrors one model type and is driven through [`Component`]:
//! `create_overview` builds it from scratch, `update_overview` applies only
//! what changed. Views never render pixels; every observable mutation is
//! recorded in the [`RenderJournal`], which a toolkit binding (or a test)
//! replays.
//!
//! Board and task-list children are not owned by their parents. They live
//! in the [`ViewArena`] owned by the registry and parents keep ordered id
//! lists. Tag chips and subtask rows are owned directly by their bars.

mod board;
mod detail;
mod subtasks;
mod tags;
mod task_card;
mod task_list;

pub use board::BoardView;
pub use detail::TaskDetailView;
pub use subtasks::{SubtaskBar, SubtaskRow};
pub use tags::{TagBar, TagChip};
pub use task_card::TaskCard;
pub use task_list::TaskListView;

use std::collections::{HashMap, HashSet};

use talio_core::delta::{compute_delta, plan_positional, PositionalOp};
use talio_core::model::Identified;
use talio_core::types::DbId;

// ---------------------------------------------------------------------------
// Node identity and journal
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Board,
    TaskList,
    TaskCard,
    TaskDetail,
    TagChip,
    SubtaskRow,
}

/// Address of a view node in journal entries.
///
/// Tag chips and subtask rows repeat across cards, so they carry their
/// owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef {
    pub kind: NodeKind,
    pub id: DbId,
    pub owner: Option<(NodeKind, DbId)>,
}

impl NodeRef {
    pub fn new(kind: NodeKind, id: DbId) -> Self {
        Self { kind, id, owner: None }
    }

    pub fn board(id: DbId) -> Self {
        Self::new(NodeKind::Board, id)
    }

    pub fn task_list(id: DbId) -> Self {
        Self::new(NodeKind::TaskList, id)
    }

    pub fn card(id: DbId) -> Self {
        Self::new(NodeKind::TaskCard, id)
    }

    pub fn detail(id: DbId) -> Self {
        Self::new(NodeKind::TaskDetail, id)
    }

    /// A child node of kind `kind` under `owner`.
    pub fn child(kind: NodeKind, id: DbId, owner: NodeRef) -> Self {
        Self {
            kind,
            id,
            owner: Some((owner.kind, owner.id)),
        }
    }
}

/// One observable view mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewOp {
    Created(NodeRef),
    Removed(NodeRef),
    /// A scalar field took a new value.
    Patched { node: NodeRef, field: &'static str },
    /// A child moved to position `to` within its parent.
    Moved { node: NodeRef, to: usize },
    /// A card changed parent list without being rebuilt.
    Reattached {
        node: NodeRef,
        from_list: DbId,
        to_list: DbId,
    },
    Restyled { node: NodeRef, style: String },
    /// The "nothing here" placeholder of `parent` was shown or hidden.
    Placeholder { parent: NodeRef, shown: bool },
}

impl ViewOp {
    pub fn node(&self) -> NodeRef {
        match self {
            Self::Created(node) | Self::Removed(node) => *node,
            Self::Patched { node, .. }
            | Self::Moved { node, .. }
            | Self::Reattached { node, .. }
            | Self::Restyled { node, .. } => *node,
            Self::Placeholder { parent, .. } => *parent,
        }
    }
}

/// Append-only log of view mutations.
#[derive(Debug, Default, Clone)]
pub struct RenderJournal {
    ops: Vec<ViewOp>,
}

impl RenderJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, op: ViewOp) {
        tracing::trace!(?op, "View op");
        self.ops.push(op);
    }

    pub fn ops(&self) -> &[ViewOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Drain everything recorded so far.
    pub fn take(&mut self) -> Vec<ViewOp> {
        std::mem::take(&mut self.ops)
    }
}

// ---------------------------------------------------------------------------
// View-local state
// ---------------------------------------------------------------------------

/// User interaction state that lives on a view, never on its model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InteractionState {
    pub focused: bool,
    pub caret: Option<usize>,
    pub dragging: bool,
    pub popup_open: bool,
}

/// Padlock shown on a board tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    Unprotected,
    /// Protected and opened read-only.
    Locked,
    /// Protected and opened with write access.
    Unlocked,
}

impl LockState {
    pub fn derive(protected: bool, write_access: bool) -> Self {
        match (protected, write_access) {
            (false, _) => Self::Unprotected,
            (true, true) => Self::Unlocked,
            (true, false) => Self::Locked,
        }
    }
}

// ---------------------------------------------------------------------------
// Arena and render context
// ---------------------------------------------------------------------------

/// Registry-owned storage for task-list views and task cards.
#[derive(Debug, Default)]
pub struct ViewArena {
    pub task_lists: HashMap<DbId, TaskListView>,
    pub task_cards: HashMap<DbId, TaskCard>,
    /// Cards detached from their list during the current pass.
    pub parked: HashSet<DbId>,
}

/// Everything a component may touch while reconciling.
pub struct RenderCx<'a> {
    pub journal: &'a mut RenderJournal,
    pub arena: &'a mut ViewArena,
    /// Style handed down from the parent's new model.
    pub inherited_style: String,
}

impl<'a> RenderCx<'a> {
    pub fn new(journal: &'a mut RenderJournal, arena: &'a mut ViewArena) -> Self {
        Self {
            journal,
            arena,
            inherited_style: String::new(),
        }
    }

    /// Reborrow for a child, passing down `style`.
    pub fn child(&mut self, style: String) -> RenderCx<'_> {
        RenderCx {
            journal: &mut *self.journal,
            arena: &mut *self.arena,
            inherited_style: style,
        }
    }

    pub fn record(&mut self, op: ViewOp) {
        self.journal.record(op);
    }

    /// Set `slot` to `value`, recording a patch when it differs.
    pub fn patch<T: PartialEq>(
        &mut self,
        slot: &mut T,
        value: T,
        node: NodeRef,
        field: &'static str,
    ) {
        if *slot != value {
            *slot = value;
            self.record(ViewOp::Patched { node, field });
        }
    }

    /// Re-apply a computed style only when the string differs.
    pub fn restyle(&mut self, slot: &mut String, style: String, node: NodeRef) {
        if *slot != style {
            *slot = style.clone();
            self.record(ViewOp::Restyled { node, style });
        }
    }

    /// Show or hide the empty-collection placeholder of `parent`.
    pub fn placeholder(&mut self, shown_slot: &mut bool, empty: bool, parent: NodeRef) {
        if *shown_slot != empty {
            *shown_slot = empty;
            self.record(ViewOp::Placeholder { parent, shown: empty });
        }
    }
}

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

/// A view bound to one model value.
pub trait Component {
    type Model;

    /// Journal address of this view.
    fn node(&self) -> NodeRef;

    /// Build the view from scratch.
    fn create_overview(&mut self, model: &Self::Model, cx: &mut RenderCx<'_>);

    /// Apply the difference between the attached model and `model`.
    fn update_overview(&mut self, model: &Self::Model, cx: &mut RenderCx<'_>);

    /// The model currently displayed, `None` before the first build.
    fn associated(&self) -> Option<&Self::Model>;

    /// Build on first use, update afterwards.
    fn reconcile(&mut self, model: &Self::Model, cx: &mut RenderCx<'_>) {
        if self.associated().is_some() {
            self.update_overview(model, cx);
        } else {
            self.create_overview(model, cx);
        }
    }
}

/// Reconcile an owned, ordered list of child views keyed by model id.
///
/// Removed children are dropped, the positional plan places new and moved
/// children, and every id present on both sides is patched from the new
/// copy. `views` must be in `old` order on entry.
pub(crate) fn sync_keyed<V, M>(
    views: &mut Vec<V>,
    old: &[M],
    new: &[M],
    cx: &mut RenderCx<'_>,
    make: impl Fn(DbId) -> V,
) where
    V: Component<Model = M>,
    M: Identified + Clone + PartialEq,
{
    let delta = compute_delta(old, new);

    for gone in &delta.removed {
        if let Some(pos) = views.iter().position(|v| v.node().id == gone.id()) {
            let view = views.remove(pos);
            cx.record(ViewOp::Removed(view.node()));
        }
    }

    for op in plan_positional(old, new) {
        match op {
            PositionalOp::Keep { .. } | PositionalOp::Patch { .. } => {}
            PositionalOp::Move { from, to, .. } => {
                let view = views.remove(from);
                cx.record(ViewOp::Moved { node: view.node(), to });
                views.insert(to, view);
            }
            PositionalOp::Insert { index, id } => {
                let Some(model) = new.iter().find(|m| m.id() == id) else {
                    continue;
                };
                let mut view = make(id);
                view.create_overview(model, cx);
                views.insert(index.min(views.len()), view);
            }
        }
    }

    for model in &delta.modified {
        match views.iter_mut().find(|v| v.node().id == model.id()) {
            Some(view) => view.update_overview(model, cx),
            None => tracing::warn!(id = model.id(), "No child view for modified element, skipping"),
        }
    }
}
