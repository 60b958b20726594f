//! View reconciliation through the registry, without any transport.

use talio_client::registry::ViewRegistry;
use talio_client::view::{NodeKind, NodeRef, ViewOp};
use talio_core::model::{Board, Tag, Task, TaskList};
use talio_core::types::DbId;

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

const BOARD: DbId = 1;

fn task(id: DbId, list: DbId, title: &str) -> Task {
    let mut task = Task::new(title, list);
    task.id = id;
    task
}

fn list(id: DbId, title: &str, tasks: Vec<Task>) -> TaskList {
    let mut list = TaskList::new(title, BOARD);
    list.id = id;
    list.tasks = tasks
        .into_iter()
        .map(|mut t| {
            t.task_list_id = id;
            t
        })
        .collect();
    list
}

fn board(lists: Vec<TaskList>) -> Board {
    let mut board = Board::new("Sprint");
    board.id = BOARD;
    board.join_code = "A1B2C3".into();
    board.task_lists = lists;
    board
}

fn tag(id: DbId, description: &str) -> Tag {
    let mut tag = Tag::new(description, BOARD);
    tag.id = id;
    tag
}

fn opened(board: &Board) -> ViewRegistry {
    let mut registry = ViewRegistry::new();
    registry.open_board(board, true);
    registry.take_journal();
    registry
}

fn touches(ops: &[ViewOp], node: NodeRef) -> bool {
    ops.iter().any(|op| op.node() == node)
}

fn count(ops: &[ViewOp], wanted: impl Fn(&ViewOp) -> bool) -> usize {
    ops.iter().filter(|op| wanted(op)).count()
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn adding_a_task_creates_exactly_one_card() {
    let before = board(vec![list(1, "Todo", vec![])]);
    let mut registry = opened(&before);
    assert!(registry.task_list_view(1).unwrap().placeholder_shown());

    let updated = list(1, "Todo", vec![task(5, 1, "x")]);
    assert!(registry.reconcile_task_list(&updated));

    let ops = registry.take_journal();
    assert_eq!(count(&ops, |op| *op == ViewOp::Created(NodeRef::card(5))), 1);
    let created = count(&ops, |op| {
        matches!(op, ViewOp::Created(n) if n.kind == NodeKind::TaskCard)
    });
    assert_eq!(created, 1);
    assert_eq!(count(&ops, |op| matches!(op, ViewOp::Removed(_) | ViewOp::Moved { .. })), 0);
    assert!(ops.contains(&ViewOp::Placeholder {
        parent: NodeRef::task_list(1),
        shown: false
    }));

    let card = registry.task_card(5).unwrap();
    assert_eq!(card.title, "x");
    assert_eq!(card.list_id(), 1);
    assert_eq!(registry.task_list_view(1).unwrap().card_ids(), &[5]);
}

#[test]
fn moving_a_task_across_lists_reattaches_the_card() {
    let before = board(vec![list(1, "Todo", vec![task(7, 1, "Move me")]), list(2, "Done", vec![])]);
    let mut registry = opened(&before);

    let after = board(vec![list(1, "Todo", vec![]), list(2, "Done", vec![task(7, 2, "Move me")])]);
    registry.reconcile_board(&after);

    let ops = registry.take_journal();
    assert!(ops.contains(&ViewOp::Reattached {
        node: NodeRef::card(7),
        from_list: 1,
        to_list: 2
    }));
    assert!(!ops.contains(&ViewOp::Created(NodeRef::card(7))));
    assert!(!ops.contains(&ViewOp::Removed(NodeRef::card(7))));

    assert_eq!(registry.task_card_count(), 1);
    assert_eq!(registry.task_card(7).unwrap().list_id(), 2);
    assert_eq!(registry.board_of_task(7), Some(BOARD));
    assert!(registry.task_list_view(1).unwrap().card_ids().is_empty());
    assert!(registry.task_list_view(1).unwrap().placeholder_shown());
    assert_eq!(registry.task_list_view(2).unwrap().card_ids(), &[7]);
}

#[test]
fn moving_a_task_backwards_across_lists_reattaches_the_card() {
    let before = board(vec![list(1, "Todo", vec![]), list(2, "Done", vec![task(7, 2, "Back")])]);
    let mut registry = opened(&before);

    let after = board(vec![list(1, "Todo", vec![task(7, 1, "Back")]), list(2, "Done", vec![])]);
    registry.reconcile_board(&after);

    assert_eq!(registry.task_card_count(), 1);
    assert_eq!(registry.task_card(7).unwrap().list_id(), 1);
    assert_eq!(registry.task_list_view(1).unwrap().card_ids(), &[7]);
    assert!(registry.task_list_view(2).unwrap().card_ids().is_empty());
}

#[test]
fn tag_rename_reaches_every_card_using_it() {
    let mut a = task(10, 1, "A");
    a.tags.push(tag(3, "old"));
    let mut b = task(11, 1, "B");
    b.tags.push(tag(3, "old"));
    let c = task(12, 1, "C");
    let before = board(vec![list(1, "Todo", vec![a, b, c])]);
    let mut registry = opened(&before);

    let mut after = before.clone();
    after.replace_tag_everywhere(&tag(3, "new"));
    registry.reconcile_board(&after);

    assert_eq!(registry.task_card(10).unwrap().tags.labels(), vec!["new"]);
    assert_eq!(registry.task_card(11).unwrap().tags.labels(), vec!["new"]);

    let ops = registry.take_journal();
    let card_churn = count(&ops, |op| {
        matches!(op, ViewOp::Created(n) | ViewOp::Removed(n) if n.kind == NodeKind::TaskCard)
    });
    assert_eq!(card_churn, 0);
    assert!(!touches(&ops, NodeRef::card(12)));
    let chip_a = NodeRef::child(NodeKind::TagChip, 3, NodeRef::card(10));
    assert!(ops.contains(&ViewOp::Patched { node: chip_a, field: "label" }));
}

#[test]
fn reconciling_the_same_board_is_a_no_op() {
    let mut first = task(1, 10, "First");
    first.tags.push(tag(4, "blue"));
    let shown = board(vec![
        list(10, "Todo", vec![first, task(2, 10, "Second")]),
        list(11, "Done", vec![]),
    ]);
    let mut registry = opened(&shown);

    registry.reconcile_board(&shown);
    assert!(registry.journal().is_empty(), "unexpected ops: {:?}", registry.journal().ops());
}

#[test]
fn associated_model_round_trips() {
    let shown = board(vec![list(10, "Todo", vec![task(1, 10, "First")])]);
    let mut registry = opened(&shown);
    assert_eq!(registry.board_model(BOARD), Some(&shown));

    let mut edited = shown.clone();
    edited.title = "Renamed".into();
    edited.task_lists[0].tasks[0].description = "details".into();
    registry.reconcile_board(&edited);
    assert_eq!(registry.board_model(BOARD), Some(&edited));
    assert_eq!(registry.task_model(1), Some(&edited.task_lists[0].tasks[0]));
}

#[test]
fn swapped_tasks_follow_the_new_order() {
    let before = board(vec![list(
        10,
        "Todo",
        vec![task(1, 10, "a"), task(2, 10, "b"), task(3, 10, "c")],
    )]);
    let mut registry = opened(&before);

    let after = board(vec![list(
        10,
        "Todo",
        vec![task(3, 10, "c"), task(2, 10, "b"), task(1, 10, "a")],
    )]);
    registry.reconcile_board(&after);

    assert_eq!(registry.task_list_view(10).unwrap().card_ids(), &[3, 2, 1]);
    let ops = registry.take_journal();
    assert_eq!(count(&ops, |op| matches!(op, ViewOp::Created(_) | ViewOp::Removed(_))), 0);
    assert!(count(&ops, |op| matches!(op, ViewOp::Moved { .. })) >= 1);
}

#[test]
fn swapped_lists_follow_the_new_order() {
    let before = board(vec![list(10, "Todo", vec![]), list(11, "Done", vec![])]);
    let mut registry = opened(&before);

    let after = board(vec![list(11, "Done", vec![]), list(10, "Todo", vec![])]);
    registry.reconcile_board(&after);

    assert_eq!(registry.board_view(BOARD).unwrap().list_ids(), &[11, 10]);
    assert_eq!(registry.task_list_count(), 2);
}

#[test]
fn field_updates_keep_interaction_state() {
    let before = board(vec![list(10, "Todo", vec![task(1, 10, "Draft")])]);
    let mut registry = opened(&before);
    {
        let card = registry.task_card_mut(1).unwrap();
        card.interaction.focused = true;
        card.interaction.caret = Some(3);
        card.interaction.dragging = true;
    }

    let mut after = before.clone();
    after.task_lists[0].tasks[0].title = "Final".into();
    registry.reconcile_board(&after);

    let card = registry.task_card(1).unwrap();
    assert_eq!(card.title, "Final");
    assert!(card.interaction.focused);
    assert_eq!(card.interaction.caret, Some(3));
    assert!(card.interaction.dragging);

    let ops = registry.take_journal();
    assert!(ops.contains(&ViewOp::Patched {
        node: NodeRef::card(1),
        field: "title"
    }));
    assert!(!ops.contains(&ViewOp::Created(NodeRef::card(1))));
}

#[test]
fn removed_task_is_unregistered() {
    let before = board(vec![list(10, "Todo", vec![task(1, 10, "Keep"), task(2, 10, "Drop")])]);
    let mut registry = opened(&before);

    let after = board(vec![list(10, "Todo", vec![task(1, 10, "Keep")])]);
    registry.reconcile_board(&after);

    assert!(registry.task_card(2).is_none());
    assert_eq!(registry.task_list_view(10).unwrap().card_ids(), &[1]);
    assert!(registry.take_journal().contains(&ViewOp::Removed(NodeRef::card(2))));
}

#[test]
fn list_styles_restyle_once() {
    let before = board(vec![list(10, "Todo", vec![]), list(11, "Done", vec![])]);
    let mut registry = opened(&before);

    let mut after = before.clone();
    after.task_lists_bg_color = "#000000".into();
    registry.reconcile_board(&after);

    let ops = registry.take_journal();
    let restyled = |id| {
        ops.iter().any(|op| {
            matches!(op, ViewOp::Restyled { node, .. } if *node == NodeRef::task_list(id))
        })
    };
    assert!(restyled(10));
    assert!(restyled(11));
    assert_eq!(registry.task_list_view(10).unwrap().style, after.task_list_style());

    registry.reconcile_board(&after);
    assert!(registry.journal().is_empty());
}

#[test]
fn empty_board_shows_placeholder_until_a_list_arrives() {
    let empty = board(vec![]);
    let mut registry = opened(&empty);
    assert!(registry.board_view(BOARD).unwrap().placeholder_shown());

    registry.reconcile_board(&board(vec![list(10, "Todo", vec![])]));
    assert!(!registry.board_view(BOARD).unwrap().placeholder_shown());
    assert_eq!(registry.board_of_task_list(10), Some(BOARD));
}
