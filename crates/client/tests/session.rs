//! Session flows over the in-process gateway.

mod common;

use assert_matches::assert_matches;
use talio_client::dispatcher::DispatchOutcome;
use talio_client::error::{ClientError, GatewayError};
use talio_client::gateway::WatchTarget;
use talio_client::push::PushHandle;
use talio_client::session::{Notice, TaskEdit};
use talio_client::ui_loop::{UiEvent, UserAction};
use talio_client::view::LockState;
use talio_core::hashing::hash_password;
use talio_core::model::{Placement, Tag};
use talio_events::push::{OriginTag, PushEnvelope, PushPayload};

use common::{list_id, next_event, seed_board, task_id, test_session, FakeGateway, ADMIN_PASSWORD};

#[tokio::test]
async fn joining_opens_and_remembers_the_board() {
    let fake = FakeGateway::new();
    let board = seed_board(&fake, None).await;
    let mut ts = test_session(&fake);

    let id = ts
        .session
        .join_board(&board.join_code.to_lowercase())
        .await
        .unwrap();

    assert_eq!(id, board.id);
    assert_eq!(ts.session.tabs(), &[id]);
    assert_eq!(ts.session.selected_board(), Some(id));
    assert_eq!(ts.session.recent_boards(), &[id]);
    assert!(ts.session.write_access(id));
    assert_eq!(ts.session.registry().task_list_count(), 2);
    assert_eq!(ts.session.registry().task_card_count(), 2);
    assert!(ts.session.board_watch(id).is_some());

    let summary = ts.session.render_summary();
    assert!(summary.contains("Sprint"));
    assert!(summary.contains("Write spec [0/1] {urgent}"));
}

#[tokio::test]
async fn unknown_join_code_is_not_found() {
    let fake = FakeGateway::new();
    let mut ts = test_session(&fake);

    let err = ts.session.join_board("ZZZZZZ").await.unwrap_err();
    assert_matches!(err, ClientError::Gateway(GatewayError::NotFound));
    assert!(ts.session.tabs().is_empty());
}

#[tokio::test]
async fn opening_a_vanished_board_forgets_it() {
    let fake = FakeGateway::new();
    let board = seed_board(&fake, None).await;
    let mut ts = test_session(&fake);
    ts.session.join_board(&board.join_code).await.unwrap();
    ts.session.close_board(board.id);
    fake.store.delete_board(board.id).await.unwrap();

    let err = ts.session.open_board(board.id).await.unwrap_err();
    assert_matches!(err, ClientError::Gateway(GatewayError::NotFound));
    assert!(ts.session.recent_boards().is_empty());
}

#[tokio::test]
async fn protected_board_is_read_only_until_unlocked() {
    let fake = FakeGateway::new();
    let board = seed_board(&fake, Some("hunter2")).await;
    let mut ts = test_session(&fake);
    ts.session.open_board(board.id).await.unwrap();

    assert!(!ts.session.write_access(board.id));
    assert_eq!(
        ts.session.registry().board_view(board.id).unwrap().lock_state,
        LockState::Locked
    );
    let err = ts.session.add_task_list(board.id, "Doing").await.unwrap_err();
    assert_matches!(err, ClientError::WriteAccessDenied(id) if id == board.id);

    assert!(!ts.session.unlock_board(board.id, "guess").await.unwrap());
    assert!(!ts.session.write_access(board.id));
    assert_eq!(ts.session.store().password_for(board.id), None);

    assert!(ts.session.unlock_board(board.id, "hunter2").await.unwrap());
    assert!(ts.session.write_access(board.id));
    assert_eq!(
        ts.session.registry().board_view(board.id).unwrap().lock_state,
        LockState::Unlocked
    );
    assert_eq!(
        ts.session.store().password_for(board.id),
        Some(hash_password("hunter2").as_str())
    );
}

#[tokio::test]
async fn remembered_password_survives_reopening() {
    let fake = FakeGateway::new();
    let board = seed_board(&fake, Some("hunter2")).await;
    let mut ts = test_session(&fake);
    ts.session.open_board(board.id).await.unwrap();
    ts.session.unlock_board(board.id, "hunter2").await.unwrap();

    ts.session.close_board(board.id);
    assert!(ts.session.registry().board_view(board.id).is_none());
    ts.session.open_board(board.id).await.unwrap();

    assert!(ts.session.write_access(board.id));
}

#[tokio::test]
async fn stale_remembered_password_is_forgotten() {
    let fake = FakeGateway::new();
    let board = seed_board(&fake, Some("hunter2")).await;
    let mut ts = test_session(&fake);
    ts.session.open_board(board.id).await.unwrap();
    ts.session.unlock_board(board.id, "hunter2").await.unwrap();
    ts.session.close_board(board.id);

    let mut changed = fake.store.get_board(board.id).await.unwrap();
    changed.password = hash_password("rotated");
    fake.store.save_board(changed).await;

    ts.session.open_board(board.id).await.unwrap();
    assert!(!ts.session.write_access(board.id));
    assert_eq!(ts.session.store().password_for(board.id), None);
}

#[tokio::test]
async fn created_board_is_open_and_writable() {
    let fake = FakeGateway::new();
    let mut ts = test_session(&fake);

    let id = ts.session.create_board("Roadmap", Some("s3cret")).await.unwrap();

    let stored = fake.store.get_board(id).await.unwrap();
    assert!(stored.is_protected());
    assert_eq!(ts.session.selected_board(), Some(id));
    assert!(ts.session.write_access(id));
    assert!(ts.session.registry().board_view(id).unwrap().placeholder_shown());
    assert_eq!(ts.session.recent_boards(), &[id]);
}

#[tokio::test]
async fn lists_and_tasks_are_created_in_place() {
    let fake = FakeGateway::new();
    let board = seed_board(&fake, None).await;
    let mut ts = test_session(&fake);
    ts.session.open_board(board.id).await.unwrap();

    let list = ts.session.add_task_list(board.id, "Doing").await.unwrap();
    assert!(ts.session.registry().task_list_view(list).is_some());

    let task = ts.session.add_task(list, "Ship it").await.unwrap();
    let card = ts.session.registry().task_card(task).unwrap();
    assert_eq!(card.title, "Ship it");
    assert_eq!(card.list_id(), list);
    assert_eq!(
        ts.session.registry().task_list_view(list).unwrap().card_ids(),
        &[task]
    );

    let stored = fake.store.get_task(task).await.unwrap();
    assert_eq!(stored.background_color, board.task_default_color.background_color);

    let err = ts.session.add_task(list, "   ").await.unwrap_err();
    assert_matches!(err, ClientError::Validation(_));
}

#[tokio::test]
async fn moving_and_deleting_tasks() {
    let fake = FakeGateway::new();
    let board = seed_board(&fake, None).await;
    let mut ts = test_session(&fake);
    ts.session.open_board(board.id).await.unwrap();
    let (todo, done) = (list_id(&board, "Todo"), list_id(&board, "Done"));
    let (write, review) = (task_id(&board, "Write spec"), task_id(&board, "Review"));

    ts.session.move_task(review, done, None).await.unwrap();
    assert_eq!(ts.session.registry().task_card(review).unwrap().list_id(), done);
    ts.session
        .move_task(write, done, Some((review, Placement::Before)))
        .await
        .unwrap();

    let registry = ts.session.registry();
    assert_eq!(registry.task_list_view(done).unwrap().card_ids(), &[write, review]);
    assert!(registry.task_list_view(todo).unwrap().placeholder_shown());
    assert_eq!(registry.task_card_count(), 2);

    let stored = fake.store.get_board(board.id).await.unwrap();
    let order: Vec<_> = stored.task_list(done).unwrap().tasks.iter().map(|t| t.id).collect();
    assert_eq!(order, vec![write, review]);

    ts.session.delete_task(write).await.unwrap();
    assert!(ts.session.registry().task_card(write).is_none());
    assert!(fake.store.get_task(write).await.is_none());
}

#[tokio::test]
async fn moving_to_an_unknown_list_keeps_the_task() {
    let fake = FakeGateway::new();
    let board = seed_board(&fake, None).await;
    let mut ts = test_session(&fake);
    ts.session.open_board(board.id).await.unwrap();
    let review = task_id(&board, "Review");
    let todo = list_id(&board, "Todo");

    assert_matches!(
        ts.session.move_task(review, 9_999, None).await,
        Err(ClientError::TaskListNotFound(9_999))
    );
    let write = task_id(&board, "Write spec");
    assert_matches!(
        ts.session.move_task(review, 9_999, Some((write, Placement::After))).await,
        Err(ClientError::TaskListNotFound(9_999))
    );

    let stored = fake.store.get_task(review).await.unwrap();
    assert_eq!(stored.task_list_id, todo);
    let card = ts.session.registry().task_card(review).unwrap();
    assert_eq!(card.list_id(), todo);
    assert_eq!(ts.session.registry().task_card_count(), 2);
}

#[tokio::test]
async fn deleting_a_list_drops_its_cards() {
    let fake = FakeGateway::new();
    let board = seed_board(&fake, None).await;
    let mut ts = test_session(&fake);
    ts.session.open_board(board.id).await.unwrap();
    let todo = list_id(&board, "Todo");

    ts.session.delete_task_list(todo).await.unwrap();

    assert!(ts.session.registry().task_list_view(todo).is_none());
    assert_eq!(ts.session.registry().task_card_count(), 0);
    assert_eq!(ts.session.registry().task_list_count(), 1);
}

#[tokio::test]
async fn renaming_a_tag_relabels_every_card() {
    let fake = FakeGateway::new();
    let board = seed_board(&fake, None).await;
    let mut ts = test_session(&fake);
    ts.session.open_board(board.id).await.unwrap();
    let (write, review) = (task_id(&board, "Write spec"), task_id(&board, "Review"));

    let old = ts.session.registry().task_model(write).unwrap().tags[0].clone();
    let mut copy = Tag::new("urgent", 0);
    copy.tag_color = "#ff0000".into();
    let added = ts.session.edit_tag_on_task(review, copy).await.unwrap();
    assert_eq!(added.id, old.id);

    ts.session
        .rename_tag_on_board(&old, Tag { description: "critical".into(), ..old.clone() })
        .await
        .unwrap();

    for id in [write, review] {
        let card = ts.session.registry().task_card(id).unwrap();
        assert_eq!(card.tags.labels(), vec!["critical"]);
    }
    let view = ts.session.registry().board_view(board.id).unwrap();
    assert_eq!(view.tag_overview.len(), 1);
    assert_eq!(view.tag_overview[0].description, "critical");
}

#[tokio::test]
async fn subtasks_drive_card_progress_and_detail() {
    let fake = FakeGateway::new();
    let board = seed_board(&fake, None).await;
    let mut ts = test_session(&fake);
    ts.session.open_board(board.id).await.unwrap();
    let write = task_id(&board, "Write spec");
    ts.session.open_task_detail(write).unwrap();

    let added = ts.session.add_subtask(write, "Draft").await.unwrap();
    assert_eq!(ts.session.registry().task_card(write).unwrap().progress, (0, 2));

    assert!(ts.session.toggle_subtask(write, added).await.unwrap());
    assert_eq!(ts.session.registry().task_card(write).unwrap().progress, (1, 2));
    let detail = ts.session.detail().unwrap();
    assert_eq!(detail.subtasks.rows().len(), 2);
    assert!(detail.subtasks.rows()[1].checked);

    ts.session.delete_subtask(write, added).await.unwrap();
    assert_eq!(ts.session.registry().task_card(write).unwrap().progress, (0, 1));
}

#[tokio::test]
async fn subtasks_can_be_reworded_and_reordered() {
    let fake = FakeGateway::new();
    let board = seed_board(&fake, None).await;
    let mut ts = test_session(&fake);
    ts.session.open_board(board.id).await.unwrap();
    let write = task_id(&board, "Write spec");
    let outline = board.find_task(write).unwrap().sub_tasks[0].id;
    ts.session.open_task_detail(write).unwrap();
    let draft = ts.session.add_subtask(write, "Draft").await.unwrap();

    ts.session.edit_subtask(write, outline, "Outline v2").await.unwrap();
    assert_matches!(
        ts.session.edit_subtask(write, outline, "  ").await,
        Err(ClientError::Validation(_))
    );
    ts.session
        .move_subtask(write, draft, outline, Placement::Before)
        .await
        .unwrap();

    let stored = fake.store.get_task(write).await.unwrap();
    let order: Vec<_> = stored.sub_tasks.iter().map(|s| (s.id, s.description.as_str())).collect();
    assert_eq!(order, vec![(draft, "Draft"), (outline, "Outline v2")]);
    let rows = ts.session.detail().unwrap().subtasks.rows();
    assert_eq!(rows.iter().map(|r| r.id()).collect::<Vec<_>>(), vec![draft, outline]);
    assert_eq!(rows[1].description, "Outline v2");

    assert_matches!(
        ts.session.move_subtask(write, draft, 9_999, Placement::After).await,
        Err(ClientError::Validation(_))
    );
    assert_eq!(fake.store.get_task(write).await.unwrap().sub_tasks.len(), 2);
}

#[tokio::test]
async fn editing_a_task_updates_card_and_detail() {
    let fake = FakeGateway::new();
    let board = seed_board(&fake, None).await;
    let mut ts = test_session(&fake);
    ts.session.open_board(board.id).await.unwrap();
    let review = task_id(&board, "Review");
    ts.session.open_task_detail(review).unwrap();

    ts.session
        .edit_task(
            review,
            TaskEdit {
                title: Some("Peer review".into()),
                description: Some("Two approvals".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let card = ts.session.registry().task_card(review).unwrap();
    assert_eq!(card.title, "Peer review");
    assert!(card.has_description);
    let detail = ts.session.detail().unwrap();
    assert_eq!(detail.title, "Peer review");
    assert_eq!(detail.description, "Two approvals");
}

#[tokio::test]
async fn published_frames_carry_our_origin_and_echo_back_as_no_ops() {
    let fake = FakeGateway::new();
    let board = seed_board(&fake, None).await;
    let (push, mut frames) = PushHandle::channel(OriginTag::generate());
    let mut ts = test_session(&fake);
    ts.session = ts.session.with_push(push);
    ts.session.open_board(board.id).await.unwrap();

    let list = list_id(&board, "Done");
    ts.session.add_task(list, "Celebrate").await.unwrap();

    let text = frames.try_recv().unwrap();
    let envelope = PushEnvelope::parse(&text).unwrap();
    assert!(envelope.is_from(ts.session.origin()));
    assert_matches!(envelope.decode().unwrap(), PushPayload::Task(t) if t.title == "Celebrate");

    ts.session.registry_mut().take_journal();
    assert_eq!(ts.session.dispatch(&text), DispatchOutcome::SelfEcho);
    assert!(ts.session.registry().journal().is_empty());
}

#[tokio::test]
async fn foreign_pushes_reach_the_views() {
    let fake = FakeGateway::new();
    let board = seed_board(&fake, None).await;
    let mut ts = test_session(&fake);
    ts.session.open_board(board.id).await.unwrap();

    let mut task = fake.store.get_task(task_id(&board, "Review")).await.unwrap();
    task.title = "Reviewed".into();
    let payload = PushPayload::Task(task.clone());
    let envelope = PushEnvelope::new(&payload, OriginTag::generate()).unwrap();

    assert!(ts.session.handle_event(UiEvent::Push(envelope)).await);
    assert_eq!(ts.session.registry().task_card(task.id).unwrap().title, "Reviewed");
    assert_eq!(ts.session.dispatch_stats().applied, 1);
}

#[tokio::test]
async fn clearing_the_password_elsewhere_unlocks_the_board() {
    let fake = FakeGateway::new();
    let board = seed_board(&fake, Some("hunter2")).await;
    let mut ts = test_session(&fake);
    ts.session.open_board(board.id).await.unwrap();
    assert!(!ts.session.write_access(board.id));

    let cleared = fake
        .store
        .remove_password(board.id, &hash_password("hunter2"))
        .await
        .unwrap()
        .unwrap();
    let text = PushEnvelope::new(&PushPayload::Board(cleared), OriginTag::generate())
        .unwrap()
        .to_text()
        .unwrap();
    ts.session.dispatch(&text);

    assert!(ts.session.write_access(board.id));
    assert_eq!(
        ts.session.take_notices(),
        vec![Notice::AccessChanged { board_id: board.id, write_access: true }]
    );
}

#[tokio::test]
async fn deleted_task_closes_its_detail() {
    let fake = FakeGateway::new();
    let board = seed_board(&fake, None).await;
    let mut ts = test_session(&fake);
    ts.session.open_board(board.id).await.unwrap();
    let review = task_id(&board, "Review");
    ts.session.open_task_detail(review).unwrap();
    assert!(ts.session.detail_watch().is_some());

    fake.store.delete_task(review).await.unwrap();

    let event = next_event(&mut ts.events).await;
    assert_matches!(event, UiEvent::Deleted(WatchTarget::Task(id)) if id == review);
    assert!(ts.session.handle_event(event).await);

    assert!(ts.session.detail().is_none());
    assert_eq!(ts.session.take_notices(), vec![Notice::TaskDeleted(review)]);
}

#[tokio::test]
async fn closing_the_detail_cancels_its_watch() {
    let fake = FakeGateway::new();
    let board = seed_board(&fake, None).await;
    let mut ts = test_session(&fake);
    ts.session.open_board(board.id).await.unwrap();
    let review = task_id(&board, "Review");
    ts.session.open_task_detail(review).unwrap();

    ts.session.close_task_detail();
    fake.store.delete_task(review).await.unwrap();

    let waited =
        tokio::time::timeout(std::time::Duration::from_millis(200), ts.events.recv()).await;
    assert!(waited.is_err(), "no deletion event after closing the detail");
}

#[tokio::test]
async fn deleted_board_closes_its_tab() {
    let fake = FakeGateway::new();
    let board = seed_board(&fake, None).await;
    let mut ts = test_session(&fake);
    ts.session.join_board(&board.join_code).await.unwrap();

    fake.store.delete_board(board.id).await.unwrap();

    let event = next_event(&mut ts.events).await;
    assert_matches!(event, UiEvent::Deleted(WatchTarget::Board(id)) if id == board.id);
    ts.session.handle_event(event).await;

    assert!(ts.session.tabs().is_empty());
    assert_eq!(ts.session.selected_board(), None);
    assert!(ts.session.recent_boards().is_empty());
    assert_eq!(ts.session.registry().task_card_count(), 0);
    assert_eq!(ts.session.take_notices(), vec![Notice::BoardDeleted(board.id)]);
}

#[tokio::test]
async fn admin_mode_grants_and_revokes_access() {
    let fake = FakeGateway::new();
    let board = seed_board(&fake, Some("hunter2")).await;
    let mut ts = test_session(&fake);
    ts.session.open_board(board.id).await.unwrap();

    assert_matches!(ts.session.admin_boards().await, Err(ClientError::AdminRequired));
    assert!(!ts.session.enter_admin("nope").await.unwrap());
    assert!(!ts.session.is_admin());

    assert!(ts.session.enter_admin(ADMIN_PASSWORD).await.unwrap());
    assert!(ts.session.write_access(board.id));
    assert_eq!(ts.session.admin_boards().await.unwrap().len(), 1);

    ts.session.leave_admin().await.unwrap();
    assert!(!ts.session.write_access(board.id));
}

#[tokio::test]
async fn admin_can_clear_a_password_and_delete_a_board() {
    let fake = FakeGateway::new();
    let board = seed_board(&fake, Some("hunter2")).await;
    let mut ts = test_session(&fake);
    ts.session.open_board(board.id).await.unwrap();
    ts.session.enter_admin(ADMIN_PASSWORD).await.unwrap();

    assert!(ts.session.remove_board_password(board.id, "").await.unwrap());
    assert!(!fake.store.get_board(board.id).await.unwrap().is_protected());
    assert_eq!(
        ts.session.registry().board_view(board.id).unwrap().lock_state,
        LockState::Unprotected
    );

    ts.session.admin_delete_board(board.id).await.unwrap();
    assert!(fake.store.get_board(board.id).await.is_none());
    assert!(ts.session.tabs().is_empty());
}

#[tokio::test]
async fn failed_actions_become_notices() {
    let fake = FakeGateway::new();
    let mut ts = test_session(&fake);

    assert!(ts.session.handle_event(UiEvent::Action(UserAction::Open(404))).await);
    assert!(ts.session.handle_event(UiEvent::PushDisconnected).await);
    assert!(!ts.session.handle_event(UiEvent::Shutdown).await);

    let notices = ts.session.take_notices();
    assert_eq!(notices.len(), 2);
    assert_matches!(&notices[0], Notice::Error(_));
    assert_eq!(notices[1], Notice::LiveSyncUnavailable);
}
