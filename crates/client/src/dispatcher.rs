//! Live-update dispatcher.
//!
//! Turns inbound push frames into reconciliations of the open views. Runs
//! on the UI loop only, so frames are applied strictly in arrival order
//! and never concurrently with another reconciliation.
//!
//! Routing:
//!
//! | Topic      | Routed by                 | Not open locally |
//! |------------|---------------------------|------------------|
//! | `board`    | board id                  | ignored          |
//! | `taskList` | list id                   | ignored          |
//! | `task`     | owning list, then board   | ignored          |
//! | `subtask`  | owning task, then board   | ignored          |
//! | `tag`      | owning board              | ignored          |

use talio_core::model::{Board, Task};
use talio_core::types::DbId;
use talio_events::push::{OriginTag, PushEnvelope, PushPayload};

use crate::registry::ViewRegistry;
use crate::storage::LocalStore;
use crate::view::{Component, TaskDetailView};

/// What happened to one inbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Malformed or invalid; logged and discarded.
    Dropped,
    /// Published by this session.
    SelfEcho,
    /// Valid, but nothing it touches is open.
    Ignored,
    Applied,
    /// Applied, and the board's password state flipped local write access.
    AccessChanged { board_id: DbId, write_access: bool },
}

/// Running totals, for the status line and diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub received: u64,
    pub dropped: u64,
    pub self_echoes: u64,
    pub ignored: u64,
    pub applied: u64,
}

/// Session state a dispatch may touch, borrowed for one frame.
pub struct DispatchContext<'a> {
    pub registry: &'a mut ViewRegistry,
    pub detail: Option<&'a mut TaskDetailView>,
    pub store: &'a mut LocalStore,
    pub origin: OriginTag,
    pub admin: bool,
}

#[derive(Debug, Default)]
pub struct LiveUpdateDispatcher {
    stats: DispatchStats,
}

impl LiveUpdateDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    /// Entry point for raw text frames off the socket.
    pub fn on_raw(&mut self, text: &str, cx: &mut DispatchContext<'_>) -> DispatchOutcome {
        match PushEnvelope::parse(text) {
            Ok(envelope) => self.on_push(&envelope, cx),
            Err(e) => {
                tracing::warn!(error = %e, "Dropping unreadable push frame");
                self.stats.received += 1;
                self.record(DispatchOutcome::Dropped)
            }
        }
    }

    /// Filter self-echoes, decode, then apply.
    pub fn on_push(
        &mut self,
        envelope: &PushEnvelope,
        cx: &mut DispatchContext<'_>,
    ) -> DispatchOutcome {
        self.stats.received += 1;

        if envelope.is_from(cx.origin) {
            tracing::trace!(topic = %envelope.topic, "Suppressed self-echo");
            return self.record(DispatchOutcome::SelfEcho);
        }

        let payload = match envelope.decode().and_then(|p| p.validate().map(|()| p)) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(topic = %envelope.topic, error = %e, "Dropping push frame");
                return self.record(DispatchOutcome::Dropped);
            }
        };

        let outcome = apply(&payload, cx);
        tracing::debug!(
            topic = %envelope.topic,
            id = payload.entity_id(),
            ?outcome,
            "Dispatched push",
        );
        self.record(outcome)
    }

    /// Apply an already decoded payload, bypassing origin filtering.
    pub fn on_payload(
        &mut self,
        payload: &PushPayload,
        cx: &mut DispatchContext<'_>,
    ) -> DispatchOutcome {
        self.stats.received += 1;
        let outcome = apply(payload, cx);
        self.record(outcome)
    }

    fn record(&mut self, outcome: DispatchOutcome) -> DispatchOutcome {
        match outcome {
            DispatchOutcome::Dropped => self.stats.dropped += 1,
            DispatchOutcome::SelfEcho => self.stats.self_echoes += 1,
            DispatchOutcome::Ignored => self.stats.ignored += 1,
            DispatchOutcome::Applied | DispatchOutcome::AccessChanged { .. } => {
                self.stats.applied += 1
            }
        }
        outcome
    }
}

fn apply(payload: &PushPayload, cx: &mut DispatchContext<'_>) -> DispatchOutcome {
    let outcome = match payload {
        PushPayload::Board(board) => apply_board(board, cx),
        PushPayload::TaskList(list) => {
            if cx.registry.reconcile_task_list(list) {
                DispatchOutcome::Applied
            } else {
                DispatchOutcome::Ignored
            }
        }
        PushPayload::Task(task) => {
            let board_id = cx.registry.board_of_task_list(task.task_list_id);
            patch_board(cx.registry, board_id, |board| board.insert_or_replace_task(task.clone()))
        }
        PushPayload::Subtask(subtask) => {
            let board_id = cx.registry.board_of_task(subtask.task_id);
            patch_board(cx.registry, board_id, |board| {
                match board.find_task_mut(subtask.task_id) {
                    Some(task) => {
                        task.upsert_subtask(subtask.clone());
                        true
                    }
                    None => false,
                }
            })
        }
        PushPayload::Tag(tag) => {
            let board_id = Some(tag.board_id).filter(|id| cx.registry.board_view(*id).is_some());
            patch_board(cx.registry, board_id, |board| board.replace_tag_everywhere(tag) > 0)
        }
    };

    if outcome != DispatchOutcome::Ignored {
        refresh_detail(cx);
    }
    outcome
}

/// Reconcile the open copy of `board_id` after `mutate` edits a clone of it.
fn patch_board(
    registry: &mut ViewRegistry,
    board_id: Option<DbId>,
    mutate: impl FnOnce(&mut Board) -> bool,
) -> DispatchOutcome {
    let Some(mut board) = board_id.and_then(|id| registry.board_model(id)).cloned() else {
        return DispatchOutcome::Ignored;
    };
    if !mutate(&mut board) {
        return DispatchOutcome::Ignored;
    }
    registry.reconcile_board(&board);
    DispatchOutcome::Applied
}

fn apply_board(board: &Board, cx: &mut DispatchContext<'_>) -> DispatchOutcome {
    let Some(previous) = cx.registry.board_model(board.id) else {
        return DispatchOutcome::Ignored;
    };

    let mut outcome = DispatchOutcome::Applied;
    if previous.password != board.password {
        let write_access = !board.is_protected() || cx.admin;
        tracing::info!(board_id = board.id, write_access, "Board password changed remotely");

        // A remembered password is stale once the board's password changes.
        if cx.store.password_for(board.id).is_some() {
            if let Err(e) = cx.store.forget_password(board.id) {
                tracing::warn!(board_id = board.id, error = %e, "Failed to forget board password");
            }
        }

        cx.registry.set_write_access(board.id, board.is_protected(), write_access);
        if let Some(detail) = cx.detail.as_deref_mut().filter(|d| d.board_id() == board.id) {
            cx.registry.render(|rcx| detail.set_editable(write_access, rcx));
        }
        outcome = DispatchOutcome::AccessChanged {
            board_id: board.id,
            write_access,
        };
    }

    cx.registry.reconcile_board(board);
    outcome
}

/// Bring the task popup up to date with the registry's copy of its task.
fn refresh_detail(cx: &mut DispatchContext<'_>) {
    let Some(detail) = cx.detail.as_deref_mut() else {
        return;
    };
    let Some(task) = cx.registry.task_model(detail.task_id()).cloned() else {
        return;
    };
    if detail.is_stale(&task) {
        refresh_detail_with(cx.registry, detail, &task);
    }
}

fn refresh_detail_with(registry: &mut ViewRegistry, detail: &mut TaskDetailView, task: &Task) {
    registry.render(|rcx| detail.reconcile(task, rcx));
    tracing::debug!(task_id = task.id, "Task detail refreshed");
}
