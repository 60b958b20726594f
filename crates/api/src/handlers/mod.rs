//! HTTP handlers, one module per resource.

pub mod admin;
pub mod boards;
pub mod connection;
pub mod status;
pub mod subtasks;
pub mod tags;
pub mod task_lists;
pub mod tasks;

use serde::Deserialize;
use talio_events::{EntityEvent, EntityKind};

use crate::state::AppState;
use crate::store::SavedBoard;

/// Body of password-carrying requests.
///
/// Board passwords travel as hashes; the admin password as entered.
#[derive(Debug, Deserialize)]
pub struct PasswordRequest {
    pub password: String,
}

/// Wake deletion watchers for everything a commit dropped.
pub(crate) fn announce_removals(state: &AppState, saved: &SavedBoard) {
    let board_id = saved.board.id;
    for &list_id in &saved.removed_lists {
        state
            .event_bus
            .publish(EntityEvent::deleted(EntityKind::TaskList, list_id).with_board(board_id));
    }
    for &task_id in &saved.removed_tasks {
        state
            .event_bus
            .publish(EntityEvent::deleted(EntityKind::Task, task_id).with_board(board_id));
    }
    if !saved.removed_tasks.is_empty() || !saved.removed_lists.is_empty() {
        tracing::debug!(
            board_id,
            lists = saved.removed_lists.len(),
            tasks = saved.removed_tasks.len(),
            "Announced removals",
        );
    }
}
