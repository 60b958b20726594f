//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] carries [`EntityEvent`]s. It is designed to be shared via
//! `Arc<EventBus>` across the application.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use talio_core::types::{DbId, Timestamp};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// EntityEvent
// ---------------------------------------------------------------------------

/// Kind of entity an event is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Board,
    TaskList,
    Task,
}

/// Something happened to a stored entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityEvent {
    /// Dot-separated event name, e.g. `"task.deleted"`.
    pub event_type: String,
    pub kind: EntityKind,
    pub entity_id: DbId,
    /// Board the entity belonged to, when known.
    pub board_id: Option<DbId>,
    pub timestamp: Timestamp,
}

impl EntityEvent {
    /// An entity was removed from the store.
    pub fn deleted(kind: EntityKind, entity_id: DbId) -> Self {
        let prefix = match kind {
            EntityKind::Board => "board",
            EntityKind::TaskList => "task_list",
            EntityKind::Task => "task",
        };
        Self {
            event_type: format!("{prefix}.deleted"),
            kind,
            entity_id,
            board_id: None,
            timestamp: Utc::now(),
        }
    }

    /// Attach the owning board.
    pub fn with_board(mut self, board_id: DbId) -> Self {
        self.board_id = Some(board_id);
        self
    }

    /// Whether this event reports the deletion of `kind` with `id`.
    pub fn is_deletion_of(&self, kind: EntityKind, id: DbId) -> bool {
        self.kind == kind && self.entity_id == id && self.event_type.ends_with(".deleted")
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`EntityEvent`].
///
/// ```rust
/// use talio_events::bus::{EntityEvent, EntityKind, EventBus};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(EntityEvent::deleted(EntityKind::Task, 7));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<EntityEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// With no subscribers the event is dropped.
    pub fn publish(&self, event: EntityEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EntityEvent> {
        self.sender.subscribe()
    }

    /// Number of live subscribers (long-poll waiters on the server).
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
