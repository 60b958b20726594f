//! Live-update wire protocol.
//!
//! Every frame on the push bus is a JSON text message:
//!
//! ```json
//! {"topic": "task", "origin": "6f1c…", "payload": { ...task... }}
//! ```
//!
//! `origin` is the sender's [`OriginTag`]. The server relays frames to every
//! connection including the sender, so receivers compare the tag with their
//! own and drop their echoes.

use std::fmt;

use serde::{Deserialize, Serialize};
use talio_core::model::{Board, SubTask, Tag, Task, TaskList};
use talio_core::types::DbId;
use uuid::Uuid;

/// Topic a frame is published on, one per entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Topic {
    Board,
    TaskList,
    Task,
    Subtask,
    Tag,
}

impl Topic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Board => "board",
            Self::TaskList => "taskList",
            Self::Task => "task",
            Self::Subtask => "subtask",
            Self::Tag => "tag",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque per-session sender identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OriginTag(Uuid);

impl OriginTag {
    /// A fresh random tag (UUID v4).
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for OriginTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Typed content of a push frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushPayload {
    Board(Board),
    TaskList(TaskList),
    Task(Task),
    Subtask(SubTask),
    Tag(Tag),
}

impl PushPayload {
    pub fn topic(&self) -> Topic {
        match self {
            Self::Board(_) => Topic::Board,
            Self::TaskList(_) => Topic::TaskList,
            Self::Task(_) => Topic::Task,
            Self::Subtask(_) => Topic::Subtask,
            Self::Tag(_) => Topic::Tag,
        }
    }

    /// Id of the carried entity.
    pub fn entity_id(&self) -> DbId {
        match self {
            Self::Board(b) => b.id,
            Self::TaskList(l) => l.id,
            Self::Task(t) => t.id,
            Self::Subtask(s) => s.id,
            Self::Tag(t) => t.id,
        }
    }

    /// Reject payloads that could not have come from a persisted entity.
    ///
    /// Only saved entities are published, so every id and back-reference
    /// must be set.
    pub fn validate(&self) -> Result<(), FrameError> {
        let invalid = |msg: &str| -> Result<(), FrameError> {
            Err(FrameError::Invalid(format!("{}: {msg}", self.topic())))
        };
        if self.entity_id() <= 0 {
            return invalid("missing id");
        }
        match self {
            Self::Board(board) => {
                if board.task_lists.iter().any(|l| l.id <= 0) {
                    return invalid("unsaved task list");
                }
            }
            Self::TaskList(list) => {
                if list.board_id <= 0 {
                    return invalid("missing board id");
                }
            }
            Self::Task(task) => {
                if task.task_list_id <= 0 {
                    return invalid("missing task list id");
                }
                if task.title.is_empty() {
                    return invalid("empty title");
                }
            }
            Self::Subtask(subtask) => {
                if subtask.task_id <= 0 {
                    return invalid("missing task id");
                }
            }
            Self::Tag(tag) => {
                if tag.board_id <= 0 {
                    return invalid("missing board id");
                }
            }
        }
        Ok(())
    }

    fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            Self::Board(v) => serde_json::to_value(v),
            Self::TaskList(v) => serde_json::to_value(v),
            Self::Task(v) => serde_json::to_value(v),
            Self::Subtask(v) => serde_json::to_value(v),
            Self::Tag(v) => serde_json::to_value(v),
        }
    }
}

/// Errors decoding or validating a push frame.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The frame is not valid JSON or its payload does not match the topic.
    #[error("Malformed push frame: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The frame decoded but fails payload validation.
    #[error("Invalid push payload: {0}")]
    Invalid(String),
}

/// A frame as it travels over the push bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushEnvelope {
    pub topic: Topic,
    pub origin: OriginTag,
    pub payload: serde_json::Value,
}

impl PushEnvelope {
    /// Stamp `payload` with the sender's origin.
    pub fn new(payload: &PushPayload, origin: OriginTag) -> Result<Self, FrameError> {
        Ok(Self {
            topic: payload.topic(),
            origin,
            payload: payload.to_value()?,
        })
    }

    /// Parse a raw text frame.
    pub fn parse(text: &str) -> Result<Self, FrameError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_text(&self) -> Result<String, FrameError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Whether this frame was published by `origin`.
    pub fn is_from(&self, origin: OriginTag) -> bool {
        self.origin == origin
    }

    /// Decode the payload according to the frame's topic.
    pub fn decode(&self) -> Result<PushPayload, FrameError> {
        let value = self.payload.clone();
        let payload = match self.topic {
            Topic::Board => PushPayload::Board(serde_json::from_value(value)?),
            Topic::TaskList => PushPayload::TaskList(serde_json::from_value(value)?),
            Topic::Task => PushPayload::Task(serde_json::from_value(value)?),
            Topic::Subtask => PushPayload::Subtask(serde_json::from_value(value)?),
            Topic::Tag => PushPayload::Tag(serde_json::from_value(value)?),
        };
        Ok(payload)
    }
}
