//! Talio event plumbing.
//!
//! - [`EventBus`] - in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`; the server fans deletion notices out to
//!   long-poll waiters through it.
//! - [`push`] - the live-update wire protocol shared by the server relay and
//!   the client: topics, origin tags and typed payloads.

pub mod bus;
pub mod push;

pub use bus::{EntityEvent, EntityKind, EventBus};
pub use push::{FrameError, OriginTag, PushEnvelope, PushPayload, Topic};
