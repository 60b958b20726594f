//! Push bus client: one relay socket per session, reconnecting with
//! backoff, with all inbound frames funnelled into the UI loop.

pub mod client;
pub mod processor;
pub mod reconnect;

pub use client::{PushClient, PushHandle, PushStream};
pub use reconnect::{next_delay, ReconnectConfig};
