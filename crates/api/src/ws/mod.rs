//! Push relay over WebSocket.
//!
//! Clients publish frames on their socket; every valid frame is relayed
//! verbatim to every connection, the sender included.

mod handler;
pub mod manager;
pub mod relay;

pub use handler::ws_handler;
pub use manager::{WsManager, HEARTBEAT_PERIOD};
