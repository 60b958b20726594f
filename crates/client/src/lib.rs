//! Talio board client.
//!
//! Headless views reconciled against server models, a push dispatcher,
//! deletion watches and the session controller that ties them together
//! on a single UI loop.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod gateway;
pub mod push;
pub mod registry;
pub mod session;
pub mod storage;
pub mod ui_loop;
pub mod view;
pub mod watch;
