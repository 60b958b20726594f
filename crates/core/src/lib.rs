//! Domain model and pure algorithms shared by the Talio server and client.
//!
//! Nothing in this crate performs I/O. The client's reconciliation engine
//! builds on [`delta`], the server builds on [`model`] and [`join_code`].

pub mod delta;
pub mod error;
pub mod hashing;
pub mod join_code;
pub mod model;
pub mod types;
