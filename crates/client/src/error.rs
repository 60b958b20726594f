//! Error types for the client.
//!
//! [`GatewayError`] covers the HTTP collaborator, [`PushError`] the live
//! update transport and [`StorageError`] the local state file.
//! [`ClientError`] is what session operations return to the UI.

use talio_core::types::DbId;

/// Errors from the remote gateway.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server returned a non-2xx status code.
    #[error("Server error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The requested entity does not exist.
    #[error("Not found")]
    NotFound,

    /// The server refused the operation.
    #[error("Access denied")]
    Denied,
}

/// Errors from the push transport.
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    /// Failed to establish the WebSocket connection.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A frame could not be encoded or sent.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// There is no live connection to publish on.
    #[error("Push connection is closed")]
    Closed,
}

/// Errors reading or writing the local state file.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage format error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors surfaced by session operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The board is open read-only.
    #[error("You do not have write access to board {0}")]
    WriteAccessDenied(DbId),

    #[error("Board {0} is not open")]
    BoardNotOpen(DbId),

    #[error("Task list {0} is not open")]
    TaskListNotFound(DbId),

    #[error("Task {0} is not open")]
    TaskNotFound(DbId),

    #[error("Admin mode required")]
    AdminRequired,

    /// User input rejected before reaching the server.
    #[error("{0}")]
    Validation(String),
}

/// Convenience alias for session results.
pub type ClientResult<T> = Result<T, ClientError>;
