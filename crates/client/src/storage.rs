//! Local persisted client state.
//!
//! A small JSON file remembering which boards were joined on which server
//! and the password hashes that unlocked protected boards:
//!
//! ```json
//! {
//!   "recentServerToBoards": { "http://localhost:8080": [3, 7] },
//!   "boardPasswords": { "3": "9f86d0…" }
//! }
//! ```
//!
//! Every mutating call writes the file back before returning.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use talio_core::types::DbId;

use crate::error::StorageError;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredState {
    #[serde(default)]
    recent_server_to_boards: BTreeMap<String, Vec<DbId>>,
    #[serde(default)]
    board_passwords: BTreeMap<DbId, String>,
}

/// File-backed key-value store for recent boards and remembered passwords.
#[derive(Debug)]
pub struct LocalStore {
    path: PathBuf,
    state: StoredState,
}

impl LocalStore {
    /// Load the store at `path`. A missing file yields an empty store.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let state = match std::fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => StoredState::default(),
            Ok(text) => serde_json::from_str(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoredState::default(),
            Err(e) => return Err(e.into()),
        };
        tracing::debug!(
            path = %path.display(),
            servers = state.recent_server_to_boards.len(),
            "Loaded local store",
        );
        Ok(Self { path, state })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the current state to disk.
    pub fn flush(&self) -> Result<(), StorageError> {
        let text = serde_json::to_string_pretty(&self.state)?;
        std::fs::write(&self.path, text)?;
        Ok(())
    }

    /// Servers with at least one remembered board.
    pub fn servers(&self) -> Vec<&str> {
        self.state
            .recent_server_to_boards
            .keys()
            .map(String::as_str)
            .collect()
    }

    /// Boards joined on `server`, oldest first.
    pub fn boards_for(&self, server: &str) -> &[DbId] {
        self.state
            .recent_server_to_boards
            .get(server)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn remember_board(&mut self, server: &str, board_id: DbId) -> Result<(), StorageError> {
        let boards = self
            .state
            .recent_server_to_boards
            .entry(server.to_string())
            .or_default();
        if boards.contains(&board_id) {
            return Ok(());
        }
        boards.push(board_id);
        self.flush()
    }

    pub fn forget_board(&mut self, server: &str, board_id: DbId) -> Result<(), StorageError> {
        let Some(boards) = self.state.recent_server_to_boards.get_mut(server) else {
            return Ok(());
        };
        boards.retain(|&id| id != board_id);
        if boards.is_empty() {
            self.state.recent_server_to_boards.remove(server);
        }
        self.state.board_passwords.remove(&board_id);
        self.flush()
    }

    pub fn forget_server(&mut self, server: &str) -> Result<(), StorageError> {
        if let Some(boards) = self.state.recent_server_to_boards.remove(server) {
            for id in boards {
                self.state.board_passwords.remove(&id);
            }
        }
        self.flush()
    }

    pub fn password_for(&self, board_id: DbId) -> Option<&str> {
        self.state.board_passwords.get(&board_id).map(String::as_str)
    }

    pub fn remember_password(&mut self, board_id: DbId, hash: &str) -> Result<(), StorageError> {
        self.state.board_passwords.insert(board_id, hash.to_string());
        self.flush()
    }

    pub fn forget_password(&mut self, board_id: DbId) -> Result<(), StorageError> {
        if self.state.board_passwords.remove(&board_id).is_none() {
            return Ok(());
        }
        self.flush()
    }
}
