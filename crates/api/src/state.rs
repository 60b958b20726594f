use std::sync::Arc;

use talio_events::EventBus;

use crate::config::ServerConfig;
use crate::store::BoardStore;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone: everything lives behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<BoardStore>,
    pub config: Arc<ServerConfig>,
    /// Push relay connections.
    pub ws_manager: Arc<WsManager>,
    /// Deletion notices for long-poll waiters.
    pub event_bus: Arc<EventBus>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            store: Arc::new(BoardStore::new()),
            config: Arc::new(config),
            ws_manager: Arc::new(WsManager::new()),
            event_bus: Arc::new(EventBus::default()),
        }
    }
}
