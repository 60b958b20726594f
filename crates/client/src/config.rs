use std::path::PathBuf;
use std::time::Duration;

use crate::push::ReconnectConfig;

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server base URL without the `/api/v1` prefix.
    pub server_url: String,
    /// Location of the local state file.
    pub store_path: PathBuf,
    /// First push reconnect delay in milliseconds.
    pub reconnect_initial_ms: u64,
    /// Upper bound on the push reconnect delay in milliseconds.
    pub reconnect_max_ms: u64,
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default                 |
    /// |------------------------------|-------------------------|
    /// | `TALIO_SERVER_URL`           | `http://localhost:8080` |
    /// | `TALIO_STORE_PATH`           | `talio-client.json`     |
    /// | `TALIO_RECONNECT_INITIAL_MS` | `1000`                  |
    /// | `TALIO_RECONNECT_MAX_MS`     | `30000`                 |
    pub fn from_env() -> Self {
        let server_url = std::env::var("TALIO_SERVER_URL")
            .unwrap_or_else(|_| "http://localhost:8080".into())
            .trim_end_matches('/')
            .to_string();

        let store_path = std::env::var("TALIO_STORE_PATH")
            .unwrap_or_else(|_| "talio-client.json".into())
            .into();

        let reconnect_initial_ms: u64 = std::env::var("TALIO_RECONNECT_INITIAL_MS")
            .unwrap_or_else(|_| "1000".into())
            .parse()
            .expect("TALIO_RECONNECT_INITIAL_MS must be a valid u64");

        let reconnect_max_ms: u64 = std::env::var("TALIO_RECONNECT_MAX_MS")
            .unwrap_or_else(|_| "30000".into())
            .parse()
            .expect("TALIO_RECONNECT_MAX_MS must be a valid u64");

        Self {
            server_url,
            store_path,
            reconnect_initial_ms,
            reconnect_max_ms,
        }
    }

    /// Base URL of the REST API.
    pub fn api_url(&self) -> String {
        format!("{}/api/v1", self.server_url)
    }

    /// WebSocket URL of the push relay.
    pub fn ws_url(&self) -> String {
        let base = if let Some(rest) = self.server_url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = self.server_url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            self.server_url.clone()
        };
        format!("{base}/api/v1/ws")
    }

    pub fn reconnect(&self) -> ReconnectConfig {
        ReconnectConfig {
            initial_delay: Duration::from_millis(self.reconnect_initial_ms),
            max_delay: Duration::from_millis(self.reconnect_max_ms),
            ..Default::default()
        }
    }
}
