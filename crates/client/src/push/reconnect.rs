//! Exponential-backoff reconnection for the push relay socket.
//!
//! When the relay connection drops, the push session calls
//! [`reconnect_loop`] to keep retrying with increasing delays until either
//! the connection is restored or the [`CancellationToken`] is triggered.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::push::client::{PushClient, PushStream};

/// Tunable parameters for the exponential-backoff strategy.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt.
    pub initial_delay: Duration,
    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,
    /// Factor by which the delay grows after each failure.
    pub multiplier: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

/// Calculate the next backoff delay from the current delay and config.
///
/// The result is clamped to [`ReconnectConfig::max_delay`].
pub fn next_delay(current: Duration, config: &ReconnectConfig) -> Duration {
    let next_ms = (current.as_millis() as f64 * config.multiplier) as u64;
    Duration::from_millis(next_ms).min(config.max_delay)
}

/// Reconnect to the relay with exponential backoff.
///
/// Waits `initial_delay` before the first attempt. Returns `None` if
/// `cancel` fires before a connection succeeds.
pub async fn reconnect_loop(
    client: &PushClient,
    config: &ReconnectConfig,
    cancel: &CancellationToken,
) -> Option<PushStream> {
    let mut delay = config.initial_delay;
    let mut attempt = 0u32;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return None,
            _ = tokio::time::sleep(delay) => {}
        }

        attempt += 1;
        tracing::info!(
            url = %client.ws_url(),
            attempt,
            delay_ms = delay.as_millis() as u64,
            "Reconnecting to push relay",
        );

        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Push reconnect cancelled");
                return None;
            }
            result = client.connect() => match result {
                Ok(stream) => {
                    tracing::info!(attempt, "Reconnected to push relay");
                    return Some(stream);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Push reconnect attempt {attempt} failed");
                }
            }
        }

        delay = next_delay(delay, config);
    }
}
