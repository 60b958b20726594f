//! WebSocket client for the push relay.
//!
//! [`PushClient`] holds the relay URL, the session's origin tag and the
//! backoff settings. [`PushClient::spawn`] starts the background session
//! task and hands back a [`PushHandle`] for publishing.

use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

use talio_events::push::{OriginTag, PushEnvelope, PushPayload};

use crate::error::PushError;
use crate::push::processor::{pump_frames, PumpExit};
use crate::push::reconnect::{reconnect_loop, ReconnectConfig};
use crate::ui_loop::UiEvent;

/// Raw relay socket.
pub type PushStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct PushClient {
    ws_url: String,
    origin: OriginTag,
    reconnect: ReconnectConfig,
}

impl PushClient {
    pub fn new(ws_url: String, origin: OriginTag, reconnect: ReconnectConfig) -> Self {
        Self {
            ws_url,
            origin,
            reconnect,
        }
    }

    pub fn ws_url(&self) -> &str {
        &self.ws_url
    }

    pub fn origin(&self) -> OriginTag {
        self.origin
    }

    /// Open one relay connection.
    pub async fn connect(&self) -> Result<PushStream, PushError> {
        let (stream, _response) = connect_async(self.ws_url.as_str()).await.map_err(|e| {
            let url = &self.ws_url;
            PushError::Connection(format!("Failed to connect to push relay at {url}: {e}"))
        })?;

        tracing::info!(origin = %self.origin, "Connected to push relay at {}", self.ws_url);
        Ok(stream)
    }

    /// Start the push session in the background.
    ///
    /// Inbound frames are forwarded to `ui_tx` as [`UiEvent::PushRaw`].
    /// Every loss of the relay, including a failed first connect, is
    /// reported once as [`UiEvent::PushDisconnected`].
    pub fn spawn(
        self,
        ui_tx: mpsc::UnboundedSender<UiEvent>,
        cancel: CancellationToken,
    ) -> PushHandle {
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (connected_tx, connected_rx) = watch::channel(false);
        let handle = PushHandle {
            origin: self.origin,
            out_tx,
            connected: connected_rx,
            cancel: cancel.clone(),
        };

        tokio::spawn(async move {
            tracing::info!(origin = %self.origin, "Starting push session");
            run_session(&self, &ui_tx, out_rx, &connected_tx, &cancel).await;
            tracing::info!(origin = %self.origin, "Push session exited");
        });

        handle
    }
}

/// Connect, pump frames until the socket drops, reconnect. Repeat until
/// cancelled.
async fn run_session(
    client: &PushClient,
    ui_tx: &mpsc::UnboundedSender<UiEvent>,
    mut out_rx: mpsc::UnboundedReceiver<String>,
    connected_tx: &watch::Sender<bool>,
    cancel: &CancellationToken,
) {
    let mut attempt = tokio::select! {
        _ = cancel.cancelled() => return,
        result = client.connect() => result,
    };

    loop {
        let stream = match attempt {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!(error = %e, "Push relay unavailable, entering reconnect loop");
                let _ = ui_tx.send(UiEvent::PushDisconnected);
                match reconnect_loop(client, &client.reconnect, cancel).await {
                    Some(stream) => stream,
                    None => return,
                }
            }
        };

        // Frames queued while the relay was down were refused by publish;
        // anything left over belongs to the previous socket.
        while out_rx.try_recv().is_ok() {}
        connected_tx.send_replace(true);

        let exit = pump_frames(stream, ui_tx, &mut out_rx, cancel).await;
        connected_tx.send_replace(false);

        match exit {
            PumpExit::Cancelled | PumpExit::HandleDropped => return,
            PumpExit::SocketClosed => {}
        }
        if cancel.is_cancelled() {
            return;
        }

        tracing::info!("Push relay connection lost, entering reconnect loop");
        let _ = ui_tx.send(UiEvent::PushDisconnected);
        match reconnect_loop(client, &client.reconnect, cancel).await {
            Some(stream) => attempt = Ok(stream),
            None => return,
        }
    }
}

/// Publishing side of a push session.
#[derive(Debug, Clone)]
pub struct PushHandle {
    origin: OriginTag,
    out_tx: mpsc::UnboundedSender<String>,
    connected: watch::Receiver<bool>,
    cancel: CancellationToken,
}

impl PushHandle {
    /// A handle over a bare channel, with no socket behind it.
    ///
    /// Reports itself connected; frames land on the returned receiver.
    pub fn channel(origin: OriginTag) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        // The receiver keeps the last value once the sender is gone.
        let (_, connected) = watch::channel(true);
        let handle = Self {
            origin,
            out_tx,
            connected,
            cancel: CancellationToken::new(),
        };
        (handle, out_rx)
    }

    pub fn origin(&self) -> OriginTag {
        self.origin
    }

    pub fn is_connected(&self) -> bool {
        *self.connected.borrow()
    }

    /// Stamp `payload` with this session's origin and queue it.
    pub fn publish(&self, payload: &PushPayload) -> Result<(), PushError> {
        if !self.is_connected() {
            return Err(PushError::Closed);
        }
        let text = PushEnvelope::new(payload, self.origin)
            .and_then(|envelope| envelope.to_text())
            .map_err(|e| PushError::Protocol(e.to_string()))?;
        self.out_tx.send(text).map_err(|_| PushError::Closed)?;
        tracing::debug!(topic = %payload.topic(), id = payload.entity_id(), "Queued push");
        Ok(())
    }

    /// Stop the session task.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}
