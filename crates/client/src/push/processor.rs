//! Frame pump for one relay connection.
//!
//! Reads frames from the socket and forwards text frames to the UI loop
//! untouched; parsing and origin filtering happen there so every frame
//! goes through the same dispatcher. Outbound frames queued by
//! [`PushHandle::publish`](crate::push::PushHandle::publish) are written to
//! the socket from the same task.

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use crate::push::client::PushStream;
use crate::ui_loop::UiEvent;

/// Why [`pump_frames`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpExit {
    /// The relay closed the socket or a read/write failed.
    SocketClosed,
    Cancelled,
    /// Every [`PushHandle`](crate::push::PushHandle) or the UI loop is gone.
    HandleDropped,
}

/// Pump frames until the socket closes, the session is cancelled or the
/// other side of a channel goes away.
pub async fn pump_frames(
    stream: PushStream,
    ui_tx: &mpsc::UnboundedSender<UiEvent>,
    out_rx: &mut mpsc::UnboundedReceiver<String>,
    cancel: &CancellationToken,
) -> PumpExit {
    let (mut sink, mut source) = stream.split();

    let exit = loop {
        tokio::select! {
            _ = cancel.cancelled() => break PumpExit::Cancelled,
            outbound = out_rx.recv() => {
                let Some(text) = outbound else {
                    break PumpExit::HandleDropped;
                };
                if let Err(e) = sink.send(Message::Text(text)).await {
                    tracing::warn!(error = %e, "Push send failed");
                    break PumpExit::SocketClosed;
                }
            }
            inbound = source.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    if ui_tx.send(UiEvent::PushRaw(text)).is_err() {
                        break PumpExit::HandleDropped;
                    }
                }
                Some(Ok(Message::Binary(_))) => {
                    tracing::warn!("Ignoring binary push frame");
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => {}
                Some(Ok(Message::Close(frame))) => {
                    tracing::info!(?frame, "Push relay closed the connection");
                    break PumpExit::SocketClosed;
                }
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "Push receive error");
                    break PumpExit::SocketClosed;
                }
                None => break PumpExit::SocketClosed,
            }
        }
    };

    if exit == PumpExit::Cancelled {
        let _ = sink.send(Message::Close(None)).await;
    }
    exit
}
