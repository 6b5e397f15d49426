//! Per-viewer connection state and socket tasks.
//!
//! Each accepted WebSocket gets a dedicated read task and write task plus
//! an unbounded outbound channel between the hub and the write task. The
//! channel preserves send order, so the welcome, the snapshot, replies,
//! and broadcast records reach the viewer exactly in the order the hub
//! queued them.

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use crate::hub::events::HubEvent;
use crate::hub::messages::{self, ViewerCommand};

/// Hub-side handle to one connected viewer.
pub struct ViewerConn {
    pub viewer_id: String,
    outbound_tx: UnboundedSender<String>,
    read_handle: Option<JoinHandle<()>>,
    write_handle: Option<JoinHandle<()>>,
}

impl ViewerConn {
    /// Take ownership of an upgraded socket and spawn its I/O tasks.
    ///
    /// Socket failures are reported back to the hub as
    /// [`HubEvent::ViewerDisconnected`]; nothing here touches hub state
    /// directly.
    pub fn new(viewer_id: String, socket: WebSocket, event_tx: UnboundedSender<HubEvent>) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (sink, stream) = socket.split();

        let write_handle = tokio::spawn(write_loop(
            viewer_id.clone(),
            sink,
            outbound_rx,
            event_tx.clone(),
        ));
        let read_handle = tokio::spawn(read_loop(
            viewer_id.clone(),
            stream,
            outbound_tx.clone(),
            event_tx,
        ));

        Self {
            viewer_id,
            outbound_tx,
            read_handle: Some(read_handle),
            write_handle: Some(write_handle),
        }
    }

    /// Queue one serialized message for this viewer.
    ///
    /// Returns `false` if the write task is gone; the caller treats that as
    /// a failed session.
    pub fn send(&self, json: String) -> bool {
        self.outbound_tx.send(json).is_ok()
    }

    /// Tear down the socket tasks. Called on removal; idempotent because
    /// aborting a finished task is a no-op.
    pub fn disconnect(mut self) {
        if let Some(handle) = self.read_handle.take() {
            handle.abort();
        }
        if let Some(handle) = self.write_handle.take() {
            handle.abort();
        }
    }

    /// A connection with no socket behind it, for hub loop tests.
    /// Messages "sent" to it are observable on the returned receiver.
    #[cfg(test)]
    pub fn stub(viewer_id: &str) -> (Self, UnboundedReceiver<String>) {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        (
            Self {
                viewer_id: viewer_id.to_string(),
                outbound_tx,
                read_handle: None,
                write_handle: None,
            },
            outbound_rx,
        )
    }
}

/// Drain the outbound channel into the socket until either side fails.
async fn write_loop<S>(
    viewer_id: String,
    mut sink: S,
    mut outbound_rx: UnboundedReceiver<String>,
    event_tx: UnboundedSender<HubEvent>,
) where
    S: futures_util::Sink<Message, Error = axum::Error> + Unpin,
{
    while let Some(text) = outbound_rx.recv().await {
        if let Err(e) = sink.send(Message::Text(text.into())).await {
            log::info!("[hub] {viewer_id} send failed: {e}");
            let _ = event_tx.send(HubEvent::ViewerDisconnected { viewer_id });
            return;
        }
    }
}

/// Parse inbound frames until the socket closes.
///
/// Pings are answered directly through the outbound channel so the pong
/// shares the FIFO with everything else the hub has queued.
async fn read_loop<S>(
    viewer_id: String,
    mut stream: S,
    outbound_tx: UnboundedSender<String>,
    event_tx: UnboundedSender<HubEvent>,
) where
    S: futures_util::Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    loop {
        match stream.next().await {
            Some(Ok(Message::Text(text))) => {
                let value: serde_json::Value = match serde_json::from_str(text.as_str()) {
                    Ok(value) => value,
                    Err(e) => {
                        log::warn!("[hub] {viewer_id} sent invalid JSON: {e}");
                        continue;
                    }
                };
                match ViewerCommand::parse(&value) {
                    ViewerCommand::Ping => {
                        let _ = outbound_tx.send(messages::pong().to_string());
                    }
                    command => {
                        let _ = event_tx.send(HubEvent::ViewerMessage {
                            viewer_id: viewer_id.clone(),
                            command,
                        });
                    }
                }
            }
            Some(Ok(Message::Close(_))) | None => break,
            Some(Ok(_)) => {} // binary and protocol-level ping/pong frames
            Some(Err(e)) => {
                log::info!("[hub] {viewer_id} read failed: {e}");
                break;
            }
        }
    }
    let _ = event_tx.send(HubEvent::ViewerDisconnected { viewer_id });
}
