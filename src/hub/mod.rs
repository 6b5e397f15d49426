//! The broadcast hub.
//!
//! Single task owning the viewer membership set. It drains the merge queue
//! and fans each record out to every connected viewer, handles membership
//! events from the listener and socket tasks, and greets each new viewer
//! with a welcome message plus a fresh snapshot of the watched directory.
//!
//! One slow or dead viewer never blocks the others: per-viewer delivery is
//! an unbounded channel drained by that viewer's own write task, and a
//! failed send just removes that one viewer.

pub mod events;
pub mod messages;
pub mod viewer;

use std::collections::HashMap;
use std::path::PathBuf;

use tokio::sync::mpsc::{self, UnboundedSender};
use tokio_util::sync::CancellationToken;

use crate::record::Record;
use crate::snapshot;

pub use events::HubEvent;
pub use viewer::ViewerConn;

pub struct Hub {
    viewers: HashMap<String, ViewerConn>,
    watch_dir: PathBuf,
    record_rx: mpsc::Receiver<Record>,
    event_rx: mpsc::UnboundedReceiver<HubEvent>,
    shutdown: CancellationToken,
    // Set once every producer reader has exited and the merge queue closed.
    record_done: bool,
}

impl Hub {
    /// Build the hub and its two inbound channels.
    ///
    /// The returned bounded sender is the merge queue write side for the
    /// ingestion readers; the unbounded sender carries membership and
    /// viewer-message events from the socket layer.
    pub fn new(
        watch_dir: PathBuf,
        queue_capacity: usize,
        shutdown: CancellationToken,
    ) -> (Self, mpsc::Sender<Record>, UnboundedSender<HubEvent>) {
        let (record_tx, record_rx) = mpsc::channel(queue_capacity);
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        (
            Self {
                viewers: HashMap::new(),
                watch_dir,
                record_rx,
                event_rx,
                shutdown,
                record_done: false,
            },
            record_tx,
            event_tx,
        )
    }

    /// Drive the hub until shutdown.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                record = self.record_rx.recv(), if !self.record_done => match record {
                    Some(record) => self.broadcast(&record),
                    None => {
                        // All producers gone. Keep serving viewers.
                        log::info!("[hub] All producers ended");
                        self.record_done = true;
                    }
                },
                event = self.event_rx.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => break,
                },
                _ = self.shutdown.cancelled() => break,
            }
        }

        log::info!("[hub] Shutting down with {} viewers connected", self.viewers.len());
        for (_, conn) in self.viewers.drain() {
            conn.disconnect();
        }
    }

    fn handle_event(&mut self, event: HubEvent) {
        match event {
            HubEvent::ViewerConnected { viewer_id, conn } => self.add_viewer(viewer_id, conn),
            HubEvent::ViewerDisconnected { viewer_id } => self.remove_viewer(&viewer_id),
            HubEvent::ViewerMessage { viewer_id, command } => {
                // Pings are answered in the socket read task; what reaches
                // here is informational.
                log::info!("[hub] {viewer_id}: {command:?}");
            }
        }
    }

    /// Serialize once, deliver to every viewer, drop the ones that failed.
    fn broadcast(&mut self, record: &Record) {
        let json = match serde_json::to_string(record) {
            Ok(json) => json,
            Err(e) => {
                log::error!("[hub] Failed to serialize record {}: {e}", record.kind);
                return;
            }
        };
        log::debug!("[hub] Broadcasting {} to {} viewers", record.kind, self.viewers.len());

        let failed: Vec<String> = self
            .viewers
            .iter()
            .filter(|(_, conn)| !conn.send(json.clone()))
            .map(|(id, _)| id.clone())
            .collect();
        for viewer_id in failed {
            log::info!("[hub] Dropping unreachable viewer {viewer_id}");
            self.remove_viewer(&viewer_id);
        }
    }

    /// Register a viewer and queue its welcome and snapshot.
    fn add_viewer(&mut self, viewer_id: String, conn: ViewerConn) {
        log::info!("[hub] Viewer {viewer_id} connected ({} total)", self.viewers.len() + 1);

        conn.send(messages::connected().to_string());
        match snapshot::capture(&self.watch_dir) {
            Ok(entries) => {
                conn.send(messages::filesystem_state(&entries).to_string());
            }
            Err(e) => {
                // Snapshot is best-effort; the viewer still gets the stream.
                log::warn!("[hub] Snapshot unavailable for {viewer_id}: {e:#}");
            }
        }
        self.viewers.insert(viewer_id, conn);
    }

    /// Remove a viewer. Repeat removals of the same id are no-ops.
    fn remove_viewer(&mut self, viewer_id: &str) {
        if let Some(conn) = self.viewers.remove(viewer_id) {
            conn.disconnect();
            log::info!("[hub] Viewer {viewer_id} disconnected ({} total)", self.viewers.len());
        }
    }

    #[cfg(test)]
    fn viewer_count(&self) -> usize {
        self.viewers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, Value};

    fn test_hub(watch_dir: PathBuf) -> Hub {
        let (hub, _record_tx, _event_tx) = Hub::new(watch_dir, 8, CancellationToken::new());
        hub
    }

    fn record(kind: &str) -> Record {
        Record::now(kind, Map::new())
    }

    #[tokio::test]
    async fn test_add_viewer_sends_welcome_then_snapshot() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join("notes.txt"), b"hello").unwrap();

        let mut hub = test_hub(tmp.path().to_path_buf());
        let (conn, mut rx) = ViewerConn::stub("viewer:1");
        hub.add_viewer("viewer:1".to_string(), conn);

        let welcome: Value = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
        assert_eq!(welcome["type"], "connected");
        assert_eq!(welcome["message"], messages::GREETING);

        let state: Value = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
        assert_eq!(state["type"], "filesystem_state");
        assert_eq!(state["desktop"][0]["name"], "notes.txt");
        assert_eq!(state["desktop"][0]["size"], 5);
    }

    #[tokio::test]
    async fn test_missing_watch_dir_omits_snapshot_but_keeps_viewer() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut hub = test_hub(tmp.path().join("gone"));
        let (conn, mut rx) = ViewerConn::stub("viewer:1");
        hub.add_viewer("viewer:1".to_string(), conn);

        let welcome: Value = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
        assert_eq!(welcome["type"], "connected");
        assert!(rx.try_recv().is_err());
        assert_eq!(hub.viewer_count(), 1);

        // Still receives broadcasts.
        hub.broadcast(&record("journal_entry"));
        let rec: Value = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
        assert_eq!(rec["type"], "journal_entry");
    }

    #[tokio::test]
    async fn test_broadcast_reaches_all_viewers() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut hub = test_hub(tmp.path().to_path_buf());
        let (conn_a, mut rx_a) = ViewerConn::stub("viewer:a");
        let (conn_b, mut rx_b) = ViewerConn::stub("viewer:b");
        hub.add_viewer("viewer:a".to_string(), conn_a);
        hub.add_viewer("viewer:b".to_string(), conn_b);
        // Drain greetings.
        while rx_a.try_recv().is_ok() {}
        while rx_b.try_recv().is_ok() {}

        hub.broadcast(&record("chaos_notification"));
        for rx in [&mut rx_a, &mut rx_b] {
            let rec: Value = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
            assert_eq!(rec["type"], "chaos_notification");
        }
    }

    #[tokio::test]
    async fn test_failed_viewer_is_dropped_others_keep_receiving() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut hub = test_hub(tmp.path().to_path_buf());
        let (conn_ok, mut rx_ok) = ViewerConn::stub("viewer:ok");
        let (conn_dead, rx_dead) = ViewerConn::stub("viewer:dead");
        hub.add_viewer("viewer:ok".to_string(), conn_ok);
        hub.add_viewer("viewer:dead".to_string(), conn_dead);
        drop(rx_dead);
        while rx_ok.try_recv().is_ok() {}

        hub.broadcast(&record("first"));
        hub.broadcast(&record("second"));

        assert_eq!(hub.viewer_count(), 1);
        let kinds: Vec<String> = std::iter::from_fn(|| rx_ok.try_recv().ok())
            .map(|s| serde_json::from_str::<Value>(&s).unwrap()["type"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(kinds, ["first", "second"]);
    }

    #[tokio::test]
    async fn test_remove_viewer_is_idempotent() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut hub = test_hub(tmp.path().to_path_buf());
        let (conn, _rx) = ViewerConn::stub("viewer:1");
        hub.add_viewer("viewer:1".to_string(), conn);

        hub.remove_viewer("viewer:1");
        hub.remove_viewer("viewer:1");
        hub.remove_viewer("viewer:never-existed");
        assert_eq!(hub.viewer_count(), 0);
    }

    #[tokio::test]
    async fn test_run_keeps_serving_after_producers_end() {
        let tmp = tempfile::TempDir::new().unwrap();
        let shutdown = CancellationToken::new();
        let (hub, record_tx, event_tx) =
            Hub::new(tmp.path().to_path_buf(), 8, shutdown.clone());
        let handle = tokio::spawn(hub.run());

        let (conn, mut rx) = ViewerConn::stub("viewer:1");
        event_tx
            .send(HubEvent::ViewerConnected {
                viewer_id: "viewer:1".to_string(),
                conn,
            })
            .unwrap();

        let mut recv_type = |rx: &mut tokio::sync::mpsc::UnboundedReceiver<String>| {
            let msg = rx.try_recv();
            msg.ok()
                .map(|m| serde_json::from_str::<Value>(&m).unwrap()["type"]
                    .as_str()
                    .unwrap()
                    .to_string())
        };

        // Wait for registration to complete before feeding the queue, so
        // the broadcast cannot race the membership event.
        let mut greeted = Vec::new();
        for _ in 0..50 {
            if let Some(kind) = recv_type(&mut rx) {
                greeted.push(kind);
            }
            if greeted.len() == 2 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        assert_eq!(greeted, ["connected", "filesystem_state"]);

        record_tx.send(record("before_eof")).await.unwrap();
        // Close the merge queue: all producers gone.
        drop(record_tx);

        let msg = tokio::time::timeout(std::time::Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out")
            .expect("hub dropped viewer");
        let value: Value = serde_json::from_str(&msg).unwrap();
        assert_eq!(value["type"], "before_eof");

        // Hub still alive and responsive to events after queue closed.
        event_tx
            .send(HubEvent::ViewerDisconnected {
                viewer_id: "viewer:1".to_string(),
            })
            .unwrap();
        shutdown.cancel();
        tokio::time::timeout(std::time::Duration::from_secs(2), handle)
            .await
            .expect("hub did not stop")
            .unwrap();
    }
}
