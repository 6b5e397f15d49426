//! Events delivered to the hub loop.

use crate::hub::messages::ViewerCommand;
use crate::hub::viewer::ViewerConn;

/// Events flowing into the hub from listener and viewer tasks.
///
/// Everything that mutates hub state arrives through this one channel, so
/// the hub loop owns the membership set without locks.
pub enum HubEvent {
    /// A viewer completed the WebSocket handshake.
    ViewerConnected {
        viewer_id: String,
        conn: ViewerConn,
    },
    /// A viewer's socket closed or failed; remove it. Safe to deliver more
    /// than once for the same viewer.
    ViewerDisconnected { viewer_id: String },
    /// A parsed control message from a connected viewer.
    ViewerMessage {
        viewer_id: String,
        command: ViewerCommand,
    },
}
