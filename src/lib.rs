//! Narrative OS hub - the event backbone of the research station
//! simulation.
//!
//! Producer daemons are child processes emitting one JSON record per
//! output line. The hub merges their streams and broadcasts every record
//! to all connected browser viewers over WebSockets, alongside a small
//! static file server for the frontend itself.
//!
//! ```text
//! daemon_chaos ---\
//! daemon_journal --+--> readers --> merge queue --> hub --> viewers (ws)
//! daemon_watcher --/                                 |
//!                                                 snapshot (per connect)
//! ```
//!
//! Module layout:
//! - [`record`]: the line protocol shared by producers and the hub
//! - [`ingest`]: per-stream reader tasks feeding the merge queue
//! - [`supervisor`]: producer discovery and process lifecycle
//! - [`hub`]: the broadcast loop and per-viewer session state
//! - [`server`]: the WebSocket and static asset listeners
//! - [`snapshot`]: watched directory listings for new viewers
//! - [`daemons`]: built-in producers used when none are installed
//! - [`runtime`]: wires all of the above into a running hub

pub mod config;
pub mod daemons;
pub mod hub;
pub mod ingest;
pub mod record;
pub mod runtime;
pub mod server;
pub mod snapshot;
pub mod supervisor;

pub use config::Config;
pub use hub::Hub;
pub use record::Record;
