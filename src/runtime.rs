//! Wires the whole hub together: listeners, broadcast loop, producers.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::hub::Hub;
use crate::server;
use crate::supervisor::Supervisor;

/// A fully started hub. Dropping it does not stop anything; call
/// [`Running::shutdown`].
pub struct Running {
    /// Actual bound address of the WebSocket listener (useful with port 0).
    pub ws_addr: SocketAddr,
    /// Actual bound address of the asset listener.
    pub http_addr: SocketAddr,
    shutdown: CancellationToken,
    hub_task: JoinHandle<()>,
    ws_task: JoinHandle<Result<()>>,
    asset_task: JoinHandle<Result<()>>,
    supervisor: Supervisor,
}

/// Bind both listeners, start the hub loop, and launch the producers.
///
/// Failing to bind a port is fatal; a missing frontend or daemons
/// directory is not.
pub async fn start(config: &Config, shutdown: CancellationToken) -> Result<Running> {
    let ws_listener = TcpListener::bind(("0.0.0.0", config.ws_port))
        .await
        .with_context(|| format!("bind WebSocket port {}", config.ws_port))?;
    let http_listener = TcpListener::bind(("0.0.0.0", config.http_port))
        .await
        .with_context(|| format!("bind HTTP port {}", config.http_port))?;
    let ws_addr = ws_listener.local_addr().context("ws listener address")?;
    let http_addr = http_listener.local_addr().context("http listener address")?;

    let (hub, record_tx, event_tx) =
        Hub::new(config.desktop_dir(), config.queue_capacity, shutdown.clone());
    let hub_task = tokio::spawn(hub.run());

    // record_tx moves in whole: the queue closes when the last reader exits.
    let supervisor = Supervisor::launch(config, record_tx, shutdown.clone());

    let ws_task = tokio::spawn(server::serve(
        ws_listener,
        server::ws_router(event_tx),
        shutdown.clone(),
    ));
    let asset_task = tokio::spawn(server::serve(
        http_listener,
        server::asset_router(config.frontend_dir.clone()),
        shutdown.clone(),
    ));

    log::info!("[ws] Listening on ws://{ws_addr}/ws");
    log::info!("[http] Serving {} on http://{http_addr}", config.frontend_dir.display());

    Ok(Running {
        ws_addr,
        http_addr,
        shutdown,
        hub_task,
        ws_task,
        asset_task,
        supervisor,
    })
}

impl Running {
    /// Stop everything: cancel the token, wait for the listeners and the
    /// hub loop, then tear down producer tasks.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        match self.ws_task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => log::warn!("[ws] Listener failed: {e:#}"),
            Err(e) => log::warn!("[ws] Listener task panicked: {e}"),
        }
        match self.asset_task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => log::warn!("[http] Listener failed: {e:#}"),
            Err(e) => log::warn!("[http] Listener task panicked: {e}"),
        }
        if let Err(e) = self.hub_task.await {
            log::warn!("[hub] Hub task failed: {e}");
        }
        self.supervisor.abort();
        log::info!("[hub] Shutdown complete");
    }
}
