//! Producer process supervision.
//!
//! Discovers `daemon_*` executables in the configured directory, launches
//! each as an independent child process with captured stdout/stderr, and
//! attaches one ingestion reader per output stream. A producer that fails
//! to launch is logged and skipped; a producer that exits is logged and
//! left dead (no restart) - the rest of the system continues unaffected.
//!
//! The supervisor never touches the merge queue itself; it only hands
//! clones of the queue sender to the readers it spawns.

use std::path::Path;
use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::ingest;
use crate::record::Record;

/// Launch description for one producer process.
struct ProducerSpec {
    name: String,
    command: Command,
}

/// Owns the launched producer set for the lifetime of the hub.
pub struct Supervisor {
    names: Vec<String>,
    tasks: Vec<JoinHandle<()>>,
}

impl Supervisor {
    /// Discover and launch all producers, wiring their readers to the
    /// merge queue.
    ///
    /// `record_tx` is consumed: once every reader clone is handed out the
    /// original is dropped, so the queue closes when the last reader exits.
    pub fn launch(
        config: &Config,
        record_tx: mpsc::Sender<Record>,
        shutdown: CancellationToken,
    ) -> Self {
        let mut specs = discover(&config.daemons_dir);
        if specs.is_empty() {
            log::warn!(
                "[daemon] No producers found in {}, using built-in daemons",
                config.daemons_dir.display()
            );
            specs = builtin_specs();
        }
        log::info!("[daemon] Found {} producers", specs.len());

        let mut names = Vec::new();
        let mut tasks = Vec::new();
        for spec in specs {
            let name = spec.name.clone();
            match spawn_producer(spec, record_tx.clone(), shutdown.clone()) {
                Ok(mut handles) => {
                    log::info!("[daemon] Started {name}");
                    names.push(name);
                    tasks.append(&mut handles);
                }
                Err(e) => {
                    // Non-fatal: continue with the remaining producers.
                    log::error!("[daemon] Failed to start {name}: {e:#}");
                }
            }
        }

        Self { names, tasks }
    }

    /// Number of producers that launched successfully.
    pub fn producer_count(&self) -> usize {
        self.names.len()
    }

    /// Abort all reader and waiter tasks. Children are killed via the
    /// cancellation token (or `kill_on_drop` as a backstop).
    pub fn abort(self) {
        for task in self.tasks {
            task.abort();
        }
    }
}

/// Scan the daemons directory for `daemon_*` files.
fn discover(dir: &Path) -> Vec<ProducerSpec> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("[daemon] Cannot read {}: {e}", dir.display());
            return Vec::new();
        }
    };

    let mut specs = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        if !path.is_file() || !name.starts_with("daemon_") {
            continue;
        }
        // Strip the extension so logs read "daemon_chaos", not "daemon_chaos.sh"
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or(name);
        specs.push(ProducerSpec {
            name: stem,
            command: Command::new(&path),
        });
    }
    specs.sort_by(|a, b| a.name.cmp(&b.name));
    specs
}

/// Built-in producers, re-invoked as `narrative-hub daemon <kind>`.
fn builtin_specs() -> Vec<ProducerSpec> {
    let exe = match std::env::current_exe() {
        Ok(exe) => exe,
        Err(e) => {
            log::error!("[daemon] Cannot resolve own executable: {e}");
            return Vec::new();
        }
    };

    ["chaos", "journal", "watcher"]
        .into_iter()
        .map(|kind| {
            let mut command = Command::new(&exe);
            command.arg("daemon").arg(kind);
            ProducerSpec {
                name: format!("daemon_{kind}"),
                command,
            }
        })
        .collect()
}

/// Spawn one producer and its reader/waiter tasks.
///
/// Both stdout and stderr are drained through the same ingestion path, so
/// records and diagnostics behave identically whichever stream a producer
/// writes them to.
fn spawn_producer(
    mut spec: ProducerSpec,
    record_tx: mpsc::Sender<Record>,
    shutdown: CancellationToken,
) -> Result<Vec<JoinHandle<()>>> {
    spec.command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = spec.command.spawn().context("spawn producer process")?;
    let stdout = child.stdout.take().context("producer stdout not captured")?;
    let stderr = child.stderr.take().context("producer stderr not captured")?;

    let stdout_reader =
        tokio::spawn(ingest::run_reader(spec.name.clone(), stdout, record_tx.clone()));
    let stderr_reader = tokio::spawn(ingest::run_reader(spec.name.clone(), stderr, record_tx));
    let waiter = tokio::spawn(wait_for_exit(spec.name, child, shutdown));

    Ok(vec![stdout_reader, stderr_reader, waiter])
}

/// Log the producer's exit, or kill it when the hub shuts down.
async fn wait_for_exit(name: String, mut child: Child, shutdown: CancellationToken) {
    tokio::select! {
        status = child.wait() => match status {
            Ok(status) => log::info!("[daemon] {name} exited: {status}"),
            Err(e) => log::error!("[daemon] {name} wait failed: {e}"),
        },
        _ = shutdown.cancelled() => {
            if let Err(e) = child.kill().await {
                log::debug!("[daemon] {name} kill failed: {e}");
            } else {
                log::info!("[daemon] {name} stopped");
            }
        }
    }
}
