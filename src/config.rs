//! Configuration loading.
//!
//! Reads `config.json` from the platform config directory, falls back to
//! defaults matching the original deployment layout, then applies
//! `NARRATIVE_*` environment variable overrides (for tests and ad-hoc runs).

use std::path::PathBuf;
use std::{env, fs};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Configuration for the Narrative OS hub.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct Config {
    /// Port for the viewer WebSocket listener.
    pub ws_port: u16,
    /// Port for the static asset listener.
    pub http_port: u16,
    /// Directory scanned for `daemon_*` producer executables at startup.
    pub daemons_dir: PathBuf,
    /// Directory served read-only to the viewer frontend.
    pub frontend_dir: PathBuf,
    /// Simulated user's home; the watched desktop is `<home>/Desktop`.
    pub user_home: PathBuf,
    /// Bounded capacity of the merge queue between readers and the hub.
    pub queue_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ws_port: 8765,
            http_port: 8080,
            daemons_dir: PathBuf::from("/opt/narrative-os/daemons"),
            frontend_dir: PathBuf::from("/opt/narrative-os/frontend"),
            user_home: PathBuf::from("/home/mira"),
            queue_capacity: 256,
        }
    }
}

impl Config {
    /// Returns the configuration directory, creating it if necessary.
    ///
    /// `NARRATIVE_CONFIG_DIR` overrides the platform default.
    pub fn config_dir() -> Result<PathBuf> {
        let dir = if let Ok(dir) = env::var("NARRATIVE_CONFIG_DIR") {
            PathBuf::from(dir)
        } else {
            dirs::config_dir()
                .context("could not determine config directory")?
                .join("narrative-os")
        };
        fs::create_dir_all(&dir)
            .with_context(|| format!("create config dir {}", dir.display()))?;
        Ok(dir)
    }

    /// Loads configuration from file, with environment variable overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from_file().unwrap_or_default();
        config.apply_env_overrides();
        Ok(config)
    }

    fn load_from_file() -> Result<Self> {
        let config_path = Self::config_dir()?.join("config.json");
        if config_path.exists() {
            let content = fs::read_to_string(&config_path)
                .with_context(|| format!("read {}", config_path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("parse {}", config_path.display()))
        } else {
            anyhow::bail!("config file not found")
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Some(port) = env_parse("NARRATIVE_WS_PORT") {
            self.ws_port = port;
        }
        if let Some(port) = env_parse("NARRATIVE_HTTP_PORT") {
            self.http_port = port;
        }
        if let Ok(dir) = env::var("NARRATIVE_DAEMONS_DIR") {
            self.daemons_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = env::var("NARRATIVE_FRONTEND_DIR") {
            self.frontend_dir = PathBuf::from(dir);
        }
        if let Ok(home) = env::var("NARRATIVE_USER_HOME") {
            self.user_home = PathBuf::from(home);
        }
        if let Some(capacity) = env_parse("NARRATIVE_QUEUE_CAPACITY") {
            self.queue_capacity = capacity;
        }
    }

    /// The watched directory whose state is snapshotted for new viewers.
    pub fn desktop_dir(&self) -> PathBuf {
        self.user_home.join("Desktop")
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}
