//! Narrative OS hub binary.
//!
//! `start` runs the hub itself; `daemon <kind>` runs one of the built-in
//! producers as a child process of the hub.

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use narrative_hub::{daemons, runtime, Config};
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "narrative-hub")]
#[command(version)]
#[command(about = "Event hub for the Narrative OS research station simulation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the hub: launch producers, serve viewers and frontend assets
    Start,
    /// Run one built-in producer daemon (normally spawned by the hub)
    Daemon { kind: DaemonKind },
    /// Print the effective configuration
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
enum DaemonKind {
    Chaos,
    Journal,
    Watcher,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Start => run_hub(),
        Commands::Daemon { kind } => {
            let config = Config::load()?;
            match kind {
                DaemonKind::Chaos => daemons::chaos::run(&config.user_home),
                DaemonKind::Journal => daemons::journal::run(),
                DaemonKind::Watcher => daemons::watcher::run(&config.user_home)?,
            }
            Ok(())
        }
        Commands::Config => {
            let config = Config::load()?;
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

fn run_hub() -> Result<()> {
    let config = Config::load()?;

    println!("{}", "=".repeat(50));
    println!("NARRATIVE OS - Research Station Environment");
    println!("{}", "=".repeat(50));

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let shutdown = CancellationToken::new();
        let running = runtime::start(&config, shutdown.clone()).await?;

        tokio::signal::ctrl_c().await?;
        log::info!("[hub] Interrupt received, shutting down");
        running.shutdown().await;
        Ok(())
    })
}
