//! # Till Replay
//!
//! Replays a recorded drawer session scenario and prints the directives it
//! produces, one JSON object per line.
//!
//! ## Usage
//! ```text
//! till-replay scenarios/open_drawer_recovery.json
//! till-replay --config ./till.toml scenarios/no_sale.json
//! RUST_LOG=till=trace till-replay scenarios/no_sale.json
//! ```

mod scenario;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use till_session::{DrawerSession, SessionDriver, TillConfig};

use crate::scenario::Scenario;

#[derive(Debug, Parser)]
#[command(name = "till-replay", version, about = "Replay a recorded drawer session")]
struct Args {
    /// Scenario file (JSON).
    scenario: PathBuf,

    /// Till configuration file. Defaults to the platform config dir.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Pretty-print each directive.
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => TillConfig::load(Some(path.clone()))
            .with_context(|| format!("loading config {}", path.display()))?,
        None => TillConfig::load_or_default(None),
    };
    info!(
        terminal_id = %config.terminal.id,
        tenders = config.tenders.len(),
        "Configuration loaded"
    );

    let scenario = Scenario::from_file(&args.scenario)?;
    let session = DrawerSession::from_config(scenario.workflow, &config);
    let (handle, mut outbound_rx) = SessionDriver::spawn(session);

    let pretty = args.pretty;
    let printer = tokio::spawn(async move {
        let mut count = 0usize;
        while let Some(outbound) = outbound_rx.recv().await {
            let line = if pretty {
                serde_json::to_string_pretty(&outbound)?
            } else {
                serde_json::to_string(&outbound)?
            };
            println!("{line}");
            count += 1;
        }
        Ok::<_, serde_json::Error>(count)
    });

    for (index, step) in scenario.steps.into_iter().enumerate() {
        if handle.send(step).await.is_err() {
            warn!(step = index, "Session stopped before the scenario ended");
            break;
        }
    }
    drop(handle);

    let emitted = printer.await.context("printer task panicked")??;
    info!(emitted, "Replay finished");

    Ok(())
}

/// Logs to stderr so stdout stays machine-readable.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,till=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
