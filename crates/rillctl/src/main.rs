//! `rillctl` — the Rill control tool.
//!
//! Operator entrypoint over the placement and coordination layers: resolve
//! channel placements against a spoke fleet, and inspect or advance the
//! watermark pointers and ring snapshots in the local coordination store.
//!
//! # Usage
//!
//! ```text
//! rillctl placement flights-commercial           # owners of a channel
//! rillctl placement flights -s n0 -s n1 -s n2    # against an ad-hoc fleet
//! rillctl watermark get replication-group-1      # read a watermark
//! rillctl watermark advance group-1 1700000000000 9f3a
//! rillctl watermark delete group-1
//! rillctl rings                                  # persisted ring epochs
//! ```

mod config;
mod telemetry;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rill_coord::{CoordStore, FjallCoordStore, RingLog, WatermarkStore};
use rill_placement::SpokeRing;
use rill_types::{ContentKey, SpokeId};
use tracing::warn;

use config::CliConfig;

#[derive(Parser)]
#[command(
    name = "rillctl",
    version,
    about = "Rill placement and watermark control tool"
)]
struct Cli {
    /// Path to TOML config file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the replica set for a channel.
    Placement {
        /// Channel name to place.
        channel: String,

        /// Spoke id(s) forming the fleet; overrides the configured fleet.
        /// Can be specified multiple times.
        #[arg(short, long)]
        spoke: Vec<String>,
    },

    /// Watermark pointers in the local coordination store.
    Watermark {
        #[command(subcommand)]
        command: WatermarkCommands,
    },

    /// List ring snapshots persisted in the local coordination store.
    Rings,
}

#[derive(Subcommand)]
enum WatermarkCommands {
    /// Read a watermark, initializing it to the zero key if missing.
    Get {
        /// Watermark name.
        name: String,
    },

    /// Advance a watermark if the candidate key is newer.
    Advance {
        /// Watermark name.
        name: String,
        /// Candidate timestamp, unix-epoch milliseconds.
        millis: u64,
        /// Candidate discriminator.
        hash: String,
    },

    /// Delete a watermark.
    Delete {
        /// Watermark name.
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = CliConfig::load(cli.config.as_deref()).context("loading config")?;
    telemetry::init(&config.log.level);

    match cli.command {
        Commands::Placement { channel, spoke } => placement(&config, &channel, spoke),
        Commands::Watermark { command } => watermark(&config, command).await,
        Commands::Rings => rings(&config).await,
    }
}

/// Resolve and print a channel's replica set.
fn placement(config: &CliConfig, channel: &str, overrides: Vec<String>) -> Result<()> {
    let fleet: Vec<SpokeId> = if overrides.is_empty() {
        config.ring.spokes.iter().map(SpokeId::new).collect()
    } else {
        overrides.into_iter().map(SpokeId::new).collect()
    };

    let ring = SpokeRing::new(now_ms(), fleet)
        .context("no spokes configured; set [ring] spokes or pass --spoke")?;
    let replicas = ring.servers(channel);
    for spoke in &replicas {
        println!("{spoke}");
    }
    if replicas.is_under_replicated() {
        warn!(
            channel,
            replicas = replicas.len(),
            "channel is under-replicated on this fleet"
        );
    }
    Ok(())
}

/// Operate on watermark pointers in the local coordination store.
async fn watermark(config: &CliConfig, command: WatermarkCommands) -> Result<()> {
    let store = open_store(config)?;
    let watermarks = WatermarkStore::with_prefix(store, config.watermark_prefix());

    match command {
        WatermarkCommands::Get { name } => {
            let key = watermarks.get(&name, &ContentKey::zero()).await;
            println!("{key}");
        }
        WatermarkCommands::Advance { name, millis, hash } => {
            let candidate = ContentKey::new(millis, hash);
            watermarks.update_increase(&name, &candidate).await;
            let key = watermarks.get(&name, &ContentKey::zero()).await;
            println!("{key}");
        }
        WatermarkCommands::Delete { name } => {
            watermarks.delete(&name).await;
        }
    }
    Ok(())
}

/// Print the persisted ring epochs, oldest first.
async fn rings(config: &CliConfig) -> Result<()> {
    let store = open_store(config)?;
    let log = RingLog::with_prefix(store, config.ring_prefix());
    let history = log
        .load_with_retention(config.retention_ms())
        .await
        .context("replaying ring log")?;

    if history.snapshots().is_empty() {
        println!("no ring snapshots recorded");
        return Ok(());
    }
    for ring in history.snapshots() {
        let until = ring
            .valid_until()
            .map(|u| u.to_string())
            .unwrap_or_else(|| "open".to_string());
        println!(
            "{} .. {}  ({} spokes)",
            ring.valid_from(),
            until,
            ring.spoke_count()
        );
    }
    Ok(())
}

fn open_store(config: &CliConfig) -> Result<Arc<dyn CoordStore>> {
    let dir = config.coord_dir();
    let store = FjallCoordStore::open(&dir)
        .with_context(|| format!("opening coordination store at {}", dir.display()))?;
    Ok(Arc::new(store))
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
