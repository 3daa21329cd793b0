//! Warden ingestion gateway: demo CLI
//!
//! Walks a fully wired gateway through the admission, claim-labeling and
//! elevation paths. Every component is the real implementation; only the
//! knowledge graph contents and the signing key are demo fixtures.
//!
//! Usage:
//!   cargo run -p demo -- run-all
//!   cargo run -p demo -- admission
//!   cargo run -p demo -- claims
//!   cargo run -p demo -- elevation-outage
//!   cargo run -p demo -- --config config/warden.toml run-all

mod scenarios;
mod wiring;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use warden_contracts::{config::WardenConfig, error::WardenResult};

use crate::wiring::Warden;

/// Configuration compiled into the binary, used when `--config` is absent.
const BUILTIN_CONFIG: &str = include_str!("../../config/warden.toml");

// ── CLI definition ────────────────────────────────────────────────────────────

/// Warden: manifest admission, sandbox derivation and claim labeling.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "Warden ingestion gateway demo",
    long_about = "Runs Warden scenarios showing manifest validation, bounded sandbox\n\
                  derivation, trust-gated elevation, claim labeling and the\n\
                  hash-chained claim log."
)]
struct Cli {
    /// Load gateway configuration from a TOML file instead of the built-in one.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run every scenario in sequence against one gateway.
    RunAll,
    /// Scenarios A and B plus rejection, denial and duplicate-session cases.
    Admission,
    /// Scenario C: one claim per verification label.
    Claims,
    /// Elevation budget, oracle outage and re-admission continuity.
    ElevationOutage,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Set RUST_LOG=debug for per-claim and per-derivation detail.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    print_banner();

    match run(cli).await {
        Ok(()) => println!("All selected scenarios completed successfully."),
        Err(e) => {
            eprintln!("Demo error: {}", e);
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> WardenResult<()> {
    let config = load_config(cli.config.as_ref())?;
    let warden = Warden::build(&config)?;
    info!(
        cpu_ceiling = config.ceilings.cpu,
        memory_ceiling_gb = config.ceilings.memory_gb,
        "gateway assembled"
    );

    match cli.command {
        Command::RunAll => {
            scenarios::admission::run_scenario(&warden)?;
            scenarios::claims::run_scenario(&warden).await?;
            scenarios::elevation_outage::run_scenario(&warden).await
        }
        Command::Admission => scenarios::admission::run_scenario(&warden),
        Command::Claims => scenarios::claims::run_scenario(&warden).await,
        Command::ElevationOutage => scenarios::elevation_outage::run_scenario(&warden).await,
    }
}

fn load_config(path: Option<&PathBuf>) -> WardenResult<WardenConfig> {
    match path {
        Some(path) => warden_policy::config::from_file(path),
        None => warden_policy::config::from_toml_str(BUILTIN_CONFIG),
    }
}

fn print_banner() {
    println!();
    println!("╔══════════════════════════════════════════════════════════╗");
    println!("║                 WARDEN INGESTION GATEWAY                 ║");
    println!("║     validate · derive · label · anchor · never punish    ║");
    println!("╚══════════════════════════════════════════════════════════╝");
    println!();
}
