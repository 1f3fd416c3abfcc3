#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter for the Claimfield capture engine.

mod config;
mod script;

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use claimfield_core::Bounds;
use claimfield_partition::GridSpec;
use claimfield_session::{protocol, GameSession};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::CliConfig;

const DEFAULT_LOG_FILTER: &str = "warn";

/// Claimfield - replay and inspect location-driven capture games
#[derive(Parser, Debug)]
#[command(name = "claimfield")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML file providing `email` and `log_filter`
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Tracing filter directives, overriding the config file and RUST_LOG
    #[arg(long, global = true)]
    log_filter: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a scripted session against a full-state snapshot
    Replay {
        /// JSON snapshot sent by the server when joining
        snapshot: PathBuf,

        /// JSON-lines script of location samples and server messages
        script: PathBuf,

        /// Email of the local player
        #[arg(short, long)]
        email: Option<String>,
    },

    /// Print how a rectangle is partitioned into cells
    Grid {
        /// Northern edge in degrees
        #[arg(long, allow_hyphen_values = true)]
        north: f64,

        /// Southern edge in degrees
        #[arg(long, allow_hyphen_values = true)]
        south: f64,

        /// Eastern edge in degrees
        #[arg(long, allow_hyphen_values = true)]
        east: f64,

        /// Western edge in degrees
        #[arg(long, allow_hyphen_values = true)]
        west: f64,

        /// Desired cell edge in meters
        #[arg(long)]
        cell_size: f64,

        /// Also print every grid line as a pair of positions
        #[arg(long)]
        lines: bool,
    },
}

/// Entry point for the Claimfield command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    let file_config = match &args.config {
        Some(path) => CliConfig::load(path)?,
        None => CliConfig::default(),
    };
    let email_flag = match &args.command {
        Commands::Replay { email, .. } => email.clone(),
        Commands::Grid { .. } => None,
    };
    let config = file_config.overridden_by(email_flag, args.log_filter);
    init_tracing(config.log_filter.as_deref())?;

    match args.command {
        Commands::Replay {
            snapshot, script, ..
        } => {
            let email = config.email.ok_or_else(|| {
                anyhow!("no player email given; pass --email or set it in the config")
            })?;
            run_replay(&email, &snapshot, &script)
        }
        Commands::Grid {
            north,
            south,
            east,
            west,
            cell_size,
            lines,
        } => run_grid(Bounds::new(north, south, east, west), cell_size, lines),
    }
}

fn init_tracing(filter: Option<&str>) -> Result<()> {
    let filter = match filter {
        Some(directives) => EnvFilter::try_new(directives)
            .with_context(|| format!("invalid log filter `{directives}`"))?,
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn run_replay(email: &str, snapshot_path: &Path, script_path: &Path) -> Result<()> {
    let contents = fs::read_to_string(snapshot_path)
        .with_context(|| format!("failed to read snapshot {}", snapshot_path.display()))?;
    let snapshot = protocol::decode_snapshot(&contents)
        .with_context(|| format!("failed to decode snapshot {}", snapshot_path.display()))?;
    let mut session = GameSession::from_snapshot(email, &snapshot)
        .context("snapshot does not describe a playable game")?;
    let steps = script::load(script_path)?;
    info!(steps = steps.len(), "replaying script");

    for command in script::replay(&mut session, &steps) {
        println!("{}", protocol::encode_command(&command)?);
    }

    for (team, score) in session.scoreboard() {
        eprintln!("{team}: {score}");
    }
    eprintln!("unclaimed: {}", session.unclaimed_count());
    eprintln!("state: {:?}", session.lifecycle());
    if let Some(winner) = session.winner() {
        eprintln!("winner: {winner}");
    }
    Ok(())
}

fn run_grid(bounds: Bounds, cell_size: f64, lines: bool) -> Result<()> {
    let grid = GridSpec::new(bounds, cell_size).context("rectangle cannot be partitioned")?;
    println!(
        "{} x {} cells of {:.2} m x {:.2} m ({:.2} m x {:.2} m area)",
        grid.x_cells(),
        grid.y_cells(),
        grid.cell_width_meters(),
        grid.cell_height_meters(),
        grid.width_meters(),
        grid.height_meters(),
    );
    if lines {
        for (start, end) in grid.grid_lines() {
            println!(
                "{:.7},{:.7} -> {:.7},{:.7}",
                start.latitude, start.longitude, end.latitude, end.longitude
            );
        }
    }
    Ok(())
}
