mod sim;

use anyhow::{Context, Result};
use clap::Parser;
use dco_task::TaskConfig;
use dco_timing::{HighPrecisionTimer, ManualTimer, Timer};
use rand::SeedableRng;
use rand::rngs::StdRng;
use sim::{Simulation, Subject, Tally};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Runs blocks of the delayed center-out, out-center task against a simulated subject
#[derive(Debug, Parser)]
#[command(name = "dco-sim", version, about)]
struct Cli {
    /// Task configuration (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Target parameter set (JSON array), overrides the config's targets_path
    #[arg(long)]
    targets: Option<PathBuf>,

    /// Number of trials to complete before ending the block
    #[arg(long, default_value_t = 20)]
    trials: usize,

    /// Seed for target selection and subject behaviour
    #[arg(long)]
    seed: Option<u64>,

    /// Sleep on the wall clock instead of advancing a virtual one
    #[arg(long)]
    realtime: bool,

    /// Simulation tick in milliseconds
    #[arg(long, default_value_t = 10)]
    tick_ms: u64,

    /// Probability that the subject leaves the outer target during hold_b
    #[arg(long, default_value_t = 0.2)]
    lapse_rate: f64,

    /// Cursor speed in workspace units per second
    #[arg(long, default_value_t = 4.0)]
    speed: f64,

    /// Emit logs as JSON lines
    #[arg(long)]
    json: bool,

    /// Write the block summary as JSON to this file
    #[arg(long)]
    summary: Option<PathBuf>,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().with_target(false)).init();
    }
}

fn load_config(cli: &Cli) -> Result<TaskConfig> {
    let mut config = match &cli.config {
        Some(path) => TaskConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => TaskConfig::default(),
    };
    if let Some(path) = &cli.targets {
        config.targets_path = Some(path.clone());
    }
    Ok(config)
}

fn rng(seed: Option<u64>, stream: u64) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(stream)),
        None => StdRng::from_os_rng(),
    }
}

fn simulate<T: Timer<Timestamp = u64>>(cli: &Cli, config: TaskConfig, timer: T) -> Result<Tally> {
    let subject = Subject::new(rng(cli.seed, 1), cli.speed, cli.lapse_rate);
    let mut simulation = Simulation::new(
        config,
        rng(cli.seed, 0),
        subject,
        timer,
        Duration::from_millis(cli.tick_ms),
    );
    simulation.run(cli.trials)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json);

    if !(0.0..=1.0).contains(&cli.lapse_rate) {
        anyhow::bail!("--lapse-rate must be within 0..=1, got {}", cli.lapse_rate);
    }
    if cli.tick_ms == 0 {
        anyhow::bail!("--tick-ms must be positive");
    }
    if !(cli.speed.is_finite() && cli.speed > 0.0) {
        anyhow::bail!("--speed must be a positive number");
    }

    let config = load_config(&cli)?;
    tracing::info!(trials = cli.trials, realtime = cli.realtime, seed = ?cli.seed, "simulating block");

    let tally = if cli.realtime {
        simulate(&cli, config, HighPrecisionTimer::new())?
    } else {
        simulate(&cli, config, ManualTimer::new())?
    };

    println!(
        "Block completed: {} successes, {} failures",
        tally.successes, tally.failures
    );
    for (state, count) in &tally.failed_in {
        println!("  failed in {state}: {count}");
    }

    if let Some(path) = &cli.summary {
        let json = serde_json::to_string_pretty(&tally)?;
        std::fs::write(path, json)
            .with_context(|| format!("writing summary {}", path.display()))?;
    }

    Ok(())
}
