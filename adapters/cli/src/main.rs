#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless command-line runner for the lane defence simulation.
//!
//! Builds towers, plays waves until the run ends or a tick limit is hit, and
//! prints a summary. Statistics can be persisted to a JSON file between runs.

mod layout_transfer;

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use clap::Parser;
use lane_defence_core::{GameResult, Notification, PlayerCommand, Statistics, TowerKind};
use lane_defence_simulation::{Phase, Simulation, SimulationConfig};
use lane_defence_world::query;
use tracing_subscriber::EnvFilter;

use layout_transfer::TowerLayout;

/// Order in which auto-build cycles through tower families.
const BUILD_ROTATION: [TowerKind; 6] = [
    TowerKind::Archer,
    TowerKind::Mage,
    TowerKind::IceMage,
    TowerKind::Poison,
    TowerKind::Cannon,
    TowerKind::Lightning,
];

#[derive(Debug, Parser)]
#[command(name = "lane-defence", about = "Runs a headless lane defence session")]
struct Args {
    /// TOML file overriding the default simulation configuration.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides the configured run seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Tower layout string to build before the first wave.
    #[arg(long)]
    layout: Option<String>,

    /// Disables automatic tower building between waves.
    #[arg(long)]
    no_auto_build: bool,

    /// Simulated milliseconds per tick.
    #[arg(long, default_value_t = 33)]
    tick_ms: u64,

    /// Stops after this many ticks even if the run is still going.
    #[arg(long, default_value_t = 100_000)]
    max_ticks: u64,

    /// JSON file statistics are read from and written back to.
    #[arg(long)]
    stats: Option<PathBuf>,

    /// Prints the final tower layout as a shareable string.
    #[arg(long)]
    export_layout: bool,

    /// Tracing filter such as `debug` or `lane_defence_simulation=debug`.
    #[arg(long)]
    log_filter: Option<String>,
}

/// Entry point for the lane defence command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_filter.as_deref())?;

    let mut config = load_config(args.config.as_deref())?;
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    let auto_waves = config.auto_start_next_wave;
    let mut simulation = Simulation::new(config).context("failed to build the simulation")?;

    if let Some(path) = &args.stats {
        if let Some(persisted) = read_statistics(path)? {
            simulation.load_statistics(&persisted);
        }
    }

    if let Some(encoded) = &args.layout {
        let layout = TowerLayout::decode(encoded).context("invalid --layout string")?;
        for (tower, error) in layout.build(&mut simulation) {
            tracing::warn!(kind = ?tower.kind, x = tower.x, y = tower.y, %error, "layout tower skipped");
        }
    }
    if !args.no_auto_build {
        auto_build(&mut simulation);
    }

    simulation
        .submit(PlayerCommand::StartNextWave)
        .context("failed to start the first wave")?;

    let dt = Duration::from_millis(args.tick_ms);
    let mut ticks = 0;
    while ticks < args.max_ticks && simulation.phase() == Phase::Running {
        simulation.tick(dt);
        ticks += 1;

        let mut wave_cleared = false;
        for notification in simulation.drain_notifications() {
            wave_cleared |= matches!(notification, Notification::WaveCompleted { .. });
            log_notification(&notification);
        }
        if !wave_cleared || simulation.phase() != Phase::Running {
            continue;
        }

        if !args.no_auto_build {
            auto_build(&mut simulation);
        }
        if !auto_waves {
            simulation
                .submit(PlayerCommand::StartNextWave)
                .context("failed to start the next wave")?;
        }
    }

    print_summary(&simulation, ticks);
    if args.export_layout {
        let encoded = TowerLayout::capture(&simulation)
            .encode()
            .context("failed to encode the tower layout")?;
        println!("layout: {encoded}");
    }
    if let Some(path) = &args.stats {
        write_statistics(path, &simulation.statistics())?;
    }
    Ok(())
}

fn init_tracing(filter: Option<&str>) -> Result<()> {
    let filter = match filter {
        Some(directives) => EnvFilter::try_new(directives)
            .with_context(|| format!("invalid log filter `{directives}`"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<SimulationConfig> {
    let Some(path) = path else {
        return Ok(SimulationConfig::default());
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    SimulationConfig::from_toml_str(&contents)
        .with_context(|| format!("invalid config {}", path.display()))
}

fn read_statistics(path: &Path) -> Result<Option<Statistics>> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read statistics {}", path.display()))?;
    let statistics = serde_json::from_str(&contents)
        .with_context(|| format!("invalid statistics file {}", path.display()))?;
    Ok(Some(statistics))
}

fn write_statistics(path: &Path, statistics: &Statistics) -> Result<()> {
    let json = serde_json::to_string_pretty(statistics).context("failed to encode statistics")?;
    fs::write(path, json).with_context(|| format!("failed to write statistics {}", path.display()))
}

/// Builds towers on the free spots closest to the path while gold lasts.
fn auto_build(simulation: &mut Simulation) {
    let mut built = 0_usize;
    loop {
        let snapshot = simulation.snapshot();
        let kind = BUILD_ROTATION[snapshot.towers.len() % BUILD_ROTATION.len()];
        if snapshot.gold < kind.profile().cost {
            break;
        }
        let Some(position) = query::placement_candidates(simulation.world()).first().copied()
        else {
            break;
        };
        if simulation
            .submit(PlayerCommand::PlaceTower { kind, position })
            .is_err()
        {
            break;
        }
        built += 1;
    }
    tracing::debug!(built, "auto-build finished");
}

fn log_notification(notification: &Notification) {
    match notification {
        Notification::WaveChanged { wave } => tracing::info!(wave, "wave started"),
        Notification::WaveCompleted { wave, bonus } => {
            tracing::info!(wave, bonus, "wave cleared");
        }
        Notification::GameOver(report) => {
            tracing::info!(result = ?report.result, score = report.score, "run over");
        }
        other => tracing::trace!(?other, "notification"),
    }
}

fn print_summary(simulation: &Simulation, ticks: u64) {
    let snapshot = simulation.snapshot();
    let statistics = simulation.statistics();
    let result = match snapshot.phase {
        Phase::Finished(GameResult::Victory) => "victory",
        Phase::Finished(GameResult::Defeat) => "defeat",
        Phase::Running | Phase::Paused => "unfinished",
    };

    println!("result: {result}");
    println!(
        "ticks: {ticks} ({:.1}s simulated)",
        snapshot.clock.as_secs_f64()
    );
    println!("wave: {}", snapshot.wave);
    println!("score: {}", snapshot.score);
    println!("gold: {}", snapshot.gold);
    println!("health: {}", snapshot.health);
    println!("towers: {}", snapshot.towers.len());
    println!(
        "lifetime: {} kills, {} damage, {} towers, {} spells, {} waves, high score {}",
        statistics.enemies_killed,
        statistics.total_damage_dealt,
        statistics.towers_built,
        statistics.spells_cast,
        statistics.waves_completed,
        statistics.high_score,
    );
}
