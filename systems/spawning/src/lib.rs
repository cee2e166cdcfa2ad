#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave scheduler responsible for emitting enemy spawn commands.
//!
//! The scheduler owns the run's precomputed wave plan. While a wave is active
//! it converts elapsed simulation time into [`Command::SpawnEnemy`] requests,
//! and it tracks how many of the wave's enemies are still alive or in flight
//! by consuming kill and reach-end events. A wave completes only when every
//! enemy has spawned and none remain.

use std::time::Duration;

use lane_defence_core::{Command, Event, WaveConfig, WaveStartError};
use lane_defence_system_wave_generation::derive_wave_seed;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

pub mod scaling;
pub mod selection;

pub use scaling::scale_profile;
pub use selection::{selector, EnemySelection};

/// Wave lifecycle transitions reported by the scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaveProgress {
    /// The last enemy of a wave was resolved.
    Completed {
        /// Number of the finished wave.
        wave: u32,
        /// Whether no further waves remain in the plan.
        last: bool,
    },
}

#[derive(Debug)]
struct ActiveWave {
    config: WaveConfig,
    spawned: u32,
    remaining: u32,
    since_last_spawn: Duration,
    rng: ChaCha8Rng,
}

/// Pure system that spawns the enemies of the current wave.
#[derive(Debug)]
pub struct WaveScheduler {
    plan: Vec<WaveConfig>,
    run_seed: u64,
    next_index: usize,
    current_wave: u32,
    active: Option<ActiveWave>,
}

impl WaveScheduler {
    /// Creates a scheduler over the provided plan.
    #[must_use]
    pub fn new(plan: Vec<WaveConfig>, run_seed: u64) -> Self {
        Self {
            plan,
            run_seed,
            next_index: 0,
            current_wave: 0,
            active: None,
        }
    }

    /// Starts the next wave in the plan, returning its number.
    pub fn start_wave(&mut self) -> Result<u32, WaveStartError> {
        if let Some(active) = &self.active {
            return Err(WaveStartError::AlreadyActive {
                wave: active.config.number,
            });
        }

        let config = self
            .plan
            .get(self.next_index)
            .cloned()
            .ok_or(WaveStartError::Exhausted)?;
        self.next_index += 1;

        let wave = config.number;
        tracing::info!(
            wave,
            enemies = config.enemy_count,
            strategy = ?config.strategy,
            "wave started"
        );

        self.current_wave = wave;
        self.active = Some(ActiveWave {
            spawned: 0,
            remaining: config.enemy_count,
            since_last_spawn: config.spawn_interval,
            rng: ChaCha8Rng::seed_from_u64(derive_wave_seed(self.run_seed, wave)),
            config,
        });
        Ok(wave)
    }

    /// Consumes simulation events, emitting spawn commands and wave transitions.
    pub fn handle(
        &mut self,
        events: &[Event],
        out: &mut Vec<Command>,
        progress: &mut Vec<WaveProgress>,
    ) {
        let Some(active) = self.active.as_mut() else {
            return;
        };

        let mut elapsed = Duration::ZERO;
        for event in events {
            match event {
                Event::TimeAdvanced { dt } => elapsed = elapsed.saturating_add(*dt),
                Event::EnemyKilled { wave, .. } | Event::EnemyReachedEnd { wave, .. }
                    if *wave == active.config.number =>
                {
                    active.remaining = active.remaining.saturating_sub(1);
                }
                _ => {}
            }
        }

        if !elapsed.is_zero() {
            active.since_last_spawn = active.since_last_spawn.saturating_add(elapsed);
            active.spawn_due(out);
        }

        if active.spawned >= active.config.enemy_count && active.remaining == 0 {
            let wave = active.config.number;
            let last = self.next_index >= self.plan.len();
            tracing::info!(wave, last, "wave completed");
            self.active = None;
            progress.push(WaveProgress::Completed { wave, last });
        }
    }

    /// Reports whether a wave is in progress.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Number of the most recently started wave, zero before the first.
    #[must_use]
    pub const fn current_wave(&self) -> u32 {
        self.current_wave
    }

    /// Configuration of the wave in progress.
    #[must_use]
    pub fn active_wave(&self) -> Option<&WaveConfig> {
        self.active.as_ref().map(|active| &active.config)
    }

    /// Enemies of the active wave still alive or not yet spawned.
    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.active.as_ref().map_or(0, |active| active.remaining)
    }

    /// Total waves in the plan.
    #[must_use]
    pub fn total_waves(&self) -> usize {
        self.plan.len()
    }

    /// Reports whether every wave in the plan has been started.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.next_index >= self.plan.len()
    }

    /// Returns to the beginning of the plan, dropping any active wave.
    pub fn reset(&mut self) {
        self.next_index = 0;
        self.current_wave = 0;
        self.active = None;
    }
}

impl ActiveWave {
    fn spawn_due(&mut self, out: &mut Vec<Command>) {
        let interval = self.config.spawn_interval;
        let strategy = selector(self.config.strategy);

        while self.spawned < self.config.enemy_count && self.since_last_spawn >= interval {
            self.since_last_spawn -= interval;
            let index = self.spawned;
            self.spawned += 1;

            match strategy.select(&self.config, index, &mut self.rng) {
                Some(kind) => {
                    let profile = scale_profile(kind.profile(), &self.config);
                    tracing::debug!(wave = self.config.number, ?kind, "enemy spawn requested");
                    out.push(Command::SpawnEnemy {
                        profile,
                        wave: self.config.number,
                    });
                }
                None => {
                    tracing::warn!(
                        wave = self.config.number,
                        "wave allows no enemy kinds; skipping spawn"
                    );
                    self.remaining = self.remaining.saturating_sub(1);
                }
            }
        }
    }
}
