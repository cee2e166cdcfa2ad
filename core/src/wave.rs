//! Wave descriptions shared by wave generation and scheduling.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::EnemyKind;

/// Enemy-type selection strategy assigned to a wave.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpawnStrategy {
    /// Always spawns the first allowed type.
    Fixed,
    /// Cycles through the allowed types in order.
    RoundRobin,
    /// Favours dragons and strong enemies.
    BossWeighted,
    /// Mostly random picks among the allowed types.
    EliteWeighted,
    /// Mostly fast enemies.
    Swarm,
}

/// Immutable description of a single wave.
#[derive(Clone, Debug, PartialEq)]
pub struct WaveConfig {
    /// One-based wave number.
    pub number: u32,
    /// Enemies spawned over the course of the wave.
    pub enemy_count: u32,
    /// Kinds the selection strategy may choose from.
    pub enemy_types: Vec<EnemyKind>,
    /// Delay between consecutive spawns.
    pub spawn_interval: Duration,
    /// Health multiplier applied on top of the per-wave curve.
    pub difficulty: f32,
    /// Selection strategy for enemy kinds.
    pub strategy: SpawnStrategy,
    /// Whether the wave is a boss wave.
    pub boss: bool,
}

/// Reasons a wave cannot be started.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum WaveStartError {
    /// A wave is still in progress.
    #[error("wave {wave} is still active")]
    AlreadyActive {
        /// Number of the active wave.
        wave: u32,
    },
    /// Every configured wave has already been played.
    #[error("all waves have been played")]
    Exhausted,
}
