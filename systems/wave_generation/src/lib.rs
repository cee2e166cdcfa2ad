#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic wave plan generation.
//!
//! The plan for a run is built once, up front, as an ordered list of
//! immutable [`WaveConfig`] values. Each wave also receives its own RNG seed
//! derived from the run seed, so replaying a single wave does not depend on
//! how earlier waves consumed randomness.

use std::time::Duration;

use lane_defence_core::{EnemyKind, SpawnStrategy, WaveConfig};
use sha2::{Digest, Sha256};

/// Number of waves in the standard plan.
pub const STANDARD_WAVE_COUNT: u32 = 20;

/// Waves promoted to boss waves.
pub const BOSS_WAVES: [u32; 4] = [5, 10, 15, 20];

/// Extra enemies spawned by a boss wave.
pub const BOSS_EXTRA_ENEMIES: u32 = 5;

/// Extra difficulty applied to a boss wave.
pub const BOSS_EXTRA_DIFFICULTY: f32 = 0.5;

/// Closing wave of the skeleton band, spawned as a fast swarm.
pub const SWARM_WAVE: u32 = 7;

/// Shortest delay allowed between spawns.
pub const MIN_SPAWN_INTERVAL: Duration = Duration::from_millis(400);

const RNG_STREAM_WAVE: &str = "wave";

/// Builds the standard twenty-wave plan.
#[must_use]
pub fn standard_plan() -> Vec<WaveConfig> {
    (1..=STANDARD_WAVE_COUNT).map(standard_wave).collect()
}

fn standard_wave(number: u32) -> WaveConfig {
    let n = number as f32;
    let (strategy, enemy_types, enemy_count, interval_ms, difficulty) = match number {
        1..=3 => (
            SpawnStrategy::Fixed,
            vec![EnemyKind::Orc],
            8 + number * 3,
            1200 - i64::from(number) * 100,
            1.0 + n * 0.1,
        ),
        4..=7 => (
            SpawnStrategy::RoundRobin,
            vec![EnemyKind::Orc, EnemyKind::Skeleton],
            12 + number * 2,
            1000 - i64::from(number - 4) * 50,
            1.2 + n * 0.1,
        ),
        8..=12 => (
            SpawnStrategy::RoundRobin,
            vec![EnemyKind::Orc, EnemyKind::Skeleton, EnemyKind::Troll],
            15 + number * 2,
            800 - i64::from(number - 8) * 30,
            1.5 + n * 0.15,
        ),
        13..=17 => (
            SpawnStrategy::EliteWeighted,
            vec![EnemyKind::Skeleton, EnemyKind::Troll, EnemyKind::Lich],
            18 + number * 2,
            700 - i64::from(number - 13) * 25,
            2.0 + n * 0.2,
        ),
        _ => (
            SpawnStrategy::EliteWeighted,
            vec![EnemyKind::Troll, EnemyKind::Lich, EnemyKind::Daemon],
            20 + number * 3,
            600,
            3.0 + n * 0.3,
        ),
    };

    let mut wave = WaveConfig {
        number,
        enemy_count,
        enemy_types,
        spawn_interval: Duration::from_millis(interval_ms.max(0) as u64).max(MIN_SPAWN_INTERVAL),
        difficulty,
        strategy,
        boss: false,
    };

    if number == SWARM_WAVE {
        wave.strategy = SpawnStrategy::Swarm;
    }

    if BOSS_WAVES.contains(&number) {
        wave.strategy = SpawnStrategy::BossWeighted;
        wave.enemy_types.push(EnemyKind::Dragon);
        wave.enemy_count += BOSS_EXTRA_ENEMIES;
        wave.difficulty += BOSS_EXTRA_DIFFICULTY;
        wave.boss = true;
    }

    wave
}

/// Derives the RNG seed for a wave from the run seed.
#[must_use]
pub fn derive_wave_seed(run_seed: u64, wave: u32) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(run_seed.to_le_bytes());
    hasher.update(RNG_STREAM_WAVE.as_bytes());
    hasher.update(wave.to_le_bytes());
    let digest = hasher.finalize();

    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_has_twenty_numbered_waves() {
        let plan = standard_plan();
        assert_eq!(plan.len(), 20);
        for (index, wave) in plan.iter().enumerate() {
            assert_eq!(wave.number as usize, index + 1);
            assert!(!wave.enemy_types.is_empty());
            assert!(wave.spawn_interval >= MIN_SPAWN_INTERVAL);
        }
    }

    #[test]
    fn opening_waves_are_plain_orcs() {
        let plan = standard_plan();
        let first = &plan[0];
        assert_eq!(first.strategy, SpawnStrategy::Fixed);
        assert_eq!(first.enemy_types, vec![EnemyKind::Orc]);
        assert_eq!(first.enemy_count, 11);
        assert_eq!(first.spawn_interval, Duration::from_millis(1100));
        assert!((first.difficulty - 1.1).abs() < 1e-6);
    }

    #[test]
    fn boss_waves_add_dragons_and_pressure() {
        let plan = standard_plan();
        let fifth = &plan[4];
        assert!(fifth.boss);
        assert_eq!(fifth.strategy, SpawnStrategy::BossWeighted);
        assert_eq!(
            fifth.enemy_types,
            vec![EnemyKind::Orc, EnemyKind::Skeleton, EnemyKind::Dragon]
        );
        assert_eq!(fifth.enemy_count, 22 + 5);
        assert!((fifth.difficulty - 2.2).abs() < 1e-5);

        let last = &plan[19];
        assert!(last.boss);
        assert_eq!(last.enemy_count, 85);
        assert_eq!(last.enemy_types.last(), Some(&EnemyKind::Dragon));
        assert!(plan.iter().filter(|wave| wave.boss).count() == 4);
    }

    #[test]
    fn one_wave_swarms_with_fast_enemies() {
        let plan = standard_plan();
        let swarms: Vec<u32> = plan
            .iter()
            .filter(|wave| wave.strategy == SpawnStrategy::Swarm)
            .map(|wave| wave.number)
            .collect();
        assert_eq!(swarms, vec![SWARM_WAVE]);

        let swarm = &plan[SWARM_WAVE as usize - 1];
        assert!(!swarm.boss);
        assert_eq!(swarm.enemy_types, vec![EnemyKind::Orc, EnemyKind::Skeleton]);
        assert_eq!(swarm.enemy_count, 26);
    }

    #[test]
    fn wave_seeds_are_stable_and_distinct() {
        assert_eq!(derive_wave_seed(7, 3), derive_wave_seed(7, 3));
        assert_ne!(derive_wave_seed(7, 3), derive_wave_seed(7, 4));
        assert_ne!(derive_wave_seed(7, 3), derive_wave_seed(8, 3));
    }
}
