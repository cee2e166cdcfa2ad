//! Enemy-type selection strategies.
//!
//! Every [`SpawnStrategy`] maps to a stateless selector implementing
//! [`EnemySelection`]. Selectors see the wave, how many enemies it already
//! spawned, and the wave's private RNG, which keeps picks reproducible for a
//! given run seed.

use lane_defence_core::{EnemyKind, SpawnStrategy, WaveConfig};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// Chance a boss wave spawns a dragon.
pub const BOSS_DRAGON_CHANCE: f64 = 0.4;

/// Chance a boss wave spawns a strong enemy when it skips the dragon.
pub const BOSS_STRONG_CHANCE: f64 = 0.7;

/// Chance an elite wave picks a random allowed type.
pub const ELITE_RANDOM_CHANCE: f64 = 0.8;

/// Chance a swarm wave picks from its fast types.
pub const SWARM_FAST_CHANCE: f64 = 0.8;

const STRONG_KINDS: [EnemyKind; 3] = [EnemyKind::Troll, EnemyKind::Lich, EnemyKind::Daemon];
const FAST_KINDS: [EnemyKind; 2] = [EnemyKind::Skeleton, EnemyKind::Orc];

/// Picks the kind of the next enemy in a wave.
pub trait EnemySelection {
    /// Chooses a kind, or `None` when the wave allows no kinds at all.
    fn select(&self, wave: &WaveConfig, spawned: u32, rng: &mut ChaCha8Rng) -> Option<EnemyKind>;
}

/// Always spawns the first allowed kind.
#[derive(Clone, Copy, Debug, Default)]
pub struct FixedSelection;

/// Cycles through the allowed kinds.
#[derive(Clone, Copy, Debug, Default)]
pub struct RoundRobinSelection;

/// Favours dragons, then strong kinds, then cycles the rest.
#[derive(Clone, Copy, Debug, Default)]
pub struct BossWeightedSelection;

/// Mostly random picks, occasionally cycling.
#[derive(Clone, Copy, Debug, Default)]
pub struct EliteWeightedSelection;

/// Mostly cycles fast kinds, occasionally any kind.
#[derive(Clone, Copy, Debug, Default)]
pub struct SwarmSelection;

/// Selector implementing the strategy.
#[must_use]
pub fn selector(strategy: SpawnStrategy) -> &'static dyn EnemySelection {
    match strategy {
        SpawnStrategy::Fixed => &FixedSelection,
        SpawnStrategy::RoundRobin => &RoundRobinSelection,
        SpawnStrategy::BossWeighted => &BossWeightedSelection,
        SpawnStrategy::EliteWeighted => &EliteWeightedSelection,
        SpawnStrategy::Swarm => &SwarmSelection,
    }
}

impl EnemySelection for FixedSelection {
    fn select(&self, wave: &WaveConfig, _spawned: u32, _rng: &mut ChaCha8Rng) -> Option<EnemyKind> {
        wave.enemy_types.first().copied()
    }
}

impl EnemySelection for RoundRobinSelection {
    fn select(&self, wave: &WaveConfig, spawned: u32, _rng: &mut ChaCha8Rng) -> Option<EnemyKind> {
        cycle(&wave.enemy_types, spawned)
    }
}

impl EnemySelection for BossWeightedSelection {
    fn select(&self, wave: &WaveConfig, spawned: u32, rng: &mut ChaCha8Rng) -> Option<EnemyKind> {
        if wave.enemy_types.contains(&EnemyKind::Dragon) && rng.gen_bool(BOSS_DRAGON_CHANCE) {
            return Some(EnemyKind::Dragon);
        }

        let strong = filtered(&wave.enemy_types, |kind| STRONG_KINDS.contains(&kind));
        if !strong.is_empty() && rng.gen_bool(BOSS_STRONG_CHANCE) {
            return pick(&strong, rng);
        }

        let regular = filtered(&wave.enemy_types, |kind| kind != EnemyKind::Dragon);
        cycle(&regular, spawned).or_else(|| wave.enemy_types.first().copied())
    }
}

impl EnemySelection for EliteWeightedSelection {
    fn select(&self, wave: &WaveConfig, spawned: u32, rng: &mut ChaCha8Rng) -> Option<EnemyKind> {
        if rng.gen_bool(ELITE_RANDOM_CHANCE) {
            pick(&wave.enemy_types, rng)
        } else {
            cycle(&wave.enemy_types, spawned)
        }
    }
}

impl EnemySelection for SwarmSelection {
    fn select(&self, wave: &WaveConfig, spawned: u32, rng: &mut ChaCha8Rng) -> Option<EnemyKind> {
        if rng.gen_bool(SWARM_FAST_CHANCE) {
            let fast = filtered(&wave.enemy_types, |kind| FAST_KINDS.contains(&kind));
            cycle(&fast, spawned).or_else(|| cycle(&wave.enemy_types, spawned))
        } else {
            pick(&wave.enemy_types, rng)
        }
    }
}

fn cycle(kinds: &[EnemyKind], spawned: u32) -> Option<EnemyKind> {
    if kinds.is_empty() {
        return None;
    }
    kinds.get(spawned as usize % kinds.len()).copied()
}

fn pick(kinds: &[EnemyKind], rng: &mut ChaCha8Rng) -> Option<EnemyKind> {
    if kinds.is_empty() {
        return None;
    }
    kinds.get(rng.gen_range(0..kinds.len())).copied()
}

fn filtered(kinds: &[EnemyKind], keep: impl Fn(EnemyKind) -> bool) -> Vec<EnemyKind> {
    kinds.iter().copied().filter(|kind| keep(*kind)).collect()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rand::SeedableRng;

    use super::*;

    fn wave(strategy: SpawnStrategy, enemy_types: Vec<EnemyKind>) -> WaveConfig {
        WaveConfig {
            number: 1,
            enemy_count: 10,
            enemy_types,
            spawn_interval: Duration::from_millis(500),
            difficulty: 1.0,
            strategy,
            boss: false,
        }
    }

    #[test]
    fn fixed_always_returns_first_kind() {
        let config = wave(SpawnStrategy::Fixed, vec![EnemyKind::Troll, EnemyKind::Orc]);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for spawned in 0..5 {
            assert_eq!(
                FixedSelection.select(&config, spawned, &mut rng),
                Some(EnemyKind::Troll)
            );
        }
    }

    #[test]
    fn round_robin_cycles_in_order() {
        let config = wave(
            SpawnStrategy::RoundRobin,
            vec![EnemyKind::Orc, EnemyKind::Skeleton, EnemyKind::Troll],
        );
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let picks: Vec<_> = (0..4)
            .map(|spawned| RoundRobinSelection.select(&config, spawned, &mut rng))
            .collect();
        assert_eq!(
            picks,
            vec![
                Some(EnemyKind::Orc),
                Some(EnemyKind::Skeleton),
                Some(EnemyKind::Troll),
                Some(EnemyKind::Orc),
            ]
        );
    }

    #[test]
    fn weighted_strategies_stay_within_allowed_kinds() {
        let allowed = vec![EnemyKind::Orc, EnemyKind::Skeleton, EnemyKind::Dragon];
        for strategy in [
            SpawnStrategy::BossWeighted,
            SpawnStrategy::EliteWeighted,
            SpawnStrategy::Swarm,
        ] {
            let config = wave(strategy, allowed.clone());
            let mut rng = ChaCha8Rng::seed_from_u64(99);
            for spawned in 0..200 {
                let kind = selector(strategy)
                    .select(&config, spawned, &mut rng)
                    .expect("non-empty wave");
                assert!(allowed.contains(&kind), "{strategy:?} picked {kind:?}");
            }
        }
    }

    #[test]
    fn boss_waves_spawn_dragons() {
        let config = wave(
            SpawnStrategy::BossWeighted,
            vec![EnemyKind::Orc, EnemyKind::Skeleton, EnemyKind::Dragon],
        );
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let dragons = (0..200)
            .filter(|spawned| {
                BossWeightedSelection.select(&config, *spawned, &mut rng) == Some(EnemyKind::Dragon)
            })
            .count();
        assert!(dragons > 40 && dragons < 120, "dragons: {dragons}");
    }

    #[test]
    fn identical_seeds_pick_identical_sequences() {
        let config = wave(
            SpawnStrategy::EliteWeighted,
            vec![EnemyKind::Troll, EnemyKind::Lich, EnemyKind::Daemon],
        );
        let run = |seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            (0..50)
                .map(|spawned| EliteWeightedSelection.select(&config, spawned, &mut rng))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(5), run(5));
    }

    #[test]
    fn empty_waves_select_nothing() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for strategy in [
            SpawnStrategy::Fixed,
            SpawnStrategy::RoundRobin,
            SpawnStrategy::BossWeighted,
            SpawnStrategy::EliteWeighted,
            SpawnStrategy::Swarm,
        ] {
            let config = wave(strategy, Vec::new());
            assert_eq!(selector(strategy).select(&config, 0, &mut rng), None);
        }
    }
}
