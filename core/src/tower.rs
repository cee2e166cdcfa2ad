//! Mutable tower progression shared between the world and progression rules.

use std::{collections::BTreeSet, fmt, time::Duration};

use serde::{Deserialize, Serialize};

use crate::catalog::{
    ChainProfile, DamageType, PeriodicPayload, SlowPayload, TowerKind, MAX_SLOW_STRENGTH,
};

/// Fraction of invested gold refunded when a tower is sold.
pub const SELL_REFUND_FRACTION: f64 = 0.7;

/// Shortest cooldown any upgrade or evolution may reduce a tower to.
pub const MIN_ATTACK_INTERVAL: Duration = Duration::from_millis(200);

/// Purchases allowed per upgradeable stat.
pub const MAX_UPGRADES_PER_STAT: u8 = 3;

/// Identifier of a node in the evolution tree, such as `ARCHER_VETERAN`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EvolutionId(String);

impl EvolutionId {
    /// Creates an identifier from its catalogue key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Catalogue key of the node.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EvolutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stats that can be bought individually.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UpgradeStat {
    /// Raises damage per attack.
    Damage,
    /// Raises targeting range.
    Range,
    /// Shortens the attack cooldown.
    Speed,
    /// Widens the splash radius.
    Splash,
}

impl UpgradeStat {
    /// Every upgradeable stat in declaration order.
    pub const ALL: [UpgradeStat; 4] = [
        UpgradeStat::Damage,
        UpgradeStat::Range,
        UpgradeStat::Speed,
        UpgradeStat::Splash,
    ];
}

/// Purchases made so far for each upgradeable stat.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UpgradeLevels {
    damage: u8,
    range: u8,
    speed: u8,
    splash: u8,
}

impl UpgradeLevels {
    /// Purchases made for the provided stat.
    #[must_use]
    pub const fn get(&self, stat: UpgradeStat) -> u8 {
        match stat {
            UpgradeStat::Damage => self.damage,
            UpgradeStat::Range => self.range,
            UpgradeStat::Speed => self.speed,
            UpgradeStat::Splash => self.splash,
        }
    }

    /// Records one more purchase of the provided stat.
    pub fn increment(&mut self, stat: UpgradeStat) {
        let slot = match stat {
            UpgradeStat::Damage => &mut self.damage,
            UpgradeStat::Range => &mut self.range,
            UpgradeStat::Speed => &mut self.speed,
            UpgradeStat::Splash => &mut self.splash,
        };
        *slot = slot.saturating_add(1);
    }

    /// Purchases made across every stat.
    #[must_use]
    pub fn total(&self) -> u32 {
        UpgradeStat::ALL
            .iter()
            .map(|stat| u32::from(self.get(*stat)))
            .sum()
    }
}

/// Effective combat statistics of a placed tower.
#[derive(Clone, Debug, PartialEq)]
pub struct TowerStats {
    /// Damage dealt per attack.
    pub damage: f32,
    /// Targeting radius.
    pub range: f32,
    /// Cooldown between attacks.
    pub attack_interval: Duration,
    /// Projectile travel speed in units per second.
    pub projectile_speed: f32,
    /// Element of the tower's attacks.
    pub damage_type: DamageType,
    /// Splash radius, zero for single-target towers.
    pub splash_radius: f32,
    /// Slow delivered on hit.
    pub slow: Option<SlowPayload>,
    /// Poison delivered on hit.
    pub poison: Option<PeriodicPayload>,
    /// Chain discharge parameters.
    pub chain: Option<ChainProfile>,
    /// Extra enemies targeted by each projectile volley.
    pub multi_shot: u32,
    /// Special ability flags granted by evolutions.
    pub abilities: BTreeSet<String>,
}

impl TowerStats {
    /// Base statistics of a freshly built tower of the provided kind.
    #[must_use]
    pub fn base(kind: TowerKind) -> Self {
        let profile = kind.profile();
        Self {
            damage: profile.damage,
            range: profile.range,
            attack_interval: profile.attack_interval,
            projectile_speed: profile.projectile_speed,
            damage_type: profile.damage_type,
            splash_radius: profile.splash_radius,
            slow: profile.slow,
            poison: profile.poison,
            chain: profile.chain,
            multi_shot: 0,
            abilities: BTreeSet::new(),
        }
    }

    /// Re-establishes stat floors after additive changes.
    pub fn normalize(&mut self) {
        self.damage = self.damage.max(0.0);
        self.range = self.range.max(0.0);
        self.splash_radius = self.splash_radius.max(0.0);
        self.attack_interval = self.attack_interval.max(MIN_ATTACK_INTERVAL);
        if let Some(slow) = self.slow.as_mut() {
            slow.strength = slow.strength.clamp(0.0, MAX_SLOW_STRENGTH);
        }
        if let Some(poison) = self.poison.as_mut() {
            poison.damage = poison.damage.max(0.0);
        }
        if let Some(chain) = self.chain.as_mut() {
            chain.damage_decay = chain.damage_decay.clamp(0.0, 1.0);
        }
    }
}

/// Everything that changes about a tower after it is built.
#[derive(Clone, Debug, PartialEq)]
pub struct TowerProgress {
    kind: TowerKind,
    /// Current effective statistics.
    pub stats: TowerStats,
    /// Purchases made per stat.
    pub upgrades: UpgradeLevels,
    /// Most recent evolution taken, if any.
    pub evolution: Option<EvolutionId>,
    /// Evolution tier: 1 for base towers, 2 and 3 for evolved ones.
    pub tier: u8,
    /// Gold paid for construction, upgrades, and evolutions.
    pub invested: u32,
}

impl TowerProgress {
    /// Progress of a freshly built tower.
    #[must_use]
    pub fn new(kind: TowerKind) -> Self {
        Self {
            kind,
            stats: TowerStats::base(kind),
            upgrades: UpgradeLevels::default(),
            evolution: None,
            tier: 1,
            invested: kind.profile().cost,
        }
    }

    /// Tower family.
    #[must_use]
    pub const fn kind(&self) -> TowerKind {
        self.kind
    }

    /// Tower level: one plus every upgrade purchased.
    #[must_use]
    pub fn level(&self) -> u32 {
        1 + self.upgrades.total()
    }

    /// Gold refunded when the tower is sold.
    #[must_use]
    pub fn sell_value(&self) -> u32 {
        (f64::from(self.invested) * SELL_REFUND_FRACTION).floor() as u32
    }
}
