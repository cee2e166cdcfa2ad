//! Static balance tables for towers, enemies, and spells.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::status::EffectKind;

/// Elemental category attached to every damage application.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DamageType {
    /// Untyped kinetic damage.
    Physical,
    /// Arcane damage dealt by mages.
    Magic,
    /// Burning damage from cannons, fireballs, and burn effects.
    Fire,
    /// Freezing damage from ice mages.
    Ice,
    /// Toxic damage from poison towers and poison effects.
    Poison,
    /// Electric damage from lightning towers and storms.
    Lightning,
}

impl DamageType {
    /// Every damage type in declaration order.
    pub const ALL: [DamageType; 6] = [
        DamageType::Physical,
        DamageType::Magic,
        DamageType::Fire,
        DamageType::Ice,
        DamageType::Poison,
        DamageType::Lightning,
    ];

    const fn index(self) -> usize {
        match self {
            Self::Physical => 0,
            Self::Magic => 1,
            Self::Fire => 2,
            Self::Ice => 3,
            Self::Poison => 4,
            Self::Lightning => 5,
        }
    }
}

/// Errors raised when a catalogue key does not name a known entry.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// The provided key does not identify a tower kind.
    #[error("unknown tower kind `{0}`")]
    UnknownTowerKind(String),
    /// The provided key does not identify an enemy kind.
    #[error("unknown enemy kind `{0}`")]
    UnknownEnemyKind(String),
    /// The provided key does not identify a spell.
    #[error("unknown spell `{0}`")]
    UnknownSpell(String),
}

/// Per-damage-type resistance fractions, each clamped to `0.0..=1.0`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Resistances {
    values: [f32; 6],
}

impl Resistances {
    /// Creates a table with no resistances.
    #[must_use]
    pub const fn none() -> Self {
        Self { values: [0.0; 6] }
    }

    /// Returns a copy of the table with the provided resistance applied.
    ///
    /// Values outside `0.0..=1.0` are clamped; non-finite values become zero.
    #[must_use]
    pub fn with(mut self, damage_type: DamageType, value: f32) -> Self {
        self.values[damage_type.index()] = clamp_fraction(value);
        self
    }

    /// Resistance fraction for the provided damage type.
    #[must_use]
    pub const fn get(&self, damage_type: DamageType) -> f32 {
        self.values[damage_type.index()]
    }
}

fn clamp_fraction(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Damage types and status effect kinds an enemy ignores entirely.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Immunities {
    damage_mask: u8,
    effect_mask: u8,
}

impl Immunities {
    /// Creates an empty immunity set.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            damage_mask: 0,
            effect_mask: 0,
        }
    }

    /// Returns a copy of the set that also ignores the provided damage type.
    #[must_use]
    pub const fn with_damage(mut self, damage_type: DamageType) -> Self {
        self.damage_mask |= 1 << damage_type.index();
        self
    }

    /// Returns a copy of the set that also ignores the provided effect kind.
    #[must_use]
    pub const fn with_effect(mut self, effect: EffectKind) -> Self {
        self.effect_mask |= 1 << effect.index();
        self
    }

    /// Reports whether the damage type is ignored.
    #[must_use]
    pub const fn blocks_damage(&self, damage_type: DamageType) -> bool {
        self.damage_mask & (1 << damage_type.index()) != 0
    }

    /// Reports whether the effect kind is rejected.
    #[must_use]
    pub const fn blocks_effect(&self, effect: EffectKind) -> bool {
        self.effect_mask & (1 << effect.index()) != 0
    }
}

/// Slow payload delivered by a projectile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SlowPayload {
    /// Fraction of movement speed removed while the slow is active.
    pub strength: f32,
    /// Lifetime of the applied slow.
    pub duration: Duration,
}

impl SlowPayload {
    /// Speed multiplier equivalent of the slow strength.
    #[must_use]
    pub fn speed_factor(&self) -> f32 {
        1.0 - self.strength.clamp(0.0, MAX_SLOW_STRENGTH)
    }
}

/// Strongest slow a tower can deliver.
pub const MAX_SLOW_STRENGTH: f32 = 0.9;

/// Damage-over-time payload delivered by a projectile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PeriodicPayload {
    /// Damage dealt on every tick.
    pub damage: f32,
    /// Enemy-age interval between ticks.
    pub interval: Duration,
    /// Lifetime of the applied effect.
    pub duration: Duration,
}

/// Chain discharge parameters for instant-resolution towers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChainProfile {
    /// Jumps taken after the primary target.
    pub extra_targets: u32,
    /// Damage multiplier applied per jump.
    pub damage_decay: f32,
    /// Fraction of tower range a single jump may span.
    pub range_fraction: f32,
}

impl ChainProfile {
    /// Total number of enemies a chain may strike, including the primary target.
    #[must_use]
    pub const fn max_targets(&self) -> u32 {
        self.extra_targets.saturating_add(1)
    }
}

/// Fraction of tower range a chain jump may span.
pub const CHAIN_RANGE_FRACTION: f32 = 0.6;

/// How a tower delivers damage once it attacks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttackDelivery {
    /// Spawns homing projectiles.
    Projectile,
    /// Resolves a chain discharge immediately without projectiles.
    Instant,
}

/// Families of towers that can be constructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TowerKind {
    /// Cheap single-target physical tower.
    Archer,
    /// Magic tower with small splash.
    Mage,
    /// Tower whose projectiles slow enemies.
    IceMage,
    /// Tower whose projectiles poison enemies.
    Poison,
    /// Slow heavy tower with large fire splash.
    Cannon,
    /// Instant chain-lightning tower.
    Lightning,
}

/// Base statistics of a tower kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerProfile {
    /// Gold required to build the tower.
    pub cost: u32,
    /// Damage dealt by a single attack.
    pub damage: f32,
    /// Targeting radius.
    pub range: f32,
    /// Cooldown between attacks.
    pub attack_interval: Duration,
    /// Projectile travel speed in units per second.
    pub projectile_speed: f32,
    /// Element of the tower's attacks.
    pub damage_type: DamageType,
    /// Splash radius around the impact point, zero when the tower has none.
    pub splash_radius: f32,
    /// Slow delivered on hit.
    pub slow: Option<SlowPayload>,
    /// Poison delivered on hit.
    pub poison: Option<PeriodicPayload>,
    /// Chain discharge parameters.
    pub chain: Option<ChainProfile>,
    /// Base price of the first upgrade of any stat.
    pub upgrade_cost: u32,
    /// Damage added by each damage upgrade.
    pub upgrade_damage: f32,
    /// Range added by each range upgrade.
    pub upgrade_range: f32,
}

impl TowerKind {
    /// Every tower kind in declaration order.
    pub const ALL: [TowerKind; 6] = [
        TowerKind::Archer,
        TowerKind::Mage,
        TowerKind::IceMage,
        TowerKind::Poison,
        TowerKind::Cannon,
        TowerKind::Lightning,
    ];

    /// Parses a catalogue key such as `ICE_MAGE`.
    pub fn from_key(key: &str) -> Result<Self, CatalogError> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.key().eq_ignore_ascii_case(key))
            .ok_or_else(|| CatalogError::UnknownTowerKind(key.to_owned()))
    }

    /// Catalogue key of the tower kind.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Archer => "ARCHER",
            Self::Mage => "MAGE",
            Self::IceMage => "ICE_MAGE",
            Self::Poison => "POISON_TOWER",
            Self::Cannon => "CANNON",
            Self::Lightning => "LIGHTNING",
        }
    }

    /// Damage delivery mechanism for the kind.
    #[must_use]
    pub const fn delivery(self) -> AttackDelivery {
        match self {
            Self::Lightning => AttackDelivery::Instant,
            _ => AttackDelivery::Projectile,
        }
    }

    /// Base balance values for the tower kind.
    #[must_use]
    pub const fn profile(self) -> TowerProfile {
        match self {
            Self::Archer => TowerProfile {
                cost: 80,
                damage: 12.0,
                range: 90.0,
                attack_interval: Duration::from_millis(1200),
                projectile_speed: 250.0,
                damage_type: DamageType::Physical,
                splash_radius: 0.0,
                slow: None,
                poison: None,
                chain: None,
                upgrade_cost: 60,
                upgrade_damage: 8.0,
                upgrade_range: 15.0,
            },
            Self::Mage => TowerProfile {
                cost: 120,
                damage: 20.0,
                range: 100.0,
                attack_interval: Duration::from_millis(1800),
                projectile_speed: 200.0,
                damage_type: DamageType::Magic,
                splash_radius: 40.0,
                slow: None,
                poison: None,
                chain: None,
                upgrade_cost: 90,
                upgrade_damage: 12.0,
                upgrade_range: 20.0,
            },
            Self::IceMage => TowerProfile {
                cost: 150,
                damage: 15.0,
                range: 85.0,
                attack_interval: Duration::from_millis(2000),
                projectile_speed: 180.0,
                damage_type: DamageType::Ice,
                splash_radius: 0.0,
                slow: Some(SlowPayload {
                    strength: 0.6,
                    duration: Duration::from_millis(2500),
                }),
                poison: None,
                chain: None,
                upgrade_cost: 110,
                upgrade_damage: 10.0,
                upgrade_range: 15.0,
            },
            Self::Poison => TowerProfile {
                cost: 100,
                damage: 8.0,
                range: 75.0,
                attack_interval: Duration::from_millis(1500),
                projectile_speed: 220.0,
                damage_type: DamageType::Poison,
                splash_radius: 0.0,
                slow: None,
                poison: Some(PeriodicPayload {
                    damage: 3.0,
                    interval: Duration::from_millis(1000),
                    duration: Duration::from_millis(4000),
                }),
                chain: None,
                upgrade_cost: 75,
                upgrade_damage: 5.0,
                upgrade_range: 10.0,
            },
            Self::Cannon => TowerProfile {
                cost: 200,
                damage: 45.0,
                range: 110.0,
                attack_interval: Duration::from_millis(3000),
                projectile_speed: 150.0,
                damage_type: DamageType::Fire,
                splash_radius: 60.0,
                slow: None,
                poison: None,
                chain: None,
                upgrade_cost: 150,
                upgrade_damage: 25.0,
                upgrade_range: 20.0,
            },
            Self::Lightning => TowerProfile {
                cost: 180,
                damage: 25.0,
                range: 95.0,
                attack_interval: Duration::from_millis(2200),
                projectile_speed: 0.0,
                damage_type: DamageType::Lightning,
                splash_radius: 0.0,
                slow: None,
                poison: None,
                chain: Some(ChainProfile {
                    extra_targets: 2,
                    damage_decay: 0.6,
                    range_fraction: CHAIN_RANGE_FRACTION,
                }),
                upgrade_cost: 130,
                upgrade_damage: 15.0,
                upgrade_range: 15.0,
            },
        }
    }
}

/// Families of enemies that waves may spawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Baseline melee enemy.
    Orc,
    /// Fast fragile enemy.
    Skeleton,
    /// Slow tanky enemy.
    Troll,
    /// Flying boss enemy.
    Dragon,
    /// Caster resistant to magic.
    Lich,
    /// Demon resistant to fire.
    Daemon,
}

/// Per-instance enemy statistics, either base values or wave-scaled ones.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemyProfile {
    /// Kind the profile describes.
    pub kind: EnemyKind,
    /// Health at spawn time.
    pub max_health: u32,
    /// Base movement speed in units per second.
    pub speed: f32,
    /// Health removed from the player when the enemy reaches the path end.
    pub damage: u32,
    /// Gold awarded when the enemy dies.
    pub gold_reward: u32,
    /// Score awarded when the enemy dies.
    pub score_value: u32,
    /// Diameter of the enemy's body.
    pub size: f32,
    /// Whether the enemy flies.
    pub flying: bool,
    /// Health restored every second of the enemy's age.
    pub regeneration: u32,
    /// Damage resistances.
    pub resistances: Resistances,
    /// Damage and effect immunities.
    pub immunities: Immunities,
}

impl EnemyKind {
    /// Every enemy kind in declaration order.
    pub const ALL: [EnemyKind; 6] = [
        EnemyKind::Orc,
        EnemyKind::Skeleton,
        EnemyKind::Troll,
        EnemyKind::Dragon,
        EnemyKind::Lich,
        EnemyKind::Daemon,
    ];

    /// Parses a catalogue key such as `SKELETON`.
    pub fn from_key(key: &str) -> Result<Self, CatalogError> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.key().eq_ignore_ascii_case(key))
            .ok_or_else(|| CatalogError::UnknownEnemyKind(key.to_owned()))
    }

    /// Catalogue key of the enemy kind.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Orc => "ORC",
            Self::Skeleton => "SKELETON",
            Self::Troll => "TROLL",
            Self::Dragon => "DRAGON",
            Self::Lich => "LICH",
            Self::Daemon => "DAEMON",
        }
    }

    /// Base balance values for the enemy kind.
    #[must_use]
    pub fn profile(self) -> EnemyProfile {
        let (max_health, speed, damage, gold_reward, score_value, size) = match self {
            Self::Orc => (45, 60.0, 2, 8, 10, 12.0),
            Self::Skeleton => (25, 90.0, 1, 6, 15, 10.0),
            Self::Troll => (120, 35.0, 4, 15, 25, 16.0),
            Self::Dragon => (300, 25.0, 8, 40, 100, 20.0),
            Self::Lich => (180, 45.0, 6, 25, 50, 14.0),
            Self::Daemon => (220, 55.0, 7, 30, 75, 18.0),
        };
        let resistances = match self {
            Self::Lich => Resistances::none().with(DamageType::Magic, 0.3),
            Self::Daemon => Resistances::none().with(DamageType::Fire, 0.4),
            _ => Resistances::none(),
        };

        EnemyProfile {
            kind: self,
            max_health,
            speed,
            damage,
            gold_reward,
            score_value,
            size,
            flying: matches!(self, Self::Dragon),
            regeneration: 0,
            resistances,
            immunities: Immunities::none(),
        }
    }
}

/// Player-cast spells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SpellKind {
    /// Fire explosion around a target position.
    Fireball,
    /// Freezes every live enemy in place.
    Freeze,
    /// Strikes the first few live enemies with lightning.
    LightningStorm,
    /// Restores player health.
    Heal,
}

/// Balance values of a spell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpellProfile {
    /// Gold spent on casting.
    pub cost: u32,
    /// Simulation time before the spell can be cast again.
    pub cooldown: Duration,
    /// Damage dealt to each affected enemy.
    pub damage: f32,
    /// Area radius for positional spells.
    pub radius: f32,
    /// Lifetime of the applied effect.
    pub duration: Duration,
    /// Maximum number of enemies struck.
    pub targets: usize,
    /// Player health restored.
    pub healing: u32,
}

impl SpellKind {
    /// Every spell in declaration order.
    pub const ALL: [SpellKind; 4] = [
        SpellKind::Fireball,
        SpellKind::Freeze,
        SpellKind::LightningStorm,
        SpellKind::Heal,
    ];

    /// Parses a catalogue key such as `LIGHTNING_STORM`.
    pub fn from_key(key: &str) -> Result<Self, CatalogError> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.key().eq_ignore_ascii_case(key))
            .ok_or_else(|| CatalogError::UnknownSpell(key.to_owned()))
    }

    /// Catalogue key of the spell.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Fireball => "FIREBALL",
            Self::Freeze => "FREEZE",
            Self::LightningStorm => "LIGHTNING_STORM",
            Self::Heal => "HEAL",
        }
    }

    /// Balance values for the spell.
    #[must_use]
    pub const fn profile(self) -> SpellProfile {
        const NONE: SpellProfile = SpellProfile {
            cost: 0,
            cooldown: Duration::ZERO,
            damage: 0.0,
            radius: 0.0,
            duration: Duration::ZERO,
            targets: 0,
            healing: 0,
        };

        match self {
            Self::Fireball => SpellProfile {
                cost: 40,
                cooldown: Duration::from_millis(8000),
                damage: 35.0,
                radius: 70.0,
                ..NONE
            },
            Self::Freeze => SpellProfile {
                cost: 50,
                cooldown: Duration::from_millis(12000),
                duration: Duration::from_millis(3000),
                ..NONE
            },
            Self::LightningStorm => SpellProfile {
                cost: 60,
                cooldown: Duration::from_millis(10000),
                damage: 40.0,
                targets: 4,
                ..NONE
            },
            Self::Heal => SpellProfile {
                cost: 35,
                cooldown: Duration::from_millis(15000),
                healing: 3,
                ..NONE
            },
        }
    }
}
