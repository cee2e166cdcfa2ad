#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Lane Defence simulation.
//!
//! This crate defines the message surface that connects the orchestrator,
//! the authoritative world, and pure systems. The orchestrator submits
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point and reports [`Event`] values, and
//! systems consume immutable views to respond with new command batches.
//! User interfaces talk to the orchestrator through [`PlayerCommand`] and
//! observe it through [`Notification`].

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod capability;
pub mod catalog;
pub mod geometry;
pub mod interface;
pub mod status;
pub mod tower;
pub mod wave;

pub use capability::{Damageable, Targetable, Updatable, UpdateFault};
pub use catalog::{
    AttackDelivery, CatalogError, ChainProfile, DamageType, EnemyKind, EnemyProfile, Immunities,
    PeriodicPayload, Resistances, SlowPayload, SpellKind, SpellProfile, TowerKind, TowerProfile,
};
pub use interface::{
    CommandError, EffectCue, EvolutionError, GameOverReport, GameResult, Notification,
    PlayerCommand, Statistics, UpgradeError,
};
pub use status::{EffectKind, EffectPayload, PeriodicTick, StatusEffect, StatusEffectTable};
pub use tower::{EvolutionId, TowerProgress, TowerStats, UpgradeLevels, UpgradeStat};
pub use wave::{SpawnStrategy, WaveConfig, WaveStartError};

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances every live enemy: status effects, regeneration, movement.
    AdvanceEnemies {
        /// Simulated time that elapsed.
        dt: Duration,
    },
    /// Advances the attack clocks of every tower.
    AdvanceTowers {
        /// Simulated time that elapsed.
        dt: Duration,
    },
    /// Replaces a tower's current target reference.
    AssignTarget {
        /// Tower whose target changes.
        tower: TowerId,
        /// New target, or `None` to clear it.
        target: Option<EnemyId>,
    },
    /// Fires projectiles from a tower at its target.
    FireProjectile {
        /// Attacking tower.
        tower: TowerId,
        /// Primary target.
        target: EnemyId,
    },
    /// Resolves an instant chain discharge from a tower.
    DischargeChain {
        /// Attacking tower.
        tower: TowerId,
        /// First link of the chain.
        target: EnemyId,
    },
    /// Advances every projectile and resolves hits.
    AdvanceProjectiles {
        /// Simulated time that elapsed.
        dt: Duration,
    },
    /// Removes dead enemies, escaped enemies, and spent projectiles.
    CollectDestroyed,
    /// Spawns an enemy at the start of the path.
    SpawnEnemy {
        /// Scaled statistics of the new enemy.
        profile: EnemyProfile,
        /// Wave the enemy belongs to.
        wave: u32,
    },
    /// Builds a tower after validating the placement.
    PlaceTower {
        /// Kind of tower to build.
        kind: TowerKind,
        /// Centre of the tower.
        position: Vec2,
    },
    /// Replaces a tower's progression with an already validated one.
    CommitTowerProgress {
        /// Tower to update.
        tower: TowerId,
        /// Progression after the change.
        progress: TowerProgress,
        /// Change that produced the new progression.
        change: ProgressChange,
    },
    /// Removes a tower and reports its refund.
    SellTower {
        /// Tower to sell.
        tower: TowerId,
    },
    /// Damages every live enemy within a radius.
    DamageArea {
        /// Centre of the area.
        origin: Vec2,
        /// Radius of the area.
        radius: f32,
        /// Damage before resistances.
        damage: f32,
        /// Element of the damage.
        damage_type: DamageType,
    },
    /// Damages the listed enemies.
    DamageEnemies {
        /// Enemies to damage.
        enemies: Vec<EnemyId>,
        /// Damage before resistances.
        damage: f32,
        /// Element of the damage.
        damage_type: DamageType,
    },
    /// Applies a status effect to every live enemy.
    AfflictAll {
        /// Effect to apply.
        effect: StatusEffect,
    },
}

/// Progression change carried by [`Command::CommitTowerProgress`].
#[derive(Clone, Debug, PartialEq)]
pub enum ProgressChange {
    /// A stat was bought.
    Upgraded {
        /// Stat that improved.
        stat: UpgradeStat,
        /// Gold paid.
        cost: u32,
    },
    /// An evolution node was taken.
    Evolved {
        /// Node that was taken.
        evolution: EvolutionId,
        /// Gold paid.
        cost: u32,
    },
}

/// Reasons a projectile left play without hitting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExpiryReason {
    /// The target died or escaped before contact.
    TargetLost,
    /// The projectile outlived its maximum age.
    MaxAge,
}

/// Events reported by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that an enemy entered the path.
    EnemySpawned {
        /// Identifier assigned to the enemy.
        enemy: EnemyId,
        /// Kind of the enemy.
        kind: EnemyKind,
        /// Wave the enemy belongs to.
        wave: u32,
    },
    /// Reports damage dealt to an enemy after resistances.
    EnemyDamaged {
        /// Enemy that was hit.
        enemy: EnemyId,
        /// Health removed.
        amount: u32,
        /// Element of the damage.
        damage_type: DamageType,
    },
    /// Reports that an enemy's health reached zero. Emitted once per enemy.
    EnemyKilled {
        /// Enemy that died.
        enemy: EnemyId,
        /// Kind of the enemy.
        kind: EnemyKind,
        /// Wave the enemy belonged to.
        wave: u32,
        /// Where the enemy died.
        position: Vec2,
        /// Gold owed to the player.
        gold: u32,
        /// Score owed to the player.
        score: u32,
    },
    /// Reports that an enemy completed its path.
    EnemyReachedEnd {
        /// Enemy that escaped.
        enemy: EnemyId,
        /// Kind of the enemy.
        kind: EnemyKind,
        /// Wave the enemy belonged to.
        wave: u32,
        /// Health owed by the player.
        damage: u32,
    },
    /// Reports that a status effect took hold.
    StatusEffectApplied {
        /// Affected enemy.
        enemy: EnemyId,
        /// Kind of the effect.
        effect: EffectKind,
    },
    /// Confirms that a tower was built.
    TowerPlaced {
        /// Identifier assigned to the tower.
        tower: TowerId,
        /// Kind of the tower.
        kind: TowerKind,
        /// Centre of the tower.
        position: Vec2,
        /// Gold owed for construction.
        cost: u32,
    },
    /// Reports that a placement request was rejected.
    TowerPlacementRejected {
        /// Requested kind.
        kind: TowerKind,
        /// Requested centre.
        position: Vec2,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that a tower's progression changed.
    TowerProgressed {
        /// Updated tower.
        tower: TowerId,
        /// Level after the change.
        level: u32,
        /// Tier after the change.
        tier: u8,
        /// Change that was committed.
        change: ProgressChange,
    },
    /// Confirms that a tower was sold.
    TowerSold {
        /// Sold tower.
        tower: TowerId,
        /// Kind of the tower.
        kind: TowerKind,
        /// Gold owed to the player.
        refund: u32,
    },
    /// Reports that a command referenced a tower that does not exist.
    TowerMissing {
        /// Identifier from the command.
        tower: TowerId,
    },
    /// Confirms that a projectile was launched.
    ProjectileFired {
        /// Identifier assigned to the projectile.
        projectile: ProjectileId,
        /// Tower that fired.
        tower: TowerId,
        /// Enemy the projectile homes on.
        target: EnemyId,
    },
    /// Reports that a projectile struck its target.
    ProjectileHit {
        /// Projectile that hit.
        projectile: ProjectileId,
        /// Enemy that was struck.
        target: EnemyId,
        /// Impact point.
        position: Vec2,
        /// Splash radius around the impact, zero when none.
        splash_radius: f32,
    },
    /// Reports that a projectile left play without hitting.
    ProjectileExpired {
        /// Projectile that expired.
        projectile: ProjectileId,
        /// Why it expired.
        reason: ExpiryReason,
    },
    /// Reports an instant chain discharge.
    ChainDischarged {
        /// Tower that discharged.
        tower: TowerId,
        /// Positions struck, in chain order, starting at the tower.
        points: Vec<Vec2>,
    },
}

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Creates a new identifier with the provided numeric value.
            #[must_use]
            pub const fn new(value: u32) -> Self {
                Self(value)
            }

            /// Retrieves the numeric representation of the identifier.
            #[must_use]
            pub const fn get(&self) -> u32 {
                self.0
            }
        }
    };
}

entity_id!(
    /// Unique identifier assigned to an enemy.
    EnemyId
);
entity_id!(
    /// Unique identifier assigned to a tower.
    TowerId
);
entity_id!(
    /// Unique identifier assigned to a projectile.
    ProjectileId
);

/// Reasons a tower placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum PlacementError {
    /// The requested position is not a finite point.
    #[error("position is not finite")]
    NonFinitePosition,
    /// The tower would extend beyond the arena.
    #[error("tower would extend beyond the arena")]
    OutOfBounds,
    /// The tower would sit on or too close to the enemy path.
    #[error("tower is too close to the path")]
    TooCloseToPath,
    /// The grid cell already holds the maximum number of towers.
    #[error("grid cell is full")]
    CellFull,
    /// The tower would overlap another tower.
    #[error("tower overlaps another tower")]
    Overlapping,
}

/// Lifecycle state of an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EnemyState {
    /// Following the path.
    Moving,
    /// Health reached zero; awaiting cleanup.
    Dead,
    /// Completed the path; awaiting cleanup.
    ReachedEnd,
}

/// Immutable representation of a single enemy's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Unique identifier assigned to the enemy.
    pub id: EnemyId,
    /// Kind of the enemy.
    pub kind: EnemyKind,
    /// Wave the enemy belongs to.
    pub wave: u32,
    /// Current position.
    pub position: Vec2,
    /// Current velocity in units per second.
    pub velocity: Vec2,
    /// Current health.
    pub health: u32,
    /// Health ceiling.
    pub max_health: u32,
    /// Speed after status effects.
    pub speed: f32,
    /// Waypoint index the enemy is heading towards.
    pub path_progress: usize,
    /// Body diameter.
    pub size: f32,
    /// Lifecycle state.
    pub state: EnemyState,
    /// Kinds of live status effects.
    pub effects: Vec<EffectKind>,
}

impl Targetable for EnemySnapshot {
    fn target_id(&self) -> EnemyId {
        self.id
    }

    fn position(&self) -> Vec2 {
        self.position
    }

    fn path_progress(&self) -> usize {
        self.path_progress
    }

    fn is_targetable(&self) -> bool {
        self.state == EnemyState::Moving && self.health > 0
    }
}

/// Read-only snapshot describing all enemies on the field.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured enemy snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Snapshots as a slice ordered by identifier.
    #[must_use]
    pub fn as_slice(&self) -> &[EnemySnapshot] {
        &self.snapshots
    }

    /// Looks up a single enemy by identifier.
    #[must_use]
    pub fn get(&self, id: EnemyId) -> Option<&EnemySnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of captured enemies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single tower's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct TowerSnapshot {
    /// Identifier allocated to the tower by the world.
    pub id: TowerId,
    /// Kind of tower that was constructed.
    pub kind: TowerKind,
    /// Centre of the tower.
    pub position: Vec2,
    /// Stats, upgrades, and evolution state.
    pub progress: TowerProgress,
    /// Currently selected target.
    pub target: Option<EnemyId>,
    /// Tower-local attack clock.
    pub age: Duration,
    /// Tower age at the most recent attack.
    pub last_attack: Duration,
}

impl TowerSnapshot {
    /// Time elapsed on the tower clock since its last attack.
    #[must_use]
    pub fn since_last_attack(&self) -> Duration {
        self.age.saturating_sub(self.last_attack)
    }
}

/// Read-only snapshot describing all towers placed on the field.
#[derive(Clone, Debug, Default)]
pub struct TowerView {
    snapshots: Vec<TowerSnapshot>,
}

impl TowerView {
    /// Creates a new tower view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured tower snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up a single tower by identifier.
    #[must_use]
    pub fn get(&self, id: TowerId) -> Option<&TowerSnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of captured towers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single projectile used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectileSnapshot {
    /// Identifier allocated to the projectile.
    pub id: ProjectileId,
    /// Tower that fired the projectile.
    pub source: TowerId,
    /// Enemy the projectile homes on.
    pub target: EnemyId,
    /// Current position.
    pub position: Vec2,
    /// Current velocity in units per second.
    pub velocity: Vec2,
    /// Damage dealt on impact.
    pub damage: f32,
    /// Splash radius around the impact.
    pub splash_radius: f32,
    /// Time spent in flight.
    pub age: Duration,
}

/// Target selected by the targeting engine for a single tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TowerTarget {
    /// Tower the assignment belongs to.
    pub tower: TowerId,
    /// Selected enemy, `None` when nothing is in range.
    pub target: Option<EnemyId>,
}
