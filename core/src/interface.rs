//! Inbound player commands and outbound notifications of the simulation.

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    catalog::{EnemyKind, SpellKind, TowerKind},
    tower::{EvolutionId, UpgradeStat},
    wave::WaveStartError,
    EnemyId, PlacementError, TowerId,
};

/// Requests pushed into the simulation by user interfaces.
#[derive(Clone, Debug, PartialEq)]
pub enum PlayerCommand {
    /// Builds a tower at the provided position.
    PlaceTower {
        /// Kind of tower to build.
        kind: TowerKind,
        /// Centre of the tower.
        position: Vec2,
    },
    /// Buys one level of a tower stat.
    UpgradeTower {
        /// Tower to upgrade.
        tower: TowerId,
        /// Stat to improve.
        stat: UpgradeStat,
    },
    /// Moves a tower along its evolution tree.
    EvolveTower {
        /// Tower to evolve.
        tower: TowerId,
        /// Evolution node to take.
        evolution: EvolutionId,
    },
    /// Sells a tower for a partial refund.
    SellTower {
        /// Tower to sell.
        tower: TowerId,
    },
    /// Casts a spell, optionally aimed at a position.
    CastSpell {
        /// Spell to cast.
        spell: SpellKind,
        /// Aim point for positional spells.
        target: Option<Vec2>,
    },
    /// Starts the next wave if none is active.
    StartNextWave,
    /// Freezes the simulation clock.
    Pause,
    /// Unfreezes the simulation clock.
    Resume,
    /// Discards the run and starts over.
    Restart,
}

/// Reasons a tower progression purchase is refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum UpgradeError {
    /// The stat already reached its purchase cap.
    #[error("{stat:?} is already at its maximum level")]
    MaxLevel {
        /// Stat that is capped.
        stat: UpgradeStat,
    },
    /// The tower family has no use for the stat.
    #[error("{stat:?} cannot be upgraded on this tower")]
    NotApplicable {
        /// Stat that was requested.
        stat: UpgradeStat,
    },
}

/// Reasons an evolution is refused.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum EvolutionError {
    /// No node with the identifier exists.
    #[error("unknown evolution `{0}`")]
    Unknown(EvolutionId),
    /// The node belongs to another tower family.
    #[error("evolution `{evolution}` does not apply to {kind:?} towers")]
    WrongFamily {
        /// Requested node.
        evolution: EvolutionId,
        /// Family of the tower.
        kind: TowerKind,
    },
    /// The tower level is below the node's requirement.
    #[error("evolution requires level {required}, tower is level {current}")]
    LevelTooLow {
        /// Level demanded by the node.
        required: u32,
        /// Level of the tower.
        current: u32,
    },
    /// The tower has not taken the node's prerequisite.
    #[error("evolution requires prior evolution {required:?}")]
    PrerequisiteUnmet {
        /// Prerequisite demanded by the node, `None` for base-tier nodes.
        required: Option<EvolutionId>,
    },
    /// The tower already took this exact node.
    #[error("evolution `{0}` was already taken")]
    AlreadyTaken(EvolutionId),
    /// The node would not raise the tower's tier.
    #[error("evolution tier {requested} does not exceed current tier {current}")]
    TierNotIncreasing {
        /// Tier of the tower.
        current: u8,
        /// Tier of the node.
        requested: u8,
    },
}

/// Reasons a player command was refused.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum CommandError {
    /// The player cannot afford the action.
    #[error("requires {required} gold, {available} available")]
    InsufficientGold {
        /// Gold the action costs.
        required: u32,
        /// Gold the player holds.
        available: u32,
    },
    /// The tower placement is illegal.
    #[error("placement rejected: {0}")]
    Placement(#[from] PlacementError),
    /// The upgrade purchase is illegal.
    #[error("upgrade rejected: {0}")]
    Upgrade(#[from] UpgradeError),
    /// The evolution is illegal.
    #[error("evolution rejected: {0}")]
    Evolution(#[from] EvolutionError),
    /// The next wave cannot start.
    #[error("wave start rejected: {0}")]
    WaveStart(#[from] WaveStartError),
    /// The spell is still recharging.
    #[error("{spell:?} is recharging for another {remaining:?}")]
    SpellOnCooldown {
        /// Spell that was requested.
        spell: SpellKind,
        /// Time left until the spell is ready.
        remaining: Duration,
    },
    /// A positional spell was cast without a target.
    #[error("{0:?} requires a target position")]
    MissingSpellTarget(SpellKind),
    /// No tower with the identifier exists.
    #[error("tower {0:?} does not exist")]
    UnknownTower(TowerId),
    /// The simulation is paused or finished.
    #[error("simulation is not running")]
    NotRunning,
}

/// Outcome of a finished run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameResult {
    /// Every wave was survived.
    Victory,
    /// Player health reached zero.
    Defeat,
}

/// Aggregate statistics persisted across runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Statistics {
    /// Enemies killed.
    pub enemies_killed: u64,
    /// Towers built.
    pub towers_built: u64,
    /// Spells cast.
    pub spells_cast: u64,
    /// Damage dealt by towers and spells after resistances.
    pub total_damage_dealt: u64,
    /// Waves completed.
    pub waves_completed: u64,
    /// Best score reached.
    pub high_score: u64,
}

impl Statistics {
    /// Folds persisted statistics into these: counters add, the high score keeps the maximum.
    pub fn merge(&mut self, other: &Statistics) {
        self.enemies_killed = self.enemies_killed.saturating_add(other.enemies_killed);
        self.towers_built = self.towers_built.saturating_add(other.towers_built);
        self.spells_cast = self.spells_cast.saturating_add(other.spells_cast);
        self.total_damage_dealt = self
            .total_damage_dealt
            .saturating_add(other.total_damage_dealt);
        self.waves_completed = self.waves_completed.saturating_add(other.waves_completed);
        self.high_score = self.high_score.max(other.high_score);
    }
}

/// Final payload published when a run ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameOverReport {
    /// Victory or defeat.
    pub result: GameResult,
    /// Score accumulated during the run.
    pub score: u64,
    /// Statistics after the run.
    pub statistics: Statistics,
}

/// Purely cosmetic effect hints for renderers and audio.
#[derive(Clone, Debug, PartialEq)]
pub enum EffectCue {
    /// Area explosion.
    Explosion {
        /// Centre of the explosion.
        position: Vec2,
        /// Radius of the explosion.
        radius: f32,
    },
    /// Projectile impact without splash.
    Impact {
        /// Impact point.
        position: Vec2,
    },
    /// Lightning arcing through a sequence of points.
    Lightning {
        /// Points struck, in order.
        points: Vec<Vec2>,
    },
    /// Freezing wave across the arena.
    FreezeWave {
        /// Origin of the wave.
        center: Vec2,
        /// Lifetime of the freeze.
        duration: Duration,
    },
    /// Player heal.
    Heal {
        /// Health restored.
        amount: u32,
    },
    /// Enemy death.
    EnemyDeath {
        /// Where the enemy died.
        position: Vec2,
    },
}

/// Outbound notifications published by the simulation.
#[derive(Clone, Debug, PartialEq)]
pub enum Notification {
    /// Player gold changed.
    GoldChanged {
        /// New gold total.
        gold: u32,
    },
    /// Player health changed.
    HealthChanged {
        /// New health total.
        health: u32,
    },
    /// A new wave started.
    WaveChanged {
        /// Number of the wave.
        wave: u32,
    },
    /// The active wave was cleared.
    WaveCompleted {
        /// Number of the wave.
        wave: u32,
        /// Gold bonus awarded.
        bonus: u32,
    },
    /// An enemy died.
    EnemyKilled {
        /// Enemy that died.
        enemy: EnemyId,
        /// Kind of the enemy.
        kind: EnemyKind,
        /// Gold awarded.
        gold: u32,
        /// Score awarded.
        score: u32,
    },
    /// An enemy reached the end of the path.
    EnemyReachedEnd {
        /// Enemy that escaped.
        enemy: EnemyId,
        /// Kind of the enemy.
        kind: EnemyKind,
        /// Health removed from the player.
        damage: u32,
    },
    /// A tower was built.
    TowerBuilt {
        /// New tower.
        tower: TowerId,
        /// Kind of the tower.
        kind: TowerKind,
        /// Centre of the tower.
        position: Vec2,
    },
    /// A tower stat was upgraded.
    TowerUpgraded {
        /// Upgraded tower.
        tower: TowerId,
        /// Stat that improved.
        stat: UpgradeStat,
        /// Tower level after the purchase.
        level: u32,
    },
    /// A tower evolved.
    TowerEvolved {
        /// Evolved tower.
        tower: TowerId,
        /// Node taken.
        evolution: EvolutionId,
        /// Tier after evolving.
        tier: u8,
    },
    /// A tower was sold.
    TowerSold {
        /// Sold tower.
        tower: TowerId,
        /// Gold refunded.
        refund: u32,
    },
    /// A spell was cast.
    SpellCast {
        /// Spell that was cast.
        spell: SpellKind,
    },
    /// Cosmetic effect hint.
    EffectRequested(EffectCue),
    /// A player command was refused.
    CommandRejected(CommandError),
    /// The simulation was paused.
    Paused,
    /// The simulation was resumed.
    Resumed,
    /// The run was restarted.
    Restarted,
    /// Every wave has been played.
    RunCompleted,
    /// The run ended.
    GameOver(GameOverReport),
}
