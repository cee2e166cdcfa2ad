//! Capability traits implemented by simulation entities.
//!
//! Entities are plain structs composed from shared data; behaviour that
//! systems need is expressed through these small traits rather than a common
//! base type.

use std::time::Duration;

use glam::Vec2;
use thiserror::Error;

use crate::{
    catalog::DamageType,
    status::{EffectKind, StatusEffectTable},
    EnemyId,
};

/// Something that can lose health to typed damage and carry status effects.
pub trait Damageable {
    /// Current health.
    fn health(&self) -> u32;

    /// Health ceiling.
    fn max_health(&self) -> u32;

    /// Resistance fraction against the damage type.
    fn resistance(&self, damage_type: DamageType) -> f32;

    /// Reports whether the damage type is ignored entirely.
    fn is_immune_to(&self, damage_type: DamageType) -> bool;

    /// Reports whether status effects of the kind are rejected.
    fn rejects_effect(&self, kind: EffectKind) -> bool;

    /// Reports whether the entity can still be damaged.
    fn is_alive(&self) -> bool;

    /// Overwrites the current health. Implementations clamp to `max_health`.
    fn set_health(&mut self, health: u32);

    /// Transitions the entity into its terminal dead state.
    fn mark_dead(&mut self);

    /// Entity-local clock used to anchor periodic effects.
    fn age(&self) -> Duration;

    /// Mutable access to the entity's status effects.
    fn status_effects_mut(&mut self) -> &mut StatusEffectTable;
}

/// Something towers and chains can select as a target.
pub trait Targetable {
    /// Identity used for non-owning references.
    fn target_id(&self) -> EnemyId;

    /// Current position.
    fn position(&self) -> Vec2;

    /// Ordinal of the waypoint the entity is heading towards.
    fn path_progress(&self) -> usize;

    /// Reports whether the entity may currently be targeted.
    fn is_targetable(&self) -> bool;
}

impl<T: Targetable + ?Sized> Targetable for &T {
    fn target_id(&self) -> EnemyId {
        (**self).target_id()
    }

    fn position(&self) -> Vec2 {
        (**self).position()
    }

    fn path_progress(&self) -> usize {
        (**self).path_progress()
    }

    fn is_targetable(&self) -> bool {
        (**self).is_targetable()
    }
}

/// Something advanced once per tick.
pub trait Updatable {
    /// Per-call input the entity needs beyond its own state.
    type Context<'a>;
    /// Result of a successful update.
    type Outcome;

    /// Advances the entity by `dt`.
    fn update(
        &mut self,
        dt: Duration,
        context: Self::Context<'_>,
    ) -> Result<Self::Outcome, UpdateFault>;
}

/// Faults that abort a single entity's update for one tick.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum UpdateFault {
    /// The entity's position stopped being a finite number.
    #[error("position became non-finite ({x}, {y})")]
    NonFinitePosition {
        /// Horizontal component at the time of the fault.
        x: f32,
        /// Vertical component at the time of the fault.
        y: f32,
    },
    /// The entity's speed stopped being a finite non-negative number.
    #[error("speed {0} is not a finite non-negative number")]
    InvalidSpeed(f32),
    /// The entity was asked to follow a path without waypoints.
    #[error("entity has no path to follow")]
    EmptyPath,
}
