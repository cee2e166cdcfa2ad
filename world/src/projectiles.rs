//! Homing projectiles and their per-tick state machine.

use std::time::Duration;

use glam::Vec2;
use lane_defence_core::{
    geometry, DamageType, EnemyId, ExpiryReason, ProjectileId, ProjectileSnapshot, StatusEffect,
    TowerId, Updatable, UpdateFault,
};

/// Lifetime after which an unresolved projectile expires.
pub(crate) const PROJECTILE_MAX_AGE: Duration = Duration::from_millis(5000);

/// Base collision radius of a projectile, added to half the target's size.
pub(crate) const PROJECTILE_RADIUS: f32 = 5.0;

/// Authoritative state of a single projectile.
#[derive(Clone, Debug)]
pub(crate) struct Projectile {
    pub(crate) id: ProjectileId,
    pub(crate) source: TowerId,
    pub(crate) target: EnemyId,
    pub(crate) position: Vec2,
    pub(crate) velocity: Vec2,
    pub(crate) speed: f32,
    pub(crate) damage: f32,
    pub(crate) damage_type: DamageType,
    pub(crate) splash_radius: f32,
    pub(crate) payload: Option<StatusEffect>,
    pub(crate) age: Duration,
    pub(crate) spent: bool,
}

/// Launch parameters copied from the firing tower.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Launch {
    pub(crate) source: TowerId,
    pub(crate) target: EnemyId,
    pub(crate) origin: Vec2,
    pub(crate) speed: f32,
    pub(crate) damage: f32,
    pub(crate) damage_type: DamageType,
    pub(crate) splash_radius: f32,
    pub(crate) payload: Option<StatusEffect>,
}

/// Live target position and body size, or `None` when the target is gone.
pub(crate) type TargetFix = Option<(Vec2, f32)>;

/// Result of advancing a projectile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Flight {
    InFlight,
    Hit(Vec2),
    Expired(ExpiryReason),
}

impl Projectile {
    pub(crate) fn snapshot(&self) -> ProjectileSnapshot {
        ProjectileSnapshot {
            id: self.id,
            source: self.source,
            target: self.target,
            position: self.position,
            velocity: self.velocity,
            damage: self.damage,
            splash_radius: self.splash_radius,
            age: self.age,
        }
    }
}

impl Updatable for Projectile {
    type Context<'a> = TargetFix;
    type Outcome = Flight;

    fn update(&mut self, dt: Duration, target: TargetFix) -> Result<Flight, UpdateFault> {
        if !geometry::is_finite(self.position) {
            return Err(UpdateFault::NonFinitePosition {
                x: self.position.x,
                y: self.position.y,
            });
        }
        if !self.speed.is_finite() || self.speed < 0.0 {
            return Err(UpdateFault::InvalidSpeed(self.speed));
        }
        if self.spent {
            return Ok(Flight::Expired(ExpiryReason::TargetLost));
        }

        let Some((target_position, target_size)) = target else {
            return Ok(Flight::Expired(ExpiryReason::TargetLost));
        };

        self.age = self.age.saturating_add(dt);
        if self.age > PROJECTILE_MAX_AGE {
            return Ok(Flight::Expired(ExpiryReason::MaxAge));
        }

        let offset = target_position - self.position;
        let distance = offset.length();
        let step = geometry::travel(self.speed, dt);

        if self.speed == 0.0 || distance <= step {
            self.position = target_position;
            return Ok(Flight::Hit(target_position));
        }

        let direction = offset / distance;
        self.velocity = direction * self.speed;
        self.position += direction * step;

        if self.position.distance(target_position) <= PROJECTILE_RADIUS + target_size / 2.0 {
            return Ok(Flight::Hit(self.position));
        }
        Ok(Flight::InFlight)
    }
}

/// Registry that stores projectiles and allocates identifiers.
#[derive(Debug)]
pub(crate) struct ProjectileRegistry {
    pub(crate) entries: Vec<Projectile>,
    next_projectile_id: u32,
}

impl ProjectileRegistry {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_projectile_id: 0,
        }
    }

    pub(crate) fn launch(&mut self, launch: Launch) -> ProjectileId {
        let id = ProjectileId::new(self.next_projectile_id);
        self.next_projectile_id = self.next_projectile_id.saturating_add(1);
        self.entries.push(Projectile {
            id,
            source: launch.source,
            target: launch.target,
            position: launch.origin,
            velocity: Vec2::ZERO,
            speed: launch.speed,
            damage: launch.damage,
            damage_type: launch.damage_type,
            splash_radius: launch.splash_radius,
            payload: launch.payload,
            age: Duration::ZERO,
            spent: false,
        });
        id
    }

    /// Drops spent projectiles, returning how many were removed.
    pub(crate) fn collect(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|projectile| !projectile.spent);
        before - self.entries.len()
    }
}
