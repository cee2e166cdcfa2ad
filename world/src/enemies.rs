//! Enemy state and the per-tick enemy state machine.

use std::time::Duration;

use glam::Vec2;
use lane_defence_core::{
    geometry, Damageable, DamageType, EffectKind, EnemyId, EnemyProfile, EnemySnapshot,
    EnemyState, PeriodicTick, StatusEffectTable, Targetable, Updatable, UpdateFault,
};
use lane_defence_system_combat::{apply_damage, apply_healing, DamageOutcome};

/// Distance at which an enemy counts as having reached a waypoint.
pub(crate) const WAYPOINT_THRESHOLD: f32 = 5.0;

/// Enemy age between regeneration pulses.
pub(crate) const REGENERATION_INTERVAL: Duration = Duration::from_secs(1);

/// Authoritative state of a single enemy.
#[derive(Clone, Debug)]
pub(crate) struct Enemy {
    pub(crate) id: EnemyId,
    pub(crate) profile: EnemyProfile,
    pub(crate) wave: u32,
    pub(crate) position: Vec2,
    pub(crate) velocity: Vec2,
    pub(crate) health: u32,
    pub(crate) state: EnemyState,
    pub(crate) path_index: usize,
    pub(crate) age: Duration,
    regeneration_clock: Duration,
    pub(crate) effects: StatusEffectTable,
}

/// Periodic damage resolved during an enemy update.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct PeriodicHit {
    pub(crate) damage_type: DamageType,
    pub(crate) outcome: DamageOutcome,
}

/// Per-update inputs and scratch buffers.
#[derive(Debug)]
pub(crate) struct EnemyContext<'a> {
    pub(crate) path: &'a [Vec2],
    pub(crate) ticks: &'a mut Vec<PeriodicTick>,
    pub(crate) hits: &'a mut Vec<PeriodicHit>,
}

/// Where an enemy ended up after an update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum EnemyMotion {
    Moving,
    Died,
    ReachedEnd,
}

impl Enemy {
    pub(crate) fn spawn(id: EnemyId, profile: EnemyProfile, wave: u32, start: Vec2) -> Self {
        Self {
            id,
            profile,
            wave,
            position: start,
            velocity: Vec2::ZERO,
            health: profile.max_health,
            state: EnemyState::Moving,
            path_index: 0,
            age: Duration::ZERO,
            regeneration_clock: Duration::ZERO,
            effects: StatusEffectTable::new(),
        }
    }

    /// Movement speed after status effects.
    pub(crate) fn current_speed(&self) -> f32 {
        self.profile.speed * self.effects.speed_multiplier()
    }

    pub(crate) fn snapshot(&self) -> EnemySnapshot {
        EnemySnapshot {
            id: self.id,
            kind: self.profile.kind,
            wave: self.wave,
            position: self.position,
            velocity: self.velocity,
            health: self.health,
            max_health: self.profile.max_health,
            speed: self.current_speed(),
            path_progress: self.path_index,
            size: self.profile.size,
            state: self.state,
            effects: self.effects.kinds(),
        }
    }

    fn regenerate(&mut self, dt: Duration) {
        if self.profile.regeneration == 0 {
            return;
        }
        self.regeneration_clock = self.regeneration_clock.saturating_add(dt);
        while self.regeneration_clock >= REGENERATION_INTERVAL {
            let _ = apply_healing(self, self.profile.regeneration);
            self.regeneration_clock -= REGENERATION_INTERVAL;
        }
    }

    fn advance_along(&mut self, path: &[Vec2], dt: Duration) -> EnemyMotion {
        while let Some(waypoint) = path.get(self.path_index) {
            if self.position.distance(*waypoint) >= WAYPOINT_THRESHOLD {
                break;
            }
            self.path_index += 1;
        }

        let Some(waypoint) = path.get(self.path_index).copied() else {
            self.velocity = Vec2::ZERO;
            self.state = EnemyState::ReachedEnd;
            return EnemyMotion::ReachedEnd;
        };

        let speed = self.current_speed();
        let offset = waypoint - self.position;
        let distance = offset.length();
        let direction = offset / distance;
        let step = geometry::travel(speed, dt).min(distance);

        self.velocity = direction * speed;
        self.position += direction * step;
        EnemyMotion::Moving
    }
}

impl Updatable for Enemy {
    type Context<'a> = EnemyContext<'a>;
    type Outcome = EnemyMotion;

    fn update(
        &mut self,
        dt: Duration,
        context: EnemyContext<'_>,
    ) -> Result<EnemyMotion, UpdateFault> {
        if context.path.is_empty() {
            return Err(UpdateFault::EmptyPath);
        }
        if !geometry::is_finite(self.position) {
            return Err(UpdateFault::NonFinitePosition {
                x: self.position.x,
                y: self.position.y,
            });
        }
        if !self.profile.speed.is_finite() || self.profile.speed < 0.0 {
            return Err(UpdateFault::InvalidSpeed(self.profile.speed));
        }
        if self.state != EnemyState::Moving {
            return Ok(match self.state {
                EnemyState::ReachedEnd => EnemyMotion::ReachedEnd,
                _ => EnemyMotion::Died,
            });
        }

        self.age = self.age.saturating_add(dt);

        context.ticks.clear();
        self.effects.tick(dt, self.age, context.ticks);
        for tick in context.ticks.iter() {
            let outcome = apply_damage(self, tick.damage, tick.damage_type);
            context.hits.push(PeriodicHit {
                damage_type: tick.damage_type,
                outcome,
            });
            if outcome.killed {
                self.velocity = Vec2::ZERO;
                return Ok(EnemyMotion::Died);
            }
        }

        self.regenerate(dt);
        Ok(self.advance_along(context.path, dt))
    }
}

impl Damageable for Enemy {
    fn health(&self) -> u32 {
        self.health
    }

    fn max_health(&self) -> u32 {
        self.profile.max_health
    }

    fn resistance(&self, damage_type: DamageType) -> f32 {
        self.profile.resistances.get(damage_type)
    }

    fn is_immune_to(&self, damage_type: DamageType) -> bool {
        self.profile.immunities.blocks_damage(damage_type)
    }

    fn rejects_effect(&self, kind: EffectKind) -> bool {
        self.profile.immunities.blocks_effect(kind)
    }

    fn is_alive(&self) -> bool {
        self.state == EnemyState::Moving && self.health > 0
    }

    fn set_health(&mut self, health: u32) {
        self.health = health.min(self.profile.max_health);
    }

    fn mark_dead(&mut self) {
        self.health = 0;
        self.state = EnemyState::Dead;
    }

    fn age(&self) -> Duration {
        self.age
    }

    fn status_effects_mut(&mut self) -> &mut StatusEffectTable {
        &mut self.effects
    }
}

impl Targetable for Enemy {
    fn target_id(&self) -> EnemyId {
        self.id
    }

    fn position(&self) -> Vec2 {
        self.position
    }

    fn path_progress(&self) -> usize {
        self.path_index
    }

    fn is_targetable(&self) -> bool {
        self.is_alive()
    }
}

/// Registry that stores enemies and allocates identifiers.
#[derive(Debug)]
pub(crate) struct EnemyRegistry {
    pub(crate) entries: Vec<Enemy>,
    next_enemy_id: u32,
}

impl EnemyRegistry {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_enemy_id: 0,
        }
    }

    pub(crate) fn spawn(&mut self, profile: EnemyProfile, wave: u32, start: Vec2) -> EnemyId {
        let id = EnemyId::new(self.next_enemy_id);
        self.next_enemy_id = self.next_enemy_id.saturating_add(1);
        self.entries.push(Enemy::spawn(id, profile, wave, start));
        id
    }

    pub(crate) fn get(&self, id: EnemyId) -> Option<&Enemy> {
        self.entries
            .binary_search_by_key(&id, |enemy| enemy.id)
            .ok()
            .map(|index| &self.entries[index])
    }

    pub(crate) fn get_mut(&mut self, id: EnemyId) -> Option<&mut Enemy> {
        self.entries
            .binary_search_by_key(&id, |enemy| enemy.id)
            .ok()
            .map(|index| &mut self.entries[index])
    }

    /// Drops enemies that died or escaped, returning how many were removed.
    pub(crate) fn collect(&mut self) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|enemy| enemy.state == EnemyState::Moving);
        before - self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lane_defence_core::{EnemyKind, StatusEffect};

    fn run(enemy: &mut Enemy, path: &[Vec2], dt_ms: u64) -> Result<EnemyMotion, UpdateFault> {
        let mut ticks = Vec::new();
        let mut hits = Vec::new();
        enemy.update(
            Duration::from_millis(dt_ms),
            EnemyContext {
                path,
                ticks: &mut ticks,
                hits: &mut hits,
            },
        )
    }

    fn orc() -> Enemy {
        Enemy::spawn(EnemyId::new(0), EnemyKind::Orc.profile(), 1, Vec2::ZERO)
    }

    #[test]
    fn walks_the_path_and_reaches_the_end() {
        let path = [Vec2::ZERO, Vec2::new(60.0, 0.0)];
        let mut enemy = orc();

        assert_eq!(run(&mut enemy, &path, 500), Ok(EnemyMotion::Moving));
        assert_eq!(enemy.path_index, 1);
        assert!((enemy.position.x - 30.0).abs() < 1e-3);

        assert_eq!(run(&mut enemy, &path, 1000), Ok(EnemyMotion::Moving));
        assert!((enemy.position.x - 60.0).abs() < 1e-3, "movement never overshoots");

        assert_eq!(run(&mut enemy, &path, 16), Ok(EnemyMotion::ReachedEnd));
        assert_eq!(enemy.state, EnemyState::ReachedEnd);
    }

    #[test]
    fn freeze_halts_movement() {
        let path = [Vec2::ZERO, Vec2::new(100.0, 0.0)];
        let mut enemy = orc();
        let _ = enemy
            .effects
            .insert(StatusEffect::freeze(0.0, Duration::from_millis(500)), Duration::ZERO);

        let _ = run(&mut enemy, &path, 250);
        assert_eq!(enemy.position, Vec2::ZERO);

        let _ = run(&mut enemy, &path, 250);
        assert!(!enemy.effects.contains(EffectKind::Freeze));
        assert!((enemy.position.x - 15.0).abs() < 1e-3);
    }

    #[test]
    fn poison_can_kill_before_movement() {
        let path = [Vec2::ZERO, Vec2::new(100.0, 0.0)];
        let mut enemy = orc();
        enemy.health = 3;
        let _ = enemy.effects.insert(
            StatusEffect::poison(5.0, Duration::from_millis(1000), Duration::from_millis(5000)),
            Duration::ZERO,
        );

        assert_eq!(run(&mut enemy, &path, 999), Ok(EnemyMotion::Moving));
        let position = enemy.position;
        assert_eq!(run(&mut enemy, &path, 1), Ok(EnemyMotion::Died));
        assert_eq!(enemy.state, EnemyState::Dead);
        assert_eq!(enemy.position, position);
    }

    #[test]
    fn regeneration_heals_once_per_second() {
        let mut profile = EnemyKind::Troll.profile();
        profile.regeneration = 4;
        let mut enemy = Enemy::spawn(EnemyId::new(3), profile, 1, Vec2::ZERO);
        enemy.health = 100;
        let path = [Vec2::ZERO, Vec2::new(500.0, 0.0)];

        let _ = run(&mut enemy, &path, 600);
        assert_eq!(enemy.health, 100);
        let _ = run(&mut enemy, &path, 400);
        assert_eq!(enemy.health, 104);
    }

    #[test]
    fn regeneration_keeps_leftover_time_between_frames() {
        let mut profile = EnemyKind::Troll.profile();
        profile.regeneration = 4;
        let mut enemy = Enemy::spawn(EnemyId::new(4), profile, 1, Vec2::ZERO);
        enemy.health = 60;
        let path = [Vec2::ZERO, Vec2::new(1000.0, 0.0)];

        for _ in 0..304 {
            let _ = run(&mut enemy, &path, 33);
        }

        assert_eq!(enemy.health, 100, "ten pulses over 10032ms");
        assert_eq!(enemy.regeneration_clock, Duration::from_millis(32));
    }

    #[test]
    fn faults_leave_the_enemy_untouched() {
        let mut enemy = orc();
        assert_eq!(run(&mut enemy, &[], 100), Err(UpdateFault::EmptyPath));
        assert_eq!(enemy.age, Duration::ZERO);

        let mut profile = EnemyKind::Orc.profile();
        profile.speed = f32::NAN;
        let mut broken = Enemy::spawn(EnemyId::new(1), profile, 1, Vec2::ZERO);
        assert!(matches!(
            run(&mut broken, &[Vec2::ZERO, Vec2::X], 100),
            Err(UpdateFault::InvalidSpeed(_))
        ));
    }
}
