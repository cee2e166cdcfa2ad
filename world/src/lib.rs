#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for the lane defence simulation.
//!
//! The world owns every enemy, tower, and projectile. It mutates state only
//! through [`apply`], which consumes a single [`Command`] and reports what
//! happened as [`Event`] values; systems observe it through the read-only
//! [`query`] module. Cross-entity references are identifiers that are looked
//! up again on every use, so a removed entity simply stops resolving.

mod enemies;
mod placement;
mod projectiles;
mod towers;

use std::time::Duration;

use glam::Vec2;
use lane_defence_core::{
    geometry::Arena, Command, DamageType, Event, EnemyState, PeriodicTick, StatusEffect,
    Targetable, TowerStats, Updatable,
};
use lane_defence_system_combat::{
    add_status_effect, apply_area, apply_damage, apply_splash, resolve_chain, ChainLink,
    DamageOutcome, DamageReport,
};

use enemies::{Enemy, EnemyContext, EnemyMotion, EnemyRegistry, PeriodicHit};
use projectiles::{Flight, Launch, ProjectileRegistry};
use towers::TowerRegistry;

pub use placement::PlacementRules;

/// Waypoints of the default lane, left edge to right edge.
pub const DEFAULT_PATH: [(f32, f32); 11] = [
    (0.0, 300.0),
    (150.0, 300.0),
    (150.0, 200.0),
    (300.0, 200.0),
    (300.0, 400.0),
    (450.0, 400.0),
    (450.0, 150.0),
    (600.0, 150.0),
    (600.0, 350.0),
    (750.0, 350.0),
    (800.0, 350.0),
];

/// Static layout the world is built from.
#[derive(Clone, Debug, PartialEq)]
pub struct WorldConfig {
    /// Playable area.
    pub arena: Arena,
    /// Waypoints every enemy follows in order.
    pub path: Vec<Vec2>,
    /// Tower placement rules.
    pub placement: PlacementRules,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            arena: Arena::new(800.0, 600.0),
            path: DEFAULT_PATH
                .iter()
                .map(|(x, y)| Vec2::new(*x, *y))
                .collect(),
            placement: PlacementRules::default(),
        }
    }
}

#[derive(Debug, Default)]
struct Scratch {
    ticks: Vec<PeriodicTick>,
    hits: Vec<PeriodicHit>,
    reports: Vec<DamageReport>,
    links: Vec<ChainLink>,
}

/// Represents the authoritative world state.
#[derive(Debug)]
pub struct World {
    config: WorldConfig,
    enemies: EnemyRegistry,
    towers: TowerRegistry,
    projectiles: ProjectileRegistry,
    scratch: Scratch,
}

impl World {
    /// Creates an empty world over the provided layout.
    #[must_use]
    pub fn new(config: WorldConfig) -> Self {
        Self {
            config,
            enemies: EnemyRegistry::new(),
            towers: TowerRegistry::new(),
            projectiles: ProjectileRegistry::new(),
            scratch: Scratch::default(),
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(WorldConfig::default())
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::AdvanceEnemies { dt } => {
            out_events.push(Event::TimeAdvanced { dt });
            advance_enemies(world, dt, out_events);
        }
        Command::AdvanceTowers { dt } => {
            for tower in world.towers.iter_mut() {
                tower.age = tower.age.saturating_add(dt);
            }
        }
        Command::AssignTarget { tower, target } => match world.towers.get_mut(tower) {
            Some(state) => state.target = target,
            None => out_events.push(Event::TowerMissing { tower }),
        },
        Command::FireProjectile { tower, target } => {
            let Some(state) = world.towers.get(tower) else {
                out_events.push(Event::TowerMissing { tower });
                return;
            };
            if !world
                .enemies
                .get(target)
                .is_some_and(Targetable::is_targetable)
            {
                tracing::debug!(?tower, ?target, "projectile target no longer targetable");
                return;
            }

            let stats = &state.progress.stats;
            let projectile = world.projectiles.launch(Launch {
                source: tower,
                target,
                origin: state.position,
                speed: stats.projectile_speed,
                damage: stats.damage,
                damage_type: stats.damage_type,
                splash_radius: stats.splash_radius,
                payload: on_hit_effect(stats),
            });
            world.towers.record_attack(tower);
            out_events.push(Event::ProjectileFired {
                projectile,
                tower,
                target,
            });
        }
        Command::DischargeChain { tower, target } => discharge_chain(world, tower, target, out_events),
        Command::AdvanceProjectiles { dt } => advance_projectiles(world, dt, out_events),
        Command::CollectDestroyed => {
            let enemies = world.enemies.collect();
            let projectiles = world.projectiles.collect();
            if enemies > 0 || projectiles > 0 {
                tracing::debug!(enemies, projectiles, "collected destroyed entities");
            }
            for tower in world.towers.iter_mut() {
                if let Some(target) = tower.target {
                    if world.enemies.get(target).is_none() {
                        tower.target = None;
                    }
                }
            }
        }
        Command::SpawnEnemy { profile, wave } => {
            let start = world.config.path.first().copied().unwrap_or(Vec2::ZERO);
            let enemy = world.enemies.spawn(profile, wave, start);
            tracing::debug!(?enemy, kind = ?profile.kind, wave, "enemy spawned");
            out_events.push(Event::EnemySpawned {
                enemy,
                kind: profile.kind,
                wave,
            });
        }
        Command::PlaceTower { kind, position } => {
            let verdict = placement::validate(
                &world.config.placement,
                world.config.arena,
                &world.config.path,
                world.towers.positions(),
                position,
            );
            match verdict {
                Ok(()) => {
                    let tower = world.towers.insert(kind, position);
                    tracing::debug!(?tower, ?kind, "tower placed");
                    out_events.push(Event::TowerPlaced {
                        tower,
                        kind,
                        position,
                        cost: kind.profile().cost,
                    });
                }
                Err(reason) => out_events.push(Event::TowerPlacementRejected {
                    kind,
                    position,
                    reason,
                }),
            }
        }
        Command::CommitTowerProgress {
            tower,
            progress,
            change,
        } => {
            let Some(state) = world.towers.get_mut(tower) else {
                out_events.push(Event::TowerMissing { tower });
                return;
            };
            if state.progress.kind() != progress.kind() {
                tracing::warn!(?tower, "ignoring progression for a different tower family");
                return;
            }
            state.progress = progress;
            out_events.push(Event::TowerProgressed {
                tower,
                level: state.progress.level(),
                tier: state.progress.tier,
                change,
            });
        }
        Command::SellTower { tower } => match world.towers.remove(tower) {
            Some(state) => {
                tracing::debug!(?tower, "tower sold");
                out_events.push(Event::TowerSold {
                    tower,
                    kind: state.progress.kind(),
                    refund: state.progress.sell_value(),
                });
            }
            None => out_events.push(Event::TowerMissing { tower }),
        },
        Command::DamageArea {
            origin,
            radius,
            damage,
            damage_type,
        } => {
            world.scratch.reports.clear();
            apply_area(
                world.enemies.entries.iter_mut(),
                origin,
                radius,
                damage,
                damage_type,
                None,
                &mut world.scratch.reports,
            );
            report_all(&world.enemies, &world.scratch.reports, damage_type, out_events);
        }
        Command::DamageEnemies {
            enemies,
            damage,
            damage_type,
        } => {
            for id in enemies {
                if let Some(enemy) = world.enemies.get_mut(id) {
                    let outcome = apply_damage(enemy, damage, damage_type);
                    report_damage(enemy, outcome, damage_type, out_events);
                }
            }
        }
        Command::AfflictAll { effect } => {
            for enemy in world.enemies.entries.iter_mut() {
                if add_status_effect(enemy, effect) {
                    out_events.push(Event::StatusEffectApplied {
                        enemy: enemy.id,
                        effect: effect.kind(),
                    });
                }
            }
        }
    }
}

fn advance_enemies(world: &mut World, dt: Duration, out_events: &mut Vec<Event>) {
    for enemy in world.enemies.entries.iter_mut() {
        if enemy.state != EnemyState::Moving {
            continue;
        }

        world.scratch.hits.clear();
        let context = EnemyContext {
            path: &world.config.path,
            ticks: &mut world.scratch.ticks,
            hits: &mut world.scratch.hits,
        };

        match enemy.update(dt, context) {
            Ok(motion) => {
                for hit in &world.scratch.hits {
                    report_damage(enemy, hit.outcome, hit.damage_type, out_events);
                }
                if motion == EnemyMotion::ReachedEnd {
                    tracing::debug!(enemy = ?enemy.id, wave = enemy.wave, "enemy reached the end");
                    out_events.push(Event::EnemyReachedEnd {
                        enemy: enemy.id,
                        kind: enemy.profile.kind,
                        wave: enemy.wave,
                        damage: enemy.profile.damage,
                    });
                }
            }
            Err(fault) => {
                tracing::warn!(enemy = ?enemy.id, %fault, "skipping enemy update");
            }
        }
    }
}

fn advance_projectiles(world: &mut World, dt: Duration, out_events: &mut Vec<Event>) {
    for projectile in world.projectiles.entries.iter_mut() {
        if projectile.spent {
            continue;
        }

        let fix = world
            .enemies
            .get(projectile.target)
            .filter(|enemy| enemy.is_targetable())
            .map(|enemy| (enemy.position, enemy.profile.size));

        match projectile.update(dt, fix) {
            Ok(Flight::InFlight) => {}
            Ok(Flight::Expired(reason)) => {
                projectile.spent = true;
                tracing::debug!(projectile = ?projectile.id, ?reason, "projectile expired");
                out_events.push(Event::ProjectileExpired {
                    projectile: projectile.id,
                    reason,
                });
            }
            Ok(Flight::Hit(position)) => {
                projectile.spent = true;
                out_events.push(Event::ProjectileHit {
                    projectile: projectile.id,
                    target: projectile.target,
                    position,
                    splash_radius: projectile.splash_radius,
                });

                let target = projectile.target;
                let damage_type = projectile.damage_type;
                let primary = match world.enemies.get_mut(target) {
                    Some(enemy) => {
                        let outcome = apply_damage(enemy, projectile.damage, damage_type);
                        report_damage(enemy, outcome, damage_type, out_events);
                        if outcome.actual > 0 {
                            if let Some(effect) = projectile.payload {
                                if add_status_effect(enemy, effect) {
                                    out_events.push(Event::StatusEffectApplied {
                                        enemy: target,
                                        effect: effect.kind(),
                                    });
                                }
                            }
                        }
                        outcome
                    }
                    None => DamageOutcome::default(),
                };

                if projectile.splash_radius > 0.0 {
                    world.scratch.reports.clear();
                    apply_splash(
                        world.enemies.entries.iter_mut(),
                        position,
                        projectile.splash_radius,
                        projectile.damage,
                        damage_type,
                        Some(target),
                        &mut world.scratch.reports,
                    );
                    report_all(&world.enemies, &world.scratch.reports, damage_type, out_events);
                }

                tracing::debug!(
                    projectile = ?projectile.id,
                    damage = primary.actual,
                    killed = primary.killed,
                    "projectile hit"
                );
            }
            Err(fault) => {
                tracing::warn!(projectile = ?projectile.id, %fault, "skipping projectile update");
            }
        }
    }
}

fn discharge_chain(
    world: &mut World,
    tower: lane_defence_core::TowerId,
    target: lane_defence_core::EnemyId,
    out_events: &mut Vec<Event>,
) {
    let Some(state) = world.towers.get(tower) else {
        out_events.push(Event::TowerMissing { tower });
        return;
    };
    let stats = &state.progress.stats;
    let Some(chain) = stats.chain else {
        tracing::warn!(?tower, "chain discharge requested for a tower without a chain");
        return;
    };
    let origin = state.position;
    let damage_type = stats.damage_type;

    resolve_chain(
        &world.enemies.entries,
        target,
        stats.damage,
        stats.range,
        chain,
        &mut world.scratch.links,
    );
    if world.scratch.links.is_empty() {
        tracing::debug!(?tower, ?target, "chain target no longer targetable");
        return;
    }

    world.towers.record_attack(tower);

    let mut points = Vec::with_capacity(world.scratch.links.len() + 1);
    points.push(origin);
    for link in &world.scratch.links {
        points.push(link.position);
        if let Some(enemy) = world.enemies.get_mut(link.enemy) {
            let outcome = apply_damage(enemy, link.damage, damage_type);
            report_damage(enemy, outcome, damage_type, out_events);
        }
    }

    out_events.push(Event::ChainDischarged { tower, points });
}

fn on_hit_effect(stats: &TowerStats) -> Option<StatusEffect> {
    stats
        .slow
        .map(|slow| StatusEffect::slow(slow.speed_factor(), slow.duration))
        .or_else(|| {
            stats
                .poison
                .map(|poison| StatusEffect::poison(poison.damage, poison.interval, poison.duration))
        })
}

fn report_all(
    enemies: &EnemyRegistry,
    reports: &[DamageReport],
    damage_type: DamageType,
    out_events: &mut Vec<Event>,
) {
    for report in reports {
        if let Some(enemy) = enemies.get(report.enemy) {
            report_damage(enemy, report.outcome, damage_type, out_events);
        }
    }
}

fn report_damage(
    enemy: &Enemy,
    outcome: DamageOutcome,
    damage_type: DamageType,
    out_events: &mut Vec<Event>,
) {
    if outcome.actual == 0 {
        return;
    }

    out_events.push(Event::EnemyDamaged {
        enemy: enemy.id,
        amount: outcome.actual,
        damage_type,
    });

    if outcome.killed {
        tracing::debug!(enemy = ?enemy.id, kind = ?enemy.profile.kind, "enemy killed");
        out_events.push(Event::EnemyKilled {
            enemy: enemy.id,
            kind: enemy.profile.kind,
            wave: enemy.wave,
            position: enemy.position,
            gold: enemy.profile.gold_reward,
            score: enemy.profile.score_value,
        });
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use glam::Vec2;
    use lane_defence_core::{
        geometry::{self, Arena},
        EnemyId, EnemySnapshot, EnemyView, PlacementError, ProjectileSnapshot, Targetable,
        TowerId, TowerSnapshot, TowerView,
    };

    use super::{placement, PlacementRules, World};

    /// Captures a read-only view of every enemy on the field.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        EnemyView::from_snapshots(world.enemies.entries.iter().map(|enemy| enemy.snapshot()).collect())
    }

    /// Captures a read-only view of every tower on the field.
    #[must_use]
    pub fn tower_view(world: &World) -> TowerView {
        TowerView::from_snapshots(world.towers.iter().map(|tower| tower.snapshot()).collect())
    }

    /// Snapshots of every projectile in flight, ordered by identifier.
    #[must_use]
    pub fn projectiles(world: &World) -> Vec<ProjectileSnapshot> {
        world
            .projectiles
            .entries
            .iter()
            .filter(|projectile| !projectile.spent)
            .map(|projectile| projectile.snapshot())
            .collect()
    }

    /// Snapshot of a single enemy.
    #[must_use]
    pub fn enemy(world: &World, id: EnemyId) -> Option<EnemySnapshot> {
        world.enemies.get(id).map(|enemy| enemy.snapshot())
    }

    /// Snapshot of a single tower.
    #[must_use]
    pub fn tower(world: &World, id: TowerId) -> Option<TowerSnapshot> {
        world.towers.get(id).map(|tower| tower.snapshot())
    }

    /// Identifiers of enemies that can currently be targeted, in ascending order.
    #[must_use]
    pub fn live_enemy_ids(world: &World) -> Vec<EnemyId> {
        world
            .enemies
            .entries
            .iter()
            .filter(|enemy| enemy.is_targetable())
            .map(|enemy| enemy.id)
            .collect()
    }

    /// Number of enemies held by the world, including ones awaiting cleanup.
    #[must_use]
    pub fn enemy_count(world: &World) -> usize {
        world.enemies.entries.len()
    }

    /// Number of towers on the field.
    #[must_use]
    pub fn tower_count(world: &World) -> usize {
        world.towers.iter().count()
    }

    /// Waypoints enemies follow.
    #[must_use]
    pub fn path(world: &World) -> &[Vec2] {
        &world.config.path
    }

    /// Playable area.
    #[must_use]
    pub fn arena(world: &World) -> Arena {
        world.config.arena
    }

    /// Active placement rules.
    #[must_use]
    pub fn placement_rules(world: &World) -> &PlacementRules {
        &world.config.placement
    }

    /// Checks whether a tower could be built at `position` right now.
    pub fn can_place(world: &World, position: Vec2) -> Result<(), PlacementError> {
        placement::validate(
            &world.config.placement,
            world.config.arena,
            &world.config.path,
            world.towers.positions(),
            position,
        )
    }

    /// Grid-cell centres where a tower could be built, closest to the path first.
    ///
    /// Equal distances are ordered by row, then column, so the list is stable.
    #[must_use]
    pub fn placement_candidates(world: &World) -> Vec<Vec2> {
        let rules = &world.config.placement;
        let arena = world.config.arena;
        if !(rules.grid_size.is_finite() && rules.grid_size > 0.0) {
            return Vec::new();
        }

        let columns = (arena.width() / rules.grid_size).floor() as u32;
        let rows = (arena.height() / rules.grid_size).floor() as u32;
        let half = rules.grid_size / 2.0;

        let mut candidates: Vec<(f32, u32, u32, Vec2)> = Vec::new();
        for row in 0..rows {
            for column in 0..columns {
                let centre = Vec2::new(
                    column as f32 * rules.grid_size + half,
                    row as f32 * rules.grid_size + half,
                );
                if can_place(world, centre).is_err() {
                    continue;
                }
                let distance =
                    geometry::distance_to_polyline(centre, &world.config.path).unwrap_or(0.0);
                candidates.push((distance, row, column, centre));
            }
        }

        candidates.sort_by(|a, b| {
            a.0.total_cmp(&b.0)
                .then(a.1.cmp(&b.1))
                .then(a.2.cmp(&b.2))
        });
        candidates.into_iter().map(|candidate| candidate.3).collect()
    }
}
