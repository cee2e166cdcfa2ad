#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Tick-driven orchestrator that owns the world and drives every system.
//!
//! A [`Simulation`] is the single context object of a run. User interfaces
//! push [`PlayerCommand`] values through [`Simulation::submit`], advance time
//! with [`Simulation::tick`], and observe the outcome through
//! [`Simulation::drain_notifications`] and [`Simulation::snapshot`].
//!
//! Each tick runs in a fixed order: enemies, tower clocks, targeting, tower
//! attacks, projectiles, cleanup, event routing and the defeat check, deferred
//! timers, and finally wave scheduling.

mod config;
mod economy;
mod spells;
mod timer;

use std::time::Duration;

use glam::Vec2;
use lane_defence_core::{
    Command, CommandError, EffectCue, EnemySnapshot, Event, EvolutionId, GameOverReport,
    GameResult, Notification, PlayerCommand, ProgressChange, ProjectileSnapshot, SpellKind,
    Statistics, Targetable, TowerId, TowerKind, TowerProgress, TowerSnapshot, TowerTarget,
    UpgradeStat, WaveStartError,
};
use lane_defence_system_evolution::{
    apply_upgrade, quote_upgrade, EvolutionCatalogError, EvolutionTree,
};
use lane_defence_system_spawning::{WaveProgress, WaveScheduler};
use lane_defence_system_tower_combat::TowerCombat;
use lane_defence_system_tower_targeting::TowerTargeting;
use lane_defence_system_wave_generation::standard_plan;
use lane_defence_world::{self as world, query, World};
use thiserror::Error;

use economy::Economy;
use spells::{SpellBook, SpellEffect};
use timer::{DeferredTimers, TimerAction, TimerId};

pub use config::{ArenaConfig, ConfigError, SimulationConfig};

/// Errors raised while constructing a [`Simulation`].
#[derive(Debug, Error)]
pub enum SimulationError {
    /// The configuration failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The built-in evolution catalogue failed to load.
    #[error(transparent)]
    Catalog(#[from] EvolutionCatalogError),
}

/// Lifecycle phase of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Time advances on every tick.
    Running,
    /// Time, cooldowns, effects, and timers are frozen.
    Paused,
    /// The run ended.
    Finished(GameResult),
}

/// Immutable view of a run for renderers and tooling.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationSnapshot {
    /// Lifecycle phase.
    pub phase: Phase,
    /// Simulated time since the run began.
    pub clock: Duration,
    /// Player gold.
    pub gold: u32,
    /// Player health.
    pub health: u32,
    /// Score of the run.
    pub score: u64,
    /// Most recently started wave, zero before the first.
    pub wave: u32,
    /// Whether a wave is in progress.
    pub wave_active: bool,
    /// Enemies on the field, by identifier.
    pub enemies: Vec<EnemySnapshot>,
    /// Towers with their selected targets, by identifier.
    pub towers: Vec<TowerSnapshot>,
    /// Projectiles in flight.
    pub projectiles: Vec<ProjectileSnapshot>,
    /// Remaining cooldown of every spell.
    pub spell_cooldowns: Vec<(SpellKind, Duration)>,
}

/// Owns the world, the systems, and the player's resources for one run.
#[derive(Debug)]
pub struct Simulation {
    config: SimulationConfig,
    world: World,
    evolution: EvolutionTree,
    targeting: TowerTargeting,
    tower_combat: TowerCombat,
    scheduler: WaveScheduler,
    timers: DeferredTimers,
    next_wave_timer: Option<TimerId>,
    spells: SpellBook,
    economy: Economy,
    statistics: Statistics,
    phase: Phase,
    clock: Duration,
    notifications: Vec<Notification>,
    events: Vec<Event>,
    carried: Vec<Event>,
    commands: Vec<Command>,
    assignments: Vec<TowerTarget>,
    progress: Vec<WaveProgress>,
    fired: Vec<TimerAction>,
}

impl Simulation {
    /// Creates a run from a validated configuration.
    pub fn new(config: SimulationConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        let evolution = EvolutionTree::builtin()?;

        Ok(Self {
            world: World::new(config.world_config()),
            evolution,
            targeting: TowerTargeting::new(),
            tower_combat: TowerCombat::new(),
            scheduler: WaveScheduler::new(standard_plan(), config.seed),
            timers: DeferredTimers::new(),
            next_wave_timer: None,
            spells: SpellBook::new(),
            economy: Economy::new(config.starting_gold, config.starting_health),
            statistics: Statistics::default(),
            phase: Phase::Running,
            clock: Duration::ZERO,
            notifications: Vec::new(),
            events: Vec::new(),
            carried: Vec::new(),
            commands: Vec::new(),
            assignments: Vec::new(),
            progress: Vec::new(),
            fired: Vec::new(),
            config,
        })
    }

    /// Advances the run by `dt`, clamped to the configured maximum step.
    ///
    /// Does nothing while paused or after the run has finished.
    pub fn tick(&mut self, dt: Duration) {
        if self.phase != Phase::Running {
            return;
        }
        let dt = dt.min(self.config.max_delta());
        if dt.is_zero() {
            return;
        }

        self.clock = self.clock.saturating_add(dt);
        self.spells.advance(dt);

        // Spell outcomes were routed when cast; the scheduler still needs to see them.
        let mut events = std::mem::take(&mut self.events);
        events.clear();
        events.append(&mut self.carried);
        let routed_from = events.len();

        world::apply(&mut self.world, Command::AdvanceEnemies { dt }, &mut events);
        world::apply(&mut self.world, Command::AdvanceTowers { dt }, &mut events);
        self.attack(&mut events);
        world::apply(&mut self.world, Command::AdvanceProjectiles { dt }, &mut events);
        world::apply(&mut self.world, Command::CollectDestroyed, &mut events);

        for event in &events[routed_from..] {
            self.route(event);
        }

        if self.economy.is_defeated() {
            self.events = events;
            self.finish(GameResult::Defeat);
            return;
        }

        // Timers first, so one scheduled during this tick starts counting next tick.
        self.fired.clear();
        self.timers.advance(dt, &mut self.fired);
        let fired = std::mem::take(&mut self.fired);
        for action in &fired {
            match action {
                TimerAction::StartNextWave => {
                    self.next_wave_timer = None;
                    if let Err(error) = self.start_next_wave() {
                        tracing::warn!(%error, "deferred wave start failed");
                    }
                }
            }
        }
        self.fired = fired;

        self.schedule_waves(&events);
        self.events = events;
    }

    /// Executes a player command, publishing a rejection notification on failure.
    pub fn submit(&mut self, command: PlayerCommand) -> Result<(), CommandError> {
        let result = self.execute(command);
        if let Err(error) = &result {
            tracing::warn!(%error, "command rejected");
            self.notifications
                .push(Notification::CommandRejected(error.clone()));
        }
        result
    }

    /// Removes and returns every notification published since the last call.
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Captures the current state of the run.
    #[must_use]
    pub fn snapshot(&self) -> SimulationSnapshot {
        SimulationSnapshot {
            phase: self.phase,
            clock: self.clock,
            gold: self.economy.gold,
            health: self.economy.health,
            score: self.economy.score,
            wave: self.scheduler.current_wave(),
            wave_active: self.scheduler.is_active(),
            enemies: query::enemy_view(&self.world).into_vec(),
            towers: query::tower_view(&self.world).into_vec(),
            projectiles: query::projectiles(&self.world),
            spell_cooldowns: self.spells.snapshot(),
        }
    }

    /// Aggregate statistics, including any loaded with [`Simulation::load_statistics`].
    #[must_use]
    pub fn statistics(&self) -> Statistics {
        self.statistics
    }

    /// Folds persisted statistics into the current ones.
    pub fn load_statistics(&mut self, persisted: &Statistics) {
        self.statistics.merge(persisted);
    }

    /// Discards the run and starts over. Statistics are kept.
    pub fn restart(&mut self) {
        self.world = World::new(self.config.world_config());
        self.targeting = TowerTargeting::new();
        self.tower_combat = TowerCombat::new();
        self.scheduler.reset();
        self.timers.cancel_all();
        self.next_wave_timer = None;
        self.spells.reset();
        self.economy = Economy::new(self.config.starting_gold, self.config.starting_health);
        self.phase = Phase::Running;
        self.clock = Duration::ZERO;
        self.carried.clear();

        tracing::info!("run restarted");
        self.notifications.push(Notification::Restarted);
        self.notify_gold();
        self.notify_health();
    }

    /// Lifecycle phase of the run.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Read-only access to the world for [`query`] helpers.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Configuration the run was built from.
    #[must_use]
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Evolution nodes the tower may take right now.
    #[must_use]
    pub fn available_evolutions(&self, tower: TowerId) -> Vec<EvolutionId> {
        query::tower(&self.world, tower)
            .map(|snapshot| {
                self.evolution
                    .available(&snapshot.progress)
                    .into_iter()
                    .map(|node| node.id().clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn execute(&mut self, command: PlayerCommand) -> Result<(), CommandError> {
        match command {
            PlayerCommand::Pause => self.pause(),
            PlayerCommand::Resume => self.resume(),
            PlayerCommand::Restart => {
                self.restart();
                Ok(())
            }
            _ if self.phase != Phase::Running => Err(CommandError::NotRunning),
            PlayerCommand::PlaceTower { kind, position } => self.place_tower(kind, position),
            PlayerCommand::UpgradeTower { tower, stat } => self.upgrade_tower(tower, stat),
            PlayerCommand::EvolveTower { tower, evolution } => {
                self.evolve_tower(tower, &evolution)
            }
            PlayerCommand::SellTower { tower } => self.sell_tower(tower),
            PlayerCommand::CastSpell { spell, target } => self.cast_spell(spell, target),
            PlayerCommand::StartNextWave => self.start_next_wave().map(|_| ()),
        }
    }

    fn pause(&mut self) -> Result<(), CommandError> {
        match self.phase {
            Phase::Running => {
                self.phase = Phase::Paused;
                tracing::info!(clock = ?self.clock, "simulation paused");
                self.notifications.push(Notification::Paused);
                Ok(())
            }
            Phase::Paused => Ok(()),
            Phase::Finished(_) => Err(CommandError::NotRunning),
        }
    }

    fn resume(&mut self) -> Result<(), CommandError> {
        match self.phase {
            Phase::Paused => {
                self.phase = Phase::Running;
                tracing::info!(clock = ?self.clock, "simulation resumed");
                self.notifications.push(Notification::Resumed);
                Ok(())
            }
            Phase::Running => Ok(()),
            Phase::Finished(_) => Err(CommandError::NotRunning),
        }
    }

    fn place_tower(&mut self, kind: TowerKind, position: Vec2) -> Result<(), CommandError> {
        let cost = kind.profile().cost;
        self.economy.ensure(cost)?;

        let mut events = Vec::new();
        world::apply(
            &mut self.world,
            Command::PlaceTower { kind, position },
            &mut events,
        );
        for event in events {
            match event {
                Event::TowerPlaced {
                    tower,
                    kind,
                    position,
                    cost,
                } => {
                    self.economy.spend(cost)?;
                    self.statistics.towers_built = self.statistics.towers_built.saturating_add(1);
                    self.notifications.push(Notification::TowerBuilt {
                        tower,
                        kind,
                        position,
                    });
                    self.notify_gold();
                }
                Event::TowerPlacementRejected { reason, .. } => return Err(reason.into()),
                _ => {}
            }
        }
        Ok(())
    }

    fn upgrade_tower(&mut self, tower: TowerId, stat: UpgradeStat) -> Result<(), CommandError> {
        let snapshot = query::tower(&self.world, tower).ok_or(CommandError::UnknownTower(tower))?;
        let mut progress = snapshot.progress;
        let cost = quote_upgrade(&progress, stat)?;
        self.economy.ensure(cost)?;
        let cost = apply_upgrade(&mut progress, stat)?;

        let level = progress.level();
        self.commit(
            tower,
            progress,
            ProgressChange::Upgraded { stat, cost },
            cost,
        )?;
        self.notifications.push(Notification::TowerUpgraded { tower, stat, level });
        Ok(())
    }

    fn evolve_tower(&mut self, tower: TowerId, evolution: &EvolutionId) -> Result<(), CommandError> {
        let snapshot = query::tower(&self.world, tower).ok_or(CommandError::UnknownTower(tower))?;
        let mut progress = snapshot.progress;
        let cost = self.evolution.can_evolve(&progress, evolution)?.cost();
        self.economy.ensure(cost)?;
        let _ = self.evolution.evolve(&mut progress, evolution)?;

        let tier = progress.tier;
        self.commit(
            tower,
            progress,
            ProgressChange::Evolved {
                evolution: evolution.clone(),
                cost,
            },
            cost,
        )?;
        tracing::debug!(?tower, %evolution, tier, "tower evolved");
        self.notifications.push(Notification::TowerEvolved {
            tower,
            evolution: evolution.clone(),
            tier,
        });
        Ok(())
    }

    fn commit(
        &mut self,
        tower: TowerId,
        progress: TowerProgress,
        change: ProgressChange,
        cost: u32,
    ) -> Result<(), CommandError> {
        let mut events = Vec::new();
        world::apply(
            &mut self.world,
            Command::CommitTowerProgress {
                tower,
                progress,
                change,
            },
            &mut events,
        );
        if !events
            .iter()
            .any(|event| matches!(event, Event::TowerProgressed { .. }))
        {
            return Err(CommandError::UnknownTower(tower));
        }
        self.economy.spend(cost)?;
        self.notify_gold();
        Ok(())
    }

    fn sell_tower(&mut self, tower: TowerId) -> Result<(), CommandError> {
        let mut events = Vec::new();
        world::apply(&mut self.world, Command::SellTower { tower }, &mut events);
        for event in events {
            match event {
                Event::TowerSold { tower, refund, .. } => {
                    self.economy.earn(refund);
                    self.notifications
                        .push(Notification::TowerSold { tower, refund });
                    self.notify_gold();
                }
                Event::TowerMissing { tower } => return Err(CommandError::UnknownTower(tower)),
                _ => {}
            }
        }
        Ok(())
    }

    fn cast_spell(
        &mut self,
        spell: SpellKind,
        target: Option<Vec2>,
    ) -> Result<(), CommandError> {
        self.spells.ensure_ready(spell)?;
        let profile = spell.profile();
        self.economy.ensure(profile.cost)?;

        let live: Vec<_> = query::enemy_view(&self.world)
            .iter()
            .filter(|enemy| enemy.is_targetable())
            .map(|enemy| (enemy.id, enemy.position))
            .collect();
        let (effect, cue) = spells::resolve(
            spell,
            target,
            query::arena(&self.world).center(),
            &live,
        )?;

        self.economy.spend(profile.cost)?;
        self.spells.trigger(spell);
        self.statistics.spells_cast = self.statistics.spells_cast.saturating_add(1);
        tracing::debug!(?spell, "spell cast");
        self.notifications.push(Notification::SpellCast { spell });
        self.notify_gold();
        if let Some(cue) = cue {
            self.notifications.push(Notification::EffectRequested(cue));
        }

        match effect {
            SpellEffect::World(command) => {
                let mut events = Vec::new();
                world::apply(&mut self.world, command, &mut events);
                for event in &events {
                    self.route(event);
                }
                self.carried.append(&mut events);
            }
            SpellEffect::Heal(amount) => {
                let restored = self.economy.heal(amount, self.config.starting_health);
                self.notifications
                    .push(Notification::EffectRequested(EffectCue::Heal { amount: restored }));
                self.notify_health();
            }
        }
        Ok(())
    }

    fn start_next_wave(&mut self) -> Result<u32, CommandError> {
        match self.scheduler.start_wave() {
            Ok(wave) => {
                if let Some(timer) = self.next_wave_timer.take() {
                    let _ = self.timers.cancel(timer);
                }
                self.notifications.push(Notification::WaveChanged { wave });
                Ok(wave)
            }
            Err(WaveStartError::Exhausted) => {
                self.notifications.push(Notification::RunCompleted);
                Err(WaveStartError::Exhausted.into())
            }
            Err(error) => Err(error.into()),
        }
    }

    fn attack(&mut self, events: &mut Vec<Event>) {
        let towers = query::tower_view(&self.world);
        let enemies = query::enemy_view(&self.world);
        self.targeting
            .handle(&towers, &enemies, &mut self.assignments);

        for assignment in &self.assignments {
            let current = towers.get(assignment.tower).and_then(|tower| tower.target);
            if current != assignment.target {
                world::apply(
                    &mut self.world,
                    Command::AssignTarget {
                        tower: assignment.tower,
                        target: assignment.target,
                    },
                    events,
                );
            }
        }

        self.commands.clear();
        self.tower_combat
            .handle(&towers, &enemies, &self.assignments, &mut self.commands);
        for command in self.commands.drain(..) {
            world::apply(&mut self.world, command, events);
        }
    }

    fn schedule_waves(&mut self, events: &[Event]) {
        self.commands.clear();
        self.progress.clear();
        self.scheduler
            .handle(events, &mut self.commands, &mut self.progress);

        let mut spawned = Vec::new();
        for command in self.commands.drain(..) {
            world::apply(&mut self.world, command, &mut spawned);
        }

        let progress = std::mem::take(&mut self.progress);
        for transition in &progress {
            match *transition {
                WaveProgress::Completed { wave, last } => self.complete_wave(wave, last),
            }
        }
        self.progress = progress;
    }

    fn complete_wave(&mut self, wave: u32, last: bool) {
        let bonus = wave.saturating_mul(self.config.wave_bonus_per_wave);
        self.economy.earn(bonus);
        self.statistics.waves_completed = self.statistics.waves_completed.saturating_add(1);
        self.notifications
            .push(Notification::WaveCompleted { wave, bonus });
        self.notify_gold();

        if last {
            self.notifications.push(Notification::RunCompleted);
            self.finish(GameResult::Victory);
        } else if self.config.auto_start_next_wave {
            self.next_wave_timer = Some(
                self.timers
                    .schedule(self.config.next_wave_delay(), TimerAction::StartNextWave),
            );
        }
    }

    fn route(&mut self, event: &Event) {
        match event {
            Event::EnemyKilled {
                enemy,
                kind,
                position,
                gold,
                score,
                ..
            } => {
                self.economy.earn(*gold);
                self.economy.add_score(*score);
                self.statistics.enemies_killed = self.statistics.enemies_killed.saturating_add(1);
                self.statistics.high_score = self.statistics.high_score.max(self.economy.score);
                self.notifications.push(Notification::EnemyKilled {
                    enemy: *enemy,
                    kind: *kind,
                    gold: *gold,
                    score: *score,
                });
                self.notifications
                    .push(Notification::EffectRequested(EffectCue::EnemyDeath {
                        position: *position,
                    }));
                self.notify_gold();
            }
            Event::EnemyReachedEnd {
                enemy,
                kind,
                damage,
                ..
            } => {
                self.economy.take_damage(*damage);
                self.notifications.push(Notification::EnemyReachedEnd {
                    enemy: *enemy,
                    kind: *kind,
                    damage: *damage,
                });
                self.notify_health();
            }
            Event::EnemyDamaged { amount, .. } => {
                self.statistics.total_damage_dealt = self
                    .statistics
                    .total_damage_dealt
                    .saturating_add(u64::from(*amount));
            }
            Event::ProjectileHit {
                position,
                splash_radius,
                ..
            } => {
                let cue = if *splash_radius > 0.0 {
                    EffectCue::Explosion {
                        position: *position,
                        radius: *splash_radius,
                    }
                } else {
                    EffectCue::Impact {
                        position: *position,
                    }
                };
                self.notifications.push(Notification::EffectRequested(cue));
            }
            Event::ChainDischarged { points, .. } => {
                self.notifications
                    .push(Notification::EffectRequested(EffectCue::Lightning {
                        points: points.clone(),
                    }));
            }
            _ => {}
        }
    }

    fn finish(&mut self, result: GameResult) {
        self.phase = Phase::Finished(result);
        self.timers.cancel_all();
        self.next_wave_timer = None;
        self.statistics.high_score = self.statistics.high_score.max(self.economy.score);

        tracing::info!(?result, score = self.economy.score, "game over");
        self.notifications.push(Notification::GameOver(GameOverReport {
            result,
            score: self.economy.score,
            statistics: self.statistics,
        }));
    }

    fn notify_gold(&mut self) {
        self.notifications.push(Notification::GoldChanged {
            gold: self.economy.gold,
        });
    }

    fn notify_health(&mut self) {
        self.notifications.push(Notification::HealthChanged {
            health: self.economy.health,
        });
    }
}
