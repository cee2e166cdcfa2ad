use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    time::Duration,
};

use glam::Vec2;
use lane_defence_core::{
    CommandError, EvolutionError, EvolutionId, GameResult, Notification, PlayerCommand,
    SpellKind, Statistics, TowerId, TowerKind, UpgradeStat, WaveStartError,
};
use lane_defence_simulation::{Phase, Simulation, SimulationConfig};
use lane_defence_world::query;

const FRAME: Duration = Duration::from_millis(33);

fn simulation(config: SimulationConfig) -> Simulation {
    Simulation::new(config).expect("valid configuration")
}

fn rich() -> SimulationConfig {
    SimulationConfig {
        starting_gold: 1_000,
        ..SimulationConfig::default()
    }
}

fn first_free_spot(sim: &Simulation) -> Vec2 {
    query::placement_candidates(sim.world())
        .first()
        .copied()
        .expect("default layout has room for towers")
}

fn build(sim: &mut Simulation, kind: TowerKind, position: Vec2) -> TowerId {
    sim.submit(PlayerCommand::PlaceTower { kind, position })
        .expect("placement accepted");
    sim.drain_notifications()
        .into_iter()
        .find_map(|notification| match notification {
            Notification::TowerBuilt { tower, .. } => Some(tower),
            _ => None,
        })
        .expect("tower built notification")
}

#[test]
fn building_charges_gold_and_rejects_what_cannot_be_afforded() {
    let mut sim = simulation(SimulationConfig::default());
    let spot = first_free_spot(&sim);
    let _ = build(&mut sim, TowerKind::Archer, spot);
    assert_eq!(sim.snapshot().gold, 70);
    assert_eq!(sim.statistics().towers_built, 1);

    let elsewhere = query::placement_candidates(sim.world())[0];
    let error = sim
        .submit(PlayerCommand::PlaceTower {
            kind: TowerKind::Cannon,
            position: elsewhere,
        })
        .unwrap_err();
    assert_eq!(
        error,
        CommandError::InsufficientGold {
            required: 200,
            available: 70
        }
    );
    assert!(sim
        .drain_notifications()
        .contains(&Notification::CommandRejected(error)));
    assert_eq!(sim.snapshot().towers.len(), 1);
}

#[test]
fn illegal_placements_cost_nothing() {
    let mut sim = simulation(SimulationConfig::default());
    let on_the_path = Vec2::new(75.0, 300.0);
    let error = sim
        .submit(PlayerCommand::PlaceTower {
            kind: TowerKind::Archer,
            position: on_the_path,
        })
        .unwrap_err();

    assert!(matches!(error, CommandError::Placement(_)), "{error}");
    assert_eq!(sim.snapshot().gold, 150);
}

#[test]
fn upgrades_price_geometrically_and_selling_refunds_the_investment() {
    let mut sim = simulation(SimulationConfig::default());
    let spot = first_free_spot(&sim);
    let tower = build(&mut sim, TowerKind::Archer, spot);

    sim.submit(PlayerCommand::UpgradeTower {
        tower,
        stat: UpgradeStat::Damage,
    })
    .expect("first upgrade is affordable");
    assert_eq!(sim.snapshot().gold, 10);
    assert!(sim
        .drain_notifications()
        .contains(&Notification::TowerUpgraded {
            tower,
            stat: UpgradeStat::Damage,
            level: 2,
        }));

    let error = sim
        .submit(PlayerCommand::UpgradeTower {
            tower,
            stat: UpgradeStat::Damage,
        })
        .unwrap_err();
    assert_eq!(
        error,
        CommandError::InsufficientGold {
            required: 90,
            available: 10
        }
    );

    sim.submit(PlayerCommand::SellTower { tower })
        .expect("tower exists");
    assert_eq!(sim.snapshot().gold, 10 + 98);
    assert!(sim.snapshot().towers.is_empty());
    assert_eq!(
        sim.submit(PlayerCommand::SellTower { tower }),
        Err(CommandError::UnknownTower(tower))
    );
}

#[test]
fn evolution_follows_the_tree() {
    let mut sim = simulation(rich());
    let spot = first_free_spot(&sim);
    let tower = build(&mut sim, TowerKind::Archer, spot);
    assert!(sim.available_evolutions(tower).is_empty());

    sim.submit(PlayerCommand::UpgradeTower {
        tower,
        stat: UpgradeStat::Range,
    })
    .expect("upgrade");
    assert_eq!(
        sim.available_evolutions(tower),
        vec![
            EvolutionId::new("ARCHER_HUNTER"),
            EvolutionId::new("ARCHER_VETERAN")
        ]
    );

    let veteran = EvolutionId::new("ARCHER_VETERAN");
    sim.submit(PlayerCommand::EvolveTower {
        tower,
        evolution: veteran.clone(),
    })
    .expect("evolution");
    assert_eq!(sim.snapshot().gold, 1_000 - 80 - 60 - 60);
    assert!(sim
        .drain_notifications()
        .contains(&Notification::TowerEvolved {
            tower,
            evolution: veteran.clone(),
            tier: 2,
        }));

    assert_eq!(
        sim.submit(PlayerCommand::EvolveTower {
            tower,
            evolution: veteran.clone(),
        }),
        Err(CommandError::Evolution(EvolutionError::AlreadyTaken(veteran)))
    );
    assert_eq!(
        sim.submit(PlayerCommand::EvolveTower {
            tower,
            evolution: EvolutionId::new("ARCHER_SNIPER"),
        }),
        Err(CommandError::Evolution(EvolutionError::LevelTooLow {
            required: 3,
            current: 2
        }))
    );

    let towers = sim.snapshot().towers;
    assert_eq!(towers[0].progress.tier, 2);
    assert_eq!(towers[0].progress.invested, 200);
}

#[test]
fn waves_cannot_overlap() {
    let mut sim = simulation(SimulationConfig::default());
    sim.submit(PlayerCommand::StartNextWave).expect("first wave");
    assert_eq!(
        sim.submit(PlayerCommand::StartNextWave),
        Err(CommandError::WaveStart(WaveStartError::AlreadyActive {
            wave: 1
        }))
    );
    assert!(sim
        .drain_notifications()
        .contains(&Notification::WaveChanged { wave: 1 }));
}

#[test]
fn tick_length_is_clamped() {
    let mut sim = simulation(SimulationConfig::default());
    sim.tick(Duration::from_secs(1));
    assert_eq!(sim.snapshot().clock, Duration::from_millis(33));
}

#[test]
fn pausing_freezes_the_run() {
    let mut sim = simulation(SimulationConfig::default());
    sim.submit(PlayerCommand::StartNextWave).expect("wave");
    for _ in 0..30 {
        sim.tick(FRAME);
    }

    sim.submit(PlayerCommand::Pause).expect("pause");
    let frozen = sim.snapshot();
    for _ in 0..30 {
        sim.tick(FRAME);
    }
    assert_eq!(sim.snapshot(), frozen);
    assert_eq!(sim.phase(), Phase::Paused);
    assert_eq!(
        sim.submit(PlayerCommand::StartNextWave),
        Err(CommandError::NotRunning)
    );

    sim.submit(PlayerCommand::Resume).expect("resume");
    sim.tick(FRAME);
    assert_eq!(sim.snapshot().clock, frozen.clock + FRAME);
}

#[test]
fn escaped_enemies_defeat_an_undefended_player() {
    let mut sim = simulation(SimulationConfig::default());
    sim.submit(PlayerCommand::StartNextWave).expect("wave");

    let mut notifications = Vec::new();
    for _ in 0..3_000 {
        sim.tick(FRAME);
        notifications.extend(sim.drain_notifications());
        if sim.phase() != Phase::Running {
            break;
        }
    }

    assert_eq!(sim.phase(), Phase::Finished(GameResult::Defeat));
    assert_eq!(sim.snapshot().health, 0);
    let Some(Notification::GameOver(report)) = notifications.last() else {
        panic!("run should end with a game over report");
    };
    assert_eq!(report.result, GameResult::Defeat);

    let clock = sim.snapshot().clock;
    sim.tick(FRAME);
    assert_eq!(sim.snapshot().clock, clock);
}

#[test]
fn completed_waves_pay_a_bonus_and_schedule_the_next() {
    let config = SimulationConfig {
        starting_health: 100,
        max_health: 100,
        path: vec![[0.0, 300.0], [100.0, 300.0]],
        ..SimulationConfig::default()
    };
    let mut sim = simulation(config);
    sim.submit(PlayerCommand::StartNextWave).expect("wave");

    let mut completed_at = None;
    let mut next_started_at = None;
    for _ in 0..1_000 {
        sim.tick(FRAME);
        let clock = sim.snapshot().clock;
        for notification in sim.drain_notifications() {
            match notification {
                Notification::WaveCompleted { wave: 1, bonus } => {
                    assert_eq!(bonus, 10);
                    completed_at = Some(clock);
                }
                Notification::WaveChanged { wave: 2 } => next_started_at = Some(clock),
                _ => {}
            }
        }
        if next_started_at.is_some() {
            break;
        }
    }

    let completed_at = completed_at.expect("wave 1 completes");
    let next_started_at = next_started_at.expect("wave 2 starts on its own");
    assert!(next_started_at - completed_at >= Duration::from_millis(3000));
    assert!(next_started_at - completed_at < Duration::from_millis(3000) + FRAME * 2);
    assert_eq!(sim.statistics().waves_completed, 1);
    assert_eq!(sim.snapshot().health, 100 - 11 * 2);
}

#[test]
fn spells_cost_gold_and_recharge() {
    let mut sim = simulation(SimulationConfig::default());

    assert_eq!(
        sim.submit(PlayerCommand::CastSpell {
            spell: SpellKind::Fireball,
            target: None,
        }),
        Err(CommandError::MissingSpellTarget(SpellKind::Fireball))
    );
    assert_eq!(sim.snapshot().gold, 150);

    sim.submit(PlayerCommand::CastSpell {
        spell: SpellKind::Heal,
        target: None,
    })
    .expect("heal");
    assert_eq!(sim.snapshot().gold, 115);
    assert_eq!(sim.snapshot().health, 15);

    assert_eq!(
        sim.submit(PlayerCommand::CastSpell {
            spell: SpellKind::Heal,
            target: None,
        }),
        Err(CommandError::SpellOnCooldown {
            spell: SpellKind::Heal,
            remaining: Duration::from_millis(15_000),
        })
    );
    assert_eq!(sim.statistics().spells_cast, 1);
}

#[test]
fn fireball_damages_enemies_near_the_aim_point() {
    let mut sim = simulation(SimulationConfig::default());
    sim.submit(PlayerCommand::StartNextWave).expect("wave");
    sim.tick(FRAME);
    assert_eq!(sim.snapshot().enemies.len(), 1);

    sim.submit(PlayerCommand::CastSpell {
        spell: SpellKind::Fireball,
        target: Some(Vec2::new(0.0, 300.0)),
    })
    .expect("fireball");

    let enemy = &sim.snapshot().enemies[0];
    assert_eq!(enemy.health, enemy.max_health - 35);
    assert_eq!(sim.statistics().total_damage_dealt, 35);
    assert_eq!(sim.snapshot().gold, 110);
}

#[test]
fn restart_resets_the_run_but_keeps_statistics() {
    let mut sim = simulation(SimulationConfig::default());
    sim.load_statistics(&Statistics {
        enemies_killed: 40,
        high_score: 900,
        ..Statistics::default()
    });
    let spot = first_free_spot(&sim);
    let _ = build(&mut sim, TowerKind::Archer, spot);
    sim.submit(PlayerCommand::StartNextWave).expect("wave");
    for _ in 0..50 {
        sim.tick(FRAME);
    }

    sim.submit(PlayerCommand::Restart).expect("restart");
    let snapshot = sim.snapshot();
    assert_eq!(snapshot.gold, 150);
    assert_eq!(snapshot.health, 15);
    assert_eq!(snapshot.wave, 0);
    assert_eq!(snapshot.clock, Duration::ZERO);
    assert!(snapshot.towers.is_empty());
    assert!(snapshot.enemies.is_empty());

    let statistics = sim.statistics();
    assert_eq!(statistics.towers_built, 1);
    assert_eq!(statistics.enemies_killed, 40);
    assert_eq!(statistics.high_score, 900);
    assert!(sim.drain_notifications().contains(&Notification::Restarted));
}

fn scripted_run(seed: u64) -> (u64, Statistics) {
    let mut sim = simulation(SimulationConfig { seed, ..rich() });
    let kinds = [
        TowerKind::Archer,
        TowerKind::Mage,
        TowerKind::Lightning,
        TowerKind::IceMage,
        TowerKind::Poison,
    ];
    for kind in kinds {
        let spot = first_free_spot(&sim);
        let _ = build(&mut sim, kind, spot);
    }
    sim.submit(PlayerCommand::StartNextWave).expect("wave");

    let mut hasher = DefaultHasher::new();
    for _ in 0..2_000 {
        sim.tick(FRAME);
        let drained = sim.drain_notifications();
        drained.len().hash(&mut hasher);
        let snapshot = sim.snapshot();
        (snapshot.gold, snapshot.health, snapshot.score, snapshot.wave).hash(&mut hasher);
        for enemy in &snapshot.enemies {
            enemy.id.hash(&mut hasher);
            enemy.health.hash(&mut hasher);
            enemy.position.x.to_bits().hash(&mut hasher);
            enemy.position.y.to_bits().hash(&mut hasher);
        }
        for tower in &snapshot.towers {
            tower.target.hash(&mut hasher);
        }
    }
    (hasher.finish(), sim.statistics())
}

#[test]
fn identical_seeds_replay_identically() {
    let (first, statistics) = scripted_run(42);
    let (second, _) = scripted_run(42);

    assert_eq!(first, second, "replay diverged between runs");
    assert!(statistics.enemies_killed > 0);
    assert!(statistics.total_damage_dealt > 0);
}
