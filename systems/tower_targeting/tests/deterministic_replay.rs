use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    time::Duration,
};

use glam::Vec2;
use lane_defence_core::{Command, EnemyId, EnemyKind, Event, TowerId, TowerKind, TowerTarget};
use lane_defence_system_tower_targeting::TowerTargeting;
use lane_defence_world::{self as world, query, World, WorldConfig};

const TOWER_POSITION: Vec2 = Vec2::new(60.0, 270.0);

fn straight_world() -> World {
    World::new(WorldConfig {
        path: vec![Vec2::new(0.0, 300.0), Vec2::new(800.0, 300.0)],
        ..WorldConfig::default()
    })
}

fn apply(world: &mut World, command: Command) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(world, command, &mut events);
    events
}

fn spawn_orc(world: &mut World) -> EnemyId {
    let events = apply(
        world,
        Command::SpawnEnemy {
            profile: EnemyKind::Orc.profile(),
            wave: 1,
        },
    );
    match events.as_slice() {
        [Event::EnemySpawned { enemy, .. }] => *enemy,
        other => panic!("unexpected spawn events: {other:?}"),
    }
}

fn advance(world: &mut World, ms: u64) {
    let _ = apply(
        world,
        Command::AdvanceEnemies {
            dt: Duration::from_millis(ms),
        },
    );
}

/// Places an archer and two orcs on the lane, 60 units apart.
fn staged_world() -> (World, TowerId, EnemyId, EnemyId) {
    let mut world = straight_world();
    let tower = match apply(
        &mut world,
        Command::PlaceTower {
            kind: TowerKind::Archer,
            position: TOWER_POSITION,
        },
    )
    .as_slice()
    {
        [Event::TowerPlaced { tower, .. }] => *tower,
        other => panic!("unexpected placement events: {other:?}"),
    };

    let leader = spawn_orc(&mut world);
    advance(&mut world, 1000);
    let trailer = spawn_orc(&mut world);
    advance(&mut world, 1000);
    (world, tower, leader, trailer)
}

fn retarget(world: &mut World, targeting: &mut TowerTargeting) -> Vec<TowerTarget> {
    let towers = query::tower_view(world);
    let enemies = query::enemy_view(world);
    let mut assignments = Vec::new();
    targeting.handle(&towers, &enemies, &mut assignments);

    for assignment in &assignments {
        let current = towers.get(assignment.tower).and_then(|tower| tower.target);
        if current != assignment.target {
            let _ = apply(
                world,
                Command::AssignTarget {
                    tower: assignment.tower,
                    target: assignment.target,
                },
            );
        }
    }
    assignments
}

#[test]
fn equal_progress_prefers_the_nearer_enemy() {
    let (mut world, tower, leader, trailer) = staged_world();
    let snapshot = |id| query::enemy(&world, id).expect("enemy on field");
    assert_eq!(snapshot(leader).path_progress, snapshot(trailer).path_progress);

    let mut targeting = TowerTargeting::new();
    let assignments = retarget(&mut world, &mut targeting);

    assert_eq!(
        assignments,
        vec![TowerTarget {
            tower,
            target: Some(trailer),
        }]
    );
    assert_eq!(
        query::tower(&world, tower).and_then(|state| state.target),
        Some(trailer)
    );
}

#[test]
fn target_is_kept_until_it_leaves_range() {
    let (mut world, tower, _leader, trailer) = staged_world();
    let mut targeting = TowerTargeting::new();
    let _ = retarget(&mut world, &mut targeting);

    for step in 1..=14 {
        advance(&mut world, 100);
        let assignments = retarget(&mut world, &mut targeting);
        assert_eq!(
            assignments[0].target,
            Some(trailer),
            "target dropped early at step {step}"
        );
    }

    advance(&mut world, 100);
    let assignments = retarget(&mut world, &mut targeting);
    assert_eq!(assignments, vec![TowerTarget { tower, target: None }]);
}

#[test]
fn replay_produces_identical_assignments() {
    let run = || {
        let (mut world, _, _, _) = staged_world();
        let mut targeting = TowerTargeting::new();
        let mut hasher = DefaultHasher::new();
        for _ in 0..40 {
            for assignment in retarget(&mut world, &mut targeting) {
                assignment.tower.hash(&mut hasher);
                assignment.target.hash(&mut hasher);
            }
            if query::enemy_count(&world) % 2 == 0 {
                let _ = spawn_orc(&mut world);
            }
            advance(&mut world, 250);
        }
        hasher.finish()
    };

    assert_eq!(run(), run(), "replay diverged between runs");
}
