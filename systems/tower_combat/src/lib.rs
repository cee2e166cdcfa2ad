#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that emits attack commands from targeting data.

use lane_defence_core::{
    AttackDelivery, Command, EnemyId, EnemyView, TowerSnapshot, TowerTarget, TowerView,
};
use lane_defence_system_tower_targeting::rank_in_range;

/// Tower combat system that queues attack commands for ready towers.
#[derive(Debug, Default)]
pub struct TowerCombat {
    scratch: Vec<Command>,
    volley: Vec<EnemyId>,
}

impl TowerCombat {
    /// Creates a new tower combat system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits attack commands for towers whose cooldown elapsed and that hold a target.
    ///
    /// Projectile towers receive one `Command::FireProjectile` for their
    /// target plus one per multi-shot bonus; chain towers receive a single
    /// `Command::DischargeChain`.
    pub fn handle(
        &mut self,
        towers: &TowerView,
        enemies: &EnemyView,
        tower_targets: &[TowerTarget],
        out: &mut Vec<Command>,
    ) {
        if tower_targets.is_empty() || towers.is_empty() {
            return;
        }

        self.scratch.clear();

        for assignment in tower_targets {
            let Some(target) = assignment.target else {
                continue;
            };
            let Some(snapshot) = towers.get(assignment.tower) else {
                continue;
            };
            if !is_ready(snapshot) {
                continue;
            }

            match delivery(snapshot) {
                AttackDelivery::Instant => self.scratch.push(Command::DischargeChain {
                    tower: snapshot.id,
                    target,
                }),
                AttackDelivery::Projectile => {
                    self.scratch.push(Command::FireProjectile {
                        tower: snapshot.id,
                        target,
                    });
                    self.queue_volley(snapshot, enemies, target);
                }
            }
        }

        if self.scratch.is_empty() {
            return;
        }

        out.reserve(self.scratch.len());
        out.append(&mut self.scratch);
    }

    fn queue_volley(&mut self, tower: &TowerSnapshot, enemies: &EnemyView, primary: EnemyId) {
        let extra = tower.progress.stats.multi_shot as usize;
        if extra == 0 {
            return;
        }

        rank_in_range(tower, enemies, &mut self.volley);
        for enemy in self
            .volley
            .iter()
            .copied()
            .filter(|enemy| *enemy != primary)
            .take(extra)
        {
            self.scratch.push(Command::FireProjectile {
                tower: tower.id,
                target: enemy,
            });
        }
    }
}

fn is_ready(tower: &TowerSnapshot) -> bool {
    tower.since_last_attack() >= tower.progress.stats.attack_interval
}

fn delivery(tower: &TowerSnapshot) -> AttackDelivery {
    if tower.progress.stats.chain.is_some() {
        AttackDelivery::Instant
    } else {
        tower.kind.delivery()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use lane_defence_core::{
        EnemyKind, EnemySnapshot, EnemyState, TowerId, TowerKind, TowerProgress,
    };
    use std::time::Duration;

    #[test]
    fn firing_respects_cooldown_readiness() {
        let mut system = TowerCombat::new();
        let towers = TowerView::from_snapshots(vec![
            snapshot(2, TowerKind::Archer, 1200),
            snapshot(5, TowerKind::Archer, 1199),
        ]);
        let targets = vec![target(2, Some(4)), target(5, Some(1))];
        let mut out = Vec::new();

        system.handle(&towers, &EnemyView::default(), &targets, &mut out);

        assert_eq!(
            out,
            vec![Command::FireProjectile {
                tower: TowerId::new(2),
                target: EnemyId::new(4),
            }],
        );
    }

    #[test]
    fn towers_without_targets_or_snapshots_are_skipped() {
        let mut system = TowerCombat::new();
        let towers = TowerView::from_snapshots(vec![snapshot(3, TowerKind::Cannon, 5000)]);
        let targets = vec![target(3, None), target(42, Some(3))];
        let mut out = Vec::new();

        system.handle(&towers, &EnemyView::default(), &targets, &mut out);

        assert!(out.is_empty());
    }

    #[test]
    fn lightning_towers_discharge_instead_of_firing() {
        let mut system = TowerCombat::new();
        let towers = TowerView::from_snapshots(vec![snapshot(1, TowerKind::Lightning, 2200)]);
        let targets = vec![target(1, Some(9))];
        let mut out = Vec::new();

        system.handle(&towers, &EnemyView::default(), &targets, &mut out);

        assert_eq!(
            out,
            vec![Command::DischargeChain {
                tower: TowerId::new(1),
                target: EnemyId::new(9),
            }],
        );
    }

    #[test]
    fn multi_shot_adds_ranked_secondary_targets() {
        let mut system = TowerCombat::new();
        let mut archer = snapshot(1, TowerKind::Archer, 1200);
        archer.progress.stats.multi_shot = 1;
        let towers = TowerView::from_snapshots(vec![archer]);
        let enemies = EnemyView::from_snapshots(vec![
            enemy(4, Vec2::new(20.0, 0.0), 2),
            enemy(5, Vec2::new(40.0, 0.0), 1),
            enemy(6, Vec2::new(30.0, 0.0), 1),
        ]);
        let targets = vec![target(1, Some(4))];
        let mut out = Vec::new();

        system.handle(&towers, &enemies, &targets, &mut out);

        assert_eq!(
            out,
            vec![
                Command::FireProjectile {
                    tower: TowerId::new(1),
                    target: EnemyId::new(4),
                },
                Command::FireProjectile {
                    tower: TowerId::new(1),
                    target: EnemyId::new(6),
                },
            ],
        );
    }

    fn snapshot(tower: u32, kind: TowerKind, since_attack_ms: u64) -> TowerSnapshot {
        TowerSnapshot {
            id: TowerId::new(tower),
            kind,
            position: Vec2::ZERO,
            progress: TowerProgress::new(kind),
            target: None,
            age: Duration::from_millis(10_000 + since_attack_ms),
            last_attack: Duration::from_millis(10_000),
        }
    }

    fn enemy(id: u32, position: Vec2, path_progress: usize) -> EnemySnapshot {
        EnemySnapshot {
            id: EnemyId::new(id),
            kind: EnemyKind::Skeleton,
            wave: 2,
            position,
            velocity: Vec2::ZERO,
            health: 25,
            max_health: 25,
            speed: 90.0,
            path_progress,
            size: 10.0,
            state: EnemyState::Moving,
            effects: Vec::new(),
        }
    }

    fn target(tower: u32, enemy: Option<u32>) -> TowerTarget {
        TowerTarget {
            tower: TowerId::new(tower),
            target: enemy.map(EnemyId::new),
        }
    }
}
