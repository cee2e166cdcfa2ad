#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that computes deterministic tower targets from world snapshots.
//!
//! Towers keep their current target for as long as it stays alive and within
//! range. Only when that reference becomes invalid is it cleared and a new
//! target searched for, preferring the enemy furthest along the path, then
//! the nearest one, then the smallest identifier.

use glam::Vec2;
use lane_defence_core::{
    EnemyId, EnemyView, Targetable, TowerId, TowerSnapshot, TowerTarget, TowerView,
};

/// Tower targeting system that reuses scratch buffers to avoid repeated allocations.
#[derive(Debug, Default)]
pub struct TowerTargeting {
    tower_workspace: Vec<TowerWorkspace>,
    enemy_workspace: Vec<EnemyCandidate>,
}

impl TowerTargeting {
    /// Creates a new tower targeting system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes tower targets for the provided world snapshot.
    ///
    /// The output buffer is cleared before populating it. Every tower receives
    /// exactly one assignment, `None` when nothing is in range, so callers can
    /// clear stale references.
    pub fn handle(&mut self, towers: &TowerView, enemies: &EnemyView, out: &mut Vec<TowerTarget>) {
        out.clear();

        if towers.is_empty() {
            return;
        }

        self.prepare_tower_workspace(towers);
        self.prepare_enemy_workspace(enemies);

        for tower in &self.tower_workspace {
            let target = if tower.has_reach() {
                tower
                    .current
                    .filter(|current| self.still_valid(tower, *current))
                    .or_else(|| self.find_best_target(tower))
            } else {
                None
            };

            out.push(TowerTarget {
                tower: tower.id,
                target,
            });
        }
    }

    fn still_valid(&self, tower: &TowerWorkspace, current: EnemyId) -> bool {
        self.enemy_workspace
            .binary_search_by_key(&current, |candidate| candidate.id)
            .ok()
            .map(|index| &self.enemy_workspace[index])
            .is_some_and(|candidate| candidate.position.distance(tower.position) <= tower.range)
    }

    fn find_best_target(&self, tower: &TowerWorkspace) -> Option<EnemyId> {
        let mut best: Option<BestCandidate> = None;

        for candidate in &self.enemy_workspace {
            let distance = candidate.position.distance(tower.position);
            if distance > tower.range {
                continue;
            }

            let current = BestCandidate {
                path_progress: candidate.path_progress,
                distance,
                enemy: candidate.id,
            };

            match &mut best {
                Some(existing) => {
                    if current.precedes(existing) {
                        *existing = current;
                    }
                }
                None => best = Some(current),
            }
        }

        best.map(|candidate| candidate.enemy)
    }

    fn prepare_tower_workspace(&mut self, towers: &TowerView) {
        self.tower_workspace.clear();
        self.tower_workspace.reserve(towers.len());

        for snapshot in towers.iter() {
            self.tower_workspace.push(TowerWorkspace {
                id: snapshot.id,
                position: snapshot.position,
                range: snapshot.progress.stats.range,
                current: snapshot.target,
            });
        }
    }

    fn prepare_enemy_workspace(&mut self, enemies: &EnemyView) {
        self.enemy_workspace.clear();
        self.enemy_workspace.reserve(enemies.len());

        for snapshot in enemies.iter().filter(|enemy| enemy.is_targetable()) {
            self.enemy_workspace.push(EnemyCandidate {
                id: snapshot.id,
                position: snapshot.position,
                path_progress: snapshot.path_progress,
            });
        }
    }
}

/// Lists every targetable enemy within range of `tower` in targeting priority order.
///
/// Used for multi-shot volleys, where the primary target is followed by the
/// next best candidates. The output buffer is cleared first.
pub fn rank_in_range(tower: &TowerSnapshot, enemies: &EnemyView, out: &mut Vec<EnemyId>) {
    out.clear();

    let range = tower.progress.stats.range;
    let mut ranked: Vec<BestCandidate> = enemies
        .iter()
        .filter(|enemy| enemy.is_targetable())
        .filter_map(|enemy| {
            let distance = enemy.position.distance(tower.position);
            (distance <= range).then_some(BestCandidate {
                path_progress: enemy.path_progress,
                distance,
                enemy: enemy.id,
            })
        })
        .collect();

    ranked.sort_by(|left, right| {
        if left.precedes(right) {
            std::cmp::Ordering::Less
        } else if right.precedes(left) {
            std::cmp::Ordering::Greater
        } else {
            std::cmp::Ordering::Equal
        }
    });

    out.extend(ranked.into_iter().map(|candidate| candidate.enemy));
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct TowerWorkspace {
    id: TowerId,
    position: Vec2,
    range: f32,
    current: Option<EnemyId>,
}

impl TowerWorkspace {
    fn has_reach(&self) -> bool {
        self.range.is_finite() && self.range > 0.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct EnemyCandidate {
    id: EnemyId,
    position: Vec2,
    path_progress: usize,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct BestCandidate {
    path_progress: usize,
    distance: f32,
    enemy: EnemyId,
}

impl BestCandidate {
    fn precedes(&self, other: &Self) -> bool {
        if self.path_progress != other.path_progress {
            return self.path_progress > other.path_progress;
        }

        if self.distance != other.distance {
            return self.distance < other.distance;
        }

        self.enemy < other.enemy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lane_defence_core::{
        EnemyKind, EnemySnapshot, EnemyState, TowerKind, TowerProgress,
    };
    use std::time::Duration;

    fn tower_snapshot(id: u32, position: Vec2, target: Option<u32>) -> TowerSnapshot {
        let mut progress = TowerProgress::new(TowerKind::Archer);
        progress.stats.range = 100.0;
        TowerSnapshot {
            id: TowerId::new(id),
            kind: TowerKind::Archer,
            position,
            progress,
            target: target.map(EnemyId::new),
            age: Duration::ZERO,
            last_attack: Duration::ZERO,
        }
    }

    fn enemy_snapshot(id: u32, position: Vec2, path_progress: usize) -> EnemySnapshot {
        EnemySnapshot {
            id: EnemyId::new(id),
            kind: EnemyKind::Orc,
            wave: 1,
            position,
            velocity: Vec2::ZERO,
            health: 45,
            max_health: 45,
            speed: 60.0,
            path_progress,
            size: 12.0,
            state: EnemyState::Moving,
            effects: Vec::new(),
        }
    }

    fn run(towers: Vec<TowerSnapshot>, enemies: Vec<EnemySnapshot>) -> Vec<TowerTarget> {
        let mut system = TowerTargeting::new();
        let mut out = Vec::new();
        system.handle(
            &TowerView::from_snapshots(towers),
            &EnemyView::from_snapshots(enemies),
            &mut out,
        );
        out
    }

    #[test]
    fn equal_progress_prefers_nearest_enemy() {
        let out = run(
            vec![tower_snapshot(1, Vec2::ZERO, None)],
            vec![
                enemy_snapshot(1, Vec2::new(50.0, 0.0), 3),
                enemy_snapshot(2, Vec2::new(0.0, 30.0), 3),
            ],
        );

        assert_eq!(out, vec![TowerTarget {
            tower: TowerId::new(1),
            target: Some(EnemyId::new(2)),
        }]);
    }

    #[test]
    fn tower_without_reach_has_its_target_cleared() {
        let mut blind = tower_snapshot(1, Vec2::ZERO, Some(7));
        blind.progress.stats.range = 0.0;
        let mut broken = tower_snapshot(2, Vec2::ZERO, None);
        broken.progress.stats.range = f32::NAN;

        let out = run(
            vec![blind, broken],
            vec![enemy_snapshot(7, Vec2::ZERO, 2)],
        );

        assert_eq!(out, vec![
            TowerTarget {
                tower: TowerId::new(1),
                target: None,
            },
            TowerTarget {
                tower: TowerId::new(2),
                target: None,
            },
        ]);
    }

    #[test]
    fn furthest_along_path_wins_over_distance() {
        let out = run(
            vec![tower_snapshot(1, Vec2::ZERO, None)],
            vec![
                enemy_snapshot(1, Vec2::new(10.0, 0.0), 1),
                enemy_snapshot(2, Vec2::new(90.0, 0.0), 4),
            ],
        );

        assert_eq!(out[0].target, Some(EnemyId::new(2)));
    }

    #[test]
    fn current_target_is_kept_while_valid() {
        let out = run(
            vec![tower_snapshot(1, Vec2::ZERO, Some(7))],
            vec![
                enemy_snapshot(7, Vec2::new(95.0, 0.0), 0),
                enemy_snapshot(8, Vec2::new(5.0, 0.0), 6),
            ],
        );

        assert_eq!(out[0].target, Some(EnemyId::new(7)));
    }

    #[test]
    fn target_leaving_range_is_replaced() {
        let out = run(
            vec![tower_snapshot(1, Vec2::ZERO, Some(7))],
            vec![
                enemy_snapshot(7, Vec2::new(101.0, 0.0), 9),
                enemy_snapshot(8, Vec2::new(5.0, 0.0), 2),
            ],
        );

        assert_eq!(out[0].target, Some(EnemyId::new(8)));
    }

    #[test]
    fn dead_target_is_cleared_when_nothing_else_is_in_range() {
        let mut dead = enemy_snapshot(7, Vec2::new(10.0, 0.0), 2);
        dead.state = EnemyState::Dead;
        dead.health = 0;

        let out = run(vec![tower_snapshot(1, Vec2::ZERO, Some(7))], vec![dead]);

        assert_eq!(out, vec![TowerTarget {
            tower: TowerId::new(1),
            target: None,
        }]);
    }

    #[test]
    fn range_boundary_is_inclusive() {
        let out = run(
            vec![tower_snapshot(1, Vec2::ZERO, None)],
            vec![enemy_snapshot(3, Vec2::new(100.0, 0.0), 0)],
        );

        assert_eq!(out[0].target, Some(EnemyId::new(3)));
    }

    #[test]
    fn smaller_identifier_breaks_exact_ties() {
        let out = run(
            vec![tower_snapshot(1, Vec2::ZERO, None)],
            vec![
                enemy_snapshot(20, Vec2::new(40.0, 0.0), 2),
                enemy_snapshot(10, Vec2::new(-40.0, 0.0), 2),
            ],
        );

        assert_eq!(out[0].target, Some(EnemyId::new(10)));
    }

    #[test]
    fn ranking_orders_volley_candidates() {
        let tower = tower_snapshot(1, Vec2::ZERO, None);
        let enemies = EnemyView::from_snapshots(vec![
            enemy_snapshot(1, Vec2::new(20.0, 0.0), 1),
            enemy_snapshot(2, Vec2::new(60.0, 0.0), 3),
            enemy_snapshot(3, Vec2::new(30.0, 0.0), 3),
            enemy_snapshot(4, Vec2::new(300.0, 0.0), 9),
        ]);
        let mut out = Vec::new();

        rank_in_range(&tower, &enemies, &mut out);

        assert_eq!(out, vec![EnemyId::new(3), EnemyId::new(2), EnemyId::new(1)]);
    }

    #[test]
    fn empty_tower_view_produces_no_assignments() {
        let out = run(Vec::new(), vec![enemy_snapshot(1, Vec2::ZERO, 0)]);
        assert!(out.is_empty());
    }
}
