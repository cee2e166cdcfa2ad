//! Authoritative tower state management utilities.

use std::{collections::BTreeMap, time::Duration};

use glam::Vec2;
use lane_defence_core::{EnemyId, TowerId, TowerKind, TowerProgress, TowerSnapshot};

/// Snapshot of a tower stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct TowerState {
    /// Identifier allocated by the world for the tower.
    pub(crate) id: TowerId,
    /// Centre of the tower.
    pub(crate) position: Vec2,
    /// Stats, upgrades, and evolution state.
    pub(crate) progress: TowerProgress,
    /// Non-owning reference to the current target.
    pub(crate) target: Option<EnemyId>,
    /// Tower-local attack clock.
    pub(crate) age: Duration,
    /// Tower age at the most recent attack.
    pub(crate) last_attack: Duration,
}

impl TowerState {
    pub(crate) fn snapshot(&self) -> TowerSnapshot {
        TowerSnapshot {
            id: self.id,
            kind: self.progress.kind(),
            position: self.position,
            progress: self.progress.clone(),
            target: self.target,
            age: self.age,
            last_attack: self.last_attack,
        }
    }
}

/// Registry that stores towers and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct TowerRegistry {
    entries: BTreeMap<TowerId, TowerState>,
    next_tower_id: TowerId,
}

impl TowerRegistry {
    /// Creates an empty tower registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_tower_id: TowerId::new(0),
        }
    }

    /// Builds a fresh tower and returns its identifier.
    pub(crate) fn insert(&mut self, kind: TowerKind, position: Vec2) -> TowerId {
        let id = self.next_tower_id;
        self.next_tower_id = TowerId::new(id.get().saturating_add(1));
        let _ = self.entries.insert(
            id,
            TowerState {
                id,
                position,
                progress: TowerProgress::new(kind),
                target: None,
                age: Duration::ZERO,
                last_attack: Duration::ZERO,
            },
        );
        id
    }

    pub(crate) fn get(&self, id: TowerId) -> Option<&TowerState> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: TowerId) -> Option<&mut TowerState> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn remove(&mut self, id: TowerId) -> Option<TowerState> {
        self.entries.remove(&id)
    }

    /// Towers in identifier order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &TowerState> {
        self.entries.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut TowerState> {
        self.entries.values_mut()
    }

    pub(crate) fn positions(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.entries.values().map(|tower| tower.position)
    }

    /// Marks the tower as having attacked at its current age.
    pub(crate) fn record_attack(&mut self, id: TowerId) {
        if let Some(tower) = self.entries.get_mut(&id) {
            tower.last_attack = tower.age;
        }
    }
}
