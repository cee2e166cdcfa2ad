#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Tower progression rules: the evolution tree and per-stat upgrades.
//!
//! The evolution catalogue is data: a TOML document listing every node with
//! its family, tier, requirements, and typed bonus set. Bonuses are checked
//! against the tower family when the catalogue loads, so applying a node at
//! runtime never has to reject an unexpected field.

use std::{
    collections::{BTreeMap, BTreeSet},
    time::Duration,
};

use lane_defence_core::{
    CatalogError, EvolutionError, EvolutionId, TowerKind, TowerProgress, TowerStats,
};
use serde::Deserialize;
use thiserror::Error;

mod upgrade;

pub use upgrade::{
    apply_upgrade, quote_upgrade, SPEED_UPGRADE_FRACTION, SPLASH_UPGRADE_STEP, UPGRADE_COST_GROWTH,
};

const BUILTIN_CATALOGUE: &str = include_str!("../data/evolutions.toml");

/// Errors raised while loading an evolution catalogue.
#[derive(Debug, Error)]
pub enum EvolutionCatalogError {
    /// The document is not valid TOML or does not match the schema.
    #[error("failed to parse evolution catalogue: {0}")]
    Parse(#[from] toml::de::Error),
    /// A node names a tower family that does not exist.
    #[error("node `{node}` has an invalid family: {source}")]
    Family {
        /// Offending node.
        node: String,
        /// Underlying catalogue error.
        source: CatalogError,
    },
    /// Two nodes share an identifier.
    #[error("node `{0}` is declared more than once")]
    Duplicate(String),
    /// A node declares a tier outside `2..=3`.
    #[error("node `{node}` declares unsupported tier {tier}")]
    Tier {
        /// Offending node.
        node: String,
        /// Declared tier.
        tier: u8,
    },
    /// A node's prerequisite is missing, belongs to another family, or is not one tier lower.
    #[error("node `{node}` requires `{requires}`, which is not a lower-tier node of the same family")]
    Prerequisite {
        /// Offending node.
        node: String,
        /// Declared prerequisite.
        requires: String,
    },
    /// A tier 3 node omits its prerequisite.
    #[error("tier 3 node `{0}` must name a prerequisite")]
    MissingPrerequisite(String),
    /// A bonus field does not apply to the node's family.
    #[error("bonus `{field}` of node `{node}` does not apply to {family:?} towers")]
    BonusNotApplicable {
        /// Offending node.
        node: String,
        /// Field that was set.
        field: &'static str,
        /// Family of the node.
        family: TowerKind,
    },
    /// A bonus is not a finite number.
    #[error("bonus `{field}` of node `{node}` is not finite")]
    NonFinite {
        /// Offending node.
        node: String,
        /// Field that was set.
        field: &'static str,
    },
}

/// Typed stat bonuses granted by an evolution node. Every field adds to the
/// tower's current value; zero means the node leaves the stat alone.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EvolutionBonuses {
    /// Damage per attack.
    pub damage: f32,
    /// Targeting range.
    pub range: f32,
    /// Attack interval change in milliseconds, negative is faster.
    pub attack_speed_ms: i64,
    /// Splash radius.
    pub splash_radius: f32,
    /// Slow strength.
    pub slow_effect: f32,
    /// Slow duration change in milliseconds.
    pub slow_duration_ms: i64,
    /// Poison damage per tick.
    pub poison_damage: f32,
    /// Poison duration change in milliseconds.
    pub poison_duration_ms: i64,
    /// Extra chain jumps.
    pub chain_targets: i32,
    /// Change to the per-jump damage multiplier.
    pub chain_damage_reduction: f32,
    /// Extra projectiles per volley.
    pub multi_shot: u32,
}

impl EvolutionBonuses {
    fn validate(&self, node: &str, family: TowerKind) -> Result<(), EvolutionCatalogError> {
        let floats = [
            ("damage", self.damage),
            ("range", self.range),
            ("splash_radius", self.splash_radius),
            ("slow_effect", self.slow_effect),
            ("poison_damage", self.poison_damage),
            ("chain_damage_reduction", self.chain_damage_reduction),
        ];
        if let Some((field, _)) = floats.iter().find(|(_, value)| !value.is_finite()) {
            return Err(EvolutionCatalogError::NonFinite {
                node: node.to_owned(),
                field: *field,
            });
        }

        let restricted: [(&'static str, bool, bool); 8] = [
            (
                "splash_radius",
                self.splash_radius != 0.0,
                matches!(family, TowerKind::Mage | TowerKind::Cannon),
            ),
            ("slow_effect", self.slow_effect != 0.0, family == TowerKind::IceMage),
            ("slow_duration_ms", self.slow_duration_ms != 0, family == TowerKind::IceMage),
            ("poison_damage", self.poison_damage != 0.0, family == TowerKind::Poison),
            ("poison_duration_ms", self.poison_duration_ms != 0, family == TowerKind::Poison),
            ("chain_targets", self.chain_targets != 0, family == TowerKind::Lightning),
            (
                "chain_damage_reduction",
                self.chain_damage_reduction != 0.0,
                family == TowerKind::Lightning,
            ),
            ("multi_shot", self.multi_shot != 0, family == TowerKind::Archer),
        ];

        match restricted.iter().find(|(_, set, allowed)| *set && !*allowed) {
            Some((field, _, _)) => Err(EvolutionCatalogError::BonusNotApplicable {
                node: node.to_owned(),
                field: *field,
                family,
            }),
            None => Ok(()),
        }
    }

    fn apply(&self, stats: &mut TowerStats) {
        stats.damage += self.damage;
        stats.range += self.range;
        stats.attack_interval = offset(stats.attack_interval, self.attack_speed_ms);
        stats.splash_radius += self.splash_radius;
        if let Some(slow) = stats.slow.as_mut() {
            slow.strength += self.slow_effect;
            slow.duration = offset(slow.duration, self.slow_duration_ms);
        }
        if let Some(poison) = stats.poison.as_mut() {
            poison.damage += self.poison_damage;
            poison.duration = offset(poison.duration, self.poison_duration_ms);
        }
        if let Some(chain) = stats.chain.as_mut() {
            chain.extra_targets = chain.extra_targets.saturating_add_signed(self.chain_targets);
            chain.damage_decay += self.chain_damage_reduction;
        }
        stats.multi_shot = stats.multi_shot.saturating_add(self.multi_shot);
        stats.normalize();
    }
}

fn offset(duration: Duration, delta_ms: i64) -> Duration {
    let millis = i64::try_from(duration.as_millis()).unwrap_or(i64::MAX);
    Duration::from_millis(millis.saturating_add(delta_ms).max(0) as u64)
}

/// A single read-only node of the evolution tree.
#[derive(Clone, Debug, PartialEq)]
pub struct EvolutionNode {
    id: EvolutionId,
    family: TowerKind,
    name: String,
    description: String,
    tier: u8,
    cost: u32,
    min_level: u32,
    requires: Option<EvolutionId>,
    bonuses: EvolutionBonuses,
    abilities: Vec<String>,
}

impl EvolutionNode {
    /// Identifier of the node.
    #[must_use]
    pub fn id(&self) -> &EvolutionId {
        &self.id
    }

    /// Tower family the node belongs to.
    #[must_use]
    pub const fn family(&self) -> TowerKind {
        self.family
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Tier the tower reaches after taking the node.
    #[must_use]
    pub const fn tier(&self) -> u8 {
        self.tier
    }

    /// Gold price of the node.
    #[must_use]
    pub const fn cost(&self) -> u32 {
        self.cost
    }

    /// Minimum tower level.
    #[must_use]
    pub const fn min_level(&self) -> u32 {
        self.min_level
    }

    /// Evolution the tower must currently hold, if any.
    #[must_use]
    pub fn requires(&self) -> Option<&EvolutionId> {
        self.requires.as_ref()
    }

    /// Typed stat bonuses.
    #[must_use]
    pub const fn bonuses(&self) -> &EvolutionBonuses {
        &self.bonuses
    }

    /// Special ability flags granted by the node.
    #[must_use]
    pub fn abilities(&self) -> &[String] {
        &self.abilities
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogueDocument {
    #[serde(rename = "node", default)]
    nodes: Vec<NodeDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NodeDocument {
    id: String,
    family: String,
    name: String,
    #[serde(default)]
    description: String,
    tier: u8,
    cost: u32,
    min_level: u32,
    #[serde(default)]
    requires: Option<String>,
    #[serde(default)]
    bonuses: EvolutionBonuses,
    #[serde(default)]
    abilities: Vec<String>,
}

/// Forward-only tree of tower evolutions.
#[derive(Clone, Debug, PartialEq)]
pub struct EvolutionTree {
    nodes: BTreeMap<EvolutionId, EvolutionNode>,
}

impl EvolutionTree {
    /// Loads the catalogue shipped with the crate.
    pub fn builtin() -> Result<Self, EvolutionCatalogError> {
        Self::from_toml_str(BUILTIN_CATALOGUE)
    }

    /// Parses and validates a catalogue document.
    pub fn from_toml_str(contents: &str) -> Result<Self, EvolutionCatalogError> {
        let document: CatalogueDocument = toml::from_str(contents)?;
        let mut nodes = BTreeMap::new();

        for raw in document.nodes {
            let family = TowerKind::from_key(&raw.family).map_err(|source| {
                EvolutionCatalogError::Family {
                    node: raw.id.clone(),
                    source,
                }
            })?;
            if !(2..=3).contains(&raw.tier) {
                return Err(EvolutionCatalogError::Tier {
                    node: raw.id,
                    tier: raw.tier,
                });
            }
            if raw.tier == 3 && raw.requires.is_none() {
                return Err(EvolutionCatalogError::MissingPrerequisite(raw.id));
            }
            raw.bonuses.validate(&raw.id, family)?;

            let id = EvolutionId::new(raw.id.clone());
            let node = EvolutionNode {
                id: id.clone(),
                family,
                name: raw.name,
                description: raw.description,
                tier: raw.tier,
                cost: raw.cost,
                min_level: raw.min_level,
                requires: raw.requires.map(EvolutionId::new),
                bonuses: raw.bonuses,
                abilities: raw.abilities,
            };
            if nodes.insert(id, node).is_some() {
                return Err(EvolutionCatalogError::Duplicate(raw.id));
            }
        }

        for node in nodes.values() {
            let Some(requires) = node.requires.as_ref() else {
                continue;
            };
            let valid = nodes.get(requires).is_some_and(|parent| {
                parent.family == node.family && parent.tier + 1 == node.tier
            });
            if !valid {
                return Err(EvolutionCatalogError::Prerequisite {
                    node: node.id.to_string(),
                    requires: requires.to_string(),
                });
            }
        }

        tracing::debug!(nodes = nodes.len(), "loaded evolution catalogue");
        Ok(Self { nodes })
    }

    /// Looks up a node by identifier.
    #[must_use]
    pub fn get(&self, id: &EvolutionId) -> Option<&EvolutionNode> {
        self.nodes.get(id)
    }

    /// Number of nodes in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Reports whether the tree holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterator over the nodes of a tower family in identifier order.
    pub fn family(&self, kind: TowerKind) -> impl Iterator<Item = &EvolutionNode> {
        self.nodes.values().filter(move |node| node.family == kind)
    }

    /// Checks whether `progress` may take the node `id`.
    ///
    /// The node must belong to the tower's family, must not be the tower's
    /// current evolution, must be within the tower's level, must match the
    /// tower's current evolution when it names a prerequisite, and must raise
    /// the tower's tier.
    pub fn can_evolve(
        &self,
        progress: &TowerProgress,
        id: &EvolutionId,
    ) -> Result<&EvolutionNode, EvolutionError> {
        let node = self
            .nodes
            .get(id)
            .ok_or_else(|| EvolutionError::Unknown(id.clone()))?;

        if node.family != progress.kind() {
            return Err(EvolutionError::WrongFamily {
                evolution: id.clone(),
                kind: progress.kind(),
            });
        }
        if progress.evolution.as_ref() == Some(id) {
            return Err(EvolutionError::AlreadyTaken(id.clone()));
        }
        if progress.level() < node.min_level {
            return Err(EvolutionError::LevelTooLow {
                required: node.min_level,
                current: progress.level(),
            });
        }
        if let Some(required) = node.requires.as_ref() {
            if progress.evolution.as_ref() != Some(required) {
                return Err(EvolutionError::PrerequisiteUnmet {
                    required: Some(required.clone()),
                });
            }
        }
        if node.tier <= progress.tier {
            return Err(EvolutionError::TierNotIncreasing {
                current: progress.tier,
                requested: node.tier,
            });
        }

        Ok(node)
    }

    /// Applies the node `id` to `progress` if [`EvolutionTree::can_evolve`] allows it.
    ///
    /// On success the numeric bonuses are added and the node's abilities
    /// replace the tower's. The tier, the current evolution and the tower's
    /// investment advance. On failure `progress` is left untouched.
    pub fn evolve(
        &self,
        progress: &mut TowerProgress,
        id: &EvolutionId,
    ) -> Result<&EvolutionNode, EvolutionError> {
        let node = self.can_evolve(progress, id)?;

        node.bonuses.apply(&mut progress.stats);
        progress.stats.abilities = node.abilities.iter().cloned().collect();
        progress.evolution = Some(node.id.clone());
        progress.tier = node.tier;
        progress.invested = progress.invested.saturating_add(node.cost);

        Ok(node)
    }

    /// Nodes the tower may take right now, in identifier order.
    #[must_use]
    pub fn available(&self, progress: &TowerProgress) -> Vec<&EvolutionNode> {
        self.family(progress.kind())
            .filter(|node| self.can_evolve(progress, &node.id).is_ok())
            .collect()
    }

    /// Chain of nodes leading to `id`, starting at the tier 2 root.
    pub fn path_to(&self, id: &EvolutionId) -> Result<Vec<&EvolutionNode>, EvolutionError> {
        let mut path = Vec::new();
        let mut visited = BTreeSet::new();
        let mut cursor = Some(id);

        while let Some(current) = cursor {
            if !visited.insert(current) {
                break;
            }
            let node = self
                .nodes
                .get(current)
                .ok_or_else(|| EvolutionError::Unknown(current.clone()))?;
            path.push(node);
            cursor = node.requires.as_ref();
        }

        path.reverse();
        Ok(path)
    }

    /// Gold needed to walk the whole path to `id` from a base tower.
    pub fn total_cost(&self, id: &EvolutionId) -> Result<u32, EvolutionError> {
        Ok(self
            .path_to(id)?
            .iter()
            .fold(0u32, |total, node| total.saturating_add(node.cost)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lane_defence_core::UpgradeStat;

    fn tree() -> EvolutionTree {
        EvolutionTree::builtin().expect("builtin catalogue loads")
    }

    fn levelled(kind: TowerKind, purchases: u32) -> TowerProgress {
        let mut progress = TowerProgress::new(kind);
        for _ in 0..purchases {
            progress.upgrades.increment(UpgradeStat::Damage);
        }
        progress
    }

    #[test]
    fn builtin_catalogue_covers_every_family() {
        let tree = tree();
        assert_eq!(tree.len(), 48);
        for kind in TowerKind::ALL {
            let nodes: Vec<_> = tree.family(kind).collect();
            assert_eq!(nodes.len(), 8, "{kind:?}");
            assert_eq!(nodes.iter().filter(|node| node.tier() == 2).count(), 2);
        }
    }

    #[test]
    fn tier_two_requires_level_two() {
        let tree = tree();
        let id = EvolutionId::new("ARCHER_VETERAN");

        let error = tree
            .can_evolve(&levelled(TowerKind::Archer, 0), &id)
            .expect_err("level 1 is too low");
        assert_eq!(
            error,
            EvolutionError::LevelTooLow {
                required: 2,
                current: 1
            }
        );
        assert!(tree.can_evolve(&levelled(TowerKind::Archer, 1), &id).is_ok());
    }

    #[test]
    fn evolve_applies_bonuses_and_investment() {
        let tree = tree();
        let mut progress = levelled(TowerKind::Archer, 1);
        let invested = progress.invested;

        let node = tree
            .evolve(&mut progress, &EvolutionId::new("ARCHER_HUNTER"))
            .expect("hunter is available");

        assert_eq!(node.cost(), 60);
        assert_eq!(progress.tier, 2);
        assert_eq!(progress.invested, invested + 60);
        assert_eq!(progress.stats.multi_shot, 2);
        assert!((progress.stats.damage - 18.0).abs() < f32::EPSILON);
        assert_eq!(progress.stats.attack_interval, Duration::from_millis(900));
    }

    #[test]
    fn unmet_prerequisite_leaves_progress_untouched() {
        let tree = tree();
        let mut progress = levelled(TowerKind::Mage, 2);
        let before = progress.clone();

        let error = tree
            .evolve(&mut progress, &EvolutionId::new("MAGE_ARCHMAGE"))
            .expect_err("scholar is required first");

        assert_eq!(
            error,
            EvolutionError::PrerequisiteUnmet {
                required: Some(EvolutionId::new("MAGE_SCHOLAR"))
            }
        );
        assert_eq!(progress, before);
    }

    #[test]
    fn tier_never_decreases_or_repeats() {
        let tree = tree();
        let mut progress = levelled(TowerKind::Mage, 2);
        let _ = tree
            .evolve(&mut progress, &EvolutionId::new("MAGE_SCHOLAR"))
            .expect("scholar");

        assert_eq!(
            tree.can_evolve(&progress, &EvolutionId::new("MAGE_SCHOLAR")),
            Err(EvolutionError::AlreadyTaken(EvolutionId::new("MAGE_SCHOLAR")))
        );
        assert_eq!(
            tree.can_evolve(&progress, &EvolutionId::new("MAGE_BATTLE")),
            Err(EvolutionError::TierNotIncreasing {
                current: 2,
                requested: 2
            })
        );

        let _ = tree
            .evolve(&mut progress, &EvolutionId::new("MAGE_ARCHMAGE"))
            .expect("archmage");
        assert_eq!(progress.tier, 3);
        assert!(tree.available(&progress).is_empty());
    }

    #[test]
    fn evolving_replaces_the_ability_set() {
        let tree = tree();
        let mut progress = levelled(TowerKind::Mage, 2);
        let _ = tree
            .evolve(&mut progress, &EvolutionId::new("MAGE_SCHOLAR"))
            .expect("scholar");
        assert!(progress.stats.abilities.contains("mana_efficiency"));

        let _ = tree
            .evolve(&mut progress, &EvolutionId::new("MAGE_ARCHMAGE"))
            .expect("archmage");
        let abilities: Vec<&str> = progress.stats.abilities.iter().map(String::as_str).collect();
        assert_eq!(abilities, vec!["chain_lightning", "mana_regeneration"]);
    }

    #[test]
    fn wrong_family_is_rejected() {
        let tree = tree();
        let error = tree
            .can_evolve(
                &levelled(TowerKind::Cannon, 2),
                &EvolutionId::new("LIGHTNING_TESLA"),
            )
            .expect_err("family mismatch");
        assert!(matches!(error, EvolutionError::WrongFamily { .. }));
    }

    #[test]
    fn available_lists_tier_two_roots_for_fresh_levelled_tower() {
        let tree = tree();
        let available: Vec<String> = tree
            .available(&levelled(TowerKind::Lightning, 1))
            .into_iter()
            .map(|node| node.id().to_string())
            .collect();
        assert_eq!(available, vec!["LIGHTNING_STORM", "LIGHTNING_TESLA"]);
    }

    #[test]
    fn path_and_total_cost_walk_prerequisites() {
        let tree = tree();
        let id = EvolutionId::new("CANNON_TREBUCHET");

        let path: Vec<String> = tree
            .path_to(&id)
            .expect("path")
            .into_iter()
            .map(|node| node.id().to_string())
            .collect();

        assert_eq!(path, vec!["CANNON_MORTAR", "CANNON_TREBUCHET"]);
        assert_eq!(tree.total_cost(&id), Ok(350));
        assert!(tree.total_cost(&EvolutionId::new("NOPE")).is_err());
    }

    #[test]
    fn lightning_bonuses_extend_the_chain() {
        let tree = tree();
        let mut progress = levelled(TowerKind::Lightning, 1);
        let _ = tree
            .evolve(&mut progress, &EvolutionId::new("LIGHTNING_STORM"))
            .expect("storm");

        let chain = progress.stats.chain.expect("lightning chains");
        assert_eq!(chain.extra_targets, 4);
        assert!((chain.damage_decay - 0.5).abs() < 1e-6);
    }

    #[test]
    fn misplaced_bonuses_are_rejected_at_load_time() {
        let document = r#"
            [[node]]
            id = "CANNON_FROST"
            family = "CANNON"
            name = "Frost Cannon"
            tier = 2
            cost = 10
            min_level = 2
            bonuses = { slow_effect = 0.3 }
        "#;

        let error = EvolutionTree::from_toml_str(document).expect_err("slow on cannon");
        assert!(matches!(
            error,
            EvolutionCatalogError::BonusNotApplicable {
                field: "slow_effect",
                family: TowerKind::Cannon,
                ..
            }
        ));
    }

    #[test]
    fn dangling_prerequisites_are_rejected_at_load_time() {
        let document = r#"
            [[node]]
            id = "ARCHER_GHOST"
            family = "ARCHER"
            name = "Ghost"
            tier = 3
            cost = 10
            min_level = 3
            requires = "ARCHER_MISSING"
        "#;

        let error = EvolutionTree::from_toml_str(document).expect_err("missing parent");
        assert!(matches!(error, EvolutionCatalogError::Prerequisite { .. }));
    }

    #[test]
    fn unknown_bonus_fields_fail_to_parse() {
        let document = r#"
            [[node]]
            id = "ARCHER_X"
            family = "ARCHER"
            name = "X"
            tier = 2
            cost = 10
            min_level = 2
            bonuses = { accuracy = 0.9 }
        "#;

        assert!(matches!(
            EvolutionTree::from_toml_str(document),
            Err(EvolutionCatalogError::Parse(_))
        ));
    }
}
