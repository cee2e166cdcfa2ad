//! Run configuration loaded from TOML.

use std::time::Duration;

use glam::Vec2;
use lane_defence_core::geometry::Arena;
use lane_defence_world::{PlacementRules, WorldConfig, DEFAULT_PATH};
use serde::Deserialize;
use thiserror::Error;

/// Errors raised while loading or validating a [`SimulationConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document is not valid TOML or does not match the schema.
    #[error("failed to parse simulation config: {0}")]
    Parse(#[from] toml::de::Error),
    /// The path has fewer than two waypoints.
    #[error("path needs at least two waypoints, found {0}")]
    TooFewWaypoints(usize),
    /// A waypoint has a NaN or infinite coordinate.
    #[error("waypoint {index} is not finite")]
    NonFiniteWaypoint {
        /// Position of the waypoint in the path.
        index: usize,
    },
    /// The arena has a non-positive or non-finite dimension.
    #[error("arena {width}x{height} is not a positive area")]
    InvalidArena {
        /// Configured width.
        width: f32,
        /// Configured height.
        height: f32,
    },
    /// The per-tick delta clamp is zero.
    #[error("max_delta_ms must be greater than zero")]
    ZeroDelta,
    /// Starting health is zero or above the health ceiling.
    #[error("starting health {starting} must be within 1..={max}")]
    InvalidHealth {
        /// Configured starting health.
        starting: u32,
        /// Configured ceiling.
        max: u32,
    },
}

/// Dimensions of the playable area.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArenaConfig {
    /// Horizontal extent.
    pub width: f32,
    /// Vertical extent.
    pub height: f32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

/// Tunable parameters of a run.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Seed every wave's enemy selection is derived from.
    pub seed: u64,
    /// Gold at the start of a run.
    pub starting_gold: u32,
    /// Health at the start of a run, also the ceiling for healing.
    pub starting_health: u32,
    /// Absolute health ceiling.
    pub max_health: u32,
    /// Largest step a single tick may simulate.
    pub max_delta_ms: u64,
    /// Delay between a completed wave and the next one.
    pub next_wave_delay_ms: u64,
    /// Gold bonus per wave number awarded on completion.
    pub wave_bonus_per_wave: u32,
    /// Playable area.
    pub arena: ArenaConfig,
    /// Waypoints as `[x, y]` pairs.
    pub path: Vec<[f32; 2]>,
    /// Tower placement rules.
    pub placement: PlacementRules,
    /// Whether completed waves schedule the next one automatically.
    pub auto_start_next_wave: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 0x4c41_4e45,
            starting_gold: 150,
            starting_health: 15,
            max_health: 20,
            max_delta_ms: 1000 / 30,
            next_wave_delay_ms: 3000,
            wave_bonus_per_wave: 10,
            arena: ArenaConfig::default(),
            path: DEFAULT_PATH.iter().map(|(x, y)| [*x, *y]).collect(),
            placement: PlacementRules::default(),
            auto_start_next_wave: true,
        }
    }
}

impl SimulationConfig {
    /// Parses and validates a TOML document. Missing fields keep their defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the invariants the simulation relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.path.len() < 2 {
            return Err(ConfigError::TooFewWaypoints(self.path.len()));
        }
        if let Some(index) = self
            .path
            .iter()
            .position(|[x, y]| !x.is_finite() || !y.is_finite())
        {
            return Err(ConfigError::NonFiniteWaypoint { index });
        }

        let ArenaConfig { width, height } = self.arena;
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(ConfigError::InvalidArena { width, height });
        }
        if self.max_delta_ms == 0 {
            return Err(ConfigError::ZeroDelta);
        }
        if self.starting_health == 0 || self.starting_health > self.max_health {
            return Err(ConfigError::InvalidHealth {
                starting: self.starting_health,
                max: self.max_health,
            });
        }
        Ok(())
    }

    /// Largest step a single tick may simulate.
    #[must_use]
    pub fn max_delta(&self) -> Duration {
        Duration::from_millis(self.max_delta_ms)
    }

    /// Delay between a completed wave and the next one.
    #[must_use]
    pub fn next_wave_delay(&self) -> Duration {
        Duration::from_millis(self.next_wave_delay_ms)
    }

    /// Layout handed to the world.
    #[must_use]
    pub fn world_config(&self) -> WorldConfig {
        WorldConfig {
            arena: Arena::new(self.arena.width, self.arena.height),
            path: self.path.iter().map(|[x, y]| Vec2::new(*x, *y)).collect(),
            placement: self.placement,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = SimulationConfig::from_toml_str("").expect("defaults are valid");
        assert_eq!(config, SimulationConfig::default());
        assert_eq!(config.max_delta(), Duration::from_millis(33));
        assert_eq!(config.world_config(), WorldConfig::default());
    }

    #[test]
    fn partial_documents_override_selected_fields() {
        let config = SimulationConfig::from_toml_str(
            r#"
            seed = 7
            starting_gold = 400
            path = [[0.0, 100.0], [800.0, 100.0]]

            [placement]
            min_path_distance = 30.0
            "#,
        )
        .expect("valid config");

        assert_eq!(config.seed, 7);
        assert_eq!(config.starting_gold, 400);
        assert_eq!(config.starting_health, 15);
        assert_eq!(config.path.len(), 2);
        assert_eq!(config.placement.min_path_distance, 30.0);
        assert_eq!(config.placement.grid_size, PlacementRules::default().grid_size);
    }

    #[test]
    fn rejects_degenerate_paths() {
        let error = SimulationConfig::from_toml_str("path = [[0.0, 0.0]]").unwrap_err();
        assert!(matches!(error, ConfigError::TooFewWaypoints(1)), "{error}");

        let mut config = SimulationConfig::default();
        config.path[3] = [f32::NAN, 0.0];
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonFiniteWaypoint { index: 3 })
        ));
    }

    #[test]
    fn rejects_zero_delta_and_bad_arena() {
        let error = SimulationConfig::from_toml_str("max_delta_ms = 0").unwrap_err();
        assert!(matches!(error, ConfigError::ZeroDelta));

        let error = SimulationConfig::from_toml_str("[arena]\nwidth = -5.0").unwrap_err();
        assert!(matches!(error, ConfigError::InvalidArena { .. }));
    }

    #[test]
    fn rejects_unknown_fields() {
        let error = SimulationConfig::from_toml_str("gold = 5").unwrap_err();
        assert!(matches!(error, ConfigError::Parse(_)));
    }

    #[test]
    fn starting_health_must_fit_under_the_ceiling() {
        let error =
            SimulationConfig::from_toml_str("starting_health = 30\nmax_health = 20").unwrap_err();
        assert!(matches!(
            error,
            ConfigError::InvalidHealth {
                starting: 30,
                max: 20
            }
        ));
    }
}
