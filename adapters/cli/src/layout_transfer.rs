//! Single-line text encoding of tower layouts, for sharing a build between runs.

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use lane_defence_core::{CommandError, PlayerCommand, TowerKind};
use lane_defence_simulation::Simulation;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const LAYOUT_DOMAIN: &str = "lane";
const LAYOUT_VERSION: &str = "v1";
const FIELD_DELIMITER: char = ':';

/// Towers of a run together with the arena they were built in.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct TowerLayout {
    /// Arena width in world units.
    pub(crate) width: u32,
    /// Arena height in world units.
    pub(crate) height: u32,
    /// Towers in build order.
    pub(crate) towers: Vec<LayoutTower>,
}

/// Tower entry of a layout.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct LayoutTower {
    /// Tower family.
    pub(crate) kind: TowerKind,
    /// Horizontal centre.
    pub(crate) x: f32,
    /// Vertical centre.
    pub(crate) y: f32,
}

/// Errors raised while decoding a layout string.
#[derive(Debug, Error)]
pub(crate) enum LayoutTransferError {
    #[error("layout string is empty")]
    Empty,
    #[error("layout string is missing its {0} segment")]
    MissingSegment(&'static str),
    #[error("layout prefix '{0}' is not supported")]
    InvalidPrefix(String),
    #[error("layout version '{0}' is not supported")]
    UnsupportedVersion(String),
    #[error("could not parse arena dimensions '{0}'")]
    InvalidDimensions(String),
    #[error("could not decode layout payload: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),
    #[error("could not parse layout payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}

impl TowerLayout {
    /// Captures the towers currently standing in `simulation`.
    pub(crate) fn capture(simulation: &Simulation) -> Self {
        let arena = simulation.config().arena;
        Self {
            width: arena.width.round() as u32,
            height: arena.height.round() as u32,
            towers: simulation
                .snapshot()
                .towers
                .iter()
                .map(|tower| LayoutTower {
                    kind: tower.kind,
                    x: tower.position.x,
                    y: tower.position.y,
                })
                .collect(),
        }
    }

    /// Encodes the layout as `lane:v1:<width>x<height>:<payload>`.
    pub(crate) fn encode(&self) -> Result<String, LayoutTransferError> {
        let json = serde_json::to_vec(&self.towers)?;
        let encoded = STANDARD_NO_PAD.encode(json);
        Ok(format!(
            "{LAYOUT_DOMAIN}{FIELD_DELIMITER}{LAYOUT_VERSION}{FIELD_DELIMITER}{}x{}{FIELD_DELIMITER}{encoded}",
            self.width, self.height
        ))
    }

    /// Parses a string produced by [`TowerLayout::encode`].
    pub(crate) fn decode(value: &str) -> Result<Self, LayoutTransferError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(LayoutTransferError::Empty);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let mut next = |segment| parts.next().ok_or(LayoutTransferError::MissingSegment(segment));
        let domain = next("prefix")?;
        let version = next("version")?;
        let dimensions = next("dimensions")?;
        let payload = next("payload")?;

        if domain != LAYOUT_DOMAIN {
            return Err(LayoutTransferError::InvalidPrefix(domain.to_owned()));
        }
        if version != LAYOUT_VERSION {
            return Err(LayoutTransferError::UnsupportedVersion(version.to_owned()));
        }

        let (width, height) = parse_dimensions(dimensions)?;
        let bytes = STANDARD_NO_PAD.decode(payload.as_bytes())?;
        let towers = serde_json::from_slice(&bytes)?;
        Ok(Self {
            width,
            height,
            towers,
        })
    }

    /// Builds every tower of the layout, returning the rejections.
    pub(crate) fn build(&self, simulation: &mut Simulation) -> Vec<(LayoutTower, CommandError)> {
        self.towers
            .iter()
            .filter_map(|tower| {
                simulation
                    .submit(PlayerCommand::PlaceTower {
                        kind: tower.kind,
                        position: glam::Vec2::new(tower.x, tower.y),
                    })
                    .err()
                    .map(|error| (*tower, error))
            })
            .collect()
    }
}

fn parse_dimensions(dimensions: &str) -> Result<(u32, u32), LayoutTransferError> {
    let invalid = || LayoutTransferError::InvalidDimensions(dimensions.to_owned());
    let (width, height) = dimensions.split_once(['x', 'X']).ok_or_else(invalid)?;
    let width = width.trim().parse::<u32>().map_err(|_| invalid())?;
    let height = height.trim().parse::<u32>().map_err(|_| invalid())?;
    if width == 0 || height == 0 {
        return Err(invalid());
    }
    Ok((width, height))
}
