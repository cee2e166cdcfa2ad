//! Tower placement validation.

use glam::Vec2;
use lane_defence_core::{
    geometry::{self, Arena},
    PlacementError,
};
use serde::Deserialize;

/// Rules governing where towers may be built.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlacementRules {
    /// Minimum distance between a tower centre and any path segment.
    pub min_path_distance: f32,
    /// Side length of the square cells used for occupancy limits.
    pub grid_size: f32,
    /// Towers allowed inside a single cell.
    pub max_towers_per_cell: usize,
    /// Diameter of a tower footprint.
    pub tower_size: f32,
}

impl Default for PlacementRules {
    fn default() -> Self {
        Self {
            min_path_distance: 15.0,
            grid_size: 40.0,
            max_towers_per_cell: 1,
            tower_size: 24.0,
        }
    }
}

impl PlacementRules {
    /// Grid cell containing `position`.
    #[must_use]
    pub fn cell_of(&self, position: Vec2) -> (i64, i64) {
        if self.grid_size <= 0.0 || !self.grid_size.is_finite() {
            return (0, 0);
        }
        (
            (position.x / self.grid_size).floor() as i64,
            (position.y / self.grid_size).floor() as i64,
        )
    }
}

/// Checks whether a tower centred on `position` may be built.
///
/// Checks run in a fixed order so the reported reason is deterministic:
/// finiteness, arena bounds, path clearance, cell capacity, then overlap.
pub(crate) fn validate<I>(
    rules: &PlacementRules,
    arena: Arena,
    path: &[Vec2],
    towers: I,
    position: Vec2,
) -> Result<(), PlacementError>
where
    I: IntoIterator<Item = Vec2>,
{
    if !geometry::is_finite(position) {
        return Err(PlacementError::NonFinitePosition);
    }

    if !arena.contains_with_margin(position, rules.tower_size / 2.0) {
        return Err(PlacementError::OutOfBounds);
    }

    if let Some(distance) = geometry::distance_to_polyline(position, path) {
        if distance < rules.min_path_distance {
            return Err(PlacementError::TooCloseToPath);
        }
    }

    let cell = rules.cell_of(position);
    let mut occupants = 0;
    let mut overlapping = false;
    for existing in towers {
        if rules.cell_of(existing) == cell {
            occupants += 1;
        }
        if existing.distance(position) < rules.tower_size {
            overlapping = true;
        }
    }

    if occupants >= rules.max_towers_per_cell {
        return Err(PlacementError::CellFull);
    }
    if overlapping {
        return Err(PlacementError::Overlapping);
    }

    Ok(())
}
