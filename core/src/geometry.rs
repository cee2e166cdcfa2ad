//! Planar geometry helpers shared by the simulation.
//!
//! Positions and velocities are plain [`Vec2`] values expressed in arena
//! units. Velocities are measured in units per second.

use std::time::Duration;

use glam::Vec2;

/// Euclidean distance between two points.
#[must_use]
pub fn distance(from: Vec2, to: Vec2) -> f32 {
    from.distance(to)
}

/// Angle in radians of the direction pointing from `from` towards `to`.
///
/// Coincident points yield an angle of zero.
#[must_use]
pub fn angle_between(from: Vec2, to: Vec2) -> f32 {
    let offset = to - from;
    if offset == Vec2::ZERO {
        return 0.0;
    }
    offset.y.atan2(offset.x)
}

/// Shortest distance from `point` to the segment spanning `start..=end`.
#[must_use]
pub fn distance_to_segment(point: Vec2, start: Vec2, end: Vec2) -> f32 {
    let segment = end - start;
    let length_sq = segment.length_squared();
    if length_sq <= f32::EPSILON {
        return point.distance(start);
    }

    let projection = ((point - start).dot(segment) / length_sq).clamp(0.0, 1.0);
    point.distance(start + segment * projection)
}

/// Shortest distance from `point` to any segment of the polyline.
///
/// Returns `None` when the polyline contains fewer than two vertices.
#[must_use]
pub fn distance_to_polyline(point: Vec2, vertices: &[Vec2]) -> Option<f32> {
    vertices
        .windows(2)
        .map(|pair| distance_to_segment(point, pair[0], pair[1]))
        .reduce(f32::min)
}

/// Converts a speed and simulated duration into travelled distance.
#[must_use]
pub fn travel(speed_per_second: f32, dt: Duration) -> f32 {
    speed_per_second * dt.as_secs_f32()
}

/// Reports whether both components of the vector are finite.
#[must_use]
pub fn is_finite(point: Vec2) -> bool {
    point.x.is_finite() && point.y.is_finite()
}

/// Axis-aligned playable area anchored at the origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Arena {
    width: f32,
    height: f32,
}

impl Arena {
    /// Creates a new arena with the provided dimensions.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Horizontal extent of the arena.
    #[must_use]
    pub const fn width(&self) -> f32 {
        self.width
    }

    /// Vertical extent of the arena.
    #[must_use]
    pub const fn height(&self) -> f32 {
        self.height
    }

    /// Centre point of the arena.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Reports whether a point lies inside the arena shrunk by `margin` on every side.
    #[must_use]
    pub fn contains_with_margin(&self, point: Vec2, margin: f32) -> bool {
        point.x >= margin
            && point.y >= margin
            && point.x <= self.width - margin
            && point.y <= self.height - margin
    }
}
