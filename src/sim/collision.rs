//! Collision detection for axis-aligned boxes
//!
//! The entity is a centered box; gates are two rectangles anchored to the
//! top and bottom of the field. All comparisons are strict, so touching
//! edges do not collide.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::state::Gate;

/// Axis-aligned box in field coordinates (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: DVec2,
    pub max: DVec2,
}

impl Aabb {
    pub const fn new(min: DVec2, max: DVec2) -> Self {
        Self { min, max }
    }

    /// Box of `size` centered on `center`
    pub fn from_center(center: DVec2, size: DVec2) -> Self {
        let half = size / 2.0;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Open-interval overlap on the x axis
    pub fn overlaps_x(&self, left: f64, right: f64) -> bool {
        self.max.x > left && self.min.x < right
    }
}

/// Check whether a box hits either rectangle of a gate
///
/// The box must overlap the gate horizontally and poke out of the gap
/// above or below.
pub fn box_hits_gate(bounds: &Aabb, gate: &Gate, field_height: f64) -> bool {
    bounds.overlaps_x(gate.x, gate.trailing_edge())
        && (bounds.min.y < gate.top || bounds.max.y > field_height - gate.bottom)
}

/// Check whether a box has left the vertical extent of the field
pub fn box_out_of_field(bounds: &Aabb, field_height: f64) -> bool {
    bounds.max.y > field_height || bounds.min.y < 0.0
}
