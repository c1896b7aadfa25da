//! Shape generation for 2D primitives
//!
//! Everything is emitted in field coordinates; `RenderState` maps them to
//! clip space.

use glam::DVec2;

use super::vertex::{Vertex, colors};
use crate::consts::FINISH_WIDTH;
use crate::sim::{Aabb, ObstacleView, RunState, Snapshot};

/// Height of the darker cap drawn at the gap edge of each gate rectangle
const GATE_CAP_HEIGHT: f64 = 12.0;
/// Extra width of the cap on each side
const GATE_CAP_OVERHANG: f64 = 3.0;

/// Generate vertices for a filled axis-aligned rectangle (two triangles)
///
/// Simulation coordinates are narrowed to GPU precision here.
pub fn rect(min: DVec2, max: DVec2, color: [f32; 4]) -> [Vertex; 6] {
    let (min, max) = (min.as_vec2(), max.as_vec2());
    [
        Vertex::new(min.x, min.y, color),
        Vertex::new(max.x, min.y, color),
        Vertex::new(min.x, max.y, color),
        Vertex::new(min.x, max.y, color),
        Vertex::new(max.x, min.y, color),
        Vertex::new(max.x, max.y, color),
    ]
}

/// Generate vertices for a box
pub fn aabb(bounds: &Aabb, color: [f32; 4]) -> [Vertex; 6] {
    rect(bounds.min, bounds.max, color)
}

/// One gate rectangle plus a cap on the edge facing the gap
fn gate_half(bounds: &Aabb, cap_at_bottom: bool, out: &mut Vec<Vertex>) {
    if bounds.height() <= 0.0 {
        return;
    }
    out.extend(aabb(bounds, colors::GATE));

    let cap_height = GATE_CAP_HEIGHT.min(bounds.height());
    let (cap_min_y, cap_max_y) = if cap_at_bottom {
        (bounds.max.y - cap_height, bounds.max.y)
    } else {
        (bounds.min.y, bounds.min.y + cap_height)
    };
    out.extend(rect(
        DVec2::new(bounds.min.x - GATE_CAP_OVERHANG, cap_min_y),
        DVec2::new(bounds.max.x + GATE_CAP_OVERHANG, cap_max_y),
        colors::GATE_CAP,
    ));
}

/// Generate all vertices for a snapshot, back to front
pub fn snapshot(snapshot: &Snapshot) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity((snapshot.obstacles.len() * 4 + 1) * 6);

    for obstacle in &snapshot.obstacles {
        match obstacle {
            ObstacleView::Gate { top, bottom } => {
                gate_half(top, true, &mut vertices);
                gate_half(bottom, false, &mut vertices);
            }
            ObstacleView::Finish { x } => {
                vertices.extend(rect(
                    DVec2::new(*x, 0.0),
                    DVec2::new(*x + FINISH_WIDTH, snapshot.field.height),
                    colors::FINISH,
                ));
            }
        }
    }

    let entity_color = if snapshot.run_state == RunState::Lost {
        colors::ENTITY_LOST
    } else {
        colors::ENTITY
    };
    vertices.extend(aabb(&snapshot.entity, entity_color));

    vertices
}
