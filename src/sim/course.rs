//! Obstacle course generation
//!
//! One course per run: 25 gates in three difficulty tiers followed by a
//! finish marker. Gap offsets come from the caller's RNG so a seeded RNG
//! reproduces the same course.

use rand::Rng;

use super::state::{Field, Gate, Obstacle};
use crate::consts::*;

/// Gap size for gate `index`, tightening every ten gates
pub fn gap_for_gate(index: usize) -> f64 {
    match index {
        0..10 => 180.0,
        10..20 => 160.0,
        _ => 140.0,
    }
}

/// Horizontal distance from gate `index` to the next obstacle
///
/// Shrinks by two units per gate. Never non-positive for `GATE_COUNT`
/// gates, but the arithmetic is kept as-is for longer courses.
pub fn spacing_after_gate(index: usize) -> f64 {
    GATE_BASE_SPACING - GATE_SPACING_DECAY * index as f64
}

/// Generate a fresh course for `field`
pub fn generate_course<R: Rng + ?Sized>(field: &Field, rng: &mut R) -> Vec<Obstacle> {
    let mut course = Vec::with_capacity(GATE_COUNT + 1);
    let mut x = FIRST_GATE_X;

    for i in 0..GATE_COUNT {
        let gap = gap_for_gate(i);
        // Independent per gate, no smoothing between neighbours
        let top = rng.random_range(GATE_TOP_MIN..GATE_TOP_MAX);
        course.push(Obstacle::Gate(Gate::new(x, GATE_WIDTH, top, gap, field.height)));

        let spacing = spacing_after_gate(i);
        if spacing <= 0.0 {
            log::warn!("Non-positive spacing {} after gate {}", spacing, i);
        }
        x += spacing;
    }

    course.push(Obstacle::Finish { x });
    log::debug!("Generated course: {} gates, finish at x={}", GATE_COUNT, x);

    course
}
