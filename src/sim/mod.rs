//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed step only, one step per host frame
//! - Injected or seeded RNG only
//! - Stable iteration order (course order)
//! - No rendering or platform dependencies

pub mod autopilot;
pub mod collision;
pub mod course;
pub mod engine;
pub mod snapshot;
pub mod state;

pub use autopilot::Autopilot;
pub use collision::{Aabb, box_hits_gate, box_out_of_field};
pub use course::{gap_for_gate, generate_course, spacing_after_gate};
pub use engine::Engine;
pub use snapshot::{ObstacleView, Snapshot, StepResult};
pub use state::{
    Entity, Field, GameEvent, Gate, InputProfile, Obstacle, RunId, RunState,
};
