//! Gate Dash - A side-scrolling gate runner arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, course, collisions, run state)
//! - `renderer`: WebGPU rendering pipeline
//! - `audio`: Procedural Web Audio cues (wasm32 only)
//! - `settings`: Player-facing configuration

#[cfg(target_arch = "wasm32")]
pub mod audio;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Default play field size (field units, y grows downward)
    pub const FIELD_WIDTH: f64 = 480.0;
    pub const FIELD_HEIGHT: f64 = 600.0;

    /// Constant downward acceleration per step
    pub const GRAVITY: f64 = 0.27;
    /// Impulse velocity for touch/compact input (softer jump)
    pub const IMPULSE_COMPACT: f64 = -5.8;
    /// Impulse velocity for keyboard/mouse input
    pub const IMPULSE_STANDARD: f64 = -7.0;
    /// Course scroll speed per step
    pub const SCROLL_SPEED: f64 = 1.2;

    /// Entity defaults - x never changes after initialization
    pub const ENTITY_X: f64 = 60.0;
    pub const ENTITY_WIDTH: f64 = 34.0;
    pub const ENTITY_HEIGHT: f64 = 34.0;

    /// Course layout
    pub const GATE_COUNT: usize = 25;
    pub const GATE_WIDTH: f64 = 50.0;
    pub const FIRST_GATE_X: f64 = 280.0;
    /// Spacing before gate i+1 is `GATE_BASE_SPACING - GATE_SPACING_DECAY * i`
    pub const GATE_BASE_SPACING: f64 = 250.0;
    pub const GATE_SPACING_DECAY: f64 = 2.0;
    /// Top-gap height is drawn uniformly from this half-open range
    pub const GATE_TOP_MIN: f64 = 70.0;
    pub const GATE_TOP_MAX: f64 = 170.0;

    /// Finish marker bar width (render only, no collision geometry)
    pub const FINISH_WIDTH: f64 = 10.0;
}
