//! Run state and core simulation types
//!
//! Everything the engine owns for one run lives here.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::collision::Aabb;
use crate::consts::*;

/// Lifecycle of a single run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RunState {
    /// Engine constructed, no run started yet
    #[default]
    NotStarted,
    /// Active gameplay
    Running,
    /// Entity hit a gate or left the field (terminal)
    Lost,
    /// Entity reached the finish marker (terminal)
    Won,
}

impl RunState {
    /// Lost and Won only leave via a fresh initialize
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Lost | RunState::Won)
    }
}

/// Which impulse strength to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputProfile {
    /// Touch devices get a softer jump
    Compact,
    /// Keyboard and mouse
    #[default]
    Standard,
}

impl InputProfile {
    pub fn impulse(&self) -> f64 {
        match self {
            InputProfile::Compact => IMPULSE_COMPACT,
            InputProfile::Standard => IMPULSE_STANDARD,
        }
    }

    /// Detect a compact (touch) context from a browser user agent
    pub fn from_user_agent(user_agent: &str) -> Self {
        const MOBILE: [&str; 4] = ["android", "iphone", "ipad", "ipod"];
        let ua = user_agent.to_lowercase();
        if MOBILE.iter().any(|needle| ua.contains(needle)) {
            InputProfile::Compact
        } else {
            InputProfile::Standard
        }
    }
}

/// Play field dimensions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub width: f64,
    pub height: f64,
}

impl Field {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl Default for Field {
    fn default() -> Self {
        Self::new(FIELD_WIDTH, FIELD_HEIGHT)
    }
}

/// The falling actor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Center position; x is fixed after initialization
    pub pos: DVec2,
    pub size: DVec2,
    /// Vertical velocity (positive is downward)
    pub velocity: f64,
    pub gravity: f64,
    /// Velocity written by an impulse
    pub impulse: f64,
}

impl Entity {
    /// Entity at rest in the vertical center of the field
    pub fn new(field: &Field, profile: InputProfile) -> Self {
        Self {
            pos: DVec2::new(ENTITY_X, field.height / 2.0),
            size: DVec2::new(ENTITY_WIDTH, ENTITY_HEIGHT),
            velocity: 0.0,
            gravity: GRAVITY,
            impulse: profile.impulse(),
        }
    }

    /// Explicit Euler, one fixed step
    pub fn integrate(&mut self) {
        self.velocity += self.gravity;
        self.pos.y += self.velocity;
    }

    pub fn apply_impulse(&mut self) {
        self.velocity = self.impulse;
    }

    /// Centered bounding box
    pub fn bounds(&self) -> Aabb {
        Aabb::from_center(self.pos, self.size)
    }
}

/// A pair of blocking rectangles with a passable gap between them
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gate {
    /// Left edge
    pub x: f64,
    pub width: f64,
    /// Height of the upper rectangle
    pub top: f64,
    /// Height of the lower rectangle
    pub bottom: f64,
    pub gap: f64,
    pub passed: bool,
}

impl Gate {
    /// Gate whose three vertical bands sum to `field_height`
    pub fn new(x: f64, width: f64, top: f64, gap: f64, field_height: f64) -> Self {
        Self {
            x,
            width,
            top,
            bottom: field_height - top - gap,
            gap,
            passed: false,
        }
    }

    pub fn trailing_edge(&self) -> f64 {
        self.x + self.width
    }

    /// Gap center in field coordinates
    pub fn gap_center(&self) -> f64 {
        self.top + self.gap / 2.0
    }

    /// Upper blocking rectangle
    pub fn top_rect(&self) -> Aabb {
        Aabb::new(DVec2::new(self.x, 0.0), DVec2::new(self.x + self.width, self.top))
    }

    /// Lower blocking rectangle
    pub fn bottom_rect(&self, field_height: f64) -> Aabb {
        Aabb::new(
            DVec2::new(self.x, field_height - self.bottom),
            DVec2::new(self.x + self.width, field_height),
        )
    }
}

/// Course element
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Obstacle {
    Gate(Gate),
    /// Sentinel with no collision geometry
    Finish { x: f64 },
}

impl Obstacle {
    pub fn x(&self) -> f64 {
        match self {
            Obstacle::Gate(gate) => gate.x,
            Obstacle::Finish { x } => *x,
        }
    }

    /// Scroll left by `dx`
    pub fn advance(&mut self, dx: f64) {
        match self {
            Obstacle::Gate(gate) => gate.x -= dx,
            Obstacle::Finish { x } => *x -= dx,
        }
    }

    pub fn as_gate(&self) -> Option<&Gate> {
        match self {
            Obstacle::Gate(gate) => Some(gate),
            Obstacle::Finish { .. } => None,
        }
    }
}

/// Notifications emitted by a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Gate at this course index was cleared
    GatePassed { index: usize },
    Won,
    Lost,
}

/// Identifies one run; increments on every initialize
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct RunId(pub u32);
