//! Demo controller that flies the course on its own
//!
//! Aims for the gap center of the nearest gate that still overlaps or lies
//! ahead of the entity, and impulses whenever the entity sinks far enough
//! below it. The margin is a fixed fraction of the rise a single impulse
//! produces, so the same controller works for both input profiles.

use super::engine::Engine;
use super::state::{Entity, RunState};

/// Fraction of one impulse's rise to sit below the target before impulsing
const DEFAULT_MARGIN_RATIO: f64 = 0.45;

#[derive(Debug, Clone, Copy)]
pub struct Autopilot {
    margin_ratio: f64,
}

impl Default for Autopilot {
    fn default() -> Self {
        Self {
            margin_ratio: DEFAULT_MARGIN_RATIO,
        }
    }
}

impl Autopilot {
    pub fn new(margin_ratio: f64) -> Self {
        Self { margin_ratio }
    }

    /// Height gained between an impulse and the apex that follows it
    pub fn impulse_rise(entity: &Entity) -> f64 {
        if entity.gravity <= 0.0 || entity.impulse >= 0.0 {
            return 0.0;
        }
        let mut velocity = entity.impulse;
        let mut rise = 0.0;
        loop {
            velocity += entity.gravity;
            if velocity >= 0.0 {
                break;
            }
            rise -= velocity;
        }
        rise
    }

    /// Vertical position to steer toward
    pub fn target(engine: &Engine) -> f64 {
        let left = engine.entity().bounds().min.x;
        engine
            .course()
            .iter()
            .filter_map(|obstacle| obstacle.as_gate())
            .find(|gate| gate.trailing_edge() >= left)
            .map(|gate| gate.gap_center())
            .unwrap_or(engine.field().height / 2.0)
    }

    /// Whether to call `impulse()` before the next step
    pub fn should_impulse(&self, engine: &Engine) -> bool {
        if engine.run_state() != RunState::Running {
            return false;
        }
        let entity = engine.entity();
        let margin = Self::impulse_rise(entity) * self.margin_ratio;
        entity.pos.y > Self::target(engine) + margin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{Field, InputProfile};

    #[test]
    fn test_impulse_rise() {
        let field = Field::default();
        let compact = Entity::new(&field, InputProfile::Compact);
        let standard = Entity::new(&field, InputProfile::Standard);
        // Discrete sums of (-v + g*k) until velocity turns non-negative
        assert!((Autopilot::impulse_rise(&compact) - 59.43).abs() < 1e-9);
        assert!((Autopilot::impulse_rise(&standard) - 87.25).abs() < 1e-9);
    }

    #[test]
    fn test_margin_ratio_sets_trigger_depth() {
        let mut engine = Engine::new(Field::default());
        engine.initialize_seeded(Field::default(), InputProfile::Compact, 77);
        let target = Autopilot::target(&engine);
        let rise = Autopilot::impulse_rise(engine.entity());

        // Entity starts at y=300 and every first gap center lies in [160, 260)
        let below = 300.0 - target;
        assert!(Autopilot::new(0.0).should_impulse(&engine));
        assert!(!Autopilot::new(below / rise + 0.01).should_impulse(&engine));
    }

    #[test]
    fn test_idle_before_start() {
        let engine = Engine::new(Field::default());
        assert!(!Autopilot::default().should_impulse(&engine));
    }

    #[test]
    fn test_targets_first_gate() {
        let mut engine = Engine::new(Field::default());
        engine.initialize_seeded(Field::default(), InputProfile::Compact, 77);
        let first = engine.course()[0].as_gate().copied().expect("first obstacle is a gate");
        assert_eq!(Autopilot::target(&engine), first.gap_center());
        // Starts at the field center, below every possible first gap center
        assert!(Autopilot::default().should_impulse(&engine));
    }
}
