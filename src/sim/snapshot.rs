//! Immutable drawable state produced after every step

use serde::{Deserialize, Serialize};

use super::collision::Aabb;
use super::state::{Field, GameEvent, Obstacle, RunState};

/// Drawable view of one obstacle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ObstacleView {
    /// Upper and lower blocking rectangles of a gate
    Gate { top: Aabb, bottom: Aabb },
    Finish { x: f64 },
}

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub field: Field,
    pub entity: Aabb,
    pub obstacles: Vec<ObstacleView>,
    pub score: u32,
    pub run_state: RunState,
    /// Steps simulated in this run
    pub frame: u64,
}

impl Snapshot {
    /// Build the view of `course`, dropping passed gates and anything
    /// horizontally outside the field
    pub fn capture(
        field: Field,
        entity: Aabb,
        course: &[Obstacle],
        score: u32,
        run_state: RunState,
        frame: u64,
    ) -> Self {
        let obstacles = course
            .iter()
            .filter_map(|obstacle| match obstacle {
                Obstacle::Gate(gate) => {
                    let visible = gate.trailing_edge() >= 0.0 && gate.x <= field.width;
                    (visible && !gate.passed).then(|| ObstacleView::Gate {
                        top: gate.top_rect(),
                        bottom: gate.bottom_rect(field.height),
                    })
                }
                Obstacle::Finish { x } => {
                    (*x >= 0.0 && *x <= field.width).then_some(ObstacleView::Finish { x: *x })
                }
            })
            .collect();

        Self {
            field,
            entity,
            obstacles,
            score,
            run_state,
            frame,
        }
    }

    /// On-screen x of the finish marker, if it is visible this frame
    pub fn finish_x(&self) -> Option<f64> {
        self.obstacles.iter().find_map(|view| match view {
            ObstacleView::Finish { x } => Some(*x),
            ObstacleView::Gate { .. } => None,
        })
    }
}

/// Outcome of a single step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub snapshot: Snapshot,
    pub run_state: RunState,
    pub score: u32,
    /// Notifications raised during this step, in order
    pub events: Vec<GameEvent>,
}

impl StepResult {
    pub fn won(&self) -> bool {
        self.events.contains(&GameEvent::Won)
    }

    pub fn lost(&self) -> bool {
        self.events.contains(&GameEvent::Lost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::Gate;
    use glam::DVec2;

    #[test]
    fn test_capture_culls_offscreen_and_passed() {
        let field = Field::new(480.0, 600.0);
        let mut passed = Gate::new(0.0, 50.0, 100.0, 180.0, 600.0);
        passed.passed = true;
        let course = vec![
            Obstacle::Gate(passed),
            Obstacle::Gate(Gate::new(200.0, 50.0, 100.0, 180.0, 600.0)),
            Obstacle::Gate(Gate::new(900.0, 50.0, 100.0, 180.0, 600.0)),
            Obstacle::Finish { x: 1200.0 },
        ];
        let entity = Aabb::from_center(DVec2::new(60.0, 300.0), DVec2::splat(34.0));

        let snap = Snapshot::capture(field, entity, &course, 1, RunState::Running, 10);
        assert_eq!(snap.obstacles.len(), 1);
        let ObstacleView::Gate { top, bottom } = snap.obstacles[0] else {
            panic!("expected gate view");
        };
        assert_eq!(top.min, DVec2::new(200.0, 0.0));
        assert_eq!(top.max, DVec2::new(250.0, 100.0));
        assert_eq!(bottom.min, DVec2::new(200.0, 280.0));
        assert_eq!(bottom.max, DVec2::new(250.0, 600.0));
        assert_eq!(snap.score, 1);
        assert_eq!(snap.frame, 10);
    }

    #[test]
    fn test_capture_includes_visible_finish() {
        let field = Field::new(480.0, 600.0);
        let course = vec![Obstacle::Finish { x: 300.0 }];
        let entity = Aabb::from_center(DVec2::new(60.0, 300.0), DVec2::splat(34.0));
        let snap = Snapshot::capture(field, entity, &course, 0, RunState::Running, 0);
        assert_eq!(snap.obstacles, vec![ObstacleView::Finish { x: 300.0 }]);
        assert_eq!(snap.finish_x(), Some(300.0));

        let offscreen = vec![Obstacle::Finish { x: 480.5 }];
        let snap = Snapshot::capture(field, entity, &offscreen, 0, RunState::Running, 0);
        assert_eq!(snap.finish_x(), None);
    }
}
