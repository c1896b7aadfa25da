//! Fixed-step simulation engine
//!
//! The host calls [`Engine::step`] once per display frame and
//! [`Engine::impulse`] from input events. Nothing else mutates run state.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::collision::{box_hits_gate, box_out_of_field};
use super::course::generate_course;
use super::snapshot::{Snapshot, StepResult};
use super::state::{Entity, Field, GameEvent, InputProfile, Obstacle, RunId, RunState};
use crate::consts::SCROLL_SPEED;

/// Owns the entity, course, score and run state of the current run
#[derive(Debug, Clone)]
pub struct Engine {
    field: Field,
    profile: InputProfile,
    entity: Entity,
    course: Vec<Obstacle>,
    score: u32,
    run_state: RunState,
    /// Steps simulated in this run
    frame: u64,
    run_id: RunId,
    /// Seed of the current course, when seeded through `initialize_seeded`
    seed: Option<u64>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Field::default())
    }
}

impl Engine {
    /// Engine waiting for its first run
    pub fn new(field: Field) -> Self {
        let profile = InputProfile::default();
        Self {
            field,
            profile,
            entity: Entity::new(&field, profile),
            course: Vec::new(),
            score: 0,
            run_state: RunState::NotStarted,
            frame: 0,
            run_id: RunId::default(),
            seed: None,
        }
    }

    /// Start a fresh run, discarding everything from the previous one
    pub fn initialize<R: Rng + ?Sized>(
        &mut self,
        field: Field,
        profile: InputProfile,
        rng: &mut R,
    ) -> RunId {
        self.field = field;
        self.profile = profile;
        self.entity = Entity::new(&field, profile);
        self.course = generate_course(&field, rng);
        self.score = 0;
        self.frame = 0;
        self.seed = None;
        self.run_state = RunState::Running;
        self.run_id = RunId(self.run_id.0.wrapping_add(1));

        log::info!(
            "Run {} started ({:?} input, field {}x{})",
            self.run_id.0,
            profile,
            field.width,
            field.height
        );

        self.run_id
    }

    /// Start a fresh run with a course generated from `seed`
    pub fn initialize_seeded(&mut self, field: Field, profile: InputProfile, seed: u64) -> RunId {
        let mut rng = Pcg32::seed_from_u64(seed);
        let run_id = self.initialize(field, profile, &mut rng);
        self.seed = Some(seed);
        run_id
    }

    /// Overwrite the entity's velocity with the impulse velocity
    ///
    /// Ignored unless a run is in progress.
    pub fn impulse(&mut self) {
        if self.run_state == RunState::Running {
            self.entity.apply_impulse();
        }
    }

    /// Advance the run by one fixed step
    pub fn step(&mut self) -> StepResult {
        if self.run_state != RunState::Running {
            return self.result(Vec::new());
        }

        let mut events = Vec::new();
        self.frame += 1;

        self.entity.integrate();

        for obstacle in &mut self.course {
            obstacle.advance(SCROLL_SPEED);
        }

        let entity_x = self.entity.pos.x;
        for (index, obstacle) in self.course.iter_mut().enumerate() {
            if let Obstacle::Gate(gate) = obstacle {
                if !gate.passed && gate.trailing_edge() < entity_x {
                    gate.passed = true;
                    self.score += 1;
                    events.push(GameEvent::GatePassed { index });
                    log::debug!("Gate {} cleared, score {}", index, self.score);
                }
            }
        }

        if self.finish_x().is_some_and(|x| x < entity_x) {
            self.run_state = RunState::Won;
            events.push(GameEvent::Won);
            log::info!("Run {} won with score {}", self.run_id.0, self.score);
        }

        if self.run_state != RunState::Won {
            let bounds = self.entity.bounds();
            let height = self.field.height;

            // `any` stops at the first gate hit
            if self
                .course
                .iter()
                .filter_map(Obstacle::as_gate)
                .any(|gate| box_hits_gate(&bounds, gate, height))
            {
                self.lose(&mut events);
            }

            if box_out_of_field(&bounds, height) {
                self.lose(&mut events);
            }
        }

        self.result(events)
    }

    fn lose(&mut self, events: &mut Vec<GameEvent>) {
        if self.run_state == RunState::Lost {
            return;
        }
        self.run_state = RunState::Lost;
        events.push(GameEvent::Lost);
        log::info!(
            "Run {} lost at frame {} with score {}",
            self.run_id.0,
            self.frame,
            self.score
        );
    }

    fn result(&self, events: Vec<GameEvent>) -> StepResult {
        StepResult {
            snapshot: self.snapshot(),
            run_state: self.run_state,
            score: self.score,
            events,
        }
    }

    /// Drawable view of the current state
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(
            self.field,
            self.entity.bounds(),
            &self.course,
            self.score,
            self.run_state,
            self.frame,
        )
    }

    fn finish_x(&self) -> Option<f64> {
        self.course.iter().rev().find_map(|obstacle| match obstacle {
            Obstacle::Finish { x } => Some(*x),
            Obstacle::Gate(_) => None,
        })
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn entity(&self) -> &Entity {
        &self.entity
    }

    pub fn course(&self) -> &[Obstacle] {
        &self.course
    }

    pub fn field(&self) -> Field {
        self.field
    }

    pub fn profile(&self) -> InputProfile {
        self.profile
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::sim::autopilot::Autopilot;
    use crate::sim::state::Gate;
    use glam::DVec2;
    use proptest::prelude::*;

    const FIELD: Field = Field::new(480.0, 600.0);

    fn running(seed: u64, profile: InputProfile) -> Engine {
        let mut engine = Engine::new(FIELD);
        engine.initialize_seeded(FIELD, profile, seed);
        engine
    }

    /// Run the autopilot until the run ends or `max_steps` elapse
    fn play(engine: &mut Engine, max_steps: usize) -> Vec<StepResult> {
        let pilot = Autopilot::default();
        let mut results = Vec::new();
        for _ in 0..max_steps {
            if pilot.should_impulse(engine) {
                engine.impulse();
            }
            let result = engine.step();
            let done = result.run_state.is_terminal();
            results.push(result);
            if done {
                break;
            }
        }
        results
    }

    #[test]
    fn test_impulse_before_initialize_is_noop() {
        let mut engine = Engine::new(FIELD);
        let before = *engine.entity();
        engine.impulse();
        assert_eq!(engine.run_state(), RunState::NotStarted);
        assert_eq!(*engine.entity(), before);
        assert_eq!(engine.score(), 0);
    }

    #[test]
    fn test_step_before_initialize_is_noop() {
        let mut engine = Engine::new(FIELD);
        let before = engine.snapshot();
        let result = engine.step();
        assert_eq!(result.run_state, RunState::NotStarted);
        assert!(result.events.is_empty());
        assert_eq!(result.snapshot, before);
        assert_eq!(engine.frame(), 0);
    }

    #[test]
    fn test_initialize_resets_run() {
        let mut engine = Engine::new(FIELD);
        let run = engine.initialize_seeded(FIELD, InputProfile::Standard, 5);
        assert_eq!(run, RunId(1));
        assert_eq!(engine.run_state(), RunState::Running);
        assert_eq!(engine.score(), 0);
        assert_eq!(engine.entity().pos, DVec2::new(ENTITY_X, 300.0));
        assert_eq!(engine.entity().velocity, 0.0);
        assert_eq!(engine.course().len(), GATE_COUNT + 1);
        assert_eq!(engine.seed(), Some(5));
    }

    #[test]
    fn test_gravity_integration() {
        let mut engine = running(1, InputProfile::Standard);
        engine.step();
        let y1 = 300.0 + GRAVITY;
        assert_eq!(engine.entity().velocity, GRAVITY);
        assert_eq!(engine.entity().pos.y, y1);
        engine.step();
        assert_eq!(engine.entity().velocity, 2.0 * GRAVITY);
        assert_eq!(engine.entity().pos.y, y1 + 2.0 * GRAVITY);
    }

    #[test]
    fn test_impulse_then_step() {
        let mut engine = running(1, InputProfile::Compact);
        for _ in 0..10 {
            engine.step();
        }
        engine.impulse();
        engine.impulse();
        let y = engine.entity().pos.y;
        engine.step();
        let expected = IMPULSE_COMPACT + GRAVITY;
        assert_eq!(engine.entity().velocity, expected);
        assert_eq!(engine.entity().pos.y, y + expected);
    }

    #[test]
    fn test_course_scrolls() {
        let mut engine = running(3, InputProfile::Standard);
        engine.step();
        assert_eq!(engine.course()[0].x(), FIRST_GATE_X - SCROLL_SPEED);
        assert_eq!(engine.frame(), 1);
    }

    #[test]
    fn test_falling_without_impulse_loses() {
        let mut engine = running(11, InputProfile::Standard);
        let mut lost_events = 0;
        let mut steps = 0;
        while engine.run_state() == RunState::Running && steps < 100 {
            let result = engine.step();
            lost_events += result.events.iter().filter(|e| **e == GameEvent::Lost).count();
            steps += 1;
        }
        assert_eq!(engine.run_state(), RunState::Lost);
        assert_eq!(lost_events, 1);
        assert_eq!(engine.score(), 0);
        assert!(engine.entity().bounds().max.y > FIELD.height);
        // Gate 0 never reaches the entity before the fall ends
        assert!(steps < 60);
    }

    #[test]
    fn test_terminal_state_is_sticky() {
        let mut engine = running(11, InputProfile::Standard);
        while engine.run_state() == RunState::Running {
            engine.step();
        }
        let frozen = engine.snapshot();
        let entity = *engine.entity();
        for _ in 0..20 {
            engine.impulse();
            let result = engine.step();
            assert_eq!(result.run_state, RunState::Lost);
            assert!(result.events.is_empty());
            assert_eq!(result.snapshot, frozen);
        }
        assert_eq!(*engine.entity(), entity);
    }

    #[test]
    fn test_autopilot_wins_full_course() {
        for seed in [1, 2, 3, 42, 2024] {
            let mut engine = running(seed, InputProfile::Compact);
            let results = play(&mut engine, 6000);
            let last = results.last().expect("at least one step");
            assert_eq!(last.run_state, RunState::Won, "seed {seed}");
            assert_eq!(last.score, GATE_COUNT as u32);
            assert!(last.won());
            assert!(!last.lost());

            let passed: Vec<usize> = results
                .iter()
                .flat_map(|r| r.events.iter())
                .filter_map(|e| match e {
                    GameEvent::GatePassed { index } => Some(*index),
                    _ => None,
                })
                .collect();
            assert_eq!(passed, (0..GATE_COUNT).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_gate_pass_frames_match_f64_reference() {
        let mut engine = running(2024, InputProfile::Compact);
        let mut reference: Vec<f64> = engine.course().iter().map(Obstacle::x).collect();
        let mut expected = vec![None; GATE_COUNT];
        let mut actual = vec![None; GATE_COUNT];

        let pilot = Autopilot::default();
        while engine.run_state() == RunState::Running {
            if pilot.should_impulse(&engine) {
                engine.impulse();
            }
            let result = engine.step();
            for x in &mut reference {
                *x -= SCROLL_SPEED;
            }
            for (index, x) in reference[..GATE_COUNT].iter().enumerate() {
                if expected[index].is_none() && x + GATE_WIDTH < ENTITY_X {
                    expected[index] = Some(engine.frame());
                }
            }
            for event in &result.events {
                if let GameEvent::GatePassed { index } = event {
                    actual[*index] = Some(engine.frame());
                }
            }
        }

        assert_eq!(engine.run_state(), RunState::Won);
        assert_eq!(actual, expected);
        let tail: Vec<Option<u64>> = actual[20..].to_vec();
        assert_eq!(
            tail,
            vec![Some(4076), Some(4251), Some(4424), Some(4596), Some(4766)]
        );

        let finish = engine.course()[GATE_COUNT].x();
        assert_eq!(finish, reference[GATE_COUNT]);
        assert!((finish - 59.6).abs() < 1e-6);
    }

    #[test]
    fn test_restart_after_loss() {
        let mut engine = running(8, InputProfile::Standard);
        let first_course = engine.course().to_vec();
        while engine.run_state() == RunState::Running {
            engine.step();
        }
        assert_eq!(engine.run_state(), RunState::Lost);

        let run = engine.initialize_seeded(FIELD, InputProfile::Standard, 9);
        assert_eq!(run, RunId(2));
        assert_eq!(engine.run_state(), RunState::Running);
        assert_eq!(engine.score(), 0);
        assert_eq!(engine.frame(), 0);
        assert_eq!(engine.entity().pos, DVec2::new(ENTITY_X, FIELD.height / 2.0));
        assert_eq!(engine.entity().velocity, 0.0);
        assert_ne!(engine.course(), first_course.as_slice());
        assert_eq!(engine.course()[0].x(), FIRST_GATE_X);
    }

    #[test]
    fn test_gate_scored_once() {
        let mut engine = running(1, InputProfile::Standard);
        // Entity sits in the middle of a wide gap while the gate slides past
        engine.course = vec![
            Obstacle::Gate(Gate::new(10.5, GATE_WIDTH, 100.0, 400.0, FIELD.height)),
            Obstacle::Finish { x: 5000.0 },
        ];
        let mut gained = 0;
        for _ in 0..5 {
            engine.impulse();
            engine.entity.pos.y = 300.0;
            let result = engine.step();
            gained += result
                .events
                .iter()
                .filter(|e| matches!(e, GameEvent::GatePassed { index: 0 }))
                .count();
            assert_eq!(result.run_state, RunState::Running);
        }
        assert_eq!(gained, 1);
        assert_eq!(engine.score(), 1);
    }

    #[test]
    fn test_win_skips_collision() {
        let mut engine = running(1, InputProfile::Standard);
        engine.course = vec![Obstacle::Finish { x: ENTITY_X + 0.5 }];
        // About to leave the bottom of the field in the same step
        engine.entity.pos.y = FIELD.height - ENTITY_HEIGHT / 2.0 + 5.0;
        let result = engine.step();
        assert_eq!(result.run_state, RunState::Won);
        assert_eq!(result.events, vec![GameEvent::Won]);
    }

    #[test]
    fn test_gate_and_wall_hit_emit_single_loss() {
        let mut engine = running(1, InputProfile::Standard);
        engine.course = vec![
            Obstacle::Gate(Gate::new(40.0, GATE_WIDTH, 100.0, 180.0, FIELD.height)),
            Obstacle::Finish { x: 5000.0 },
        ];
        engine.entity.pos.y = 5.0;
        let result = engine.step();
        assert_eq!(result.run_state, RunState::Lost);
        assert_eq!(result.events, vec![GameEvent::Lost]);
    }

    #[test]
    fn test_gate_collision_loses() {
        let mut engine = running(1, InputProfile::Standard);
        engine.course = vec![
            Obstacle::Gate(Gate::new(40.0, GATE_WIDTH, 100.0, 180.0, FIELD.height)),
            Obstacle::Finish { x: 5000.0 },
        ];
        engine.entity.pos.y = 105.0;
        let result = engine.step();
        assert_eq!(result.run_state, RunState::Lost);
        assert!(result.lost());
    }

    proptest! {
        #[test]
        fn prop_step_invariants(seed in any::<u64>(), taps in prop::collection::vec(any::<bool>(), 1..800)) {
            let mut engine = running(seed, InputProfile::Standard);
            let mut last_score = 0;
            let mut terminal: Option<RunState> = None;

            for tap in taps {
                let was_running = engine.run_state() == RunState::Running;
                let v_before = engine.entity().velocity;
                if tap {
                    engine.impulse();
                }
                let result = engine.step();

                if was_running {
                    let base = if tap { engine.entity().impulse } else { v_before };
                    prop_assert_eq!(engine.entity().velocity, base + GRAVITY);
                }

                prop_assert!(result.score >= last_score);
                prop_assert!(result.score - last_score <= 1);
                last_score = result.score;

                if let Some(state) = terminal {
                    prop_assert_eq!(result.run_state, state);
                    prop_assert!(result.events.is_empty());
                } else if result.run_state.is_terminal() {
                    terminal = Some(result.run_state);
                }
            }
        }

        #[test]
        fn prop_seeded_runs_are_deterministic(seed in any::<u64>(), taps in prop::collection::vec(any::<bool>(), 1..300)) {
            let mut a = running(seed, InputProfile::Compact);
            let mut b = running(seed, InputProfile::Compact);
            for tap in taps {
                if tap {
                    a.impulse();
                    b.impulse();
                }
                prop_assert_eq!(a.step(), b.step());
            }
        }
    }
}
