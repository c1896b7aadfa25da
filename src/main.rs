//! Gate Dash entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlCanvasElement, HtmlElement, KeyboardEvent, MouseEvent, TouchEvent};

    use gate_dash::Settings;
    use gate_dash::audio::{AudioManager, SoundEffect};
    use gate_dash::renderer::RenderState;
    use gate_dash::sim::{Engine, Field, GameEvent, InputProfile, RunId, RunState, Snapshot};

    const WIN_TEXT: &str = "Abe Tu Jeet Kise Gya";
    const LOSE_TEXT: &str = "You lost my friend, Try Again";
    const WIN_IMAGE: &str = "assets/win.svg";
    const LOSE_IMAGE: &str = "assets/lose.svg";
    /// The finish label is centered over the bar, offset left of its x
    const FINISH_LABEL_OFFSET: f64 = 25.0;

    /// Game instance holding all state
    struct Game {
        engine: Engine,
        field: Field,
        profile: InputProfile,
        render_state: Option<RenderState>,
        audio: AudioManager,
        /// Run whose notifications this host still acts on
        run: RunId,
        /// Last drawable state, repainted every frame
        snapshot: Snapshot,
    }

    impl Game {
        fn new(field: Field, profile: InputProfile, settings: &Settings) -> Self {
            let engine = Engine::new(field);
            let snapshot = engine.snapshot();
            Self {
                engine,
                field,
                profile,
                render_state: None,
                audio: AudioManager::new(settings),
                run: RunId::default(),
                snapshot,
            }
        }

        /// Start (or restart) a run
        fn start(&mut self, seed: u64) {
            self.audio.stop_all();
            set_hidden("popup", true);

            self.run = self.engine.initialize_seeded(self.field, self.profile, seed);
            self.snapshot = self.engine.snapshot();
            self.audio.start_music();

            log::info!(
                "Run {} started with seed {} ({:?} input)",
                self.run.0,
                seed,
                self.engine.profile()
            );
        }

        /// Input events land here, before the next frame's step
        fn impulse(&mut self) {
            if self.engine.run_state() != RunState::Running {
                return;
            }
            self.engine.impulse();
            self.audio.play(SoundEffect::Impulse);
        }

        /// Advance one step and react to its notifications
        fn update(&mut self) {
            let result = self.engine.step();
            if self.engine.run_id() != self.run {
                log::debug!("Dropping notifications from stale run {}", self.engine.run_id().0);
                self.snapshot = result.snapshot;
                return;
            }
            for event in &result.events {
                match event {
                    GameEvent::Won => self.finish(true),
                    GameEvent::Lost => self.finish(false),
                    GameEvent::GatePassed { .. } => {}
                }
            }
            self.snapshot = result.snapshot;
            self.audio.update();
        }

        fn finish(&mut self, won: bool) {
            self.audio.stop_all();
            if won {
                self.audio.play(SoundEffect::Win);
            } else {
                self.audio.play(SoundEffect::Lose);
            }
            show_popup(won);
        }

        /// Render the current frame
        fn render(&mut self) {
            if let Some(ref mut render_state) = self.render_state {
                match render_state.render(&self.snapshot) {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => {
                        render_state.resize(render_state.size.0, render_state.size.1);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory!");
                    }
                    Err(e) => log::warn!("Render error: {:?}", e),
                }
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&self) {
            let Some(document) = document() else { return };
            if let Some(el) = document.query_selector("#hud-score .hud-value").ok().flatten() {
                el.set_text_content(Some(&self.snapshot.score.to_string()));
            }

            let Some(label) = document
                .get_element_by_id("finish-label")
                .and_then(|el| el.dyn_into::<HtmlElement>().ok())
            else {
                return;
            };
            match self.snapshot.finish_x() {
                Some(x) => {
                    let left = (x - FINISH_LABEL_OFFSET) / self.snapshot.field.width * 100.0;
                    let _ = label.style().set_property("left", &format!("{left}%"));
                    set_hidden("finish-label", false);
                }
                None => set_hidden("finish-label", true),
            }
        }
    }

    fn document() -> Option<Document> {
        web_sys::window()?.document()
    }

    fn set_hidden(id: &str, hidden: bool) {
        let Some(el) = document().and_then(|d| d.get_element_by_id(id)) else {
            return;
        };
        let classes = el.class_list();
        let _ = if hidden {
            classes.add_1("hidden")
        } else {
            classes.remove_1("hidden")
        };
    }

    fn show_popup(won: bool) {
        let Some(document) = document() else { return };
        if let Some(el) = document.get_element_by_id("popup-text") {
            el.set_text_content(Some(if won { WIN_TEXT } else { LOSE_TEXT }));
        }
        if let Some(el) = document.get_element_by_id("popup") {
            let _ = el.set_attribute("data-outcome", if won { "won" } else { "lost" });
        }
        if let Some(el) = document.get_element_by_id("popup-image") {
            let _ = el.set_attribute("src", if won { WIN_IMAGE } else { LOSE_IMAGE });
            let _ = el.set_attribute("alt", if won { "You win" } else { "You lose" });
        }
        set_hidden("popup", false);
    }

    fn new_seed() -> u64 {
        js_sys::Date::now() as u64
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::error_1(&format!("Failed to init logger: {e}").into());
        }

        log::info!("Gate Dash starting...");

        let Some(window) = web_sys::window() else {
            log::error!("No window");
            return;
        };
        let Some(document) = window.document() else {
            log::error!("No document");
            return;
        };

        let settings = Settings::load();
        let user_agent = window.navigator().user_agent().unwrap_or_default();
        let profile = settings.profile_for(&user_agent);
        log::info!("Input profile: {:?}", profile);

        let Some(canvas) = document
            .get_element_by_id("canvas")
            .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
        else {
            log::error!("No canvas element");
            return;
        };

        // Backing store matches the field, scaled for the display
        let field = Field::default();
        let dpr = window.device_pixel_ratio();
        let width = (field.width * dpr) as u32;
        let height = (field.height * dpr) as u32;
        canvas.set_width(width);
        canvas.set_height(height);

        let game = Rc::new(RefCell::new(Game::new(field, profile, &settings)));

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = match instance.create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone())) {
            Ok(surface) => surface,
            Err(e) => {
                log::error!("Failed to create surface: {}", e);
                return;
            }
        };

        let adapter = match instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
        {
            Ok(adapter) => adapter,
            Err(e) => {
                log::error!("Failed to get adapter: {}", e);
                return;
            }
        };

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        match RenderState::new(surface, &adapter, width, height).await {
            Ok(render_state) => game.borrow_mut().render_state = Some(render_state),
            Err(e) => {
                log::error!("Failed to create device: {}", e);
                return;
            }
        }

        setup_input_handlers(&canvas, game.clone());
        setup_buttons(game.clone());

        request_animation_frame(game);

        log::info!("Gate Dash ready");
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        // Any key
        {
            let game = game.clone();
            // Held keys auto-repeat and keep impulsing
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: KeyboardEvent| {
                game.borrow_mut().impulse();
            });
            if let Some(document) = document() {
                let _ = document
                    .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            }
            closure.forget();
        }

        // Touch (suppresses the emulated mousedown that follows)
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                game.borrow_mut().impulse();
            });
            let _ = canvas
                .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Mouse
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                game.borrow_mut().impulse();
            });
            let _ = canvas
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_buttons(game: Rc<RefCell<Game>>) {
        let Some(document) = document() else { return };

        if let Some(btn) = document.get_element_by_id("start-btn") {
            let game = game.clone();
            let btn_clone = btn.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                if let Some(el) = btn_clone.dyn_ref::<HtmlElement>() {
                    let _ = el.style().set_property("display", "none");
                }
                game.borrow_mut().start(new_seed());
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        if let Some(btn) = document.get_element_by_id("restart-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                game.borrow_mut().start(new_seed());
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::once(move |_time: f64| {
            game_loop(game);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    /// One simulation step per display frame
    fn game_loop(game: Rc<RefCell<Game>>) {
        {
            let mut g = game.borrow_mut();
            g.update();
            g.render();
            g.update_hud();
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use gate_dash::sim::{Autopilot, Engine, Field, InputProfile, RunState};

    env_logger::init();
    log::info!("Gate Dash (native) starting...");
    log::info!("Native mode runs a headless autopilot demo - run with `trunk serve` for the web version");

    // Usage: gate-dash [seed] [compact|standard] [margin-ratio]
    let mut args = std::env::args().skip(1);
    let seed = match args.next().map(|s| s.parse::<u64>()) {
        Some(Ok(seed)) => seed,
        Some(Err(e)) => {
            log::warn!("Ignoring invalid seed: {}", e);
            2024
        }
        None => 2024,
    };
    let profile = match args.next().as_deref() {
        Some("standard") => InputProfile::Standard,
        _ => InputProfile::Compact,
    };
    let pilot = match args.next().map(|s| s.parse::<f64>()) {
        Some(Ok(ratio)) => Autopilot::new(ratio),
        Some(Err(e)) => {
            log::warn!("Ignoring invalid margin ratio: {}", e);
            Autopilot::default()
        }
        None => Autopilot::default(),
    };

    let field = Field::default();
    let mut engine = Engine::new(field);
    let run = engine.initialize_seeded(field, profile, seed);

    let mut result = engine.step();
    while result.run_state == RunState::Running {
        if pilot.should_impulse(&engine) {
            engine.impulse();
        }
        result = engine.step();
    }

    let summary = serde_json::json!({
        "run": run.0,
        "seed": seed,
        "profile": engine.profile(),
        "outcome": result.run_state,
        "score": result.score,
        "frames": result.snapshot.frame,
        "entity": result.snapshot.entity,
    });
    match serde_json::to_string_pretty(&summary) {
        Ok(json) => println!("{json}"),
        Err(e) => log::error!("Failed to encode summary: {}", e),
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
