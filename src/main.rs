//! Parkour Rush entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlCanvasElement, KeyboardEvent, TouchEvent};

    use parkour_rush::consts::*;
    use parkour_rush::persistence::KeyValueStore;
    use parkour_rush::platform::{self, Intent, TouchTracker, apply_intent, key_intent, take_input};
    use parkour_rush::renderer::CanvasRenderer;
    use parkour_rush::sim::{GameEvent, GamePhase, GameState, TickInput, tick};
    use parkour_rush::{Records, Settings, Tuning};

    /// Game instance holding all state
    struct Game {
        state: GameState,
        renderer: CanvasRenderer,
        store: Box<dyn KeyValueStore>,
        records: Records,
        settings: Settings,
        last_time: f64,
        input: TickInput,
        touch: TouchTracker,
        // FPS tracking
        frame_times: [f64; 60],
        frame_index: usize,
        fps: u32,
        last_phase: GamePhase,
    }

    impl Game {
        /// Run one simulation frame and route its events
        fn update(&mut self, raw_dt: f32, time: f64) {
            let input = take_input(&mut self.input);
            tick(&mut self.state, &input, raw_dt);

            let mut dirty = false;
            let events: Vec<GameEvent> = self.state.drain_events().collect();
            for event in &events {
                dirty |= self.records.handle_event(event);
                if let GameEvent::DamageTaken { .. } = event {
                    if self.settings.effective_screen_shake() {
                        self.renderer.add_shake(10.0);
                    }
                }
            }
            if dirty {
                if let Err(e) = self.records.save(self.store.as_mut()) {
                    log::warn!("Could not save records: {}", e);
                }
            }

            // Track frame times for FPS
            self.frame_times[self.frame_index] = time;
            self.frame_index = (self.frame_index + 1) % 60;
            let oldest_time = self.frame_times[self.frame_index];
            if oldest_time > 0.0 {
                let elapsed = time - oldest_time;
                if elapsed > 0.0 {
                    self.fps = (60000.0 / elapsed).round() as u32;
                }
            }
        }

        fn render(&mut self) {
            let fps = self.settings.show_fps.then_some(self.fps);
            let snapshot = self.state.snapshot();
            if let Err(e) = self.renderer.render(&snapshot, fps) {
                log::warn!("Render error: {:?}", e);
            }
        }

        /// Show the overlay for the current phase
        fn update_overlays(&mut self) {
            let phase = self.state.phase;
            if phase == self.last_phase {
                return;
            }
            self.last_phase = phase;
            let Some(document) = document() else {
                return;
            };

            set_visible(&document, "loading", phase == GamePhase::Loading);
            set_visible(&document, "main-menu", phase == GamePhase::Menu);
            set_visible(&document, "pause-menu", phase == GamePhase::Paused);
            set_visible(&document, "game-over", phase == GamePhase::GameOver);

            if phase == GamePhase::Menu {
                set_text(&document, "menu-best", &self.records.best_score.to_string());
                set_text(&document, "menu-currency", &self.records.currency.to_string());
            }
            if phase == GamePhase::GameOver {
                let snap = self.state.snapshot();
                set_text(&document, "final-score", &snap.score.to_string());
                set_text(&document, "final-distance", &format!("{} m", snap.distance_m));
                set_text(&document, "final-coins", &snap.coins.to_string());
                set_text(&document, "final-best", &self.records.best_score.to_string());
            }
        }

        /// Adopt the canvas' current CSS size
        fn resize(&mut self, canvas: &HtmlCanvasElement) {
            let dpr = web_sys::window()
                .map(|w| w.device_pixel_ratio())
                .unwrap_or(1.0) as f32;
            let width = canvas.client_width() as f32;
            let height = canvas.client_height() as f32;
            self.state.resize(width, height, dpr);
            let vp = self.state.viewport;
            if let Err(e) = self.renderer.resize(vp.width, vp.height, vp.pixel_ratio) {
                log::warn!("Canvas resize failed: {:?}", e);
            }
        }

        fn intent(&mut self, intent: Intent) {
            // Any jump on the title or game-over screen acts as start
            let intent = match (intent, self.state.phase) {
                (Intent::JumpPressed, GamePhase::Menu | GamePhase::GameOver) => Intent::Start,
                _ => intent,
            };
            apply_intent(&mut self.input, intent);
        }
    }

    fn document() -> Option<Document> {
        web_sys::window()?.document()
    }

    fn set_visible(document: &Document, id: &str, visible: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.set_attribute("class", if visible { "" } else { "hidden" });
        }
    }

    fn set_text(document: &Document, id: &str, text: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    /// Optional `<script id="tuning" type="application/json">` override
    fn load_tuning(document: &Document) -> Tuning {
        match document
            .get_element_by_id("tuning")
            .and_then(|el| el.text_content())
        {
            Some(json) if !json.trim().is_empty() => Tuning::from_json_or_default(&json),
            _ => Tuning::default(),
        }
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialised".into());
        }

        log::info!("Parkour Rush starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;
        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or("no canvas element")?
            .dyn_into()
            .map_err(|_| "#canvas is not a canvas")?;

        let store = platform::open_store();
        let records = Records::load(store.as_ref());
        let settings = Settings::load(store.as_ref());
        let tuning = load_tuning(&document);

        let seed = js_sys::Date::now() as u64;
        let mut state = GameState::with_tuning(seed, tuning);
        state.set_particle_capacity(settings.max_particles());

        let mut renderer = CanvasRenderer::new(canvas.clone())?;
        renderer.set_parallax(settings.quality.parallax_enabled());

        let game = Rc::new(RefCell::new(Game {
            state,
            renderer,
            store,
            records,
            settings,
            last_time: 0.0,
            input: TickInput::default(),
            touch: TouchTracker::default(),
            frame_times: [0.0; 60],
            frame_index: 0,
            fps: 0,
            last_phase: GamePhase::Loading,
        }));
        log::info!("Game initialized with seed: {}", seed);

        {
            let mut g = game.borrow_mut();
            g.resize(&canvas);
            g.state.finish_loading();
        }

        setup_input_handlers(&canvas, game.clone())?;
        setup_resize(&canvas, game.clone())?;
        setup_auto_pause(game.clone())?;

        request_animation_frame(game);
        log::info!("Parkour Rush running!");
        Ok(())
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or("no window")?;

        // Keyboard down
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let code = event.code();
                if platform::input::is_game_key(&code) {
                    event.prevent_default();
                }
                if event.repeat() {
                    return;
                }
                let mut g = game.borrow_mut();
                if code == "KeyI" {
                    g.input.idle_mode = !g.input.idle_mode;
                    log::info!("Idle mode: {}", g.input.idle_mode);
                    return;
                }
                if let Some(intent) = key_intent(&code, true) {
                    g.intent(intent);
                }
            });
            window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        // Keyboard up
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if let Some(intent) = key_intent(&event.code(), false) {
                    game.borrow_mut().intent(intent);
                }
            });
            window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        // Touch start: upper half jumps, lower half slides
        {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                if let Some(touch) = event.touches().get(0) {
                    let rect = canvas_clone.get_bounding_client_rect();
                    let y = touch.client_y() as f32 - rect.top() as f32;
                    let height = canvas_clone.client_height() as f32;
                    let mut g = game.borrow_mut();
                    let intent = g.touch.touch_start(y, height, js_sys::Date::now());
                    g.intent(intent);
                }
            });
            canvas.add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        // Touch move: vertical swipes
        {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                if let Some(touch) = event.touches().get(0) {
                    let rect = canvas_clone.get_bounding_client_rect();
                    let y = touch.client_y() as f32 - rect.top() as f32;
                    let mut g = game.borrow_mut();
                    if let Some(intent) = g.touch.touch_move(y, js_sys::Date::now()) {
                        g.intent(intent);
                    }
                }
            });
            canvas.add_event_listener_with_callback("touchmove", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        // Touch end
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                let mut g = game.borrow_mut();
                let intent = g.touch.touch_end();
                g.intent(intent);
            });
            canvas.add_event_listener_with_callback("touchend", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }
        Ok(())
    }

    fn setup_resize(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or("no window")?;
        let canvas = canvas.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            game.borrow_mut().resize(&canvas);
        });
        window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())?;
        closure.forget();
        Ok(())
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();

            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                NOMINAL_FRAME_DT
            };
            g.last_time = time;

            g.update(dt, time);
            g.render();
            g.update_overlays();
        }

        request_animation_frame(game);
    }

    fn setup_auto_pause(game: Rc<RefCell<Game>>) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        // Visibility change (tab switch, minimize)
        {
            let game = game.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    let mut g = game.borrow_mut();
                    if g.state.phase == GamePhase::Playing {
                        g.state.pause();
                        log::info!("Auto-paused (tab hidden)");
                    }
                }
                // Returning to the tab must not count the hidden time as a frame
                game.borrow_mut().last_time = 0.0;
            });
            document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            )?;
            closure.forget();
        }

        // Window blur (click outside)
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                let mut g = game.borrow_mut();
                if g.state.phase == GamePhase::Playing {
                    g.state.pause();
                    log::info!("Auto-paused (window blur)");
                }
            });
            window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    wasm_game::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Headless demo length (seconds of simulated time at 60 Hz)
#[cfg(not(target_arch = "wasm32"))]
const DEMO_SECONDS: u32 = 120;

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use parkour_rush::consts::NOMINAL_FRAME_DT;
    use parkour_rush::platform::open_store;
    use parkour_rush::sim::{GameEvent, GamePhase, GameState, TickInput, tick};
    use parkour_rush::{Records, Tuning};

    env_logger::init();
    log::info!("Parkour Rush (native) starting headless demo...");

    let tuning = match std::env::args().nth(1) {
        Some(path) => match std::fs::read_to_string(&path) {
            Ok(json) => Tuning::from_json_or_default(&json),
            Err(e) => {
                log::warn!("Could not read {}: {}", path, e);
                Tuning::default()
            }
        },
        None => Tuning::default(),
    };

    let mut store = open_store();
    let mut records = Records::load(store.as_ref());

    let mut state = GameState::with_tuning(42, tuning);
    state.finish_loading();
    state.start_run();

    let input = TickInput {
        idle_mode: true,
        ..Default::default()
    };
    let frames = DEMO_SECONDS * 60;
    for frame in 0..frames {
        tick(&mut state, &input, NOMINAL_FRAME_DT);
        for event in state.drain_events() {
            match event {
                GameEvent::DamageTaken { lives_left } => {
                    log::info!("Frame {}: hit, {} lives left", frame, lives_left);
                }
                GameEvent::PowerUpActivated { kind } => {
                    log::info!("Frame {}: {} power-up", frame, kind.as_str());
                }
                _ => {}
            }
            records.handle_event(&event);
        }
        if state.phase == GamePhase::GameOver {
            break;
        }
    }

    // A demo that outlives the autopilot's lives has already ended
    state.end_run();
    for event in state.drain_events() {
        records.handle_event(&event);
    }
    if let Err(e) = records.save(store.as_mut()) {
        log::warn!("Could not save records: {}", e);
    }

    let snap = state.snapshot();
    println!(
        "Demo finished: {:?}, score {}, {} m, {} coins, {} lives, best combo {}, {} particles dropped",
        snap.phase,
        snap.score,
        snap.distance_m,
        snap.coins,
        snap.lives,
        state.scoring.combo.best,
        state.particles.stats().dropped,
    );
}
