//! Simon Tones entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, Element, KeyboardEvent, MouseEvent, TouchEvent};

    use simon_tones::audio::AudioManager;
    use simon_tones::consts::*;
    use simon_tones::settings::Settings;
    use simon_tones::sim::{GameEvent, GameState, TickInput, Tone, ToneButton, tick};

    /// DOM ids of the color buttons, indexed by `ToneButton`
    const BUTTON_IDS: [&str; 4] = ["btn-green", "btn-red", "btn-yellow", "btn-blue"];
    /// DOM id of the start/new-game button
    const START_ID: &str = "btn-start";
    /// CSS class toggled while a button is lit
    const LIT_CLASS: &str = "lit";

    /// Game instance holding all state
    struct Game {
        state: GameState,
        input: TickInput,
        audio: AudioManager,
        settings: Settings,
        accumulator: f32,
        last_time: f64,
        /// Button lit by the sim (cleared on ToneStop)
        lit: Option<ToneButton>,
        /// Button the player is holding down
        held: Option<ToneButton>,
    }

    impl Game {
        fn new(seed: u32, audio: AudioManager, settings: Settings) -> Self {
            Self {
                state: GameState::new(seed),
                input: TickInput::default(),
                audio,
                settings,
                accumulator: 0.0,
                last_time: 0.0,
                lit: None,
                held: None,
            }
        }

        /// Run simulation ticks for a frame's worth of time
        fn update(&mut self, dt: f32) {
            let dt = dt.min(0.1);
            self.accumulator += dt;

            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                let input = self.input.clone();
                tick(&mut self.state, &input, SIM_DT);
                self.accumulator -= SIM_DT;
                substeps += 1;

                // Clear one-shot inputs after processing
                self.input.start = false;
                self.input.press = None;

                self.present();
            }
        }

        /// Apply the sim's events to the page: tones, lights, start label
        fn present(&mut self) {
            for event in self.state.drain_events() {
                match event {
                    GameEvent::ToneStart { tone } => {
                        let button = match tone {
                            Tone::Button(button) => button,
                            // The error signal flashes the red button.
                            Tone::Error => ToneButton::Red,
                        };
                        self.light(button, true);
                        self.lit = Some(button);
                        self.audio.start_tone(tone);
                    }
                    GameEvent::ToneStop => {
                        if let Some(button) = self.lit.take() {
                            self.light(button, false);
                        }
                        self.audio.stop_tone();
                    }
                    GameEvent::SequenceStart { level } => {
                        log::info!("playing sequence of {}", level + 1);
                        self.set_start_label("WAIT");
                    }
                    GameEvent::AwaitInput => self.set_start_label("NEW GAME"),
                    GameEvent::RoundCleared { level } => {
                        log::info!("round {} cleared", level + 1);
                    }
                    GameEvent::Mismatch => log::info!("wrong button - game over"),
                    GameEvent::Idle => self.set_start_label("START"),
                }
            }
        }

        /// A color button went down: immediate light + tone feedback, and
        /// the press goes to the sim (which ignores it unless it is the
        /// player's turn).
        fn press_button(&mut self, button: ToneButton) {
            self.audio.resume();
            self.input.press = Some(button);
            self.held = Some(button);
            self.light(button, true);
            self.audio.start_tone(Tone::Button(button));
        }

        /// Pointer released anywhere on the page
        fn release_button(&mut self) {
            if let Some(button) = self.held.take() {
                // Keep the light if the sim is lighting the same button.
                if self.lit != Some(button) {
                    self.light(button, false);
                }
            }
            // The computer's tone is not ours to stop.
            if self.lit.is_none() {
                self.audio.stop_tone();
            }
        }

        /// Start/new-game pressed; the sim decides whether it is accepted
        fn start_pressed(&mut self) {
            self.audio.resume();
            self.input.start = true;
            self.input.seed = rand::random::<u8>() as u32;
        }

        fn toggle_mute(&mut self) {
            self.settings.muted = !self.settings.muted;
            self.settings.save();
            self.audio.set_muted(self.settings.muted);
            log::info!("muted: {}", self.settings.muted);
        }

        fn light(&self, button: ToneButton, on: bool) {
            let Some(el) = button_element(BUTTON_IDS[button.index() as usize]) else {
                return;
            };
            let class_list = el.class_list();
            let _ = if on {
                class_list.add_1(LIT_CLASS)
            } else {
                class_list.remove_1(LIT_CLASS)
            };
        }

        fn set_start_label(&self, label: &str) {
            if let Some(el) = button_element(START_ID) {
                el.set_text_content(Some(label));
            }
        }
    }

    fn document() -> Option<Document> {
        web_sys::window().and_then(|w| w.document())
    }

    fn button_element(id: &str) -> Option<Element> {
        document().and_then(|d| d.get_element_by_id(id))
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Simon Tones starting...");

        let settings = Settings::load();
        let mut audio = AudioManager::new();
        audio.set_master_volume(settings.master_volume);
        audio.set_muted(settings.muted);

        let seed = rand::random::<u8>() as u32;
        let game = Rc::new(RefCell::new(Game::new(seed, audio, settings)));

        setup_color_buttons(game.clone());
        setup_start_button(game.clone());
        setup_release_handlers(game.clone());
        setup_key_handler(game.clone());

        request_animation_frame(game);

        log::info!("Simon Tones running!");
    }

    fn setup_color_buttons(game: Rc<RefCell<Game>>) {
        let Some(document) = document() else { return };

        for (index, id) in BUTTON_IDS.iter().enumerate() {
            let Some(btn) = document.get_element_by_id(id) else {
                log::warn!("missing button element #{id}");
                continue;
            };
            let button = ToneButton::from_index(index as u8);

            {
                let game = game.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                    game.borrow_mut().press_button(button);
                });
                let _ = btn
                    .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
                closure.forget();
            }

            {
                let game = game.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                    event.prevent_default();
                    game.borrow_mut().press_button(button);
                });
                let _ = btn.add_event_listener_with_callback(
                    "touchstart",
                    closure.as_ref().unchecked_ref(),
                );
                closure.forget();
            }
        }
    }

    fn setup_start_button(game: Rc<RefCell<Game>>) {
        let Some(btn) = button_element(START_ID) else {
            log::warn!("missing button element #{START_ID}");
            return;
        };

        let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
            game.borrow_mut().start_pressed();
        });
        let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    /// End the tone on any pointer-up. This prevents the sound from getting
    /// stuck on if the pointer is dragged off a button while held down.
    fn setup_release_handlers(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };

        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                game.borrow_mut().release_button();
            });
            let _ =
                window.add_event_listener_with_callback("mouseup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: TouchEvent| {
                game.borrow_mut().release_button();
            });
            let _ = window
                .add_event_listener_with_callback("touchend", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_key_handler(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };

        let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
            let mut g = game.borrow_mut();
            match event.key().as_str() {
                " " | "Enter" => g.start_pressed(),
                "m" | "M" => g.toggle_mute(),
                _ => {}
            }
        });
        let _ = window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
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
                SIM_DT
            };
            g.last_time = time;

            g.update(dt);
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Simon Tones (native) starting...");
    log::info!("The playable build is the web one - run with `trunk serve`");

    headless_demo();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Headless demo: answer correctly for three rounds, then miss on purpose,
/// logging every tone. Doubles as a smoke test of the whole round loop.
#[cfg(not(target_arch = "wasm32"))]
fn headless_demo() {
    use simon_tones::consts::SIM_DT;
    use simon_tones::sim::{GameEvent, GamePhase, GameState, TickInput, Tone, ToneButton, tick};

    let mut state = GameState::new(0);
    let mut input = TickInput {
        start: true,
        seed: 42,
        ..Default::default()
    };
    log::info!("demo seed: 42");

    let mut sequence: Vec<ToneButton> = Vec::new();
    let mut pending: Vec<ToneButton> = Vec::new();
    let mut rounds = 0u32;

    for _ in 0..200_000u32 {
        tick(&mut state, &input, SIM_DT);
        input.start = false;
        input.press = None;

        for event in state.drain_events() {
            match event {
                GameEvent::SequenceStart { level } => {
                    log::info!("playing sequence of {}", level + 1);
                    sequence.clear();
                }
                GameEvent::ToneStart {
                    tone: Tone::Button(button),
                } => {
                    log::info!("tone: {:?}", button);
                    sequence.push(button);
                }
                GameEvent::ToneStart { tone: Tone::Error } => log::info!("error tone"),
                GameEvent::ToneStop => {}
                GameEvent::AwaitInput => {
                    pending = sequence.clone();
                    if rounds == 3 {
                        // Get the last press wrong on purpose.
                        if let Some(last) = pending.last_mut() {
                            *last = ToneButton::from_index(last.index() + 1);
                        }
                    }
                    pending.reverse();
                }
                GameEvent::RoundCleared { level } => {
                    rounds = level + 1;
                    log::info!("cleared round {}", rounds);
                }
                GameEvent::Mismatch => log::info!("wrong button - game over"),
                GameEvent::Idle => {
                    log::info!("back to idle after {} cleared rounds", rounds);
                    return;
                }
            }
        }

        if state.phase == GamePhase::AwaitingInput {
            if let Some(button) = pending.pop() {
                input.press = Some(button);
            }
        }
    }

    log::warn!("demo did not finish within its tick limit");
}
