//! Fixed timestep game tick
//!
//! Advances the round state machine deterministically. All waiting the game
//! does (tone on-times, gaps between tones, the game-over signal) is a
//! millisecond countdown on the single in-flight step, so tones can never
//! overlap or reorder.

use super::state::{GameEvent, GamePhase, GameState, SeqStep, Tone, ToneButton};
use crate::consts::*;

/// Input commands for a single tick (deterministic)
///
/// One-shot flags; the shell clears them after each processed tick. The sim
/// never rolls randomness itself, so `seed` carries the freshly rolled
/// generator seed to use if `start` is accepted.
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Start/new-game pressed this frame
    pub start: bool,
    /// Generator seed for an accepted start (0-255 from the shell)
    pub seed: u32,
    /// Colored button pressed this frame
    pub press: Option<ToneButton>,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    state.time_ticks += 1;
    let dt_ms = dt * 1000.0;

    // Start is a no-op while a playback or game-over sequence is in flight.
    if input.start && !state.presenting() {
        begin_game(state, input.seed);
        return;
    }

    match state.phase {
        GamePhase::Idle => {}

        GamePhase::Playing | GamePhase::GameOver => advance_step(state, dt_ms),

        // Input only counts on the player's turn; it is never buffered.
        GamePhase::AwaitingInput => {
            if let Some(button) = input.press {
                check_press(state, button);
            }
        }
    }
}

/// Reset per-game state and kick off the first playback
fn begin_game(state: &mut GameState, seed: u32) {
    state.level = 0;
    state.user_progress = 0;
    state.tone_delay_ms = START_TONE_DELAY_MS;
    state.rng.reseed(seed);
    start_playback(state);
}

/// Enter playback: rewind the generator, shorten the tone delay, sound the
/// first tone of the sequence.
fn start_playback(state: &mut GameState) {
    state.phase = GamePhase::Playing;

    // Replay the stream from its first tone.
    state.rng.reset();

    // Every round the tones get a little faster, down to a floor.
    state.tone_delay_ms = (state.tone_delay_ms * TONE_DELAY_DECAY).max(MIN_TONE_DELAY_MS);

    state.push_event(GameEvent::SequenceStart { level: state.level });
    let button = state.rng.next_button();
    state.push_event(GameEvent::ToneStart {
        tone: Tone::Button(button),
    });
    state.step = Some(SeqStep::ToneOn {
        index: 0,
        remaining_ms: state.tone_delay_ms,
    });
}

/// Count down the in-flight step and fire its transition once it expires
fn advance_step(state: &mut GameState, dt_ms: f32) {
    let Some(mut step) = state.step else { return };
    if !step.tick_down(dt_ms) {
        state.step = Some(step);
        return;
    }

    match step {
        SeqStep::LevelPause { .. } => {
            state.level += 1;
            start_playback(state);
        }
        SeqStep::ToneOn { index, .. } => {
            state.push_event(GameEvent::ToneStop);
            state.step = Some(SeqStep::ToneGap {
                index,
                remaining_ms: state.tone_delay_ms / 2.0,
            });
        }
        SeqStep::ToneGap { index, .. } => {
            if index < state.level {
                let button = state.rng.next_button();
                state.push_event(GameEvent::ToneStart {
                    tone: Tone::Button(button),
                });
                state.step = Some(SeqStep::ToneOn {
                    index: index + 1,
                    remaining_ms: state.tone_delay_ms,
                });
            } else {
                // Playback done. Rewind so validation re-derives the same
                // tones, then hand the turn to the player.
                state.rng.reset();
                state.user_progress = 0;
                state.phase = GamePhase::AwaitingInput;
                state.step = None;
                state.push_event(GameEvent::AwaitInput);
            }
        }
        SeqStep::ErrorLead { .. } => {
            state.push_event(GameEvent::ToneStart { tone: Tone::Error });
            state.step = Some(SeqStep::ErrorOn {
                repeat: 0,
                remaining_ms: GAME_OVER_ON_MS,
            });
        }
        SeqStep::ErrorOn { repeat, .. } => {
            state.push_event(GameEvent::ToneStop);
            if repeat + 1 >= GAME_OVER_REPEATS {
                state.phase = GamePhase::Idle;
                state.step = None;
                state.push_event(GameEvent::Idle);
            } else {
                state.step = Some(SeqStep::ErrorGap {
                    repeat,
                    remaining_ms: GAME_OVER_OFF_MS,
                });
            }
        }
        SeqStep::ErrorGap { repeat, .. } => {
            state.push_event(GameEvent::ToneStart { tone: Tone::Error });
            state.step = Some(SeqStep::ErrorOn {
                repeat: repeat + 1,
                remaining_ms: GAME_OVER_ON_MS,
            });
        }
    }
}

/// Compare a press against the next tone of the replayed stream
fn check_press(state: &mut GameState, button: ToneButton) {
    let expected = state.rng.next_button();
    if button != expected {
        // Any wrong button ends the round; there is no partial credit.
        state.phase = GamePhase::GameOver;
        state.step = Some(SeqStep::ErrorLead {
            remaining_ms: GAME_OVER_ON_MS,
        });
        state.push_event(GameEvent::Mismatch);
        return;
    }

    if state.user_progress == state.level {
        // Whole sequence confirmed. Breathe, then the next round.
        state.push_event(GameEvent::RoundCleared { level: state.level });
        state.phase = GamePhase::Playing;
        state.step = Some(SeqStep::LevelPause {
            remaining_ms: LEVEL_UP_PAUSE_MS,
        });
    } else {
        state.user_progress += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start(state: &mut GameState, seed: u32) {
        let input = TickInput {
            start: true,
            seed,
            ..Default::default()
        };
        tick(state, &input, SIM_DT);
    }

    fn press(state: &mut GameState, button: ToneButton) -> Vec<GameEvent> {
        let input = TickInput {
            press: Some(button),
            ..Default::default()
        };
        tick(state, &input, SIM_DT);
        state.drain_events()
    }

    /// Tick with no input until `wanted` shows up, collecting everything
    fn run_until(state: &mut GameState, wanted: fn(&GameEvent) -> bool) -> Vec<GameEvent> {
        let input = TickInput::default();
        let mut events = Vec::new();
        for _ in 0..200_000 {
            tick(state, &input, SIM_DT);
            events.extend(state.drain_events());
            if events.iter().any(|e| wanted(e)) {
                return events;
            }
        }
        panic!("expected event never arrived");
    }

    fn playback_tones(events: &[GameEvent]) -> Vec<ToneButton> {
        events
            .iter()
            .filter_map(|e| match e {
                GameEvent::ToneStart {
                    tone: Tone::Button(b),
                } => Some(*b),
                _ => None,
            })
            .collect()
    }

    fn error_tones(events: &[GameEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, GameEvent::ToneStart { tone: Tone::Error }))
            .count()
    }

    /// Press back the sequence the computer just played
    fn clear_round(state: &mut GameState, played: &[ToneButton]) {
        for &button in played {
            press(state, button);
        }
    }

    #[test]
    fn start_plays_one_tone_then_awaits_input() {
        let mut state = GameState::new(0);
        start(&mut state, 42);
        assert_eq!(state.phase, GamePhase::Playing);

        let events = run_until(&mut state, |e| matches!(e, GameEvent::AwaitInput));
        assert_eq!(playback_tones(&events), [ToneButton::Green]);
        assert_eq!(state.phase, GamePhase::AwaitingInput);
        assert_eq!(state.user_progress, 0);
    }

    #[test]
    fn clearing_the_first_round_grows_the_sequence() {
        let mut state = GameState::new(0);
        start(&mut state, 42);
        let events = run_until(&mut state, |e| matches!(e, GameEvent::AwaitInput));
        let played = playback_tones(&events);
        assert_eq!(played.len(), 1);

        let events = press(&mut state, played[0]);
        assert!(
            events
                .iter()
                .any(|e| matches!(e, GameEvent::RoundCleared { level: 0 }))
        );

        let events = run_until(&mut state, |e| matches!(e, GameEvent::AwaitInput));
        assert_eq!(state.level, 1);
        assert_eq!(playback_tones(&events).len(), 2);
    }

    #[test]
    fn playback_extends_by_one_tone_each_round() {
        let mut state = GameState::new(0);
        start(&mut state, 1);

        let mut previous: Vec<ToneButton> = Vec::new();
        for round in 0..5usize {
            let events = run_until(&mut state, |e| matches!(e, GameEvent::AwaitInput));
            let played = playback_tones(&events);
            assert_eq!(played.len(), round + 1);
            // Replayed from the same seed, so each round is the last plus one.
            assert_eq!(&played[..round], &previous[..]);
            previous = played.clone();
            clear_round(&mut state, &played);
        }
    }

    #[test]
    fn user_progress_counts_only_the_current_attempt() {
        let mut state = GameState::new(0);
        start(&mut state, 1);
        let events = run_until(&mut state, |e| matches!(e, GameEvent::AwaitInput));
        clear_round(&mut state, &playback_tones(&events));

        let events = run_until(&mut state, |e| matches!(e, GameEvent::AwaitInput));
        let played = playback_tones(&events);
        assert_eq!(played.len(), 2);

        press(&mut state, played[0]);
        assert_eq!(state.user_progress, 1);
        press(&mut state, played[1]);

        run_until(&mut state, |e| matches!(e, GameEvent::AwaitInput));
        assert_eq!(state.user_progress, 0);
    }

    #[test]
    fn mismatch_is_fatal_at_any_position() {
        let mut state = GameState::new(0);
        start(&mut state, 1);
        for _ in 0..2 {
            let events = run_until(&mut state, |e| matches!(e, GameEvent::AwaitInput));
            clear_round(&mut state, &playback_tones(&events));
        }

        let events = run_until(&mut state, |e| matches!(e, GameEvent::AwaitInput));
        let played = playback_tones(&events);
        assert_eq!(played.len(), 3);

        // First press correct, second press wrong.
        press(&mut state, played[0]);
        let wrong = ToneButton::from_index(played[1].index() + 1);
        let events = press(&mut state, wrong);
        assert!(events.iter().any(|e| matches!(e, GameEvent::Mismatch)));
        assert_eq!(state.phase, GamePhase::GameOver);
    }

    #[test]
    fn game_over_signals_three_error_tones_then_idles() {
        let mut state = GameState::new(0);
        start(&mut state, 42);
        let events = run_until(&mut state, |e| matches!(e, GameEvent::AwaitInput));
        let first = playback_tones(&events)[0];

        press(&mut state, ToneButton::from_index(first.index() + 1));
        assert_eq!(state.phase, GamePhase::GameOver);

        let events = run_until(&mut state, |e| matches!(e, GameEvent::Idle));
        assert_eq!(error_tones(&events), 3);
        assert_eq!(state.phase, GamePhase::Idle);
    }

    #[test]
    fn presses_are_ignored_while_presenting() {
        let mut state = GameState::new(0);
        start(&mut state, 42);

        // Hammer a wrong button all the way through playback.
        let input = TickInput {
            press: Some(ToneButton::Blue),
            ..Default::default()
        };
        let mut events = Vec::new();
        while state.phase == GamePhase::Playing {
            tick(&mut state, &input, SIM_DT);
            events.extend(state.drain_events());
        }
        assert_eq!(state.phase, GamePhase::AwaitingInput);
        assert_eq!(state.user_progress, 0);
        assert!(!events.iter().any(|e| matches!(e, GameEvent::Mismatch)));

        // And through the game-over signal: one mismatch, no more.
        let first = playback_tones(&events)[0];
        press(&mut state, ToneButton::from_index(first.index() + 1));
        let mut events = Vec::new();
        while state.phase == GamePhase::GameOver {
            tick(&mut state, &input, SIM_DT);
            events.extend(state.drain_events());
        }
        assert_eq!(state.phase, GamePhase::Idle);
        assert!(!events.iter().any(|e| matches!(e, GameEvent::Mismatch)));
    }

    #[test]
    fn start_is_ignored_while_presenting() {
        let mut state = GameState::new(0);
        start(&mut state, 42);
        assert_eq!(state.rng.seed(), 42);

        // A start with a fresh seed during playback must not take.
        let input = TickInput {
            start: true,
            seed: 7,
            ..Default::default()
        };
        let mut events = Vec::new();
        while state.phase == GamePhase::Playing {
            tick(&mut state, &input, SIM_DT);
            events.extend(state.drain_events());
        }
        assert_eq!(state.rng.seed(), 42);
        assert_eq!(playback_tones(&events).len(), 1);

        // Nor during the game-over signal.
        let first = playback_tones(&events)[0];
        press(&mut state, ToneButton::from_index(first.index() + 1));
        while state.phase == GamePhase::GameOver {
            tick(&mut state, &input, SIM_DT);
            state.drain_events();
        }
        assert_eq!(state.phase, GamePhase::Idle);
        assert_eq!(state.rng.seed(), 42);

        // Once idle, the same press goes through.
        tick(&mut state, &input, SIM_DT);
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.rng.seed(), 7);
    }

    #[test]
    fn tone_delay_decays_and_holds_at_the_floor() {
        let mut state = GameState::new(0);
        start(&mut state, 1);

        let mut expected = START_TONE_DELAY_MS;
        for _ in 0..14 {
            expected = (expected * TONE_DELAY_DECAY).max(MIN_TONE_DELAY_MS);
            let events = run_until(&mut state, |e| matches!(e, GameEvent::AwaitInput));
            assert!((state.tone_delay_ms - expected).abs() < 1e-3);
            clear_round(&mut state, &playback_tones(&events));
        }
        assert_eq!(state.tone_delay_ms, MIN_TONE_DELAY_MS);
    }

    #[test]
    fn identical_inputs_stay_identical() {
        let mut a = GameState::new(0);
        let mut b = GameState::new(0);

        let script = |t: u32| -> TickInput {
            match t {
                0 => TickInput {
                    start: true,
                    seed: 123,
                    ..Default::default()
                },
                400 => TickInput {
                    press: Some(ToneButton::Green),
                    ..Default::default()
                },
                _ => TickInput::default(),
            }
        };

        for t in 0..2_000 {
            let input = script(t);
            tick(&mut a, &input, SIM_DT);
            tick(&mut b, &input, SIM_DT);
            assert_eq!(a.drain_events(), b.drain_events());
        }
        assert_eq!(a.phase, b.phase);
        assert_eq!(a.level, b.level);
        assert_eq!(a.rng, b.rng);
        assert_eq!(a.time_ticks, b.time_ticks);
    }
}
