//! Game state and core types
//!
//! Everything the round controller mutates lives here.

use serde::{Deserialize, Serialize};

use super::rng::ToneRng;
use crate::consts::*;

/// One of the four colored buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToneButton {
    Green,
    Red,
    Yellow,
    Blue,
}

impl ToneButton {
    /// Button for an index; only the low 2 bits are looked at.
    pub fn from_index(index: u8) -> Self {
        match index & 0b11 {
            0 => ToneButton::Green,
            1 => ToneButton::Red,
            2 => ToneButton::Yellow,
            _ => ToneButton::Blue,
        }
    }

    pub fn index(self) -> u8 {
        self as u8
    }
}

/// What the speaker is asked to sound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tone {
    /// A button's note
    Button(ToneButton),
    /// The shrill game-over note
    Error,
}

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// No round in progress, waiting for a start press
    Idle,
    /// Computer is playing the sequence back
    Playing,
    /// Player's turn to repeat the sequence
    AwaitingInput,
    /// Mismatch signal is sounding
    GameOver,
}

/// The single timed step currently in flight.
///
/// At most one step exists at a time and its countdown is the game's only
/// suspension point, which keeps emitted tones strictly sequential.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SeqStep {
    /// Pause between a cleared round and the next playback
    LevelPause { remaining_ms: f32 },
    /// Sequence tone `index` is sounding
    ToneOn { index: u32, remaining_ms: f32 },
    /// Silence after sequence tone `index`
    ToneGap { index: u32, remaining_ms: f32 },
    /// Silence before the first error tone
    ErrorLead { remaining_ms: f32 },
    /// Error tone `repeat` (0-based) is sounding
    ErrorOn { repeat: u8, remaining_ms: f32 },
    /// Silence after error tone `repeat`
    ErrorGap { repeat: u8, remaining_ms: f32 },
}

impl SeqStep {
    /// Count down by `dt_ms`. Returns true once the step has expired.
    pub(crate) fn tick_down(&mut self, dt_ms: f32) -> bool {
        let remaining = match self {
            SeqStep::LevelPause { remaining_ms }
            | SeqStep::ToneOn { remaining_ms, .. }
            | SeqStep::ToneGap { remaining_ms, .. }
            | SeqStep::ErrorLead { remaining_ms }
            | SeqStep::ErrorOn { remaining_ms, .. }
            | SeqStep::ErrorGap { remaining_ms, .. } => remaining_ms,
        };
        *remaining -= dt_ms;
        *remaining <= 0.0
    }
}

/// Events the sim emits for the shell to present (tones, lights, labels)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// A playback run began; it covers `level + 1` tones
    SequenceStart { level: u32 },
    /// Sound `tone` and light the matching button
    ToneStart { tone: Tone },
    /// Stop the sounding tone and clear the light
    ToneStop,
    /// Playback finished; player input is accepted from now on
    AwaitInput,
    /// Player confirmed the whole sequence for `level`
    RoundCleared { level: u32 },
    /// Player pressed the wrong button; the game-over signal starts
    Mismatch,
    /// Game-over signal finished; back to idle
    Idle,
}

/// Complete game state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Sequence generator, replayed from its seed for every playback and
    /// every validation pass
    pub rng: ToneRng,
    /// Rounds completed; the current sequence is `level + 1` tones long
    pub level: u32,
    /// Correct presses so far in the current validation pass
    pub user_progress: u32,
    /// Tone on-time for the current round (milliseconds)
    pub tone_delay_ms: f32,
    /// Current phase
    pub phase: GamePhase,
    /// The timed step in flight, if any
    pub step: Option<SeqStep>,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Events since the last drain (transient, presentation only)
    #[serde(skip)]
    events: Vec<GameEvent>,
}

impl GameState {
    /// Create an idle game state with the given generator seed
    pub fn new(seed: u32) -> Self {
        Self {
            rng: ToneRng::new(seed),
            level: 0,
            user_progress: 0,
            tone_delay_ms: START_TONE_DELAY_MS,
            phase: GamePhase::Idle,
            step: None,
            time_ticks: 0,
            events: Vec::new(),
        }
    }

    /// True while a playback or game-over sequence is running. Start
    /// requests and button presses are ignored in this window.
    pub fn presenting(&self) -> bool {
        matches!(self.phase, GamePhase::Playing | GamePhase::GameOver)
    }

    /// Take the events emitted since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }
}
