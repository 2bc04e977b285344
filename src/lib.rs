//! Simon Tones - the classic four-button memory game
//!
//! Core modules:
//! - `sim`: Deterministic game logic (sequence generator, round state machine)
//! - `audio`: Web Audio tone synthesis
//! - `settings`: User preferences persisted to LocalStorage

#[cfg(target_arch = "wasm32")]
pub mod audio;
pub mod settings;
pub mod sim;

pub use settings::Settings;

/// Game timing constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz, ample resolution for tone timing)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Tone on-time at the start of a new game (milliseconds)
    pub const START_TONE_DELAY_MS: f32 = 600.0;
    /// Every playback shortens the tone on-time by this factor
    pub const TONE_DELAY_DECAY: f32 = 0.9;
    /// Tones never get shorter than this
    pub const MIN_TONE_DELAY_MS: f32 = 200.0;
    /// Cosmetic pause between a cleared round and the next playback
    pub const LEVEL_UP_PAUSE_MS: f32 = 500.0;

    /// Game-over signal: error tone on-time
    pub const GAME_OVER_ON_MS: f32 = 600.0;
    /// Game-over signal: silence between error tones
    pub const GAME_OVER_OFF_MS: f32 = 200.0;
    /// Game-over signal: number of error tones
    pub const GAME_OVER_REPEATS: u8 = 3;
}
