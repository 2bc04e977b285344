//! Resettable pseudo-random tone stream
//!
//! The game never stores the sequence it plays. Playback and input
//! verification both replay the same stream by rewinding the shifter to the
//! seed and drawing again, so the only state is one working register.

use serde::{Deserialize, Serialize};

use super::state::ToneButton;

/// Xorshift tone generator with a replayable stream.
///
/// `reset()` rewinds the stream to its first draw; `reseed()` swaps the base
/// seed without disturbing a replay already in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToneRng {
    seed: u32,
    shifter: u32,
}

impl ToneRng {
    pub fn new(seed: u32) -> Self {
        Self {
            seed,
            shifter: seed,
        }
    }

    /// Base seed the stream rewinds to.
    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Replace the base seed. Takes effect on the next `reset()`.
    pub fn reseed(&mut self, seed: u32) {
        self.seed = seed;
    }

    /// Rewind the stream to its first draw.
    pub fn reset(&mut self) {
        self.shifter = self.seed;
    }

    /// Draw the next button from the stream.
    ///
    /// Seed 0 pins the shifter at 0, so that stream repeats `Green` forever.
    /// Degenerate but harmless; not guarded against.
    #[inline]
    pub fn next_button(&mut self) -> ToneButton {
        self.shifter ^= self.shifter << 13;
        self.shifter ^= self.shifter >> 17;
        self.shifter ^= self.shifter << 5;
        // Low 2 bits pick one of the four buttons.
        ToneButton::from_index((self.shifter & 0b11) as u8)
    }
}
