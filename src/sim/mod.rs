//! Deterministic game logic
//!
//! All gameplay lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - No rendering or platform dependencies

pub mod rng;
pub mod state;
pub mod tick;

pub use rng::ToneRng;
pub use state::{GameEvent, GamePhase, GameState, SeqStep, Tone, ToneButton};
pub use tick::{TickInput, tick};
