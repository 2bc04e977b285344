//! Audio output using the Web Audio API
//!
//! Tones are synthesized with oscillator nodes - no sample assets needed.

use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

use crate::sim::Tone;

/// Note frequency per button, Hz. Blue is a low G, yellow a C, red an E,
/// green a G an octave above blue.
const BUTTON_FREQS: [f32; 4] = [392.0, 329.0, 262.0, 196.0];
/// Shrill note for the game-over signal, Hz
const ERROR_FREQ: f32 = 800.0;
/// Oscillator gain before the master volume is applied
const TONE_GAIN: f32 = 0.3;

/// Audio manager holding the single sounding tone.
///
/// There is one shared output: starting a tone while another is sounding is
/// a no-op until the active tone is explicitly stopped.
pub struct AudioManager {
    ctx: Option<AudioContext>,
    current: Option<(OscillatorNode, GainNode)>,
    master_volume: f32,
    muted: bool,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioManager {
    pub fn new() -> Self {
        // May fail outside a secure context; the game then runs silently.
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("Failed to create AudioContext - audio disabled");
        }
        Self {
            ctx,
            current: None,
            master_volume: 0.8,
            muted: false,
        }
    }

    /// Resume audio context (required after user gesture)
    pub fn resume(&self) {
        if let Some(ctx) = &self.ctx {
            let _ = ctx.resume();
        }
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * TONE_GAIN
        }
    }

    /// Frequency a tone sounds at
    pub fn frequency(tone: Tone) -> f32 {
        match tone {
            Tone::Button(button) => BUTTON_FREQS[button.index() as usize],
            Tone::Error => ERROR_FREQ,
        }
    }

    /// Start sounding `tone`. No-op while another tone is active.
    pub fn start_tone(&mut self, tone: Tone) {
        if self.current.is_some() {
            return;
        }
        let Some(ctx) = &self.ctx else { return };

        // Resume context if suspended (browsers require user gesture).
        if ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = ctx.resume();
        }

        let Ok(osc) = ctx.create_oscillator() else {
            return;
        };
        let Ok(gain) = ctx.create_gain() else { return };

        osc.set_type(OscillatorType::Triangle);
        osc.frequency().set_value(Self::frequency(tone));
        gain.gain().set_value(self.effective_volume());

        if osc.connect_with_audio_node(&gain).is_err() {
            return;
        }
        if gain.connect_with_audio_node(&ctx.destination()).is_err() {
            return;
        }
        if osc.start().is_err() {
            return;
        }

        self.current = Some((osc, gain));
    }

    /// Stop the sounding tone, if any
    pub fn stop_tone(&mut self) {
        if let Some((osc, _gain)) = self.current.take() {
            let _ = osc.stop();
        }
    }
}
