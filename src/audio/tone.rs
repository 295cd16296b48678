//! Sine tone voice with an ADSR envelope, used for reference notes and melodies.

use crate::theory::Note;

/// Peak amplitude of a tone at full sustain.
const TONE_GAIN: f64 = 0.5;

/// Attack-Decay-Sustain-Release envelope.
///
/// Times are in seconds, sustain is a level in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdsrEnvelope {
    pub attack: f64,
    pub decay: f64,
    pub sustain: f64,
    pub release: f64,
}

/// Envelope for every melodic tone.
pub const TONE_ENVELOPE: AdsrEnvelope = AdsrEnvelope {
    attack: 0.05,
    decay: 0.1,
    sustain: 0.3,
    release: 0.5,
};

impl AdsrEnvelope {
    /// Amplitude at `t` seconds into a note held for `held` seconds.
    ///
    /// Linear segments: 0→1 over attack, 1→sustain over decay, hold until
    /// `held`, then down to 0 over release from wherever the note let go.
    pub fn amplitude(&self, t: f64, held: f64) -> f64 {
        if t < 0.0 {
            0.0
        } else if t < held {
            self.held_level(t)
        } else if t < held + self.release {
            self.held_level(held) * (1.0 - (t - held) / self.release)
        } else {
            0.0
        }
    }

    fn held_level(&self, t: f64) -> f64 {
        if t < self.attack {
            t / self.attack
        } else if t < self.attack + self.decay {
            1.0 - (t - self.attack) / self.decay * (1.0 - self.sustain)
        } else {
            self.sustain
        }
    }

    /// Held time plus release tail.
    pub fn total_duration(&self, held: f64) -> f64 {
        held.max(0.0) + self.release
    }
}

/// Render `note` as a mono sine held for `duration` seconds, release tail included.
pub fn render_tone(note: Note, duration: f64, sample_rate: u32) -> Vec<f32> {
    render_with(&TONE_ENVELOPE, note.frequency(), duration, sample_rate)
}

fn render_with(env: &AdsrEnvelope, freq: f64, held: f64, sample_rate: u32) -> Vec<f32> {
    let sr = sample_rate as f64;
    let held = held.max(0.0);
    let num_samples = (env.total_duration(held) * sr).round() as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f64 / sr;
            let s = (t * freq * std::f64::consts::TAU).sin();
            (s * env.amplitude(t, held) * TONE_GAIN) as f32
        })
        .collect()
}
