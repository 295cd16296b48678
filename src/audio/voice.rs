//! Rhythm voices: synthesized click sounds for each sound set.
//!
//! Every set provides three voices (accent, normal, soft) plus a level per
//! voice in decibels. Noise voices use a seeded `ChaCha8Rng`, so a bank built
//! twice with the same seed is sample-identical.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::rhythm::CellState;
use crate::theory::{Note, PitchClass};

/// Extra level for the first cell of each beat.
pub const PHRASE_BOOST_DB: f64 = 3.0;

/// Peak amplitude of a voice at 0 dB.
const VOICE_PEAK: f64 = 0.8;

/// Which family of sounds plays rhythm cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SoundSet {
    #[default]
    ClassicClick,
    DrumKit,
    Woodblock,
    ElectronicBeep,
}

impl SoundSet {
    pub const ALL: [SoundSet; 4] = [
        SoundSet::ClassicClick,
        SoundSet::DrumKit,
        SoundSet::Woodblock,
        SoundSet::ElectronicBeep,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SoundSet::ClassicClick => "classicClick",
            SoundSet::DrumKit => "drumKit",
            SoundSet::Woodblock => "woodblock",
            SoundSet::ElectronicBeep => "electronicBeep",
        }
    }

    /// Accent, normal and soft levels in dB.
    pub fn levels(self) -> [f64; 3] {
        match self {
            SoundSet::DrumKit => [0.0, -3.0, -10.0],
            _ => [0.0, -5.0, -12.0],
        }
    }

    /// Level in dB for a cell state, `None` for mute.
    pub fn level(self, state: CellState) -> Option<f64> {
        let [accent, normal, soft] = self.levels();
        match state {
            CellState::Accent => Some(accent),
            CellState::Normal => Some(normal),
            CellState::Soft => Some(soft),
            CellState::Mute => None,
        }
    }
}

impl fmt::Display for SoundSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sound set '{0}' (expected classicClick, drumKit, woodblock or electronicBeep)")]
pub struct UnknownSoundSet(pub String);

impl FromStr for SoundSet {
    type Err = UnknownSoundSet;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
        match key.to_ascii_lowercase().as_str() {
            "classicclick" | "classic" | "click" => Ok(SoundSet::ClassicClick),
            "drumkit" | "drums" => Ok(SoundSet::DrumKit),
            "woodblock" | "wood" => Ok(SoundSet::Woodblock),
            "electronicbeep" | "electronic" | "beep" => Ok(SoundSet::ElectronicBeep),
            _ => Err(UnknownSoundSet(s.to_string())),
        }
    }
}

/// Convert decibels to linear gain.
pub fn db_to_gain(db: f64) -> f64 {
    10f64.powf(db / 20.0)
}

#[derive(Debug, Clone, Copy)]
enum Shape {
    Sine,
    Square,
}

impl Shape {
    fn at(self, phase: f64) -> f64 {
        match self {
            Shape::Sine => (phase * std::f64::consts::TAU).sin(),
            Shape::Square => {
                if phase.fract() < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
        }
    }
}

/// A pitched percussive voice whose pitch falls from `octaves` above `base_hz`
/// down to `base_hz` within `pitch_decay` seconds.
fn membrane(sample_rate: u32, base_hz: f64, octaves: f64, pitch_decay: f64, decay: f64, shape: Shape) -> Vec<f32> {
    let sr = sample_rate as f64;
    let num_samples = (sr * decay * 2.0) as usize;
    let start_hz = (base_hz * 2f64.powf(octaves)).min(sr / 4.0).max(base_hz);
    let mut output = Vec::with_capacity(num_samples);
    let mut phase = 0.0_f64;

    for i in 0..num_samples {
        let t = i as f64 / sr;
        let sweep = (-t * 5.0 / pitch_decay).exp();
        let freq = base_hz + (start_hz - base_hz) * sweep;
        let amp = (-t * 5.0 / decay).exp();
        phase += freq / sr;
        output.push((shape.at(phase) * amp * VOICE_PEAK) as f32);
    }
    output
}

/// Fixed-pitch sine blip.
fn beep(sample_rate: u32, hz: f64, decay: f64) -> Vec<f32> {
    membrane(sample_rate, hz, 0.0, 1.0, decay, Shape::Sine)
}

/// White noise with exponential decay.
fn noise(sample_rate: u32, decay: f64, seed: u64) -> Vec<f32> {
    let sr = sample_rate as f64;
    let num_samples = (sr * decay * 2.0) as usize;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..num_samples)
        .map(|i| {
            let t = i as f64 / sr;
            let amp = (-t * 5.0 / decay).exp();
            let n: f64 = rng.gen_range(-1.0..1.0);
            (n * amp * VOICE_PEAK) as f32
        })
        .collect()
}

/// High-passed noise, short and bright.
fn metal(sample_rate: u32, decay: f64, seed: u64) -> Vec<f32> {
    let sr = sample_rate as f64;
    let num_samples = (sr * decay * 2.0) as usize;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut output = Vec::with_capacity(num_samples);
    let mut prev_input = 0.0_f64;
    let mut prev_output = 0.0_f64;
    let alpha = 0.85;

    for i in 0..num_samples {
        let t = i as f64 / sr;
        let amp = (-t * 5.0 / decay).exp();
        let n: f64 = rng.gen_range(-1.0..1.0);
        // y[n] = a * (y[n-1] + x[n] - x[n-1])
        let filtered = alpha * (prev_output + n - prev_input);
        prev_input = n;
        prev_output = filtered;
        output.push((filtered.clamp(-1.0, 1.0) * amp * VOICE_PEAK) as f32);
    }
    output
}

/// Pre-rendered mono voices for one sound set.
#[derive(Debug, Clone)]
pub struct VoiceBank {
    set: SoundSet,
    sample_rate: u32,
    voices: [Vec<f32>; 3],
}

impl VoiceBank {
    pub fn new(set: SoundSet, sample_rate: u32, seed: u64) -> Self {
        let c4 = Note::new(PitchClass::C, 4).frequency();
        let c2 = Note::new(PitchClass::C, 2).frequency();
        let voices = match set {
            SoundSet::ClassicClick => {
                let click = membrane(sample_rate, c4, 2.0, 0.01, 0.05, Shape::Sine);
                [click.clone(), click.clone(), click]
            }
            SoundSet::Woodblock => {
                let block = membrane(sample_rate, c4, 2.0, 0.008, 0.05, Shape::Square);
                [block.clone(), block.clone(), block]
            }
            SoundSet::DrumKit => [
                membrane(sample_rate, c2, 10.0, 0.05, 0.4, Shape::Sine),
                noise(sample_rate, 0.1, seed),
                metal(sample_rate, 0.05, seed.wrapping_add(1)),
            ],
            SoundSet::ElectronicBeep => [
                beep(sample_rate, 800.0, 0.1),
                beep(sample_rate, 600.0, 0.1),
                beep(sample_rate, 400.0, 0.1),
            ],
        };
        tracing::debug!(%set, sample_rate, "voice bank rendered");
        Self {
            set,
            sample_rate,
            voices,
        }
    }

    pub fn set(&self) -> SoundSet {
        self.set
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Raw voice for a cell state. Mute has none.
    pub fn voice(&self, state: CellState) -> Option<&[f32]> {
        let slot = match state {
            CellState::Accent => 0,
            CellState::Normal => 1,
            CellState::Soft => 2,
            CellState::Mute => return None,
        };
        Some(&self.voices[slot])
    }

    /// Linear gain for a hit, including the phrase-start boost.
    pub fn gain(&self, state: CellState, phrase_start: bool) -> Option<f32> {
        let boost = if phrase_start { PHRASE_BOOST_DB } else { 0.0 };
        self.set.level(state).map(|db| db_to_gain(db + boost) as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    const SR: u32 = 44_100;

    fn peak(samples: &[f32]) -> f32 {
        samples.iter().fold(0.0f32, |m, s| m.max(s.abs()))
    }

    #[test]
    fn db_conversion() {
        assert_approx_eq!(db_to_gain(0.0), 1.0);
        assert_approx_eq!(db_to_gain(-20.0), 0.1);
        assert_approx_eq!(db_to_gain(6.0), 1.995, 1e-3);
    }

    #[test]
    fn levels_per_set() {
        assert_eq!(SoundSet::DrumKit.levels(), [0.0, -3.0, -10.0]);
        assert_eq!(SoundSet::Woodblock.levels(), [0.0, -5.0, -12.0]);
        assert_eq!(SoundSet::ClassicClick.level(CellState::Mute), None);
    }

    #[test]
    fn parses_names() {
        assert_eq!("drumKit".parse::<SoundSet>().unwrap(), SoundSet::DrumKit);
        assert_eq!("electronic-beep".parse::<SoundSet>().unwrap(), SoundSet::ElectronicBeep);
        assert_eq!("Woodblock".parse::<SoundSet>().unwrap(), SoundSet::Woodblock);
        assert!("cowbell".parse::<SoundSet>().is_err());
        for set in SoundSet::ALL {
            assert_eq!(set.to_string().parse::<SoundSet>().unwrap(), set);
        }
    }

    #[test]
    fn serde_uses_camel_case() {
        let yaml = serde_yaml::to_string(&SoundSet::ElectronicBeep).unwrap();
        assert_eq!(yaml.trim(), "electronicBeep");
    }

    #[test]
    fn every_voice_is_audible_and_bounded() {
        for set in SoundSet::ALL {
            let bank = VoiceBank::new(set, SR, 7);
            for state in [CellState::Accent, CellState::Normal, CellState::Soft] {
                let v = bank.voice(state).unwrap();
                assert!(!v.is_empty(), "{set} {state}");
                let p = peak(v);
                assert!(p > 0.01 && p <= 1.0, "{set} {state} peak {p}");
            }
            assert!(bank.voice(CellState::Mute).is_none());
        }
    }

    #[test]
    fn phrase_start_is_three_db_louder() {
        let bank = VoiceBank::new(SoundSet::ClassicClick, SR, 0);
        let plain = bank.gain(CellState::Normal, false).unwrap();
        let boosted = bank.gain(CellState::Normal, true).unwrap();
        assert_approx_eq!(boosted / plain, db_to_gain(3.0) as f32, 1e-5);
        assert!(bank.gain(CellState::Accent, false).unwrap() > plain);
    }

    #[test]
    fn noise_voices_are_deterministic() {
        let a = VoiceBank::new(SoundSet::DrumKit, SR, 42);
        let b = VoiceBank::new(SoundSet::DrumKit, SR, 42);
        assert_eq!(a.voice(CellState::Normal), b.voice(CellState::Normal));
    }

    #[test]
    fn kick_is_longest_drum_voice() {
        let bank = VoiceBank::new(SoundSet::DrumKit, SR, 1);
        let kick = bank.voice(CellState::Accent).unwrap().len();
        assert!(kick > bank.voice(CellState::Normal).unwrap().len());
        assert!(kick > bank.voice(CellState::Soft).unwrap().len());
    }
}
