//! Generator and exercise settings, deserialized from the `interval:` and
//! `melody:` sections of the config file.

use serde::{Deserialize, Serialize};

use crate::theory::{GuitarString, PitchClass};

/// When the C4 reference tone is played before a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlayReference {
    #[default]
    EveryTime,
    OnceAtStart,
    Never,
}

/// Settings for the interval-recognition exercise and the single-note generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntervalSettings {
    pub available_notes: Vec<PitchClass>,
    /// Number of octaves drawn from, starting at `base_octave`.
    pub octave_range: u8,
    pub base_octave: i8,
    pub num_questions: usize,
    pub play_reference: PlayReference,
}

impl Default for IntervalSettings {
    fn default() -> Self {
        Self {
            available_notes: PitchClass::NATURALS.to_vec(),
            octave_range: 1,
            base_octave: 4,
            num_questions: 10,
            play_reference: PlayReference::EveryTime,
        }
    }
}

/// Melodic motion allowed between consecutive generated notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Movement {
    /// At most two semitones.
    Steps,
    /// More than two semitones.
    Leaps,
    #[default]
    Mixed,
}

/// Where melodies come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MelodySource {
    #[default]
    Library,
    Random,
}

/// How fretboard answers are matched to melody notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MarkingMode {
    /// Notes are answered first to last.
    #[default]
    InOrder,
    /// The player picks which note an answer belongs to.
    Free,
}

/// Inclusive fret window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FretWindow {
    pub from: u8,
    pub to: u8,
}

impl FretWindow {
    pub fn contains(&self, fret: u8) -> bool {
        fret >= self.from && fret <= self.to
    }
}

impl Default for FretWindow {
    fn default() -> Self {
        Self { from: 0, to: 5 }
    }
}

/// Settings for the melody generator and the fretboard exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MelodySettings {
    pub num_notes: usize,
    pub available_notes: Vec<PitchClass>,
    pub octave_range: u8,
    pub base_octave: i8,
    pub movement: Movement,
    pub frets: FretWindow,
    pub strings: Vec<GuitarString>,
    pub source: MelodySource,
    pub num_melodies: usize,
    pub marking: MarkingMode,
}

impl Default for MelodySettings {
    fn default() -> Self {
        Self {
            num_notes: 3,
            available_notes: PitchClass::NATURALS.to_vec(),
            octave_range: 2,
            base_octave: 2,
            movement: Movement::Mixed,
            frets: FretWindow::default(),
            strings: GuitarString::ALL.to_vec(),
            source: MelodySource::Library,
            num_melodies: 10,
            marking: MarkingMode::InOrder,
        }
    }
}
