//! Notes: a pitch class in a specific octave, with MIDI and frequency conversion.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::pitch::{PitchClass, UnknownPitchClass};

/// A fully specified note, e.g. `E5`.
///
/// Octave numbering follows scientific pitch notation: C4 is middle C (MIDI 60).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Note {
    pub pitch: PitchClass,
    pub octave: i8,
}

/// Error returned by [`Note::from_str`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NoteParseError {
    #[error(transparent)]
    Pitch(#[from] UnknownPitchClass),
    #[error("missing or invalid octave in '{0}'")]
    Octave(String),
}

impl Note {
    pub fn new(pitch: PitchClass, octave: i8) -> Self {
        Self { pitch, octave }
    }

    /// Absolute pitch number: semitones above C-1 (the MIDI note number).
    pub fn midi(self) -> i32 {
        (self.octave as i32 + 1) * 12 + self.pitch.index() as i32
    }

    /// Note for an absolute pitch number.
    pub fn from_midi(midi: i32) -> Self {
        Self {
            pitch: PitchClass::from_index(midi),
            octave: (midi.div_euclid(12) - 1) as i8,
        }
    }

    /// Frequency in Hz, A4 = 440 Hz.
    pub fn frequency(self) -> f64 {
        440.0 * 2.0f64.powf((self.midi() - 69) as f64 / 12.0)
    }

    /// Transpose by a signed number of semitones.
    pub fn transpose(self, semitones: i32) -> Self {
        Self::from_midi(self.midi() + semitones)
    }
}

/// Signed semitone distance from `from` to `to` (positive when `to` is higher).
pub fn semitone_distance(from: Note, to: Note) -> i32 {
    to.midi() - from.midi()
}

impl FromStr for Note {
    type Err = NoteParseError;

    /// Parses `<letter>[#|b]<octave>`, e.g. `C4`, `F#3`, `Bb2`, `C-1`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .char_indices()
            .find(|&(i, c)| i > 0 && (c.is_ascii_digit() || c == '-'))
            .map(|(i, _)| i)
            .ok_or_else(|| NoteParseError::Octave(s.to_string()))?;
        let (name, octave) = s.split_at(split);
        let pitch: PitchClass = name.parse()?;
        let octave: i8 = octave
            .parse()
            .map_err(|_| NoteParseError::Octave(s.to_string()))?;
        Ok(Self { pitch, octave })
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.pitch, self.octave)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn middle_c_is_60() {
        assert_eq!(Note::new(PitchClass::C, 4).midi(), 60);
    }

    #[test]
    fn low_e_string() {
        assert_eq!(Note::new(PitchClass::E, 2).midi(), 40);
    }

    #[test]
    fn from_midi_round_trip() {
        for midi in 0..128 {
            assert_eq!(Note::from_midi(midi).midi(), midi);
        }
        assert_eq!(Note::from_midi(0), Note::new(PitchClass::C, -1));
    }

    #[test]
    fn a4_is_440() {
        assert_approx_eq!(Note::new(PitchClass::A, 4).frequency(), 440.0);
        assert_approx_eq!(Note::new(PitchClass::A, 3).frequency(), 220.0);
    }

    #[test]
    fn signed_distance() {
        let e2 = Note::new(PitchClass::E, 2);
        let g2 = Note::new(PitchClass::G, 2);
        assert_eq!(semitone_distance(e2, g2), 3);
        assert_eq!(semitone_distance(g2, e2), -3);
        assert_eq!(semitone_distance(e2, e2), 0);
    }

    #[test]
    fn distance_across_octave_boundary() {
        let b2 = Note::new(PitchClass::B, 2);
        let c3 = Note::new(PitchClass::C, 3);
        assert_eq!(semitone_distance(b2, c3), 1);
    }

    #[test]
    fn parse_and_display() {
        let n: Note = "F#3".parse().unwrap();
        assert_eq!(n, Note::new(PitchClass::FSharp, 3));
        assert_eq!(n.to_string(), "F#3");

        let flat: Note = "Bb2".parse().unwrap();
        assert_eq!(flat.to_string(), "A#2");

        let low: Note = "C-1".parse().unwrap();
        assert_eq!(low.midi(), 0);
    }

    #[test]
    fn parse_errors() {
        assert!(matches!("H4".parse::<Note>(), Err(NoteParseError::Pitch(_))));
        assert!(matches!("C".parse::<Note>(), Err(NoteParseError::Octave(_))));
        assert!(matches!("C#x".parse::<Note>(), Err(NoteParseError::Octave(_))));
    }
}
