//! Guitar fretboard geometry — standard tuning, fret lookup, and answer checking.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::note::Note;
use super::pitch::PitchClass;

/// Highest fret considered playable.
pub const MAX_FRET: u8 = 24;

/// The six strings of a guitar in standard tuning, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GuitarString {
    #[serde(rename = "E")]
    LowE,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "D")]
    D,
    #[serde(rename = "G")]
    G,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "e")]
    HighE,
}

impl GuitarString {
    pub const ALL: [GuitarString; 6] = [
        GuitarString::LowE,
        GuitarString::A,
        GuitarString::D,
        GuitarString::G,
        GuitarString::B,
        GuitarString::HighE,
    ];

    /// Zero-based index, 0 = low E.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Pitch of the open string.
    pub fn open_note(self) -> Note {
        match self {
            GuitarString::LowE => Note::new(PitchClass::E, 2),
            GuitarString::A => Note::new(PitchClass::A, 2),
            GuitarString::D => Note::new(PitchClass::D, 3),
            GuitarString::G => Note::new(PitchClass::G, 3),
            GuitarString::B => Note::new(PitchClass::B, 3),
            GuitarString::HighE => Note::new(PitchClass::E, 4),
        }
    }

    /// Short label as printed next to the nut.
    pub fn label(self) -> &'static str {
        match self {
            GuitarString::LowE => "E",
            GuitarString::A => "A",
            GuitarString::D => "D",
            GuitarString::G => "G",
            GuitarString::B => "B",
            GuitarString::HighE => "e",
        }
    }
}

impl fmt::Display for GuitarString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A playable location on the neck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FretPosition {
    pub string: GuitarString,
    pub fret: u8,
}

impl FretPosition {
    pub fn new(string: GuitarString, fret: u8) -> Self {
        Self { string, fret }
    }
}

impl fmt::Display for FretPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.string, self.fret)
    }
}

/// Fret that sounds `pitch` in `octave` on `string`, if it lies within `0..=MAX_FRET`.
pub fn fret_for(pitch: PitchClass, octave: i8, string: GuitarString) -> Option<u8> {
    let fret = Note::new(pitch, octave).midi() - string.open_note().midi();
    if (0..=MAX_FRET as i32).contains(&fret) {
        Some(fret as u8)
    } else {
        None
    }
}

/// Note sounding at a fret position.
pub fn note_at(position: FretPosition) -> Note {
    position.string.open_note().transpose(position.fret as i32)
}

/// Every position up to `max_fret` that produces exactly `note`.
pub fn positions_of(note: Note, max_fret: u8) -> Vec<FretPosition> {
    GuitarString::ALL
        .iter()
        .filter_map(|&string| {
            fret_for(note.pitch, note.octave, string)
                .filter(|&fret| fret <= max_fret)
                .map(|fret| FretPosition::new(string, fret))
        })
        .collect()
}

/// Whether clicking `position` correctly answers `expected`.
///
/// Matching is by sounding pitch, so the same note on another string counts.
pub fn check_note_position(position: FretPosition, expected: Note) -> bool {
    note_at(position) == expected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_strings_are_fret_zero() {
        for string in GuitarString::ALL {
            let open = string.open_note();
            assert_eq!(fret_for(open.pitch, open.octave, string), Some(0));
        }
    }

    #[test]
    fn f2_on_low_e_is_first_fret() {
        assert_eq!(fret_for(PitchClass::F, 2, GuitarString::LowE), Some(1));
    }

    #[test]
    fn c3_on_a_string() {
        assert_eq!(fret_for(PitchClass::C, 3, GuitarString::A), Some(3));
    }

    #[test]
    fn below_open_string_is_not_found() {
        assert_eq!(fret_for(PitchClass::C, 2, GuitarString::LowE), None);
        assert_eq!(fret_for(PitchClass::E, 3, GuitarString::G), None);
    }

    #[test]
    fn above_window_is_not_found() {
        // E2 + 25 semitones = F4
        assert_eq!(fret_for(PitchClass::F, 4, GuitarString::LowE), None);
        assert_eq!(fret_for(PitchClass::E, 4, GuitarString::LowE), Some(24));
    }

    #[test]
    fn note_at_inverts_fret_for() {
        let pos = FretPosition::new(GuitarString::D, 7);
        let note = note_at(pos);
        assert_eq!(note, Note::new(PitchClass::A, 3));
        assert_eq!(fret_for(note.pitch, note.octave, pos.string), Some(7));
    }

    #[test]
    fn same_pitch_on_several_strings() {
        let e3 = Note::new(PitchClass::E, 3);
        let positions = positions_of(e3, 12);
        assert_eq!(
            positions,
            vec![
                FretPosition::new(GuitarString::LowE, 12),
                FretPosition::new(GuitarString::A, 7),
                FretPosition::new(GuitarString::D, 2),
            ]
        );
    }

    #[test]
    fn check_accepts_enharmonic_positions() {
        let a2 = Note::new(PitchClass::A, 2);
        assert!(check_note_position(FretPosition::new(GuitarString::A, 0), a2));
        assert!(check_note_position(FretPosition::new(GuitarString::LowE, 5), a2));
        assert!(!check_note_position(FretPosition::new(GuitarString::D, 7), a2));
    }

    #[test]
    fn string_index_round_trip() {
        for s in GuitarString::ALL {
            assert_eq!(GuitarString::from_index(s.index()), Some(s));
        }
        assert_eq!(GuitarString::from_index(6), None);
    }
}
