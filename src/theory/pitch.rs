//! Pitch classes: the twelve note names independent of octave.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the twelve pitch classes, spelled with sharps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PitchClass {
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
    A,
    ASharp,
    B,
}

/// Error returned when a pitch-class name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown pitch class '{0}'")]
pub struct UnknownPitchClass(pub String);

impl PitchClass {
    /// All twelve pitch classes in chromatic order starting at C.
    pub const ALL: [PitchClass; 12] = [
        PitchClass::C,
        PitchClass::CSharp,
        PitchClass::D,
        PitchClass::DSharp,
        PitchClass::E,
        PitchClass::F,
        PitchClass::FSharp,
        PitchClass::G,
        PitchClass::GSharp,
        PitchClass::A,
        PitchClass::ASharp,
        PitchClass::B,
    ];

    /// The seven natural pitch classes.
    pub const NATURALS: [PitchClass; 7] = [
        PitchClass::C,
        PitchClass::D,
        PitchClass::E,
        PitchClass::F,
        PitchClass::G,
        PitchClass::A,
        PitchClass::B,
    ];

    /// Semitones above C (0–11).
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Pitch class for a semitone index; wraps modulo 12 in both directions.
    pub fn from_index(index: i32) -> Self {
        Self::ALL[index.rem_euclid(12) as usize]
    }

    /// Transpose by a signed number of semitones.
    pub fn transpose(self, semitones: i32) -> Self {
        Self::from_index(self.index() as i32 + semitones)
    }

    /// Canonical sharp spelling, e.g. `"F#"`.
    pub fn name(self) -> &'static str {
        match self {
            PitchClass::C => "C",
            PitchClass::CSharp => "C#",
            PitchClass::D => "D",
            PitchClass::DSharp => "D#",
            PitchClass::E => "E",
            PitchClass::F => "F",
            PitchClass::FSharp => "F#",
            PitchClass::G => "G",
            PitchClass::GSharp => "G#",
            PitchClass::A => "A",
            PitchClass::ASharp => "A#",
            PitchClass::B => "B",
        }
    }

    /// Whether this is one of the seven natural notes.
    pub fn is_natural(self) -> bool {
        self.name().len() == 1
    }
}

impl FromStr for PitchClass {
    type Err = UnknownPitchClass;

    /// Accepts a letter `A`–`G` followed by an optional `#` or `b`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        let base: i32 = match chars.next() {
            Some('C') | Some('c') => 0,
            Some('D') | Some('d') => 2,
            Some('E') | Some('e') => 4,
            Some('F') | Some('f') => 5,
            Some('G') | Some('g') => 7,
            Some('A') | Some('a') => 9,
            Some('B') | Some('b') => 11,
            _ => return Err(UnknownPitchClass(s.to_string())),
        };
        let accidental = match chars.next() {
            None => 0,
            Some('#') => 1,
            Some('b') => -1,
            Some(_) => return Err(UnknownPitchClass(s.to_string())),
        };
        if chars.next().is_some() {
            return Err(UnknownPitchClass(s.to_string()));
        }
        Ok(Self::from_index(base + accidental))
    }
}

impl TryFrom<String> for PitchClass {
    type Error = UnknownPitchClass;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PitchClass> for String {
    fn from(pc: PitchClass) -> Self {
        pc.name().to_string()
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
