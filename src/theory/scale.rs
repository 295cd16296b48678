//! Scales, arpeggios, and fretboard maps for the scale-positions view.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::fretboard::{note_at, FretPosition, GuitarString};
use super::pitch::PitchClass;

/// Major or natural minor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleType {
    Major,
    Minor,
}

impl ScaleType {
    /// Semitone offsets of degrees 1–7 above the root.
    pub fn intervals(self) -> [u8; 7] {
        match self {
            ScaleType::Major => [0, 2, 4, 5, 7, 9, 11],
            ScaleType::Minor => [0, 2, 3, 5, 7, 8, 10],
        }
    }

    /// Degrees (1-based) that make up the pentatonic subset.
    pub fn pentatonic_degrees(self) -> [u8; 5] {
        match self {
            ScaleType::Major => [1, 2, 3, 5, 6],
            ScaleType::Minor => [1, 3, 4, 5, 7],
        }
    }
}

impl FromStr for ScaleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "major" => Ok(ScaleType::Major),
            "minor" => Ok(ScaleType::Minor),
            other => Err(format!("unknown scale type '{other}'")),
        }
    }
}

impl fmt::Display for ScaleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScaleType::Major => f.write_str("Major"),
            ScaleType::Minor => f.write_str("Minor"),
        }
    }
}

/// Pitch classes of the scale, in degree order.
pub fn scale_pitches(root: PitchClass, scale: ScaleType) -> [PitchClass; 7] {
    scale.intervals().map(|i| root.transpose(i as i32))
}

/// Scale degree (1–7) of `pitch` within the scale, if it belongs to it.
pub fn scale_degree(root: PitchClass, scale: ScaleType, pitch: PitchClass) -> Option<u8> {
    scale_pitches(root, scale)
        .iter()
        .position(|&p| p == pitch)
        .map(|i| i as u8 + 1)
}

/// Chord arpeggios that can be overlaid on the scale map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Arpeggio {
    #[serde(rename = "I")]
    MajorOne,
    #[serde(rename = "IV")]
    MajorFour,
    #[serde(rename = "V")]
    MajorFive,
    #[serde(rename = "i")]
    MinorOne,
    #[serde(rename = "iv")]
    MinorFour,
    #[serde(rename = "v")]
    MinorFive,
    #[serde(rename = "dim")]
    HalfDiminished,
}

impl Arpeggio {
    pub const ALL: [Arpeggio; 7] = [
        Arpeggio::MajorOne,
        Arpeggio::MajorFour,
        Arpeggio::MajorFive,
        Arpeggio::MinorOne,
        Arpeggio::MinorFour,
        Arpeggio::MinorFive,
        Arpeggio::HalfDiminished,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Arpeggio::MajorOne => "I",
            Arpeggio::MajorFour => "IV",
            Arpeggio::MajorFive => "V",
            Arpeggio::MinorOne => "i",
            Arpeggio::MinorFour => "iv",
            Arpeggio::MinorFive => "v",
            Arpeggio::HalfDiminished => "ø",
        }
    }

    /// Chord root offset from the key root, and the chord's intervals.
    fn shape(self, scale: ScaleType) -> (u8, &'static [u8]) {
        const MAJOR: &[u8] = &[0, 4, 7];
        const MINOR: &[u8] = &[0, 3, 7];
        const HALF_DIM: &[u8] = &[0, 3, 6, 10];
        match self {
            Arpeggio::MajorOne => (0, MAJOR),
            Arpeggio::MajorFour => (5, MAJOR),
            Arpeggio::MajorFive => (7, MAJOR),
            Arpeggio::MinorOne => (0, MINOR),
            Arpeggio::MinorFour => (5, MINOR),
            Arpeggio::MinorFive => (7, MINOR),
            // viiø in major, iiø in minor
            Arpeggio::HalfDiminished => match scale {
                ScaleType::Major => (11, HALF_DIM),
                ScaleType::Minor => (2, HALF_DIM),
            },
        }
    }
}

impl FromStr for Arpeggio {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "I" => Ok(Arpeggio::MajorOne),
            "IV" => Ok(Arpeggio::MajorFour),
            "V" => Ok(Arpeggio::MajorFive),
            "i" => Ok(Arpeggio::MinorOne),
            "iv" => Ok(Arpeggio::MinorFour),
            "v" => Ok(Arpeggio::MinorFive),
            "dim" | "ø" => Ok(Arpeggio::HalfDiminished),
            other => Err(format!("unknown arpeggio '{other}'")),
        }
    }
}

/// Pitch classes of an arpeggio built on the key `root`.
pub fn arpeggio_pitches(arpeggio: Arpeggio, root: PitchClass, scale: ScaleType) -> BTreeSet<PitchClass> {
    let (offset, intervals) = arpeggio.shape(scale);
    let chord_root = root.transpose(offset as i32);
    intervals
        .iter()
        .map(|&i| chord_root.transpose(i as i32))
        .collect()
}

/// Which tonic a fretboard note represents, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootRole {
    /// Tonic of the major key (the relative major when the scale is minor).
    Major,
    /// Tonic of the minor key (the relative minor when the scale is major).
    Minor,
}

/// A scale tone located on the fretboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FretboardNote {
    pub position: FretPosition,
    pub pitch: PitchClass,
    pub degree: u8,
    pub root: Option<RootRole>,
    pub pentatonic: bool,
}

/// Every tone of the scale on all six strings from the nut to `max_fret`.
pub fn fretboard_notes(root: PitchClass, scale: ScaleType, max_fret: u8) -> Vec<FretboardNote> {
    let (major_root, minor_root) = match scale {
        ScaleType::Major => (root, root.transpose(9)),
        ScaleType::Minor => (root.transpose(3), root),
    };
    let pentatonic = scale.pentatonic_degrees();

    let mut notes = Vec::new();
    for string in GuitarString::ALL {
        for fret in 0..=max_fret {
            let position = FretPosition::new(string, fret);
            let pitch = note_at(position).pitch;
            let Some(degree) = scale_degree(root, scale, pitch) else {
                continue;
            };
            let root_role = if pitch == major_root {
                Some(RootRole::Major)
            } else if pitch == minor_root {
                Some(RootRole::Minor)
            } else {
                None
            };
            notes.push(FretboardNote {
                position,
                pitch,
                degree,
                root: root_role,
                pentatonic: pentatonic.contains(&degree),
            });
        }
    }
    notes
}
