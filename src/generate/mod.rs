//! Note and melody generators: randomized question material for the exercises.
//!
//! Every generator takes an explicit [`rand::Rng`]; pass a seeded
//! `ChaCha8Rng` for reproducible sessions.

pub mod library;
pub mod melody;
pub mod note;
pub mod settings;

use std::fmt;

use rand::Rng;

use crate::theory::{FretPosition, Note};

pub use library::{library, library_melody};
pub use melody::generate_melody;
pub use note::{generate_note, MAX_ATTEMPTS};
pub use settings::{
    FretWindow, IntervalSettings, MarkingMode, MelodySettings, MelodySource, Movement,
    PlayReference,
};

/// Errors raised by the generators.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerateError {
    /// Settings leave nothing to draw from.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(&'static str),
    /// The retry cap was hit before a note satisfied the constraints.
    #[error("could not generate note {note_index} after {attempts} attempts with current settings")]
    ConstraintExhausted { note_index: usize, attempts: usize },
}

/// One note of a melody, optionally pinned to a fretboard position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MelodyNote {
    pub note: Note,
    pub position: Option<FretPosition>,
}

/// A sequence of notes to be located on the fretboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Melody {
    pub id: u64,
    pub name: String,
    /// 1 (easiest) to 5; `None` for generated melodies.
    pub difficulty: Option<u8>,
    pub notes: Vec<MelodyNote>,
    pub tags: Vec<String>,
}

impl Melody {
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

impl fmt::Display for Melody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.name)?;
        for n in &self.notes {
            write!(f, " {}", n.note)?;
        }
        Ok(())
    }
}

/// Fetch the melody for question `index`: from the library (wrapping) or freshly generated.
pub fn get_melody(
    source: MelodySource,
    settings: &MelodySettings,
    index: usize,
    rng: &mut impl Rng,
) -> Result<Melody, GenerateError> {
    match source {
        MelodySource::Library => Ok(library_melody(index).clone()),
        MelodySource::Random => generate_melody(settings, rng),
    }
}
