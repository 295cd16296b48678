//! Music theory utilities — pitch classes, notes, fretboard geometry, scales.
//!
//! Everything here is a pure function of its inputs.

pub mod fretboard;
pub mod note;
pub mod pitch;
pub mod scale;

pub use fretboard::{
    check_note_position, fret_for, note_at, positions_of, FretPosition, GuitarString, MAX_FRET,
};
pub use note::{semitone_distance, Note, NoteParseError};
pub use pitch::{PitchClass, UnknownPitchClass};
pub use scale::{arpeggio_pitches, fretboard_notes, Arpeggio, FretboardNote, RootRole, ScaleType};
