//! Rhythm pattern model — beats, subdivision cells, tempo, and text notation.

pub mod cell;
pub mod notation;
pub mod pattern;
pub mod tempo;

pub use cell::CellState;
pub use pattern::{
    Beat, FillPolicy, RhythmPattern, DEFAULT_LENGTH, MAX_BEATS, MAX_DIVISION, MAX_LENGTH,
    MIN_LENGTH,
};
pub use tempo::{tempo_marking, Tempo, TempoError, BPM_MAX, BPM_MIN, TIME_SIGNATURES};

/// Errors raised by pattern edits and parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    #[error("beat {0} does not exist")]
    BeatOutOfRange(usize),
    #[error("cell {cell} of beat {beat} does not exist")]
    CellOutOfRange { beat: usize, cell: usize },
    #[error("a pattern must keep at least one beat")]
    LastBeat,
    #[error("division {0} is outside 1..={max}", max = pattern::MAX_DIVISION)]
    InvalidDivision(usize),
    #[error("a pattern needs at least one beat")]
    Empty,
    #[error("invalid time signature '{0}'")]
    TimeSignature(String),
    #[error("pattern notation: {0}")]
    Notation(String),
}
