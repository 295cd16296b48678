//! Rhythm patterns — an ordered list of beats, each split into subdivision cells.
//!
//! The beat list is shared behind an `Arc`; edits go through
//! `Arc::make_mut`, so a clone taken before an edit keeps its old contents.
//! The playback scheduler relies on this to snapshot a pattern cheaply.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::cell::CellState;
use super::tempo::{time_signature_beats, Tempo};
use super::PatternError;

/// Shortest beat length, in beats.
pub const MIN_LENGTH: f64 = 0.25;
/// Longest beat length, in beats.
pub const MAX_LENGTH: f64 = 8.0;
/// Length used for new beats and for unparseable input.
pub const DEFAULT_LENGTH: f64 = 1.0;
/// Largest subdivision of a single beat.
pub const MAX_DIVISION: usize = 16;
/// Largest beat count in the uniform explorer grid.
pub const MAX_BEATS: usize = 16;

/// One beat: a length in beats and `division` equal cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BeatRecord", into = "BeatRecord")]
pub struct Beat {
    length: f64,
    cells: Vec<CellState>,
}

#[derive(Serialize, Deserialize)]
struct BeatRecord {
    length: f64,
    division: usize,
    cells: Vec<CellState>,
}

impl TryFrom<BeatRecord> for Beat {
    type Error = PatternError;

    fn try_from(r: BeatRecord) -> Result<Self, Self::Error> {
        if r.division == 0 || r.division > MAX_DIVISION {
            return Err(PatternError::InvalidDivision(r.division));
        }
        if r.cells.len() != r.division {
            return Err(PatternError::Notation(format!(
                "beat declares division {} but has {} cells",
                r.division,
                r.cells.len()
            )));
        }
        Ok(Beat {
            length: clamp_length(r.length),
            cells: r.cells,
        })
    }
}

impl From<Beat> for BeatRecord {
    fn from(b: Beat) -> Self {
        BeatRecord {
            length: b.length,
            division: b.cells.len(),
            cells: b.cells,
        }
    }
}

impl Beat {
    /// A beat with explicit cells. Length is clamped; cells must be `1..=MAX_DIVISION` long.
    pub fn new(length: f64, cells: Vec<CellState>) -> Result<Self, PatternError> {
        if cells.is_empty() || cells.len() > MAX_DIVISION {
            return Err(PatternError::InvalidDivision(cells.len()));
        }
        Ok(Self {
            length: clamp_length(length),
            cells,
        })
    }

    /// Length 1, division 1, a single accent.
    pub fn accent() -> Self {
        Self {
            length: DEFAULT_LENGTH,
            cells: vec![CellState::Accent],
        }
    }

    fn filled(division: usize, fill: FillPolicy) -> Self {
        Self {
            length: DEFAULT_LENGTH,
            cells: (0..division).map(|slot| fill.state_for(slot)).collect(),
        }
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn division(&self) -> usize {
        self.cells.len()
    }

    pub fn cells(&self) -> &[CellState] {
        &self.cells
    }

    /// Duration of one cell in seconds at `tempo`.
    pub fn cell_seconds(&self, tempo: Tempo) -> f64 {
        tempo.beat_seconds() * self.length / self.cells.len() as f64
    }
}

/// How newly created cells are initialised when a beat's division grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FillPolicy {
    /// Slot 0 is an accent, every other new slot soft.
    #[default]
    AccentFirst,
    /// Every new slot gets the same state.
    Uniform(CellState),
}

impl FillPolicy {
    pub fn state_for(self, slot: usize) -> CellState {
        match self {
            FillPolicy::AccentFirst if slot == 0 => CellState::Accent,
            FillPolicy::AccentFirst => CellState::Soft,
            FillPolicy::Uniform(state) => state,
        }
    }
}

/// A non-empty, ordered sequence of beats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PatternRecord", into = "PatternRecord")]
pub struct RhythmPattern {
    beats: Arc<Vec<Beat>>,
    fill: FillPolicy,
}

#[derive(Serialize, Deserialize)]
struct PatternRecord {
    beats: Vec<Beat>,
    #[serde(default)]
    fill: FillPolicy,
}

impl TryFrom<PatternRecord> for RhythmPattern {
    type Error = PatternError;

    fn try_from(r: PatternRecord) -> Result<Self, Self::Error> {
        RhythmPattern::new(r.beats, r.fill)
    }
}

impl From<RhythmPattern> for PatternRecord {
    fn from(p: RhythmPattern) -> Self {
        PatternRecord {
            beats: Arc::try_unwrap(p.beats).unwrap_or_else(|shared| (*shared).clone()),
            fill: p.fill,
        }
    }
}

impl RhythmPattern {
    pub fn new(beats: Vec<Beat>, fill: FillPolicy) -> Result<Self, PatternError> {
        if beats.is_empty() {
            return Err(PatternError::Empty);
        }
        Ok(Self {
            beats: Arc::new(beats),
            fill,
        })
    }

    /// Starting point of the advanced-subdivisions editor: four single accents.
    pub fn advanced_default() -> Self {
        Self {
            beats: Arc::new(vec![Beat::accent(); 4]),
            fill: FillPolicy::AccentFirst,
        }
    }

    /// A grid of `beats` equal beats, each split into `subdivision` cells of `state`.
    pub fn uniform(beats: usize, subdivision: usize, state: CellState) -> Result<Self, PatternError> {
        if beats == 0 || beats > MAX_BEATS {
            return Err(PatternError::BeatOutOfRange(beats));
        }
        if subdivision == 0 || subdivision > MAX_DIVISION {
            return Err(PatternError::InvalidDivision(subdivision));
        }
        let fill = FillPolicy::Uniform(state);
        Ok(Self {
            beats: Arc::new(vec![Beat::filled(subdivision, fill); beats]),
            fill,
        })
    }

    pub fn beats(&self) -> &[Beat] {
        &self.beats
    }

    pub fn beat(&self, index: usize) -> Option<&Beat> {
        self.beats.get(index)
    }

    pub fn len(&self) -> usize {
        self.beats.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.beats.is_empty()
    }

    pub fn fill(&self) -> FillPolicy {
        self.fill
    }

    /// Total number of cells across all beats.
    pub fn cell_count(&self) -> usize {
        self.beats.iter().map(Beat::division).sum()
    }

    /// Sum of beat lengths, in beats.
    pub fn total_duration(&self) -> f64 {
        self.beats.iter().map(|b| b.length).sum()
    }

    /// Append a beat of length 1 with a single accent.
    pub fn add_beat(&mut self) {
        Arc::make_mut(&mut self.beats).push(Beat::accent());
    }

    /// Remove a beat. The last remaining beat cannot be deleted.
    pub fn delete_beat(&mut self, index: usize) -> Result<Beat, PatternError> {
        self.check_beat(index)?;
        if self.beats.len() == 1 {
            return Err(PatternError::LastBeat);
        }
        Ok(Arc::make_mut(&mut self.beats).remove(index))
    }

    /// Set a beat's length, clamped into `[MIN_LENGTH, MAX_LENGTH]`. Returns the stored value.
    pub fn set_length(&mut self, index: usize, length: f64) -> Result<f64, PatternError> {
        self.check_beat(index)?;
        let length = clamp_length(length);
        Arc::make_mut(&mut self.beats)[index].length = length;
        Ok(length)
    }

    /// Like [`set_length`](Self::set_length) for raw text input; unparseable text becomes 1.
    pub fn set_length_str(&mut self, index: usize, input: &str) -> Result<f64, PatternError> {
        let value = input.trim().parse::<f64>().unwrap_or(DEFAULT_LENGTH);
        self.set_length(index, value)
    }

    /// Resize a beat to `division` cells, keeping existing states by slot.
    pub fn set_division(&mut self, index: usize, division: usize) -> Result<(), PatternError> {
        self.check_beat(index)?;
        if division == 0 || division > MAX_DIVISION {
            return Err(PatternError::InvalidDivision(division));
        }
        let fill = self.fill;
        let cells = &mut Arc::make_mut(&mut self.beats)[index].cells;
        let old = cells.len();
        if division <= old {
            cells.truncate(division);
        } else {
            cells.extend((old..division).map(|slot| fill.state_for(slot)));
        }
        Ok(())
    }

    /// Advance a cell to the next state in the toggle cycle. Returns the new state.
    pub fn toggle_cell(&mut self, beat: usize, cell: usize) -> Result<CellState, PatternError> {
        self.check_cell(beat, cell)?;
        let slot = &mut Arc::make_mut(&mut self.beats)[beat].cells[cell];
        *slot = slot.next();
        Ok(*slot)
    }

    pub fn set_cell(&mut self, beat: usize, cell: usize, state: CellState) -> Result<(), PatternError> {
        self.check_cell(beat, cell)?;
        Arc::make_mut(&mut self.beats)[beat].cells[cell] = state;
        Ok(())
    }

    /// Same beats, but new cells are filled with `state`.
    pub fn with_uniform_fill(mut self, state: CellState) -> Self {
        self.fill = FillPolicy::Uniform(state);
        self
    }

    /// Rebuild the grid with `count` beats (clamped to `1..=MAX_BEATS`), keeping the current subdivision.
    ///
    /// Every cell is reset to the fill state. Returns the beat count used.
    pub fn set_beat_count(&mut self, count: usize) -> usize {
        let count = count.clamp(1, MAX_BEATS);
        let subdivision = self.beats[0].division();
        self.beats = Arc::new(vec![Beat::filled(subdivision, self.fill); count]);
        count
    }

    /// Rebuild the grid with every beat split into `subdivision` cells.
    pub fn set_subdivision(&mut self, subdivision: usize) -> Result<(), PatternError> {
        if subdivision == 0 || subdivision > MAX_DIVISION {
            return Err(PatternError::InvalidDivision(subdivision));
        }
        let count = self.beats.len();
        self.beats = Arc::new(vec![Beat::filled(subdivision, self.fill); count]);
        Ok(())
    }

    /// Reshape the grid to the numerator of `signature` (e.g. `"3/4"` gives three beats).
    pub fn apply_time_signature(&mut self, signature: &str) -> Result<usize, PatternError> {
        let beats = time_signature_beats(signature)
            .ok_or_else(|| PatternError::TimeSignature(signature.to_string()))?;
        Ok(self.set_beat_count(beats))
    }

    fn check_beat(&self, index: usize) -> Result<(), PatternError> {
        if index < self.beats.len() {
            Ok(())
        } else {
            Err(PatternError::BeatOutOfRange(index))
        }
    }

    fn check_cell(&self, beat: usize, cell: usize) -> Result<(), PatternError> {
        self.check_beat(beat)?;
        if cell < self.beats[beat].division() {
            Ok(())
        } else {
            Err(PatternError::CellOutOfRange { beat, cell })
        }
    }
}

impl Default for RhythmPattern {
    fn default() -> Self {
        Self::advanced_default()
    }
}

fn clamp_length(length: f64) -> f64 {
    if length.is_finite() {
        length.clamp(MIN_LENGTH, MAX_LENGTH)
    } else {
        DEFAULT_LENGTH
    }
}
