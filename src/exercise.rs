//! Exercise sessions: interval recognition and fretboard note-finding.
//!
//! Sessions hold question state and statistics only; playing prompts is left
//! to the caller, which asks a session what to play and feeds answers back.

use rand::Rng;

use crate::generate::{
    generate_note, get_melody, GenerateError, IntervalSettings, MarkingMode, Melody, MelodySettings,
    PlayReference,
};
use crate::theory::{check_note_position, FretPosition, Note, PitchClass};

/// Reference tone played before interval questions.
pub const REFERENCE_NOTE: Note = Note {
    pitch: PitchClass::C,
    octave: 4,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExerciseError {
    #[error(transparent)]
    Generate(#[from] GenerateError),
    #[error("the exercise is already complete")]
    Finished,
    #[error("melody has no note {0}")]
    NoteOutOfRange(usize),
}

/// Running score of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    /// Every answer or click, right or wrong.
    pub attempts: usize,
    /// Questions (or notes) solved without a wrong answer first.
    pub first_try: usize,
    /// Questions (or notes) solved.
    pub solved: usize,
}

impl Stats {
    /// Share of solved items that were right first time, in percent.
    pub fn first_try_percent(&self) -> f64 {
        if self.solved == 0 {
            0.0
        } else {
            self.first_try as f64 * 100.0 / self.solved as f64
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Correct { first_try: bool },
    Incorrect,
}

/// Name-the-note exercise against a fixed reference.
pub struct IntervalExercise<R: Rng> {
    settings: IntervalSettings,
    rng: R,
    question: usize,
    current: Note,
    used: Vec<Note>,
    misses: usize,
    stats: Stats,
    complete: bool,
}

impl<R: Rng> IntervalExercise<R> {
    pub fn new(settings: IntervalSettings, mut rng: R) -> Result<Self, ExerciseError> {
        let current = generate_note(&settings, None, &mut rng)?;
        Ok(Self {
            settings,
            rng,
            question: 1,
            current,
            used: vec![current],
            misses: 0,
            stats: Stats::default(),
            complete: false,
        })
    }

    /// One-based question number.
    pub fn question(&self) -> usize {
        self.question
    }

    pub fn num_questions(&self) -> usize {
        self.settings.num_questions.max(1)
    }

    pub fn current_note(&self) -> Note {
        self.current
    }

    /// Every note asked so far, in order.
    pub fn used_notes(&self) -> &[Note] {
        &self.used
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Whether the reference precedes the current question.
    pub fn plays_reference(&self) -> bool {
        match self.settings.play_reference {
            PlayReference::EveryTime => true,
            PlayReference::OnceAtStart => self.question == 1,
            PlayReference::Never => false,
        }
    }

    /// Notes to play for the current question, in order.
    pub fn prompt(&self) -> Vec<Note> {
        let mut notes = Vec::with_capacity(2);
        if self.plays_reference() {
            notes.push(REFERENCE_NOTE);
        }
        notes.push(self.current);
        notes
    }

    /// Answer by pitch class. A correct answer moves on to the next question.
    pub fn answer(&mut self, pitch: PitchClass) -> Result<Answer, ExerciseError> {
        if self.complete {
            return Err(ExerciseError::Finished);
        }
        self.stats.attempts += 1;
        if pitch != self.current.pitch {
            self.misses += 1;
            return Ok(Answer::Incorrect);
        }

        let first_try = self.misses == 0;
        self.stats.solved += 1;
        if first_try {
            self.stats.first_try += 1;
        }

        if self.question >= self.num_questions() {
            self.complete = true;
            tracing::info!(first_try = self.stats.first_try, solved = self.stats.solved, "interval exercise complete");
        } else {
            self.current = generate_note(&self.settings, Some(self.current), &mut self.rng)?;
            self.used.push(self.current);
            self.question += 1;
            self.misses = 0;
        }
        Ok(Answer::Correct { first_try })
    }
}

/// A fretboard position marked as holding one or more melody notes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mark {
    pub position: FretPosition,
    /// Zero-based indices of the notes found here.
    pub note_indices: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Click {
    Correct { first_try: bool, melody_complete: bool },
    Incorrect,
}

/// Find each note of a melody on the fretboard.
pub struct MelodyExercise<R: Rng> {
    settings: MelodySettings,
    rng: R,
    question: usize,
    melody: Melody,
    note_index: usize,
    selected: usize,
    found: Vec<bool>,
    marks: Vec<Mark>,
    misses: usize,
    stats: Stats,
    complete: bool,
}

impl<R: Rng> MelodyExercise<R> {
    pub fn new(settings: MelodySettings, mut rng: R) -> Result<Self, ExerciseError> {
        let melody = get_melody(settings.source, &settings, 0, &mut rng)?;
        let found = vec![false; melody.len()];
        Ok(Self {
            settings,
            rng,
            question: 0,
            melody,
            note_index: 0,
            selected: 0,
            found,
            marks: Vec::new(),
            misses: 0,
            stats: Stats::default(),
            complete: false,
        })
    }

    pub fn melody(&self) -> &Melody {
        &self.melody
    }

    /// One-based melody number.
    pub fn question(&self) -> usize {
        self.question + 1
    }

    pub fn num_melodies(&self) -> usize {
        self.settings.num_melodies.max(1)
    }

    pub fn marking(&self) -> MarkingMode {
        self.settings.marking
    }

    /// Index of the note the next click is checked against.
    pub fn target(&self) -> usize {
        match self.settings.marking {
            MarkingMode::InOrder => self.note_index,
            MarkingMode::Free => self.selected,
        }
    }

    pub fn marks(&self) -> &[Mark] {
        &self.marks
    }

    /// Mark covering the note at `index`, for highlighting during playback.
    pub fn mark_for(&self, index: usize) -> Option<&Mark> {
        self.marks.iter().find(|m| m.note_indices.contains(&index))
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn melody_complete(&self) -> bool {
        self.found.iter().all(|f| *f)
    }

    /// Choose which note to place next in free mode.
    pub fn select(&mut self, index: usize) -> Result<(), ExerciseError> {
        if index >= self.melody.len() {
            return Err(ExerciseError::NoteOutOfRange(index));
        }
        if self.selected != index {
            self.misses = 0;
        }
        self.selected = index;
        Ok(())
    }

    /// Check a clicked position against the target note.
    pub fn click(&mut self, position: FretPosition) -> Result<Click, ExerciseError> {
        if self.complete {
            return Err(ExerciseError::Finished);
        }
        let target = self.target();
        let expected = self
            .melody
            .notes
            .get(target)
            .ok_or(ExerciseError::NoteOutOfRange(target))?
            .note;

        self.stats.attempts += 1;
        if !check_note_position(position, expected) {
            self.misses += 1;
            return Ok(Click::Incorrect);
        }

        let first_try = self.misses == 0;
        self.misses = 0;
        if !self.found[target] {
            self.found[target] = true;
            self.stats.solved += 1;
            if first_try {
                self.stats.first_try += 1;
            }
            match self.marks.iter_mut().find(|m| m.position == position) {
                Some(mark) => mark.note_indices.push(target),
                None => self.marks.push(Mark {
                    position,
                    note_indices: vec![target],
                }),
            }
        }

        let melody_complete = self.melody_complete();
        if !melody_complete {
            match self.settings.marking {
                MarkingMode::InOrder => self.note_index += 1,
                MarkingMode::Free => {
                    if let Some(next) = self.found.iter().position(|f| !*f) {
                        self.selected = next;
                    }
                }
            }
        }
        Ok(Click::Correct {
            first_try,
            melody_complete,
        })
    }

    /// Load the next melody. Returns `false` once the last melody is done.
    pub fn next_melody(&mut self) -> Result<bool, ExerciseError> {
        if self.complete {
            return Ok(false);
        }
        if self.question + 1 >= self.num_melodies() {
            self.complete = true;
            tracing::info!(solved = self.stats.solved, attempts = self.stats.attempts, "melody exercise complete");
            return Ok(false);
        }
        self.question += 1;
        self.melody = get_melody(self.settings.source, &self.settings, self.question, &mut self.rng)?;
        self.found = vec![false; self.melody.len()];
        self.marks.clear();
        self.note_index = 0;
        self.selected = 0;
        self.misses = 0;
        Ok(true)
    }
}
