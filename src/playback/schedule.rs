//! Flattened playback schedules built from patterns and melodies.
//!
//! A schedule is a list of events with start offsets relative to the start of
//! the loop. Offsets are running sums of event durations, so the loop length is
//! always the sum of all durations.

use crate::audio::Sound;
use crate::generate::Melody;
use crate::rhythm::{RhythmPattern, Tempo};

/// Fraction of a melody beat that the tone sounds before release.
pub const TONE_FRACTION: f64 = 0.8;

/// What a scheduled event points at, for cursor highlighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaybackPosition {
    Cell { beat: usize, cell: usize },
    Note { index: usize },
}

/// One event of a schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledEvent {
    /// Offset from the start of the loop, in seconds.
    pub time: f64,
    pub duration: f64,
    pub position: PlaybackPosition,
    /// `None` for muted cells: the cursor still moves but nothing sounds.
    pub sound: Option<Sound>,
    /// First cell of a beat.
    pub phrase_start: bool,
}

/// An ordered, gap-free list of events.
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    events: Vec<ScheduledEvent>,
    loop_length: f64,
    looping: bool,
}

impl Schedule {
    /// Flatten a pattern: one event per cell, `(60 / bpm × length) / division` seconds each.
    pub fn from_pattern(pattern: &RhythmPattern, tempo: Tempo) -> Self {
        let mut events = Vec::with_capacity(pattern.cell_count());
        for (beat_index, beat) in pattern.beats().iter().enumerate() {
            let duration = beat.cell_seconds(tempo);
            for (cell_index, &state) in beat.cells().iter().enumerate() {
                events.push(ScheduledEvent {
                    time: 0.0,
                    duration,
                    position: PlaybackPosition::Cell {
                        beat: beat_index,
                        cell: cell_index,
                    },
                    sound: state.is_audible().then_some(Sound::Click(state)),
                    phrase_start: cell_index == 0,
                });
            }
        }
        Self::from_events(events, true)
    }

    /// One beat per note; each tone sounds for 80% of its beat. Does not loop.
    pub fn from_melody(melody: &Melody, tempo: Tempo) -> Self {
        let beat = tempo.beat_seconds();
        let events = melody
            .notes
            .iter()
            .enumerate()
            .map(|(index, n)| ScheduledEvent {
                time: 0.0,
                duration: beat,
                position: PlaybackPosition::Note { index },
                sound: Some(Sound::Tone {
                    note: n.note,
                    duration: beat * TONE_FRACTION,
                }),
                phrase_start: false,
            })
            .collect();
        Self::from_events(events, false)
    }

    /// Recompute start offsets as running sums of durations.
    fn from_events(mut events: Vec<ScheduledEvent>, looping: bool) -> Self {
        let mut t = 0.0;
        for e in &mut events {
            e.time = t;
            t += e.duration;
        }
        Self {
            events,
            loop_length: t,
            looping,
        }
    }

    /// The same events starting from `start`, wrapping around, with offsets
    /// recomputed from zero. The loop length is unchanged.
    pub fn rotate(&self, start: usize) -> Self {
        if self.events.is_empty() {
            return self.clone();
        }
        let start = start % self.events.len();
        let events = self.events[start..]
            .iter()
            .chain(&self.events[..start])
            .copied()
            .collect();
        Self::from_events(events, self.looping)
    }

    pub fn events(&self) -> &[ScheduledEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Total duration in seconds.
    pub fn loop_length(&self) -> f64 {
        self.loop_length
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Index of the event sounding at `offset` seconds into the loop.
    pub fn index_at(&self, offset: f64) -> Option<usize> {
        if self.events.is_empty() || !(0.0..self.loop_length).contains(&offset) {
            return None;
        }
        let idx = self.events.partition_point(|e| e.time <= offset);
        Some(idx.saturating_sub(1))
    }

    /// Index of the event at `position`.
    pub fn find(&self, position: PlaybackPosition) -> Option<usize> {
        self.events.iter().position(|e| e.position == position)
    }
}
