//! The sink seam between the playback scheduler and whatever makes sound.

use super::voice::SoundSet;
use super::AudioError;
use crate::rhythm::CellState;
use crate::theory::Note;

/// What a scheduled hit should sound like.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sound {
    /// A rhythm cell, voiced by the current sound set. Never `Mute`.
    Click(CellState),
    /// A pitched tone lasting `duration` seconds before its release.
    Tone { note: Note, duration: f64 },
}

/// Receives timed sound triggers from the scheduler.
///
/// Times are absolute seconds on the scheduler's transport. Hits may arrive
/// slightly ahead of their time (lookahead) and must be held until then.
pub trait AudioSink {
    /// Prepare voices. Calling it again is a no-op.
    fn init(&mut self) -> Result<(), AudioError>;

    /// Queue a sound at `time`. `phrase_start` marks the first cell of a beat,
    /// which is played 3 dB louder.
    fn schedule_at(&mut self, time: f64, sound: Sound, phrase_start: bool) -> Result<(), AudioError>;

    /// Cancel everything queued and silence ringing voices.
    fn stop(&mut self);

    /// Drop queued hits at or after `time`. Earlier hits and voices already
    /// sounding are left alone.
    fn cancel_from(&mut self, time: f64);

    /// Switch the voices used for rhythm cells.
    fn set_sound_set(&mut self, set: SoundSet);

    /// Release all resources. The sink may be re-initialised afterwards.
    fn dispose(&mut self);
}

impl<S: AudioSink + ?Sized> AudioSink for Box<S> {
    fn init(&mut self) -> Result<(), AudioError> {
        (**self).init()
    }

    fn schedule_at(&mut self, time: f64, sound: Sound, phrase_start: bool) -> Result<(), AudioError> {
        (**self).schedule_at(time, sound, phrase_start)
    }

    fn stop(&mut self) {
        (**self).stop()
    }

    fn cancel_from(&mut self, time: f64) {
        (**self).cancel_from(time)
    }

    fn set_sound_set(&mut self, set: SoundSet) {
        (**self).set_sound_set(set)
    }

    fn dispose(&mut self) {
        (**self).dispose()
    }
}

/// A hit as received by a sink.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub time: f64,
    pub sound: Sound,
    pub phrase_start: bool,
}

/// Every call a [`RecordingSink`] has seen, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum SinkCall {
    Init,
    Schedule(Hit),
    Stop,
    CancelFrom(f64),
    SetSoundSet(SoundSet),
    Dispose,
}

/// Sink that records calls instead of producing audio.
///
/// `pending` holds hits scheduled since the last `stop`, minus cancelled ones,
/// mirroring what a real sink would still have queued.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub calls: Vec<SinkCall>,
    pub pending: Vec<Hit>,
    pub sound_set: SoundSet,
    initialized: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every hit ever scheduled, including cancelled ones.
    pub fn scheduled(&self) -> Vec<Hit> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                SinkCall::Schedule(hit) => Some(*hit),
                _ => None,
            })
            .collect()
    }

    pub fn stop_count(&self) -> usize {
        self.calls.iter().filter(|c| matches!(c, SinkCall::Stop)).count()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}

impl AudioSink for RecordingSink {
    fn init(&mut self) -> Result<(), AudioError> {
        if !self.initialized {
            self.initialized = true;
            self.calls.push(SinkCall::Init);
        }
        Ok(())
    }

    fn schedule_at(&mut self, time: f64, sound: Sound, phrase_start: bool) -> Result<(), AudioError> {
        let hit = Hit {
            time,
            sound,
            phrase_start,
        };
        self.calls.push(SinkCall::Schedule(hit));
        self.pending.push(hit);
        Ok(())
    }

    fn stop(&mut self) {
        self.calls.push(SinkCall::Stop);
        self.pending.clear();
    }

    fn cancel_from(&mut self, time: f64) {
        self.calls.push(SinkCall::CancelFrom(time));
        self.pending.retain(|hit| hit.time < time);
    }

    fn set_sound_set(&mut self, set: SoundSet) {
        self.sound_set = set;
        self.calls.push(SinkCall::SetSoundSet(set));
    }

    fn dispose(&mut self) {
        self.pending.clear();
        self.initialized = false;
        self.calls.push(SinkCall::Dispose);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        let mut sink = RecordingSink::new();
        sink.init().unwrap();
        sink.init().unwrap();
        assert_eq!(sink.calls, vec![SinkCall::Init]);
    }

    #[test]
    fn stop_clears_pending_but_keeps_history() {
        let mut sink = RecordingSink::new();
        sink.schedule_at(0.0, Sound::Click(CellState::Accent), true).unwrap();
        sink.schedule_at(0.5, Sound::Click(CellState::Soft), false).unwrap();
        sink.stop();
        assert!(sink.pending.is_empty());
        assert_eq!(sink.scheduled().len(), 2);
        assert_eq!(sink.stop_count(), 1);
    }

    #[test]
    fn cancel_keeps_earlier_hits() {
        let mut sink = RecordingSink::new();
        sink.schedule_at(0.0, Sound::Click(CellState::Accent), true).unwrap();
        sink.schedule_at(0.5, Sound::Click(CellState::Soft), false).unwrap();
        sink.cancel_from(0.5);
        assert_eq!(sink.pending.len(), 1);
        assert_eq!(sink.pending[0].time, 0.0);
        assert_eq!(sink.stop_count(), 0);
    }

    #[test]
    fn boxed_sink_forwards() {
        let mut sink: Box<dyn AudioSink> = Box::new(RecordingSink::new());
        sink.init().unwrap();
        sink.set_sound_set(SoundSet::Woodblock);
        sink.cancel_from(0.0);
        sink.stop();
        sink.dispose();
    }
}
