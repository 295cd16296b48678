//! Software sink: renders scheduled hits into interleaved sample blocks.
//!
//! Hits are held in a time-ordered queue and mixed into the block that
//! contains their start time. Voices longer than the block spill into an
//! overlap buffer that is mixed into the following blocks.

use super::sink::{AudioSink, Hit, Sound};
use super::tone::render_tone;
use super::voice::{SoundSet, VoiceBank};
use super::AudioError;
use crate::playback::{Timed, Timeline};

impl Timed for Hit {
    fn time(&self) -> f64 {
        self.time
    }
}

/// Sink that synthesizes every hit in software.
///
/// Its clock starts at zero and moves only when blocks are rendered, so it
/// must be driven alongside the scheduler's transport.
#[derive(Debug)]
pub struct SynthSink {
    sample_rate: u32,
    channels: u16,
    seed: u64,
    sound_set: SoundSet,
    bank: Option<VoiceBank>,
    pending: Timeline<Hit>,
    overlap: Vec<f32>,
    position_frames: u64,
}

impl SynthSink {
    pub fn new(sample_rate: u32, channels: u16, seed: u64) -> Self {
        Self {
            sample_rate: sample_rate.max(1),
            channels: channels.max(1),
            seed,
            sound_set: SoundSet::default(),
            bank: None,
            pending: Timeline::new(),
            overlap: Vec::new(),
            position_frames: 0,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sound_set(&self) -> SoundSet {
        self.sound_set
    }

    /// Sink clock in seconds.
    pub fn position(&self) -> f64 {
        self.position_frames as f64 / self.sample_rate as f64
    }

    /// Hits queued but not yet rendered.
    pub fn pending(&self) -> usize {
        self.pending.remaining()
    }

    /// Render the next `frames` frames. Hits whose time has already passed
    /// play at the start of the block.
    pub fn render_block(&mut self, frames: usize) -> Vec<f32> {
        let channels = self.channels as usize;
        let block_samples = frames * channels;
        let mut output = vec![0.0f32; block_samples];

        let overlap_len = self.overlap.len().min(block_samples);
        for (out, &ovl) in output[..overlap_len].iter_mut().zip(&self.overlap[..overlap_len]) {
            *out += ovl;
        }
        self.overlap.drain(..overlap_len);

        let block_start = self.position_frames;
        self.position_frames += frames as u64;
        let block_end = self.position();

        for hit in self.pending.drain_until(block_end) {
            let Some(mono) = self.render_hit(&hit) else {
                continue;
            };
            let start_frame = (hit.time * self.sample_rate as f64).round().max(0.0) as u64;
            let offset = start_frame.saturating_sub(block_start) as usize * channels;

            for (i, &s) in mono.iter().enumerate() {
                for c in 0..channels {
                    let pos = offset + i * channels + c;
                    if pos < block_samples {
                        output[pos] += s;
                    } else {
                        let spill = pos - block_samples;
                        if spill >= self.overlap.len() {
                            self.overlap.resize(spill + 1, 0.0);
                        }
                        self.overlap[spill] += s;
                    }
                }
            }
        }

        output
    }

    /// Render `seconds` worth of frames.
    pub fn render_seconds(&mut self, seconds: f64) -> Vec<f32> {
        let frames = (seconds.max(0.0) * self.sample_rate as f64).round() as usize;
        self.render_block(frames)
    }

    fn render_hit(&self, hit: &Hit) -> Option<Vec<f32>> {
        match hit.sound {
            Sound::Click(state) => {
                let bank = self.bank.as_ref()?;
                let gain = bank.gain(state, hit.phrase_start)?;
                let voice = bank.voice(state)?;
                Some(voice.iter().map(|s| s * gain).collect())
            }
            Sound::Tone { note, duration } => Some(render_tone(note, duration, self.sample_rate)),
        }
    }
}

impl AudioSink for SynthSink {
    fn init(&mut self) -> Result<(), AudioError> {
        if self.bank.is_none() {
            self.bank = Some(VoiceBank::new(self.sound_set, self.sample_rate, self.seed));
        }
        Ok(())
    }

    fn schedule_at(&mut self, time: f64, sound: Sound, phrase_start: bool) -> Result<(), AudioError> {
        if self.bank.is_none() {
            return Err(AudioError::NotInitialized);
        }
        self.pending.insert(Hit {
            time,
            sound,
            phrase_start,
        });
        Ok(())
    }

    fn stop(&mut self) {
        self.pending.clear();
        self.overlap.clear();
    }

    fn cancel_from(&mut self, time: f64) {
        let dropped = self.pending.truncate_from(time);
        if dropped > 0 {
            tracing::trace!(dropped, time, "cancelled queued hits");
        }
    }

    fn set_sound_set(&mut self, set: SoundSet) {
        if self.sound_set == set {
            return;
        }
        self.sound_set = set;
        if self.bank.is_some() {
            self.bank = Some(VoiceBank::new(set, self.sample_rate, self.seed));
        }
    }

    fn dispose(&mut self) {
        self.stop();
        self.bank = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rhythm::CellState;
    use crate::theory::{Note, PitchClass};

    const SR: u32 = 1000;

    fn sink() -> SynthSink {
        let mut s = SynthSink::new(SR, 2, 3);
        s.init().unwrap();
        s
    }

    fn first_nonzero(block: &[f32]) -> Option<usize> {
        block.iter().position(|s| *s != 0.0)
    }

    #[test]
    fn schedule_before_init_fails() {
        let mut s = SynthSink::new(SR, 1, 0);
        let err = s.schedule_at(0.0, Sound::Click(CellState::Accent), false);
        assert!(matches!(err, Err(AudioError::NotInitialized)));
    }

    #[test]
    fn hit_lands_at_its_frame() {
        let mut s = SynthSink::new(SR, 1, 0);
        s.init().unwrap();
        s.set_sound_set(SoundSet::ElectronicBeep);
        s.schedule_at(0.05, Sound::Click(CellState::Accent), false).unwrap();
        let block = s.render_block(100);
        // Sine starts near zero, so the first audible frame is just after 50.
        let first = first_nonzero(&block).unwrap();
        assert!((50..53).contains(&first), "first at {first}");
        assert_eq!(s.pending(), 0);
    }

    #[test]
    fn future_hits_wait_for_their_block() {
        let mut s = sink();
        s.schedule_at(0.15, Sound::Click(CellState::Normal), false).unwrap();
        assert!(s.render_block(100).iter().all(|x| *x == 0.0));
        assert_eq!(s.pending(), 1);
        assert!(s.render_block(100).iter().any(|x| *x != 0.0));
    }

    #[test]
    fn long_voices_spill_into_next_block() {
        let mut s = sink();
        s.schedule_at(0.0, Sound::Tone { note: Note::new(PitchClass::A, 4), duration: 0.5 }, false)
            .unwrap();
        s.render_block(100);
        let next = s.render_block(100);
        assert!(next.iter().any(|x| x.abs() > 0.01));
    }

    #[test]
    fn stereo_frames_are_duplicated() {
        let mut s = sink();
        s.schedule_at(0.0, Sound::Click(CellState::Accent), true).unwrap();
        let block = s.render_block(50);
        for frame in block.chunks_exact(2) {
            assert_eq!(frame[0], frame[1]);
        }
    }

    #[test]
    fn stop_silences_ringing_and_queued() {
        let mut s = sink();
        s.schedule_at(0.0, Sound::Tone { note: Note::new(PitchClass::C, 4), duration: 1.0 }, false)
            .unwrap();
        s.schedule_at(0.5, Sound::Click(CellState::Accent), false).unwrap();
        s.render_block(100);
        s.stop();
        assert_eq!(s.pending(), 0);
        assert!(s.render_block(1000).iter().all(|x| *x == 0.0));
    }

    #[test]
    fn cancel_lets_ringing_voice_finish() {
        let mut s = sink();
        s.schedule_at(0.0, Sound::Tone { note: Note::new(PitchClass::C, 4), duration: 1.0 }, false)
            .unwrap();
        s.schedule_at(0.5, Sound::Click(CellState::Accent), false).unwrap();
        s.render_block(100);
        s.cancel_from(0.2);
        assert_eq!(s.pending(), 0);
        assert!(s.render_block(100).iter().any(|x| x.abs() > 0.01));
    }

    #[test]
    fn phrase_start_is_louder() {
        let peak = |phrase| {
            let mut s = sink();
            s.schedule_at(0.0, Sound::Click(CellState::Soft), phrase).unwrap();
            s.render_block(200).iter().fold(0.0f32, |m, x| m.max(x.abs()))
        };
        assert!(peak(true) > peak(false));
    }

    #[test]
    fn clock_follows_rendered_frames() {
        let mut s = sink();
        s.render_seconds(0.25);
        s.render_block(250);
        assert!((s.position() - 0.5).abs() < 1e-9);
    }
}
