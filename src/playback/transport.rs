//! Transport state — play/stop control and drift-free clock advancement.
//!
//! Position is kept as a whole number of sample frames at a fixed rate, with a
//! fractional-frame remainder carried between calls, so many small `advance_by`
//! steps land exactly where one large step would.

/// Default clock resolution when no audio device dictates one.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayState {
    Stopped,
    Playing,
}

/// The shared playback clock.
#[derive(Debug)]
pub struct Transport {
    sample_rate: u32,
    state: PlayState,
    position_frames: u64,
    frame_remainder: f64,
}

impl Transport {
    /// A stopped transport at position zero.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate: sample_rate.max(1),
            state: PlayState::Stopped,
            position_frames: 0,
            frame_remainder: 0.0,
        }
    }

    pub fn play(&mut self) {
        self.state = PlayState::Playing;
    }

    pub fn stop(&mut self) {
        self.state = PlayState::Stopped;
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlayState::Playing
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Current position in seconds.
    pub fn position(&self) -> f64 {
        self.position_frames as f64 / self.sample_rate as f64
    }

    pub fn position_frames(&self) -> u64 {
        self.position_frames
    }

    /// Advance by `num_frames` frames. Returns the covered `[from, to)` range in
    /// seconds, or `None` while stopped.
    pub fn advance_by_frames(&mut self, num_frames: u64) -> Option<(f64, f64)> {
        if self.state == PlayState::Stopped {
            return None;
        }
        let from = self.position();
        self.position_frames += num_frames;
        Some((from, self.position()))
    }

    /// Advance by `seconds` of wall-clock time. Negative or non-finite input is ignored.
    pub fn advance_by(&mut self, seconds: f64) -> Option<(f64, f64)> {
        if self.state == PlayState::Stopped {
            return None;
        }
        let frames = self.frames_for(seconds);
        self.advance_by_frames(frames)
    }

    /// Move the clock by `seconds` whatever the play state, so an idle
    /// transport stays in step with an output device that keeps running.
    pub fn skip(&mut self, seconds: f64) {
        let frames = self.frames_for(seconds);
        self.position_frames += frames;
    }

    fn frames_for(&mut self, seconds: f64) -> u64 {
        let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
        let total = self.frame_remainder + seconds * self.sample_rate as f64;
        let whole = total.floor();
        self.frame_remainder = total - whole;
        whole as u64
    }
}

impl Default for Transport {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE)
    }
}
