//! Playback scheduler — turns patterns and melodies into timed sink triggers.
//!
//! The [`PlaybackScheduler`] owns its [`AudioSink`] and a [`Transport`]. The
//! caller drives time with [`advance`](PlaybackScheduler::advance); each step
//! first hands every hit due within the lookahead window to the sink, then
//! fires cursor updates whose time has passed.
//!
//! Edits while playing never touch queued hits in place: the sink is told to
//! cancel everything, the schedule is rebuilt, and it is rotated so playback
//! continues with the cell after the one currently sounding.

pub mod schedule;
pub mod tap;
pub mod timeline;
pub mod transport;

pub use schedule::{PlaybackPosition, Schedule, ScheduledEvent, TONE_FRACTION};
pub use tap::TapTempo;
pub use timeline::{Timed, Timeline};
pub use transport::{PlayState, Transport, DEFAULT_SAMPLE_RATE};

use crate::audio::{AudioError, AudioSink, SoundSet};
use crate::generate::Melody;
use crate::rhythm::{RhythmPattern, Tempo};

/// Default audio lookahead, in seconds.
pub const DEFAULT_LOOKAHEAD: f64 = 0.1;

/// Tolerance when deciding whether a cursor update is due.
const TIME_EPSILON: f64 = 1e-9;

#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error(transparent)]
    Audio(#[from] AudioError),
    #[error("nothing to play")]
    EmptySchedule,
}

/// Cursor change delivered to the listener.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CursorEvent {
    Enter(PlaybackPosition),
    Clear,
}

#[derive(Debug, Clone, Copy)]
struct CursorUpdate {
    time: f64,
    event: CursorEvent,
}

impl Timed for CursorUpdate {
    fn time(&self) -> f64 {
        self.time
    }
}

#[derive(Debug, Clone)]
enum Source {
    Pattern(RhythmPattern),
    Melody(Melody),
}

type CursorListener = Box<dyn FnMut(CursorEvent)>;

/// Single-owner playback engine. Not shared across threads.
pub struct PlaybackScheduler<S: AudioSink> {
    sink: S,
    transport: Transport,
    tempo: Tempo,
    lookahead: f64,
    source: Option<Source>,
    schedule: Schedule,
    /// Absolute time at which `schedule` offset zero starts.
    origin: f64,
    /// Position of the cell that ends at `origin`, after a rotation.
    anchor: Option<PlaybackPosition>,
    /// Events dispatched since `origin`, counted across loop iterations.
    dispatched: u64,
    cursor_queue: Timeline<CursorUpdate>,
    cursor: Option<PlaybackPosition>,
    listener: Option<CursorListener>,
}

impl<S: AudioSink> PlaybackScheduler<S> {
    pub fn new(sink: S) -> Self {
        Self::with_sample_rate(sink, DEFAULT_SAMPLE_RATE)
    }

    /// Clock resolution should match the sink's sample rate when it renders audio.
    pub fn with_sample_rate(sink: S, sample_rate: u32) -> Self {
        Self {
            sink,
            transport: Transport::new(sample_rate),
            tempo: Tempo::default(),
            lookahead: DEFAULT_LOOKAHEAD,
            source: None,
            schedule: Schedule::from_pattern(&RhythmPattern::advanced_default(), Tempo::default()),
            origin: 0.0,
            anchor: None,
            dispatched: 0,
            cursor_queue: Timeline::new(),
            cursor: None,
            listener: None,
        }
    }

    pub fn set_lookahead(&mut self, seconds: f64) {
        self.lookahead = seconds.max(0.0);
    }

    /// Register a callback for cursor changes.
    pub fn on_cursor(&mut self, listener: impl FnMut(CursorEvent) + 'static) {
        self.listener = Some(Box::new(listener));
    }

    /// Initialise the sink. Safe to call repeatedly.
    pub fn init(&mut self) -> Result<(), PlaybackError> {
        self.sink.init()?;
        Ok(())
    }

    /// Start looping `pattern` at `tempo`, replacing anything already playing.
    pub fn play_pattern(&mut self, pattern: &RhythmPattern, tempo: Tempo) -> Result<(), PlaybackError> {
        let schedule = Schedule::from_pattern(pattern, tempo);
        self.start(Source::Pattern(pattern.clone()), schedule, tempo)
    }

    /// Play `melody` once, one note per beat.
    pub fn play_melody(&mut self, melody: &Melody, tempo: Tempo) -> Result<(), PlaybackError> {
        let schedule = Schedule::from_melody(melody, tempo);
        self.start(Source::Melody(melody.clone()), schedule, tempo)
    }

    fn start(&mut self, source: Source, schedule: Schedule, tempo: Tempo) -> Result<(), PlaybackError> {
        if schedule.is_empty() {
            return Err(PlaybackError::EmptySchedule);
        }
        self.stop();
        self.sink.init()?;

        self.tempo = tempo;
        self.source = Some(source);
        self.schedule = schedule;
        self.origin = self.transport.position();
        self.anchor = None;
        self.dispatched = 0;
        self.transport.play();

        tracing::info!(
            events = self.schedule.len(),
            loop_length = self.schedule.loop_length(),
            bpm = tempo.bpm(),
            "playback started"
        );
        self.dispatch()?;
        self.fire_cursor_updates();
        Ok(())
    }

    /// Replace the pattern. While a pattern is playing, playback continues
    /// seamlessly from the cell after the one sounding now. A playing melody
    /// is left alone.
    pub fn update_pattern(&mut self, pattern: &RhythmPattern) -> Result<(), PlaybackError> {
        match self.source {
            Some(Source::Melody(_)) if self.is_playing() => {
                tracing::debug!("pattern edit ignored while a melody plays");
                Ok(())
            }
            Some(Source::Pattern(_)) if self.is_playing() => {
                self.source = Some(Source::Pattern(pattern.clone()));
                self.reschedule()
            }
            _ => {
                self.source = Some(Source::Pattern(pattern.clone()));
                Ok(())
            }
        }
    }

    /// Change the tempo. Applied immediately to a playing pattern; melodies pick
    /// it up on their next playback.
    pub fn set_tempo(&mut self, tempo: Tempo) -> Result<(), PlaybackError> {
        self.tempo = tempo;
        if self.is_playing() && matches!(self.source, Some(Source::Pattern(_))) {
            self.reschedule()?;
        }
        Ok(())
    }

    /// Switch rhythm voices. Queued hits are re-issued so they use the new set.
    pub fn set_sound_set(&mut self, set: SoundSet) -> Result<(), PlaybackError> {
        self.sink.set_sound_set(set);
        if self.is_playing() && matches!(self.source, Some(Source::Pattern(_))) {
            self.reschedule()?;
        }
        Ok(())
    }

    /// Cancel queued hits after the sounding cell and rebuild the schedule from the current source,
    /// rotated to continue after the cell sounding now.
    fn reschedule(&mut self) -> Result<(), PlaybackError> {
        let Some(Source::Pattern(pattern)) = &self.source else {
            return Ok(());
        };
        let rebuilt = Schedule::from_pattern(pattern, self.tempo);
        let now = self.transport.position();

        let (sounding, sounding_end, next) = match self.sounding_at(now) {
            Some((index, end)) => {
                let events = self.schedule.events();
                let next = events[(index + 1) % events.len()].position;
                (Some(events[index].position), end, next)
            }
            // Still inside the cell that precedes `origin`, or nothing has sounded yet.
            None => (self.anchor, self.origin, self.schedule.events()[0].position),
        };

        let start = match rebuilt.find(next) {
            Some(i) => i,
            None => {
                tracing::debug!(?next, "next cell no longer exists, restarting from the top");
                0
            }
        };
        tracing::debug!(start, ?sounding, resume_at = sounding_end, "rescheduling");

        // The sounding cell keeps ringing; only what follows it is replaced.
        self.sink.cancel_from(sounding_end - TIME_EPSILON);
        self.cursor_queue.truncate_from(sounding_end - TIME_EPSILON);

        self.schedule = rebuilt.rotate(start);
        self.origin = sounding_end;
        self.anchor = sounding;
        self.dispatched = 0;
        self.dispatch()?;
        Ok(())
    }

    /// Index and absolute end time of the schedule event sounding at `now`.
    fn sounding_at(&self, now: f64) -> Option<(usize, f64)> {
        let elapsed = now - self.origin;
        let length = self.schedule.loop_length();
        if elapsed < 0.0 || length <= 0.0 {
            return None;
        }
        let iteration = if self.schedule.is_looping() {
            (elapsed / length).floor()
        } else {
            0.0
        };
        let index = self.schedule.index_at(elapsed - iteration * length)?;
        let event = &self.schedule.events()[index];
        Some((index, self.origin + iteration * length + event.time + event.duration))
    }

    /// Stop playback. Idempotent.
    pub fn stop(&mut self) {
        let was_playing = self.is_playing();
        self.sink.stop();
        self.transport.stop();
        self.cursor_queue.clear();
        self.anchor = None;
        self.dispatched = 0;
        if self.cursor.take().is_some() {
            self.emit(CursorEvent::Clear);
        }
        if was_playing {
            tracing::info!("playback stopped");
        }
    }

    /// Advance the clock by `seconds`, dispatching due audio first, then cursor updates.
    ///
    /// The clock keeps running while stopped, as the sink's does.
    pub fn advance(&mut self, seconds: f64) -> Result<(), PlaybackError> {
        if self.transport.advance_by(seconds).is_none() {
            self.transport.skip(seconds);
            return Ok(());
        }
        self.dispatch()?;
        self.fire_cursor_updates();

        if !self.schedule.is_looping()
            && self.dispatched as usize >= self.schedule.len()
            && self.transport.position() + TIME_EPSILON >= self.origin + self.schedule.loop_length()
        {
            self.finish();
        }
        Ok(())
    }

    /// End a one-shot schedule. Voices already sounding ring out.
    fn finish(&mut self) {
        self.transport.stop();
        self.cursor_queue.clear();
        self.dispatched = 0;
        if self.cursor.take().is_some() {
            self.emit(CursorEvent::Clear);
        }
        tracing::info!("playback finished");
    }

    /// Hand every event starting before `now + lookahead` to the sink.
    fn dispatch(&mut self) -> Result<(), PlaybackError> {
        let len = self.schedule.len() as u64;
        if len == 0 || self.schedule.loop_length() <= 0.0 {
            return Ok(());
        }
        let now = self.transport.position();
        let horizon = now + self.lookahead;
        let length = self.schedule.loop_length();
        loop {
            if !self.schedule.is_looping() && self.dispatched >= len {
                break;
            }
            let iteration = self.dispatched / len;
            let event = self.schedule.events()[(self.dispatched % len) as usize];
            let at = self.origin + iteration as f64 * length + event.time;
            if at >= horizon && at > now + TIME_EPSILON {
                break;
            }
            if let Some(sound) = event.sound {
                self.sink.schedule_at(at, sound, event.phrase_start)?;
            }
            self.cursor_queue.insert(CursorUpdate {
                time: at,
                event: CursorEvent::Enter(event.position),
            });
            self.cursor_queue.insert(CursorUpdate {
                time: at + event.duration / 2.0,
                event: CursorEvent::Clear,
            });
            self.dispatched += 1;
        }
        Ok(())
    }

    fn fire_cursor_updates(&mut self) {
        let now = self.transport.position();
        for update in self.cursor_queue.drain_until(now + TIME_EPSILON) {
            self.cursor = match update.event {
                CursorEvent::Enter(pos) => Some(pos),
                CursorEvent::Clear => None,
            };
            self.emit(update.event);
        }
    }

    fn emit(&mut self, event: CursorEvent) {
        if let Some(listener) = self.listener.as_mut() {
            listener(event);
        }
    }

    /// Currently highlighted cell or note.
    pub fn cursor(&self) -> Option<PlaybackPosition> {
        self.cursor
    }

    pub fn is_playing(&self) -> bool {
        self.transport.is_playing()
    }

    /// Current transport time in seconds.
    pub fn now(&self) -> f64 {
        self.transport.position()
    }

    /// The active schedule, rotated if an edit happened mid-playback.
    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn loop_length(&self) -> f64 {
        self.schedule.loop_length()
    }

    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Stop, release the sink's resources, and hand it back.
    pub fn dispose(mut self) -> S {
        self.stop();
        self.sink.dispose();
        self.sink
    }
}
