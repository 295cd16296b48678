//! Audio — sink seam, rhythm voices, tone synthesis, live output and WAV bounce.
//!
//! The playback scheduler talks only to the [`AudioSink`] trait. [`SynthSink`]
//! renders hits in software; [`LiveSink`] pipes those renders to the default
//! output device through a lock-free queue; [`RecordingSink`] just records.

pub mod engine;
pub mod sink;
pub mod synth;
pub mod tone;
pub mod voice;
pub mod wav;

pub use engine::{AudioEngine, EngineCommand, LiveSink, OutputCallback, OUTPUT_CEILING};
pub use sink::{AudioSink, Hit, RecordingSink, SinkCall, Sound};
pub use synth::SynthSink;
pub use tone::{render_tone, AdsrEnvelope, TONE_ENVELOPE};
pub use voice::{db_to_gain, SoundSet, UnknownSoundSet, VoiceBank, PHRASE_BOOST_DB};
pub use wav::{export_wav, render_melody, render_pattern};

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("no audio output device found")]
    NoOutputDevice,
    #[error("device config error: {0}")]
    DeviceConfig(String),
    #[error("stream build error: {0}")]
    StreamBuild(String),
    #[error("stream play error: {0}")]
    StreamPlay(String),
    /// The audio thread is not draining fast enough.
    #[error("audio command ring buffer is full")]
    BufferFull,
    #[error("audio sink used before init")]
    NotInitialized,
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
}
