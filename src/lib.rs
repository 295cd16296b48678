//! Eartrain: ear-training and rhythm practice for guitarists.
//!
//! Note and melody generators, a subdivision sequencer with a look-ahead
//! playback scheduler, fretboard theory and preset storage. Audio goes through
//! the [`audio::AudioSink`] seam so everything above it runs headless.

pub mod audio;
pub mod config;
pub mod exercise;
pub mod generate;
pub mod playback;
pub mod preset;
pub mod rhythm;
pub mod theory;
