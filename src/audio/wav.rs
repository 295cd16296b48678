//! Offline bounce: render playback to a buffer or a 32-bit float WAV file.

use std::path::Path;

use super::synth::SynthSink;
use super::tone::TONE_ENVELOPE;
use super::voice::SoundSet;
use super::{AudioError, AudioSink};
use crate::generate::Melody;
use crate::playback::{PlaybackError, PlaybackScheduler};
use crate::rhythm::{RhythmPattern, Tempo};

/// Frames rendered per step when bouncing.
const BOUNCE_BLOCK: usize = 512;

/// Write interleaved samples as IEEE float WAV.
pub fn export_wav(path: &Path, samples: &[f32], sample_rate: u32, channels: u16) -> Result<(), AudioError> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &s in samples {
        writer.write_sample(s)?;
    }
    writer.finalize()?;
    tracing::info!(path = %path.display(), frames = samples.len() / channels.max(1) as usize, "wav written");
    Ok(())
}

/// Render `loops` passes of `pattern` as mono samples.
pub fn render_pattern(
    pattern: &RhythmPattern,
    tempo: Tempo,
    sound_set: SoundSet,
    loops: u32,
    sample_rate: u32,
    seed: u64,
) -> Result<Vec<f32>, PlaybackError> {
    let mut scheduler = bouncer(sample_rate, seed, sound_set)?;
    scheduler.play_pattern(pattern, tempo)?;
    let seconds = scheduler.loop_length() * loops.max(1) as f64;
    let out = run(&mut scheduler, seconds)?;
    scheduler.stop();
    Ok(out)
}

/// Render one pass of `melody`, release tail included, as mono samples.
pub fn render_melody(melody: &Melody, tempo: Tempo, sample_rate: u32) -> Result<Vec<f32>, PlaybackError> {
    let mut scheduler = bouncer(sample_rate, 0, SoundSet::default())?;
    scheduler.play_melody(melody, tempo)?;
    let seconds = scheduler.loop_length() + TONE_ENVELOPE.release;
    run(&mut scheduler, seconds)
}

fn bouncer(sample_rate: u32, seed: u64, set: SoundSet) -> Result<PlaybackScheduler<SynthSink>, PlaybackError> {
    let mut sink = SynthSink::new(sample_rate, 1, seed);
    sink.set_sound_set(set);
    let mut scheduler = PlaybackScheduler::with_sample_rate(sink, sample_rate);
    scheduler.init()?;
    Ok(scheduler)
}

fn run(scheduler: &mut PlaybackScheduler<SynthSink>, seconds: f64) -> Result<Vec<f32>, PlaybackError> {
    let sample_rate = scheduler.sink().sample_rate();
    let total = (seconds * sample_rate as f64).round() as usize;
    let mut out = Vec::with_capacity(total);
    while out.len() < total {
        let frames = BOUNCE_BLOCK.min(total - out.len());
        scheduler.advance(frames as f64 / sample_rate as f64)?;
        out.extend(scheduler.sink_mut().render_block(frames));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::library_melody;

    #[test]
    fn bounce_length_matches_loops() {
        let pattern: RhythmPattern = "ASSS".parse().unwrap();
        let out = render_pattern(&pattern, Tempo::new(120).unwrap(), SoundSet::ClassicClick, 2, 8000, 1).unwrap();
        assert_eq!(out.len(), 8000);
    }

    #[test]
    fn melody_bounce_includes_release() {
        let out = render_melody(library_melody(0), Tempo::new(60).unwrap(), 8000).unwrap();
        assert_eq!(out.len(), 12_000);
        assert!(out.iter().any(|s| s.abs() > 0.05));
    }

    #[test]
    fn writes_readable_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("click.wav");
        export_wav(&path, &[0.0, 0.5, -0.5, 0.25], 8000, 2).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().channels, 2);
        assert_eq!(reader.spec().sample_rate, 8000);
        let samples: Vec<f32> = reader.into_samples::<f32>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![0.0, 0.5, -0.5, 0.25]);
    }
}
