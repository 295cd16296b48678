//! Live output — cpal stream fed through a lock-free command queue.
//!
//! The main thread renders blocks with a [`SynthSink`] and pushes them as
//! [`EngineCommand`]s into a ring buffer. The cpal callback drains the queue,
//! applies the master volume and clamps the result below full scale.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};

use super::sink::{AudioSink, Sound};
use super::synth::SynthSink;
use super::voice::SoundSet;
use super::AudioError;

/// Ring buffer capacity, in commands.
const QUEUE_CAPACITY: usize = 1024;

/// Output never exceeds this magnitude.
pub const OUTPUT_CEILING: f32 = 0.95;

/// Consumed samples are compacted once the read position passes this.
const COMPACT_THRESHOLD: usize = 8192;

/// Messages from the main thread to the audio thread.
#[derive(Debug)]
pub enum EngineCommand {
    /// Interleaved samples to append to the playback buffer.
    Samples(Vec<f32>),
    /// Master volume, clamped to `0.0..=1.0` on arrival.
    SetVolume(f32),
    /// Drop everything buffered.
    Flush,
}

/// State owned by the cpal callback.
pub struct OutputCallback {
    commands: HeapCons<EngineCommand>,
    buffer: Vec<f32>,
    read_pos: usize,
    volume: f32,
}

impl OutputCallback {
    pub fn new(commands: HeapCons<EngineCommand>) -> Self {
        Self {
            commands,
            buffer: Vec::new(),
            read_pos: 0,
            volume: 1.0,
        }
    }

    /// Fill `output`, padding with silence on underrun.
    pub fn process(&mut self, output: &mut [f32]) {
        while let Some(cmd) = self.commands.try_pop() {
            match cmd {
                EngineCommand::Samples(data) => self.buffer.extend_from_slice(&data),
                EngineCommand::SetVolume(v) => self.volume = v.clamp(0.0, 1.0),
                EngineCommand::Flush => {
                    self.buffer.clear();
                    self.read_pos = 0;
                }
            }
        }

        let available = self.buffer.len() - self.read_pos;
        let n = output.len().min(available);
        for (out, &src) in output[..n].iter_mut().zip(&self.buffer[self.read_pos..self.read_pos + n]) {
            *out = (src * self.volume).clamp(-OUTPUT_CEILING, OUTPUT_CEILING);
        }
        output[n..].fill(0.0);
        self.read_pos += n;

        if self.read_pos >= COMPACT_THRESHOLD {
            self.buffer.drain(..self.read_pos);
            self.read_pos = 0;
        }
    }
}

/// Handle to the running output stream.
pub struct AudioEngine {
    stream: cpal::Stream,
    producer: HeapProd<EngineCommand>,
    sample_rate: u32,
    channels: u16,
}

impl AudioEngine {
    /// Open the default output device at its preferred configuration.
    pub fn new() -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(AudioError::NoOutputDevice)?;
        let config = device
            .default_output_config()
            .map_err(|e| AudioError::DeviceConfig(e.to_string()))?;

        let sample_rate = config.sample_rate().0;
        let channels = config.channels();
        let (producer, consumer) = HeapRb::<EngineCommand>::new(QUEUE_CAPACITY).split();
        let mut callback = OutputCallback::new(consumer);

        let stream_config = cpal::StreamConfig {
            channels,
            sample_rate: cpal::SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };
        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| callback.process(data),
                |err: cpal::StreamError| tracing::error!(%err, "audio stream error"),
                None,
            )
            .map_err(|e| AudioError::StreamBuild(e.to_string()))?;
        stream.play().map_err(|e| AudioError::StreamPlay(e.to_string()))?;

        tracing::info!(sample_rate, channels, "audio output opened");
        Ok(Self {
            stream,
            producer,
            sample_rate,
            channels,
        })
    }

    pub fn send_samples(&mut self, samples: Vec<f32>) -> Result<(), AudioError> {
        self.push(EngineCommand::Samples(samples))
    }

    pub fn set_volume(&mut self, volume: f32) -> Result<(), AudioError> {
        self.push(EngineCommand::SetVolume(volume))
    }

    /// Drop audio already handed to the device.
    pub fn flush(&mut self) -> Result<(), AudioError> {
        self.push(EngineCommand::Flush)
    }

    fn push(&mut self, cmd: EngineCommand) -> Result<(), AudioError> {
        self.producer.try_push(cmd).map_err(|_| AudioError::BufferFull)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn pause(&self) -> Result<(), AudioError> {
        self.stream.pause().map_err(|e| AudioError::StreamPlay(e.to_string()))
    }
}

/// A [`SynthSink`] wired to the default output device.
///
/// Call [`pump`](LiveSink::pump) once per block after advancing the scheduler.
pub struct LiveSink {
    synth: SynthSink,
    engine: AudioEngine,
}

impl LiveSink {
    pub fn open(seed: u64, volume: f32) -> Result<Self, AudioError> {
        let mut engine = AudioEngine::new()?;
        engine.set_volume(volume)?;
        let synth = SynthSink::new(engine.sample_rate(), engine.channels(), seed);
        Ok(Self { synth, engine })
    }

    pub fn sample_rate(&self) -> u32 {
        self.engine.sample_rate()
    }

    /// Render `frames` frames and queue them on the device.
    pub fn pump(&mut self, frames: usize) -> Result<(), AudioError> {
        let block = self.synth.render_block(frames);
        self.engine.send_samples(block)
    }
}

impl AudioSink for LiveSink {
    fn init(&mut self) -> Result<(), AudioError> {
        self.synth.init()
    }

    fn schedule_at(&mut self, time: f64, sound: Sound, phrase_start: bool) -> Result<(), AudioError> {
        self.synth.schedule_at(time, sound, phrase_start)
    }

    fn stop(&mut self) {
        self.synth.stop();
        if let Err(err) = self.engine.flush() {
            tracing::warn!(%err, "could not flush output");
        }
    }

    fn cancel_from(&mut self, time: f64) {
        self.synth.cancel_from(time);
    }

    fn set_sound_set(&mut self, set: SoundSet) {
        self.synth.set_sound_set(set);
    }

    fn dispose(&mut self) {
        self.stop();
        self.synth.dispose();
        if let Err(err) = self.engine.pause() {
            tracing::warn!(%err, "could not pause output");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (HeapProd<EngineCommand>, OutputCallback) {
        let (prod, cons) = HeapRb::<EngineCommand>::new(16).split();
        (prod, OutputCallback::new(cons))
    }

    #[test]
    fn silence_when_empty() {
        let (_prod, mut cb) = setup();
        let mut out = vec![9.0f32; 32];
        cb.process(&mut out);
        assert!(out.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn volume_and_ceiling() {
        let (mut prod, mut cb) = setup();
        prod.try_push(EngineCommand::SetVolume(0.5)).unwrap();
        prod.try_push(EngineCommand::Samples(vec![0.4, -0.4, 4.0, -4.0])).unwrap();
        let mut out = vec![0.0f32; 4];
        cb.process(&mut out);
        assert_eq!(out, vec![0.2, -0.2, OUTPUT_CEILING, -OUTPUT_CEILING]);
    }

    #[test]
    fn playback_continues_across_callbacks() {
        let (mut prod, mut cb) = setup();
        prod.try_push(EngineCommand::Samples(vec![0.1, 0.2, 0.3])).unwrap();
        let mut a = vec![0.0f32; 2];
        let mut b = vec![0.0f32; 2];
        cb.process(&mut a);
        cb.process(&mut b);
        assert_eq!(a, vec![0.1, 0.2]);
        assert_eq!(b, vec![0.3, 0.0]);
    }

    #[test]
    fn flush_drops_buffered_audio() {
        let (mut prod, mut cb) = setup();
        prod.try_push(EngineCommand::Samples(vec![0.5; 8])).unwrap();
        prod.try_push(EngineCommand::Flush).unwrap();
        let mut out = vec![1.0f32; 8];
        cb.process(&mut out);
        assert!(out.iter().all(|s| *s == 0.0));
    }

    #[test]
    #[ignore] // needs an output device
    fn opens_default_device() {
        let sink = LiveSink::open(0, 0.5).unwrap();
        assert!(sink.sample_rate() > 0);
    }
}
