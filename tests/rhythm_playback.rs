//! Integration tests for rhythm playback.
//!
//! Drives the scheduler against a recording sink on a virtual clock. No audio
//! hardware required.

use assert_approx_eq::assert_approx_eq;
use eartrain::audio::{RecordingSink, Sound};
use eartrain::generate::library_melody;
use eartrain::playback::{PlaybackPosition, PlaybackScheduler, Schedule};
use eartrain::rhythm::{CellState, RhythmPattern, Tempo};

const SAMPLE_RATE: u32 = 1_000;

fn scheduler() -> PlaybackScheduler<RecordingSink> {
    let mut s = PlaybackScheduler::with_sample_rate(RecordingSink::new(), SAMPLE_RATE);
    s.set_lookahead(0.0);
    s
}

fn tempo(bpm: u32) -> Tempo {
    Tempo::new(bpm).unwrap()
}

/// Advance in small steps, as an audio callback would.
fn run_for(s: &mut PlaybackScheduler<RecordingSink>, seconds: f64) {
    let steps = (seconds / 0.01).round() as usize;
    for _ in 0..steps {
        s.advance(0.01).unwrap();
    }
}

#[test]
fn one_beat_four_cells_at_sixty() {
    let pattern: RhythmPattern = "ASSS".parse().unwrap();
    let schedule = Schedule::from_pattern(&pattern, tempo(60));
    let times: Vec<f64> = schedule.events().iter().map(|e| e.time).collect();
    assert_eq!(times.len(), 4);
    for (t, expected) in times.iter().zip([0.0, 0.25, 0.5, 0.75]) {
        assert_approx_eq!(*t, expected);
    }
    assert_approx_eq!(schedule.loop_length(), 1.0);

    let mut s = scheduler();
    s.play_pattern(&pattern, tempo(60)).unwrap();
    run_for(&mut s, 0.9);
    let hits = s.sink().scheduled();
    assert_eq!(hits.len(), 4);
    assert_eq!(hits[0].sound, Sound::Click(CellState::Accent));
    assert!(hits[0].phrase_start);
    assert!(hits[1..].iter().all(|h| h.sound == Sound::Click(CellState::Soft) && !h.phrase_start));
}

#[test]
fn loop_length_is_sum_of_cell_durations() {
    for beats in 1..=16 {
        for division in 1..=8 {
            let pattern = RhythmPattern::uniform(beats, division, CellState::Normal).unwrap();
            for bpm in [40, 97, 240] {
                let schedule = Schedule::from_pattern(&pattern, tempo(bpm));
                let sum: f64 = schedule.events().iter().map(|e| e.duration).sum();
                assert_eq!(schedule.len(), beats * division);
                assert_approx_eq!(schedule.loop_length(), sum, 1e-9);
                assert_approx_eq!(schedule.loop_length(), beats as f64 * 60.0 / bpm as f64, 1e-9);
            }
        }
    }
}

#[test]
fn mixed_lengths_loop_seamlessly() {
    let mut s = scheduler();
    s.play_pattern(&"AS 0.5:AN".parse().unwrap(), tempo(60)).unwrap();
    assert_approx_eq!(s.loop_length(), 1.5);
    run_for(&mut s, 3.0);
    let times: Vec<f64> = s.sink().scheduled().iter().map(|h| h.time).collect();
    let expected = [0.0, 0.5, 1.0, 1.25, 1.5, 2.0, 2.5, 2.75, 3.0];
    assert_eq!(times.len(), expected.len());
    for (t, e) in times.iter().zip(expected) {
        assert_approx_eq!(*t, e);
    }
}

#[test]
fn rotation_keeps_time_continuous() {
    let mut s = scheduler();
    s.play_pattern(&"ASSS ANNN".parse().unwrap(), tempo(60)).unwrap();
    run_for(&mut s, 1.3); // beat 1, cell 1 sounding (1.25..1.5)

    let edited: RhythmPattern = "ASSS ANNN A".parse().unwrap();
    s.update_pattern(&edited).unwrap();

    let schedule = s.schedule();
    assert_approx_eq!(schedule.events()[0].time, 0.0);
    assert_approx_eq!(schedule.loop_length(), Schedule::from_pattern(&edited, tempo(60)).loop_length());
    assert_eq!(schedule.events()[0].position, PlaybackPosition::Cell { beat: 1, cell: 2 });

    // The next hit lands exactly where the old cell 1.2 would have.
    run_for(&mut s, 0.3);
    let last = *s.sink().scheduled().last().unwrap();
    assert_approx_eq!(last.time, 1.5);
    assert_eq!(last.sound, Sound::Click(CellState::Normal));
}

#[test]
fn tempo_change_mid_loop_never_jumps_back() {
    let mut s = scheduler();
    s.play_pattern(&"A A A A".parse().unwrap(), tempo(60)).unwrap();
    run_for(&mut s, 2.5);
    s.set_tempo(tempo(120)).unwrap();
    run_for(&mut s, 1.0);

    let hits = s.sink().scheduled();
    let times: Vec<f64> = hits.iter().map(|h| h.time).collect();
    assert!(times.windows(2).all(|w| w[1] > w[0]));
    // 0, 1, 2 at 60 BPM, then from 3.0 every half second.
    for (t, e) in times.iter().zip([0.0, 1.0, 2.0, 3.0, 3.5]) {
        assert_approx_eq!(*t, e);
    }
}

#[test]
fn muted_cells_stay_silent() {
    let mut s = scheduler();
    s.play_pattern(&"A... .N..".parse().unwrap(), tempo(120)).unwrap();
    run_for(&mut s, 0.95);
    let hits = s.sink().scheduled();
    assert_eq!(hits.len(), 2);
    assert_approx_eq!(hits[1].time, 0.625);
    assert!(!hits[1].phrase_start);
}

#[test]
fn stop_cancels_and_clears_cursor() {
    let mut s = scheduler();
    s.set_lookahead(0.5);
    s.play_pattern(&"ASSS".parse().unwrap(), tempo(60)).unwrap();
    assert!(!s.sink().pending.is_empty());
    s.stop();
    assert!(s.sink().pending.is_empty());
    assert_eq!(s.cursor(), None);
    s.stop();
    assert!(!s.is_playing());
}

#[test]
fn pattern_edit_during_melody_keeps_it_one_shot() {
    let mut s = scheduler();
    let melody = library_melody(3).clone();
    s.play_melody(&melody, tempo(60)).unwrap();
    run_for(&mut s, 0.5);
    s.update_pattern(&"ASSS".parse().unwrap()).unwrap();
    s.set_tempo(tempo(61)).unwrap();
    assert!(!s.schedule().is_looping());
    assert_eq!(s.schedule().len(), melody.len());

    run_for(&mut s, melody.len() as f64 + 0.5);
    assert!(!s.is_playing());
    assert_eq!(s.sink().scheduled().len(), melody.len());
}
