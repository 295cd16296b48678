//! Tap tempo: derive BPM from the spacing of the last few taps.

use std::collections::VecDeque;
use std::time::Duration;

use crate::rhythm::{Tempo, BPM_MAX, BPM_MIN};

/// Taps kept for averaging.
pub const MAX_TAPS: usize = 4;
/// Taps older than this, measured from the newest tap, are forgotten.
pub const TAP_WINDOW: Duration = Duration::from_secs(3);

/// Collects tap timestamps and turns them into a tempo.
#[derive(Debug, Clone, Default)]
pub struct TapTempo {
    taps: VecDeque<Duration>,
}

impl TapTempo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tap at `at` (any monotonic clock offset).
    ///
    /// Returns the new tempo when at least two taps are held and the averaged
    /// BPM lies inside the accepted range; otherwise `None`.
    pub fn tap(&mut self, at: Duration) -> Option<Tempo> {
        self.taps.push_back(at);
        while self.taps.len() > MAX_TAPS {
            self.taps.pop_front();
        }
        while let Some(&oldest) = self.taps.front() {
            if at.saturating_sub(oldest) > TAP_WINDOW {
                self.taps.pop_front();
            } else {
                break;
            }
        }
        self.tempo()
    }

    /// Tempo implied by the held taps, if any.
    pub fn tempo(&self) -> Option<Tempo> {
        if self.taps.len() < 2 {
            return None;
        }
        let first = *self.taps.front()?;
        let last = *self.taps.back()?;
        let mean_ms = last.saturating_sub(first).as_secs_f64() * 1000.0 / (self.taps.len() - 1) as f64;
        if mean_ms <= 0.0 {
            return None;
        }
        let bpm = (60_000.0 / mean_ms).round();
        if bpm >= BPM_MIN as f64 && bpm <= BPM_MAX as f64 {
            Tempo::new(bpm as u32).ok()
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.taps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }

    pub fn reset(&mut self) {
        self.taps.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn three_taps_half_second_apart_is_120() {
        let mut tap = TapTempo::new();
        assert_eq!(tap.tap(ms(0)), None);
        assert_eq!(tap.tap(ms(500)).map(Tempo::bpm), Some(120));
        assert_eq!(tap.tap(ms(1000)).map(Tempo::bpm), Some(120));
    }

    #[test]
    fn keeps_only_last_four() {
        let mut tap = TapTempo::new();
        for t in [0, 1000, 2000, 2500, 3000, 3500] {
            tap.tap(ms(t));
        }
        assert_eq!(tap.len(), 4);
        assert_eq!(tap.tempo().map(Tempo::bpm), Some(120));
    }

    #[test]
    fn rounds_to_nearest_bpm() {
        let mut tap = TapTempo::new();
        tap.tap(ms(0));
        // 60000 / 700 = 85.71
        assert_eq!(tap.tap(ms(700)).map(Tempo::bpm), Some(86));
    }

    #[test]
    fn out_of_range_is_ignored() {
        let mut tap = TapTempo::new();
        tap.tap(ms(0));
        // 60000 / 200 = 300 BPM
        assert_eq!(tap.tap(ms(200)), None);
        assert_eq!(tap.len(), 2);
    }

    #[test]
    fn stale_taps_are_pruned() {
        let mut tap = TapTempo::new();
        tap.tap(ms(0));
        tap.tap(ms(500));
        // Long pause: the first two fall out of the window
        assert_eq!(tap.tap(ms(5000)), None);
        assert_eq!(tap.len(), 1);
        assert_eq!(tap.tap(ms(5600)).map(Tempo::bpm), Some(100));
    }
}
