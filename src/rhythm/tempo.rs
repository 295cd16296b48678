//! Tempo: bounded BPM, Italian tempo markings, and the time-signature list.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Slowest accepted tempo.
pub const BPM_MIN: u16 = 40;
/// Fastest accepted tempo.
pub const BPM_MAX: u16 = 240;

/// Time signatures offered by the rhythm explorer.
pub const TIME_SIGNATURES: [&str; 8] = ["2/4", "3/4", "4/4", "5/4", "6/8", "7/8", "9/8", "12/8"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TempoError {
    #[error("tempo {0} BPM is outside 40..=240")]
    OutOfRange(u32),
}

/// Beats per minute, always inside `BPM_MIN..=BPM_MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Tempo(u16);

impl Tempo {
    pub fn new(bpm: u32) -> Result<Self, TempoError> {
        if (BPM_MIN as u32..=BPM_MAX as u32).contains(&bpm) {
            Ok(Self(bpm as u16))
        } else {
            Err(TempoError::OutOfRange(bpm))
        }
    }

    /// Clamp any value into the accepted range.
    pub fn clamped(bpm: u32) -> Self {
        Self(bpm.clamp(BPM_MIN as u32, BPM_MAX as u32) as u16)
    }

    pub fn bpm(self) -> u16 {
        self.0
    }

    /// Length of one beat in seconds.
    pub fn beat_seconds(self) -> f64 {
        60.0 / self.0 as f64
    }

    /// Italian marking for this tempo.
    pub fn marking(self) -> &'static str {
        tempo_marking(self.0 as u32)
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self(90)
    }
}

impl TryFrom<u32> for Tempo {
    type Error = TempoError;

    fn try_from(bpm: u32) -> Result<Self, Self::Error> {
        Self::new(bpm)
    }
}

impl From<Tempo> for u32 {
    fn from(t: Tempo) -> Self {
        t.0 as u32
    }
}

impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} BPM", self.0)
    }
}

const MARKINGS: [(&str, u32, u32); 8] = [
    ("Largo", 40, 60),
    ("Larghetto", 60, 66),
    ("Adagio", 66, 76),
    ("Andante", 76, 108),
    ("Moderato", 108, 120),
    ("Allegro", 120, 168),
    ("Presto", 168, 200),
    ("Prestissimo", 200, 240),
];

/// First marking whose inclusive range holds `bpm`; "Andante" when none does.
pub fn tempo_marking(bpm: u32) -> &'static str {
    MARKINGS
        .iter()
        .find(|(_, min, max)| bpm >= *min && bpm <= *max)
        .map(|(name, _, _)| *name)
        .unwrap_or("Andante")
}

/// Numerator of a `"n/d"` time signature.
pub fn time_signature_beats(signature: &str) -> Option<usize> {
    let (num, den) = signature.split_once('/')?;
    let den: usize = den.trim().parse().ok()?;
    if den == 0 {
        return None;
    }
    num.trim().parse().ok().filter(|&n| n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds() {
        assert!(Tempo::new(40).is_ok());
        assert!(Tempo::new(240).is_ok());
        assert_eq!(Tempo::new(39), Err(TempoError::OutOfRange(39)));
        assert_eq!(Tempo::new(241), Err(TempoError::OutOfRange(241)));
        assert_eq!(Tempo::clamped(10).bpm(), 40);
        assert_eq!(Tempo::clamped(1000).bpm(), 240);
    }

    #[test]
    fn markings_use_first_match() {
        assert_eq!(tempo_marking(40), "Largo");
        assert_eq!(tempo_marking(60), "Largo");
        assert_eq!(tempo_marking(61), "Larghetto");
        assert_eq!(tempo_marking(100), "Andante");
        assert_eq!(tempo_marking(120), "Moderato");
        assert_eq!(tempo_marking(121), "Allegro");
        assert_eq!(tempo_marking(240), "Prestissimo");
    }

    #[test]
    fn marking_fallback() {
        assert_eq!(tempo_marking(20), "Andante");
        assert_eq!(tempo_marking(300), "Andante");
    }

    #[test]
    fn beat_seconds() {
        assert!((Tempo::new(120).unwrap().beat_seconds() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn signatures() {
        for sig in TIME_SIGNATURES {
            assert!(time_signature_beats(sig).is_some());
        }
        assert_eq!(time_signature_beats("7/8"), Some(7));
        assert_eq!(time_signature_beats("0/4"), None);
        assert_eq!(time_signature_beats("4"), None);
        assert_eq!(time_signature_beats("4/0"), None);
    }

    #[test]
    fn serde_rejects_out_of_range() {
        assert!(serde_yaml::from_str::<Tempo>("300").is_err());
        assert_eq!(serde_yaml::from_str::<Tempo>("72").unwrap().bpm(), 72);
    }
}
