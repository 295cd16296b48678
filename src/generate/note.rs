//! Single-note generator for the interval exercise.

use rand::seq::SliceRandom;
use rand::Rng;

use super::settings::IntervalSettings;
use super::GenerateError;
use crate::theory::{Note, PitchClass};

/// Retry cap shared by all generators.
pub const MAX_ATTEMPTS: usize = 100;

/// Lowest and highest octaves a generator may produce (the MIDI note range).
const OCTAVES: std::ops::RangeInclusive<i32> = -1..=9;

/// Octaves `base .. base + range` as a checked range.
///
/// A range of zero counts as one octave. Fails when any drawn octave would
/// leave the MIDI range.
pub(crate) fn octave_span(base: i8, range: u8) -> Result<std::ops::Range<i8>, GenerateError> {
    let low = i32::from(base);
    let high = low + i32::from(range.max(1));
    match (i8::try_from(low), i8::try_from(high)) {
        (Ok(from), Ok(to)) if OCTAVES.contains(&low) && OCTAVES.contains(&(high - 1)) => Ok(from..to),
        _ => Err(GenerateError::InvalidConfiguration("octave range outside -1..=9")),
    }
}

/// Draw a random note from the enabled pitch classes.
///
/// Octaves are drawn from `base_octave .. base_octave + octave_range`. The
/// previous note is avoided for up to [`MAX_ATTEMPTS`] draws; after that the
/// repeat is accepted.
pub fn generate_note(
    settings: &IntervalSettings,
    previous: Option<Note>,
    rng: &mut impl Rng,
) -> Result<Note, GenerateError> {
    let octaves = octave_span(settings.base_octave, settings.octave_range)?;
    let mut note = draw(settings, octaves.clone(), rng)?;
    let mut attempts = 1;
    while Some(note) == previous && attempts < MAX_ATTEMPTS {
        note = draw(settings, octaves.clone(), rng)?;
        attempts += 1;
    }
    if Some(note) == previous {
        tracing::warn!(%note, "repeat avoidance exhausted, reusing previous note");
    } else if attempts > 1 {
        tracing::debug!(%note, attempts, "avoided repeating previous note");
    }
    Ok(note)
}

fn draw(settings: &IntervalSettings, octaves: std::ops::Range<i8>, rng: &mut impl Rng) -> Result<Note, GenerateError> {
    let pitch: PitchClass = *settings
        .available_notes
        .choose(rng)
        .ok_or(GenerateError::InvalidConfiguration("no notes available"))?;
    Ok(Note::new(pitch, rng.gen_range(octaves)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn notes_stay_in_range() {
        let settings = IntervalSettings {
            available_notes: vec![PitchClass::C, PitchClass::E, PitchClass::G],
            octave_range: 2,
            ..IntervalSettings::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..500 {
            let n = generate_note(&settings, None, &mut rng).unwrap();
            assert!(settings.available_notes.contains(&n.pitch));
            assert!((4..6).contains(&n.octave), "octave {} out of range", n.octave);
        }
    }

    #[test]
    fn oversized_octave_range_is_rejected() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let wide: IntervalSettings = serde_yaml::from_str("octave_range: 200\n").unwrap();
        assert!(matches!(
            generate_note(&wide, None, &mut rng),
            Err(GenerateError::InvalidConfiguration(_))
        ));
        let high = IntervalSettings { base_octave: 120, ..IntervalSettings::default() };
        assert!(matches!(
            generate_note(&high, None, &mut rng),
            Err(GenerateError::InvalidConfiguration(_))
        ));
        let top = IntervalSettings { base_octave: 8, octave_range: 2, ..IntervalSettings::default() };
        let n = generate_note(&top, None, &mut rng).unwrap();
        assert!((8..=9).contains(&n.octave));
    }

    #[test]
    fn avoids_immediate_repeat() {
        let settings = IntervalSettings {
            available_notes: vec![PitchClass::C, PitchClass::D],
            octave_range: 1,
            ..IntervalSettings::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut previous = None;
        for _ in 0..200 {
            let n = generate_note(&settings, previous, &mut rng).unwrap();
            assert_ne!(Some(n), previous);
            previous = Some(n);
        }
    }

    #[test]
    fn single_choice_accepts_repeat() {
        let settings = IntervalSettings {
            available_notes: vec![PitchClass::A],
            octave_range: 1,
            ..IntervalSettings::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let a4 = Note::new(PitchClass::A, 4);
        assert_eq!(generate_note(&settings, Some(a4), &mut rng).unwrap(), a4);
    }

    #[test]
    fn empty_note_set_is_rejected() {
        let settings = IntervalSettings {
            available_notes: Vec::new(),
            ..IntervalSettings::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert_eq!(
            generate_note(&settings, None, &mut rng),
            Err(GenerateError::InvalidConfiguration("no notes available"))
        );
    }

    #[test]
    fn seeded_runs_are_deterministic() {
        let settings = IntervalSettings::default();
        let run = || {
            let mut rng = ChaCha8Rng::seed_from_u64(99);
            (0..20)
                .map(|_| generate_note(&settings, None, &mut rng).unwrap())
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }
}
