//! Random melody generator for the fretboard exercise.

use rand::seq::SliceRandom;
use rand::Rng;

use super::note::{octave_span, MAX_ATTEMPTS};
use super::settings::{MelodySettings, Movement};
use super::{GenerateError, Melody, MelodyNote};
use crate::theory::{fret_for, semitone_distance, FretPosition, Note};

/// Largest interval, in semitones, that still counts as a step.
const STEP_LIMIT: i32 = 2;

/// Build a melody of `settings.num_notes` notes, each playable inside the fret window.
///
/// Each note is drawn as a random (pitch, octave, string) triple until its fret
/// falls inside the window and the movement rule against the previous note
/// holds. Fails with [`GenerateError::ConstraintExhausted`] when a note cannot
/// be placed within [`MAX_ATTEMPTS`] draws.
pub fn generate_melody(settings: &MelodySettings, rng: &mut impl Rng) -> Result<Melody, GenerateError> {
    if settings.strings.is_empty() || settings.available_notes.is_empty() {
        return Err(GenerateError::InvalidConfiguration("no strings or notes available"));
    }
    let octaves = octave_span(settings.base_octave, settings.octave_range)?;

    let mut notes: Vec<MelodyNote> = Vec::with_capacity(settings.num_notes);
    for index in 0..settings.num_notes {
        let previous = notes.last().map(|n| n.note);
        let placed = place_note(settings, octaves.clone(), previous, rng).ok_or(GenerateError::ConstraintExhausted {
            note_index: index,
            attempts: MAX_ATTEMPTS,
        })?;
        notes.push(placed);
    }

    Ok(Melody {
        id: rng.gen(),
        name: "Random melody".to_string(),
        difficulty: None,
        notes,
        tags: vec!["random".to_string()],
    })
}

fn place_note(
    settings: &MelodySettings,
    octaves: std::ops::Range<i8>,
    previous: Option<Note>,
    rng: &mut impl Rng,
) -> Option<MelodyNote> {
    for attempt in 1..=MAX_ATTEMPTS {
        let pitch = *settings.available_notes.choose(rng)?;
        let octave = rng.gen_range(octaves.clone());
        let string = *settings.strings.choose(rng)?;

        let Some(fret) = fret_for(pitch, octave, string) else {
            continue;
        };
        if !settings.frets.contains(fret) {
            continue;
        }
        let note = Note::new(pitch, octave);
        if let Some(prev) = previous {
            if !movement_allows(settings.movement, prev, note) {
                continue;
            }
        }
        if attempt > 1 {
            tracing::debug!(%note, attempt, "placed melody note after retries");
        }
        return Some(MelodyNote {
            note,
            position: Some(FretPosition::new(string, fret)),
        });
    }
    None
}

fn movement_allows(movement: Movement, from: Note, to: Note) -> bool {
    let interval = semitone_distance(from, to).abs();
    match movement {
        Movement::Steps => interval <= STEP_LIMIT,
        Movement::Leaps => interval > STEP_LIMIT,
        Movement::Mixed => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::FretWindow;
    use crate::theory::{GuitarString, PitchClass};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn movement_rule() {
        let e2 = Note::new(PitchClass::E, 2);
        let f2 = Note::new(PitchClass::F, 2);
        let a2 = Note::new(PitchClass::A, 2);
        assert!(movement_allows(Movement::Steps, e2, f2));
        assert!(movement_allows(Movement::Steps, e2, e2));
        assert!(!movement_allows(Movement::Steps, e2, a2));
        assert!(movement_allows(Movement::Leaps, e2, a2));
        assert!(!movement_allows(Movement::Leaps, f2, e2));
        assert!(movement_allows(Movement::Mixed, e2, a2));
    }

    #[test]
    fn notes_lie_in_fret_window_on_enabled_strings() {
        let settings = MelodySettings {
            num_notes: 8,
            frets: FretWindow { from: 2, to: 7 },
            strings: vec![GuitarString::A, GuitarString::D],
            ..MelodySettings::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..20 {
            let melody = generate_melody(&settings, &mut rng).unwrap();
            assert_eq!(melody.len(), 8);
            for n in &melody.notes {
                let pos = n.position.unwrap();
                assert!(settings.strings.contains(&pos.string));
                assert!(settings.frets.contains(pos.fret));
                assert_eq!(crate::theory::note_at(pos), n.note);
            }
        }
    }

    #[test]
    fn missing_strings_is_invalid() {
        let settings = MelodySettings {
            strings: Vec::new(),
            ..MelodySettings::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(matches!(
            generate_melody(&settings, &mut rng),
            Err(GenerateError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn octave_settings_outside_midi_range_are_invalid() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let wide: MelodySettings = serde_yaml::from_str("octave_range: 250\n").unwrap();
        assert!(matches!(
            generate_melody(&wide, &mut rng),
            Err(GenerateError::InvalidConfiguration(_))
        ));
        let low = MelodySettings { base_octave: -100, ..MelodySettings::default() };
        assert!(matches!(
            generate_melody(&low, &mut rng),
            Err(GenerateError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn impossible_window_is_exhausted() {
        // Low E string can't sound C3 below fret 8.
        let settings = MelodySettings {
            num_notes: 1,
            available_notes: vec![PitchClass::C],
            octave_range: 1,
            base_octave: 3,
            strings: vec![GuitarString::LowE],
            frets: FretWindow { from: 0, to: 3 },
            ..MelodySettings::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert_eq!(
            generate_melody(&settings, &mut rng),
            Err(GenerateError::ConstraintExhausted {
                note_index: 0,
                attempts: MAX_ATTEMPTS
            })
        );
    }

    #[test]
    fn generated_melody_is_tagged_random() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let m = generate_melody(&MelodySettings::default(), &mut rng).unwrap();
        assert_eq!(m.name, "Random melody");
        assert_eq!(m.difficulty, None);
        assert_eq!(m.tags, vec!["random".to_string()]);
    }
}
