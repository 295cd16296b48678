//! Built-in melody library, ordered from easiest to hardest.

use std::sync::OnceLock;

use super::{Melody, MelodyNote};
use crate::theory::{FretPosition, GuitarString, Note, PitchClass};

struct Entry {
    id: u64,
    name: &'static str,
    difficulty: u8,
    notes: &'static [(PitchClass, i8, GuitarString, u8)],
    tags: &'static [&'static str],
}

use GuitarString::{LowE, A, D, G};
use PitchClass::{C as Cn, D as Dn, E as En, F as Fn, G as Gn, A as An};

const ENTRIES: &[Entry] = &[
    Entry {
        id: 1,
        name: "Single note - E string",
        difficulty: 1,
        notes: &[(Fn, 2, LowE, 1)],
        tags: &["beginner", "single-note"],
    },
    Entry {
        id: 2,
        name: "Two notes - ascending step",
        difficulty: 1,
        notes: &[(En, 2, LowE, 0), (Fn, 2, LowE, 1)],
        tags: &["beginner", "two-notes", "steps"],
    },
    Entry {
        id: 3,
        name: "Two notes - descending step",
        difficulty: 1,
        notes: &[(Fn, 2, LowE, 1), (En, 2, LowE, 0)],
        tags: &["beginner", "two-notes", "steps"],
    },
    Entry {
        id: 4,
        name: "Three notes - ascending",
        difficulty: 2,
        notes: &[(En, 2, LowE, 0), (Fn, 2, LowE, 1), (Gn, 2, LowE, 3)],
        tags: &["beginner", "three-notes", "steps"],
    },
    Entry {
        id: 5,
        name: "Three notes - descending",
        difficulty: 2,
        notes: &[(Gn, 2, LowE, 3), (Fn, 2, LowE, 1), (En, 2, LowE, 0)],
        tags: &["beginner", "three-notes", "steps"],
    },
    Entry {
        id: 6,
        name: "Simple triad - C major",
        difficulty: 3,
        notes: &[(Cn, 3, A, 3), (En, 3, D, 2), (Gn, 3, G, 0)],
        tags: &["intermediate", "triadic", "diatonic"],
    },
    Entry {
        id: 7,
        name: "Four notes - up and down",
        difficulty: 3,
        notes: &[(En, 2, LowE, 0), (Fn, 2, LowE, 1), (Gn, 2, LowE, 3), (Fn, 2, LowE, 1)],
        tags: &["intermediate", "four-notes", "pattern"],
    },
    Entry {
        id: 8,
        name: "Cross-string pattern",
        difficulty: 4,
        notes: &[(En, 2, LowE, 0), (An, 2, A, 0), (Dn, 3, D, 0)],
        tags: &["intermediate", "cross-string", "open-strings"],
    },
    Entry {
        id: 9,
        name: "Simple scale fragment",
        difficulty: 4,
        notes: &[(Cn, 3, A, 3), (Dn, 3, A, 5), (En, 3, A, 7), (Fn, 3, A, 8)],
        tags: &["intermediate", "scale", "diatonic"],
    },
    Entry {
        id: 10,
        name: "Octave leap",
        difficulty: 5,
        notes: &[(En, 2, LowE, 0), (En, 3, D, 2)],
        tags: &["advanced", "leaps", "octaves"],
    },
];

/// The full library. Built once on first use.
pub fn library() -> &'static [Melody] {
    static LIBRARY: OnceLock<Vec<Melody>> = OnceLock::new();
    LIBRARY.get_or_init(|| ENTRIES.iter().map(build).collect())
}

/// Library melody for question `index`, wrapping past the end.
pub fn library_melody(index: usize) -> &'static Melody {
    let lib = library();
    &lib[index % lib.len()]
}

fn build(entry: &Entry) -> Melody {
    Melody {
        id: entry.id,
        name: entry.name.to_string(),
        difficulty: Some(entry.difficulty),
        notes: entry
            .notes
            .iter()
            .map(|&(pitch, octave, string, fret)| MelodyNote {
                note: Note::new(pitch, octave),
                position: Some(FretPosition::new(string, fret)),
            })
            .collect(),
        tags: entry.tags.iter().map(|t| t.to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theory::note_at;

    #[test]
    fn ten_entries() {
        assert_eq!(library().len(), 10);
    }

    #[test]
    fn index_wraps() {
        assert_eq!(library_melody(0).id, 1);
        assert_eq!(library_melody(11).id, 2);
        assert_eq!(library_melody(20).id, 1);
    }

    #[test]
    fn every_position_sounds_its_note() {
        for melody in library() {
            for n in &melody.notes {
                let pos = n.position.unwrap();
                assert_eq!(note_at(pos), n.note, "{} in '{}'", n.note, melody.name);
            }
        }
    }

    #[test]
    fn difficulty_never_decreases() {
        let lib = library();
        assert!(lib.windows(2).all(|w| w[0].difficulty <= w[1].difficulty));
    }
}
