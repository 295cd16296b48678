//! Cell states: the four dynamics a subdivision cell cycles through.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Dynamic of one subdivision cell.
///
/// Toggling walks `Accent → Normal → Soft → Mute → Accent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellState {
    Accent,
    Normal,
    Soft,
    Mute,
}

impl CellState {
    /// Toggle order.
    pub const CYCLE: [CellState; 4] = [
        CellState::Accent,
        CellState::Normal,
        CellState::Soft,
        CellState::Mute,
    ];

    /// Next state in the toggle cycle.
    pub fn next(self) -> Self {
        match self {
            CellState::Accent => CellState::Normal,
            CellState::Normal => CellState::Soft,
            CellState::Soft => CellState::Mute,
            CellState::Mute => CellState::Accent,
        }
    }

    /// Whether the cell produces a sound.
    pub fn is_audible(self) -> bool {
        self != CellState::Mute
    }

    /// Single-character symbol used by the text notation.
    pub fn symbol(self) -> char {
        match self {
            CellState::Accent => 'A',
            CellState::Normal => 'N',
            CellState::Soft => 'S',
            CellState::Mute => '.',
        }
    }

    pub fn from_symbol(c: char) -> Option<Self> {
        match c {
            'A' | 'a' => Some(CellState::Accent),
            'N' | 'n' => Some(CellState::Normal),
            'S' | 's' => Some(CellState::Soft),
            '.' | '-' => Some(CellState::Mute),
            _ => None,
        }
    }
}

impl fmt::Display for CellState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CellState::Accent => "accent",
            CellState::Normal => "normal",
            CellState::Soft => "soft",
            CellState::Mute => "mute",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_toggles_return_to_start() {
        for state in CellState::CYCLE {
            let mut s = state;
            for _ in 0..4 {
                s = s.next();
            }
            assert_eq!(s, state);
        }
    }

    #[test]
    fn toggle_order() {
        assert_eq!(CellState::Accent.next(), CellState::Normal);
        assert_eq!(CellState::Normal.next(), CellState::Soft);
        assert_eq!(CellState::Soft.next(), CellState::Mute);
        assert_eq!(CellState::Mute.next(), CellState::Accent);
    }

    #[test]
    fn only_mute_is_silent() {
        assert!(!CellState::Mute.is_audible());
        assert!(CellState::Soft.is_audible());
    }

    #[test]
    fn symbols_round_trip() {
        for s in CellState::CYCLE {
            assert_eq!(CellState::from_symbol(s.symbol()), Some(s));
        }
        assert_eq!(CellState::from_symbol('x'), None);
    }
}
