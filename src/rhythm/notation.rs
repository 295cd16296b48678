//! Compact text notation for patterns, used on the command line.
//!
//! Beats are separated by whitespace and written `[length:]cells`, one symbol
//! per cell: `A` accent, `N` normal, `S` soft, `.` mute. The length defaults
//! to 1. For example `ASSS 0.5:AS 2:ANNN` is a quarter with four
//! subdivisions, a half-length beat with two, and a double-length beat with
//! four.

use std::fmt;
use std::str::FromStr;

use super::cell::CellState;
use super::pattern::{Beat, FillPolicy, RhythmPattern, DEFAULT_LENGTH};
use super::PatternError;

impl FromStr for RhythmPattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let beats = s
            .split_whitespace()
            .map(parse_beat)
            .collect::<Result<Vec<_>, _>>()?;
        RhythmPattern::new(beats, FillPolicy::AccentFirst)
    }
}

fn parse_beat(token: &str) -> Result<Beat, PatternError> {
    let (length, cells) = match token.split_once(':') {
        Some((len, cells)) => {
            let len: f64 = len
                .parse()
                .map_err(|_| PatternError::Notation(format!("bad beat length in '{token}'")))?;
            (len, cells)
        }
        None => (DEFAULT_LENGTH, token),
    };
    let cells = cells
        .chars()
        .map(|c| {
            CellState::from_symbol(c)
                .ok_or_else(|| PatternError::Notation(format!("unknown cell symbol '{c}' in '{token}'")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Beat::new(length, cells)
}

impl fmt::Display for RhythmPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, beat) in self.beats().iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            if beat.length() != DEFAULT_LENGTH {
                write!(f, "{}:", beat.length())?;
            }
            for cell in beat.cells() {
                write!(f, "{}", cell.symbol())?;
            }
        }
        Ok(())
    }
}
