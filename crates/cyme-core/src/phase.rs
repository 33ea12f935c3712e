//! Phase bit-sets.
//!
//! CYME encodes the phases of a section or device as a small integer code
//! (`1` = A, `4` = AB, `7` = ABC, ...), while GridLAB-D uses phase letters.
//! [`PhaseSet`] is the bitwise form used in between: accumulation on nodes is
//! a plain bitwise OR, so it is associative, commutative and idempotent.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

/// One conductor of a distribution circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    A,
    B,
    C,
    N,
}

impl Phase {
    pub const LIVE: [Phase; 3] = [Phase::A, Phase::B, Phase::C];

    pub fn letter(self) -> char {
        match self {
            Phase::A => 'A',
            Phase::B => 'B',
            Phase::C => 'C',
            Phase::N => 'N',
        }
    }

    /// Position of a live phase in the positive sequence (A = 1, B = 2, C = 3).
    pub fn sequence_number(self) -> Option<u8> {
        match self {
            Phase::A => Some(1),
            Phase::B => Some(2),
            Phase::C => Some(3),
            Phase::N => None,
        }
    }

    fn bit(self) -> u8 {
        match self {
            Phase::A => 0b0001,
            Phase::B => 0b0010,
            Phase::C => 0b0100,
            Phase::N => 0b1000,
        }
    }
}

/// Set of phases stored as bit flags (A = 1, B = 2, C = 4, N = 8).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PhaseSet(u8);

impl PhaseSet {
    pub const EMPTY: PhaseSet = PhaseSet(0);
    pub const A: PhaseSet = PhaseSet(0b0001);
    pub const B: PhaseSet = PhaseSet(0b0010);
    pub const C: PhaseSet = PhaseSet(0b0100);
    pub const N: PhaseSet = PhaseSet(0b1000);
    pub const ABC: PhaseSet = PhaseSet(0b0111);
    pub const ABCN: PhaseSet = PhaseSet(0b1111);

    /// Decode a CYME phase code. Code `0` means all phases including neutral.
    pub fn from_cyme_code(code: i64) -> Option<Self> {
        let set = match code {
            0 => PhaseSet::ABCN,
            1 => PhaseSet::A,
            2 => PhaseSet::B,
            3 => PhaseSet::C,
            4 => PhaseSet::A | PhaseSet::B,
            5 => PhaseSet::A | PhaseSet::C,
            6 => PhaseSet::B | PhaseSet::C,
            7 => PhaseSet::ABC,
            _ => return None,
        };
        Some(set)
    }

    /// Parse phase letters such as `"ABC"` or `"BN"`. Case-insensitive;
    /// returns `None` on any character that is not a phase letter.
    pub fn parse(text: &str) -> Option<Self> {
        let mut set = PhaseSet::EMPTY;
        for ch in text.chars() {
            let phase = match ch.to_ascii_uppercase() {
                'A' => Phase::A,
                'B' => Phase::B,
                'C' => Phase::C,
                'N' => Phase::N,
                _ => return None,
            };
            set.insert(phase);
        }
        Some(set)
    }

    pub fn insert(&mut self, phase: Phase) {
        self.0 |= phase.bit();
    }

    pub fn contains(self, phase: Phase) -> bool {
        self.0 & phase.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Live phases only (neutral dropped).
    pub fn live(self) -> Self {
        PhaseSet(self.0 & PhaseSet::ABC.0)
    }

    pub fn with_neutral(self) -> Self {
        PhaseSet(self.0 | PhaseSet::N.0)
    }

    /// Number of live phases.
    pub fn live_count(self) -> usize {
        self.live().0.count_ones() as usize
    }

    /// Live phases in A, B, C order.
    pub fn live_phases(self) -> impl Iterator<Item = Phase> {
        Phase::LIVE.into_iter().filter(move |p| self.contains(*p))
    }

    /// Phase letters in A, B, C, N order.
    pub fn letters(self) -> String {
        self.to_string()
    }
}

impl BitOr for PhaseSet {
    type Output = PhaseSet;

    fn bitor(self, rhs: PhaseSet) -> PhaseSet {
        PhaseSet(self.0 | rhs.0)
    }
}

impl BitOrAssign for PhaseSet {
    fn bitor_assign(&mut self, rhs: PhaseSet) {
        self.0 |= rhs.0;
    }
}

impl From<Phase> for PhaseSet {
    fn from(phase: Phase) -> Self {
        PhaseSet(phase.bit())
    }
}

impl FromIterator<PhaseSet> for PhaseSet {
    fn from_iter<I: IntoIterator<Item = PhaseSet>>(iter: I) -> Self {
        iter.into_iter().fold(PhaseSet::EMPTY, |acc, p| acc | p)
    }
}

impl fmt::Display for PhaseSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for phase in [Phase::A, Phase::B, Phase::C, Phase::N] {
            if self.contains(phase) {
                write!(f, "{}", phase.letter())?;
            }
        }
        Ok(())
    }
}
