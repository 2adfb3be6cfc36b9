use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ScoreError;

/// One of the two teams in a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::A, Side::B];

    pub fn opponent(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::A => "A",
            Side::B => "B",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = ScoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "A" | "a" => Ok(Side::A),
            "B" | "b" => Ok(Side::B),
            other => Err(ScoreError::Validation(format!(
                "unknown side {:?}, expected \"A\" or \"B\"",
                other
            ))),
        }
    }
}

/// A value kept for each side.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidePair<T> {
    pub a: T,
    pub b: T,
}

impl<T> SidePair<T> {
    pub fn new(a: T, b: T) -> Self {
        SidePair { a, b }
    }

    pub fn get(&self, side: Side) -> &T {
        match side {
            Side::A => &self.a,
            Side::B => &self.b,
        }
    }

    pub fn get_mut(&mut self, side: Side) -> &mut T {
        match side {
            Side::A => &mut self.a,
            Side::B => &mut self.b,
        }
    }
}

impl<T: Copy> SidePair<T> {
    pub fn of(&self, side: Side) -> T {
        *self.get(side)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_side_identifiers() {
        assert_eq!("A".parse::<Side>().unwrap(), Side::A);
        assert_eq!(" b ".parse::<Side>().unwrap(), Side::B);
        assert!(matches!(
            "C".parse::<Side>(),
            Err(ScoreError::Validation(msg)) if msg.contains("\"C\"")
        ));
    }

    #[test]
    fn pair_indexing() {
        let mut points = SidePair::new(24u32, 23);
        *points.get_mut(Side::B) += 2;
        assert_eq!(points.of(Side::A), 24);
        assert_eq!(points.of(Side::B), 25);
        assert_eq!(Side::A.opponent(), Side::B);
    }
}
