use derive_more::{Display, Error};
use shakmaty as sm;
use std::{fmt, str::FromStr};
use test_strategy::Arbitrary;
use vampirc_uci::UciSquare;

/// A square on the chess board.
///
/// Files and ranks are numbered from `0` to `7`, starting at `a1`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Arbitrary)]
pub struct Square(#[strategy(0u8..64)] u8);

impl Square {
    /// Constructs [`Square`] from a pair of file and rank, if both are in range.
    pub fn new(file: u8, rank: u8) -> Option<Self> {
        if file < 8 && rank < 8 {
            Some(Square(file | rank << 3))
        } else {
            None
        }
    }

    /// This square's file, `0` for the a-file.
    pub fn file(&self) -> u8 {
        self.0 & 0b111
    }

    /// This square's rank, `0` for the first rank.
    pub fn rank(&self) -> u8 {
        self.0 >> 3
    }

    /// An iterator over all squares, from `a1` to `h8`.
    pub fn iter() -> impl DoubleEndedIterator<Item = Self> + ExactSizeIterator {
        (0..64).map(Square)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.file()) as char, self.rank() + 1)
    }
}

/// The reason why parsing [`Square`] failed.
#[derive(Debug, Display, Clone, Eq, PartialEq, Error)]
#[display(fmt = "failed to parse square")]
pub struct ParseSquareError;

impl FromStr for Square {
    type Err = ParseSquareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some(f @ 'a'..='h'), Some(r @ '1'..='8'), None) => {
                Square::new(f as u8 - b'a', r as u8 - b'1').ok_or(ParseSquareError)
            }

            _ => Err(ParseSquareError),
        }
    }
}

#[doc(hidden)]
impl From<sm::Square> for Square {
    fn from(s: sm::Square) -> Self {
        Square(s as u8)
    }
}

#[doc(hidden)]
impl From<Square> for sm::Square {
    fn from(s: Square) -> Self {
        sm::Square::new(s.0.into())
    }
}

#[doc(hidden)]
impl From<Square> for UciSquare {
    fn from(s: Square) -> Self {
        UciSquare::from((b'a' + s.file()) as char, s.rank() + 1)
    }
}

#[doc(hidden)]
impl TryFrom<UciSquare> for Square {
    type Error = ParseSquareError;

    fn try_from(s: UciSquare) -> Result<Self, Self::Error> {
        match (s.file, s.rank) {
            (f @ 'a'..='h', r @ 1..=8) => Square::new(f as u8 - b'a', r - 1).ok_or(ParseSquareError),
            _ => Err(ParseSquareError),
        }
    }
}
