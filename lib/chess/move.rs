use super::{Promotion, Square};
use derive_more::{Constructor, Display, Error};
use shakmaty as sm;
use std::str::FromStr;
use test_strategy::Arbitrary;
use vampirc_uci::UciMove;

/// A chess move in [pure coordinate notation].
///
/// [pure coordinate notation]: https://www.chessprogramming.org/Algebraic_Chess_Notation#Pure_coordinate_notation
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Hash, Arbitrary, Constructor)]
#[filter(#self.0 != #self.1)]
#[display(fmt = "{}{}{}", _0, _1, _2)]
pub struct Move(Square, Square, Promotion);

impl Move {
    /// The source [`Square`].
    pub fn whence(&self) -> Square {
        self.0
    }

    /// The destination [`Square`].
    pub fn whither(&self) -> Square {
        self.1
    }

    /// The [`Promotion`] specifier.
    pub fn promotion(&self) -> Promotion {
        self.2
    }

    /// Whether this move promotes a pawn.
    pub fn is_promotion(&self) -> bool {
        self.promotion() != Promotion::None
    }
}

/// The reason why the string is not a valid move.
#[derive(Debug, Display, Clone, Eq, PartialEq, Error)]
#[display(fmt = "failed to parse move")]
pub struct ParseMoveError;

impl FromStr for Move {
    type Err = ParseMoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<sm::uci::Uci>()
            .map_err(|_| ParseMoveError)?
            .try_into()
    }
}

#[doc(hidden)]
impl TryFrom<UciMove> for Move {
    type Error = ParseMoveError;

    fn try_from(m: UciMove) -> Result<Self, Self::Error> {
        Ok(Move(
            m.from.try_into().map_err(|_| ParseMoveError)?,
            m.to.try_into().map_err(|_| ParseMoveError)?,
            m.promotion.into(),
        ))
    }
}

#[doc(hidden)]
impl From<Move> for UciMove {
    fn from(m: Move) -> Self {
        UciMove {
            from: m.whence().into(),
            to: m.whither().into(),
            promotion: m.promotion().into(),
        }
    }
}

#[doc(hidden)]
impl TryFrom<sm::uci::Uci> for Move {
    type Error = ParseMoveError;

    fn try_from(m: sm::uci::Uci) -> Result<Self, Self::Error> {
        match m {
            sm::uci::Uci::Normal {
                from,
                to,
                promotion,
            } => Ok(Move(from.into(), to.into(), promotion.into())),

            _ => Err(ParseMoveError),
        }
    }
}

#[doc(hidden)]
impl From<Move> for sm::uci::Uci {
    fn from(m: Move) -> Self {
        sm::uci::Uci::Normal {
            from: m.whence().into(),
            to: m.whither().into(),
            promotion: m.promotion().into(),
        }
    }
}
