use super::{Color, Move, Outcome, Piece, Square};
use derive_more::{DebugCustom, Display, Error, From};
use proptest::sample::{Selector, SelectorStrategy};
use proptest::{prelude::*, strategy::Map};
use shakmaty as sm;
use std::{ops::Range, str::FromStr};
use test_strategy::Arbitrary;

/// Represents an illegal [`Move`] in a given [`Position`].
#[derive(Debug, Display, Clone, Eq, PartialEq, Arbitrary, Error)]
#[display(fmt = "move `{}` is illegal in this position", _0)]
pub struct IllegalMove(#[error(not(source))] pub Move);

/// The current position on the chess board.
///
/// This type guarantees that it only holds valid positions. It also keeps the
/// [zobrist hashes] of the positions played since the last irreversible move,
/// so that repetitions may be detected.
///
/// [zobrist hashes]: https://www.chessprogramming.org/Zobrist_Hashing
#[derive(DebugCustom, Display, Default, Clone, Eq, PartialEq)]
#[debug(fmt = "Position(\"{}\")", self)]
#[display(
    fmt = "{}",
    "sm::fen::Fen::from_position(self.0.clone(), sm::EnPassantMode::Legal)"
)]
pub struct Position(sm::Chess, Vec<u64>);

impl Arbitrary for Position {
    type Parameters = ();
    type Strategy = Map<(Range<usize>, SelectorStrategy), fn((usize, Selector)) -> Position>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (0..128, any::<Selector>()).prop_map(|(n, selector)| {
            let mut pos = Position::default();

            for _ in 0..n {
                match selector.try_select(pos.moves()) {
                    Some(m) if pos.play(m).is_ok() => continue,
                    _ => break,
                }
            }

            pos
        })
    }
}

impl Position {
    /// The side to move.
    pub fn turn(&self) -> Color {
        sm::Position::turn(&self.0).into()
    }

    /// The number of halfmoves since the last capture or pawn advance.
    pub fn halfmoves(&self) -> u32 {
        sm::Position::halfmoves(&self.0)
    }

    /// This position's zobrist hash.
    pub fn zobrist(&self) -> u64 {
        sm::zobrist::ZobristHash::zobrist_hash::<u64>(&self.0)
    }

    /// An iterator over all pieces on the board.
    pub fn iter(&self) -> impl Iterator<Item = (Piece, Square)> {
        sm::Position::board(&self.0)
            .clone()
            .into_iter()
            .map(|(s, p)| (p.into(), s.into()))
    }

    /// The [`Piece`] on the given [`Square`], if any.
    pub fn piece_on(&self, s: Square) -> Option<Piece> {
        sm::Position::board(&self.0)
            .piece_at(s.into())
            .map(Piece::from)
    }

    /// How many times this position has occurred since the last irreversible move.
    pub fn repetitions(&self) -> usize {
        let zobrist = self.zobrist();
        1 + self.1.iter().filter(|z| **z == zobrist).count()
    }

    /// The [`Outcome`] of the game in case this position is final.
    pub fn outcome(&self) -> Option<Outcome> {
        if sm::Position::is_checkmate(&self.0) {
            Some(Outcome::Checkmate(!self.turn()))
        } else if sm::Position::is_stalemate(&self.0) {
            Some(Outcome::Stalemate)
        } else if sm::Position::is_insufficient_material(&self.0) {
            Some(Outcome::DrawByInsufficientMaterial)
        } else if self.halfmoves() >= 150 {
            Some(Outcome::DrawBy75MoveRule)
        } else if self.repetitions() >= 5 {
            Some(Outcome::DrawByFivefoldRepetition)
        } else {
            None
        }
    }

    /// An iterator over the legal [`Move`]s that can be played in this position.
    pub fn moves(&self) -> impl Iterator<Item = Move> {
        sm::Position::legal_moves(&self.0)
            .into_iter()
            .filter_map(|vm| vm.to_uci(sm::CastlingMode::Standard).try_into().ok())
    }

    /// An iterator over the legal [`Move`]s of the piece on the given [`Square`].
    pub fn moves_from(&self, whence: Square) -> impl Iterator<Item = Move> {
        self.moves().filter(move |m| m.whence() == whence)
    }

    /// Whether the [`Move`] belongs to the set of legal moves in this position.
    pub fn is_legal(&self, m: Move) -> bool {
        self.moves().any(|l| l == m)
    }

    /// Play a [`Move`] if legal in this position.
    pub fn play(&mut self, m: Move) -> Result<(), IllegalMove> {
        let vm = sm::Position::legal_moves(&self.0)
            .into_iter()
            .find(|vm| Move::try_from(vm.to_uci(sm::CastlingMode::Standard)) == Ok(m))
            .ok_or(IllegalMove(m))?;

        if vm.is_zeroing() {
            self.1.clear();
        } else {
            let zobrist = self.zobrist();
            self.1.push(zobrist);
        }

        sm::Position::play_unchecked(&mut self.0, &vm);
        Ok(())
    }
}

/// The reason why parsing the FEN string failed.
#[derive(Debug, Display, Clone, Eq, PartialEq, Error, From)]
pub enum ParsePositionError {
    #[display(fmt = "failed to parse FEN")]
    InvalidFen(#[error(not(source))] String),
    #[display(fmt = "the FEN string describes an illegal position")]
    IllegalPosition(#[error(not(source))] sm::PositionErrorKinds),
}

impl FromStr for Position {
    type Err = ParsePositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fen: sm::fen::Fen = s
            .parse()
            .map_err(|e: sm::fen::ParseFenError| e.to_string())?;

        let chess: sm::Chess = fen
            .into_position(sm::CastlingMode::Standard)
            .map_err(|e| e.kinds())?;

        Ok(Position(chess, Vec::new()))
    }
}
