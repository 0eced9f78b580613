use crate::chess::{IllegalMove, Move, Position, Promotion, Square};
use derive_more::{Constructor, Display};

/// A pawn move awaiting the choice of the promoted piece.
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Hash, Constructor)]
#[display(fmt = "{}{}?", whence, whither)]
pub struct PendingPromotion {
    whence: Square,
    whither: Square,
}

impl PendingPromotion {
    /// The square the pawn moves from.
    pub fn whence(&self) -> Square {
        self.whence
    }

    /// The square the pawn moves to.
    pub fn whither(&self) -> Square {
        self.whither
    }

    /// The complete [`Move`] promoting to the chosen piece, if legal in the [`Position`].
    pub fn choose(&self, pos: &Position, choice: Promotion) -> Result<Move, IllegalMove> {
        let m = Move::new(self.whence, self.whither, choice);

        if pos.is_legal(m) {
            Ok(m)
        } else {
            Err(IllegalMove(m))
        }
    }
}
