use crate::chess::{Color, Move, Position, Square};
use arrayvec::ArrayVec;

/// The most squares a single piece may ever move to.
const MAX_DESTINATIONS: usize = 27;

/// The piece the human player is about to move, if any.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub enum Selection {
    #[default]
    None,
    /// The square of the selected piece and the squares it may move to.
    Selected(Square, ArrayVec<Square, MAX_DESTINATIONS>),
}

/// The effect of a click on the [`Selection`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Transition {
    /// Nothing changed.
    Ignored,
    /// A piece was selected, possibly replacing another.
    Selected(Square),
    /// The selection was cleared.
    Deselected,
    /// A fully specified legal move is ready to be played.
    Commit(Move),
    /// A legal pawn move awaits the choice of the promoted piece.
    Promote(Square, Square),
}

impl Selection {
    /// The selected square, if any.
    pub fn square(&self) -> Option<Square> {
        match self {
            Selection::None => None,
            Selection::Selected(s, _) => Some(*s),
        }
    }

    /// The squares the selected piece may move to.
    pub fn destinations(&self) -> &[Square] {
        match self {
            Selection::None => &[],
            Selection::Selected(_, ds) => ds.as_slice(),
        }
    }

    /// Clears the selection.
    pub fn clear(&mut self) {
        *self = Selection::None;
    }

    fn select(pos: &Position, whence: Square) -> Self {
        let mut destinations = ArrayVec::new();
        for m in pos.moves_from(whence) {
            if !destinations.contains(&m.whither()) {
                destinations.push(m.whither());
            }
        }

        Selection::Selected(whence, destinations)
    }

    /// Updates the selection after a click on the [`Square`], if any, by the `side` player.
    pub fn click(&mut self, pos: &Position, side: Color, square: Option<Square>) -> Transition {
        let target = match square {
            Some(s) => s,
            None => return Transition::Ignored,
        };

        let owned = pos.piece_on(target).map_or(false, |p| p.color() == side);

        match self {
            Selection::None if owned => {
                *self = Self::select(pos, target);
                Transition::Selected(target)
            }

            Selection::None => Transition::Ignored,

            Selection::Selected(whence, _) if *whence == target => {
                self.clear();
                Transition::Deselected
            }

            Selection::Selected(_, _) if owned => {
                *self = Self::select(pos, target);
                Transition::Selected(target)
            }

            Selection::Selected(whence, destinations) if destinations.contains(&target) => {
                let whence = *whence;
                let candidates: ArrayVec<Move, 4> = pos
                    .moves_from(whence)
                    .filter(|m| m.whither() == target)
                    .take(4)
                    .collect();

                self.clear();

                match candidates.first() {
                    Some(m) if m.is_promotion() => Transition::Promote(whence, target),
                    Some(m) => Transition::Commit(*m),
                    None => Transition::Deselected,
                }
            }

            Selection::Selected(_, _) => {
                self.clear();
                Transition::Deselected
            }
        }
    }
}
