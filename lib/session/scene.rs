use super::{Conclusion, Notice, Turn};
use crate::chess::{Move, Piece, Promotion, Square};
use crate::geometry::{Button, Layout, Point, Rect};

/// A piece to be drawn centered at a point on the screen.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Sprite {
    pub piece: Piece,
    pub center: Point,
    /// Whether the piece is gliding to its destination.
    pub moving: bool,
}

/// What the difficulty menu looks like.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct MenuView {
    pub buttons: Vec<(Button, Rect)>,
    /// Whether the opponent is ready to play.
    pub ready: bool,
}

/// What the board screen looks like.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct BoardView {
    pub layout: Layout,
    pub sprites: Vec<Sprite>,
    pub selected: Option<Square>,
    pub destinations: Vec<Square>,
    pub last: Option<Move>,
    /// The choices offered while a promotion is pending.
    pub promotion: Vec<(Promotion, Rect)>,
    pub turn: Turn,
    pub conclusion: Option<Conclusion>,
    /// Shown alongside the status for as long as it's set.
    pub notice: Option<Notice>,
    pub buttons: Vec<(Button, Rect)>,
}

impl BoardView {
    /// The [`Sprite`] drawn over the [`Square`], if any.
    pub fn sprite_on(&self, s: Square) -> Option<&Sprite> {
        let rect = self.layout.square_rect(s);
        self.sprites.iter().rev().find(|x| rect.contains(x.center))
    }

    /// A one-line summary of the state of the game.
    pub fn status(&self) -> String {
        match &self.conclusion {
            Some(c) => format!("Game over: {}", c),
            None if !self.promotion.is_empty() => "Choose a piece to promote to".into(),
            None => format!("Turn: {}", self.turn),
        }
    }
}

/// The draw commands for a single frame.
#[derive(Debug, Clone, Eq, PartialEq)]
#[allow(clippy::large_enum_variant)]
pub enum Scene {
    Menu(MenuView),
    Board(BoardView),
}
