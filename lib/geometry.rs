use crate::chess::{Promotion, Square};
use crate::opponent::Difficulty;
use derive_more::{Constructor, Display, Error};
use serde::{Deserialize, Serialize};

/// Height of the information panel below the board.
const INFO_PANEL_HEIGHT: u32 = 80;

/// Size of the buttons on the board screen.
const BUTTON: (u32, u32) = (120, 40);

/// Size of the buttons on the menu screen.
const MENU_BUTTON: (u32, u32) = (150, 50);

/// Size of each button in the promotion panel.
const PROMOTION_BUTTON: (u32, u32) = (60, 50);

const MARGIN: u32 = 15;

/// Converts a length in pixels to a screen coordinate.
fn px(len: u32) -> i32 {
    i32::try_from(len).unwrap_or(i32::MAX)
}

/// A position on the screen, in pixels.
#[derive(Debug, Display, Default, Copy, Clone, Eq, PartialEq, Hash, Constructor)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
#[display(fmt = "({}, {})", x, y)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// An axis-aligned rectangle on the screen.
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Hash, Constructor)]
#[display(fmt = "{}x{}+{}+{}", width, height, x, y)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn center(&self) -> Point {
        Point::new(
            self.x.saturating_add(px(self.width / 2)),
            self.y.saturating_add(px(self.height / 2)),
        )
    }

    /// Whether the point lies inside, edges on the right and bottom excluded.
    pub fn contains(&self, p: Point) -> bool {
        let (x, y) = (i64::from(p.x), i64::from(p.y));
        let (left, top) = (i64::from(self.x), i64::from(self.y));
        left <= x && x < left + i64::from(self.width) && top <= y && y < top + i64::from(self.height)
    }
}

/// A clickable control outside of the board.
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
pub enum Button {
    #[display(fmt = "{}", "_0.label().map_or_else(|| format!(\"Level {}\", _0), String::from)")]
    Difficulty(Difficulty),
    #[display(fmt = "Restart")]
    Restart,
    #[display(fmt = "Quit")]
    Quit,
}

/// Where the board, the promotion panel and the buttons are on the screen.
///
/// The board is centered horizontally and sits above the information panel,
/// with the white pieces at the bottom.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
#[serde(deny_unknown_fields, default)]
pub struct Layout {
    /// Width of the screen.
    #[cfg_attr(test, strategy(640u32..4096))]
    pub width: u32,

    /// Height of the screen.
    #[cfg_attr(test, strategy(720u32..4096))]
    pub height: u32,

    /// Side of each square of the board.
    #[cfg_attr(test, strategy(8u32..=80))]
    pub square: u32,
}

impl Default for Layout {
    fn default() -> Self {
        Layout {
            width: 1024,
            height: 1024,
            square: 80,
        }
    }
}

/// The reason why a [`Layout`] can't be drawn.
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Hash, Error)]
pub enum InvalidLayout {
    #[display(fmt = "the screen must be between 1 and 16384 pixels on each side")]
    Extent,

    #[display(fmt = "the side of each square must be at least 1 pixel")]
    EmptySquare,

    #[display(fmt = "the board and the information panel do not fit on the screen")]
    Overflow,
}

impl Layout {
    /// The largest supported width or height of the screen.
    pub const MAX_EXTENT: u32 = 16384;

    /// Checks that the board and the information panel fit on the screen.
    pub fn validate(&self) -> Result<(), InvalidLayout> {
        let extent = 1..=Self::MAX_EXTENT;
        if !extent.contains(&self.width) || !extent.contains(&self.height) {
            return Err(InvalidLayout::Extent);
        }

        if self.square == 0 {
            return Err(InvalidLayout::EmptySquare);
        }

        let size = self.square.checked_mul(8).ok_or(InvalidLayout::Overflow)?;
        if size > self.width || size.saturating_add(INFO_PANEL_HEIGHT) > self.height {
            return Err(InvalidLayout::Overflow);
        }

        Ok(())
    }

    /// The area covered by the board.
    pub fn board(&self) -> Rect {
        let size = self.square.saturating_mul(8);
        Rect::new(
            px(self.width.saturating_sub(size) / 2),
            px(self.height.saturating_sub(size.saturating_add(INFO_PANEL_HEIGHT)) / 2),
            size,
            size,
        )
    }

    /// The panel below the board where the game status is shown.
    pub fn info_panel(&self) -> Rect {
        let board = self.board();
        Rect::new(
            0,
            board.y.saturating_add(px(board.height)),
            self.width,
            INFO_PANEL_HEIGHT,
        )
    }

    /// The [`Square`] under the point, if any.
    pub fn square_at(&self, p: Point) -> Option<Square> {
        let board = self.board();
        if self.square == 0 || !board.contains(p) {
            return None;
        }

        let file = p.x.abs_diff(board.x) / self.square;
        let row = p.y.abs_diff(board.y) / self.square;
        Square::new(file.try_into().ok()?, 7u8.checked_sub(row.try_into().ok()?)?)
    }

    /// The area covered by the [`Square`].
    pub fn square_rect(&self, s: Square) -> Rect {
        let board = self.board();
        let offset = |n: u8| px(u32::from(n).saturating_mul(self.square));
        Rect::new(
            board.x.saturating_add(offset(s.file())),
            board.y.saturating_add(offset(7 - s.rank())),
            self.square,
            self.square,
        )
    }

    /// The buttons offering each [`Promotion`] choice, along the top of the board.
    pub fn promotion_buttons(&self) -> impl Iterator<Item = (Promotion, Rect)> {
        let board = self.board();
        let (w, h) = PROMOTION_BUTTON;
        let width = w * Promotion::CHOICES.len() as u32;
        let x = board.x.saturating_add((px(board.width) - px(width)) / 2);

        Promotion::CHOICES
            .into_iter()
            .enumerate()
            .map(move |(i, p)| (p, Rect::new(x + px(i as u32 * w), board.y, w, h)))
    }

    /// The [`Promotion`] choice under the point, if any.
    pub fn promotion_at(&self, p: Point) -> Option<Promotion> {
        self.promotion_buttons()
            .find(|(_, r)| r.contains(p))
            .map(|(c, _)| c)
    }

    /// The buttons on the menu screen or on the board screen.
    pub fn buttons(&self, menu: bool) -> Vec<(Button, Rect)> {
        let mut buttons = Vec::new();
        let (width, height) = (px(self.width), px(self.height));

        if menu {
            let (w, h) = MENU_BUTTON;
            let total = Difficulty::PRESETS.len() as u32 * (h + MARGIN);
            let x = width / 2 - px(w / 2);
            let y = height / 2 - px(total / 2);

            for (i, d) in Difficulty::PRESETS.into_iter().enumerate() {
                let r = Rect::new(x, y + px(i as u32 * (h + MARGIN)), w, h);
                buttons.push((Button::Difficulty(d), r));
            }
        } else {
            let (w, h) = BUTTON;
            let y = height - px(h + MARGIN);
            let r = Rect::new(px(self.width.saturating_sub(w) / 2), y, w, h);
            buttons.push((Button::Restart, r));
        }

        let (w, h) = BUTTON;
        let quit = Rect::new(width - px(w + MARGIN), height - px(h + MARGIN), w, h);

        buttons.push((Button::Quit, quit));
        buttons
    }

    /// The [`Button`] under the point, if any.
    pub fn button_at(&self, p: Point, menu: bool) -> Option<Button> {
        self.buttons(menu)
            .into_iter()
            .find(|(_, r)| r.contains(p))
            .map(|(b, _)| b)
    }
}
