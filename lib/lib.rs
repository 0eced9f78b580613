/// Chess domain types.
pub mod chess;
/// Pieces gliding across the board.
pub mod animation;
/// Where things are on the screen.
pub mod geometry;
/// The automated side of the game.
pub mod opponent;
/// The interactive game session.
pub mod session;
