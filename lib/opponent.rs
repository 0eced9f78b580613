use crate::chess::{Move, Position};
use async_trait::async_trait;
use derive_more::{Display, Error};
use std::{str::FromStr, time::Duration};
use test_strategy::Arbitrary;

mod coordinator;

pub use coordinator::*;

/// How strong the opponent plays, as the engine's skill level.
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Arbitrary)]
pub struct Difficulty(#[strategy(0u8..=Difficulty::MAX.0)] u8);

impl Difficulty {
    pub const EASY: Self = Difficulty(1);
    pub const MEDIUM: Self = Difficulty(8);
    pub const HARD: Self = Difficulty(15);
    pub const MAX: Self = Difficulty(20);

    /// The levels offered on the menu.
    pub const PRESETS: [Self; 4] = [Self::EASY, Self::MEDIUM, Self::HARD, Self::MAX];

    /// Constructs [`Difficulty`], saturating at [`Difficulty::MAX`].
    pub fn new(level: u8) -> Self {
        Difficulty(level.min(Self::MAX.0))
    }

    /// The skill level.
    pub fn get(&self) -> u8 {
        self.0
    }

    /// The name of the preset, if this level is one.
    pub fn label(&self) -> Option<&'static str> {
        match *self {
            Self::EASY => Some("Easy"),
            Self::MEDIUM => Some("Medium"),
            Self::HARD => Some("Hard"),
            Self::MAX => Some("Max"),
            _ => None,
        }
    }
}

/// The reason why parsing [`Difficulty`] failed.
#[derive(Debug, Display, Clone, Eq, PartialEq, Error)]
#[display(fmt = "expected a preset name or a skill level between 0 and 20")]
pub struct ParseDifficultyError;

impl FromStr for Difficulty {
    type Err = ParseDifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if let Some(d) = Self::PRESETS
            .into_iter()
            .find(|d| d.label().map_or(false, |l| l.eq_ignore_ascii_case(s)))
        {
            return Ok(d);
        }

        match s.parse::<u8>() {
            Ok(level) if level <= Self::MAX.0 => Ok(Difficulty(level)),
            _ => Err(ParseDifficultyError),
        }
    }
}

/// The reason why the opponent failed to reply with a [`Move`].
#[derive(Debug, Display, Clone, Eq, PartialEq, Hash, Arbitrary, Error)]
pub enum OpponentError {
    #[display(fmt = "the opponent is unavailable")]
    Unavailable,

    #[display(fmt = "the opponent terminated unexpectedly")]
    Terminated,

    #[display(fmt = "the opponent has no move to play")]
    NoMove,

    #[display(fmt = "the opponent did not reply in time")]
    Timeout,

    #[display(fmt = "the opponent violated the protocol: {}", _0)]
    Protocol(#[error(not(source))] String),
}

/// Trait for the automated side of the game.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait Opponent: Send {
    /// Prepares the opponent for a new game at the given [`Difficulty`].
    async fn configure(&mut self, difficulty: Difficulty) -> Result<(), OpponentError>;

    /// Replies with a [`Move`] for the given [`Position`], thinking for about `budget`.
    async fn play(&mut self, pos: Position, budget: Duration) -> Result<Move, OpponentError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_strategy::proptest;

    #[proptest]
    fn new_saturates_at_max(level: u8) {
        assert_eq!(Difficulty::new(level).get(), level.min(20));
    }

    #[proptest]
    fn parsing_printed_difficulty_is_an_identity(d: Difficulty) {
        assert_eq!(d.to_string().parse(), Ok(d));
    }

    #[test]
    fn presets_can_be_parsed_by_name() {
        assert_eq!("easy".parse(), Ok(Difficulty::EASY));
        assert_eq!("Medium".parse(), Ok(Difficulty::MEDIUM));
        assert_eq!(" HARD ".parse(), Ok(Difficulty::HARD));
        assert_eq!("max".parse(), Ok(Difficulty::MAX));
    }

    #[proptest]
    fn parsing_out_of_range_levels_fails(#[strategy(21u32..)] level: u32) {
        assert_eq!(level.to_string().parse::<Difficulty>(), Err(ParseDifficultyError));
    }

    #[proptest]
    fn parsing_garbage_fails(#[strategy("[a-z]{7,}")] s: String) {
        assert_eq!(s.parse::<Difficulty>(), Err(ParseDifficultyError));
    }

    #[proptest]
    fn only_presets_are_labeled(d: Difficulty) {
        assert_eq!(d.label().is_some(), Difficulty::PRESETS.contains(&d));
    }
}
