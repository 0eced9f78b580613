use crate::geometry::{InvalidLayout, Layout};
use derive_more::{Display, Error, From};
use serde::{Deserialize, Serialize};
use std::{str::FromStr, time::Duration};

#[cfg(test)]
use proptest::prelude::*;

/// Runtime configuration for a [`Session`][`super::Session`].
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
#[display(fmt = "{}", "ron::ser::to_string(self).unwrap()")]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    /// How long the opponent may think about each move.
    #[cfg_attr(test, strategy((0u64..600_000).prop_map(Duration::from_millis)))]
    #[serde(with = "humantime_serde")]
    pub budget: Duration,

    /// How much longer than its budget the opponent is awaited before giving up.
    #[cfg_attr(test, strategy((0u64..600_000).prop_map(Duration::from_millis)))]
    #[serde(with = "humantime_serde")]
    pub grace: Duration,

    /// How long a piece takes to glide to its destination.
    #[cfg_attr(test, strategy((0u64..10_000).prop_map(Duration::from_millis)))]
    #[serde(with = "humantime_serde")]
    pub animation: Duration,

    pub layout: Layout,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            budget: Duration::from_secs(1),
            grace: Duration::from_secs(5),
            animation: Duration::from_millis(300),
            layout: Layout::default(),
        }
    }
}

/// The reason why parsing [`Config`] failed.
#[derive(Debug, Display, Eq, PartialEq, Error, From)]
pub enum ParseConfigError {
    #[display(fmt = "failed to parse session configuration")]
    Syntax(ron::de::SpannedError),

    #[display(fmt = "invalid screen layout, {}", _0)]
    Layout(InvalidLayout),
}

impl FromStr for Config {
    type Err = ParseConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: Config = ron::de::from_str(s)?;
        config.layout.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_strategy::proptest;

    #[proptest]
    fn parsing_printed_config_is_an_identity(c: Config) {
        assert_eq!(c.to_string().parse(), Ok(c));
    }

    #[test]
    fn missing_fields_take_default_values() {
        assert_eq!("()".parse(), Ok(Config::default()));

        assert_eq!(
            "(budget: \"2s 500ms\")".parse(),
            Ok(Config {
                budget: Duration::from_millis(2500),
                ..Config::default()
            })
        );

        assert_eq!(
            "(layout: (square: 64))".parse(),
            Ok(Config {
                layout: Layout {
                    square: 64,
                    ..Layout::default()
                },
                ..Config::default()
            })
        );
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(matches!(
            "(depth: 3)".parse::<Config>(),
            Err(ParseConfigError::Syntax(_))
        ));
    }

    #[test]
    fn layouts_that_can_not_be_drawn_are_rejected() {
        assert_eq!(
            "(layout: (square: 600000000))".parse::<Config>(),
            Err(ParseConfigError::Layout(InvalidLayout::Overflow))
        );

        assert_eq!(
            "(layout: (width: 0))".parse::<Config>(),
            Err(ParseConfigError::Layout(InvalidLayout::Extent))
        );
    }
}
