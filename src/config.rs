//! Configuration for the cache core.
//!
//! Deserializable from whatever host configuration the embedding app uses;
//! every field has a default so an empty table is valid.

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Derived view configuration
    #[serde(default)]
    pub views: ViewConfig,

    /// Mutation dispatch configuration
    #[serde(default)]
    pub dispatch: DispatchConfig,
}

/// Derived view configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    /// First day of the week for the week bucket ("monday", "sunday", ...)
    #[serde(default = "default_week_start")]
    pub week_start: String,
}

fn default_week_start() -> String {
    "monday".to_string()
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            week_start: default_week_start(),
        }
    }
}

impl ViewConfig {
    /// Parse the configured week start into a weekday.
    pub fn week_start_day(&self) -> Result<Weekday> {
        self.week_start
            .trim()
            .parse::<Weekday>()
            .map_err(|_| Error::InvalidConfig(format!("unknown weekday '{}'", self.week_start)))
    }
}

/// Mutation dispatch configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Apply toggle intents to the cache before remote confirmation,
    /// reverting on failure. Off by default: the cache then only ever
    /// holds confirmed records.
    #[serde(default)]
    pub optimistic_toggle: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_monday_and_confirmation_only() {
        let config = Config::default();
        assert_eq!(config.views.week_start_day().unwrap(), Weekday::Mon);
        assert!(!config.dispatch.optimistic_toggle);
    }

    #[test]
    fn week_start_accepts_full_and_short_names() {
        for (raw, expected) in [("sunday", Weekday::Sun), ("Sat", Weekday::Sat)] {
            let views = ViewConfig {
                week_start: raw.to_string(),
            };
            assert_eq!(views.week_start_day().unwrap(), expected);
        }
    }

    #[test]
    fn unknown_weekday_is_rejected() {
        let views = ViewConfig {
            week_start: "someday".to_string(),
        };
        assert!(views.week_start_day().is_err());
    }
}
