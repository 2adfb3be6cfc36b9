//! Match rule configuration.
//!
//! Defaults follow indoor volleyball as played by the scoring core: first to
//! two sets, sets to 25 (deciding fifth set to 15) with a two-point lead,
//! two timeouts and six substitutions per side.
//!
//! ```
//! use courtside::{MatchRules, TimeoutScope};
//!
//! let rules = MatchRules::from_toml_str(r#"
//!     substitutions_per_side = 4
//!     timeout_scope = "set"
//!
//!     [point_cap]
//!     regular = 30
//!     deciding = 20
//! "#).unwrap();
//!
//! assert_eq!(rules.substitutions_per_side, 4);
//! assert_eq!(rules.timeout_scope, TimeoutScope::Set);
//! assert_eq!(rules.timeouts_per_side, 2);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ordinal of the set played to the lower target.
pub const DECIDING_SET: u32 = 5;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid match rules: {0}")]
    Invalid(String),
}

/// Whether timeout usage carries across sets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutScope {
    /// Counters live on the match and are never reset.
    #[default]
    Match,
    /// Counters reset whenever a new set opens.
    Set,
}

/// Hard ceiling that ends a set regardless of margin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointCap {
    pub regular: u32,
    pub deciding: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchRules {
    pub timeouts_per_side: u8,
    pub substitutions_per_side: u8,
    pub sets_to_win: u8,
    pub regular_target: u32,
    pub deciding_target: u32,
    pub win_margin: u32,
    pub point_cap: Option<PointCap>,
    pub timeout_scope: TimeoutScope,
    /// Require the outgoing player to be a starter and the incoming one not.
    pub strict_substitutions: bool,
}

impl Default for MatchRules {
    fn default() -> Self {
        MatchRules {
            timeouts_per_side: 2,
            substitutions_per_side: 6,
            sets_to_win: 2,
            regular_target: 25,
            deciding_target: 15,
            win_margin: 2,
            point_cap: None,
            timeout_scope: TimeoutScope::Match,
            strict_substitutions: false,
        }
    }
}

impl MatchRules {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let rules: MatchRules = toml::from_str(s)?;
        rules.validate()?;
        Ok(rules)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if self.win_margin == 0 {
            return invalid("win_margin must be at least 1");
        }
        if self.regular_target == 0 || self.deciding_target == 0 {
            return invalid("set targets must be positive");
        }
        if !(1..=3).contains(&self.sets_to_win) {
            return invalid("sets_to_win must be between 1 and 3");
        }
        if let Some(cap) = self.point_cap {
            if cap.regular < self.regular_target || cap.deciding < self.deciding_target {
                return invalid("point_cap must not be below the set target");
            }
        }
        Ok(())
    }

    pub fn with_point_cap(mut self, regular: u32, deciding: u32) -> Self {
        self.point_cap = Some(PointCap { regular, deciding });
        self
    }

    pub fn with_timeout_scope(mut self, scope: TimeoutScope) -> Self {
        self.timeout_scope = scope;
        self
    }

    pub fn with_strict_substitutions(mut self) -> Self {
        self.strict_substitutions = true;
        self
    }

    /// The completion rule for a given set ordinal.
    pub fn set_rules(&self, set_number: u32) -> SetRules {
        let deciding = set_number >= DECIDING_SET;
        SetRules {
            target: if deciding {
                self.deciding_target
            } else {
                self.regular_target
            },
            margin: self.win_margin,
            cap: self
                .point_cap
                .map(|cap| if deciding { cap.deciding } else { cap.regular }),
        }
    }
}

/// Completion rule for one set, fixed when the set opens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetRules {
    pub target: u32,
    pub margin: u32,
    pub cap: Option<u32>,
}

impl SetRules {
    pub fn for_set(set_number: u32) -> Self {
        MatchRules::default().set_rules(set_number)
    }
}

impl Default for SetRules {
    fn default() -> Self {
        SetRules::for_set(1)
    }
}
