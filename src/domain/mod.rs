//! Event-sourced aggregates of the scoring core.

mod fixture;
mod match_set;
mod performance;
mod player;

pub use fixture::{Match, MatchStatus};
pub use match_set::MatchSet;
pub use performance::{PlayerPerformance, StatLine};
pub use player::{Player, Position};
