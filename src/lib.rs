//! Volleyball match scoring.
//!
//! Matches, sets, player performances and players are event-sourced
//! aggregates. The [`ScoreKeeper`] runs each operation under a per-match
//! lock and commits every aggregate it touched in a single batch.

extern crate self as courtside;

pub mod aggregate;
pub mod commit_builder;
pub mod domain;
pub mod entity;
pub mod error;
pub mod hashmap;
pub mod lock;
pub mod repository;
pub mod roster;
pub mod rules;
pub mod score_engine;
pub mod scorekeeper;
pub mod side;
pub mod stats;
pub mod views;

pub use aggregate::{hydrate, Aggregate, FindAggregate, GetAggregate};
pub use commit_builder::{CommitBuilder, CommitBuilderExt};
pub use domain::{Match, MatchSet, MatchStatus, Player, PlayerPerformance, Position, StatLine};
pub use entity::{Committable, Entity, EventRecord, PayloadError};
pub use error::{EntityKind, Quota, ScoreError};
pub use hashmap::HashMapRepository;
pub use lock::{InMemoryLock, InMemoryLockManager, Lock, LockError, LockManager, MatchGuard};
pub use repository::{Commit, Find, Get, Repository, RepositoryError};
pub use roster::{RepositoryRoster, TeamLookup};
pub use rules::{ConfigError, MatchRules, PointCap, SetRules, TimeoutScope};
pub use score_engine::{
    evaluate_match, evaluate_match_with, evaluate_set, evaluate_set_with, MatchOutcome,
    SetOutcome,
};
pub use scorekeeper::{NewMatch, NewPlayer, ScoreKeeper, StatReceipt, Substitution, TimeoutGrant};
pub use side::{Side, SidePair};
pub use stats::{StatAccumulator, StatEffect};
pub use views::{MatchSummary, PlayerLine, SetSummary};

pub use courtside_macros::{aggregate, digest};
