use std::fmt;

use thiserror::Error;

use crate::domain::MatchStatus;
use crate::lock::LockError;
use crate::repository::RepositoryError;
use crate::side::Side;

/// The kind of record a lookup failed to find.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    Match,
    Set,
    Player,
    Performance,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntityKind::Match => "match",
            EntityKind::Set => "set",
            EntityKind::Player => "player",
            EntityKind::Performance => "player performance",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Quota {
    Timeouts,
    Substitutions,
}

impl fmt::Display for Quota {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Quota::Timeouts => "timeouts",
            Quota::Substitutions => "substitutions",
        })
    }
}

/// Every way a scoring operation can be refused.
///
/// Refusals never leave partial state behind.
#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("cannot {action} a match that is {status}")]
    InvalidTransition {
        action: &'static str,
        status: MatchStatus,
    },

    #[error("{entity} {id} not found")]
    NotFound { entity: EntityKind, id: String },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("side {side} has used all {limit} {quota}")]
    QuotaExceeded { quota: Quota, side: Side, limit: u8 },

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Lock(#[from] LockError),
}

impl ScoreError {
    pub(crate) fn not_found(entity: EntityKind, id: impl Into<String>) -> Self {
        ScoreError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Expected, recoverable refusals as opposed to infrastructure faults.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, ScoreError::Repository(_) | ScoreError::Lock(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_rule() {
        let err = ScoreError::InvalidTransition {
            action: "start",
            status: MatchStatus::Live,
        };
        assert_eq!(err.to_string(), "cannot start a match that is live");

        let err = ScoreError::QuotaExceeded {
            quota: Quota::Substitutions,
            side: Side::B,
            limit: 6,
        };
        assert_eq!(err.to_string(), "side B has used all 6 substitutions");
        assert!(err.is_rejection());

        let err = ScoreError::not_found(EntityKind::Performance, "perf:m1:1:p9");
        assert_eq!(err.to_string(), "player performance perf:m1:1:p9 not found");
    }

    #[test]
    fn infrastructure_failures_are_not_rejections() {
        let err: ScoreError = RepositoryError::LockPoisoned("write").into();
        assert!(!err.is_rejection());
    }
}
