//! Per-player statistics and the point forwarding they drive.
//!
//! A stat entry is the only way a team's score moves: the player's line is
//! updated and its `points` are credited to the side the player plays for.
//! Rolling an entry back reverses both, floored at zero.

use tracing::debug;

use crate::domain::{Match, MatchSet, PlayerPerformance, StatLine};
use crate::error::{EntityKind, ScoreError};
use crate::roster::TeamLookup;
use crate::side::Side;

/// What a stat entry did to its set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatEffect {
    pub side: Side,
    /// Set when this entry completed the set.
    pub set_won_by: Option<Side>,
}

pub struct StatAccumulator<'a, T: TeamLookup + ?Sized> {
    lookup: &'a T,
    team_a: &'a str,
    team_b: &'a str,
}

impl<'a, T: TeamLookup + ?Sized> StatAccumulator<'a, T> {
    pub fn new(lookup: &'a T, team_a: &'a str, team_b: &'a str) -> Self {
        StatAccumulator {
            lookup,
            team_a,
            team_b,
        }
    }

    pub fn for_match(lookup: &'a T, fixture: &'a Match) -> Self {
        Self::new(lookup, &fixture.team_a, &fixture.team_b)
    }

    /// The side a player scores for.
    pub fn side_of(&self, player_id: &str) -> Result<Side, ScoreError> {
        let team = self
            .lookup
            .team_of(player_id)?
            .ok_or_else(|| ScoreError::not_found(EntityKind::Player, player_id))?;

        if team == self.team_a {
            Ok(Side::A)
        } else if team == self.team_b {
            Ok(Side::B)
        } else {
            Err(ScoreError::Validation(format!(
                "player {} plays for {}, which is not in this match",
                player_id, team
            )))
        }
    }

    pub fn apply(
        &self,
        set: &mut MatchSet,
        performance: &mut PlayerPerformance,
        line: StatLine,
    ) -> Result<StatEffect, ScoreError> {
        let side = self.side_of(&performance.player_id)?;

        performance.record(line);
        let set_won_by = set.award(side, line.points);

        debug!(
            match_id = %set.match_id,
            set_number = set.number,
            player_id = %performance.player_id,
            side = %side,
            points = line.points,
            score_a = set.points.a,
            score_b = set.points.b,
            "stats applied"
        );

        Ok(StatEffect { side, set_won_by })
    }

    pub fn rollback(
        &self,
        set: &mut MatchSet,
        performance: &mut PlayerPerformance,
        line: StatLine,
    ) -> Result<StatEffect, ScoreError> {
        let side = self.side_of(&performance.player_id)?;

        performance.roll_back(line);
        set.subtract_points(side, line.points);

        debug!(
            match_id = %set.match_id,
            set_number = set.number,
            player_id = %performance.player_id,
            side = %side,
            points = line.points,
            score_a = set.points.a,
            score_b = set.points.b,
            "stats rolled back"
        );

        Ok(StatEffect {
            side,
            set_won_by: None,
        })
    }
}
