//! Read-only match detail, assembled from the stored aggregates.

use serde::Serialize;

use crate::aggregate::FindAggregate;
use crate::domain::{Match, MatchSet, MatchStatus, PlayerPerformance, StatLine};
use crate::error::ScoreError;
use crate::repository::Find;
use crate::side::{Side, SidePair};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PlayerLine {
    pub player_id: String,
    pub stats: StatLine,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SetSummary {
    pub number: u32,
    pub points: SidePair<u32>,
    pub completed: bool,
    pub winner: Option<Side>,
    pub substitutions: SidePair<u8>,
    /// Ordered by player id.
    pub players: Vec<PlayerLine>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MatchSummary {
    pub match_id: String,
    pub team_a: String,
    pub team_b: String,
    pub location: String,
    pub status: MatchStatus,
    pub scheduled_at: u64,
    pub start_time: Option<u64>,
    pub end_time: Option<u64>,
    pub sets_won: SidePair<u8>,
    pub timeouts: SidePair<u8>,
    pub winner: Option<Side>,
    pub sets: Vec<SetSummary>,
}

impl MatchSummary {
    pub fn load<R: Find + ?Sized>(repo: &R, fixture: &Match) -> Result<Self, ScoreError> {
        let match_id = fixture.match_id.as_str();

        let mut sets: Vec<MatchSet> = repo.find_aggregates(&format!("set:{}:", match_id))?;
        sets.retain(|set| set.match_id == match_id);
        sets.sort_by_key(|set| set.number);

        let performances: Vec<PlayerPerformance> =
            repo.find_aggregates(&PlayerPerformance::match_prefix(match_id))?;

        let sets = sets
            .into_iter()
            .map(|set| {
                let mut players: Vec<PlayerLine> = performances
                    .iter()
                    .filter(|p| p.match_id == match_id && p.set_number == set.number)
                    .map(|p| PlayerLine {
                        player_id: p.player_id.clone(),
                        stats: p.totals,
                    })
                    .collect();
                players.sort_by(|a, b| a.player_id.cmp(&b.player_id));

                SetSummary {
                    number: set.number,
                    points: set.points,
                    completed: set.completed,
                    winner: set.winner,
                    substitutions: set.substitutions,
                    players,
                }
            })
            .collect();

        Ok(MatchSummary {
            match_id: fixture.match_id.clone(),
            team_a: fixture.team_a.clone(),
            team_b: fixture.team_b.clone(),
            location: fixture.location.clone(),
            status: fixture.status,
            scheduled_at: fixture.scheduled_at,
            start_time: fixture.start_time,
            end_time: fixture.end_time,
            sets_won: fixture.sets_won,
            timeouts: fixture.timeouts,
            winner: fixture.winner,
            sets,
        })
    }

    /// Total points of each side across all sets.
    pub fn total_points(&self) -> SidePair<u32> {
        self.sets.iter().fold(SidePair::default(), |acc, set| {
            SidePair::new(acc.a + set.points.a, acc.b + set.points.b)
        })
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
