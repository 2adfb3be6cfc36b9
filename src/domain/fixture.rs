use std::fmt;

use serde::{Deserialize, Serialize};

use crate::rules::{MatchRules, TimeoutScope};
use crate::score_engine::evaluate_match_with;
use crate::side::{Side, SidePair};
use crate::{digest, Entity};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    #[default]
    Upcoming,
    Live,
    Finished,
    Suspended,
    Rescheduled,
}

impl MatchStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchStatus::Upcoming => "upcoming",
            MatchStatus::Live => "live",
            MatchStatus::Finished => "finished",
            MatchStatus::Suspended => "suspended",
            MatchStatus::Rescheduled => "rescheduled",
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A match between two teams: lifecycle, set wins and timeouts.
///
/// Timestamps are milliseconds since the Unix epoch and are passed in by
/// the caller so that replay reproduces them exactly.
#[derive(Debug, Default)]
pub struct Match {
    pub entity: Entity,
    pub match_id: String,
    pub team_a: String,
    pub team_b: String,
    pub scheduled_at: u64,
    pub location: String,
    pub rules: MatchRules,
    pub status: MatchStatus,
    pub start_time: Option<u64>,
    pub end_time: Option<u64>,
    pub sets_won: SidePair<u8>,
    pub timeouts: SidePair<u8>,
    /// Ordinal of the most recently opened set; 0 before the match starts.
    pub sets_opened: u32,
    pub winner: Option<Side>,
}

impl Match {
    pub fn entity_id(match_id: &str) -> String {
        format!("match:{}", match_id)
    }

    #[digest("Scheduled")]
    pub fn schedule(
        &mut self,
        match_id: String,
        team_a: String,
        team_b: String,
        scheduled_at: u64,
        location: String,
        rules: MatchRules,
    ) {
        self.entity.set_id(Self::entity_id(&match_id));
        self.match_id = match_id;
        self.team_a = team_a;
        self.team_b = team_b;
        self.scheduled_at = scheduled_at;
        self.location = location;
        self.rules = rules;
    }

    /// Goes live and opens set 1.
    #[digest("Started", when = self.status == MatchStatus::Upcoming)]
    pub fn start(&mut self, at: u64) {
        self.status = MatchStatus::Live;
        self.start_time = Some(at);
        self.open_next_set();
    }

    /// Credits the winner of the current set, then either finishes the
    /// match or opens the next set.
    ///
    /// Only the current set can be credited, and only once.
    #[digest(
        "SetWon",
        when = self.status != MatchStatus::Finished && set_number == self.sets_opened
    )]
    pub fn on_set_completed(&mut self, set_number: u32, winner: Side, at: u64) {
        *self.sets_won.get_mut(winner) += 1;
        let outcome = evaluate_match_with(self.rules.sets_to_win, self.sets_won.a, self.sets_won.b);
        match outcome.winner() {
            Some(side) => {
                self.status = MatchStatus::Finished;
                self.end_time = Some(at);
                self.winner = Some(side);
            }
            None => self.open_next_set(),
        }
    }

    #[digest("TimeoutTaken", when = self.can_take_timeout(side))]
    pub fn use_timeout(&mut self, side: Side) {
        *self.timeouts.get_mut(side) += 1;
    }

    #[digest("Suspended", when = self.can_suspend())]
    pub fn suspend(&mut self) {
        self.status = MatchStatus::Suspended;
    }

    #[digest("Rescheduled", when = self.can_reschedule())]
    pub fn reschedule(&mut self, scheduled_at: u64) {
        self.status = MatchStatus::Rescheduled;
        self.scheduled_at = scheduled_at;
    }

    /// Back to play: live if the match had started, otherwise upcoming.
    #[digest("Resumed", when = self.can_resume())]
    pub fn resume(&mut self) {
        self.status = if self.sets_opened > 0 {
            MatchStatus::Live
        } else {
            MatchStatus::Upcoming
        };
    }

    fn open_next_set(&mut self) {
        self.sets_opened += 1;
        if self.rules.timeout_scope == TimeoutScope::Set {
            self.timeouts = SidePair::default();
        }
    }

    /// Returns false, leaving the counter untouched, at the limit.
    pub fn try_use_timeout(&mut self, side: Side) -> bool {
        if !self.can_take_timeout(side) {
            return false;
        }
        self.use_timeout(side);
        true
    }

    /// Set-scoped timeouts need an open set to count against.
    pub fn can_take_timeout(&self, side: Side) -> bool {
        let counted = self.rules.timeout_scope == TimeoutScope::Match || self.sets_opened > 0;
        counted && self.timeouts.of(side) < self.rules.timeouts_per_side
    }

    pub fn timeouts_remaining(&self, side: Side) -> u8 {
        self.rules.timeouts_per_side.saturating_sub(self.timeouts.of(side))
    }

    pub fn can_suspend(&self) -> bool {
        matches!(self.status, MatchStatus::Upcoming | MatchStatus::Live)
    }

    pub fn can_reschedule(&self) -> bool {
        matches!(self.status, MatchStatus::Upcoming | MatchStatus::Suspended)
    }

    pub fn can_resume(&self) -> bool {
        matches!(self.status, MatchStatus::Suspended | MatchStatus::Rescheduled)
    }

    pub fn is_finished(&self) -> bool {
        self.status == MatchStatus::Finished
    }

    pub fn current_set_number(&self) -> Option<u32> {
        (self.sets_opened > 0).then_some(self.sets_opened)
    }

    pub fn team(&self, side: Side) -> &str {
        match side {
            Side::A => &self.team_a,
            Side::B => &self.team_b,
        }
    }

    pub fn side_of_team(&self, team_id: &str) -> Option<Side> {
        Side::BOTH.into_iter().find(|side| self.team(*side) == team_id)
    }
}

crate::aggregate!(Match, entity {
    "Scheduled"(match_id, team_a, team_b, scheduled_at, location, rules) => schedule,
    "Started"(at) => start,
    "SetWon"(set_number, winner, at) => on_set_completed,
    "TimeoutTaken"(side) => use_timeout,
    "Suspended"() => suspend,
    "Rescheduled"(scheduled_at) => reschedule,
    "Resumed"() => resume,
});

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{hydrate, Aggregate};

    fn scheduled(rules: MatchRules) -> Match {
        let mut fixture = Match::default();
        fixture.schedule(
            "m1".into(),
            "eagles".into(),
            "sharks".into(),
            1_000,
            "Main Hall".into(),
            rules,
        );
        fixture
    }

    #[test]
    fn start_opens_first_set_once() {
        let mut fixture = scheduled(MatchRules::default());
        assert_eq!(fixture.current_set_number(), None);

        fixture.start(5_000);
        fixture.start(6_000);

        assert_eq!(fixture.status, MatchStatus::Live);
        assert_eq!(fixture.start_time, Some(5_000));
        assert_eq!(fixture.current_set_number(), Some(1));
        assert_eq!(fixture.entity.version(), 2);
    }

    #[test]
    fn second_set_win_finishes_match() {
        let mut fixture = scheduled(MatchRules::default());
        fixture.start(0);

        fixture.on_set_completed(1, Side::A, 10);
        assert_eq!(fixture.current_set_number(), Some(2));
        fixture.on_set_completed(2, Side::B, 20);
        assert_eq!(fixture.current_set_number(), Some(3));
        fixture.on_set_completed(3, Side::B, 30);

        assert!(fixture.is_finished());
        assert_eq!(fixture.winner, Some(Side::B));
        assert_eq!(fixture.end_time, Some(30));
        assert_eq!(fixture.sets_won, SidePair::new(1, 2));
        assert_eq!(fixture.current_set_number(), Some(3));
    }

    #[test]
    fn stale_or_repeated_set_results_are_ignored() {
        let mut fixture = scheduled(MatchRules::default());
        fixture.start(0);
        fixture.on_set_completed(1, Side::A, 10);
        fixture.on_set_completed(1, Side::A, 11);
        fixture.on_set_completed(7, Side::A, 12);
        assert_eq!(fixture.sets_won, SidePair::new(1, 0));
        assert!(!fixture.is_finished());
    }

    #[test]
    fn timeouts_cap_per_side_and_persist_across_sets() {
        let mut fixture = scheduled(MatchRules::default());
        fixture.start(0);
        assert!(fixture.try_use_timeout(Side::A));
        assert!(fixture.try_use_timeout(Side::A));
        assert!(!fixture.try_use_timeout(Side::A));
        assert!(fixture.try_use_timeout(Side::B));

        fixture.on_set_completed(1, Side::A, 10);
        assert_eq!(fixture.timeouts, SidePair::new(2, 1));
        assert_eq!(fixture.timeouts_remaining(Side::A), 0);
    }

    #[test]
    fn set_scoped_timeouts_reset_with_each_set() {
        let mut fixture = scheduled(MatchRules::default().with_timeout_scope(TimeoutScope::Set));
        fixture.start(0);
        fixture.use_timeout(Side::A);
        fixture.use_timeout(Side::A);
        fixture.on_set_completed(1, Side::B, 10);
        assert_eq!(fixture.timeouts, SidePair::default());
    }

    #[test]
    fn set_scoped_timeouts_wait_for_first_set() {
        let mut fixture = scheduled(MatchRules::default().with_timeout_scope(TimeoutScope::Set));
        assert!(!fixture.try_use_timeout(Side::A));
        assert_eq!(fixture.entity.version(), 1);

        fixture.start(0);
        assert!(fixture.try_use_timeout(Side::A));
        assert_eq!(fixture.timeouts, SidePair::new(1, 0));

        let mut carried = scheduled(MatchRules::default());
        assert!(carried.try_use_timeout(Side::B));
    }

    #[test]
    fn external_states() {
        let mut fixture = scheduled(MatchRules::default());
        fixture.resume();
        assert_eq!(fixture.status, MatchStatus::Upcoming);

        fixture.reschedule(9_000);
        assert_eq!(fixture.status, MatchStatus::Rescheduled);
        assert_eq!(fixture.scheduled_at, 9_000);

        fixture.start(10_000);
        assert_eq!(fixture.status, MatchStatus::Rescheduled);
        fixture.resume();
        assert_eq!(fixture.status, MatchStatus::Upcoming);
        fixture.start(10_000);
        assert_eq!(fixture.status, MatchStatus::Live);

        let mut live = scheduled(MatchRules::default());
        live.start(0);
        live.suspend();
        assert_eq!(live.status, MatchStatus::Suspended);
        live.resume();
        assert_eq!(live.status, MatchStatus::Live);
    }

    #[test]
    fn replay_rebuilds_state() {
        let mut fixture = scheduled(MatchRules::default());
        fixture.start(100);
        fixture.use_timeout(Side::B);
        fixture.on_set_completed(1, Side::A, 200);
        fixture.on_set_completed(2, Side::A, 300);

        let replayed: Match = hydrate(fixture.entity().clone()).unwrap();
        assert_eq!(replayed.match_id, "m1");
        assert_eq!(replayed.team(Side::B), "sharks");
        assert_eq!(replayed.status, MatchStatus::Finished);
        assert_eq!(replayed.sets_won, SidePair::new(2, 0));
        assert_eq!(replayed.timeouts, SidePair::new(0, 1));
        assert_eq!(replayed.end_time, Some(300));
        assert_eq!(replayed.side_of_team("eagles"), Some(Side::A));
        assert_eq!(replayed.side_of_team("owls"), None);
    }
}
