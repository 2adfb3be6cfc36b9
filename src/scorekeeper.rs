//! The scoring operations exposed to the outside world.
//!
//! Every operation on a match runs under that match's lock, loads the
//! aggregates it needs, validates, mutates, and writes all changes in one
//! batch commit. A refusal returns before anything is committed, so no
//! partial state is ever stored.

use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{info, warn};

use crate::aggregate::{FindAggregate, GetAggregate};
use crate::commit_builder::CommitBuilderExt;
use crate::domain::{Match, MatchSet, MatchStatus, Player, PlayerPerformance, Position, StatLine};
use crate::error::{EntityKind, Quota, ScoreError};
use crate::lock::{InMemoryLockManager, LockManager};
use crate::repository::Repository;
use crate::roster::RepositoryRoster;
use crate::rules::{MatchRules, TimeoutScope};
use crate::side::{Side, SidePair};
use crate::stats::StatAccumulator;
use crate::views::MatchSummary;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewMatch {
    pub id: String,
    pub team_a: String,
    pub team_b: String,
    /// Milliseconds since the Unix epoch.
    pub scheduled_at: u64,
    pub location: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewPlayer {
    pub id: String,
    pub team_id: String,
    pub name: String,
    pub jersey_number: u32,
    pub position: Position,
    pub is_starter: bool,
}

/// Result of a stat entry or correction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatReceipt {
    pub side: Side,
    pub set_number: u32,
    /// The set's score after the entry.
    pub score: SidePair<u32>,
    /// This entry completed the set.
    pub set_completed: bool,
    /// This entry finished the match.
    pub match_finished: bool,
    /// Set opened because this entry completed the previous one.
    pub next_set: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Substitution {
    pub side: Side,
    pub set_number: u32,
    pub player_in: String,
    pub player_in_starter: bool,
    pub player_out: String,
    pub player_out_starter: bool,
    pub used: u8,
    pub remaining: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeoutGrant {
    pub side: Side,
    pub used: u8,
    pub remaining: u8,
}

fn system_clock() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}

/// Runs matches against a repository.
///
/// New matches are scheduled with the keeper's [`MatchRules`]; a scheduled
/// match keeps its own copy, so changing the keeper's rules later does not
/// affect it.
pub struct ScoreKeeper<R, L = InMemoryLockManager> {
    repo: R,
    locks: L,
    rules: MatchRules,
    clock: fn() -> u64,
}

impl<R: Repository> ScoreKeeper<R> {
    pub fn new(repo: R) -> Self {
        Self::with_lock_manager(repo, InMemoryLockManager::new())
    }
}

impl<R: Repository, L: LockManager> ScoreKeeper<R, L> {
    pub fn with_lock_manager(repo: R, locks: L) -> Self {
        ScoreKeeper {
            repo,
            locks,
            rules: MatchRules::default(),
            clock: system_clock,
        }
    }

    pub fn with_rules(mut self, rules: MatchRules) -> Self {
        self.rules = rules;
        self
    }

    /// Source of the start and end timestamps, in epoch milliseconds.
    pub fn with_clock(mut self, clock: fn() -> u64) -> Self {
        self.clock = clock;
        self
    }

    pub fn rules(&self) -> &MatchRules {
        &self.rules
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn lock_manager(&self) -> &L {
        &self.locks
    }

    /// Captures the keeper's rules, which must pass [`MatchRules::validate`].
    pub fn schedule_match(&self, new: NewMatch) -> Result<Match, ScoreError> {
        check_id(EntityKind::Match, &new.id)?;
        self.rules
            .validate()
            .map_err(|e| ScoreError::Validation(e.to_string()))?;
        if new.team_a == new.team_b {
            return Err(ScoreError::Validation(format!(
                "team {} cannot play itself",
                new.team_a
            )));
        }

        let _guard = self.locks.acquire(&Match::entity_id(&new.id))?;
        if self.find_match(&new.id)?.is_some() {
            return Err(ScoreError::Validation(format!(
                "match {} already exists",
                new.id
            )));
        }

        let mut fixture = Match::default();
        fixture.schedule(
            new.id,
            new.team_a,
            new.team_b,
            new.scheduled_at,
            new.location,
            self.rules.clone(),
        );
        self.repo.batch().aggregate(&mut fixture).commit()?;

        info!(
            match_id = %fixture.match_id,
            team_a = %fixture.team_a,
            team_b = %fixture.team_b,
            "match scheduled"
        );
        Ok(fixture)
    }

    /// Jersey numbers must be unique within a team.
    pub fn register_player(&self, new: NewPlayer) -> Result<Player, ScoreError> {
        check_id(EntityKind::Player, &new.id)?;
        let _guard = self.locks.acquire(&format!("team:{}", new.team_id))?;

        if self
            .repo
            .get_aggregate::<Player>(&Player::entity_id(&new.id))?
            .is_some()
        {
            return Err(ScoreError::Validation(format!(
                "player {} already exists",
                new.id
            )));
        }

        let teammates = self.repo.find_aggregates::<Player>("player:")?;
        if let Some(taken) = teammates
            .iter()
            .find(|p| p.team_id == new.team_id && p.jersey_number == new.jersey_number)
        {
            return Err(ScoreError::Validation(format!(
                "jersey {} is already worn by {} on team {}",
                new.jersey_number, taken.player_id, new.team_id
            )));
        }

        let mut player = Player::default();
        player.register(
            new.id,
            new.team_id,
            new.name,
            new.jersey_number,
            new.position,
            new.is_starter,
        );
        self.repo.batch().aggregate(&mut player).commit()?;

        info!(player_id = %player.player_id, team_id = %player.team_id, "player registered");
        Ok(player)
    }

    pub fn player(&self, player_id: &str) -> Result<Player, ScoreError> {
        self.load_player(player_id)
    }

    pub fn fixture(&self, match_id: &str) -> Result<Match, ScoreError> {
        self.load_match(match_id)
    }

    /// Upcoming to live; opens set 1.
    pub fn start_match(&self, match_id: &str) -> Result<Match, ScoreError> {
        let _guard = self.locks.acquire(&Match::entity_id(match_id))?;
        let mut fixture = self.load_match(match_id)?;

        if fixture.status != MatchStatus::Upcoming {
            return Err(ScoreError::InvalidTransition {
                action: "start",
                status: fixture.status,
            });
        }

        fixture.start((self.clock)());
        let mut first = open_set(&fixture, 1);
        self.repo
            .batch()
            .aggregate(&mut fixture)
            .aggregate(&mut first)
            .commit()?;

        info!(match_id, "match started");
        Ok(fixture)
    }

    /// Records a player's stat entry and credits its points to the player's
    /// side, completing the set and the match when the rules say so.
    ///
    /// On a completed set the line is still recorded but the score does not
    /// move.
    pub fn apply_player_stats(
        &self,
        match_id: &str,
        set_number: u32,
        player_id: &str,
        line: StatLine,
    ) -> Result<StatReceipt, ScoreError> {
        let _guard = self.locks.acquire(&Match::entity_id(match_id))?;
        let mut fixture = self.load_match(match_id)?;
        let mut set = self.load_set(match_id, set_number)?;
        let mut performance = self
            .find_performance(match_id, set_number, player_id)?
            .unwrap_or_else(|| {
                let mut fresh = PlayerPerformance::default();
                fresh.open(match_id.to_string(), set_number, player_id.to_string());
                fresh
            });

        let roster = RepositoryRoster::new(&self.repo);
        let effect =
            StatAccumulator::for_match(&roster, &fixture).apply(&mut set, &mut performance, line)?;

        let mut next = None;
        if let Some(winner) = effect.set_won_by {
            fixture.on_set_completed(set.number, winner, (self.clock)());
            info!(
                match_id,
                set_number,
                winner = %winner,
                score_a = set.points.a,
                score_b = set.points.b,
                "set completed"
            );

            if fixture.is_finished() {
                info!(
                    match_id,
                    winner = %winner,
                    sets_a = fixture.sets_won.a,
                    sets_b = fixture.sets_won.b,
                    "match finished"
                );
            } else if fixture.sets_opened > set_number {
                next = Some(open_set(&fixture, fixture.sets_opened));
            }
        }

        self.repo
            .batch()
            .aggregate(&mut set)
            .aggregate(&mut performance)
            .aggregate(&mut fixture)
            .maybe_aggregate(next.as_mut())
            .commit()?;

        Ok(StatReceipt {
            side: effect.side,
            set_number,
            score: set.points,
            set_completed: effect.set_won_by.is_some(),
            match_finished: effect.set_won_by.is_some() && fixture.is_finished(),
            next_set: next.map(|set| set.number),
        })
    }

    /// Reverses a stat entry, flooring every counter at zero. A completed set
    /// stays completed.
    pub fn rollback_player_stats(
        &self,
        match_id: &str,
        set_number: u32,
        player_id: &str,
        line: StatLine,
    ) -> Result<StatReceipt, ScoreError> {
        let _guard = self.locks.acquire(&Match::entity_id(match_id))?;
        let fixture = self.load_match(match_id)?;
        let mut set = self.load_set(match_id, set_number)?;
        let mut performance = self
            .find_performance(match_id, set_number, player_id)?
            .ok_or_else(|| {
                ScoreError::not_found(
                    EntityKind::Performance,
                    PlayerPerformance::entity_id(match_id, set_number, player_id),
                )
            })?;

        let roster = RepositoryRoster::new(&self.repo);
        let effect = StatAccumulator::for_match(&roster, &fixture).rollback(
            &mut set,
            &mut performance,
            line,
        )?;

        self.repo
            .batch()
            .aggregate(&mut set)
            .aggregate(&mut performance)
            .commit()?;

        Ok(StatReceipt {
            side: effect.side,
            set_number,
            score: set.points,
            set_completed: false,
            match_finished: false,
            next_set: None,
        })
    }

    /// Swaps a bench player in for a player on court in the current set.
    ///
    /// The substitution counter and both starter flags are committed
    /// together or not at all.
    pub fn substitute(
        &self,
        match_id: &str,
        player_in_id: &str,
        player_out_id: &str,
        side: Side,
    ) -> Result<Substitution, ScoreError> {
        let _guard = self.locks.acquire(&Match::entity_id(match_id))?;
        let fixture = self.load_match(match_id)?;
        let mut set = self.load_current_set(&fixture)?;
        let mut incoming = self.load_player(player_in_id)?;
        let mut outgoing = self.load_player(player_out_id)?;

        if player_in_id == player_out_id {
            return Err(ScoreError::Validation(format!(
                "player {} cannot replace themselves",
                player_in_id
            )));
        }
        if incoming.team_id != outgoing.team_id {
            return Err(ScoreError::Validation(format!(
                "players {} and {} play for different teams",
                player_in_id, player_out_id
            )));
        }
        if incoming.team_id != fixture.team(side) {
            return Err(ScoreError::Validation(format!(
                "team {} is not side {} of match {}",
                incoming.team_id, side, match_id
            )));
        }
        if fixture.rules.strict_substitutions {
            if !outgoing.is_starter {
                return Err(ScoreError::Validation(format!(
                    "player {} is not on court",
                    player_out_id
                )));
            }
            if incoming.is_starter {
                return Err(ScoreError::Validation(format!(
                    "player {} is already on court",
                    player_in_id
                )));
            }
        }

        if !set.try_use_substitution(side) {
            warn!(match_id, set_number = set.number, side = %side, "substitution quota exhausted");
            return Err(ScoreError::QuotaExceeded {
                quota: Quota::Substitutions,
                side,
                limit: set.substitution_limit,
            });
        }
        incoming.enter_court();
        outgoing.leave_court();

        self.repo
            .batch()
            .aggregate(&mut set)
            .aggregate(&mut incoming)
            .aggregate(&mut outgoing)
            .commit()?;

        let used = set.substitutions.of(side);
        info!(
            match_id,
            set_number = set.number,
            side = %side,
            player_in = player_in_id,
            player_out = player_out_id,
            used,
            "substitution"
        );

        Ok(Substitution {
            side,
            set_number: set.number,
            player_in: incoming.player_id,
            player_in_starter: incoming.is_starter,
            player_out: outgoing.player_id,
            player_out_starter: outgoing.is_starter,
            used,
            remaining: set.substitution_limit.saturating_sub(used),
        })
    }

    pub fn request_timeout(&self, match_id: &str, side: Side) -> Result<TimeoutGrant, ScoreError> {
        let _guard = self.locks.acquire(&Match::entity_id(match_id))?;
        let mut fixture = self.load_match(match_id)?;

        let per_set = fixture.rules.timeout_scope == TimeoutScope::Set;
        if per_set && fixture.current_set_number().is_none() {
            return Err(ScoreError::InvalidTransition {
                action: "call a timeout in",
                status: fixture.status,
            });
        }
        if !fixture.try_use_timeout(side) {
            warn!(match_id, side = %side, "timeout quota exhausted");
            return Err(ScoreError::QuotaExceeded {
                quota: Quota::Timeouts,
                side,
                limit: fixture.rules.timeouts_per_side,
            });
        }
        self.repo.batch().aggregate(&mut fixture).commit()?;

        let used = fixture.timeouts.of(side);
        info!(match_id, side = %side, used, "timeout");
        Ok(TimeoutGrant {
            side,
            used,
            remaining: fixture.timeouts_remaining(side),
        })
    }

    pub fn suspend_match(&self, match_id: &str) -> Result<Match, ScoreError> {
        self.transition(match_id, "suspend", Match::can_suspend, Match::suspend)
    }

    pub fn reschedule_match(&self, match_id: &str, scheduled_at: u64) -> Result<Match, ScoreError> {
        self.transition(match_id, "reschedule", Match::can_reschedule, |fixture| {
            fixture.reschedule(scheduled_at)
        })
    }

    pub fn resume_match(&self, match_id: &str) -> Result<Match, ScoreError> {
        self.transition(match_id, "resume", Match::can_resume, Match::resume)
    }

    /// The most recently opened set.
    pub fn current_set(&self, match_id: &str) -> Result<MatchSet, ScoreError> {
        let fixture = self.load_match(match_id)?;
        self.load_current_set(&fixture)
    }

    pub fn summary(&self, match_id: &str) -> Result<MatchSummary, ScoreError> {
        let fixture = self.load_match(match_id)?;
        MatchSummary::load(&self.repo, &fixture)
    }

    fn transition(
        &self,
        match_id: &str,
        action: &'static str,
        allowed: impl Fn(&Match) -> bool,
        apply: impl FnOnce(&mut Match),
    ) -> Result<Match, ScoreError> {
        let _guard = self.locks.acquire(&Match::entity_id(match_id))?;
        let mut fixture = self.load_match(match_id)?;

        if !allowed(&fixture) {
            return Err(ScoreError::InvalidTransition {
                action,
                status: fixture.status,
            });
        }

        let from = fixture.status;
        apply(&mut fixture);
        self.repo.batch().aggregate(&mut fixture).commit()?;

        info!(match_id, from = %from, to = %fixture.status, "match {}", action);
        Ok(fixture)
    }

    fn find_match(&self, match_id: &str) -> Result<Option<Match>, ScoreError> {
        Ok(self.repo.get_aggregate(&Match::entity_id(match_id))?)
    }

    fn load_match(&self, match_id: &str) -> Result<Match, ScoreError> {
        self.find_match(match_id)?
            .ok_or_else(|| ScoreError::not_found(EntityKind::Match, match_id))
    }

    fn load_set(&self, match_id: &str, set_number: u32) -> Result<MatchSet, ScoreError> {
        let id = MatchSet::entity_id(match_id, set_number);
        self.repo
            .get_aggregate(&id)?
            .ok_or_else(|| ScoreError::not_found(EntityKind::Set, id))
    }

    fn load_current_set(&self, fixture: &Match) -> Result<MatchSet, ScoreError> {
        let number = fixture.current_set_number().ok_or_else(|| {
            ScoreError::not_found(EntityKind::Set, format!("{} (current)", fixture.match_id))
        })?;
        self.load_set(&fixture.match_id, number)
    }

    fn load_player(&self, player_id: &str) -> Result<Player, ScoreError> {
        self.repo
            .get_aggregate(&Player::entity_id(player_id))?
            .ok_or_else(|| ScoreError::not_found(EntityKind::Player, player_id))
    }

    fn find_performance(
        &self,
        match_id: &str,
        set_number: u32,
        player_id: &str,
    ) -> Result<Option<PlayerPerformance>, ScoreError> {
        Ok(self.repo.get_aggregate(&PlayerPerformance::entity_id(
            match_id, set_number, player_id,
        ))?)
    }
}

/// Ids become segments of `:`-separated entity ids.
fn check_id(kind: EntityKind, id: &str) -> Result<(), ScoreError> {
    if id.is_empty() || id.contains(':') {
        return Err(ScoreError::Validation(format!(
            "{} id {:?} must be non-empty and free of ':'",
            kind, id
        )));
    }
    Ok(())
}

fn open_set(fixture: &Match, number: u32) -> MatchSet {
    let mut set = MatchSet::default();
    set.open(
        fixture.match_id.clone(),
        number,
        fixture.rules.set_rules(number),
        fixture.rules.substitutions_per_side,
    );
    set
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HashMapRepository;

    fn keeper() -> ScoreKeeper<HashMapRepository> {
        ScoreKeeper::new(HashMapRepository::new()).with_clock(|| 42)
    }

    fn new_match(id: &str, a: &str, b: &str) -> NewMatch {
        NewMatch {
            id: id.into(),
            team_a: a.into(),
            team_b: b.into(),
            scheduled_at: 1_000,
            location: "Arena".into(),
        }
    }

    #[test]
    fn schedule_rejects_same_team_and_duplicates() {
        let keeper = keeper();
        assert!(matches!(
            keeper.schedule_match(new_match("m1", "eagles", "eagles")),
            Err(ScoreError::Validation(_))
        ));

        keeper.schedule_match(new_match("m1", "eagles", "sharks")).unwrap();
        assert!(matches!(
            keeper.schedule_match(new_match("m1", "owls", "sharks")),
            Err(ScoreError::Validation(_))
        ));
    }

    #[test]
    fn schedule_rejects_invalid_rules() {
        let keeper = keeper().with_rules(MatchRules {
            sets_to_win: 0,
            ..MatchRules::default()
        });
        let err = keeper
            .schedule_match(new_match("m1", "eagles", "sharks"))
            .unwrap_err();
        assert!(matches!(&err, ScoreError::Validation(msg) if msg.contains("sets_to_win")));
        assert!(matches!(
            keeper.fixture("m1"),
            Err(ScoreError::NotFound { .. })
        ));

        let keeper = keeper.with_rules(MatchRules {
            sets_to_win: 4,
            ..MatchRules::default()
        });
        assert!(keeper.schedule_match(new_match("m1", "eagles", "sharks")).is_err());
    }

    #[test]
    fn ids_cannot_contain_separator() {
        let keeper = keeper();
        for id in ["", "m1:1", "a:b"] {
            assert!(matches!(
                keeper.schedule_match(new_match(id, "eagles", "sharks")),
                Err(ScoreError::Validation(_))
            ));
        }

        let player = |id: &str| NewPlayer {
            id: id.into(),
            team_id: "eagles".into(),
            name: "Ana".into(),
            jersey_number: 1,
            position: Position::Setter,
            is_starter: true,
        };
        assert!(matches!(
            keeper.register_player(player("2:p")),
            Err(ScoreError::Validation(_))
        ));
        keeper.register_player(player("p")).unwrap();
    }

    #[test]
    fn set_scoped_timeout_needs_an_open_set() {
        let keeper =
            keeper().with_rules(MatchRules::default().with_timeout_scope(TimeoutScope::Set));
        keeper.schedule_match(new_match("m1", "eagles", "sharks")).unwrap();

        assert!(matches!(
            keeper.request_timeout("m1", Side::A),
            Err(ScoreError::InvalidTransition {
                status: MatchStatus::Upcoming,
                ..
            })
        ));
        assert_eq!(keeper.fixture("m1").unwrap().timeouts, SidePair::default());

        keeper.start_match("m1").unwrap();
        assert_eq!(keeper.request_timeout("m1", Side::A).unwrap().used, 1);
    }

    #[test]
    fn start_only_from_upcoming() {
        let keeper = keeper();
        keeper.schedule_match(new_match("m1", "eagles", "sharks")).unwrap();

        let fixture = keeper.start_match("m1").unwrap();
        assert_eq!(fixture.status, MatchStatus::Live);
        assert_eq!(fixture.start_time, Some(42));
        assert_eq!(keeper.current_set("m1").unwrap().number, 1);

        let err = keeper.start_match("m1").unwrap_err();
        assert_eq!(err.to_string(), "cannot start a match that is live");

        assert!(matches!(
            keeper.start_match("nope"),
            Err(ScoreError::NotFound {
                entity: EntityKind::Match,
                ..
            })
        ));
    }

    #[test]
    fn scheduled_match_keeps_its_rules() {
        let keeper = keeper().with_rules(MatchRules {
            timeouts_per_side: 1,
            ..MatchRules::default()
        });
        keeper.schedule_match(new_match("m1", "eagles", "sharks")).unwrap();
        let keeper = keeper.with_rules(MatchRules::default());

        keeper.request_timeout("m1", Side::A).unwrap();
        assert!(matches!(
            keeper.request_timeout("m1", Side::A),
            Err(ScoreError::QuotaExceeded { limit: 1, .. })
        ));
    }

    #[test]
    fn transitions_follow_lifecycle() {
        let keeper = keeper();
        keeper.schedule_match(new_match("m1", "eagles", "sharks")).unwrap();

        assert!(matches!(
            keeper.resume_match("m1"),
            Err(ScoreError::InvalidTransition { action: "resume", .. })
        ));
        keeper.start_match("m1").unwrap();
        assert_eq!(keeper.suspend_match("m1").unwrap().status, MatchStatus::Suspended);
        assert_eq!(
            keeper.reschedule_match("m1", 9_000).unwrap().scheduled_at,
            9_000
        );
        assert_eq!(keeper.resume_match("m1").unwrap().status, MatchStatus::Live);
        assert!(matches!(
            keeper.reschedule_match("m1", 10_000),
            Err(ScoreError::InvalidTransition {
                action: "reschedule",
                status: MatchStatus::Live
            })
        ));
        assert_eq!(keeper.current_set("m1").unwrap().number, 1);
    }

    #[test]
    fn jerseys_are_unique_per_team() {
        let keeper = keeper();
        let player = |id: &str, team: &str, jersey| NewPlayer {
            id: id.into(),
            team_id: team.into(),
            name: id.to_uppercase(),
            jersey_number: jersey,
            position: Position::Central,
            is_starter: true,
        };

        keeper.register_player(player("p1", "eagles", 7)).unwrap();
        keeper.register_player(player("p2", "sharks", 7)).unwrap();
        assert!(matches!(
            keeper.register_player(player("p3", "eagles", 7)),
            Err(ScoreError::Validation(_))
        ));
        assert!(matches!(
            keeper.register_player(player("p1", "owls", 1)),
            Err(ScoreError::Validation(_))
        ));
        assert_eq!(keeper.player("p2").unwrap().team_id, "sharks");
    }
}
