use crate::rules::SetRules;
use crate::score_engine::evaluate_set_with;
use crate::side::{Side, SidePair};
use crate::{digest, Entity};

/// One set of a match: the running score and substitution counters.
///
/// Once a set is completed its score no longer grows, though subtractions
/// (stat corrections) are still applied.
#[derive(Debug, Default)]
pub struct MatchSet {
    pub entity: Entity,
    pub match_id: String,
    pub number: u32,
    pub rules: SetRules,
    pub points: SidePair<u32>,
    pub completed: bool,
    pub winner: Option<Side>,
    pub substitutions: SidePair<u8>,
    pub substitution_limit: u8,
}

impl MatchSet {
    pub fn entity_id(match_id: &str, number: u32) -> String {
        format!("set:{}:{}", match_id, number)
    }

    #[digest("Opened")]
    pub fn open(&mut self, match_id: String, number: u32, rules: SetRules, substitution_limit: u8) {
        self.entity.set_id(Self::entity_id(&match_id, number));
        self.match_id = match_id;
        self.number = number;
        self.rules = rules;
        self.substitution_limit = substitution_limit;
    }

    #[digest("PointsAdded", when = !self.completed && amount > 0)]
    pub fn add_points(&mut self, side: Side, amount: u32) {
        let points = self.points.get_mut(side);
        *points = points.saturating_add(amount);

        let outcome = evaluate_set_with(&self.rules, self.points.a, self.points.b);
        if let Some(winner) = outcome.winner() {
            self.completed = true;
            self.winner = Some(winner);
        }
    }

    /// Never re-opens a completed set.
    #[digest("PointsSubtracted", when = amount > 0)]
    pub fn subtract_points(&mut self, side: Side, amount: u32) {
        let points = self.points.get_mut(side);
        *points = points.saturating_sub(amount);
    }

    #[digest("SubstitutionUsed", when = self.can_substitute(side))]
    pub fn use_substitution(&mut self, side: Side) {
        *self.substitutions.get_mut(side) += 1;
    }

    /// Adds points and returns the winner if this call completed the set.
    pub fn award(&mut self, side: Side, amount: u32) -> Option<Side> {
        let was_completed = self.completed;
        self.add_points(side, amount);
        if was_completed {
            None
        } else {
            self.winner
        }
    }

    /// Returns false, leaving the counter untouched, at the limit.
    pub fn try_use_substitution(&mut self, side: Side) -> bool {
        if !self.can_substitute(side) {
            return false;
        }
        self.use_substitution(side);
        true
    }

    pub fn can_substitute(&self, side: Side) -> bool {
        self.substitutions.of(side) < self.substitution_limit
    }

    pub fn score(&self) -> (u32, u32) {
        (self.points.a, self.points.b)
    }
}

crate::aggregate!(MatchSet, entity {
    "Opened"(match_id, number, rules, substitution_limit) => open,
    "PointsAdded"(side, amount) => add_points,
    "PointsSubtracted"(side, amount) => subtract_points,
    "SubstitutionUsed"(side) => use_substitution,
});

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{hydrate, Aggregate};

    fn opened(number: u32) -> MatchSet {
        let mut set = MatchSet::default();
        set.open("m1".into(), number, SetRules::for_set(number), 6);
        set
    }

    #[test]
    fn open_assigns_identity() {
        let set = opened(2);
        assert_eq!(set.entity.id(), "set:m1:2");
        assert_eq!(set.score(), (0, 0));
        assert!(!set.completed);
    }

    #[test]
    fn completes_at_target_with_margin() {
        let mut set = opened(1);
        set.add_points(Side::A, 24);
        set.add_points(Side::B, 23);
        assert!(!set.completed);

        assert_eq!(set.award(Side::A, 1), Some(Side::A));
        assert!(set.completed);
        assert_eq!(set.score(), (25, 23));
    }

    #[test]
    fn completed_set_stops_scoring() {
        let mut set = opened(1);
        set.add_points(Side::A, 25);
        let version = set.entity.version();

        assert_eq!(set.award(Side::B, 3), None);
        assert_eq!(set.score(), (25, 0));
        assert_eq!(set.entity.version(), version);
    }

    #[test]
    fn zero_amounts_record_nothing() {
        let mut set = opened(1);
        set.add_points(Side::A, 0);
        set.subtract_points(Side::B, 0);
        assert_eq!(set.entity.version(), 1);
    }

    #[test]
    fn deciding_set_needs_fifteen_and_two() {
        let mut set = opened(5);
        set.add_points(Side::A, 14);
        set.add_points(Side::B, 14);
        set.add_points(Side::A, 1);
        assert!(!set.completed);
        set.add_points(Side::A, 1);
        assert_eq!(set.winner, Some(Side::A));
        assert_eq!(set.score(), (16, 14));
    }

    #[test]
    fn subtraction_floors_at_zero_and_keeps_completion() {
        let mut set = opened(1);
        set.add_points(Side::B, 3);
        set.subtract_points(Side::B, 5);
        assert_eq!(set.points.b, 0);

        set.add_points(Side::A, 25);
        set.subtract_points(Side::A, 10);
        assert!(set.completed);
        assert_eq!(set.winner, Some(Side::A));
        assert_eq!(set.points.a, 15);
    }

    #[test]
    fn substitutions_are_limited_per_side() {
        let mut set = opened(1);
        for _ in 0..6 {
            assert!(set.try_use_substitution(Side::B));
        }
        assert!(!set.try_use_substitution(Side::B));
        assert_eq!(set.substitutions, SidePair::new(0, 6));
        assert!(set.can_substitute(Side::A));
    }

    #[test]
    fn replay_rebuilds_score_and_completion() {
        let mut set = opened(3);
        set.add_points(Side::B, 20);
        set.add_points(Side::A, 18);
        set.use_substitution(Side::A);
        set.add_points(Side::B, 5);
        set.subtract_points(Side::A, 2);

        let replayed: MatchSet = hydrate(set.entity().clone()).unwrap();
        assert_eq!(replayed.score(), (16, 25));
        assert_eq!(replayed.winner, Some(Side::B));
        assert_eq!(replayed.number, 3);
        assert_eq!(replayed.substitutions, SidePair::new(1, 0));
        assert_eq!(replayed.entity.version(), set.entity.version());
    }
}
