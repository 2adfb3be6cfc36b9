//! Shared fixture: one scheduled match between two registered teams.

#![allow(dead_code)]

use courtside::{
    HashMapRepository, MatchRules, NewMatch, NewPlayer, Position, ScoreKeeper, Side, StatLine,
    StatReceipt,
};

pub const MATCH: &str = "final";
pub const EAGLES: &str = "eagles";
pub const SHARKS: &str = "sharks";

/// Eagles: ana and amy start, abe is on the bench.
/// Sharks: bea and bob start, ben is on the bench.
pub const ROSTER: [(&str, &str, u32, Position, bool); 6] = [
    ("ana", EAGLES, 1, Position::OutsideHitter, true),
    ("amy", EAGLES, 2, Position::Setter, true),
    ("abe", EAGLES, 3, Position::Libero, false),
    ("bea", SHARKS, 1, Position::Opposite, true),
    ("bob", SHARKS, 2, Position::Central, true),
    ("ben", SHARKS, 3, Position::Setter, false),
];

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub struct Court {
    pub keeper: ScoreKeeper<HashMapRepository>,
}

pub fn court() -> Court {
    court_with_rules(MatchRules::default())
}

pub fn court_with_rules(rules: MatchRules) -> Court {
    init_tracing();

    let keeper = ScoreKeeper::new(HashMapRepository::new())
        .with_rules(rules)
        .with_clock(|| 1_700_000_000_000);

    for (id, team, jersey, position, starter) in ROSTER {
        keeper
            .register_player(NewPlayer {
                id: id.to_string(),
                team_id: team.to_string(),
                name: id.to_uppercase(),
                jersey_number: jersey,
                position,
                is_starter: starter,
            })
            .unwrap();
    }

    keeper
        .schedule_match(NewMatch {
            id: MATCH.to_string(),
            team_a: EAGLES.to_string(),
            team_b: SHARKS.to_string(),
            scheduled_at: 1_699_999_000_000,
            location: "Central Arena".to_string(),
        })
        .unwrap();

    Court { keeper }
}

pub fn started() -> Court {
    let court = court();
    court.start();
    court
}

impl Court {
    pub fn start(&self) {
        self.keeper.start_match(MATCH).unwrap();
    }

    pub fn current_set(&self) -> u32 {
        self.keeper.current_set(MATCH).unwrap().number
    }

    /// Points scored by ana (side A) or bea (side B) in the current set.
    pub fn score(&self, side: Side, points: u32) -> StatReceipt {
        let player = match side {
            Side::A => "ana",
            Side::B => "bea",
        };
        self.keeper
            .apply_player_stats(MATCH, self.current_set(), player, StatLine::points(points))
            .unwrap()
    }

    /// Brings a fresh current set to `a`-`b`, trailing side first so the
    /// set cannot end early.
    pub fn score_to(&self, a: u32, b: u32) -> StatReceipt {
        let (first, second) = if a <= b {
            ((Side::A, a), (Side::B, b))
        } else {
            ((Side::B, b), (Side::A, a))
        };
        self.score(first.0, first.1);
        self.score(second.0, second.1)
    }

    /// Wins the current set for `side` without conceding a point.
    pub fn win_set(&self, side: Side) -> StatReceipt {
        let target = self.keeper.current_set(MATCH).unwrap().rules.target;
        self.score(side, target)
    }
}
