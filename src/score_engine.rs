//! Set and match completion rules.
//!
//! Pure classification of scores: no state, no failure modes.

use serde::{Deserialize, Serialize};

use crate::rules::SetRules;
use crate::side::Side;

/// Sets a side needs to take the match under the default rules.
pub const SETS_TO_WIN: u8 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetOutcome {
    InPlay,
    Won(Side),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchOutcome {
    InPlay,
    Won(Side),
}

impl SetOutcome {
    pub fn winner(self) -> Option<Side> {
        match self {
            SetOutcome::Won(side) => Some(side),
            SetOutcome::InPlay => None,
        }
    }
}

impl MatchOutcome {
    pub fn winner(self) -> Option<Side> {
        match self {
            MatchOutcome::Won(side) => Some(side),
            MatchOutcome::InPlay => None,
        }
    }
}

/// Default rules: sets 1-4 to 25, set 5 to 15, two-point lead, no cap.
pub fn evaluate_set(set_number: u32, points_a: u32, points_b: u32) -> SetOutcome {
    evaluate_set_with(&SetRules::for_set(set_number), points_a, points_b)
}

/// A set is won once a side has reached the target with the required lead,
/// or (when a cap is configured) once the leader reaches the cap.
pub fn evaluate_set_with(rules: &SetRules, points_a: u32, points_b: u32) -> SetOutcome {
    if points_a == points_b {
        return SetOutcome::InPlay;
    }

    let (leader, high, low) = if points_a > points_b {
        (Side::A, points_a, points_b)
    } else {
        (Side::B, points_b, points_a)
    };

    let by_margin = high >= rules.target && high - low >= rules.margin;
    let by_cap = rules.cap.is_some_and(|cap| high >= cap);

    if by_margin || by_cap {
        SetOutcome::Won(leader)
    } else {
        SetOutcome::InPlay
    }
}

pub fn evaluate_match(sets_won_a: u8, sets_won_b: u8) -> MatchOutcome {
    evaluate_match_with(SETS_TO_WIN, sets_won_a, sets_won_b)
}

/// Decided the moment either side's set count reaches `sets_to_win`.
pub fn evaluate_match_with(sets_to_win: u8, sets_won_a: u8, sets_won_b: u8) -> MatchOutcome {
    if sets_won_a >= sets_to_win {
        MatchOutcome::Won(Side::A)
    } else if sets_won_b >= sets_to_win {
        MatchOutcome::Won(Side::B)
    } else {
        MatchOutcome::InPlay
    }
}
