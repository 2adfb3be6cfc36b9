use serde::{Deserialize, Serialize};

use crate::{digest, Entity};

/// Counting statistics for one player.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatLine {
    pub points: u32,
    pub assists: u32,
    pub blocks: u32,
    pub aces: u32,
}

impl StatLine {
    pub fn new(points: u32, assists: u32, blocks: u32, aces: u32) -> Self {
        StatLine {
            points,
            assists,
            blocks,
            aces,
        }
    }

    pub fn points(points: u32) -> Self {
        StatLine {
            points,
            ..StatLine::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == StatLine::default()
    }

    pub fn saturating_add(self, other: StatLine) -> StatLine {
        StatLine {
            points: self.points.saturating_add(other.points),
            assists: self.assists.saturating_add(other.assists),
            blocks: self.blocks.saturating_add(other.blocks),
            aces: self.aces.saturating_add(other.aces),
        }
    }

    /// Each counter floors at zero independently.
    pub fn saturating_sub(self, other: StatLine) -> StatLine {
        StatLine {
            points: self.points.saturating_sub(other.points),
            assists: self.assists.saturating_sub(other.assists),
            blocks: self.blocks.saturating_sub(other.blocks),
            aces: self.aces.saturating_sub(other.aces),
        }
    }
}

/// A player's accumulated statistics within one set.
#[derive(Debug, Default)]
pub struct PlayerPerformance {
    pub entity: Entity,
    pub match_id: String,
    pub set_number: u32,
    pub player_id: String,
    pub totals: StatLine,
}

impl PlayerPerformance {
    pub fn entity_id(match_id: &str, set_number: u32, player_id: &str) -> String {
        format!("perf:{}:{}:{}", match_id, set_number, player_id)
    }

    /// Prefix shared by every performance recorded in a match.
    pub fn match_prefix(match_id: &str) -> String {
        format!("perf:{}:", match_id)
    }

    #[digest("Opened")]
    pub fn open(&mut self, match_id: String, set_number: u32, player_id: String) {
        self.entity
            .set_id(Self::entity_id(&match_id, set_number, &player_id));
        self.match_id = match_id;
        self.set_number = set_number;
        self.player_id = player_id;
    }

    #[digest("StatsRecorded", when = !line.is_empty())]
    pub fn record(&mut self, line: StatLine) {
        self.totals = self.totals.saturating_add(line);
    }

    #[digest("StatsRolledBack", when = !line.is_empty())]
    pub fn roll_back(&mut self, line: StatLine) {
        self.totals = self.totals.saturating_sub(line);
    }
}

crate::aggregate!(PlayerPerformance, entity {
    "Opened"(match_id, set_number, player_id) => open,
    "StatsRecorded"(line) => record,
    "StatsRolledBack"(line) => roll_back,
});
