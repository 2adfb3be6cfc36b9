use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ScoreError;
use crate::{digest, Entity};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    #[default]
    Central,
    OutsideHitter,
    Setter,
    Opposite,
    Libero,
}

impl Position {
    /// Two-letter scoresheet code.
    pub fn code(self) -> &'static str {
        match self {
            Position::Central => "CE",
            Position::OutsideHitter => "PR",
            Position::Setter => "AR",
            Position::Opposite => "OP",
            Position::Libero => "LI",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Position {
    type Err = ScoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CE" => Ok(Position::Central),
            "PR" => Ok(Position::OutsideHitter),
            "AR" => Ok(Position::Setter),
            "OP" => Ok(Position::Opposite),
            "LI" => Ok(Position::Libero),
            other => Err(ScoreError::Validation(format!(
                "unknown position {:?}",
                other
            ))),
        }
    }
}

#[derive(Debug, Default)]
pub struct Player {
    pub entity: Entity,
    pub player_id: String,
    pub team_id: String,
    pub name: String,
    pub jersey_number: u32,
    pub position: Position,
    pub is_starter: bool,
}

impl Player {
    pub fn entity_id(player_id: &str) -> String {
        format!("player:{}", player_id)
    }

    #[digest("Registered")]
    pub fn register(
        &mut self,
        player_id: String,
        team_id: String,
        name: String,
        jersey_number: u32,
        position: Position,
        is_starter: bool,
    ) {
        self.entity.set_id(Self::entity_id(&player_id));
        self.player_id = player_id;
        self.team_id = team_id;
        self.name = name;
        self.jersey_number = jersey_number;
        self.position = position;
        self.is_starter = is_starter;
    }

    #[digest("EnteredCourt", when = !self.is_starter)]
    pub fn enter_court(&mut self) {
        self.is_starter = true;
    }

    #[digest("LeftCourt", when = self.is_starter)]
    pub fn leave_court(&mut self) {
        self.is_starter = false;
    }
}

crate::aggregate!(Player, entity {
    "Registered"(player_id, team_id, name, jersey_number, position, is_starter) => register,
    "EnteredCourt"() => enter_court,
    "LeftCourt"() => leave_court,
});
