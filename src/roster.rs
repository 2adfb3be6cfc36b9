//! Which team a player plays for.

use std::collections::HashMap;

use crate::aggregate::GetAggregate;
use crate::domain::Player;
use crate::error::ScoreError;
use crate::repository::Get;

/// Resolves a player's team. `Ok(None)` means the player is unknown.
pub trait TeamLookup {
    fn team_of(&self, player_id: &str) -> Result<Option<String>, ScoreError>;
}

/// Player id to team id; handy as a stub.
impl TeamLookup for HashMap<String, String> {
    fn team_of(&self, player_id: &str) -> Result<Option<String>, ScoreError> {
        Ok(self.get(player_id).cloned())
    }
}

/// Looks players up in the event store.
pub struct RepositoryRoster<'a, R: ?Sized> {
    repo: &'a R,
}

impl<'a, R: Get + ?Sized> RepositoryRoster<'a, R> {
    pub fn new(repo: &'a R) -> Self {
        RepositoryRoster { repo }
    }

    pub fn player(&self, player_id: &str) -> Result<Option<Player>, ScoreError> {
        Ok(self
            .repo
            .get_aggregate::<Player>(&Player::entity_id(player_id))?)
    }
}

impl<R: Get + ?Sized> TeamLookup for RepositoryRoster<'_, R> {
    fn team_of(&self, player_id: &str) -> Result<Option<String>, ScoreError> {
        Ok(self.player(player_id)?.map(|player| player.team_id))
    }
}
