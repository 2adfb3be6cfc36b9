use std::fmt;

use crate::entity::{Entity, EventRecord};
use crate::repository::{Find, Get, RepositoryError};

/// A domain struct whose state is the fold of its entity's events.
///
/// Normally implemented through `aggregate!`.
pub trait Aggregate: Sized + Default {
    type ReplayError: fmt::Display;

    fn entity(&self) -> &Entity;
    fn entity_mut(&mut self) -> &mut Entity;
    fn replay_event(&mut self, event: &EventRecord) -> Result<(), Self::ReplayError>;
}

/// Rebuild an aggregate by replaying the entity's history.
pub fn hydrate<A: Aggregate>(entity: Entity) -> Result<A, RepositoryError> {
    let mut agg = A::default();
    let events = entity.events().to_vec();
    *agg.entity_mut() = entity;

    agg.entity_mut().set_replaying(true);
    let replayed = events.iter().try_for_each(|event| {
        agg.replay_event(event).map_err(|err| {
            RepositoryError::Replay(format!("{} #{}: {}", event.event_name, event.sequence, err))
        })
    });
    agg.entity_mut().set_replaying(false);

    replayed.map(|_| agg)
}

pub trait GetAggregate: Get {
    fn get_aggregate<A: Aggregate>(&self, id: &str) -> Result<Option<A>, RepositoryError> {
        self.get(id)?.map(hydrate::<A>).transpose()
    }
}

impl<R: Get + ?Sized> GetAggregate for R {}

pub trait FindAggregate: Find {
    /// Aggregates whose entity id starts with `prefix`, ordered by id.
    fn find_aggregates<A: Aggregate>(&self, prefix: &str) -> Result<Vec<A>, RepositoryError> {
        self.find_by_prefix(prefix)?
            .into_iter()
            .map(hydrate::<A>)
            .collect()
    }
}

impl<R: Find + ?Sized> FindAggregate for R {}
