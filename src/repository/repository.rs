use super::RepositoryError;
use crate::entity::{Committable, Entity};

/// Load entities by id.
pub trait Get {
    fn get(&self, id: &str) -> Result<Option<Entity>, RepositoryError>;

    /// Missing ids are skipped.
    fn get_many(&self, ids: &[&str]) -> Result<Vec<Entity>, RepositoryError> {
        let mut entities = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(entity) = self.get(id)? {
                entities.push(entity);
            }
        }
        Ok(entities)
    }
}

/// Scan entities.
pub trait Find {
    fn find<F>(&self, predicate: F) -> Result<Vec<Entity>, RepositoryError>
    where
        F: Fn(&Entity) -> bool;

    /// Entities whose id starts with `prefix`, ordered by id.
    fn find_by_prefix(&self, prefix: &str) -> Result<Vec<Entity>, RepositoryError> {
        let mut entities = self.find(|e| e.id().starts_with(prefix))?;
        entities.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(entities)
    }
}

/// Persist one or more entities.
///
/// Implementations must write either every entity in the batch or none of
/// them, and must reject an entity whose stored history moved on since it
/// was loaded.
pub trait Commit {
    fn commit<C: Committable + ?Sized>(&self, committable: &mut C) -> Result<(), RepositoryError>;
}

/// Everything the scoring core needs from storage.
pub trait Repository: Get + Find + Commit {}

impl<T> Repository for T where T: Get + Find + Commit {}
