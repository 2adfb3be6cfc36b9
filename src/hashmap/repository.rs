use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use crate::entity::{Committable, Entity, EventRecord};
use crate::repository::{Commit, Find, Get, RepositoryError};

/// In-memory event store. Clones share the same storage.
#[derive(Clone, Default)]
pub struct HashMapRepository {
    storage: Arc<RwLock<HashMap<String, Vec<EventRecord>>>>,
}

impl HashMapRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> Result<usize, RepositoryError> {
        Ok(self
            .storage
            .read()
            .map_err(|_| RepositoryError::LockPoisoned("read"))?
            .len())
    }

    pub fn is_empty(&self) -> Result<bool, RepositoryError> {
        Ok(self.len()? == 0)
    }

    /// Dump every stream as JSON, keyed by entity id.
    pub fn to_json(&self) -> Result<String, RepositoryError> {
        let storage = self
            .storage
            .read()
            .map_err(|_| RepositoryError::LockPoisoned("export"))?;
        let ordered: BTreeMap<&String, &Vec<EventRecord>> = storage.iter().collect();
        serde_json::to_string(&ordered).map_err(|e| RepositoryError::Serialization(e.to_string()))
    }

    /// Rebuild a store from [`HashMapRepository::to_json`] output.
    pub fn from_json(json: &str) -> Result<Self, RepositoryError> {
        let streams: HashMap<String, Vec<EventRecord>> =
            serde_json::from_str(json).map_err(|e| RepositoryError::Serialization(e.to_string()))?;
        Ok(HashMapRepository {
            storage: Arc::new(RwLock::new(streams)),
        })
    }
}

impl Get for HashMapRepository {
    fn get(&self, id: &str) -> Result<Option<Entity>, RepositoryError> {
        let storage = self
            .storage
            .read()
            .map_err(|_| RepositoryError::LockPoisoned("read"))?;

        Ok(storage.get(id).map(|events| {
            let mut entity = Entity::with_id(id);
            entity.load_from_history(events.clone());
            entity
        }))
    }
}

impl Find for HashMapRepository {
    fn find<F>(&self, predicate: F) -> Result<Vec<Entity>, RepositoryError>
    where
        F: Fn(&Entity) -> bool,
    {
        let storage = self
            .storage
            .read()
            .map_err(|_| RepositoryError::LockPoisoned("find"))?;

        Ok(storage
            .iter()
            .map(|(id, events)| {
                let mut entity = Entity::with_id(id.as_str());
                entity.load_from_history(events.clone());
                entity
            })
            .filter(|entity| predicate(entity))
            .collect())
    }
}

impl Commit for HashMapRepository {
    fn commit<C: Committable + ?Sized>(&self, committable: &mut C) -> Result<(), RepositoryError> {
        let mut entities = committable.entities_mut();
        let mut storage = self
            .storage
            .write()
            .map_err(|_| RepositoryError::LockPoisoned("write"))?;

        // Validate the whole batch before touching storage.
        for entity in entities.iter().filter(|e| e.has_changes()) {
            let stored = storage.get(entity.id()).map_or(0, |events| events.len() as u64);
            if stored != entity.committed_version() {
                return Err(RepositoryError::ConcurrentWrite {
                    id: entity.id().to_string(),
                    expected: entity.committed_version(),
                    actual: stored,
                });
            }
        }

        for entity in entities.iter_mut().filter(|e| e.has_changes()) {
            storage
                .entry(entity.id().to_string())
                .or_default()
                .extend(entity.new_events().iter().cloned());
            entity.mark_committed();
        }

        Ok(())
    }
}
