//! Stage several aggregates and write them in one all-or-nothing commit.
//!
//! ```ignore
//! repo.batch()
//!     .aggregate(&mut set)
//!     .aggregate(&mut performance)
//!     .aggregate(&mut fixture)
//!     .commit()?;
//! ```
//!
//! Nothing reaches storage until `commit`; dropping the builder (for example
//! after an early `?` return) discards every staged change.

use crate::aggregate::Aggregate;
use crate::entity::Entity;
use crate::repository::{Commit, RepositoryError};

pub struct CommitBuilder<'a, R> {
    repo: &'a R,
    entities: Vec<&'a mut Entity>,
}

impl<'a, R: Commit> CommitBuilder<'a, R> {
    pub fn new(repo: &'a R) -> Self {
        CommitBuilder {
            repo,
            entities: Vec::new(),
        }
    }

    pub fn aggregate<A: Aggregate>(mut self, aggregate: &'a mut A) -> Self {
        self.entities.push(aggregate.entity_mut());
        self
    }

    pub fn maybe_aggregate<A: Aggregate>(self, aggregate: Option<&'a mut A>) -> Self {
        match aggregate {
            Some(aggregate) => self.aggregate(aggregate),
            None => self,
        }
    }

    /// Number of staged entities that carry new events.
    pub fn pending(&self) -> usize {
        self.entities.iter().filter(|e| e.has_changes()).count()
    }

    /// Write every staged entity; returns how many carried changes.
    pub fn commit(mut self) -> Result<usize, RepositoryError> {
        let written = self.pending();
        if written > 0 {
            self.repo.commit(&mut self.entities[..])?;
        }
        Ok(written)
    }
}

pub trait CommitBuilderExt: Commit + Sized {
    fn batch(&self) -> CommitBuilder<'_, Self> {
        CommitBuilder::new(self)
    }
}

impl<R: Commit> CommitBuilderExt for R {}
