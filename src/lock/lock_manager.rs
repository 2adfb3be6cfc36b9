use std::sync::Arc;

use super::{Lock, LockError, MatchGuard};

/// Hands out one lock per key (a match id for the scoring core).
///
/// Repeated calls with the same key must yield the same logical lock.
pub trait LockManager: Send + Sync {
    type Lock: Lock;

    fn get_lock(&self, key: &str) -> Result<Arc<Self::Lock>, LockError>;

    /// Acquire the lock for `key`, released when the guard drops.
    fn acquire(&self, key: &str) -> Result<MatchGuard<Self::Lock>, LockError> {
        let lock = self.get_lock(key)?;
        lock.lock()?;
        Ok(MatchGuard::new(key, lock))
    }
}
