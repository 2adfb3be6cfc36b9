use std::sync::Arc;

use super::Lock;

/// Holds a match lock for the lifetime of one scoring operation.
pub struct MatchGuard<L: Lock> {
    key: String,
    lock: Arc<L>,
}

impl<L: Lock> MatchGuard<L> {
    pub(crate) fn new(key: impl Into<String>, lock: Arc<L>) -> Self {
        MatchGuard {
            key: key.into(),
            lock,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl<L: Lock> Drop for MatchGuard<L> {
    fn drop(&mut self) {
        if let Err(err) = self.lock.unlock() {
            tracing::error!(key = %self.key, error = %err, "failed to release match lock");
        }
    }
}
