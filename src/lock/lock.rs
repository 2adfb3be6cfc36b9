use super::LockError;

/// A single mutual-exclusion scope.
///
/// Unlike `std::sync::Mutex` it guards no data: holders serialize a
/// read-modify-write sequence against storage that lives elsewhere.
pub trait Lock: Send + Sync {
    /// Block until the lock is held by the caller.
    fn lock(&self) -> Result<(), LockError>;

    /// `Ok(false)` when someone else holds it.
    fn try_lock(&self) -> Result<bool, LockError>;

    fn unlock(&self) -> Result<(), LockError>;
}
