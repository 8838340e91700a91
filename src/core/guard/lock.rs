/*!
 * Scoped Lock Guard
 *
 * One hold on a `ReentrantLock`, released when the guard goes out of scope
 */

use super::traits::{Guard, GuardDrop};
use super::{GuardError, GuardMetadata, GuardResult};
use crate::core::sync::ReentrantLock;
use std::fmt;
use std::marker::PhantomData;
use tracing::warn;

/// RAII hold on a `ReentrantLock`
///
/// Not `Send`: the hold belongs to the thread that acquired it.
///
/// # Example
///
/// ```rust
/// use reentrant_sync::{Guard, ReentrantLock};
///
/// let lock = ReentrantLock::new(true);
/// let mut outer = lock.guard();
/// {
///     let _inner = lock.guard();
///     assert_eq!(lock.hold_count(), 2);
/// }
/// assert_eq!(lock.hold_count(), 1);
/// outer.release().unwrap();
/// assert!(!lock.is_locked());
/// ```
pub struct LockGuard<'a> {
    lock: &'a ReentrantLock,
    metadata: GuardMetadata,
    active: bool,
    _not_send: PhantomData<*const ()>,
}

impl<'a> LockGuard<'a> {
    /// Wrap a hold the current thread already acquired
    pub(crate) fn new(lock: &'a ReentrantLock) -> Self {
        Self {
            lock,
            metadata: GuardMetadata::new("lock"),
            active: true,
            _not_send: PhantomData,
        }
    }

    /// The guarded lock
    #[inline]
    pub fn lock(&self) -> &'a ReentrantLock {
        self.lock
    }
}

impl Guard for LockGuard<'_> {
    fn resource_type(&self) -> &'static str {
        self.metadata.resource_type
    }

    fn metadata(&self) -> &GuardMetadata {
        &self.metadata
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn release(&mut self) -> GuardResult<()> {
        if !self.active {
            return Err(GuardError::AlreadyReleased);
        }
        self.active = false;
        self.lock.unlock()?;
        Ok(())
    }
}

impl GuardDrop for LockGuard<'_> {
    fn on_drop(&mut self) {
        if let Err(e) = self.release() {
            if e != GuardError::AlreadyReleased {
                warn!(
                    lock = %self.lock,
                    held_us = self.metadata.lifetime_micros(),
                    "Failed to release lock guard: {}",
                    e
                );
            }
        }
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        self.on_drop();
    }
}

impl fmt::Debug for LockGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockGuard")
            .field("lock", &format_args!("{}", self.lock))
            .field("active", &self.active)
            .finish()
    }
}
