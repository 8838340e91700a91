/*!
 * RAII Lock Guards
 *
 * Scoped ownership of reentrant lock holds with automatic cleanup.
 *
 * ## Guard Types
 *
 * - **LockGuard**: one hold on a `ReentrantLock`, released on drop
 * - **HoldGuard**: the full hold depth suspended across a condition wait,
 *   restored on drop on every exit path (including unwinding)
 *
 * ## Example
 *
 * ```rust
 * use reentrant_sync::ReentrantLock;
 *
 * let lock = ReentrantLock::new(false);
 * {
 *     let _guard = lock.guard();
 *     assert!(lock.is_held_by_current_thread());
 * }
 * assert!(!lock.is_locked());
 * ```
 */

mod hold;
mod lock;
mod traits;

pub use hold::HoldGuard;
pub use lock::LockGuard;
pub use traits::{Guard, GuardDrop};

use crate::core::errors::SyncError;

/// Result type for guard operations
pub type GuardResult<T> = Result<T, GuardError>;

/// Errors that can occur during guard operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GuardError {
    #[error("Resource already released")]
    AlreadyReleased,

    #[error(transparent)]
    Sync(#[from] SyncError),
}

/// Guard metadata for observability
#[derive(Debug, Clone)]
pub struct GuardMetadata {
    pub resource_type: &'static str,
    pub creation_time: std::time::Instant,
}

impl GuardMetadata {
    #[inline]
    pub fn new(resource_type: &'static str) -> Self {
        Self {
            resource_type,
            creation_time: std::time::Instant::now(),
        }
    }

    #[inline]
    pub fn lifetime_micros(&self) -> u64 {
        self.creation_time.elapsed().as_micros() as u64
    }
}
