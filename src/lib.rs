/*!
 * Reentrant Sync Library
 * Fair and non-fair reentrant locks with condition variables, built on one
 * low-level monitor primitive
 */

pub mod core;

// Re-exports
pub use crate::core::errors::{SyncError, SyncResult};
pub use crate::core::guard::{Guard, GuardError, GuardResult, HoldGuard, LockGuard};
pub use crate::core::interrupt;
pub use crate::core::interrupt::InterruptHandle;
pub use crate::core::sync::{Condition, LockConfig, ReentrantLock};
