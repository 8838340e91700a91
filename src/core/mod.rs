/*!
 * Core Module
 * Lock primitives, guards, interruption, tracing setup, and error handling
 */

pub mod errors;
pub mod guard;
pub mod interrupt;
pub mod sync;
pub mod tracer;

// Re-export for convenience
pub use errors::*;
pub use guard::{Guard, GuardDrop, GuardError, GuardMetadata, GuardResult, HoldGuard, LockGuard};
pub use interrupt::InterruptHandle;
pub use sync::{Condition, LockConfig, ReentrantLock};
