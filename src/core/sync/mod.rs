/*!
 * Synchronization Primitives
 *
 * Reentrant locks and condition variables composed from one low-level
 * monitor (mutex + condvar) per synchronization point:
 * - Fair lock: FIFO handoff through a node queue
 * - Non-fair lock: barging allowed, guarded suspend on the lock monitor
 * - Conditions: full hold-depth release/restore around every wait
 *
 * # Architecture
 *
 * The lock owns its state monitor, which owns the wait queue, which owns the
 * parked nodes. Each node carries its own monitor so a release wakes exactly
 * one chosen thread.
 *
 * Lock order: condition monitor → node monitor → lock state monitor.
 */

mod condition;
mod config;
pub(crate) mod deadline;
mod locks;
pub mod wait;

pub use condition::Condition;
pub use config::LockConfig;
pub(crate) use locks::LockSync;
pub use locks::ReentrantLock;
pub use wait::{FifoWaitQueue, QueuedSync, WaitNode, WaitQueue};
