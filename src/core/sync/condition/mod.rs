/*!
 * Condition Variables
 *
 * Conditions bound to a reentrant lock:
 * - `CondVar`: waiters sleep on the condition's own monitor (non-fair locks)
 * - `FifoCondVar`: waiters park on queued nodes, reacquire through the fair
 *   lock's queue (fair locks)
 * - `Condition`: the handle `ReentrantLock::new_condition` returns
 */

mod condition;
mod fifo;
mod monitor;

// Re-export public API
pub use condition::Condition;
