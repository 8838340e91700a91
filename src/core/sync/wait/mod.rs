/*!
 * Wait Queues
 *
 * Park/unpark records and the FIFO queue that orders them:
 * - `WaitNode`: one parked thread with its own monitor
 * - `FifoWaitQueue`: arrival-ordered node queue
 * - `QueuedSync`: the recheck/take-over handoff contract nodes park against
 *
 * Shared by the fair lock and its FIFO condition.
 */

mod node;
mod queue;
mod traits;

// Re-export public API
pub use node::WaitNode;
pub use queue::FifoWaitQueue;
pub use traits::{QueuedSync, WaitQueue};
