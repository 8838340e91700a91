/*!
 * Reentrant Locks
 *
 * - `LockSync`: owner, hold count, and the fair/non-fair acquisition algorithm
 * - `ReentrantLock`: public lock handle and condition factory
 */

mod reentrant;
mod state;

// Re-export public API
pub use reentrant::ReentrantLock;
pub(crate) use state::LockSync;
