/*!
 * Wait Queue Traits
 *
 * The handoff contract between a parking `WaitNode` and the synchronizer that
 * owns its queue, and the queue abstraction itself.
 */

use super::node::WaitNode;
use std::sync::Arc;
use std::thread::ThreadId;

/// Synchronizer a `WaitNode` parks against
///
/// Lock ordering: `recheck` and `take_over` are called while the node's own
/// monitor is held, so implementations may take their state monitor but must
/// never call back into the node.
pub trait QueuedSync: Send + Sync {
    /// Called just before the node would park
    ///
    /// Returns `true` when the caller was granted immediately (the node is not
    /// enqueued); otherwise the node has been appended to the queue.
    fn recheck(&self, node: &Arc<WaitNode>) -> bool;

    /// Called by a signaller on the node it chose to wake
    ///
    /// Must complete any ownership transfer before the woken thread runs.
    fn take_over(&self, node: &WaitNode);

    /// Remove a node that invalidated itself on timeout or interrupt
    fn cancel(&self, node: &Arc<WaitNode>);
}

/// Ordered collection of parked nodes
///
/// Not synchronized: the owning synchronizer guards it with its own monitor.
/// The monitoring queries never fail and are exact only for the snapshot the
/// caller's monitor protects.
pub trait WaitQueue: Send {
    /// Append a node to the tail
    fn insert(&mut self, node: Arc<WaitNode>);

    /// Remove and return the head, if any
    fn extract(&mut self) -> Option<Arc<WaitNode>>;

    /// Remove a specific node; returns whether it was still queued
    fn remove(&mut self, node: &Arc<WaitNode>) -> bool;

    fn has_nodes(&self) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        !self.has_nodes()
    }

    /// Whether `thread` has a node in this queue
    fn is_waiting(&self, thread: ThreadId) -> bool;

    /// Threads with queued nodes, head first
    fn waiting_threads(&self) -> Vec<ThreadId>;
}
