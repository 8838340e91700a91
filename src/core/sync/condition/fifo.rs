/*!
 * FIFO Condition
 *
 * Condition for the fair lock. Waiters park on their own `WaitNode` in a
 * FIFO queue, so signals are delivered in wait order, and the hold depth is
 * reacquired through the fair lock's queue rather than by barging.
 */

use crate::core::errors::{SyncError, SyncResult};
use crate::core::guard::HoldGuard;
use crate::core::interrupt;
use crate::core::sync::wait::{FifoWaitQueue, QueuedSync, WaitNode, WaitQueue};
use crate::core::sync::LockSync;
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::ThreadId;
use std::time::Instant;
use tracing::trace;

/// Condition variable bound to a fair lock
pub struct FifoCondVar {
    sync: Arc<LockSync>,
    queue: Mutex<FifoWaitQueue>,
}

impl FifoCondVar {
    pub(crate) fn new(sync: Arc<LockSync>) -> Self {
        Self {
            sync,
            queue: Mutex::new(FifoWaitQueue::new()),
        }
    }

    #[inline]
    pub(crate) fn sync(&self) -> &Arc<LockSync> {
        &self.sync
    }

    /// Release the lock, park until signalled / `deadline` / interrupt, then
    /// restore the hold depth
    ///
    /// Returns `Ok(false)` only on timeout. Untimed uninterruptible waits are
    /// the only non-interruptible form.
    pub(crate) fn wait_with(
        self: &Arc<Self>,
        deadline: Option<Instant>,
        interruptible: bool,
    ) -> SyncResult<bool> {
        self.sync.check_held("wait")?;
        if interruptible && interrupt::interrupted() {
            return Err(SyncError::Interrupted);
        }

        // Queued before the lock is released, so no signal can slip past.
        let node = WaitNode::new();
        self.queue.lock().insert(node.clone());
        let hold = match HoldGuard::suspend(&self.sync, "wait") {
            Ok(hold) => hold,
            Err(e) => {
                self.cancel(&node);
                return Err(e);
            }
        };

        let outcome = match deadline {
            Some(deadline) => node.park_until(self.as_ref(), deadline),
            None if interruptible => node.park(self.as_ref()).map(|()| true),
            None => {
                node.park_uninterruptibly(self.as_ref());
                Ok(true)
            }
        };
        drop(hold);
        outcome
    }

    /// Wake the longest-waiting thread, skipping nodes that already gave up
    pub(crate) fn signal(&self) -> SyncResult<()> {
        self.sync.check_held("signal")?;
        loop {
            let next = self.queue.lock().extract();
            let Some(node) = next else {
                return Ok(());
            };
            if node.signal(self) {
                trace!(thread = ?node.owner(), "FIFO condition signalled");
                return Ok(());
            }
        }
    }

    /// Wake every waiting thread, in wait order
    pub(crate) fn signal_all(&self) -> SyncResult<()> {
        self.sync.check_held("signal_all")?;
        let mut woken = 0usize;
        loop {
            let next = self.queue.lock().extract();
            let Some(node) = next else {
                break;
            };
            if node.signal(self) {
                woken += 1;
            }
        }
        if woken > 0 {
            trace!(woken, "FIFO condition signalled all");
        }
        Ok(())
    }

    pub(crate) fn wait_queue_length(&self) -> usize {
        self.queue.lock().len()
    }

    pub(crate) fn waiting_threads(&self) -> Vec<ThreadId> {
        self.queue.lock().waiting_threads()
    }
}

impl QueuedSync for FifoCondVar {
    /// Nodes are queued before the lock is released; never granted early
    fn recheck(&self, _node: &Arc<WaitNode>) -> bool {
        false
    }

    /// The woken thread reacquires the lock itself
    fn take_over(&self, _node: &WaitNode) {}

    fn cancel(&self, node: &Arc<WaitNode>) {
        self.queue.lock().remove(node);
    }
}
