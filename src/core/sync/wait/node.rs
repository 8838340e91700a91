/*!
 * Wait Node
 *
 * Single-thread park/unpark record. Each node carries its own monitor so a
 * signaller wakes exactly the thread it chose.
 *
 * # State Machine
 *
 * `waiting == true` (unsignalled) → `waiting == false` (signalled or
 * self-invalidated), exactly once. Whoever performs the transition owns the
 * outcome: a signaller that finds the flag already cleared must move on to
 * the next node instead of assuming delivery.
 */

use super::traits::QueuedSync;
use crate::core::errors::{SyncError, SyncResult};
use crate::core::interrupt::{self, ParkRegistration, Parker};
use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::sync::Arc;
use std::thread::{self, ThreadId};
use std::time::Instant;
use tracing::{debug, trace};

/// Park/unpark record for one blocked thread
pub struct WaitNode {
    owner: ThreadId,
    waiting: Mutex<bool>,
    cond: Condvar,
}

impl WaitNode {
    /// Create a node owned by the calling thread
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            owner: thread::current().id(),
            waiting: Mutex::new(true),
            cond: Condvar::new(),
        })
    }

    /// Thread this node parks
    #[inline]
    pub fn owner(&self) -> ThreadId {
        self.owner
    }

    /// Whether the node is still unsignalled
    pub fn is_waiting(&self) -> bool {
        *self.waiting.lock()
    }

    /// Perform the unsignalled → signalled transition
    ///
    /// Returns `false` if the waiter already gave up (timeout or interrupt);
    /// the caller must then try the next queued node. On success
    /// `sync.take_over` runs before the parked thread can observe the wakeup.
    pub fn signal(&self, sync: &dyn QueuedSync) -> bool {
        let mut waiting = self.waiting.lock();
        if !*waiting {
            trace!(owner = ?self.owner, "Signal skipped invalidated node");
            return false;
        }
        *waiting = false;
        sync.take_over(self);
        self.cond.notify_one();
        true
    }

    /// Park until signalled, observing interrupts
    ///
    /// If a signal was delivered before the interrupt is noticed, the park
    /// succeeds and the interrupt status stays set on the thread.
    pub(crate) fn park(self: &Arc<Self>, sync: &dyn QueuedSync) -> SyncResult<()> {
        let _registration = ParkRegistration::register(self.clone());
        let mut waiting = self.waiting.lock();
        if sync.recheck(self) {
            return Ok(());
        }

        loop {
            if !*waiting {
                return Ok(());
            }
            if interrupt::interrupted() {
                *waiting = false;
                drop(waiting);
                sync.cancel(self);
                debug!(owner = ?self.owner, "Park aborted by interrupt");
                return Err(SyncError::Interrupted);
            }
            self.cond.wait(&mut waiting);
        }
    }

    /// Park until signalled; interrupts stay pending on the thread
    pub(crate) fn park_uninterruptibly(self: &Arc<Self>, sync: &dyn QueuedSync) {
        let mut waiting = self.waiting.lock();
        if sync.recheck(self) {
            return;
        }

        while *waiting {
            self.cond.wait(&mut waiting);
        }
    }

    /// Park until signalled or `deadline` passes, observing interrupts
    ///
    /// Returns `Ok(false)` on timeout. The remaining budget is recomputed from
    /// the deadline after every wakeup, so spurious wakeups never shorten it.
    pub(crate) fn park_until(
        self: &Arc<Self>,
        sync: &dyn QueuedSync,
        deadline: Instant,
    ) -> SyncResult<bool> {
        let _registration = ParkRegistration::register(self.clone());
        let mut waiting = self.waiting.lock();
        if sync.recheck(self) {
            return Ok(true);
        }

        loop {
            if !*waiting {
                return Ok(true);
            }
            if interrupt::interrupted() {
                *waiting = false;
                drop(waiting);
                sync.cancel(self);
                debug!(owner = ?self.owner, "Timed park aborted by interrupt");
                return Err(SyncError::Interrupted);
            }
            if Instant::now() >= deadline {
                *waiting = false;
                drop(waiting);
                sync.cancel(self);
                debug!(owner = ?self.owner, "Timed park expired");
                return Ok(false);
            }
            self.cond.wait_until(&mut waiting, deadline);
        }
    }
}

impl Parker for WaitNode {
    fn unpark(&self) {
        let _waiting = self.waiting.lock();
        self.cond.notify_all();
    }
}

impl fmt::Debug for WaitNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitNode")
            .field("owner", &self.owner)
            .field("waiting", &self.is_waiting())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::interrupt::InterruptHandle;
    use crate::core::sync::wait::{FifoWaitQueue, WaitQueue};
    use std::sync::mpsc;
    use std::time::Duration;

    /// Queue-backed sync that never grants on recheck
    #[derive(Default)]
    struct TestSync {
        queue: Mutex<FifoWaitQueue>,
        taken: Mutex<Vec<ThreadId>>,
    }

    impl QueuedSync for TestSync {
        fn recheck(&self, node: &Arc<WaitNode>) -> bool {
            self.queue.lock().insert(node.clone());
            false
        }

        fn take_over(&self, node: &WaitNode) {
            self.taken.lock().push(node.owner());
        }

        fn cancel(&self, node: &Arc<WaitNode>) {
            self.queue.lock().remove(node);
        }
    }

    impl TestSync {
        fn wait_for_queued(&self, n: usize) {
            while self.queue.lock().len() < n {
                thread::sleep(Duration::from_millis(1));
            }
        }
    }

    #[test]
    fn test_signal_transitions_once() {
        let sync = TestSync::default();
        let node = WaitNode::new();

        assert!(node.is_waiting());
        assert!(node.signal(&sync));
        assert!(!node.is_waiting());
        assert!(!node.signal(&sync));
        assert_eq!(sync.taken.lock().len(), 1);
    }

    #[test]
    fn test_park_until_times_out_and_leaves_queue() {
        let sync = TestSync::default();
        let node = WaitNode::new();
        let start = Instant::now();

        let result = node.park_until(&sync, start + Duration::from_millis(50));

        assert_eq!(result, Ok(false));
        assert!(start.elapsed() >= Duration::from_millis(50));
        assert!(!node.is_waiting());
        assert!(!sync.queue.lock().has_nodes());
        // Invalidated nodes refuse late signals
        assert!(!node.signal(&sync));
    }

    #[test]
    fn test_park_woken_by_signal() {
        let sync = Arc::new(TestSync::default());
        let sync_clone = sync.clone();

        let handle = thread::spawn(move || {
            let node = WaitNode::new();
            node.park(sync_clone.as_ref())
        });

        sync.wait_for_queued(1);
        let node = sync.queue.lock().extract().unwrap();
        assert!(node.signal(sync.as_ref()));

        assert_eq!(handle.join().unwrap(), Ok(()));
        assert_eq!(sync.taken.lock().as_slice(), &[node.owner()]);
    }

    #[test]
    fn test_park_interrupted_removes_node() {
        let sync = Arc::new(TestSync::default());
        let sync_clone = sync.clone();
        let (tx, rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            tx.send(InterruptHandle::current()).unwrap();
            let node = WaitNode::new();
            let result = node.park(sync_clone.as_ref());
            (result, interrupt::is_interrupted())
        });

        let remote = rx.recv().unwrap();
        sync.wait_for_queued(1);
        remote.interrupt();

        let (result, still_interrupted) = handle.join().unwrap();
        assert_eq!(result, Err(SyncError::Interrupted));
        assert!(!still_interrupted);
        assert!(!sync.queue.lock().has_nodes());
    }

    #[test]
    fn test_uninterruptible_park_keeps_interrupt_pending() {
        let sync = Arc::new(TestSync::default());
        let sync_clone = sync.clone();
        let (tx, rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            tx.send(InterruptHandle::current()).unwrap();
            let node = WaitNode::new();
            node.park_uninterruptibly(sync_clone.as_ref());
            interrupt::interrupted()
        });

        let remote = rx.recv().unwrap();
        sync.wait_for_queued(1);
        remote.interrupt();
        thread::sleep(Duration::from_millis(20));

        let node = sync.queue.lock().extract().unwrap();
        assert!(node.signal(sync.as_ref()));
        assert!(handle.join().unwrap());
    }
}
