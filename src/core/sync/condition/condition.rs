/*!
 * Condition Handle
 *
 * Public face of a condition variable. The variant is fixed by the lock that
 * created it: monitor-based for non-fair locks, FIFO-queue based for fair
 * locks.
 */

use super::fifo::FifoCondVar;
use super::monitor::CondVar;
use crate::core::errors::{SyncError, SyncResult};
use crate::core::sync::deadline::{deadline_after, remaining};
use crate::core::sync::LockSync;
use std::fmt;
use std::sync::Arc;
use std::thread::ThreadId;
use std::time::{Duration, Instant};

enum ConditionKind {
    Monitor(Arc<CondVar>),
    Fifo(Arc<FifoCondVar>),
}

/// Condition variable bound to one `ReentrantLock`
///
/// Every wait releases the lock completely (whatever the recursive depth),
/// blocks, then reacquires the same depth before returning, on every exit
/// path. Waits never return spuriously.
///
/// # Examples
///
/// ```
/// use reentrant_sync::ReentrantLock;
/// use std::sync::Arc;
/// use std::thread;
///
/// let lock = Arc::new(ReentrantLock::new(false));
/// let ready = Arc::new(lock.new_condition());
///
/// lock.lock();
/// let (lock2, ready2) = (lock.clone(), ready.clone());
/// let signaller = thread::spawn(move || {
///     lock2.lock();
///     ready2.signal().unwrap();
///     lock2.unlock().unwrap();
/// });
///
/// ready.wait().unwrap();
/// assert_eq!(lock.hold_count(), 1);
/// lock.unlock().unwrap();
/// signaller.join().unwrap();
/// ```
pub struct Condition {
    kind: ConditionKind,
}

impl Condition {
    pub(crate) fn new(sync: &Arc<LockSync>) -> Self {
        let kind = if sync.is_fair() {
            ConditionKind::Fifo(Arc::new(FifoCondVar::new(sync.clone())))
        } else {
            ConditionKind::Monitor(Arc::new(CondVar::new(sync.clone())))
        };
        Self { kind }
    }

    fn sync(&self) -> &Arc<LockSync> {
        match &self.kind {
            ConditionKind::Monitor(cv) => cv.sync(),
            ConditionKind::Fifo(cv) => cv.sync(),
        }
    }

    /// Whether this condition was created by the lock owning `sync`
    #[inline]
    pub(crate) fn is_bound_to(&self, sync: &Arc<LockSync>) -> bool {
        Arc::ptr_eq(self.sync(), sync)
    }

    /// Whether waiters reacquire through a fair lock's FIFO queue
    pub fn is_fifo(&self) -> bool {
        matches!(self.kind, ConditionKind::Fifo(_))
    }

    fn wait_with(&self, deadline: Option<Instant>, interruptible: bool) -> SyncResult<bool> {
        match &self.kind {
            ConditionKind::Monitor(cv) => cv.wait_with(deadline, interruptible),
            ConditionKind::Fifo(cv) => cv.wait_with(deadline, interruptible),
        }
    }

    /// Wait until signalled or interrupted
    ///
    /// # Errors
    ///
    /// - `NotOwner` if the current thread does not hold the lock
    /// - `Interrupted` if interrupted before a signal arrived; the hold depth
    ///   is restored before the error is returned
    pub fn wait(&self) -> SyncResult<()> {
        self.wait_with(None, true).map(|_| ())
    }

    /// Wait until signalled; an interrupt stays pending on the thread
    pub fn wait_uninterruptibly(&self) -> SyncResult<()> {
        self.wait_with(None, false).map(|_| ())
    }

    /// Wait at most `timeout`; `Ok(false)` if it elapsed without a signal
    pub fn wait_timeout(&self, timeout: Duration) -> SyncResult<bool> {
        self.wait_with(deadline_after(timeout), true)
    }

    /// Wait at most `timeout`, returning the unused part of the budget
    ///
    /// `Duration::ZERO` means the wait timed out (or was signalled right at
    /// the deadline).
    pub fn wait_nanos(&self, timeout: Duration) -> SyncResult<Duration> {
        match deadline_after(timeout) {
            Some(deadline) => {
                let signalled = self.wait_with(Some(deadline), true)?;
                Ok(if signalled { remaining(deadline) } else { Duration::ZERO })
            }
            None => self.wait_with(None, true).map(|_| timeout),
        }
    }

    /// Wait until `deadline`; `Ok(false)` if it passed without a signal
    pub fn wait_until(&self, deadline: Instant) -> SyncResult<bool> {
        self.wait_with(Some(deadline), true)
    }

    /// Wake one waiting thread; the caller keeps the lock
    pub fn signal(&self) -> SyncResult<()> {
        match &self.kind {
            ConditionKind::Monitor(cv) => cv.signal(),
            ConditionKind::Fifo(cv) => cv.signal(),
        }
    }

    /// Wake every waiting thread; the caller keeps the lock
    pub fn signal_all(&self) -> SyncResult<()> {
        match &self.kind {
            ConditionKind::Monitor(cv) => cv.signal_all(),
            ConditionKind::Fifo(cv) => cv.signal_all(),
        }
    }

    /// Validate binding and ownership before a monitoring query
    fn check_query(&self, sync: &Arc<LockSync>, operation: &'static str) -> SyncResult<()> {
        if !self.is_bound_to(sync) {
            return Err(SyncError::ForeignCondition);
        }
        sync.check_held(operation)
    }

    pub(crate) fn wait_queue_length(&self, sync: &Arc<LockSync>) -> SyncResult<usize> {
        self.check_query(sync, "wait_queue_length")?;
        Ok(match &self.kind {
            ConditionKind::Monitor(cv) => cv.wait_queue_length(),
            ConditionKind::Fifo(cv) => cv.wait_queue_length(),
        })
    }

    pub(crate) fn waiting_threads(&self, sync: &Arc<LockSync>) -> SyncResult<Vec<ThreadId>> {
        self.check_query(sync, "waiting_threads")?;
        Ok(match &self.kind {
            ConditionKind::Monitor(cv) => cv.waiting_threads(),
            ConditionKind::Fifo(cv) => cv.waiting_threads(),
        })
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Condition")
            .field("fifo", &self.is_fifo())
            .field("lock", &self.sync().name())
            .finish()
    }
}
