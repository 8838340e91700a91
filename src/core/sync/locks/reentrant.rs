/*!
 * Reentrant Lock
 *
 * Mutual-exclusion lock an owning thread may acquire repeatedly. Each
 * acquisition must be matched by one `unlock`.
 */

use super::state::LockSync;
use crate::core::errors::SyncResult;
use crate::core::guard::LockGuard;
use crate::core::sync::condition::Condition;
use crate::core::sync::config::LockConfig;
use crate::core::sync::deadline::deadline_after;
use std::fmt;
use std::sync::Arc;
use std::thread::ThreadId;
use std::time::{Duration, Instant};

/// Reentrant mutual-exclusion lock with a fair or non-fair policy
///
/// # Policies
///
/// - **Fair**: blocked threads acquire in arrival order. `try_lock` is the
///   one deliberate exception and may take a free lock ahead of the queue.
/// - **Non-fair**: any arriving thread may take a free lock; no ordering or
///   starvation bound, but cheaper under contention.
///
/// # Examples
///
/// ```
/// use reentrant_sync::ReentrantLock;
///
/// let lock = ReentrantLock::new(false);
/// lock.lock();
/// lock.lock();
/// assert_eq!(lock.hold_count(), 2);
///
/// lock.unlock().unwrap();
/// assert!(lock.is_locked());
/// lock.unlock().unwrap();
/// assert!(!lock.is_locked());
/// ```
pub struct ReentrantLock {
    sync: Arc<LockSync>,
}

impl ReentrantLock {
    /// Create a lock with the given fairness policy
    pub fn new(fair: bool) -> Self {
        let config = if fair {
            LockConfig::fair()
        } else {
            LockConfig::nonfair()
        };
        Self::with_config(config)
    }

    pub fn with_config(config: LockConfig) -> Self {
        Self {
            sync: Arc::new(LockSync::new(&config)),
        }
    }

    /// Acquire the lock, blocking until it is available
    ///
    /// Returns immediately if the current thread already holds it. Interrupts
    /// do not abort the wait and remain pending on the thread.
    ///
    /// # Panics
    ///
    /// If the hold count would exceed `u32::MAX`.
    pub fn lock(&self) {
        self.sync.lock();
    }

    /// Acquire the lock unless the current thread is interrupted
    ///
    /// # Errors
    ///
    /// `Interrupted` if the thread was interrupted on entry or while blocked.
    /// The lock is then not held and no queue entry is left behind.
    pub fn lock_interruptibly(&self) -> SyncResult<()> {
        self.sync.lock_interruptibly()
    }

    /// Acquire the lock only if it is free or already held by this thread
    ///
    /// Never blocks. On a fair lock this barges ahead of queued threads.
    pub fn try_lock(&self) -> bool {
        self.sync.try_lock()
    }

    /// Acquire the lock, waiting at most `timeout`
    ///
    /// Returns `Ok(false)` if the timeout elapsed. Fair locks honour the queue
    /// for timed acquisition.
    ///
    /// # Errors
    ///
    /// `Interrupted` if the thread was interrupted on entry or while blocked.
    pub fn try_lock_for(&self, timeout: Duration) -> SyncResult<bool> {
        match deadline_after(timeout) {
            Some(deadline) => self.sync.try_lock_until(deadline),
            None => self.sync.lock_interruptibly().map(|()| true),
        }
    }

    /// Acquire the lock, waiting until `deadline` at the latest
    pub fn try_lock_until(&self, deadline: Instant) -> SyncResult<bool> {
        self.sync.try_lock_until(deadline)
    }

    /// Release one hold
    ///
    /// When the count reaches zero the lock is freed, or on a fair lock handed
    /// directly to the longest-waiting thread.
    ///
    /// # Errors
    ///
    /// `NotOwner` if the current thread does not hold the lock.
    pub fn unlock(&self) -> SyncResult<()> {
        self.sync.unlock()
    }

    /// Acquire and return a guard that releases this hold on drop
    pub fn guard(&self) -> LockGuard<'_> {
        self.lock();
        LockGuard::new(self)
    }

    /// Interruptible form of `guard`
    pub fn guard_interruptibly(&self) -> SyncResult<LockGuard<'_>> {
        self.lock_interruptibly()?;
        Ok(LockGuard::new(self))
    }

    /// Non-blocking form of `guard`
    pub fn try_guard(&self) -> Option<LockGuard<'_>> {
        self.try_lock().then(|| LockGuard::new(self))
    }

    /// Create a condition bound to this lock
    pub fn new_condition(&self) -> Condition {
        Condition::new(&self.sync)
    }

    pub fn is_fair(&self) -> bool {
        self.sync.is_fair()
    }

    pub fn name(&self) -> Option<&str> {
        self.sync.name()
    }

    // Monitoring queries: snapshots only, never for synchronization decisions

    /// Whether any thread holds the lock
    pub fn is_locked(&self) -> bool {
        self.sync.is_locked()
    }

    pub fn is_held_by_current_thread(&self) -> bool {
        self.sync.is_held_by_current_thread()
    }

    /// Number of holds the current thread has (zero if it does not own it)
    pub fn hold_count(&self) -> u32 {
        self.sync.hold_count()
    }

    pub fn owner(&self) -> Option<ThreadId> {
        self.sync.owner()
    }

    /// Approximate number of threads blocked acquiring the lock
    pub fn queue_length(&self) -> usize {
        self.sync.queue_length()
    }

    pub fn has_queued_threads(&self) -> bool {
        self.queue_length() > 0
    }

    pub fn has_queued_thread(&self, thread: ThreadId) -> bool {
        self.sync.has_queued_thread(thread)
    }

    /// Threads blocked acquiring the lock; arrival order for fair locks
    pub fn queued_threads(&self) -> Vec<ThreadId> {
        self.sync.queued_threads()
    }

    /// Whether any thread is waiting on `condition`
    ///
    /// # Errors
    ///
    /// - `ForeignCondition` if `condition` was created by another lock
    /// - `NotOwner` if the current thread does not hold this lock
    pub fn has_waiters(&self, condition: &Condition) -> SyncResult<bool> {
        Ok(condition.wait_queue_length(&self.sync)? > 0)
    }

    /// Approximate number of threads waiting on `condition`
    pub fn wait_queue_length(&self, condition: &Condition) -> SyncResult<usize> {
        condition.wait_queue_length(&self.sync)
    }

    pub fn waiting_threads(&self, condition: &Condition) -> SyncResult<Vec<ThreadId>> {
        condition.waiting_threads(&self.sync)
    }
}

impl Default for ReentrantLock {
    fn default() -> Self {
        Self::with_config(LockConfig::default())
    }
}

impl fmt::Display for ReentrantLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ReentrantLock")?;
        if let Some(name) = self.name() {
            write!(f, "({})", name)?;
        }
        match self.owner() {
            Some(owner) => write!(f, "[Locked by thread {:?}]", owner),
            None => write!(f, "[Unlocked]"),
        }
    }
}

impl fmt::Debug for ReentrantLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReentrantLock")
            .field("name", &self.name())
            .field("fair", &self.is_fair())
            .field("owner", &self.owner())
            .field("queue_length", &self.queue_length())
            .finish()
    }
}
