/*!
 * Lock Synchronizer
 *
 * Owner identity, recursive hold count, and the acquire/release algorithm
 * shared by both policies. All bookkeeping lives behind one monitor
 * (`state` + `monitor`); the richer semantics are composed from it.
 *
 * # Policies
 *
 * - **NonFair**: arriving threads take a free lock immediately. Blocked
 *   threads guarded-suspend on the monitor and re-check after each wakeup.
 * - **Fair**: blocked threads park on their own `WaitNode` in a FIFO queue.
 *   Release hands ownership directly to the queue head, so the lock never
 *   looks free to a third thread while a valid waiter is queued.
 *
 * `try_lock` barges under both policies.
 */

use crate::core::errors::{SyncError, SyncResult};
use crate::core::interrupt::{self, ParkRegistration, Parker};
use crate::core::sync::config::LockConfig;
use crate::core::sync::wait::{FifoWaitQueue, QueuedSync, WaitNode, WaitQueue};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::thread::{self, ThreadId};
use std::time::Instant;
use tracing::{debug, error, trace};

/// Acquisition policy, chosen at construction
pub(crate) enum Policy {
    /// Monitoring roster of blocked threads; never consulted for grants
    NonFair { roster: Vec<ThreadId> },
    Fair(FifoWaitQueue),
}

pub(crate) struct SyncState {
    owner: Option<ThreadId>,
    holds: u32,
    policy: Policy,
}

impl SyncState {
    fn enroll(&mut self, thread: ThreadId) {
        if let Policy::NonFair { roster } = &mut self.policy {
            roster.push(thread);
        }
    }

    fn withdraw(&mut self, thread: ThreadId) {
        if let Policy::NonFair { roster } = &mut self.policy {
            if let Some(index) = roster.iter().position(|t| *t == thread) {
                roster.swap_remove(index);
            }
        }
    }
}

/// Shared lock algorithm behind `ReentrantLock` and its conditions
pub struct LockSync {
    state: Mutex<SyncState>,
    monitor: Condvar,
    name: Option<String>,
}

impl LockSync {
    pub(crate) fn new(config: &LockConfig) -> Self {
        let policy = if config.fair {
            Policy::Fair(FifoWaitQueue::new())
        } else {
            Policy::NonFair { roster: Vec::new() }
        };

        Self {
            state: Mutex::new(SyncState {
                owner: None,
                holds: 0,
                policy,
            }),
            monitor: Condvar::new(),
            name: config.name.clone(),
        }
    }

    #[inline]
    pub(crate) fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[inline]
    fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("anonymous")
    }

    pub(crate) fn is_fair(&self) -> bool {
        Self::queues_nodes(&self.state.lock())
    }

    /// Whether blocked threads park on wait nodes (fair) or the monitor
    #[inline]
    fn queues_nodes(state: &SyncState) -> bool {
        match state.policy {
            Policy::Fair(_) => true,
            Policy::NonFair { .. } => false,
        }
    }

    /// Grant to `thread` if free, or bump the count if it already owns the lock
    fn acquire_or_reenter(&self, state: &mut SyncState, thread: ThreadId) -> bool {
        match state.owner {
            None => {
                state.owner = Some(thread);
                state.holds = 1;
                trace!(lock = self.label(), ?thread, "Lock acquired");
                true
            }
            Some(owner) if owner == thread => {
                state.holds = match state.holds.checked_add(1) {
                    Some(holds) => holds,
                    None => self.hold_count_overflow(),
                };
                true
            }
            Some(_) => false,
        }
    }

    #[cold]
    fn hold_count_overflow(&self) -> ! {
        error!(lock = self.label(), "Maximum lock hold count exceeded");
        panic!("{}", SyncError::HoldCountOverflow);
    }

    /// Acquire, blocking without observing interrupts
    pub(crate) fn lock(&self) {
        let me = thread::current().id();
        let mut state = self.state.lock();
        if self.acquire_or_reenter(&mut state, me) {
            return;
        }

        if Self::queues_nodes(&state) {
            drop(state);
            WaitNode::new().park_uninterruptibly(self);
            return;
        }

        state.enroll(me);
        loop {
            self.monitor.wait(&mut state);
            if self.acquire_or_reenter(&mut state, me) {
                state.withdraw(me);
                return;
            }
        }
    }

    /// Acquire, aborting with `Interrupted` if the thread is interrupted on
    /// entry or while blocked
    pub(crate) fn lock_interruptibly(self: &Arc<Self>) -> SyncResult<()> {
        if interrupt::interrupted() {
            return Err(SyncError::Interrupted);
        }

        let me = thread::current().id();
        let mut state = self.state.lock();
        if self.acquire_or_reenter(&mut state, me) {
            return Ok(());
        }

        let fair = Self::queues_nodes(&state);
        drop(state);
        if fair {
            WaitNode::new().park(self.as_ref())
        } else {
            self.wait_nonfair(me, None).map(|_| ())
        }
    }

    /// Acquire only if free or already owned; barges past queued waiters
    pub(crate) fn try_lock(&self) -> bool {
        let me = thread::current().id();
        let mut state = self.state.lock();
        self.acquire_or_reenter(&mut state, me)
    }

    /// Acquire before `deadline`, observing interrupts
    pub(crate) fn try_lock_until(self: &Arc<Self>, deadline: Instant) -> SyncResult<bool> {
        if interrupt::interrupted() {
            return Err(SyncError::Interrupted);
        }

        let me = thread::current().id();
        let mut state = self.state.lock();
        if self.acquire_or_reenter(&mut state, me) {
            return Ok(true);
        }

        let fair = Self::queues_nodes(&state);
        drop(state);
        if fair {
            WaitNode::new().park_until(self.as_ref(), deadline)
        } else {
            self.wait_nonfair(me, Some(deadline))
        }
    }

    /// Guarded suspend on the monitor for the non-fair policy
    fn wait_nonfair(self: &Arc<Self>, me: ThreadId, deadline: Option<Instant>) -> SyncResult<bool> {
        let _registration = ParkRegistration::register(self.clone());
        let mut state = self.state.lock();
        if self.acquire_or_reenter(&mut state, me) {
            return Ok(true);
        }

        state.enroll(me);
        loop {
            if interrupt::interrupted() {
                self.abandon_wait(&mut state, me);
                debug!(lock = self.label(), thread = ?me, "Lock wait aborted by interrupt");
                return Err(SyncError::Interrupted);
            }

            match deadline {
                Some(deadline) => {
                    if Instant::now() >= deadline {
                        self.abandon_wait(&mut state, me);
                        debug!(lock = self.label(), thread = ?me, "Lock wait timed out");
                        return Ok(false);
                    }
                    self.monitor.wait_until(&mut state, deadline);
                }
                None => self.monitor.wait(&mut state),
            }

            if self.acquire_or_reenter(&mut state, me) {
                state.withdraw(me);
                return Ok(true);
            }
        }
    }

    /// Leave the monitor wait, passing on a notification we may have consumed
    fn abandon_wait(&self, state: &mut SyncState, me: ThreadId) {
        state.withdraw(me);
        if state.owner.is_none() {
            self.monitor.notify_one();
        }
    }

    /// Release one hold; at zero, free the lock or hand it to the next waiter
    pub(crate) fn unlock(&self) -> SyncResult<()> {
        let me = thread::current().id();
        let mut state = self.state.lock();
        if state.owner != Some(me) {
            return Err(SyncError::not_owner("unlock"));
        }
        if state.holds > 1 {
            state.holds -= 1;
            return Ok(());
        }

        // Until a node accepts the handoff we remain the owner with one hold.
        loop {
            let next = match &mut state.policy {
                Policy::Fair(queue) => queue.extract(),
                Policy::NonFair { .. } => None,
            };

            let Some(node) = next else {
                state.owner = None;
                state.holds = 0;
                self.monitor.notify_one();
                trace!(lock = self.label(), thread = ?me, "Lock released");
                return Ok(());
            };

            drop(state);
            if node.signal(self) {
                trace!(lock = self.label(), from = ?me, to = ?node.owner(), "Lock handed off");
                return Ok(());
            }
            state = self.state.lock();
        }
    }

    /// Drop every hold the current thread has, returning how many there were
    pub(crate) fn release_all(&self, operation: &'static str) -> SyncResult<u32> {
        let saved = {
            let mut state = self.state.lock();
            if state.owner != Some(thread::current().id()) {
                return Err(SyncError::not_owner(operation));
            }
            std::mem::replace(&mut state.holds, 1)
        };
        self.unlock()?;
        Ok(saved)
    }

    /// Reacquire through the normal blocking path, then restore `holds`
    pub(crate) fn reacquire(&self, holds: u32) {
        self.lock();
        self.state.lock().holds = holds;
    }

    /// Fail with `NotOwner` unless the current thread holds the lock
    pub(crate) fn check_held(&self, operation: &'static str) -> SyncResult<()> {
        if self.is_held_by_current_thread() {
            Ok(())
        } else {
            Err(SyncError::not_owner(operation))
        }
    }

    pub(crate) fn owner(&self) -> Option<ThreadId> {
        self.state.lock().owner
    }

    pub(crate) fn is_locked(&self) -> bool {
        self.state.lock().owner.is_some()
    }

    pub(crate) fn is_held_by_current_thread(&self) -> bool {
        self.state.lock().owner == Some(thread::current().id())
    }

    /// Holds of the current thread; zero if it does not own the lock
    pub(crate) fn hold_count(&self) -> u32 {
        let state = self.state.lock();
        if state.owner == Some(thread::current().id()) {
            state.holds
        } else {
            0
        }
    }

    pub(crate) fn queue_length(&self) -> usize {
        match &self.state.lock().policy {
            Policy::Fair(queue) => queue.len(),
            Policy::NonFair { roster } => roster.len(),
        }
    }

    pub(crate) fn has_queued_thread(&self, thread: ThreadId) -> bool {
        match &self.state.lock().policy {
            Policy::Fair(queue) => queue.is_waiting(thread),
            Policy::NonFair { roster } => roster.contains(&thread),
        }
    }

    pub(crate) fn queued_threads(&self) -> Vec<ThreadId> {
        match &self.state.lock().policy {
            Policy::Fair(queue) => queue.waiting_threads(),
            Policy::NonFair { roster } => roster.clone(),
        }
    }
}

impl QueuedSync for LockSync {
    fn recheck(&self, node: &Arc<WaitNode>) -> bool {
        let mut state = self.state.lock();
        if self.acquire_or_reenter(&mut state, node.owner()) {
            return true;
        }
        match &mut state.policy {
            Policy::Fair(queue) => {
                queue.insert(node.clone());
                trace!(lock = self.label(), thread = ?node.owner(), position = queue.len(), "Lock waiter queued");
                false
            }
            Policy::NonFair { .. } => unreachable!("non-fair locks never park wait nodes"),
        }
    }

    fn take_over(&self, node: &WaitNode) {
        let mut state = self.state.lock();
        state.owner = Some(node.owner());
        state.holds = 1;
    }

    fn cancel(&self, node: &Arc<WaitNode>) {
        if let Policy::Fair(queue) = &mut self.state.lock().policy {
            queue.remove(node);
        }
    }
}

impl Parker for LockSync {
    fn unpark(&self) {
        let _state = self.state.lock();
        self.monitor.notify_all();
    }
}
