/*!
 * Monitor Condition
 *
 * Condition for the non-fair lock. Waiters sleep on the condition's own
 * monitor; each holds a ticket that only an explicit signal releases, so a
 * spurious condvar wakeup never ends a wait.
 */

use crate::core::errors::{SyncError, SyncResult};
use crate::core::guard::HoldGuard;
use crate::core::interrupt::{self, ParkRegistration, Parker};
use crate::core::sync::LockSync;
use ahash::AHashSet;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;
use std::thread::{self, ThreadId};
use std::time::Instant;
use tracing::{debug, trace};

#[derive(Default)]
struct CondState {
    next_ticket: u64,
    /// Unsignalled waiters, oldest first
    waiting: VecDeque<(u64, ThreadId)>,
    /// Signalled tickets not yet consumed by their waiter
    released: AHashSet<u64>,
}

impl CondState {
    fn enter(&mut self) -> u64 {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.waiting.push_back((ticket, thread::current().id()));
        ticket
    }

    fn leave(&mut self, ticket: u64) {
        self.waiting.retain(|(t, _)| *t != ticket);
    }
}

/// Condition variable bound to a non-fair lock
pub struct CondVar {
    sync: Arc<LockSync>,
    state: Mutex<CondState>,
    cond: Condvar,
}

impl CondVar {
    pub(crate) fn new(sync: Arc<LockSync>) -> Self {
        Self {
            sync,
            state: Mutex::new(CondState::default()),
            cond: Condvar::new(),
        }
    }

    #[inline]
    pub(crate) fn sync(&self) -> &Arc<LockSync> {
        &self.sync
    }

    /// Release the lock, block until signalled / `deadline` / interrupt, then
    /// restore the hold depth
    ///
    /// Returns `Ok(false)` only on timeout.
    pub(crate) fn wait_with(
        self: &Arc<Self>,
        deadline: Option<Instant>,
        interruptible: bool,
    ) -> SyncResult<bool> {
        self.sync.check_held("wait")?;
        if interruptible && interrupt::interrupted() {
            return Err(SyncError::Interrupted);
        }

        let ticket = self.state.lock().enter();
        let hold = match HoldGuard::suspend(&self.sync, "wait") {
            Ok(hold) => hold,
            Err(e) => {
                self.state.lock().leave(ticket);
                return Err(e);
            }
        };

        let outcome = self.block(ticket, deadline, interruptible);
        drop(hold);
        outcome
    }

    fn block(
        self: &Arc<Self>,
        ticket: u64,
        deadline: Option<Instant>,
        interruptible: bool,
    ) -> SyncResult<bool> {
        let _registration = interruptible.then(|| ParkRegistration::register(self.clone()));
        let mut state = self.state.lock();

        loop {
            // A delivered signal wins over a concurrent interrupt or timeout.
            if state.released.remove(&ticket) {
                return Ok(true);
            }
            if interruptible && interrupt::interrupted() {
                state.leave(ticket);
                debug!(ticket, "Condition wait aborted by interrupt");
                return Err(SyncError::Interrupted);
            }

            match deadline {
                Some(deadline) => {
                    if Instant::now() >= deadline {
                        state.leave(ticket);
                        debug!(ticket, "Condition wait timed out");
                        return Ok(false);
                    }
                    self.cond.wait_until(&mut state, deadline);
                }
                None => self.cond.wait(&mut state),
            }
        }
    }

    /// Wake the longest-waiting thread, if any
    pub(crate) fn signal(&self) -> SyncResult<()> {
        self.sync.check_held("signal")?;
        let mut state = self.state.lock();
        if let Some((ticket, thread)) = state.waiting.pop_front() {
            state.released.insert(ticket);
            self.cond.notify_all();
            trace!(ticket, ?thread, "Condition signalled");
        }
        Ok(())
    }

    /// Wake every waiting thread
    pub(crate) fn signal_all(&self) -> SyncResult<()> {
        self.sync.check_held("signal_all")?;
        let mut state = self.state.lock();
        if state.waiting.is_empty() {
            return Ok(());
        }

        let woken = state.waiting.len();
        let CondState {
            waiting, released, ..
        } = &mut *state;
        released.extend(waiting.drain(..).map(|(ticket, _)| ticket));
        self.cond.notify_all();
        trace!(woken, "Condition signalled all");
        Ok(())
    }

    pub(crate) fn wait_queue_length(&self) -> usize {
        self.state.lock().waiting.len()
    }

    pub(crate) fn waiting_threads(&self) -> Vec<ThreadId> {
        self.state.lock().waiting.iter().map(|(_, t)| *t).collect()
    }
}

impl Parker for CondVar {
    fn unpark(&self) {
        let _state = self.state.lock();
        self.cond.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sync::LockConfig;
    use std::time::Duration;

    fn cond() -> Arc<CondVar> {
        Arc::new(CondVar::new(Arc::new(LockSync::new(&LockConfig::nonfair()))))
    }

    #[test]
    fn test_wait_requires_lock() {
        let cond = cond();
        assert_eq!(cond.wait_with(None, true), Err(SyncError::not_owner("wait")));
        assert_eq!(cond.signal(), Err(SyncError::not_owner("signal")));
        assert_eq!(cond.signal_all(), Err(SyncError::not_owner("signal_all")));
    }

    #[test]
    fn test_timed_wait_restores_depth() {
        let cond = cond();
        cond.sync().lock();
        cond.sync().lock();

        let start = Instant::now();
        let signalled = cond.wait_with(Some(start + Duration::from_millis(30)), true);

        assert_eq!(signalled, Ok(false));
        assert!(start.elapsed() >= Duration::from_millis(30));
        assert_eq!(cond.sync().hold_count(), 2);
        assert_eq!(cond.wait_queue_length(), 0);
        cond.sync().unlock().unwrap();
        cond.sync().unlock().unwrap();
    }

    #[test]
    fn test_signal_without_waiters_is_noop() {
        let cond = cond();
        cond.sync().lock();
        assert_eq!(cond.signal(), Ok(()));
        assert_eq!(cond.signal_all(), Ok(()));
        assert!(cond.state.lock().released.is_empty());
        cond.sync().unlock().unwrap();
    }

    #[test]
    fn test_signal_releases_oldest_ticket() {
        let cond = cond();
        {
            let mut state = cond.state.lock();
            let first = state.enter();
            let second = state.enter();
            assert_eq!((first, second), (0, 1));
        }

        cond.sync().lock();
        cond.signal().unwrap();
        cond.sync().unlock().unwrap();

        let state = cond.state.lock();
        assert!(state.released.contains(&0));
        assert_eq!(state.waiting.len(), 1);
    }
}
