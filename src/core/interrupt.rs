/*!
 * Thread Interruption
 *
 * Cooperative per-thread interrupt status. Interruptible blocking calls
 * (`lock_interruptibly`, `try_lock_for`, condition waits) observe it and
 * return `SyncError::Interrupted`.
 *
 * # Wakeup Protocol
 *
 * A thread about to park registers a `Parker` for the monitor it will sleep
 * on, then checks its status while holding that monitor. `interrupt()` sets
 * the status first and only then acquires the parker's monitor to notify, so
 * a waiter can never miss an interrupt between its check and its sleep.
 */

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::thread::{self, ThreadId};
use tracing::debug;

/// A monitor a blocked thread can be woken from
///
/// `unpark` must acquire the same mutex the waiter holds while checking its
/// interrupt status, then notify every sleeper on that monitor.
pub(crate) trait Parker: Send + Sync {
    fn unpark(&self);
}

struct InterruptInner {
    interrupted: bool,
    parker: Option<Arc<dyn Parker>>,
}

struct InterruptState {
    thread: ThreadId,
    inner: Mutex<InterruptInner>,
}

impl InterruptState {
    fn new() -> Self {
        Self {
            thread: thread::current().id(),
            inner: Mutex::new(InterruptInner {
                interrupted: false,
                parker: None,
            }),
        }
    }
}

thread_local! {
    static CURRENT: Arc<InterruptState> = Arc::new(InterruptState::new());
}

fn current_state() -> Arc<InterruptState> {
    CURRENT.with(Arc::clone)
}

/// Handle used to interrupt a specific thread
///
/// # Examples
///
/// ```
/// use reentrant_sync::{InterruptHandle, ReentrantLock, SyncError};
/// use std::sync::{mpsc, Arc};
/// use std::thread;
///
/// let lock = Arc::new(ReentrantLock::new(true));
/// lock.lock();
///
/// let (tx, rx) = mpsc::channel();
/// let lock_clone = lock.clone();
/// let waiter = thread::spawn(move || {
///     tx.send(InterruptHandle::current()).unwrap();
///     lock_clone.lock_interruptibly()
/// });
///
/// rx.recv().unwrap().interrupt();
/// assert_eq!(waiter.join().unwrap(), Err(SyncError::Interrupted));
/// lock.unlock().unwrap();
/// ```
#[derive(Clone)]
pub struct InterruptHandle {
    state: Arc<InterruptState>,
}

impl InterruptHandle {
    /// Handle for the calling thread
    pub fn current() -> Self {
        Self {
            state: current_state(),
        }
    }

    /// Id of the thread this handle interrupts
    #[inline]
    pub fn thread_id(&self) -> ThreadId {
        self.state.thread
    }

    /// Set the thread's interrupt status and wake it if it is parked in an
    /// interruptible wait
    pub fn interrupt(&self) {
        let parker = {
            let mut inner = self.state.inner.lock();
            inner.interrupted = true;
            inner.parker.clone()
        };

        debug!(thread = ?self.state.thread, parked = parker.is_some(), "Thread interrupted");

        if let Some(parker) = parker {
            parker.unpark();
        }
    }

    /// Check the thread's interrupt status without clearing it
    pub fn is_interrupted(&self) -> bool {
        self.state.inner.lock().interrupted
    }
}

impl fmt::Debug for InterruptHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterruptHandle")
            .field("thread", &self.state.thread)
            .field("interrupted", &self.is_interrupted())
            .finish()
    }
}

/// Check the current thread's interrupt status without clearing it
pub fn is_interrupted() -> bool {
    CURRENT.with(|state| state.inner.lock().interrupted)
}

/// Test and clear the current thread's interrupt status
pub fn interrupted() -> bool {
    CURRENT.with(|state| std::mem::replace(&mut state.inner.lock().interrupted, false))
}

/// Set the current thread's interrupt status
///
/// Used to re-assert an interrupt that arrived after a wait had already been
/// satisfied.
pub fn interrupt_current() {
    CURRENT.with(|state| state.inner.lock().interrupted = true);
}

/// Registration of the current thread's parker, cleared on drop
pub(crate) struct ParkRegistration {
    state: Arc<InterruptState>,
}

impl ParkRegistration {
    /// Register `parker` as the monitor the current thread is about to sleep on
    pub(crate) fn register(parker: Arc<dyn Parker>) -> Self {
        let state = current_state();
        state.inner.lock().parker = Some(parker);
        Self { state }
    }
}

impl Drop for ParkRegistration {
    fn drop(&mut self) {
        self.state.inner.lock().parker = None;
    }
}
