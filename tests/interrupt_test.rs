/*!
 * Interruption Tests
 *
 * Interrupting blocked threads must return them promptly with no leaked
 * queue entries and no inconsistent hold counts
 */

use pretty_assertions::assert_eq;
use reentrant_sync::core::tracer::try_init_tracing;
use reentrant_sync::{interrupt, InterruptHandle, ReentrantLock, SyncError};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Spawn `f` and hand back its interrupt handle along with the join handle
fn spawn_interruptible<T, F>(f: F) -> (InterruptHandle, thread::JoinHandle<T>)
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    let handle = thread::spawn(move || {
        tx.send(InterruptHandle::current()).unwrap();
        f()
    });
    (rx.recv().unwrap(), handle)
}

fn wait_until(mut done: impl FnMut() -> bool) {
    let start = Instant::now();
    while !done() {
        assert!(start.elapsed() < Duration::from_secs(5), "Condition never reached");
        thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn test_lock_interruptibly_aborts_blocked_thread() {
    try_init_tracing();
    for fair in [false, true] {
        let lock = Arc::new(ReentrantLock::new(fair));
        lock.lock();
        lock.lock();

        let lock_clone = lock.clone();
        let (remote, waiter) = spawn_interruptible(move || {
            let result = lock_clone.lock_interruptibly();
            (result, lock_clone.hold_count(), interrupt::is_interrupted())
        });

        wait_until(|| lock.queue_length() == 1);
        let start = Instant::now();
        remote.interrupt();

        let (result, holds, still_interrupted) = waiter.join().unwrap();
        assert!(start.elapsed() < Duration::from_secs(1));
        assert_eq!(result, Err(SyncError::Interrupted));
        assert_eq!(holds, 0);
        assert!(!still_interrupted);

        // No orphaned queue entry, holder untouched
        assert_eq!(lock.queue_length(), 0);
        assert_eq!(lock.hold_count(), 2);
        lock.unlock().unwrap();
        lock.unlock().unwrap();
        assert!(!lock.is_locked());
    }
}

#[test]
fn test_interrupt_before_call_fails_fast() {
    let lock = ReentrantLock::new(true);

    interrupt::interrupt_current();
    assert_eq!(lock.lock_interruptibly(), Err(SyncError::Interrupted));
    assert!(!interrupt::is_interrupted());
    assert!(!lock.is_locked());

    interrupt::interrupt_current();
    assert_eq!(
        lock.try_lock_for(Duration::from_millis(10)),
        Err(SyncError::Interrupted)
    );

    // Uninterruptible forms ignore the status and leave it pending
    interrupt::interrupt_current();
    lock.lock();
    assert!(lock.try_lock());
    assert!(interrupt::interrupted());
    lock.unlock().unwrap();
    lock.unlock().unwrap();
}

#[test]
fn test_try_lock_for_interrupted() {
    for fair in [false, true] {
        let lock = Arc::new(ReentrantLock::new(fair));
        lock.lock();

        let lock_clone = lock.clone();
        let (remote, waiter) =
            spawn_interruptible(move || lock_clone.try_lock_for(Duration::from_secs(10)));

        wait_until(|| lock.queue_length() == 1);
        remote.interrupt();

        assert_eq!(waiter.join().unwrap(), Err(SyncError::Interrupted));
        assert_eq!(lock.queue_length(), 0);
        lock.unlock().unwrap();
    }
}

#[test]
fn test_uninterruptible_lock_keeps_waiting() {
    for fair in [false, true] {
        let lock = Arc::new(ReentrantLock::new(fair));
        lock.lock();

        let lock_clone = lock.clone();
        let (remote, waiter) = spawn_interruptible(move || {
            lock_clone.lock();
            let holds = lock_clone.hold_count();
            lock_clone.unlock().unwrap();
            (holds, interrupt::interrupted())
        });

        wait_until(|| lock.queue_length() == 1);
        remote.interrupt();
        thread::sleep(Duration::from_millis(30));
        assert!(lock.has_queued_thread(remote.thread_id()));

        lock.unlock().unwrap();
        assert_eq!(waiter.join().unwrap(), (1, true));
    }
}

#[test]
fn test_condition_wait_interrupted_restores_depth() {
    try_init_tracing();
    for fair in [false, true] {
        let lock = Arc::new(ReentrantLock::new(fair));
        let cond = Arc::new(lock.new_condition());

        let (lock2, cond2) = (lock.clone(), cond.clone());
        let (remote, waiter) = spawn_interruptible(move || {
            lock2.lock();
            lock2.lock();
            let result = cond2.wait();
            let holds = lock2.hold_count();
            let waiters = lock2.wait_queue_length(&cond2).unwrap();
            lock2.unlock().unwrap();
            lock2.unlock().unwrap();
            (result, holds, waiters)
        });

        wait_until(|| {
            lock.lock();
            let waiting = lock.has_waiters(&cond).unwrap();
            lock.unlock().unwrap();
            waiting
        });
        remote.interrupt();

        let (result, holds, waiters) = waiter.join().unwrap();
        assert_eq!(result, Err(SyncError::Interrupted));
        assert_eq!(holds, 2);
        assert_eq!(waiters, 0);
        assert!(!lock.is_locked());
    }
}

#[test]
fn test_interrupt_after_signal_counts_as_signalled() {
    for fair in [false, true] {
        let lock = Arc::new(ReentrantLock::new(fair));
        let cond = Arc::new(lock.new_condition());

        let (lock2, cond2) = (lock.clone(), cond.clone());
        let (remote, waiter) = spawn_interruptible(move || {
            lock2.lock();
            let result = cond2.wait();
            let holds = lock2.hold_count();
            lock2.unlock().unwrap();
            (result, holds, interrupt::interrupted())
        });

        wait_until(|| {
            lock.lock();
            let waiting = lock.has_waiters(&cond).unwrap();
            lock.unlock().unwrap();
            waiting
        });

        // Signal while holding the lock so the waiter cannot reacquire yet,
        // then interrupt it before letting go
        lock.lock();
        cond.signal().unwrap();
        remote.interrupt();
        thread::sleep(Duration::from_millis(20));
        lock.unlock().unwrap();

        let (result, holds, interrupted) = waiter.join().unwrap();
        assert_eq!(result, Ok(()));
        assert_eq!(holds, 1);
        assert!(interrupted);
    }
}

#[test]
fn test_wait_uninterruptibly_ignores_interrupt() {
    for fair in [false, true] {
        let lock = Arc::new(ReentrantLock::new(fair));
        let cond = Arc::new(lock.new_condition());

        let (lock2, cond2) = (lock.clone(), cond.clone());
        let (remote, waiter) = spawn_interruptible(move || {
            lock2.lock();
            let result = cond2.wait_uninterruptibly();
            lock2.unlock().unwrap();
            (result, interrupt::interrupted())
        });

        wait_until(|| {
            lock.lock();
            let waiting = lock.has_waiters(&cond).unwrap();
            lock.unlock().unwrap();
            waiting
        });
        remote.interrupt();
        thread::sleep(Duration::from_millis(30));

        lock.lock();
        assert_eq!(lock.waiting_threads(&cond), Ok(vec![remote.thread_id()]));
        cond.signal().unwrap();
        lock.unlock().unwrap();

        assert_eq!(waiter.join().unwrap(), (Ok(()), true));
    }
}
