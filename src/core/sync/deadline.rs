/*!
 * Monotonic Deadlines
 *
 * Timed operations convert their budget into an `Instant` once, then derive
 * the remaining time from it after every wakeup.
 */

use std::time::{Duration, Instant};

/// Deadline `timeout` from now; `None` when it is beyond what `Instant` can
/// represent, which callers treat as an unbounded wait
#[inline]
pub(crate) fn deadline_after(timeout: Duration) -> Option<Instant> {
    Instant::now().checked_add(timeout)
}

/// Time left before `deadline`, zero once it has passed
#[inline]
pub(crate) fn remaining(deadline: Instant) -> Duration {
    deadline.saturating_duration_since(Instant::now())
}
