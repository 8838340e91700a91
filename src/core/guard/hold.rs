/*!
 * Hold Depth Guard
 *
 * Captures the full recursive hold depth when a condition wait releases the
 * lock, and reacquires exactly that depth when dropped.
 */

use super::traits::{Guard, GuardDrop};
use super::{GuardError, GuardMetadata, GuardResult};
use crate::core::errors::SyncResult;
use crate::core::sync::LockSync;
use std::sync::Arc;
use tracing::trace;

/// Suspended hold depth of the current thread
///
/// While alive, the current thread holds none of the lock. Dropping it (or
/// calling `release`) blocks until the lock is reacquired through the
/// lock's normal path, then restores the captured depth.
pub struct HoldGuard {
    sync: Arc<LockSync>,
    holds: u32,
    metadata: GuardMetadata,
    active: bool,
}

impl HoldGuard {
    /// Release every hold the current thread has on `sync`
    pub(crate) fn suspend(sync: &Arc<LockSync>, operation: &'static str) -> SyncResult<Self> {
        let holds = sync.release_all(operation)?;
        trace!(lock = sync.name().unwrap_or("anonymous"), holds, "Lock holds suspended");

        Ok(Self {
            sync: sync.clone(),
            holds,
            metadata: GuardMetadata::new("hold"),
            active: true,
        })
    }

    /// Depth that will be restored
    #[inline]
    pub fn holds(&self) -> u32 {
        self.holds
    }

    fn restore(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        self.sync.reacquire(self.holds);
        trace!(
            lock = self.sync.name().unwrap_or("anonymous"),
            holds = self.holds,
            suspended_us = self.metadata.lifetime_micros(),
            "Lock holds restored"
        );
    }
}

impl Guard for HoldGuard {
    fn resource_type(&self) -> &'static str {
        self.metadata.resource_type
    }

    fn metadata(&self) -> &GuardMetadata {
        &self.metadata
    }

    fn is_active(&self) -> bool {
        self.active
    }

    /// Reacquire the suspended depth now
    fn release(&mut self) -> GuardResult<()> {
        if !self.active {
            return Err(GuardError::AlreadyReleased);
        }
        self.restore();
        Ok(())
    }
}

impl GuardDrop for HoldGuard {
    fn on_drop(&mut self) {
        self.restore();
    }
}

impl Drop for HoldGuard {
    fn drop(&mut self) {
        self.on_drop();
    }
}
