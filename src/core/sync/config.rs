/*!
 * Lock Configuration
 *
 * Construction-time configuration for lock policy selection
 */

use serde::{Deserialize, Serialize};

/// Lock configuration
///
/// # Examples
///
/// ```
/// use reentrant_sync::{LockConfig, ReentrantLock};
///
/// let lock = ReentrantLock::with_config(LockConfig::fair().with_name("journal"));
/// assert!(lock.is_fair());
/// assert_eq!(lock.name(), Some("journal"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    /// Grant the lock to blocked threads in arrival order
    pub fair: bool,
    /// Name attached to log events and `Display` output
    pub name: Option<String>,
}

impl LockConfig {
    /// Strict FIFO handoff among blocked threads
    pub const fn fair() -> Self {
        Self {
            fair: true,
            name: None,
        }
    }

    /// Barging allowed; cheaper under contention
    pub const fn nonfair() -> Self {
        Self {
            fair: false,
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}
