/*!
 * Error Types
 * Centralized error handling with thiserror and miette diagnostics
 */

use miette::Diagnostic;
use thiserror::Error;

/// Result type for lock and condition operations
pub type SyncResult<T> = Result<T, SyncError>;

/// Lock and condition errors
///
/// Timeouts are never errors: timed operations report them as `Ok(false)`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Diagnostic)]
pub enum SyncError {
    #[error("Illegal monitor state: {operation} requires the current thread to hold the lock")]
    #[diagnostic(
        code(sync::not_owner),
        help("Acquire the lock before calling this operation, and release it only from the owning thread.")
    )]
    NotOwner { operation: &'static str },

    #[error("Illegal monitor state: condition is bound to a different lock")]
    #[diagnostic(
        code(sync::foreign_condition),
        help("A condition can only be used with the lock whose new_condition() created it.")
    )]
    ForeignCondition,

    #[error("Thread was interrupted while waiting")]
    #[diagnostic(
        code(sync::interrupted),
        help("The lock depth held before the call is unchanged. Retry or propagate the interruption.")
    )]
    Interrupted,

    #[error("Maximum lock hold count exceeded")]
    #[diagnostic(
        code(sync::hold_count_overflow),
        help("The owning thread acquired the lock recursively more than u32::MAX times.")
    )]
    HoldCountOverflow,
}

impl SyncError {
    /// Caller-bug errors (illegal monitor state), as opposed to interruption
    #[inline]
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, Self::NotOwner { .. } | Self::ForeignCondition)
    }

    #[inline]
    pub(crate) const fn not_owner(operation: &'static str) -> Self {
        Self::NotOwner { operation }
    }
}
