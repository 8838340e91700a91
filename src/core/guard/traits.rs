/*!
 * Guard Traits
 *
 * Core abstractions for RAII lock guards
 */

use super::{GuardMetadata, GuardResult};

/// Core guard trait
///
/// All guards provide:
/// - Resource type identification
/// - Metadata access
/// - Manual release capability
pub trait Guard {
    /// Resource type name for logging/debugging
    fn resource_type(&self) -> &'static str;

    /// Get guard metadata
    fn metadata(&self) -> &GuardMetadata;

    /// Check if guard still owns its resource
    fn is_active(&self) -> bool;

    /// Manually release the resource before drop
    ///
    /// Returns `Err(AlreadyReleased)` on a second call
    fn release(&mut self) -> GuardResult<()>;
}

/// Guards with custom cleanup on drop
///
/// Separates Drop logic for better testability and observability
pub trait GuardDrop: Guard {
    /// Perform cleanup on drop
    ///
    /// # Panics
    ///
    /// Should NOT panic. Log errors instead.
    fn on_drop(&mut self);
}
