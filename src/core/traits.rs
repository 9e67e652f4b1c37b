//! Core traits for pluggable collaborators
//!
//! The transfer core depends on one external collaborator, the notifier,
//! which receives a message for each side of a committed transfer.

use crate::types::{Account, NotificationError};

/// Trait for delivering transfer notifications to account holders
///
/// Implementations are invoked from the notification dispatcher thread, never
/// from inside a transfer's critical section. A returned error is logged and
/// otherwise ignored; the transfer that produced the notification has already
/// committed.
pub trait Notifier: Send + Sync {
    /// Deliver `message` to the holder of `account`
    fn notify(&self, account: &Account, message: &str) -> Result<(), NotificationError>;
}
