//! Fire-and-forget notification dispatch
//!
//! The coordinator hands notifications to a `NotificationQueue`, which is the
//! sending half of an unbounded `tokio::sync::mpsc` channel. Sending never
//! blocks and never fails the caller. A dispatcher thread drains the channel
//! and calls the configured `Notifier` for each message, logging failures.
//!
//! ```text
//! TransferCoordinator ──send──▶ NotificationQueue ══mpsc══▶ dispatcher thread ──▶ Notifier
//! ```
//!
//! The dispatcher stops once every `NotificationQueue` clone has been dropped
//! and the channel is drained.

use super::traits::Notifier;
use crate::types::{Account, NotificationError};
use std::io;
use std::sync::Arc;
use std::thread;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// A message for one side of a committed transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Recipient account, with its balance right after the transfer committed
    pub account: Account,

    /// Human-readable description of the movement
    pub message: String,
}

impl Notification {
    pub fn new(account: Account, message: impl Into<String>) -> Self {
        Self {
            account,
            message: message.into(),
        }
    }
}

/// Sending half of the notification channel
///
/// Cheap to clone; every clone feeds the same dispatcher.
#[derive(Debug, Clone)]
pub struct NotificationQueue {
    tx: mpsc::UnboundedSender<Notification>,
}

impl NotificationQueue {
    /// Create a queue together with its receiving half
    ///
    /// Useful when the caller wants to consume notifications itself instead of
    /// running a dispatcher.
    pub fn unbounded() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Enqueue a notification without waiting for delivery
    ///
    /// If the receiving side is gone the notification is logged and dropped.
    pub fn send(&self, notification: Notification) {
        if let Err(mpsc::error::SendError(dropped)) = self.tx.send(notification) {
            warn!(
                account = %dropped.account.id,
                message = %dropped.message,
                "Notification dropped: dispatcher is not running"
            );
        }
    }
}

/// Delivery counters reported by a dispatcher when it stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Notifications the notifier accepted
    pub delivered: usize,
    /// Notifications the notifier rejected
    pub failed: usize,
}

/// Handle to a running dispatcher thread
#[derive(Debug)]
pub struct Dispatcher {
    handle: thread::JoinHandle<DispatchStats>,
}

impl Dispatcher {
    /// Wait for the dispatcher to drain the channel and stop
    ///
    /// Only returns once every `NotificationQueue` clone has been dropped.
    pub fn join(self) -> DispatchStats {
        self.handle.join().unwrap_or_else(|_| {
            error!("Notification dispatcher panicked");
            DispatchStats::default()
        })
    }
}

/// Start a dispatcher thread delivering to `notifier`
///
/// # Returns
///
/// The queue to hand to the coordinator and the dispatcher handle, or an I/O
/// error if the thread could not be spawned.
pub fn spawn_dispatcher(
    notifier: Arc<dyn Notifier>,
) -> io::Result<(NotificationQueue, Dispatcher)> {
    let (queue, mut rx) = NotificationQueue::unbounded();

    let handle = thread::Builder::new()
        .name("notification-dispatcher".to_string())
        .spawn(move || {
            let mut stats = DispatchStats::default();
            while let Some(notification) = rx.blocking_recv() {
                match notifier.notify(&notification.account, &notification.message) {
                    Ok(()) => stats.delivered += 1,
                    Err(e) => {
                        stats.failed += 1;
                        warn!(error = %e, "Notification delivery failed");
                    }
                }
            }
            stats
        })?;

    Ok((queue, Dispatcher { handle }))
}

/// Notifier that writes every message to the log
///
/// Stands in for a real delivery channel (mail, push) in the CLI.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingNotifier;

impl Notifier for LoggingNotifier {
    fn notify(&self, account: &Account, message: &str) -> Result<(), NotificationError> {
        info!(
            account = %account.id,
            balance = %account.balance,
            "{}",
            message
        );
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::sync::Mutex;

    /// Notifier that records every message it receives
    #[derive(Debug, Default)]
    pub(crate) struct RecordingNotifier {
        pub(crate) received: Mutex<Vec<Notification>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, account: &Account, message: &str) -> Result<(), NotificationError> {
            self.received
                .lock()
                .unwrap()
                .push(Notification::new(account.clone(), message));
            Ok(())
        }
    }

    /// Notifier that rejects every message
    #[derive(Debug, Default)]
    pub(crate) struct FailingNotifier;

    impl Notifier for FailingNotifier {
        fn notify(&self, account: &Account, _message: &str) -> Result<(), NotificationError> {
            Err(NotificationError {
                account: account.id.clone(),
                reason: "mailbox unavailable".to_string(),
            })
        }
    }

    fn notification(id: &str, message: &str) -> Notification {
        Notification::new(Account::with_balance(id, Decimal::ONE), message)
    }

    #[test]
    fn test_dispatcher_delivers_in_order() {
        let notifier = Arc::new(RecordingNotifier::default());
        let (queue, dispatcher) = spawn_dispatcher(notifier.clone()).unwrap();

        queue.send(notification("1", "first"));
        queue.send(notification("2", "second"));
        drop(queue);

        let stats = dispatcher.join();
        assert_eq!(
            stats,
            DispatchStats {
                delivered: 2,
                failed: 0
            }
        );

        let received = notifier.received.lock().unwrap();
        let messages: Vec<&str> = received.iter().map(|n| n.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second"]);
    }

    #[test]
    fn test_dispatcher_counts_failures_and_keeps_going() {
        let (queue, dispatcher) = spawn_dispatcher(Arc::new(FailingNotifier)).unwrap();

        queue.send(notification("1", "a"));
        queue.send(notification("1", "b"));
        drop(queue);

        assert_eq!(
            dispatcher.join(),
            DispatchStats {
                delivered: 0,
                failed: 2
            }
        );
    }

    #[test]
    fn test_send_without_receiver_does_not_panic() {
        let (queue, rx) = NotificationQueue::unbounded();
        drop(rx);

        queue.send(notification("1", "lost"));
    }

    #[test]
    fn test_logging_notifier_accepts_everything() {
        let account = Account::with_balance("1", Decimal::ONE);

        assert!(LoggingNotifier.notify(&account, "hello").is_ok());
    }
}
