//! Transfer orchestration with deadlock-free double locking
//!
//! This module provides the `TransferCoordinator`, which moves balance between
//! two accounts held in an `AccountStore`.
//!
//! # Protocol
//!
//! ```text
//! Received → Validating ─┬─▶ Rejected
//!                        └─▶ LockAcquired → Revalidating ─┬─▶ Rejected
//!                                                         └─▶ Committed → Notified → Done
//! ```
//!
//! 1. Validate optimistically, reading each balance under its own lock and
//!    never holding both.
//! 2. Lock both accounts in canonical order (`lock_order`): the lower
//!    identifier first, whichever side it is on. Two transfers over the same
//!    pair always contend for the same first lock, so no circular wait can
//!    form between them.
//! 3. Validate again with both locks held; this outcome is authoritative.
//! 4. Compute both new balances, then write both.
//! 5. Release the locks, then enqueue one notification per side.
//!
//! Locks are scoped guards, so every early return releases whatever is held.
//! With `TransferConfig::lock_timeout` set, every lock acquisition of one
//! transfer shares a single deadline and expiry returns `LockTimeout`.
//!
//! # Thread Safety
//!
//! The coordinator is cheap to clone and every clone can be used from any
//! thread. Transfers over disjoint account pairs share no lock at all.

use super::account_store::{AccountEntry, AccountStore};
use super::notifier::{Notification, NotificationQueue};
use super::validator::validate;
use crate::types::{Account, AccountId, TransferError, TransferRequest};
use rust_decimal::Decimal;
use std::sync::{Arc, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

/// Delay between attempts when acquiring a lock under a deadline
const LOCK_RETRY_INTERVAL: Duration = Duration::from_micros(50);

/// Configuration for transfer execution
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferConfig {
    /// Maximum time to spend acquiring both account locks
    ///
    /// `None` waits for as long as it takes.
    pub lock_timeout: Option<Duration>,
}

impl TransferConfig {
    pub fn with_lock_timeout(lock_timeout: Duration) -> Self {
        Self {
            lock_timeout: Some(lock_timeout),
        }
    }
}

/// Canonical lock-acquisition order for two accounts
///
/// Returns the pair sorted by identifier. The result does not depend on which
/// account is the source: `lock_order(a, b) == lock_order(b, a)`.
pub fn lock_order<'a>(a: &'a AccountId, b: &'a AccountId) -> (&'a AccountId, &'a AccountId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Acquire an account lock, giving up at `deadline` if one is set
fn acquire(
    entry: &AccountEntry,
    deadline: Option<Instant>,
) -> Result<MutexGuard<'_, Decimal>, TransferError> {
    let Some(deadline) = deadline else {
        return Ok(entry.lock());
    };

    loop {
        if let Some(guard) = entry.try_lock() {
            return Ok(guard);
        }
        if Instant::now() >= deadline {
            return Err(TransferError::lock_timeout(entry.id()));
        }
        thread::sleep(LOCK_RETRY_INTERVAL);
    }
}

/// Read a balance under its lock, releasing it immediately
fn read_balance(entry: &AccountEntry, deadline: Option<Instant>) -> Result<Decimal, TransferError> {
    acquire(entry, deadline).map(|balance| *balance)
}

/// Orchestrates transfers between accounts of one store
#[derive(Debug, Clone)]
pub struct TransferCoordinator {
    /// Shared account store
    store: Arc<AccountStore>,

    /// Where post-commit notifications are sent
    notifications: NotificationQueue,

    config: TransferConfig,
}

impl TransferCoordinator {
    /// Create a coordinator with the default configuration
    ///
    /// # Arguments
    ///
    /// * `store` - The store whose accounts this coordinator transfers between
    /// * `notifications` - Queue receiving one notification per side of each transfer
    pub fn new(store: Arc<AccountStore>, notifications: NotificationQueue) -> Self {
        Self::with_config(store, notifications, TransferConfig::default())
    }

    pub fn with_config(
        store: Arc<AccountStore>,
        notifications: NotificationQueue,
        config: TransferConfig,
    ) -> Self {
        Self {
            store,
            notifications,
            config,
        }
    }

    /// The store this coordinator operates on
    pub fn store(&self) -> &Arc<AccountStore> {
        &self.store
    }

    /// Move `amount` from account `from_id` to account `to_id`
    ///
    /// # Returns
    ///
    /// * `Ok(())` if the transfer committed, or if `from_id == to_id`
    /// * `Err(TransferError::NegativeAmount)` if `amount` is below zero
    /// * `Err(TransferError::AccountNotFound)` if either account does not exist
    /// * `Err(TransferError::InsufficientBalance)` if the source balance is lower than `amount`
    /// * `Err(TransferError::ArithmeticOverflow)` if the destination balance would overflow
    /// * `Err(TransferError::LockTimeout)` if a lock timeout is configured and expires
    ///
    /// No balance is modified when an error is returned.
    pub fn transfer(&self, from_id: &str, to_id: &str, amount: Decimal) -> Result<(), TransferError> {
        self.execute(TransferRequest::new(from_id, to_id, amount))
    }

    /// Execute a transfer request
    ///
    /// See [`TransferCoordinator::transfer`].
    pub fn execute(&self, request: TransferRequest) -> Result<(), TransferError> {
        let _span = tracing::debug_span!(
            "transfer",
            from = %request.from,
            to = %request.to,
            amount = %request.amount
        )
        .entered();
        debug!(stage = "received");

        let deadline = self
            .config
            .lock_timeout
            .map(|timeout| Instant::now() + timeout);

        // Optimistic pass: fail fast without holding both locks
        debug!(stage = "validating");
        let from_entry = self.store.entry(request.from.as_str());
        let to_entry = self.store.entry(request.to.as_str());
        let from_balance = from_entry
            .as_deref()
            .map(|entry| read_balance(entry, deadline))
            .transpose()?;
        let to_balance = to_entry
            .as_deref()
            .map(|entry| read_balance(entry, deadline))
            .transpose()?;
        validate(&request, from_balance, to_balance)
            .inspect_err(|e| debug!(stage = "rejected", error = %e))?;

        let (from_entry, to_entry) = match (from_entry, to_entry) {
            (Some(from), Some(to)) => (from, to),
            (None, _) => return Err(TransferError::source_not_found(&request.from)),
            (_, None) => return Err(TransferError::destination_not_found(&request.to)),
        };

        if request.is_self_transfer() {
            debug!(stage = "done", "self-transfer, nothing to move");
            return Ok(());
        }

        let (new_from, new_to) = self.commit(&request, &from_entry, &to_entry, deadline)?;

        debug!(stage = "notified");
        self.notifications.send(Notification::new(
            Account::with_balance(request.from.clone(), new_from),
            format!("{} transfer to {}", request.amount, request.to),
        ));
        self.notifications.send(Notification::new(
            Account::with_balance(request.to.clone(), new_to),
            format!("{} transfer from {}", request.amount, request.from),
        ));

        debug!(stage = "done");
        Ok(())
    }

    /// Lock both accounts, re-validate and apply the transfer
    ///
    /// Returns the committed balances of the source and destination. Both
    /// guards are dropped before this returns, on every path.
    fn commit(
        &self,
        request: &TransferRequest,
        from_entry: &AccountEntry,
        to_entry: &AccountEntry,
        deadline: Option<Instant>,
    ) -> Result<(Decimal, Decimal), TransferError> {
        let from_first = lock_order(from_entry.id(), to_entry.id()).0 == from_entry.id();
        let (first, second) = if from_first {
            (from_entry, to_entry)
        } else {
            (to_entry, from_entry)
        };

        let first_guard = acquire(first, deadline)?;
        let second_guard = acquire(second, deadline)?;
        let (mut from_balance, mut to_balance) = if from_first {
            (first_guard, second_guard)
        } else {
            (second_guard, first_guard)
        };
        debug!(stage = "lock_acquired");

        debug!(stage = "revalidating");
        validate(request, Some(*from_balance), Some(*to_balance))
            .inspect_err(|e| debug!(stage = "rejected", error = %e))?;

        let new_from = from_balance
            .checked_sub(request.amount)
            .ok_or(TransferError::InsufficientBalance)?;
        let new_to = to_balance
            .checked_add(request.amount)
            .ok_or_else(|| TransferError::ArithmeticOverflow {
                id: request.to.clone(),
            })?;

        *from_balance = new_from;
        *to_balance = new_to;
        debug!(stage = "committed", from_balance = %new_from, to_balance = %new_to);

        Ok((new_from, new_to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AccountSide;
    use rstest::rstest;
    use std::sync::{mpsc, Barrier};
    use tokio::sync::mpsc::UnboundedReceiver;

    fn dec(value: i64) -> Decimal {
        Decimal::new(value, 0)
    }

    fn setup(accounts: &[(&str, i64)]) -> (TransferCoordinator, UnboundedReceiver<Notification>) {
        let store = Arc::new(AccountStore::new());
        for (id, balance) in accounts {
            store
                .create(Account::with_balance(*id, dec(*balance)))
                .unwrap();
        }
        let (queue, rx) = NotificationQueue::unbounded();
        (TransferCoordinator::new(store, queue), rx)
    }

    fn balance(coordinator: &TransferCoordinator, id: &str) -> Decimal {
        coordinator.store().get(id).unwrap().balance
    }

    fn drain(rx: &mut UnboundedReceiver<Notification>) -> Vec<Notification> {
        let mut received = Vec::new();
        while let Ok(notification) = rx.try_recv() {
            received.push(notification);
        }
        received
    }

    #[test]
    fn test_transfer_moves_balance() {
        let (coordinator, mut rx) = setup(&[("123", 10000), ("124", 5000)]);

        coordinator.transfer("123", "124", dec(5000)).unwrap();

        assert_eq!(balance(&coordinator, "123"), dec(5000));
        assert_eq!(balance(&coordinator, "124"), dec(10000));

        let notifications = drain(&mut rx);
        assert_eq!(
            notifications,
            vec![
                Notification::new(Account::with_balance("123", dec(5000)), "5000 transfer to 124"),
                Notification::new(
                    Account::with_balance("124", dec(10000)),
                    "5000 transfer from 123"
                ),
            ]
        );
    }

    #[test]
    fn test_transfer_rejects_negative_amount() {
        let (coordinator, mut rx) = setup(&[("127", 10000), ("128", 5000)]);

        let err = coordinator.transfer("127", "128", dec(-5000)).unwrap_err();

        assert_eq!(err.to_string(), "Amount transfer can't be negative");
        assert_eq!(balance(&coordinator, "127"), dec(10000));
        assert_eq!(balance(&coordinator, "128"), dec(5000));
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_transfer_rejects_amount_over_balance() {
        let (coordinator, mut rx) = setup(&[("129", 10000), ("130", 5000)]);

        let err = coordinator.transfer("129", "130", dec(20000)).unwrap_err();

        assert_eq!(err.to_string(), "The amount is greater than account balance");
        assert_eq!(balance(&coordinator, "129"), dec(10000));
        assert_eq!(balance(&coordinator, "130"), dec(5000));
        assert!(drain(&mut rx).is_empty());
    }

    #[rstest]
    #[case::missing_destination("131", "132", "The accountTo ID 132 to transfer does not exist")]
    #[case::missing_source("132", "131", "The accountFrom ID 132 to transfer does not exist")]
    fn test_transfer_rejects_missing_account(
        #[case] from: &str,
        #[case] to: &str,
        #[case] expected: &str,
    ) {
        let (coordinator, _rx) = setup(&[("131", 10000)]);

        let err = coordinator.transfer(from, to, dec(20000)).unwrap_err();

        assert_eq!(err.to_string(), expected);
        assert_eq!(balance(&coordinator, "131"), dec(10000));
    }

    #[test]
    fn test_transfer_full_drain_is_allowed() {
        let (coordinator, _rx) = setup(&[("a", 750), ("b", 0)]);

        coordinator.transfer("a", "b", dec(750)).unwrap();

        assert_eq!(balance(&coordinator, "a"), Decimal::ZERO);
        assert_eq!(balance(&coordinator, "b"), dec(750));
    }

    #[test]
    fn test_self_transfer_is_a_no_op() {
        let (coordinator, mut rx) = setup(&[("a", 100)]);

        coordinator.transfer("a", "a", dec(40)).unwrap();

        assert_eq!(balance(&coordinator, "a"), dec(100));
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_self_transfer_still_validates() {
        let (coordinator, _rx) = setup(&[("a", 100)]);

        assert_eq!(
            coordinator.transfer("a", "a", dec(-1)),
            Err(TransferError::NegativeAmount)
        );
        assert_eq!(
            coordinator.transfer("a", "a", dec(101)),
            Err(TransferError::InsufficientBalance)
        );
    }

    #[test]
    fn test_overflow_leaves_both_balances_untouched() {
        let (coordinator, _rx) = setup(&[("a", 10), ("b", 0)]);
        coordinator
            .store()
            .create(Account::with_balance("max", Decimal::MAX))
            .unwrap();

        let err = coordinator.transfer("a", "max", dec(10)).unwrap_err();

        assert_eq!(
            err,
            TransferError::ArithmeticOverflow {
                id: AccountId::from("max")
            }
        );
        assert_eq!(balance(&coordinator, "a"), dec(10));
        assert_eq!(balance(&coordinator, "max"), Decimal::MAX);
    }

    #[test]
    fn test_notification_failure_does_not_fail_transfer() {
        let (coordinator, rx) = setup(&[("a", 100), ("b", 0)]);
        drop(rx);

        coordinator.transfer("a", "b", dec(60)).unwrap();

        assert_eq!(balance(&coordinator, "a"), dec(40));
        assert_eq!(balance(&coordinator, "b"), dec(60));
    }

    #[rstest]
    #[case("123", "124")]
    #[case("124", "123")]
    #[case("9", "10")]
    #[case("acc-b", "acc-a")]
    fn test_lock_order_ignores_argument_order(#[case] a: &str, #[case] b: &str) {
        let (a, b) = (AccountId::from(a), AccountId::from(b));

        let forward = lock_order(&a, &b);
        let backward = lock_order(&b, &a);

        assert_eq!(forward, backward);
        assert!(forward.0 <= forward.1);
    }

    #[test]
    fn test_lock_timeout_releases_held_lock() {
        let store = Arc::new(AccountStore::new());
        store.create(Account::with_balance("A", dec(100))).unwrap();
        store.create(Account::with_balance("B", dec(100))).unwrap();
        let (queue, _rx) = NotificationQueue::unbounded();
        let coordinator = TransferCoordinator::new(Arc::clone(&store), queue);
        let entry_a = store.entry("A").unwrap();
        let entry_b = store.entry("B").unwrap();

        // "A" is locked first, so the commit holds it while waiting on "B"
        let held = entry_b.lock();
        let deadline = Instant::now() + Duration::from_millis(20);
        let request = TransferRequest::new("A", "B", dec(10));

        let err = coordinator
            .commit(&request, &entry_a, &entry_b, Some(deadline))
            .unwrap_err();
        assert_eq!(err, TransferError::lock_timeout(&AccountId::from("B")));
        assert!(entry_a.try_lock().is_some(), "lock on A must be released");
        drop(held);

        assert_eq!(store.get("A").unwrap().balance, dec(100));
        assert_eq!(store.get("B").unwrap().balance, dec(100));
    }

    #[test]
    fn test_configured_timeout_applies_to_transfer() {
        let store = Arc::new(AccountStore::new());
        store.create(Account::with_balance("A", dec(100))).unwrap();
        store.create(Account::with_balance("B", dec(100))).unwrap();
        let (queue, _rx) = NotificationQueue::unbounded();
        let coordinator = TransferCoordinator::with_config(
            Arc::clone(&store),
            queue,
            TransferConfig::with_lock_timeout(Duration::from_millis(20)),
        );

        let entry_b = store.entry("B").unwrap();
        let held = entry_b.lock();
        let result = coordinator.transfer("A", "B", dec(10));
        drop(held);

        assert_eq!(result, Err(TransferError::lock_timeout(&AccountId::from("B"))));
        assert_eq!(store.get("A").unwrap().balance, dec(100));
        assert_eq!(store.get("B").unwrap().balance, dec(100));
    }

    #[test]
    fn test_opposing_transfers_complete_and_conserve_total() {
        const THREADS: usize = 8;
        const TRANSFERS_PER_THREAD: usize = 500;

        let (coordinator, _rx) = setup(&[("A", 1000), ("B", 1000)]);
        let (done_tx, done_rx) = mpsc::channel();

        let worker = {
            let coordinator = coordinator.clone();
            thread::spawn(move || {
                let handles: Vec<_> = (0..THREADS)
                    .map(|t| {
                        let coordinator = coordinator.clone();
                        thread::spawn(move || {
                            for i in 0..TRANSFERS_PER_THREAD {
                                let (from, to) = if (t + i) % 2 == 0 { ("A", "B") } else { ("B", "A") };
                                // Insufficient balance is an acceptable outcome under contention
                                let _ = coordinator.transfer(from, to, dec(((i % 7) + 1) as i64));
                            }
                        })
                    })
                    .collect();
                for handle in handles {
                    handle.join().unwrap();
                }
                done_tx.send(()).unwrap();
            })
        };

        done_rx
            .recv_timeout(Duration::from_secs(30))
            .expect("alternating transfers deadlocked");
        worker.join().unwrap();

        let a = balance(&coordinator, "A");
        let b = balance(&coordinator, "B");
        assert_eq!(a + b, dec(2000));
        assert!(a >= Decimal::ZERO);
        assert!(b >= Decimal::ZERO);
    }

    #[test]
    fn test_caller_order_locking_forms_circular_wait() {
        let store = Arc::new(AccountStore::new());
        store.create(Account::with_balance("A", dec(100))).unwrap();
        store.create(Account::with_balance("B", dec(100))).unwrap();

        // Both threads hold their first lock before either tries the second,
        // and keep it until both attempts are over.
        let acquired_first = Arc::new(Barrier::new(2));
        let attempted_second = Arc::new(Barrier::new(2));

        let naive = |from: &'static str, to: &'static str| {
            let store = Arc::clone(&store);
            let acquired_first = Arc::clone(&acquired_first);
            let attempted_second = Arc::clone(&attempted_second);
            thread::spawn(move || {
                let from_entry = store.entry(from).unwrap();
                let to_entry = store.entry(to).unwrap();

                let first = acquire(&from_entry, None).unwrap();
                acquired_first.wait();
                let deadline = Instant::now() + Duration::from_millis(100);
                let second = acquire(&to_entry, Some(deadline));
                let timed_out = second.is_err();
                drop(second);
                attempted_second.wait();
                drop(first);
                timed_out
            })
        };

        let forward = naive("A", "B");
        let backward = naive("B", "A");

        // Without the deadline both threads would wait on each other forever
        assert!(forward.join().unwrap());
        assert!(backward.join().unwrap());

        // Canonical order makes both directions start on the same lock
        let (a, b) = (AccountId::from("A"), AccountId::from("B"));
        assert_eq!(lock_order(&a, &b).0, lock_order(&b, &a).0);
    }

    #[test]
    fn test_disjoint_pair_proceeds_while_other_pair_is_locked() {
        let store = Arc::new(AccountStore::new());
        for id in ["A", "B", "C", "D"] {
            store.create(Account::with_balance(id, dec(100))).unwrap();
        }
        let (queue, _rx) = NotificationQueue::unbounded();
        let coordinator = TransferCoordinator::with_config(
            Arc::clone(&store),
            queue,
            TransferConfig::with_lock_timeout(Duration::from_millis(50)),
        );

        let entry_a = store.entry("A").unwrap();
        let held = entry_a.lock();

        let contended = {
            let coordinator = coordinator.clone();
            thread::spawn(move || coordinator.transfer("B", "A", dec(1)))
        };
        let disjoint = {
            let coordinator = coordinator.clone();
            thread::spawn(move || coordinator.transfer("C", "D", dec(30)))
        };

        assert_eq!(disjoint.join().unwrap(), Ok(()));
        assert!(matches!(
            contended.join().unwrap(),
            Err(TransferError::LockTimeout { .. })
        ));
        drop(held);

        assert_eq!(store.get("C").unwrap().balance, dec(70));
        assert_eq!(store.get("D").unwrap().balance, dec(130));
        assert_eq!(store.get("A").unwrap().balance, dec(100));
        assert_eq!(store.get("B").unwrap().balance, dec(100));
    }

    #[test]
    fn test_missing_source_reports_from_side() {
        let (coordinator, _rx) = setup(&[("b", 0)]);

        let err = coordinator.transfer("a", "b", dec(1)).unwrap_err();

        assert!(matches!(
            err,
            TransferError::AccountNotFound {
                side: AccountSide::From,
                ..
            }
        ));
    }
}
