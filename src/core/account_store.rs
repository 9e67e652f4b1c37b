//! Thread-safe account storage
//!
//! This module provides the `AccountStore` struct, the single source of truth
//! for every account and its balance.
//!
//! # Design
//!
//! Two independent layers of synchronization are used:
//!
//! - The map from identifier to account is a `DashMap`. Its sharded locking
//!   protects concurrent `create` and lookup calls and is only ever held for
//!   the duration of a map operation.
//! - Every account record (`AccountEntry`) owns its own `Mutex` around the
//!   balance. This is the lock the transfer coordinator acquires; there is no
//!   store-wide lock for transfers.
//!
//! Map guards are never held while an account lock is being acquired: lookups
//! clone the `Arc<AccountEntry>` out of the map and release the shard first.
//!
//! # Thread Safety
//!
//! All operations are safe to call concurrently. Snapshots returned by `get`
//! and `accounts` reflect the latest committed transfer at the time they were
//! taken, and may be stale by the time the caller looks at them.

use crate::types::{Account, AccountId, CreateAccountError, DuplicateAccountError};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};

/// A live account record with its own lock
///
/// The balance is only reachable through the lock. A poisoned lock is
/// recovered: the coordinator computes both new balances before writing
/// either, so a panic can never leave a half-written value behind.
#[derive(Debug)]
pub(crate) struct AccountEntry {
    id: AccountId,
    balance: Mutex<Decimal>,
}

impl AccountEntry {
    fn new(account: Account) -> Self {
        Self {
            id: account.id,
            balance: Mutex::new(account.balance),
        }
    }

    pub(crate) fn id(&self) -> &AccountId {
        &self.id
    }

    /// Block until this account's lock is held
    pub(crate) fn lock(&self) -> MutexGuard<'_, Decimal> {
        self.balance.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Take this account's lock if it is free
    pub(crate) fn try_lock(&self) -> Option<MutexGuard<'_, Decimal>> {
        match self.balance.try_lock() {
            Ok(guard) => Some(guard),
            Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => None,
        }
    }

    /// Copy out the current committed state
    pub(crate) fn snapshot(&self) -> Account {
        let balance = *self.lock();
        Account::with_balance(self.id.clone(), balance)
    }
}

/// Thread-safe account store
///
/// `AccountStore` owns every account. Creation is atomic per identifier:
/// when several threads create the same identifier concurrently exactly one
/// of them succeeds.
#[derive(Debug, Default)]
pub struct AccountStore {
    /// Concurrent HashMap of account records by identifier
    accounts: DashMap<AccountId, Arc<AccountEntry>>,
}

impl AccountStore {
    /// Create a new empty AccountStore
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
        }
    }

    /// Insert a new account
    ///
    /// # Arguments
    ///
    /// * `account` - The account to insert, with its opening balance
    ///
    /// # Returns
    ///
    /// * `Ok(())` if the account was inserted
    /// * `Err(CreateAccountError::Duplicate)` if the identifier already exists
    /// * `Err(CreateAccountError::NegativeBalance)` if the opening balance is below zero
    ///
    /// The store is not modified when an error is returned.
    pub fn create(&self, account: Account) -> Result<(), CreateAccountError> {
        if account.balance < Decimal::ZERO {
            return Err(CreateAccountError::NegativeBalance { id: account.id });
        }

        match self.accounts.entry(account.id.clone()) {
            Entry::Occupied(_) => Err(DuplicateAccountError { id: account.id }.into()),
            Entry::Vacant(vacant) => {
                vacant.insert(Arc::new(AccountEntry::new(account)));
                Ok(())
            }
        }
    }

    /// Get a snapshot of an account
    ///
    /// Returns `None` if no account has this identifier. The returned value is
    /// advisory: it reflects the latest committed transfer at the time of the
    /// call, and a concurrent transfer may change the balance right after.
    pub fn get(&self, id: &str) -> Option<Account> {
        self.entry(id).map(|entry| entry.snapshot())
    }

    /// Get the live record of an account
    ///
    /// The map shard is released before returning, so the caller can lock the
    /// account without holding any map guard.
    pub(crate) fn entry(&self, id: &str) -> Option<Arc<AccountEntry>> {
        self.accounts.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Remove all accounts
    pub fn clear(&self) {
        self.accounts.clear();
    }

    /// Snapshot of every account, keyed and sorted by identifier
    ///
    /// Each balance is read under its account's lock, one account at a time,
    /// so the snapshot is consistent per account but not across accounts.
    pub fn accounts(&self) -> BTreeMap<AccountId, Account> {
        let entries: Vec<Arc<AccountEntry>> = self
            .accounts
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        entries
            .into_iter()
            .map(|entry| (entry.id().clone(), entry.snapshot()))
            .collect()
    }

    /// Number of accounts in the store
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}
