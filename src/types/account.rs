//! Account-related types for the transfer engine
//!
//! This module defines the account identifier and the value snapshot of an
//! account that is handed out by the store.

use rust_decimal::Decimal;
use std::borrow::Borrow;
use std::fmt;

/// Account identifier
///
/// Identifiers are arbitrary strings. Their lexicographic order is the total
/// order used to decide lock-acquisition sequence, so two accounts always lock
/// in the same order no matter which one is the source of a transfer.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AccountId(String);

impl AccountId {
    /// Create an identifier from anything string-like
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for AccountId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for AccountId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Account state
///
/// A value snapshot of an account: its identifier and the balance as of the
/// last committed transfer at the time the snapshot was taken. The live
/// record is owned by the `AccountStore`; mutating a snapshot has no effect
/// on the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// Unique identifier, immutable once the account is created
    pub id: AccountId,

    /// Current balance
    pub balance: Decimal,
}

impl Account {
    /// Create a new account with a zero balance
    ///
    /// # Arguments
    ///
    /// * `id` - The identifier for this account
    pub fn new(id: impl Into<AccountId>) -> Self {
        Account {
            id: id.into(),
            balance: Decimal::ZERO,
        }
    }

    /// Create a new account with an opening balance
    pub fn with_balance(id: impl Into<AccountId>, balance: Decimal) -> Self {
        Account {
            id: id.into(),
            balance,
        }
    }
}
