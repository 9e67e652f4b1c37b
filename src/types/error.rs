//! Error types for the transfer engine
//!
//! This module defines all error types that can occur while creating accounts
//! and transferring between them. The display strings of the account and
//! transfer errors are the messages shown to callers, so they are reproduced
//! verbatim by the request-handling layer.
//!
//! # Error Categories
//!
//! - **Creation Errors**: duplicate identifiers, negative opening balances
//! - **Transfer Errors**: negative amount, unknown account, insufficient balance,
//!   arithmetic overflow, lock timeout
//! - **Command Errors**: either of the above, surfaced by the request-handling layer
//! - **Notification Errors**: delivery failures, never surfaced as transfer failures
//!
//! Every error is recoverable: no state is mutated when one is returned.

use super::account::AccountId;
use super::transfer::AccountSide;
use thiserror::Error;

/// An account with the same identifier already exists
///
/// Returned by account creation. The store is left untouched; the caller may
/// retry with a different identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Account id {id} already exists!")]
pub struct DuplicateAccountError {
    /// The identifier that is already taken
    pub id: AccountId,
}

/// Errors returned when creating an account
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CreateAccountError {
    /// The identifier is already in use
    #[error(transparent)]
    Duplicate(#[from] DuplicateAccountError),

    /// The opening balance is below zero
    #[error("Initial balance must not be negative")]
    NegativeBalance {
        /// Identifier of the rejected account
        id: AccountId,
    },
}

/// Errors returned by a transfer
///
/// Validation variants are checked in declaration order: amount sign, source
/// existence, destination existence, balance sufficiency.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    /// The requested amount is below zero
    #[error("Amount transfer can't be negative")]
    NegativeAmount,

    /// One side of the transfer does not exist
    #[error("{}", not_found_message(.side, .id))]
    AccountNotFound {
        /// Which side of the transfer is missing
        side: AccountSide,
        /// The identifier that was looked up
        id: AccountId,
    },

    /// The source balance is lower than the requested amount
    #[error("The amount is greater than account balance")]
    InsufficientBalance,

    /// Crediting the destination would overflow its balance
    #[error("Arithmetic overflow crediting account {id}")]
    ArithmeticOverflow {
        /// The account that would overflow
        id: AccountId,
    },

    /// An account lock could not be acquired before the configured deadline
    #[error("Timed out acquiring lock for account {id}")]
    LockTimeout {
        /// The account whose lock was contended
        id: AccountId,
    },
}

fn not_found_message(side: &AccountSide, id: &AccountId) -> String {
    match side {
        AccountSide::From => format!("The accountFrom ID {} to transfer does not exist", id),
        AccountSide::To => format!("The accountTo ID {} to transfer does not exist", id),
    }
}

impl TransferError {
    /// Create an AccountNotFound error for the source account
    pub fn source_not_found(id: &AccountId) -> Self {
        TransferError::AccountNotFound {
            side: AccountSide::From,
            id: id.clone(),
        }
    }

    /// Create an AccountNotFound error for the destination account
    pub fn destination_not_found(id: &AccountId) -> Self {
        TransferError::AccountNotFound {
            side: AccountSide::To,
            id: id.clone(),
        }
    }

    /// Create a LockTimeout error
    pub fn lock_timeout(id: &AccountId) -> Self {
        TransferError::LockTimeout { id: id.clone() }
    }
}

/// Errors returned when applying a command
///
/// Displays exactly as the wrapped error, so callers see the original message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error(transparent)]
    Create(#[from] CreateAccountError),

    #[error(transparent)]
    Transfer(#[from] TransferError),
}

/// A notifier failed to deliver a message
///
/// Only ever logged; the transfer that produced the notification has already
/// committed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to notify account {account}: {reason}")]
pub struct NotificationError {
    /// Recipient account
    pub account: AccountId,
    /// Description of the failure
    pub reason: String,
}
